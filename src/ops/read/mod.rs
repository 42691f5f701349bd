//! Directive dispatch over description files.

use super::{Flow, GlobalOps};
use crate::args::{Args, ParsedArgs};
use crate::descriptor::Descriptor;
use crate::error::{ParseErrorKind, Result};
use crate::paths;
use crate::scanner::Scanner;
use tracing::debug;

/// Name of a component description file.
pub const BUILDDESC: &str = "Builddesc";
/// Name of the top-level description file, preferred over [`BUILDDESC`].
pub const BUILDDESC_TOP: &str = "Builddesc.top";

impl GlobalOps {
    /// Read the component in directory `dir`; `""` is the top directory.
    ///
    /// The top directory prefers `Builddesc.top` over `Builddesc`.
    /// `flavors` restricts descriptors to the given flavors instead of the
    /// active ones.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or any directive is invalid.
    pub fn read_component(&mut self, dir: &str, flavors: Option<&[String]>) -> Result<()> {
        let top = paths::join([dir, BUILDDESC_TOP]);
        let file = if dir.is_empty() && self.exists(&top) {
            top
        } else {
            paths::join([dir, BUILDDESC])
        };
        debug!(component = dir, file = %file, "reading component");
        let text = self.open_builddesc(&file)?;
        self.parse_str(&text, &file, dir, flavors)
    }

    /// Parse the directives in `text`, attributing errors to `file`.
    ///
    /// Relative paths in the directives resolve against `srcdir`.
    ///
    /// # Errors
    ///
    /// Returns the first structural, schema or collaborator error.
    pub fn parse_str(
        &mut self,
        text: &str,
        file: &str,
        srcdir: &str,
        flavors: Option<&[String]>,
    ) -> Result<()> {
        let mut scanner = Scanner::new(text, file);
        while !self.handed_off() {
            let Some(name) = scanner.next_token() else {
                break;
            };
            let open = scanner.expect_token()?;
            if open.text != "(" {
                return Err(scanner.error(ParseErrorKind::MissingOpenParen, open.text).into());
            }
            let config_seen = self.config.seen;
            self.config.seen = true;
            let closed = if name.text == "CONFIG" {
                if config_seen {
                    return Err(scanner.error(ParseErrorKind::DuplicateConfig, name.text).into());
                }
                self.parse_config(&mut scanner, srcdir)?
            } else {
                if !config_seen && self.run_post_config()? == Flow::Handoff {
                    break;
                }
                self.dispatch(&mut scanner, name.text, srcdir, flavors)?
            };
            if self.handed_off() {
                break;
            }
            if !closed {
                return Err(scanner.error(ParseErrorKind::MissingCloseParen, "EOF").into());
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        scanner: &mut Scanner<'_>,
        name: &str,
        srcdir: &str,
        flavors: Option<&[String]>,
    ) -> Result<bool> {
        if name == "COMPONENT" {
            return self.parse_component(scanner, srcdir, flavors);
        }
        let Some(template) = self.template(name) else {
            return Err(scanner.error(ParseErrorKind::UnhandledDirective, name).into());
        };
        self.parse_descriptor(scanner, &template, srcdir, flavors)
    }

    fn parse_component(
        &mut self,
        scanner: &mut Scanner<'_>,
        srcdir: &str,
        flavors: Option<&[String]>,
    ) -> Result<bool> {
        let ParsedArgs { args, closed, .. } = Args::parse(scanner, self.cond_eval())?;
        let component_flavors = args.unflavored.get("flavors").map(Vec::as_slice).or(flavors);
        for comp in args.unflavored.get("").into_iter().flatten() {
            let dir = paths::join([srcdir, comp.as_str()]);
            self.read_component(&dir, component_flavors)?;
        }
        Ok(closed)
    }

    fn parse_descriptor(
        &mut self,
        scanner: &mut Scanner<'_>,
        template: &Descriptor,
        srcdir: &str,
        flavors: Option<&[String]>,
    ) -> Result<bool> {
        let tname = scanner.expect_token()?.text.to_owned();
        let ParsedArgs {
            mut args,
            have_enabled,
            closed,
        } = Args::parse(scanner, self.cond_eval())?;

        let inherited = flavors.map_or_else(|| self.config.active_flavors.clone(), <[String]>::to_vec);
        let desc_flavors = match args.unflavored.shift_remove("flavors") {
            Some(explicit) if !explicit.is_empty() => explicit,
            _ if !args.flavors.is_empty() => inherited.clone(),
            _ => vec![String::new()],
        };

        for flavor in &desc_flavors {
            let mut merged = args.merged_for(flavor);
            if merged.shift_remove("enabled").is_none() && have_enabled {
                debug!(name = %tname, flavor = %flavor, "descriptor disabled");
                continue;
            }
            let only_for = if flavor.is_empty() {
                inherited.clone()
            } else {
                vec![flavor.clone()]
            };
            let mut desc = template.instantiate(scanner.file(), &tname, only_for);
            desc.parse(self, srcdir, &merged)?;
            self.descriptors.push(desc);
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests;
