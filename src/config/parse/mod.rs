//! Interpretation of the `CONFIG` directive.

use super::{FlavorConfig, script};
use crate::args::{Args, CondEval, ParsedArgs};
use crate::error::{ParseErrorKind, Result};
use crate::ops::{Flow, GlobalOps};
use crate::paths;
use crate::scanner::Scanner;
use tracing::debug;

impl GlobalOps {
    /// Read a `CONFIG` body, then run the post-config hook, the config
    /// script and plugin start-up.
    ///
    /// Returns whether the body was closed by `)`.
    pub(crate) fn parse_config(&mut self, scanner: &mut Scanner<'_>, srcdir: &str) -> Result<bool> {
        let closed = self.parse_config_body(scanner, srcdir)?;
        if self.run_post_config()? == Flow::Handoff {
            return Ok(closed);
        }
        if !self.config.config_script.is_empty() {
            let output = script::run_config_script(&self.config.config_script)?;
            self.config.buildparams.extend(output.buildparams);
            self.config.conditions.extend(output.conditions);
        }
        self.startup_plugins(srcdir)?;
        Ok(closed)
    }

    fn parse_config_body(&mut self, scanner: &mut Scanner<'_>, srcdir: &str) -> Result<bool> {
        let ParsedArgs { mut args, closed, .. } = Args::parse(scanner, CondEval::Disallowed)?;

        if let Some(declared) = args.unflavored.shift_remove("flavors") {
            let with = &self.options.with_flavors;
            let without = &self.options.without_flavors;
            self.config.all_flavors = declared.iter().cloned().collect();
            self.config.active_flavors = declared
                .into_iter()
                .filter(|fl| with.is_empty() || with.contains(fl))
                .filter(|fl| !without.contains(fl))
                .collect();
        }
        if let Some(bad) = args.flavors.keys().find(|fl| !self.config.all_flavors.contains(*fl)) {
            return Err(scanner.error(ParseErrorKind::BadFlavor, bad).into());
        }

        // Local files go before included ones; rule and variable files are
        // order sensitive.
        for (key, list) in [
            ("configvars", &mut self.config.configvars),
            ("rules", &mut self.config.rules),
            ("extravars", &mut self.config.extravars),
            ("godeps", &mut self.config.godeps),
        ] {
            for file in args.unflavored.shift_remove(key).unwrap_or_default() {
                list.push(paths::join([srcdir, file.as_str()]));
            }
        }

        for dep in args.unflavored.shift_remove("ruledeps").unwrap_or_default() {
            let Some((rule, deps)) = dep.split_once(':') else {
                return Err(scanner.error(ParseErrorKind::BadRuledeps, &dep).into());
            };
            self.config
                .ruledeps
                .entry(rule.to_owned())
                .or_default()
                .extend(deps.split(',').map(str::to_owned));
        }

        self.config
            .compiler
            .extend(args.unflavored.shift_remove("compiler").unwrap_or_default());

        for inc in args.unflavored.shift_remove("INCLUDE").unwrap_or_default() {
            let file = paths::normalize(srcdir, &inc);
            debug!(file = %file, "including configuration");
            let text = self.open_builddesc(&file)?;
            let mut included = Scanner::new(&text, file.clone());
            let incdir = paths::dir(&file);
            let base = if incdir == "." { "" } else { incdir.as_str() };
            self.parse_config_body(&mut included, base)?;
        }

        for (key, list) in [
            ("buildvars", &mut self.config.buildvars),
            ("extensions", &mut self.config.plugins),
            ("invars", &mut self.config.invars),
        ] {
            list.extend(args.unflavored.shift_remove(key).unwrap_or_default());
        }

        for (key, value) in [
            ("buildversion_script", &mut self.config.buildversion_script),
            ("buildpath", &mut self.config.buildpath),
            ("config_script", &mut self.config.config_script),
            ("compiler_rule_dir", &mut self.config.compiler_rule_dir),
            ("flavor_rule_dir", &mut self.config.flavor_rule_dir),
            ("compiler_flavor_rule_dir", &mut self.config.compiler_flavor_rule_dir),
            ("godeps_rule", &mut self.config.godeps_rule),
            ("builtin_invars", &mut self.config.builtin_invars),
        ] {
            if let Some(words) = args.unflavored.shift_remove(key) {
                *value = words.join(" ");
            }
        }

        self.config
            .conditions
            .extend(args.unflavored.shift_remove("conditions").unwrap_or_default());

        for flavor in &self.config.active_flavors {
            let conf: &mut FlavorConfig = self.flavor_configs.entry(flavor.clone()).or_default();
            let Some(flargs) = args.flavors.get_mut(flavor) else {
                continue;
            };
            if let Some(prefix) = flargs.shift_remove("prefix") {
                conf.prefix = prefix.join(" ");
            }
            conf.extravars
                .extend(flargs.shift_remove("extravars").unwrap_or_default());
            if let Some(cflags) = flargs.shift_remove("cflags") {
                conf.cflags = cflags.join(" ");
            }
            if let Some(unknown) = flargs.keys().next() {
                return Err(scanner
                    .error(ParseErrorKind::FlavoredConfigUnknownArg, unknown)
                    .into());
            }
        }
        for key in ["prefix", "cflags"] {
            if args.unflavored.contains_key(key) {
                return Err(scanner.error(ParseErrorKind::ConfigMustBeFlavored, key).into());
            }
        }
        if let Some(unknown) = args.unflavored.keys().next() {
            return Err(scanner.error(ParseErrorKind::ConfigUnknownArg, unknown).into());
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests;
