//! `INSTALL` and `TOOL_INSTALL`: copy files and create symlinks.

use super::general::GeneralDesc;
use super::target::TargetOption;
use crate::args::ArgMap;
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::ops::GlobalOps;
use std::collections::BTreeMap;

/// Argument key to the rule installing files listed under it.
pub const INSTALL_COMMANDS: [(&str, &str); 4] = [
    ("conf", "install_conf"),
    ("scripts", "install_script"),
    ("python", "install_py"),
    ("php", "install_php"),
];

/// Install descriptor state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallDesc {
    /// Globbed files per argument key.
    pub installs: BTreeMap<String, Vec<String>>,
    /// `(link, target)` pairs.
    pub symlinks: Vec<(String, String)>,
}

impl InstallDesc {
    pub(super) fn glob_installs(&mut self, ops: &mut GlobalOps, realsrcdir: &str, args: &ArgMap) {
        for (key, _) in INSTALL_COMMANDS {
            if let Some(patterns) = args.get(key).filter(|p| !p.is_empty()) {
                let found = ops.glob_dir(realsrcdir, patterns);
                self.installs.entry(key.to_owned()).or_default().extend(found);
            }
        }
    }

    pub(super) fn parse_symlinks(&mut self, g: &GeneralDesc, args: &ArgMap) -> Result<(), ParseError> {
        for sym in args.get("symlink").into_iter().flatten() {
            let Some((link, target)) = sym.split_once(':') else {
                return Err(ParseError::new(ParseErrorKind::BadSymlink, sym, g.builddesc.clone()));
            };
            self.symlinks.push((link.to_owned(), target.to_owned()));
        }
        Ok(())
    }

    /// Files land in `destdir[...]`, or a directory named after the target.
    pub(super) fn finalize(&mut self, g: &mut GeneralDesc) -> Result<()> {
        let destdir = if g.destdir.is_empty() {
            g.target_name.clone()
        } else {
            g.destdir.clone()
        };
        let srcdir = g.srcdir.clone();
        for (key, rule) in INSTALL_COMMANDS {
            for src in self.installs.get(key).into_iter().flatten() {
                g.add_target(src, rule, vec![src.clone()], &destdir, &srcdir)?
                    .with_options([TargetOption::All]);
            }
        }
        for (link, target) in &self.symlinks {
            g.add_target(link, "symlink", Vec::new(), &destdir, &destdir)?
                .with_args([format!("target={target}")])
                .with_options([TargetOption::All, TargetOption::EmptySrcs]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(entries: &[(&str, &[&str])]) -> ArgMap {
        entries
            .iter()
            .map(|(key, values)| ((*key).to_owned(), values.iter().map(|v| (*v).to_owned()).collect()))
            .collect()
    }

    #[test]
    fn symlink_needs_a_target() {
        let g = GeneralDesc {
            builddesc: "conf/Builddesc".to_owned(),
            ..GeneralDesc::default()
        };
        let mut desc = InstallDesc::default();
        let err = desc
            .parse_symlinks(&g, &args(&[("symlink", &["dangling"])]))
            .expect_err("bad symlink");
        assert_eq!(err.kind, ParseErrorKind::BadSymlink);
        assert_eq!(err.token, "dangling");
    }

    #[test]
    fn symlink_keeps_colons_in_target() {
        let mut desc = InstallDesc::default();
        desc.parse_symlinks(&GeneralDesc::default(), &args(&[("symlink", &["current:a:b"])]))
            .expect("parse");
        assert_eq!(desc.symlinks, [("current".to_owned(), "a:b".to_owned())]);
    }

    #[test]
    fn destination_defaults_to_target_name() {
        let mut g = GeneralDesc {
            target_name: "etc".to_owned(),
            srcdir: "conf".to_owned(),
            ..GeneralDesc::default()
        };
        let mut desc = InstallDesc::default();
        desc.installs.insert("conf".to_owned(), vec!["app.conf".to_owned()]);
        desc.installs.insert("scripts".to_owned(), vec!["run.sh".to_owned()]);
        desc.symlinks.push(("app.link".to_owned(), "app.conf".to_owned()));
        desc.finalize(&mut g).expect("finalize");

        let conf = &g.targets["app.conf"];
        assert_eq!(conf.rule, "install_conf");
        assert_eq!(conf.destdir, "etc");
        assert!(conf.has(TargetOption::All));
        assert_eq!(g.targets["run.sh"].rule, "install_script");
        assert_eq!(g.srcdirs["run.sh"], "conf");

        let link = &g.targets["app.link"];
        assert_eq!(link.rule, "symlink");
        assert!(link.sources.is_empty());
        assert_eq!(link.extraargs, ["target=app.conf"]);
        assert!(link.has(TargetOption::EmptySrcs));
    }
}
