//! Conditions describing the host distribution, from `lsb_release -ric`.
//!
//! Ubuntu 16.04 adds `ubuntu`, `ubuntu16`, `ubuntu16_04` and `xenial`;
//! without `lsb_release` only `no_lsb_release` is added.

use crate::error::Result;
use crate::ops::GlobalOps;
use crate::registry::Plugin;
use std::process::{Command, Stdio};
use tracing::debug;

/// Adds distribution conditions at start-up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LsbReleaseConditions;

impl Plugin for LsbReleaseConditions {
    fn name(&self) -> &str {
        "lsb_release_conditions"
    }

    fn startup(&self, ops: &mut GlobalOps) -> Result<()> {
        let output = Command::new("lsb_release")
            .arg("-ric")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|out| out.status.success())
            .map(|out| String::from_utf8_lossy(&out.stdout).into_owned())
            .unwrap_or_default();
        let conditions = lsb_conditions(&output);
        debug!(?conditions, "lsb_release conditions");
        ops.config.conditions.extend(conditions);
        Ok(())
    }
}

/// Derive conditions from `lsb_release -ric` output.
///
/// # Examples
///
/// ```
/// use builddesc::plugins::lsb_conditions;
/// let out = "Distributor ID:\tCentOS\nRelease:\t7.3.1611\nCodename:\tCore\n";
/// assert_eq!(lsb_conditions(out), ["centos", "centos7", "centos7_3", "core"]);
/// ```
#[must_use]
pub fn lsb_conditions(output: &str) -> Vec<String> {
    let mut id = String::new();
    let mut major = String::new();
    let mut minor = String::new();
    let mut codename = String::new();
    for (key, raw) in output.lines().filter_map(|line| line.split_once(':')) {
        let value = raw.trim().to_lowercase();
        match key {
            "Distributor ID" => id = value,
            "Release" => {
                if let Some((maj, rest)) = value.split_once('.').filter(|(maj, _)| !maj.is_empty()) {
                    major = maj.to_owned();
                    minor = rest.split('.').next().unwrap_or_default().to_owned();
                }
            }
            "Codename" => codename = value.chars().filter(|c| c.is_alphanumeric()).collect(),
            _ => {}
        }
    }
    if id.is_empty() {
        return vec!["no_lsb_release".to_owned()];
    }
    let mut conditions = vec![id.clone()];
    if !major.is_empty() {
        conditions.push(format!("{id}{major}"));
    }
    if !minor.is_empty() {
        conditions.push(format!("{id}{major}_{minor}"));
    }
    if !codename.is_empty() {
        conditions.push(codename);
    }
    conditions
}
