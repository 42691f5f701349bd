//! Per-descriptor Ninja files.

use super::write_list;
use crate::descriptor::{Descriptor, TargetOption};
use crate::ops::GlobalOps;
use crate::paths;
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// One `build` statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edge {
    /// Space-separated outputs.
    pub outputs: String,
    /// Ninja rule.
    pub rule: String,
    /// Explicit inputs.
    pub inputs: Vec<String>,
    /// Implicit dependencies, after `|`.
    pub implicit: Vec<String>,
    /// Order-only dependencies, after `||`.
    pub order_only: Vec<String>,
    /// Indented variable lines.
    pub vars: Vec<String>,
    /// Followed by a `default` statement.
    pub is_default: bool,
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "build {}: {}", self.outputs, self.rule)?;
        write_list(f, &self.inputs)?;
        if !self.implicit.is_empty() {
            write!(f, " |")?;
            write_list(f, &self.implicit)?;
        }
        if !self.order_only.is_empty() {
            write!(f, " ||")?;
            write_list(f, &self.order_only)?;
        }
        writeln!(f)?;
        for var in &self.vars {
            writeln!(f, "    {var}")?;
        }
        if self.is_default {
            writeln!(f, "default {}", self.outputs)?;
        }
        Ok(())
    }
}

/// The Ninja file of one descriptor in one flavor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorFile {
    /// Variable and include lines before the edges.
    pub header: Vec<String>,
    /// Edges in target name order.
    pub edges: Vec<Edge>,
}

impl DescriptorFile {
    /// Build the file for `desc` placed in object directory `objdir`.
    #[must_use]
    pub fn new(ops: &GlobalOps, desc: &Descriptor, objdir: &str) -> Self {
        Self {
            header: header(desc, objdir),
            edges: edges(ops, desc),
        }
    }

    /// Outputs of edges marked as defaults.
    #[must_use]
    pub fn defaults(&self) -> Vec<String> {
        self.edges
            .iter()
            .filter(|e| e.is_default)
            .map(|e| e.outputs.clone())
            .collect()
    }
}

impl Display for DescriptorFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for line in &self.header {
            writeln!(f, "{line}")?;
        }
        for edge in &self.edges {
            write!(f, "{edge}")?;
        }
        Ok(())
    }
}

fn header(desc: &Descriptor, objdir: &str) -> Vec<String> {
    let g = &desc.general;
    let mut lines = vec![format!("objdir=$builddir/{objdir}")];
    lines.extend(g.extravars.iter().map(|ev| format!("include {ev}")));
    lines.extend(
        g.buildvars
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(key, values)| format!("{key}={}", values.join(" "))),
    );
    lines.extend(desc.kind.link().and_then(crate::descriptor::LinkDesc::includes_line));
    lines
}

fn edges(ops: &GlobalOps, desc: &Descriptor) -> Vec<Edge> {
    let g = &desc.general;
    let mut seen_multi: BTreeSet<&str> = BTreeSet::new();
    let mut edges = Vec::new();
    for (tname, target) in &g.targets {
        let deps = desc.resolve_deps(ops, tname);
        if target.sources.is_empty() && deps.is_empty() && !target.has(TargetOption::EmptySrcs) {
            continue;
        }
        let destdir = target.resolve_dest();
        let outputs = if target.multi_target.is_empty() {
            paths::join([destdir.as_str(), tname.as_str()])
        } else {
            if seen_multi.contains(tname.as_str()) {
                continue;
            }
            seen_multi.extend(target.multi_target.iter().map(String::as_str));
            target
                .multi_target
                .iter()
                .map(|name| paths::join([destdir.as_str(), name.as_str()]))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let mut vars: Vec<String> = target
            .extraargs
            .iter()
            .map(|arg| match arg.split_once('=') {
                Some((key, value)) => format!("{key}={}", ops.resolve_collected_var(value.trim())),
                None => arg.clone(),
            })
            .collect();
        if !target.srcopts.is_empty() {
            vars.push(format!("srcopts={}", target.srcopts.join(" ")));
        }

        edges.push(Edge {
            outputs,
            rule: target.rule.clone(),
            inputs: g.resolve_srcs(ops, tname, &target.sources),
            implicit: deps,
            order_only: desc.resolve_order_deps(target),
            vars,
            is_default: target.has(TargetOption::All),
        });
    }
    edges
}
