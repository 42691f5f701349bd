//! Build targets accumulated by descriptors.

use crate::paths;
use std::collections::BTreeSet;

/// Flags controlling how a target is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetOption {
    /// Default build output, aggregated into the flavor phony.
    All,
    /// Emit even without sources or dependencies.
    EmptySrcs,
    /// Order-only dependency on generated headers.
    Incdeps,
    /// Implicit dependency on our static libraries.
    Libdeps,
    /// Implicit dependency on our position-independent libraries.
    Piclibdeps,
    /// Marks library outputs.
    Lib,
}

/// Option set carried by a target or a descriptor template.
pub type TargetOptions = BTreeSet<TargetOption>;

/// Destination aliases and the Ninja path prefix they expand to.
const DEST_LOOKUP: [(&str, &str); 10] = [
    ("obj", "$objdir/"),
    ("objdir", "$objdir/"),
    ("dest_inc", "$incdir/"),
    ("dest_bin", "$dest_bin/"),
    ("dest_tool", "$buildtools/"),
    ("dest_lib", "$libdir/"),
    ("dest_mod", "$dest_mod/"),
    ("destroot", "$destroot/"),
    ("builddir", "$builddir/"),
    ("flavorroot", "$flavorroot/"),
];

/// Expand a destination alias into a Ninja path.
///
/// The first path element is looked up as an alias; anything unknown is
/// placed below `$destroot`.
///
/// # Examples
///
/// ```
/// use builddesc::descriptor::resolve_dest;
/// assert_eq!(resolve_dest("obj"), "$objdir");
/// assert_eq!(resolve_dest("dest_inc/foo"), "$incdir/foo");
/// assert_eq!(resolve_dest("share/doc"), "$destroot/share/doc");
/// assert_eq!(resolve_dest(""), "$destroot");
/// ```
#[must_use]
pub fn resolve_dest(destdir: &str) -> String {
    let (first, rest) = destdir.split_once('/').unwrap_or((destdir, ""));
    match DEST_LOOKUP.iter().find(|(alias, _)| *alias == first) {
        Some((_, prefix)) => paths::join([*prefix, rest]),
        None => paths::join(["$destroot", destdir]),
    }
}

/// One build edge to emit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// Ninja rule.
    pub rule: String,
    /// Unresolved source references.
    pub sources: Vec<String>,
    /// Extra implicit dependencies.
    pub deps: Vec<String>,
    /// Per-source options gathered from the descriptor.
    pub srcopts: Vec<String>,
    /// Destination alias, see [`resolve_dest`].
    pub destdir: String,
    /// `key=value` lines scoped to the edge.
    pub extraargs: Vec<String>,
    /// Emission flags.
    pub options: TargetOptions,
    /// Collected variable this target is recorded under.
    pub collect_as: Option<String>,
    /// Generated headers this target must not wait for.
    pub incdeps_except: BTreeSet<String>,
    /// Every output name when the edge produces several files.
    pub multi_target: Vec<String>,
}

impl Target {
    /// Destination directory as a Ninja path.
    #[must_use]
    pub fn resolve_dest(&self) -> String {
        resolve_dest(&self.destdir)
    }

    /// Whether `option` is set.
    #[must_use]
    pub fn has(&self, option: TargetOption) -> bool {
        self.options.contains(&option)
    }

    /// Replace the edge arguments.
    pub fn with_args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extraargs = args.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the option set.
    pub fn with_options<I>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = TargetOption>,
    {
        self.options = options.into_iter().collect();
        self
    }
}
