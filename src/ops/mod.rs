//! The root aggregate threaded through every phase of a run.
//!
//! [`GlobalOps`] owns the configuration, the descriptor list, the library
//! registry and the collected-variable table. It is created once, mutated
//! while description files are read and finalized, and only read while the
//! Ninja files are rendered.

mod glob;
mod read;

pub use glob::{FsGlobber, Globber};
pub use read::{BUILDDESC, BUILDDESC_TOP};

use crate::args::{CondEval, Conditions};
use crate::compiler::{CompilerId, VersionCheck};
use crate::config::{Config, FlavorConfig};
use crate::descriptor::{Descriptor, templates};
use crate::error::{BuildError, Result};
use crate::libs::LibRegistry;
use crate::paths;
use crate::registry::{Plugin, Registry};
use camino::Utf8Path;
use cap_std::fs_utf8::Dir;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Invocation options that influence parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// If non-empty, only these declared flavors are active.
    pub with_flavors: BTreeSet<String>,
    /// Declared flavors to drop.
    pub without_flavors: BTreeSet<String>,
    /// Conditions forced on from the command line.
    pub conditions: Conditions,
    /// Config-variable files placed before those named by `CONFIG`.
    pub configvars: Vec<String>,
    /// Suppress progress messages.
    pub quiet: bool,
}

/// Whether reading should carry on after a hook ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading description files.
    Continue,
    /// Stop reading; an existing build file will be used instead.
    Handoff,
}

/// Callback run once the configuration is known.
pub type PostConfigHook = Box<dyn FnMut(&GlobalOps) -> Result<Flow>>;

/// An analysis output aggregated into the per-flavor `analyse` edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analyser {
    /// Path of the marker below the flavor build directory.
    pub target_name: String,
    /// Flavors this analysis applies to; empty means all.
    pub only_for_flavors: Vec<String>,
}

impl Analyser {
    /// Whether this analysis applies to `flavor`.
    #[must_use]
    pub fn valid_for_flavor(&self, flavor: &str) -> bool {
        self.only_for_flavors.is_empty() || self.only_for_flavors.iter().any(|f| f == flavor)
    }
}

/// Root aggregate for one run.
pub struct GlobalOps {
    /// Invocation options.
    pub options: Options,
    /// Result of reading `CONFIG`.
    pub config: Config,
    /// Per-flavor configuration, one entry per active flavor.
    pub flavor_configs: BTreeMap<String, FlavorConfig>,
    /// Plugin-provided templates and handlers.
    pub registry: Registry,
    /// Every parsed descriptor, including per-flavor copies.
    pub descriptors: Vec<Descriptor>,
    /// Libraries by name.
    pub libs: LibRegistry,
    /// Analysis markers gathered during finalize.
    pub analyses: Vec<Analyser>,
    /// Collected variables: name to target paths.
    pub collected_vars: BTreeMap<String, Vec<String>>,
    /// Every description file or globbed directory read, possibly repeated.
    pub builddescs: Vec<String>,
    /// Compiler identity used in the top build file.
    pub compiler: CompilerId,
    /// Checks requested by finalized descriptors.
    pub version_checks: BTreeSet<VersionCheck>,
    /// Output of `buildversion_script`.
    pub buildversion: String,
    /// Normalised paths of started plugins, regeneration inputs.
    pub plugin_paths: Vec<String>,
    root: Dir,
    globber: Box<dyn Globber>,
    post_config: Option<PostConfigHook>,
    handoff: bool,
    pub(crate) available_plugins: BTreeMap<String, Arc<dyn Plugin>>,
}

impl fmt::Debug for GlobalOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalOps")
            .field("options", &self.options)
            .field("config", &self.config)
            .field("descriptors", &self.descriptors.len())
            .field("libs", &self.libs)
            .field("collected_vars", &self.collected_vars)
            .field("compiler", &self.compiler)
            .field("handoff", &self.handoff)
            .finish_non_exhaustive()
    }
}

impl GlobalOps {
    /// Create the aggregate for a tree rooted at `root`.
    ///
    /// `buildpath` is the default output directory, normally taken from
    /// the `BUILDPATH` environment variable.
    #[must_use]
    pub fn new(options: Options, root: Dir, globber: Box<dyn Globber>, buildpath: Option<&str>) -> Self {
        let mut config = Config::new(buildpath);
        config.conditions.extend(options.conditions.iter().cloned());
        config.configvars.extend(options.configvars.iter().cloned());
        Self {
            options,
            config,
            flavor_configs: BTreeMap::new(),
            registry: Registry::default(),
            descriptors: Vec::new(),
            libs: LibRegistry::default(),
            analyses: Vec::new(),
            collected_vars: BTreeMap::new(),
            builddescs: Vec::new(),
            compiler: CompilerId::default(),
            version_checks: BTreeSet::new(),
            buildversion: String::new(),
            plugin_paths: Vec::new(),
            root,
            globber,
            post_config: None,
            handoff: false,
            available_plugins: BTreeMap::new(),
        }
    }

    /// Make `plugin` available to `CONFIG`'s `extensions` list.
    pub fn provide_plugin(&mut self, plugin: Arc<dyn Plugin>) {
        self.available_plugins.insert(plugin.name().to_owned(), plugin);
    }

    /// Install the callback run once `CONFIG` has been read.
    pub fn set_post_config(&mut self, hook: PostConfigHook) {
        self.post_config = Some(hook);
    }

    /// Whether the post-config hook asked to stop reading.
    #[must_use]
    pub const fn handed_off(&self) -> bool {
        self.handoff
    }

    /// The directory description files are read from.
    #[must_use]
    pub const fn root(&self) -> &Dir {
        &self.root
    }

    /// Condition evaluation against the current condition set.
    #[must_use]
    pub const fn cond_eval(&self) -> CondEval<'_> {
        CondEval::Against(&self.config.conditions)
    }

    /// Look a directive name up among plugin templates, then built-ins.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<Descriptor> {
        self.registry
            .descriptors
            .get(name)
            .cloned()
            .or_else(|| templates::builtin(name))
    }

    pub(crate) fn run_post_config(&mut self) -> Result<Flow> {
        let Some(mut hook) = self.post_config.take() else {
            return Ok(Flow::Continue);
        };
        let flow = hook(self)?;
        self.post_config = Some(hook);
        if flow == Flow::Handoff {
            self.handoff = true;
        }
        Ok(flow)
    }

    /// Read a description file and record it as a regeneration input.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] when the file cannot be read.
    pub fn open_builddesc(&mut self, file: &str) -> Result<String> {
        let text = self
            .root
            .read_to_string(Utf8Path::new(file))
            .map_err(|err| BuildError::io(file, err))?;
        self.builddescs.push(file.to_owned());
        Ok(text)
    }

    /// Whether `file` exists below the root.
    #[must_use]
    pub fn exists(&self, file: &str) -> bool {
        self.root.exists(Utf8Path::new(file))
    }

    /// Files in the directories of started plugins, regeneration inputs.
    ///
    /// Hidden files and editor backups (`~` suffix) are skipped. Plugin
    /// paths that are not directories below the root contribute nothing.
    #[must_use]
    pub fn plugin_deps(&self) -> Vec<String> {
        let mut deps = Vec::new();
        for ppath in &self.plugin_paths {
            let Ok(entries) = self.root.read_dir(Utf8Path::new(ppath)) else {
                debug!(path = %ppath, "plugin directory not on disk");
                continue;
            };
            let names: BTreeSet<String> = entries
                .filter_map(|entry| entry.and_then(|e| e.file_name()).ok())
                .filter(|name| !name.starts_with('.') && !name.ends_with('~'))
                .collect();
            deps.extend(names.iter().map(|name| paths::join([ppath.as_str(), name.as_str()])));
        }
        deps
    }

    /// Expand glob patterns in `srcs` relative to `srcdir`.
    ///
    /// A pattern that matches nothing, or contains no metacharacters, is
    /// returned unchanged. An empty source stays empty. Results are
    /// deduplicated in first-seen order.
    pub fn glob_dir(&mut self, srcdir: &str, srcs: &[String]) -> Vec<String> {
        let prefix = if srcdir.is_empty() || srcdir.ends_with('/') {
            srcdir.to_owned()
        } else {
            format!("{srcdir}/")
        };
        let mut found = Vec::new();
        for src in srcs {
            if src.is_empty() {
                found.push(String::new());
                continue;
            }
            self.register_glob(&prefix, src);
            let pattern = format!("{prefix}{src}");
            let hits = match self.globber.glob(&pattern) {
                Ok(hits) if hits.is_empty() => vec![pattern],
                Ok(hits) => hits,
                Err(err) => {
                    warn!(error = %err, "glob failed");
                    continue;
                }
            };
            found.extend(
                hits.into_iter()
                    .map(|hit| hit.strip_prefix(&prefix).map(str::to_owned).unwrap_or(hit)),
            );
        }
        found.into_iter().unique().collect()
    }

    /// Record the directories a glob pattern depends on.
    fn register_glob(&mut self, srcdir: &str, src: &str) {
        if !paths::has_glob_meta(paths::base(src)) {
            return;
        }
        let parent = paths::dir(src);
        self.register_glob(srcdir, &parent);
        let dir_pattern = paths::join([srcdir, parent.as_str()]);
        match self.globber.glob(&dir_pattern) {
            Ok(dirs) => self.builddescs.extend(dirs),
            Err(err) => warn!(error = %err, "glob failed"),
        }
    }

    /// Substitute a `$name` reference with the collected variable `name`.
    ///
    /// Anything else, including unknown names, is returned unchanged.
    #[must_use]
    pub fn resolve_collected_var(&self, src: &str) -> String {
        src.strip_prefix('$')
            .and_then(|name| self.collected_vars.get(name))
            .map_or_else(|| src.to_owned(), |paths| paths.join(" "))
    }

    /// Finalize every descriptor in parse order.
    ///
    /// # Errors
    ///
    /// Stops at the first descriptor that fails to finalize.
    pub fn run_finalizers(&mut self) -> Result<()> {
        let mut descriptors = std::mem::take(&mut self.descriptors);
        let outcome = descriptors.iter_mut().try_for_each(|desc| desc.finalize(self));
        self.descriptors = descriptors;
        outcome
    }
}

#[cfg(test)]
mod tests;
