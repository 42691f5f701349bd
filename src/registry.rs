//! Extension tables consulted while parsing descriptors.
//!
//! A [`Registry`] is created empty for every run. Plugins populate it from
//! [`Plugin::startup`]; after start-up the parser only reads it.

use crate::descriptor::{Descriptor, GeneralDesc, LinkDesc, SpecialSrc};
use crate::error::{BuildError, Result};
use crate::ops::GlobalOps;
use crate::paths;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A source file handed to an extension handler.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    /// Directory the source was found in.
    pub srcdir: &'a str,
    /// Source reference as written.
    pub src: &'a str,
    /// Source with its extension stripped.
    pub base: &'a str,
}

/// Handler for a source extension in any descriptor.
pub type GeneralExtension = Arc<dyn Fn(&mut GeneralDesc, &Source<'_>) -> Result<()> + Send + Sync>;

/// Handler for a source extension in linking descriptors.
pub type LinkerExtension =
    Arc<dyn Fn(&mut GeneralDesc, &mut LinkDesc, &Source<'_>) -> Result<()> + Send + Sync>;

/// Handler for an extra argument key accepted by every descriptor.
pub type GeneralParam = Arc<dyn Fn(&mut GeneralDesc, &[String]) -> Result<()> + Send + Sync>;

/// Handler for an extra argument key accepted by linking descriptors.
pub type LinkerParam = Arc<dyn Fn(&mut LinkDesc, &[String]) -> Result<()> + Send + Sync>;

/// Replacement for generic target creation under a `specialsrcs` rule.
pub type SpecialSrcHandler =
    Arc<dyn Fn(&mut Descriptor, &GlobalOps, SpecialSrc) -> Result<()> + Send + Sync>;

/// A statically linked extension to the description language.
pub trait Plugin: Send + Sync {
    /// Name matched against the final element of a configured plugin path.
    fn name(&self) -> &str;

    /// Register handlers and adjust configuration.
    ///
    /// # Errors
    ///
    /// Any error aborts the run.
    fn startup(&self, ops: &mut GlobalOps) -> Result<()>;
}

/// Plugin-provided templates and handlers.
#[derive(Clone, Default)]
pub struct Registry {
    /// Directive name to descriptor template.
    pub descriptors: IndexMap<String, Descriptor>,
    /// Extra keys for every descriptor.
    pub general_params: IndexMap<String, GeneralParam>,
    /// Extra keys for linking descriptors.
    pub linker_params: IndexMap<String, LinkerParam>,
    /// Extension handlers for every descriptor.
    pub general_extensions: IndexMap<String, GeneralExtension>,
    /// Extension handlers for linking descriptors.
    pub linker_extensions: IndexMap<String, LinkerExtension>,
    /// `specialsrcs` rule overrides.
    pub special_srcs: IndexMap<String, SpecialSrcHandler>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("descriptors", &self.descriptors.keys().collect::<Vec<_>>())
            .field("general_params", &self.general_params.keys().collect::<Vec<_>>())
            .field("linker_params", &self.linker_params.keys().collect::<Vec<_>>())
            .field(
                "general_extensions",
                &self.general_extensions.keys().collect::<Vec<_>>(),
            )
            .field(
                "linker_extensions",
                &self.linker_extensions.keys().collect::<Vec<_>>(),
            )
            .field("special_srcs", &self.special_srcs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl GlobalOps {
    /// Start every plugin listed in `CONFIG`.
    ///
    /// Plugins are looked up by the final element of their normalised path.
    /// All missing plugins are reported together.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingPlugins`] when any plugin is not linked
    /// in, or the first error a plugin's start-up returns.
    pub fn startup_plugins(&mut self, srcdir: &str) -> Result<()> {
        let mut missing = Vec::new();
        for ppath in self.config.plugins.clone() {
            let normalized = paths::normalize(srcdir, &ppath);
            let Some(plugin) = self.available_plugins.get(paths::base(&normalized)).cloned() else {
                missing.push(normalized);
                continue;
            };
            debug!(plugin = plugin.name(), path = %normalized, "starting plugin");
            plugin.startup(self)?;
            self.plugin_paths.push(normalized);
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(BuildError::MissingPlugins { plugins: missing })
        }
    }
}
