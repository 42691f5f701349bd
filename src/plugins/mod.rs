//! Plugins linked into the binary.
//!
//! A tree enables a plugin by listing a path ending in its name under
//! `CONFIG`'s `extensions`.

mod collect_tests;
mod lsb_release;

pub use collect_tests::CollectTests;
pub use lsb_release::{LsbReleaseConditions, lsb_conditions};

use crate::registry::Plugin;
use std::sync::Arc;

/// Every plugin shipped with the binary.
#[must_use]
pub fn bundled() -> Vec<Arc<dyn Plugin>> {
    vec![Arc::new(CollectTests), Arc::new(LsbReleaseConditions)]
}
