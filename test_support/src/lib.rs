//! Test utilities shared by the integration tests.
//!
//! Provides fake Ninja executables, a builder for description trees with
//! a rule runtime next to them, and guards serialising environment
//! mutations.

pub mod env_lock;
pub mod env_var_guard;
pub mod fake_ninja;
pub mod tree;

pub use fake_ninja::{FakeNinja, fake_ninja, fake_ninja_capture};
pub use tree::DescTree;
