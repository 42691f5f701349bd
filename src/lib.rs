//! Builddesc core library.
//!
//! Reads a tree of `Builddesc` build descriptions, resolves flavors,
//! conditions and library dependencies, and renders the result as a set of
//! Ninja files. The [`runner`] module drives a complete invocation.

pub mod args;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod libs;
pub mod ninja_gen;
pub mod ops;
pub mod paths;
pub mod plugins;
pub mod registry;
pub mod runner;
pub mod scanner;

#[cfg(test)]
mod testing;
