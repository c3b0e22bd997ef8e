//! CLI command implementations.

pub mod args;
pub mod output;

pub mod check;
pub mod create;
pub mod document;
pub mod relations;
pub mod relocate;
pub mod tree;

pub use args::{Cli, Commands};
pub use output::Output;
