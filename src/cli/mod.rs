//! Command-line interface module.

mod args;
pub mod remote;
pub mod serve;

pub use args::{Cli, Commands};
