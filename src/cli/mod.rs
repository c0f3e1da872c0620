//! Command-line interface module.

mod args;
pub mod plan;
pub mod publish;
pub mod reset;

pub use args::{Cli, Commands, PublishArgs};
