//! Command-line front end of `mqutil`: argument parsing, flag resolution, and
//! the command bodies that run inside a Pub/Sub session.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod resolve;

pub use cli::Cli;
pub use commands::{run, run_until};
pub use error::CliError;
pub use output::{Captured, Output};
pub use resolve::{Command, Invocation, TopicSpec, resolve};
