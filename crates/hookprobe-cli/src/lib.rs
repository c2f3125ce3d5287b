//! hookprobe command-line harness - modules exposed for testing

pub mod commands;
pub mod common;
pub mod errors;

pub use common::GlobalOpts;
pub use errors::CliError;
