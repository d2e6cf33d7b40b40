//! Interactive subcommands

pub mod init;

pub use init::{run_init, PromptInitializer};
