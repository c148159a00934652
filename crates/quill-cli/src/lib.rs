//! Quill CLI
//!
//! Library half of the `quill` binary: argument parsing, logging setup and
//! the subcommands.
//!
//! ```text
//! quill classify [FILE] [--filename NAME] [--scores]
//! quill replay FILE [--kind code|web|text] [--chunk N] [--json]
//! quill run FILE [--images DIR] [--json]
//! quill preview FILE... [--kind code|web|text] [-o OUT]
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{build_cli, GlobalArgs, Invocation};
pub use commands::{dispatch, ReplayOptions, ReplayReport, RunOptions};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
