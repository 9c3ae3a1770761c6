//! CLI operations. Each subcommand is an [`Op`]: a clap `Args` struct with
//! a typed error and an `execute` that returns the text to print.

pub mod op;
pub mod ops;

pub use op::{Op, OpContext};
