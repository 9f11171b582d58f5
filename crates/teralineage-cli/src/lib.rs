//! teralineage CLI library.
//!
//! Exposes internal types for testing purposes; the main entry point is the
//! `teralineage` binary in `main.rs`.

pub mod cli;
pub mod input;
pub mod output;

pub use cli::Args;
