//! API Module
//!
//! Command implementations behind the `phishguard-train` binary. Each
//! command returns a serializable result; printing is left to `main`.

pub mod commands;

pub use commands::*;
