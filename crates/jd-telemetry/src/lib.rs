//! Logging setup shared by the jiradeck binaries.
//!
//! Log lines go to stderr so that command output on stdout stays clean for
//! piping.

pub mod logging;
