//! Hark core library — config, provider app context, messaging client, and
//! the worker runtime used by the CLI.

pub mod config;
pub mod init;
pub mod messaging;
pub mod worker;
