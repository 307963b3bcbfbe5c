//! Library side of the `specimen` command-line tool.

pub mod commands;
pub mod logging;
