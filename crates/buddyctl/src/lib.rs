//! buddyctl library - exposes command handlers for integration tests

pub mod commands;
pub mod errors;
pub mod logging;
pub mod output;
