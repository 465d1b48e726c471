//! l10n-sync
//!
//! Keeps the UI strings of several platforms, each with its own resource
//! format and placeholder syntax, in one translation store, and writes
//! localized resources back for every platform.

pub mod config;
pub mod extract;
pub mod mapping;
pub mod pipeline;
pub mod placeholder;
pub mod report;
pub mod store;
pub mod translation;
pub mod vcs;
pub mod workspace;
