//! propsync - translation round trips for `.properties` message files
//!
//! This crate provides the core functionality for the `propsync` CLI tool.
//!
//! # Architecture
//!
//! - [`properties`] - Format-preserving `.properties` documents
//! - [`model`] - Message file records and statuses
//! - [`snapshot`] - Cross-run record of primary files (the diff baseline)
//! - [`sync`] - Export diff, import merge, status
//! - [`sheets`] - Spreadsheet backends
//! - [`translate`] - Machine translation of blank cells
//! - [`vcs`] - Staging rewritten files
//! - [`config`] - Configuration management
//! - [`cli`] - Command-line interface using clap
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod properties;
pub mod sheets;
pub mod snapshot;
pub mod sync;
pub mod translate;
pub mod vcs;

pub use error::{Error, Result};
