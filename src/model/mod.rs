//! Data models for propsync.
//!
//! This module contains the domain models:
//! - MessageFile (snapshot record of one primary file)
//! - PropertyMap (per-mutation values and statuses)
//! - PropertyStatus

pub mod message_file;
pub mod status;

pub use message_file::{MessageFile, PropertyMap};
pub use status::PropertyStatus;
