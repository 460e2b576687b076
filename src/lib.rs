//! lingo-sync
//!
//! Keeps the per-locale translation documents, the feature template and the translation
//! service's locale files in sync.

pub mod config;
pub mod document;
pub mod error;
pub mod external;
pub mod feature;
pub mod locale;
pub mod pipeline;
pub mod types;
pub mod validate;

mod test_utils;

pub use error::SyncError;
