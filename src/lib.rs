//! songshelf: an in-memory music library index.
//!
//! [`library::LibraryIndex`] walks a music directory, extracts one
//! [`library::Song`] per audio file and keeps the catalog cached until it
//! expires or the root directory changes. [`browse`] builds search and listing
//! views over a catalog snapshot.

pub mod browse;
pub mod config;
pub mod library;
pub mod logging;
