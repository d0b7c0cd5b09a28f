//! # statechart-storage
//!
//! Document storage for statechart models.
//!
//! This crate provides:
//! - Loading a model from a document file
//! - Writing a model through a temporary file and rename
//! - CRC32C checksums of written documents

pub mod error;
pub mod store;

pub use error::StorageError;
pub use store::{
    checksum, checksum_file, decode, encode, load, write, write_with, ModelFile, WriteOptions,
    WriteSummary,
};
