//! Model document files.

use crate::error::StorageError;
use statechart_core::{Document, Model};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Options controlling how documents are written.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Indent the JSON output.
    pub pretty: bool,
    /// Sync the file to disk before it replaces the previous document.
    pub fsync: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            fsync: true,
        }
    }
}

impl WriteOptions {
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }
}

/// Result of a document write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub checksum: String,
}

/// Computes the CRC32C checksum of document bytes as 8 hex digits.
pub fn checksum(data: &[u8]) -> String {
    format!("{:08x}", crc32c::crc32c(data))
}

/// Computes the checksum of an existing document file.
pub fn checksum_file(path: impl AsRef<Path>) -> Result<String, StorageError> {
    let data = fs::read(path.as_ref())?;
    Ok(checksum(&data))
}

/// Serializes a model to document bytes.
///
/// Fails if any geometry is NaN or infinite, since such a document could not
/// be loaded back.
pub fn encode(model: &Model, options: &WriteOptions) -> Result<Vec<u8>, StorageError> {
    let doc = model.to_document();
    doc.ensure_finite()?;
    let mut data = if options.pretty {
        serde_json::to_vec_pretty(&doc)?
    } else {
        serde_json::to_vec(&doc)?
    };
    data.push(b'\n');
    Ok(data)
}

/// Rebuilds a model from document bytes.
pub fn decode(data: &[u8]) -> Result<Model, StorageError> {
    let doc: Document = serde_json::from_slice(data)?;
    Ok(Model::from_document(&doc)?)
}

/// Loads a model from a document file.
///
/// A failed load never yields a partial model.
pub fn load(path: impl AsRef<Path>) -> Result<Model, StorageError> {
    let path = path.as_ref();
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    match decode(&data) {
        Ok(model) => {
            tracing::info!(
                "Loaded model '{}' from {} ({} states, {} transitions, {} actions)",
                model.name(),
                path.display(),
                model.state_count(),
                model.transition_count(),
                model.registry().len()
            );
            Ok(model)
        }
        Err(e) => {
            tracing::warn!("Failed to load model from {}: {}", path.display(), e);
            Err(e)
        }
    }
}

/// Writes a model with default options.
pub fn write(path: impl AsRef<Path>, model: &Model) -> Result<WriteSummary, StorageError> {
    write_with(path, model, &WriteOptions::default())
}

/// Writes a model to `path`.
///
/// The document is written to a sibling temporary file which then replaces
/// `path`, so an interrupted write leaves the previous document intact.
pub fn write_with(
    path: impl AsRef<Path>,
    model: &Model,
    options: &WriteOptions,
) -> Result<WriteSummary, StorageError> {
    let path = path.as_ref();
    let data = encode(model, options)?;
    let tmp_path = temp_path(path);

    if let Err(e) = write_file(&tmp_path, &data, options.fsync) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    let summary = WriteSummary {
        path: path.to_path_buf(),
        size_bytes: data.len() as u64,
        checksum: checksum(&data),
    };

    tracing::info!(
        "Wrote model '{}' to {} ({} bytes, checksum {})",
        model.name(),
        path.display(),
        summary.size_bytes,
        summary.checksum
    );

    Ok(summary)
}

fn write_file(path: &Path, data: &[u8], fsync: bool) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    if fsync {
        file.sync_all()?;
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// File lifecycle of a [`Model`].
pub trait ModelFile: Sized {
    /// Loads a model from a document file.
    fn load(path: impl AsRef<Path>) -> Result<Self, StorageError>;

    /// Writes the model to a document file.
    fn write(&self, path: impl AsRef<Path>) -> Result<WriteSummary, StorageError>;
}

impl ModelFile for Model {
    fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        load(path)
    }

    fn write(&self, path: impl AsRef<Path>) -> Result<WriteSummary, StorageError> {
        write(path, self)
    }
}
