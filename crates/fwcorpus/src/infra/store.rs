//! Loading and persisting corpus documents.
//!
//! Documents are JSON maps; defaulting and validation live in the serde
//! attributes of the domain model, so a type mismatch or inverted section
//! bounds surface here as [`StoreError::Format`].

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::infra::config::Config;

/// Errors raised while reading or writing a corpus document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}")]
    Storage {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not a valid corpus document")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Output settings applied when writing documents.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Pretty-print the JSON output.
    pub pretty: bool,
    /// Copy an existing destination to `<file>.bak` before overwriting.
    pub backup: bool,
}

impl StoreOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pretty: config.output.pretty(),
            backup: config.output.backup(),
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            backup: false,
        }
    }
}

/// Load a corpus aggregate from a JSON document, defaulting absent fields.
pub fn load<C: DeserializeOwned>(path: &Path) -> Result<C, StoreError> {
    let data = fs::read_to_string(path).map_err(|source| storage_error(path, source))?;
    let corpus = serde_json::from_str(&data).map_err(|source| format_error(path, source))?;
    debug!(path = %path.display(), "loaded corpus document");
    Ok(corpus)
}

/// Render the aggregate as its pretty-printed JSON document.
pub fn dump<C: Serialize>(corpus: &C) -> Result<String, StoreError> {
    serde_json::to_string_pretty(corpus)
        .map_err(|source| format_error(Path::new("<in-memory>"), source))
}

/// Persist the aggregate to `path`, creating parent directories as needed.
/// A failed write leaves both the aggregate and any existing file intact.
pub fn write_out<C: Serialize>(
    corpus: &C,
    path: &Path,
    options: &StoreOptions,
) -> Result<(), StoreError> {
    let rendered = if options.pretty {
        serde_json::to_string_pretty(corpus)
    } else {
        serde_json::to_string(corpus)
    }
    .map_err(|source| format_error(path, source))?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| storage_error(path, source))?;
    }
    if options.backup && path.exists() {
        let mut backup = path.as_os_str().to_owned();
        backup.push(".bak");
        fs::copy(path, &backup).map_err(|source| storage_error(path, source))?;
    }
    fs::write(path, rendered).map_err(|source| storage_error(path, source))?;
    debug!(path = %path.display(), "wrote corpus document");
    Ok(())
}

fn storage_error(path: &Path, source: io::Error) -> StoreError {
    StoreError::Storage {
        path: path.display().to_string(),
        source,
    }
}

fn format_error(path: &Path, source: serde_json::Error) -> StoreError {
    StoreError::Format {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::model::{TestCorpus, TrainingCorpus};

    #[test]
    fn missing_file_is_a_storage_error() {
        let temp = tempfile::tempdir().unwrap();
        let result: Result<TestCorpus, _> = load(&temp.path().join("absent.cfg"));
        assert!(matches!(result, Err(StoreError::Storage { .. })));
    }

    #[test]
    fn unparsable_document_is_a_format_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("broken.cfg");
        fs::write(&path, "not json at all").unwrap();
        let result: Result<TestCorpus, _> = load(&path);
        assert!(matches!(result, Err(StoreError::Format { .. })));
    }

    #[test]
    fn wrong_scalar_type_is_a_format_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("mistyped.cfg");
        fs::write(&path, r#"{"n Value": "three"}"#).unwrap();
        let result: Result<TrainingCorpus, _> = load(&path);
        assert!(matches!(result, Err(StoreError::Format { .. })));
    }

    #[test]
    fn write_out_creates_parent_directories() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/dir/corpus.cfg");
        let corpus = TestCorpus::new("Fw1", "");
        write_out(&corpus, &path, &StoreOptions::default()).unwrap();

        let reloaded: TestCorpus = load(&path).unwrap();
        assert_eq!(reloaded, corpus);
    }

    #[test]
    fn backup_copies_previous_document() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("corpus.cfg");
        let options = StoreOptions {
            pretty: false,
            backup: true,
        };

        write_out(&TestCorpus::new("first", ""), &path, &options).unwrap();
        write_out(&TestCorpus::new("second", ""), &path, &options).unwrap();

        let backup: TestCorpus = load(&temp.path().join("corpus.cfg.bak")).unwrap();
        assert_eq!(backup.name, "first");
        let current: TestCorpus = load(&path).unwrap();
        assert_eq!(current.name, "second");
    }
}
