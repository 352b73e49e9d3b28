//! Loading of the Quickwit index config document.
//!
//! Only `index_id` is interpreted here; the rest of the document is shipped
//! untouched to the indexer as an asset.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tracing::debug;

use crate::error::IndexConfigError;

/// Environment variable that overrides the document location.
pub const INDEX_CONFIG_PATH_ENV: &str = "INDEX_CONFIG_PATH";
pub const DEFAULT_INDEX_CONFIG_PATH: &str = "index-config.yaml";

/// Resolves the document path from `INDEX_CONFIG_PATH`, falling back to
/// `index-config.yaml` in the working directory.
pub fn resolve_index_config_path() -> PathBuf {
    resolve_index_config_path_from(std::env::var(INDEX_CONFIG_PATH_ENV).ok())
}

pub fn resolve_index_config_path_from(env_value: Option<String>) -> PathBuf {
    match env_value {
        Some(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => PathBuf::from(DEFAULT_INDEX_CONFIG_PATH),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfigDocument {
    pub path: PathBuf,
    pub index_id: String,
}

impl IndexConfigDocument {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IndexConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| IndexConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    pub fn parse(path: impl AsRef<Path>, raw: &str) -> Result<Self, IndexConfigError> {
        let path = path.as_ref().to_path_buf();
        let document: Value =
            serde_yaml::from_str(raw).map_err(|source| IndexConfigError::Parse {
                path: path.clone(),
                source,
            })?;

        let mapping = match document {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Err(IndexConfigError::MissingIndexId { path }),
            _ => return Err(IndexConfigError::NotAMapping { path }),
        };

        let index_id = match mapping.get("index_id") {
            None | Some(Value::Null) => return Err(IndexConfigError::MissingIndexId { path }),
            Some(Value::String(value)) => value.clone(),
            Some(_) => {
                return Err(IndexConfigError::InvalidIndexId {
                    path,
                    reason: "expected a string".to_string(),
                })
            }
        };

        if index_id.trim().is_empty() {
            return Err(IndexConfigError::InvalidIndexId {
                path,
                reason: "cannot be empty".to_string(),
            });
        }

        debug!(path = %path.display(), %index_id, "loaded index config");
        Ok(Self { path, index_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_index_id_and_ignores_other_fields() {
        let raw = "version: 0.7\nindex_id: otel-traces\ndoc_mapping:\n  field_mappings: []\n";
        let document = IndexConfigDocument::parse("index-config.yaml", raw).unwrap();
        assert_eq!(document.index_id, "otel-traces");
        assert_eq!(document.path, PathBuf::from("index-config.yaml"));
    }

    #[test]
    fn missing_index_id_is_a_typed_error() {
        let error = IndexConfigDocument::parse("c.yaml", "version: 0.7\n").unwrap_err();
        assert!(matches!(error, IndexConfigError::MissingIndexId { .. }));
    }

    #[test]
    fn empty_document_lacks_index_id() {
        let error = IndexConfigDocument::parse("c.yaml", "").unwrap_err();
        assert!(matches!(error, IndexConfigError::MissingIndexId { .. }));
    }

    #[test]
    fn index_id_is_kept_verbatim() {
        let document =
            IndexConfigDocument::parse("c.yaml", "index_id: ' otel-traces '\n").unwrap();
        assert_eq!(document.index_id, " otel-traces ");
    }

    #[test]
    fn blank_index_id_is_rejected() {
        let error = IndexConfigDocument::parse("c.yaml", "index_id: '   '\n").unwrap_err();
        assert!(matches!(error, IndexConfigError::InvalidIndexId { .. }));
    }

    #[test]
    fn non_string_index_id_is_rejected() {
        let error = IndexConfigDocument::parse("c.yaml", "index_id: [a, b]\n").unwrap_err();
        assert!(matches!(error, IndexConfigError::InvalidIndexId { .. }));
    }

    #[test]
    fn scalar_document_is_not_a_mapping() {
        let error = IndexConfigDocument::parse("c.yaml", "just-a-string\n").unwrap_err();
        assert!(matches!(error, IndexConfigError::NotAMapping { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let error = IndexConfigDocument::parse("c.yaml", "index_id: [unclosed\n").unwrap_err();
        assert!(matches!(error, IndexConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = IndexConfigDocument::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(error, IndexConfigError::Read { .. }));
    }

    #[test]
    fn path_resolution_prefers_environment_value() {
        assert_eq!(
            resolve_index_config_path_from(Some("configs/hdfs.yaml".to_string())),
            PathBuf::from("configs/hdfs.yaml")
        );
        assert_eq!(
            resolve_index_config_path_from(None),
            PathBuf::from(DEFAULT_INDEX_CONFIG_PATH)
        );
        assert_eq!(
            resolve_index_config_path_from(Some(String::new())),
            PathBuf::from(DEFAULT_INDEX_CONFIG_PATH)
        );
    }
}
