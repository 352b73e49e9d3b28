//! Staging of local files and directories as content-addressed assets.
//!
//! An asset's object key is the sha256 of its packaged bytes plus the source
//! extension, so identical inputs always land on the same key and re-running
//! synthesis never invents new objects.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::AssetError;
use crate::intrinsics::Expr;

/// Qualifier of the default bootstrap resources.
pub const DEFAULT_BOOTSTRAP_QUALIFIER: &str = "hnb659fds";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetPackaging {
    /// Uploaded byte for byte.
    File,
    /// Zipped with fixed timestamps and sorted entries before upload.
    ZipDirectory,
}

/// Where a staged asset lives once published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLocation {
    pub bucket: Expr,
    pub key: String,
}

impl AssetLocation {
    /// `s3://bucket/key`.
    pub fn s3_uri(&self) -> Expr {
        Expr::concat([
            Expr::literal("s3://"),
            self.bucket.clone(),
            Expr::literal(format!("/{}", self.key)),
        ])
    }

    /// `arn:aws:s3:::bucket/key`.
    pub fn object_arn(&self) -> Expr {
        Expr::concat([
            Expr::literal("arn:aws:s3:::"),
            self.bucket.clone(),
            Expr::literal(format!("/{}", self.key)),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAsset {
    pub id: String,
    pub source: PathBuf,
    pub packaging: AssetPackaging,
    pub fingerprint: String,
    pub location: AssetLocation,
}

impl FileAsset {
    /// Re-reads the packaged bytes for upload.
    pub fn contents(&self) -> Result<Vec<u8>, AssetError> {
        package(&self.source, self.packaging)
    }
}

/// Resolves the assets bucket and stages assets into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStaging {
    bucket: Expr,
}

impl AssetStaging {
    pub fn new(bucket: Expr) -> Self {
        Self { bucket }
    }

    /// An explicit bucket wins; otherwise the bootstrap bucket
    /// `cdk-<qualifier>-assets-<account>-<region>`, with the account left to
    /// CloudFormation when it is not known.
    pub fn for_environment(
        account: Option<&str>,
        region: &str,
        bucket_override: Option<&str>,
    ) -> Self {
        let bucket = match (bucket_override, account) {
            (Some(bucket), _) => Expr::literal(bucket),
            (None, Some(account)) => Expr::literal(format!(
                "cdk-{DEFAULT_BOOTSTRAP_QUALIFIER}-assets-{account}-{region}"
            )),
            (None, None) => Expr::sub(format!(
                "cdk-{DEFAULT_BOOTSTRAP_QUALIFIER}-assets-${{AWS::AccountId}}-{region}"
            )),
        };
        Self { bucket }
    }

    pub fn bucket(&self) -> &Expr {
        &self.bucket
    }

    pub fn stage(&self, id: &str, source: impl AsRef<Path>) -> Result<FileAsset, AssetError> {
        let source = source.as_ref();
        let metadata = fs::metadata(source).map_err(|_| AssetError::MissingSource {
            path: source.to_path_buf(),
        })?;

        let packaging = if metadata.is_dir() {
            AssetPackaging::ZipDirectory
        } else {
            AssetPackaging::File
        };
        let bytes = package(source, packaging)?;
        let fingerprint = fingerprint_bytes(&bytes);
        let key = format!("{fingerprint}{}", key_extension(source, packaging));

        debug!(asset = id, source = %source.display(), %key, "staged asset");
        Ok(FileAsset {
            id: id.to_string(),
            source: source.to_path_buf(),
            packaging,
            fingerprint,
            location: AssetLocation {
                bucket: self.bucket.clone(),
                key,
            },
        })
    }
}

pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn key_extension(source: &Path, packaging: AssetPackaging) -> String {
    match packaging {
        AssetPackaging::ZipDirectory => ".zip".to_string(),
        AssetPackaging::File => source
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default(),
    }
}

fn package(source: &Path, packaging: AssetPackaging) -> Result<Vec<u8>, AssetError> {
    match packaging {
        AssetPackaging::File => fs::read(source).map_err(|error| AssetError::Read {
            path: source.to_path_buf(),
            source: error,
        }),
        AssetPackaging::ZipDirectory => package_directory(source),
    }
}

/// Zips `dir` so that the same tree always produces the same bytes.
pub fn package_directory(dir: &Path) -> Result<Vec<u8>, AssetError> {
    let mut entries = Vec::new();
    collect_files(dir, dir, &mut entries)?;
    entries.sort();

    let zip_error = |source| AssetError::Zip {
        path: dir.to_path_buf(),
        source,
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, path) in entries {
        let body = fs::read(&path).map_err(|source| AssetError::Read {
            path: path.clone(),
            source,
        })?;
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(entry_mode(&path));
        zip.start_file(name, options).map_err(zip_error)?;
        zip.write_all(&body).map_err(|source| AssetError::Read {
            path: path.clone(),
            source,
        })?;
    }

    let cursor = zip.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

fn collect_files(
    root: &Path,
    dir: &Path,
    entries: &mut Vec<(String, PathBuf)>,
) -> Result<(), AssetError> {
    let read_error = |source| AssetError::Read {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(read_error)?;
        if file_type.is_dir() {
            collect_files(root, &path, entries)?;
            continue;
        }
        // Symlinked directories are not followed; they may point back up the tree.
        if file_type.is_symlink() && path.is_dir() {
            debug!(path = %path.display(), "skipping symlinked directory");
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path);
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push((name, path));
    }
    Ok(())
}

#[cfg(unix)]
fn entry_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(metadata) if metadata.permissions().mode() & 0o111 != 0 => 0o755,
        _ => 0o644,
    }
}

#[cfg(not(unix))]
fn entry_mode(path: &Path) -> u32 {
    // Lambda custom runtimes need an executable `bootstrap`.
    if path.file_name().is_some_and(|name| name == "bootstrap") {
        0o755
    } else {
        0o644
    }
}
