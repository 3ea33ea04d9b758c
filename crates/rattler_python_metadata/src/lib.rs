#![deny(missing_docs)]

//! `rattler_python_metadata` extracts the identity (name, version and license) of installed
//! Python packages from the RFC 822 style header block of their metadata files: `METADATA` for
//! wheels and `PKG-INFO` for eggs.
//!
//! Locating these files inside an environment or archive is left to the caller.
//!
//! ```rust
//! use rattler_python_metadata::{parse_wheel_metadata, PackageKind};
//!
//! let metadata = "Metadata-Version: 2.1\nName: requests\nVersion: 2.31.0\nLicense: Apache 2.0\n";
//! let packages = parse_wheel_metadata(metadata.as_bytes()).unwrap();
//! assert_eq!(packages[0].name, "requests");
//! assert_eq!(packages[0].licenses, vec!["Apache 2.0"]);
//! assert_eq!(packages[0].kind, PackageKind::Wheel);
//! ```

mod header_block;
mod package;

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use fs_err as fs;
use thiserror::Error;

pub use header_block::{HeaderBlock, ParseMetadataError};
pub use package::{Language, PackageKind, PackageUrl, ParsePackageKindError, PythonPackage};

/// Parses the `METADATA` file of a wheel.
///
/// See [`parse_metadata`].
pub fn parse_wheel_metadata(
    reader: impl BufRead,
) -> Result<Vec<PythonPackage>, ParseMetadataError> {
    parse_metadata(reader, PackageKind::Wheel)
}

/// Parses the `PKG-INFO` file of an egg.
///
/// See [`parse_metadata`].
pub fn parse_egg_metadata(
    reader: impl BufRead,
) -> Result<Vec<PythonPackage>, ParseMetadataError> {
    parse_metadata(reader, PackageKind::Egg)
}

/// Parses the header block of a Python metadata file and returns the package it describes,
/// tagged with the given `kind`.
///
/// On success the returned vector always contains exactly one package. Reading stops at the
/// first blank line after the header fields, anything after it (like the long description or an
/// embedded license text) is not consumed.
pub fn parse_metadata(
    reader: impl BufRead,
    kind: PackageKind,
) -> Result<Vec<PythonPackage>, ParseMetadataError> {
    let block = HeaderBlock::from_reader(reader)?;
    Ok(vec![PythonPackage::from_header_block(&block, kind)])
}

/// An error that can occur when parsing a metadata file from disk.
#[derive(Debug, Error)]
pub enum ParseMetadataPathError {
    /// The path does not look like the metadata file of a wheel or an egg.
    #[error("'{0}' is not a python wheel or egg metadata file")]
    UnknownMetadataFile(PathBuf),

    /// The file could not be opened.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The contents of the file could not be parsed.
    #[error("failed to parse '{}'", .0.display())]
    Parse(PathBuf, #[source] ParseMetadataError),
}

/// Parses a metadata file on disk. Whether the file belongs to a wheel or an egg is derived from
/// its path with [`PackageKind::try_from_path`].
pub fn parse_metadata_path(
    path: impl AsRef<Path>,
) -> Result<Vec<PythonPackage>, ParseMetadataPathError> {
    let path = path.as_ref();
    let kind = PackageKind::try_from_path(path)
        .ok_or_else(|| ParseMetadataPathError::UnknownMetadataFile(path.to_path_buf()))?;
    tracing::debug!("parsing {} metadata from {}", kind, path.display());

    let file = fs::File::open(path)?;
    parse_metadata(BufReader::new(file), kind)
        .map_err(|err| ParseMetadataPathError::Parse(path.to_path_buf(), err))
}

#[cfg(test)]
pub(crate) fn get_test_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../test-data/python-metadata")
}
