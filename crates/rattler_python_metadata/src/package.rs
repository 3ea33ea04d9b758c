use std::{
    ffi::OsStr,
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::header_block::HeaderBlock;

/// An package identifier that can be used to identify packages across package
/// ecosystems.
pub type PackageUrl = purl::GenericPurl<String>;

/// Characters that are left as-is in the name and version of a package url.
const PURL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The language ecosystem a package belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// A package from the Python ecosystem.
    Python,
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
        }
    }
}

/// The distribution format a Python package was installed from.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// A wheel, described by `*.dist-info/METADATA`.
    Wheel,

    /// An egg, described by `*.egg-info/PKG-INFO`, `EGG-INFO/PKG-INFO` or a single `*.egg-info`
    /// file.
    Egg,
}

/// An error that is returned when a string does not name a [`PackageKind`].
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("'{0}' is not a known python package kind, expected 'wheel' or 'egg'")]
pub struct ParsePackageKindError(pub String);

impl PackageKind {
    /// Returns the string representation of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            PackageKind::Wheel => "wheel",
            PackageKind::Egg => "egg",
        }
    }

    /// Returns the name of the file that holds the metadata of this kind of package.
    pub fn metadata_file_name(self) -> &'static str {
        match self {
            PackageKind::Wheel => "METADATA",
            PackageKind::Egg => "PKG-INFO",
        }
    }

    /// Tries to determine the kind of package from the path of a metadata file.
    ///
    /// Returns `None` if the path does not point to the metadata file of a wheel or an egg. The
    /// filesystem is not accessed, `path` is expected to refer to a file.
    pub fn try_from_path(path: impl AsRef<Path>) -> Option<PackageKind> {
        let path = path.as_ref();
        let file_name = path.file_name().and_then(OsStr::to_str)?;
        let parent = path
            .parent()
            .and_then(Path::file_name)
            .and_then(OsStr::to_str)
            .unwrap_or_default();

        match file_name {
            "METADATA" if parent.ends_with(".dist-info") => Some(PackageKind::Wheel),
            "PKG-INFO" if parent.ends_with(".egg-info") || parent == "EGG-INFO" => {
                Some(PackageKind::Egg)
            }
            _ if file_name.ends_with(".egg-info") => Some(PackageKind::Egg),
            _ => None,
        }
    }
}

impl Display for PackageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageKind {
    type Err = ParsePackageKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wheel" => Ok(PackageKind::Wheel),
            "egg" => Ok(PackageKind::Egg),
            _ => Err(ParsePackageKindError(s.to_owned())),
        }
    }
}

/// The identity of an installed Python package as described by its metadata.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PythonPackage {
    /// The name of the package as written in the metadata, empty if absent.
    pub name: String,

    /// The version of the package as written in the metadata, empty if absent.
    pub version: String,

    /// The license of the package. Contains at most one entry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<String>,

    /// The ecosystem of the package, always [`Language::Python`].
    pub language: Language,

    /// The distribution format the metadata was read from.
    #[serde(rename = "type")]
    pub kind: PackageKind,
}

impl PythonPackage {
    /// Constructs the identity of a package from the fields of its metadata.
    pub fn from_header_block(block: &HeaderBlock, kind: PackageKind) -> Self {
        let licenses = block
            .get("License")
            .filter(|license| !license.is_empty())
            .map(|license| vec![license.to_owned()])
            .unwrap_or_default();

        Self {
            name: block.get("Name").unwrap_or_default().to_owned(),
            version: block.get("Version").unwrap_or_default().to_owned(),
            licenses,
            language: Language::Python,
            kind,
        }
    }

    /// Returns the `pkg:pypi/` package url of this package or `None` if the package has no name.
    pub fn package_url(&self) -> Option<PackageUrl> {
        if self.name.is_empty() {
            return None;
        }

        let mut purl = format!(
            "pkg:pypi/{}",
            utf8_percent_encode(&normalize_name(&self.name), PURL_COMPONENT)
        );
        if !self.version.is_empty() {
            purl.push('@');
            purl.extend(utf8_percent_encode(&self.version, PURL_COMPONENT));
        }

        match PackageUrl::from_str(&purl) {
            Ok(purl) => Some(purl),
            Err(err) => {
                tracing::debug!("'{purl}' is not a valid package url: {err}");
                None
            }
        }
    }
}

/// Normalizes a distribution name: lowercase with every run of `-`, `_` and `.` replaced by a
/// single `-`.
fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                normalized.push('-');
            }
            in_separator = true;
        } else {
            normalized.extend(c.to_lowercase());
            in_separator = false;
        }
    }
    normalized
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use rstest::rstest;

    use super::{normalize_name, Language, PackageKind, PythonPackage};
    use crate::header_block::HeaderBlock;

    fn package(name: &str, version: &str) -> PythonPackage {
        PythonPackage {
            name: name.to_owned(),
            version: version.to_owned(),
            licenses: Vec::new(),
            language: Language::Python,
            kind: PackageKind::Wheel,
        }
    }

    #[test]
    fn test_from_header_block() {
        let block = HeaderBlock::from_str("Name: foo\nVersion: 1.2.3\nLicense: BSD\n").unwrap();
        assert_eq!(
            PythonPackage::from_header_block(&block, PackageKind::Egg),
            PythonPackage {
                name: "foo".to_owned(),
                version: "1.2.3".to_owned(),
                licenses: vec!["BSD".to_owned()],
                language: Language::Python,
                kind: PackageKind::Egg,
            }
        );
    }

    #[rstest]
    #[case::absent("Name: foo\n")]
    #[case::empty("Name: foo\nLicense:\n")]
    #[case::whitespace("Name: foo\nLicense:    \n")]
    fn test_no_license(#[case] input: &str) {
        let block = HeaderBlock::from_str(input).unwrap();
        let package = PythonPackage::from_header_block(&block, PackageKind::Wheel);
        assert!(package.licenses.is_empty());
    }

    #[test]
    fn test_multiline_license() {
        let block =
            HeaderBlock::from_str("Name: foo\nLicense: Copyright (c) Foo\n    All rights reserved.\n")
                .unwrap();
        let package = PythonPackage::from_header_block(&block, PackageKind::Wheel);
        assert_eq!(
            package.licenses,
            vec!["Copyright (c) Foo\n All rights reserved.".to_owned()]
        );
    }

    #[test]
    fn test_empty_block() {
        let package = PythonPackage::from_header_block(&HeaderBlock::default(), PackageKind::Egg);
        assert_eq!(package.name, "");
        assert_eq!(package.version, "");
        assert!(package.licenses.is_empty());
        assert_eq!(package.language, Language::Python);
        assert_eq!(package.package_url(), None);
    }

    #[rstest]
    #[case::wheel(PackageKind::Wheel, "wheel", "METADATA")]
    #[case::egg(PackageKind::Egg, "egg", "PKG-INFO")]
    fn test_package_kind_strings(
        #[case] kind: PackageKind,
        #[case] name: &str,
        #[case] metadata_file: &str,
    ) {
        assert_eq!(kind.to_string(), name);
        assert_eq!(PackageKind::from_str(name), Ok(kind));
        assert_eq!(kind.metadata_file_name(), metadata_file);
    }

    #[test]
    fn test_unknown_package_kind() {
        let err = PackageKind::from_str("sdist").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'sdist' is not a known python package kind, expected 'wheel' or 'egg'"
        );
    }

    #[rstest]
    #[case("site-packages/requests-2.31.0.dist-info/METADATA", Some(PackageKind::Wheel))]
    #[case("site-packages/six-1.16.0-py3.11.egg-info/PKG-INFO", Some(PackageKind::Egg))]
    #[case("site-packages/six-1.16.0-py3.11.egg/EGG-INFO/PKG-INFO", Some(PackageKind::Egg))]
    #[case("site-packages/argparse-1.4.0-py3.11.egg-info", Some(PackageKind::Egg))]
    #[case("site-packages/requests-2.31.0.dist-info/RECORD", None)]
    #[case("site-packages/requests/METADATA", None)]
    #[case("PKG-INFO", None)]
    #[case("sdist/foo-1.0/PKG-INFO", None)]
    fn test_kind_from_path(#[case] path: &str, #[case] expected: Option<PackageKind>) {
        assert_eq!(PackageKind::try_from_path(path), expected);
    }

    #[rstest]
    #[case("requests", "requests")]
    #[case("typing_extensions", "typing-extensions")]
    #[case("Zope.Interface", "zope-interface")]
    #[case("foo_-._bar", "foo-bar")]
    fn test_normalize_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(normalize_name(name), expected);
    }

    #[test]
    fn test_package_url() {
        let purl = package("Typing_Extensions", "4.8.0").package_url().unwrap();
        assert_eq!(purl.to_string(), "pkg:pypi/typing-extensions@4.8.0");
        assert_eq!(purl.name(), "typing-extensions");
        assert_eq!(purl.version(), Some("4.8.0"));

        let purl = package("requests", "").package_url().unwrap();
        assert_eq!(purl.to_string(), "pkg:pypi/requests");
        assert_eq!(purl.version(), None);
    }

    #[test]
    fn test_serialize() {
        let mut package = package("foo", "1.0.0");
        assert_eq!(
            serde_json::to_value(&package).unwrap(),
            serde_json::json!({
                "name": "foo",
                "version": "1.0.0",
                "language": "python",
                "type": "wheel",
            })
        );

        package.licenses = vec!["MIT".to_owned()];
        package.kind = PackageKind::Egg;
        let json = serde_json::to_string(&package).unwrap();
        assert_eq!(
            json,
            r#"{"name":"foo","version":"1.0.0","licenses":["MIT"],"language":"python","type":"egg"}"#
        );
        assert_eq!(
            serde_json::from_str::<PythonPackage>(&json).unwrap(),
            package
        );
    }
}
