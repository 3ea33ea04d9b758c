//! Parsing of the RFC 822 style header block found at the top of the `METADATA` and `PKG-INFO`
//! files of installed Python distributions.

use std::io::BufRead;
use std::str::FromStr;

use indexmap::IndexMap;
use thiserror::Error;

/// An error that can occur when parsing the header block of a Python metadata file.
#[derive(Debug, Error)]
pub enum ParseMetadataError {
    /// An indented line was encountered while there was no field it could belong to.
    #[error("no field to continue for line '{0}'")]
    MalformedContinuation(String),

    /// A line is neither blank, indented nor of the form `Key: Value`.
    #[error("cannot parse field from line '{0}'")]
    MalformedField(String),

    /// The underlying reader failed.
    #[error("failed to read python wheel/egg metadata")]
    StreamReadError(#[from] std::io::Error),
}

/// The fields of a metadata header block.
///
/// Field names are case-sensitive. When a field occurs more than once the last occurrence wins,
/// the earlier values are discarded. Iteration yields the fields in the order in which their
/// names first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    fields: IndexMap<String, String>,
}

impl HeaderBlock {
    /// Parses a header block from a reader.
    ///
    /// Blank lines before the first field are skipped. The first blank line after that ends the
    /// block; the reader is left positioned right after it, so passing `&mut reader` allows the
    /// caller to read the remainder of the file (usually the long description).
    ///
    /// Indented lines continue the value of the previous field. Each continuation is trimmed and
    /// appended to the value separated by `"\n "`.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, ParseMetadataError> {
        let mut fields: IndexMap<String, String> = IndexMap::new();
        let mut key: Option<String> = None;

        for line in reader.lines() {
            let line = line?;

            if line.is_empty() {
                if fields.is_empty() {
                    tracing::trace!("skipping blank line before the first field");
                    continue;
                }
                tracing::debug!("header block ended after {} field(s)", fields.len());
                break;
            }

            if line.starts_with(char::is_whitespace) {
                let Some(value) = key.as_deref().and_then(|key| fields.get_mut(key)) else {
                    return Err(ParseMetadataError::MalformedContinuation(line));
                };
                value.push_str("\n ");
                value.push_str(line.trim());
                continue;
            }

            match line.find(':') {
                Some(idx) if idx > 0 => {
                    let name = line[..idx].trim();
                    let value = line[idx + 1..].trim();
                    if fields.insert(name.to_owned(), value.to_owned()).is_some() {
                        tracing::debug!("field '{name}' overrides an earlier occurrence");
                    }
                    key = Some(name.to_owned());
                }
                _ => return Err(ParseMetadataError::MalformedField(line)),
            }
        }

        Ok(Self { fields })
    }

    /// Returns the value of the field with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns the number of distinct fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the block did not contain a single field.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over all `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl FromStr for HeaderBlock {
    type Err = ParseMetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}
