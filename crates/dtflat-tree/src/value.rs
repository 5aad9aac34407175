//! Property values
//!
//! Provides [`PropValue`], the opaque byte payload of a node property, with
//! helpers for the common encodings (NUL-terminated strings, string lists and
//! big-endian 32-bit cells).

use serde::{Deserialize, Serialize};

/// Opaque property value
///
/// The tree never interprets values except for the `compatible` string list.
/// Serialized forms (JSON/YAML) pick the most readable encoding:
/// `true` for empty values, a string or list of strings for printable string
/// lists, a list of integers for cell arrays, otherwise `{ "bytes": "<hex>" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "PropRepr", into = "PropRepr")]
pub struct PropValue(Vec<u8>);

impl PropValue {
    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Empty (boolean) property
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// NUL-terminated string
    #[must_use]
    pub fn string(s: &str) -> Self {
        let mut bytes = Vec::with_capacity(s.len() + 1);
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
        Self(bytes)
    }

    /// Sequence of NUL-terminated strings
    #[must_use]
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut bytes = Vec::new();
        for item in items {
            bytes.extend_from_slice(item.as_ref().as_bytes());
            bytes.push(0);
        }
        Self(bytes)
    }

    /// Single big-endian cell
    #[inline]
    #[must_use]
    pub fn u32(value: u32) -> Self {
        Self(value.to_be_bytes().to_vec())
    }

    /// Array of big-endian cells
    #[must_use]
    pub fn cells(values: &[u32]) -> Self {
        Self(values.iter().flat_map(|v| v.to_be_bytes()).collect())
    }

    /// Raw bytes
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if value is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode as a list of printable NUL-terminated strings
    ///
    /// Returns `None` if the value is empty, not NUL-terminated, contains an
    /// empty entry or non-printable bytes.
    #[must_use]
    pub fn strings(&self) -> Option<Vec<&str>> {
        let body = self.0.strip_suffix(&[0])?;
        body.split(|b| *b == 0)
            .map(|chunk| {
                if chunk.is_empty() || !chunk.iter().all(|b| (0x20..0x7f).contains(b)) {
                    None
                } else {
                    std::str::from_utf8(chunk).ok()
                }
            })
            .collect()
    }

    /// Decode as a single string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.strings()?.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }

    /// Decode as a single cell
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        let bytes: [u8; 4] = self.0.as_slice().try_into().ok()?;
        Some(u32::from_be_bytes(bytes))
    }

    /// Decode as an array of cells
    #[must_use]
    pub fn as_cells(&self) -> Option<Vec<u32>> {
        if self.0.len() % 4 != 0 {
            return None;
        }
        Some(
            self.0
                .chunks_exact(4)
                .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    /// Check if the value is a string list containing `needle`
    #[must_use]
    pub fn contains_string(&self, needle: &str) -> bool {
        self.strings()
            .is_some_and(|items| items.iter().any(|s| *s == needle))
    }
}

impl From<&str> for PropValue {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<u32> for PropValue {
    fn from(value: u32) -> Self {
        Self::u32(value)
    }
}

impl From<Vec<u8>> for PropValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Human-readable encoding used by serde
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PropRepr {
    Flag(bool),
    Cell(u32),
    Text(String),
    TextList(Vec<String>),
    Cells(Vec<u32>),
    Bytes { bytes: String },
}

impl TryFrom<PropRepr> for PropValue {
    type Error = ValueError;

    fn try_from(repr: PropRepr) -> Result<Self, Self::Error> {
        match repr {
            PropRepr::Flag(true) => Ok(Self::empty()),
            PropRepr::Flag(false) => Err(ValueError::FalseFlag),
            PropRepr::Cell(v) => Ok(Self::u32(v)),
            PropRepr::Text(s) => Ok(Self::string(&s)),
            PropRepr::TextList(items) => Ok(Self::string_list(items)),
            PropRepr::Cells(values) => Ok(Self::cells(&values)),
            PropRepr::Bytes { bytes } => Ok(Self(hex::decode(bytes)?)),
        }
    }
}

impl From<PropValue> for PropRepr {
    fn from(value: PropValue) -> Self {
        if value.is_empty() {
            return Self::Flag(true);
        }
        if let Some(items) = value.strings() {
            return match items.as_slice() {
                [single] => Self::Text((*single).to_string()),
                _ => Self::TextList(items.iter().map(|s| (*s).to_string()).collect()),
            };
        }
        if let Some(cells) = value.as_cells() {
            return match cells.as_slice() {
                [single] => Self::Cell(*single),
                _ => Self::Cells(cells),
            };
        }
        Self::Bytes {
            bytes: hex::encode(&value.0),
        }
    }
}

/// Errors decoding serialized property values
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// `false` has no property encoding (omit the property instead)
    #[error("boolean property cannot be false; omit it instead")]
    FalseFlag,

    /// Invalid hex in a raw byte value
    #[error("invalid hex bytes: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_is_nul_terminated() {
        let v = PropValue::string("host");
        assert_eq!(v.as_bytes(), b"host\0");
        assert_eq!(v.as_str(), Some("host"));
    }

    #[test]
    fn string_list_decodes() {
        let v = PropValue::string_list(["qcom,sdm845-dwc3", "qcom,dwc3"]);
        assert_eq!(v.strings().unwrap(), vec!["qcom,sdm845-dwc3", "qcom,dwc3"]);
        assert!(v.contains_string("qcom,dwc3"));
        assert!(!v.contains_string("snps,dwc3"));
        assert_eq!(v.as_str(), None);
    }

    #[test]
    fn cells_are_big_endian() {
        let v = PropValue::cells(&[1, 0x0a6f_8800]);
        assert_eq!(v.as_bytes(), &[0, 0, 0, 1, 0x0a, 0x6f, 0x88, 0x00]);
        assert_eq!(v.as_cells().unwrap(), vec![1, 0x0a6f_8800]);
        assert_eq!(PropValue::u32(7).as_u32(), Some(7));
    }

    #[test]
    fn binary_is_not_a_string() {
        let v = PropValue::u32(3);
        assert!(v.strings().is_none());
        assert!(!v.contains_string(""));
    }

    #[test]
    fn json_encodings() {
        let parsed: Vec<PropValue> =
            serde_json::from_str(r#"[true, "host", ["a", "b"], 5, [1, 2], {"bytes": "0102"}]"#)
                .unwrap();
        assert_eq!(parsed[0], PropValue::empty());
        assert_eq!(parsed[1], PropValue::string("host"));
        assert_eq!(parsed[2], PropValue::string_list(["a", "b"]));
        assert_eq!(parsed[3], PropValue::u32(5));
        assert_eq!(parsed[4], PropValue::cells(&[1, 2]));
        assert_eq!(parsed[5], PropValue::new(vec![1, 2]));

        let out = serde_json::to_string(&parsed).unwrap();
        assert_eq!(out, r#"[true,"host",["a","b"],5,[1,2],{"bytes":"0102"}]"#);
    }

    #[test]
    fn json_false_is_rejected() {
        let result: Result<PropValue, _> = serde_json::from_str("false");
        assert!(result.is_err());
    }
}
