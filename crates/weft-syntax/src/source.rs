//! # Source Text
//!
//! A [`SourceText`] owns the raw bytes of one template and turns them into
//! text the first time anything asks for content. Decoding happens exactly
//! once; every later query reads the cached result, so repeated copies of the
//! same range always return the same characters.
//!
//! ## Encoding resolution
//!
//! ```text
//! byte-order mark present?
//!   yes → use the encoding it names (fail if a different one was declared)
//!   no  → use the declared encoding, or UTF-8 when none was declared
//! ```
//!
//! The byte-order mark itself is never part of the content.
//!
//! ## Indexing
//!
//! [`SourceText::len`], [`SourceText::char_at`] and [`SourceText::copy_to`]
//! count `char`s. The syntax tree instead uses byte offsets into
//! [`SourceText::text`], which is what the lexers operate on.
//!
//! The cache is a [`OnceLock`], so the first access is synchronized and a
//! `SourceText` can be shared between threads that parse it independently.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use thiserror::Error;

/// Text encodings that can be declared for, or detected in, a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl Encoding {
    /// Detection order matters: the UTF-32LE mark starts with the UTF-16LE one.
    const DETECTION_ORDER: [Encoding; 5] = [
        Encoding::Utf32Le,
        Encoding::Utf32Be,
        Encoding::Utf8,
        Encoding::Utf16Le,
        Encoding::Utf16Be,
    ];

    /// The byte-order mark written at the start of content in this encoding.
    pub fn bom(self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            Encoding::Utf16Le => &[0xFF, 0xFE],
            Encoding::Utf16Be => &[0xFE, 0xFF],
            Encoding::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            Encoding::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
        }
    }

    /// Detect an encoding from a leading byte-order mark.
    pub fn detect(bytes: &[u8]) -> Option<Encoding> {
        Self::DETECTION_ORDER
            .into_iter()
            .find(|encoding| bytes.starts_with(encoding.bom()))
    }

    /// Encode text without a byte-order mark.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Encoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Encoding::Utf32Le => text
                .chars()
                .flat_map(|c| u32::from(c).to_le_bytes())
                .collect(),
            Encoding::Utf32Be => text
                .chars()
                .flat_map(|c| u32::from(c).to_be_bytes())
                .collect(),
        }
    }

    /// Encode text preceded by this encoding's byte-order mark.
    pub fn encode_with_bom(self, text: &str) -> Vec<u8> {
        let mut bytes = self.bom().to_vec();
        bytes.extend(self.encode(text));
        bytes
    }

    /// Decode bytes (without a byte-order mark), replacing invalid sequences
    /// with U+FFFD.
    fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Encoding::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Encoding::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
            Encoding::Utf32Le => decode_utf32(bytes, u32::from_le_bytes),
            Encoding::Utf32Be => decode_utf32(bytes, u32::from_be_bytes),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
            Encoding::Utf32Le => "utf-32le",
            Encoding::Utf32Be => "utf-32be",
        };
        f.write_str(label)
    }
}

impl FromStr for Encoding {
    type Err = SourceError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "utf-16" | "utf-16le" | "utf16le" | "unicode" => Ok(Encoding::Utf16Le),
            "utf-16be" | "utf16be" => Ok(Encoding::Utf16Be),
            "utf-32" | "utf-32le" | "utf32le" => Ok(Encoding::Utf32Le),
            "utf-32be" | "utf32be" => Ok(Encoding::Utf32Be),
            _ => Err(SourceError::UnknownEncoding(label.to_string())),
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let pairs = bytes.chunks_exact(2);
    let dangling = !pairs.remainder().is_empty();

    let mut text: String = char::decode_utf16(pairs.map(|pair| unit([pair[0], pair[1]])))
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if dangling {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

fn decode_utf32(bytes: &[u8], unit: fn([u8; 4]) -> u32) -> String {
    let quads = bytes.chunks_exact(4);
    let dangling = !quads.remainder().is_empty();

    let mut text: String = quads
        .map(|q| char::from_u32(unit([q[0], q[1], q[2], q[3]])).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect();
    if dangling {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}

/// Errors raised by [`SourceText`]. All of them point at a defect in the
/// caller rather than in the template content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("The declared encoding {declared} does not match the content's encoding {detected}")]
    EncodingMismatch {
        declared: Encoding,
        detected: Encoding,
    },

    #[error("{what} range {index}..{index}+{count} is out of bounds for length {len}")]
    OutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
        len: usize,
    },

    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
}

/// Decoded content, computed once.
#[derive(Debug)]
struct Content {
    text: String,
    chars: Vec<char>,
    encoding: Encoding,
}

/// An immutable template document backed by raw bytes.
#[derive(Debug)]
pub struct SourceText {
    bytes: Vec<u8>,
    declared: Option<Encoding>,
    filename: Option<String>,
    content: OnceLock<Result<Content, SourceError>>,
}

impl SourceText {
    /// Create a document from raw bytes, an optional declared encoding and an
    /// optional file name. Nothing is decoded until content is first requested.
    pub fn new(bytes: impl Into<Vec<u8>>, encoding: Option<Encoding>, filename: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            declared: encoding,
            filename,
            content: OnceLock::new(),
        }
    }

    /// Create a document from text that is already decoded. No byte-order
    /// mark is looked for, so a leading U+FEFF stays part of the content.
    pub fn from_text(text: impl Into<String>, filename: Option<String>) -> Self {
        let text = text.into();
        let content = Content {
            chars: text.chars().collect(),
            text: text.clone(),
            encoding: Encoding::Utf8,
        };
        Self {
            bytes: text.into_bytes(),
            declared: Some(Encoding::Utf8),
            filename,
            content: OnceLock::from(Ok(content)),
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The encoding supplied at construction, if any.
    pub fn declared_encoding(&self) -> Option<Encoding> {
        self.declared
    }

    /// The encoding actually used to decode the content.
    pub fn encoding(&self) -> Result<Encoding, SourceError> {
        Ok(self.content()?.encoding)
    }

    /// The decoded text. Syntax tree offsets are byte offsets into this string.
    pub fn text(&self) -> Result<&str, SourceError> {
        Ok(&self.content()?.text)
    }

    /// Number of characters in the decoded content.
    pub fn len(&self) -> Result<usize, SourceError> {
        Ok(self.content()?.chars.len())
    }

    pub fn is_empty(&self) -> Result<bool, SourceError> {
        Ok(self.len()? == 0)
    }

    /// The character at `index`.
    pub fn char_at(&self, index: usize) -> Result<char, SourceError> {
        let chars = &self.content()?.chars;
        chars.get(index).copied().ok_or(SourceError::OutOfRange {
            what: "source",
            index,
            count: 1,
            len: chars.len(),
        })
    }

    /// Copy `count` characters starting at `source_index` into `destination`
    /// starting at `destination_index`. Copying zero characters is allowed at
    /// any in-bounds position, including the very end.
    pub fn copy_to(
        &self,
        source_index: usize,
        destination: &mut [char],
        destination_index: usize,
        count: usize,
    ) -> Result<(), SourceError> {
        let chars = &self.content()?.chars;
        let source = checked_range(source_index, count, chars.len()).ok_or(SourceError::OutOfRange {
            what: "source",
            index: source_index,
            count,
            len: chars.len(),
        })?;
        let target = checked_range(destination_index, count, destination.len()).ok_or(
            SourceError::OutOfRange {
                what: "destination",
                index: destination_index,
                count,
                len: destination.len(),
            },
        )?;

        destination[target].copy_from_slice(&chars[source]);
        Ok(())
    }

    fn content(&self) -> Result<&Content, SourceError> {
        self.content
            .get_or_init(|| self.materialize())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn materialize(&self) -> Result<Content, SourceError> {
        let detected = Encoding::detect(&self.bytes);
        let encoding = match (self.declared, detected) {
            (Some(declared), Some(detected)) if declared != detected => {
                return Err(SourceError::EncodingMismatch { declared, detected });
            }
            (_, Some(detected)) => detected,
            (Some(declared), None) => declared,
            (None, None) => Encoding::Utf8,
        };

        let payload = match detected {
            Some(found) => &self.bytes[found.bom().len()..],
            None => &self.bytes[..],
        };
        let text = encoding.decode(payload);
        log::trace!(
            "materialized {} ({} bytes as {encoding})",
            self.filename.as_deref().unwrap_or("<anonymous>"),
            self.bytes.len()
        );

        Ok(Content {
            chars: text.chars().collect(),
            text,
            encoding,
        })
    }
}

fn checked_range(index: usize, count: usize, len: usize) -> Option<std::ops::Range<usize>> {
    let end = index.checked_add(count)?;
    (end <= len).then_some(index..end)
}
