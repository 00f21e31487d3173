//! Question file loading with bounded markup recovery.
//!
//! Files exported by authoring tools occasionally carry character-level
//! artifacts that a strict XML parser rejects: a byte-order mark, stray
//! control characters, HTML entities such as `&nbsp;`, or a bare `&` in
//! prompt text. HTML void elements written without a closing slash
//! (`<br>`, `<img src="…">`) are self-closed, and their stray end tags
//! dropped. These are repaired before parsing. Repairs never add or remove
//! a QTI element, and a file needing more than [`MAX_MARKUP_REPAIRS`] of
//! them is rejected.

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use roxmltree::{Document, ParsingOptions};

use crate::config::MAX_MARKUP_REPAIRS;
use crate::error::{ConverterError, Result};

/// Entity or character reference, or a bare ampersand.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static AMPERSAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z_][A-Za-z0-9._-]*);)?")
        .expect("valid regex")
});

/// Regions whose content must be left untouched.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static VERBATIM_SECTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>|<!--.*?-->").expect("valid regex"));

/// HTML void element tags: `<br>`, `<br/>`, `<br />`, `</br>`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static VOID_ELEMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(/?)(br|hr|img|wbr)(\s[^<>]*)?>").expect("valid regex")
});

/// Entities predefined by XML itself.
const XML_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

/// HTML entities seen in exported question text, with their code points.
const HTML_ENTITIES: &[(&str, u32)] = &[
    ("nbsp", 160),
    ("iexcl", 161),
    ("cent", 162),
    ("pound", 163),
    ("copy", 169),
    ("laquo", 171),
    ("shy", 173),
    ("reg", 174),
    ("deg", 176),
    ("plusmn", 177),
    ("sup2", 178),
    ("sup3", 179),
    ("micro", 181),
    ("middot", 183),
    ("raquo", 187),
    ("frac14", 188),
    ("frac12", 189),
    ("frac34", 190),
    ("iquest", 191),
    ("times", 215),
    ("divide", 247),
    ("aacute", 225),
    ("agrave", 224),
    ("auml", 228),
    ("ccedil", 231),
    ("eacute", 233),
    ("egrave", 232),
    ("iacute", 237),
    ("ntilde", 241),
    ("oacute", 243),
    ("ouml", 246),
    ("uacute", 250),
    ("uuml", 252),
    ("szlig", 223),
    ("alpha", 945),
    ("beta", 946),
    ("gamma", 947),
    ("delta", 948),
    ("mu", 956),
    ("pi", 960),
    ("sigma", 963),
    ("ndash", 8211),
    ("mdash", 8212),
    ("lsquo", 8216),
    ("rsquo", 8217),
    ("ldquo", 8220),
    ("rdquo", 8221),
    ("bull", 8226),
    ("hellip", 8230),
    ("euro", 8364),
    ("trade", 8482),
    ("larr", 8592),
    ("rarr", 8594),
    ("le", 8804),
    ("ge", 8805),
    ("ne", 8800),
];

/// A single character-level fix applied before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    /// Leading UTF-8 byte-order mark removed.
    ByteOrderMark,
    /// Invalid UTF-8 sequences replaced with U+FFFD.
    InvalidUtf8,
    /// Character not allowed in XML 1.0 removed.
    IllegalCharacter(char),
    /// HTML entity rewritten as a numeric character reference.
    HtmlEntity(String),
    /// Undeclared entity escaped as literal text.
    UnknownEntity(String),
    /// Bare `&` escaped as `&amp;`.
    BareAmpersand,
    /// HTML void element without a closing slash, self-closed.
    UnclosedVoidElement(String),
    /// End tag of an HTML void element, removed.
    VoidEndTag(String),
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByteOrderMark => write!(f, "removed byte-order mark"),
            Self::InvalidUtf8 => write!(f, "replaced invalid UTF-8"),
            Self::IllegalCharacter(c) => write!(f, "removed illegal character U+{:04X}", *c as u32),
            Self::HtmlEntity(name) => write!(f, "rewrote HTML entity &{name};"),
            Self::UnknownEntity(name) => write!(f, "escaped unknown entity &{name};"),
            Self::BareAmpersand => write!(f, "escaped bare '&'"),
            Self::UnclosedVoidElement(name) => write!(f, "self-closed <{name}>"),
            Self::VoidEndTag(name) => write!(f, "removed </{name}>"),
        }
    }
}

/// Raw content of one question file, repaired and ready to parse.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    text: String,
    repairs: Vec<Repair>,
}

impl SourceFile {
    /// Build from raw bytes, applying markup recovery.
    ///
    /// # Returns
    /// * `Err(ConverterError::MalformedMarkup)` if the repair budget is exceeded
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: &[u8]) -> Result<Self> {
        let path = path.into();
        let (text, repairs) = recover_markup(bytes);

        if repairs.len() > MAX_MARKUP_REPAIRS {
            return Err(ConverterError::MalformedMarkup {
                path,
                repairs: repairs.len(),
                limit: MAX_MARKUP_REPAIRS,
            });
        }

        if !repairs.is_empty() {
            tracing::warn!(
                path = %path.display(),
                repairs = repairs.len(),
                "Recovered malformed markup"
            );
            for repair in &repairs {
                tracing::debug!(path = %path.display(), "{repair}");
            }
        }

        Ok(Self {
            path,
            text,
            repairs,
        })
    }

    /// Parse the repaired content into a namespace-aware tree.
    ///
    /// A document type declaration is accepted; only its internal subset is read.
    pub fn parse(&self) -> Result<Document<'_>> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        Document::parse_with_options(&self.text, options).map_err(|source| {
            ConverterError::XmlParse {
                path: self.path.clone(),
                source,
            }
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component, empty if the path has none.
    #[must_use]
    pub fn file_name(&self) -> Cow<'_, str> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn repairs(&self) -> &[Repair] {
        &self.repairs
    }
}

/// Read a question file from disk.
///
/// # Returns
/// * `Err(ConverterError::ReadFile)` if the file cannot be read
/// * `Err(ConverterError::MalformedMarkup)` if the markup is beyond repair
pub fn load(path: &Path) -> Result<SourceFile> {
    let bytes = fs::read(path).map_err(|source| ConverterError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    SourceFile::from_bytes(path, &bytes)
}

/// Apply character-level repairs to raw file content.
///
/// # Returns
/// The repaired text and the list of repairs made, in the order applied.
pub fn recover_markup(bytes: &[u8]) -> (String, Vec<Repair>) {
    let mut repairs = Vec::new();

    let bytes = match bytes.strip_prefix(b"\xEF\xBB\xBF") {
        Some(rest) => {
            repairs.push(Repair::ByteOrderMark);
            rest
        }
        None => bytes,
    };

    let decoded = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = decoded {
        repairs.push(Repair::InvalidUtf8);
    }

    let cleaned: String = decoded
        .chars()
        .filter(|&c| {
            if is_xml_char(c) {
                true
            } else {
                repairs.push(Repair::IllegalCharacter(c));
                false
            }
        })
        .collect();

    let mut text = String::with_capacity(cleaned.len());
    let mut last = 0;
    for section in VERBATIM_SECTION_PATTERN.find_iter(&cleaned) {
        text.push_str(&repair_segment(&cleaned[last..section.start()], &mut repairs));
        text.push_str(section.as_str());
        last = section.end();
    }
    text.push_str(&repair_segment(&cleaned[last..], &mut repairs));

    (text, repairs)
}

/// Characters allowed by the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}

/// Repairs for markup outside CDATA sections and comments.
fn repair_segment(segment: &str, repairs: &mut Vec<Repair>) -> String {
    let tags = close_void_elements(segment, repairs);
    repair_references(&tags, repairs).into_owned()
}

/// Self-close HTML void elements and drop their end tags.
fn close_void_elements<'t>(segment: &'t str, repairs: &mut Vec<Repair>) -> Cow<'t, str> {
    VOID_ELEMENT_PATTERN.replace_all(segment, |caps: &Captures<'_>| {
        let whole = &caps[0];
        let name = &caps[2];
        let attributes = caps.get(3).map_or("", |m| m.as_str());

        if !caps[1].is_empty() {
            repairs.push(Repair::VoidEndTag(name.to_string()));
            String::new()
        } else if attributes.trim_end().ends_with('/') {
            whole.to_string()
        } else {
            repairs.push(Repair::UnclosedVoidElement(name.to_string()));
            format!("<{name}{attributes}/>")
        }
    })
}

/// Fix entity references.
fn repair_references<'t>(segment: &'t str, repairs: &mut Vec<Repair>) -> Cow<'t, str> {
    AMPERSAND_PATTERN.replace_all(segment, |caps: &Captures<'_>| {
        let Some(reference) = caps.get(1).map(|m| m.as_str()) else {
            repairs.push(Repair::BareAmpersand);
            return "&amp;".to_string();
        };

        if reference.starts_with('#') || XML_ENTITIES.contains(&reference) {
            return format!("&{reference};");
        }

        match HTML_ENTITIES.iter().find(|(name, _)| *name == reference) {
            Some((name, code)) => {
                repairs.push(Repair::HtmlEntity((*name).to_string()));
                format!("&#{code};")
            }
            None => {
                repairs.push(Repair::UnknownEntity(reference.to_string()));
                format!("&amp;{reference};")
            }
        }
    })
}
