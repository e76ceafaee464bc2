// src/control/mod.rs

//! Control file paragraphs
//!
//! Source, binary and status records are all stored as RFC 822-like
//! paragraphs (`Key: Value` lines separated by blank lines). Parsing is
//! delegated to `rfc822_like`; writing is done here so that field order and
//! spacing are stable between runs. Parsed paragraphs always come back in
//! canonical field order, whatever order the file used.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// One stanza of a control file, in field order
pub type Paragraph = IndexMap<String, String>;

/// Conversion between a typed record and its paragraph form
pub trait ControlParagraph: Sized {
    /// Build the record from a parsed paragraph
    fn from_paragraph(paragraph: &Paragraph) -> Result<Self>;

    /// Render the record as a paragraph
    fn to_paragraph(&self) -> Paragraph;
}

/// Fields understood in any control or status paragraph
///
/// Unknown fields are dropped while parsing.
#[derive(Debug, Default, Deserialize)]
struct ControlEntry {
    #[serde(rename = "Source", default)]
    source: Option<String>,
    #[serde(rename = "Package", default)]
    package: Option<String>,
    #[serde(rename = "Version", default)]
    version: Option<String>,
    #[serde(rename = "Architecture", default)]
    architecture: Option<String>,
    #[serde(rename = "Multi-Arch", default)]
    multi_arch: Option<String>,
    #[serde(rename = "Maintainer", default)]
    maintainer: Option<String>,
    #[serde(rename = "Description", default)]
    description: Option<String>,
    #[serde(rename = "Depends", default)]
    depends: Option<String>,
    #[serde(rename = "Build-Depends", default)]
    build_depends: Option<String>,
    #[serde(rename = "Status", default)]
    status: Option<String>,
}

impl From<ControlEntry> for Paragraph {
    fn from(entry: ControlEntry) -> Self {
        [
            ("Source", entry.source),
            ("Package", entry.package),
            ("Version", entry.version),
            ("Architecture", entry.architecture),
            ("Multi-Arch", entry.multi_arch),
            ("Maintainer", entry.maintainer),
            ("Description", entry.description),
            ("Depends", entry.depends),
            ("Build-Depends", entry.build_depends),
            ("Status", entry.status),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
        .collect()
    }
}

/// Parse control text into paragraphs
///
/// `origin` only names the source in error messages.
pub fn parse_paragraphs(text: &str, origin: &Path) -> Result<Vec<Paragraph>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<ControlEntry> =
        rfc822_like::from_str(text).map_err(|e| Error::MalformedInput {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(entries.into_iter().map(Paragraph::from).collect())
}

/// Read a control file that must hold exactly one paragraph
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_control_file(path: &Path) -> Result<Option<Paragraph>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut paragraphs = parse_paragraphs(&text, path)?;
    if paragraphs.len() != 1 {
        return Err(Error::MalformedInput {
            path: path.to_path_buf(),
            reason: format!("expected 1 paragraph, found {}", paragraphs.len()),
        });
    }

    Ok(paragraphs.pop())
}

/// Render paragraphs, separated by blank lines
pub fn serialize_paragraphs<'a>(paragraphs: impl IntoIterator<Item = &'a Paragraph>) -> String {
    let mut out = String::new();
    for (i, paragraph) in paragraphs.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_paragraph(&mut out, paragraph);
    }
    out
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph) {
    for (key, value) in paragraph {
        let mut lines = value.lines();
        let _ = writeln!(out, "{}: {}", key, lines.next().unwrap_or_default());
        for line in lines {
            // Continuation lines; a lone "." stands for an empty line
            if line.trim().is_empty() {
                out.push_str(" .\n");
            } else {
                let _ = writeln!(out, " {}", line);
            }
        }
    }
}

/// Fetch a field that must be present and non-empty
pub(crate) fn required_field<'a>(paragraph: &'a Paragraph, key: &str) -> Result<&'a str> {
    paragraph
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidRecord(format!("missing required field '{}'", key)))
}

pub(crate) fn optional_field(paragraph: &Paragraph, key: &str) -> Option<String> {
    paragraph
        .get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma separated field, dropping empty entries
pub(crate) fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn paragraph(fields: &[(&str, &str)]) -> Paragraph {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_serialize_keeps_field_order() {
        let p = paragraph(&[("Package", "zlib"), ("Version", "1.2.11"), ("Architecture", "x64-linux")]);
        let text = serialize_paragraphs([&p]);
        assert_eq!(text, "Package: zlib\nVersion: 1.2.11\nArchitecture: x64-linux\n");
    }

    #[test]
    fn test_serialize_separates_paragraphs() {
        let a = paragraph(&[("Package", "a")]);
        let b = paragraph(&[("Package", "b")]);
        assert_eq!(serialize_paragraphs([&a, &b]), "Package: a\n\nPackage: b\n");
    }

    #[test]
    fn test_parse_serialized_paragraphs() {
        let a = paragraph(&[("Package", "zlib"), ("Version", "1.2.11")]);
        let b = paragraph(&[("Package", "openssl"), ("Depends", "zlib")]);
        let text = serialize_paragraphs([&a, &b]);

        let parsed = parse_paragraphs(&text, Path::new("status")).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].get("Package").map(String::as_str), Some("zlib"));
        assert_eq!(parsed[1].get("Depends").map(String::as_str), Some("zlib"));
    }

    #[test]
    fn test_parse_drops_unknown_fields() {
        let parsed = parse_paragraphs(
            "Package: zlib\nX-Custom: whatever\nArchitecture: x64-linux\n",
            Path::new("CONTROL"),
        )
        .unwrap();
        assert_eq!(
            parsed,
            vec![paragraph(&[("Package", "zlib"), ("Architecture", "x64-linux")])]
        );
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(parse_paragraphs("", Path::new("status")).unwrap().is_empty());
        assert!(parse_paragraphs("\n\n", Path::new("status")).unwrap().is_empty());
    }

    #[test]
    fn test_load_control_file_requires_single_paragraph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CONTROL");

        assert!(load_control_file(&path).unwrap().is_none());

        fs::write(&path, "Source: a\n\nSource: b\n").unwrap();
        match load_control_file(&path) {
            Err(Error::MalformedInput { path: p, .. }) => assert_eq!(p, PathBuf::from(&path)),
            other => panic!("expected MalformedInput, got {:?}", other),
        }

        fs::write(&path, "Source: zlib\nVersion: 1.2.11\n").unwrap();
        let p = load_control_file(&path).unwrap().unwrap();
        assert_eq!(required_field(&p, "Source").unwrap(), "zlib");
    }

    #[test]
    fn test_required_field_rejects_blank() {
        let p = paragraph(&[("Package", "  ")]);
        assert!(matches!(
            required_field(&p, "Package"),
            Err(Error::InvalidRecord(_))
        ));
        assert!(optional_field(&p, "Package").is_none());
    }
}
