// src/packages/source.rs

//! Source package description (the `CONTROL` file of a port)

use crate::control::{optional_field, required_field, split_list, ControlParagraph, Paragraph};
use crate::error::{Error, Result};
use crate::packages::Triplet;

/// A build dependency, optionally limited to matching triplets
///
/// Written as `name` or `name (qualifier)` in `Build-Depends`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub qualifier: Option<String>,
}

impl Dependency {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            qualifier: None,
        }
    }

    pub fn qualified(name: &str, qualifier: &str) -> Self {
        Self {
            name: name.to_string(),
            qualifier: Some(qualifier.to_string()),
        }
    }

    /// Parse a single entry: "zlib" or "openssl (windows)"
    pub fn parse(entry: &str) -> Result<Self> {
        let entry = entry.trim();
        match entry.find('(') {
            Some(paren_pos) => {
                let name = entry[..paren_pos].trim();
                let qualifier = entry[paren_pos + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| Error::InvalidRecord(format!("unbalanced qualifier in '{}'", entry)))?
                    .trim();
                if name.is_empty() {
                    return Err(Error::InvalidRecord(format!("dependency without name: '{}'", entry)));
                }
                if qualifier.is_empty() {
                    Ok(Self::new(name))
                } else {
                    Ok(Self::qualified(name, qualifier))
                }
            }
            None => Ok(Self::new(entry)),
        }
    }

    /// Whether this dependency applies when building for `triplet`
    pub fn applies_to(&self, triplet: &Triplet) -> bool {
        match &self.qualifier {
            None => true,
            Some(q) => triplet.canonical_name().contains(q.to_ascii_lowercase().as_str()),
        }
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{} ({})", self.name, q),
            None => f.write_str(&self.name),
        }
    }
}

/// Names of the dependencies that apply to `triplet`
pub fn filter_dependencies(deps: &[Dependency], triplet: &Triplet) -> Vec<String> {
    deps.iter()
        .filter(|dep| dep.applies_to(triplet))
        .map(|dep| dep.name.clone())
        .collect()
}

/// Metadata of a buildable package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceParagraph {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub maintainer: Option<String>,
    pub depends: Vec<Dependency>,
}

impl ControlParagraph for SourceParagraph {
    fn from_paragraph(paragraph: &Paragraph) -> Result<Self> {
        let depends = match paragraph.get("Build-Depends") {
            Some(value) => split_list(value).map(Dependency::parse).collect::<Result<_>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            name: required_field(paragraph, "Source")?.to_string(),
            version: optional_field(paragraph, "Version"),
            description: optional_field(paragraph, "Description"),
            maintainer: optional_field(paragraph, "Maintainer"),
            depends,
        })
    }

    fn to_paragraph(&self) -> Paragraph {
        let mut p = Paragraph::new();
        p.insert("Source".to_string(), self.name.clone());
        if let Some(version) = &self.version {
            p.insert("Version".to_string(), version.clone());
        }
        if let Some(description) = &self.description {
            p.insert("Description".to_string(), description.clone());
        }
        if let Some(maintainer) = &self.maintainer {
            p.insert("Maintainer".to_string(), maintainer.clone());
        }
        if !self.depends.is_empty() {
            let deps: Vec<String> = self.depends.iter().map(ToString::to_string).collect();
            p.insert("Build-Depends".to_string(), deps.join(", "));
        }
        p
    }
}
