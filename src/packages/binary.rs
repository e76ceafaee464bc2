// src/packages/binary.rs

//! Built package description (the `CONTROL` file of a staged package)

use crate::control::{optional_field, required_field, split_list, ControlParagraph, Paragraph};
use crate::error::Result;
use crate::packages::source::{filter_dependencies, SourceParagraph};
use crate::packages::{PackageSpec, Triplet};

/// Metadata of a package that has been built for one triplet
///
/// Dependencies are plain names: qualifiers were resolved against the
/// triplet when the package was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryParagraph {
    pub spec: PackageSpec,
    pub version: Option<String>,
    pub description: Option<String>,
    pub maintainer: Option<String>,
    pub depends: Vec<String>,
}

impl BinaryParagraph {
    pub fn new(spec: PackageSpec) -> Self {
        Self {
            spec,
            version: None,
            description: None,
            maintainer: None,
            depends: Vec::new(),
        }
    }

    /// Describe the result of building `source` for `triplet`
    pub fn from_source(source: &SourceParagraph, triplet: &Triplet) -> Result<Self> {
        Ok(Self {
            spec: PackageSpec::new(&source.name, triplet.clone())?,
            version: source.version.clone(),
            description: source.description.clone(),
            maintainer: source.maintainer.clone(),
            depends: filter_dependencies(&source.depends, triplet),
        })
    }

    pub fn with_depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends = depends.into_iter().map(Into::into).collect();
        self
    }

    /// Filename-safe identity, used to name the listfile
    pub fn full_stem(&self) -> String {
        self.spec.full_stem()
    }

    pub fn display_name(&self) -> String {
        self.spec.to_string()
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.depends.iter().any(|dep| dep == name)
    }
}

impl ControlParagraph for BinaryParagraph {
    fn from_paragraph(paragraph: &Paragraph) -> Result<Self> {
        let name = required_field(paragraph, "Package")?;
        let triplet = Triplet::new(required_field(paragraph, "Architecture")?);

        Ok(Self {
            spec: PackageSpec::new(name, triplet)?,
            version: optional_field(paragraph, "Version"),
            description: optional_field(paragraph, "Description"),
            maintainer: optional_field(paragraph, "Maintainer"),
            depends: paragraph
                .get("Depends")
                .map(|v| split_list(v).map(str::to_string).collect())
                .unwrap_or_default(),
        })
    }

    fn to_paragraph(&self) -> Paragraph {
        let mut p = Paragraph::new();
        p.insert("Package".to_string(), self.spec.name().to_string());
        if let Some(version) = &self.version {
            p.insert("Version".to_string(), version.clone());
        }
        p.insert("Architecture".to_string(), self.spec.triplet().to_string());
        p.insert("Multi-Arch".to_string(), "same".to_string());
        if let Some(maintainer) = &self.maintainer {
            p.insert("Maintainer".to_string(), maintainer.clone());
        }
        if let Some(description) = &self.description {
            p.insert("Description".to_string(), description.clone());
        }
        if !self.depends.is_empty() {
            p.insert("Depends".to_string(), self.depends.join(", "));
        }
        p
    }
}
