// src/packages/spec.rs

//! Package identity: a package name paired with a target triplet

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Target configuration a package is built for (e.g. `x64-linux`)
///
/// Stored in canonical lowercase form so that `X64-Linux` and `x64-linux`
/// name the same target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Triplet(String);

impl Triplet {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_ascii_lowercase())
    }

    pub fn canonical_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique key of a package within one target configuration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PackageSpec {
    name: String,
    triplet: Triplet,
}

/// Names and triplets become path components, so they must stay one
fn is_single_component(part: &str) -> bool {
    part != "." && part != ".." && !part.contains(['/', '\\', '\0'])
}

impl PackageSpec {
    pub fn new(name: &str, triplet: Triplet) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidSpec("package name is empty".to_string()));
        }
        if triplet.canonical_name().is_empty() {
            return Err(Error::InvalidSpec(format!("{}: triplet is empty", name)));
        }
        if name.contains(':') || triplet.canonical_name().contains([':', '_']) {
            return Err(Error::InvalidSpec(format!("{}:{}", name, triplet)));
        }
        if !is_single_component(name) || !is_single_component(triplet.canonical_name()) {
            return Err(Error::InvalidSpec(format!(
                "{}:{}: name and triplet must each be a single path component",
                name, triplet
            )));
        }

        Ok(Self {
            name: name.to_string(),
            triplet,
        })
    }

    /// Parse `name` or `name:triplet`, falling back to `default_triplet`
    pub fn parse(input: &str, default_triplet: &Triplet) -> Result<Self> {
        match input.split_once(':') {
            Some((name, triplet)) => Self::new(name, Triplet::new(triplet)),
            None => Self::new(input, default_triplet.clone()),
        }
    }

    /// Recover the identity from a listfile stem produced by [`full_stem`](Self::full_stem)
    pub fn from_listfile_stem(stem: &str) -> Result<Self> {
        let (name, triplet) = stem
            .rsplit_once('_')
            .ok_or_else(|| Error::InvalidSpec(format!("listfile stem without triplet: {}", stem)))?;
        Self::new(name, Triplet::new(triplet))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn triplet(&self) -> &Triplet {
        &self.triplet
    }

    /// Filename-safe form of the identity: `name_triplet`
    pub fn full_stem(&self) -> String {
        format!("{}_{}", self.name, self.triplet)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.triplet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_triplet() {
        let default = Triplet::new("x64-linux");

        let spec = PackageSpec::parse("zlib:X64-Windows", &default).unwrap();
        assert_eq!(spec.name(), "zlib");
        assert_eq!(spec.triplet().canonical_name(), "x64-windows");

        let spec = PackageSpec::parse("zlib", &default).unwrap();
        assert_eq!(spec.triplet(), &default);
        assert_eq!(spec.to_string(), "zlib:x64-linux");
    }

    #[test]
    fn test_parse_rejects_empty_parts() {
        let default = Triplet::new("x64-linux");
        assert!(matches!(
            PackageSpec::parse(":x64-linux", &default),
            Err(Error::InvalidSpec(_))
        ));
        assert!(PackageSpec::parse("zlib:", &default).is_err());
        assert!(PackageSpec::parse("a:b:c", &default).is_err());
    }

    #[test]
    fn test_rejects_names_that_leave_their_directory() {
        let default = Triplet::new("x64-linux");
        for input in [
            "../../../../escape",
            "a/b",
            "a\\b",
            "..",
            ".",
            "zlib\0",
            "zlib:../..",
            "zlib:x64/linux",
            "zlib:.",
        ] {
            assert!(
                matches!(PackageSpec::parse(input, &default), Err(Error::InvalidSpec(_))),
                "{:?} was accepted",
                input
            );
        }
        assert!(PackageSpec::new("zlib", Triplet::new("..")).is_err());

        // Dots inside a name are fine
        assert!(PackageSpec::parse("qt5.base", &default).is_ok());
        assert!(PackageSpec::parse("..hidden", &default).is_ok());
    }

    #[test]
    fn test_full_stem_round_trips_through_listfile_name() {
        let spec = PackageSpec::new("boost_system", Triplet::new("x86-windows")).unwrap();
        assert_eq!(spec.full_stem(), "boost_system_x86-windows");

        let decoded = PackageSpec::from_listfile_stem(&spec.full_stem()).unwrap();
        assert_eq!(decoded, spec);
    }

    #[test]
    fn test_ordering_is_name_then_triplet() {
        let a = PackageSpec::new("a", Triplet::new("x64-linux")).unwrap();
        let b = PackageSpec::new("a", Triplet::new("x86-linux")).unwrap();
        let c = PackageSpec::new("b", Triplet::new("arm-linux")).unwrap();
        assert!(a < b);
        assert!(b < c);
    }
}
