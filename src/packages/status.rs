// src/packages/status.rs

//! Installed-status record: a binary description plus where it stands

use crate::control::{required_field, ControlParagraph, Paragraph};
use crate::error::{Error, Result};
use crate::packages::BinaryParagraph;
use serde::Serialize;
use std::str::FromStr;

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Want {
    Install,
    Purge,
}

impl Want {
    pub fn as_str(&self) -> &str {
        match self {
            Want::Install => "install",
            Want::Purge => "purge",
        }
    }
}

impl FromStr for Want {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "install" => Ok(Want::Install),
            "purge" => Ok(Want::Purge),
            _ => Err(format!("Invalid want: {}", s)),
        }
    }
}

/// Where the package actually is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallState {
    NotInstalled,
    HalfInstalled,
    Installed,
}

impl InstallState {
    pub fn as_str(&self) -> &str {
        match self {
            InstallState::NotInstalled => "not-installed",
            InstallState::HalfInstalled => "half-installed",
            InstallState::Installed => "installed",
        }
    }
}

impl FromStr for InstallState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "not-installed" => Ok(InstallState::NotInstalled),
            "half-installed" => Ok(InstallState::HalfInstalled),
            "installed" => Ok(InstallState::Installed),
            _ => Err(format!("Invalid install state: {}", s)),
        }
    }
}

/// Durable truth about one package's presence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusParagraph {
    pub package: BinaryParagraph,
    pub want: Want,
    pub state: InstallState,
}

impl StatusParagraph {
    pub fn new(package: BinaryParagraph, want: Want, state: InstallState) -> Self {
        Self {
            package,
            want,
            state,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.want == Want::Install && self.state == InstallState::Installed
    }

    /// Value of the `Status` field, e.g. `install ok installed`
    pub fn status_line(&self) -> String {
        format!("{} ok {}", self.want.as_str(), self.state.as_str())
    }
}

impl ControlParagraph for StatusParagraph {
    fn from_paragraph(paragraph: &Paragraph) -> Result<Self> {
        let status = required_field(paragraph, "Status")?;
        let words: Vec<&str> = status.split_whitespace().collect();
        let [want, "ok", state] = words.as_slice() else {
            return Err(Error::InvalidRecord(format!("malformed Status field: '{}'", status)));
        };

        Ok(Self {
            package: BinaryParagraph::from_paragraph(paragraph)?,
            want: want.parse().map_err(Error::InvalidRecord)?,
            state: state.parse().map_err(Error::InvalidRecord)?,
        })
    }

    fn to_paragraph(&self) -> Paragraph {
        let mut p = self.package.to_paragraph();
        p.insert("Status".to_string(), self.status_line());
        p
    }
}
