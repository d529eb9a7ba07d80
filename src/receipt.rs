// src/receipt.rs

//! Install receipts
//!
//! A receipt at `<pkgdir>/mason-receipt.json` is the commit record of an
//! install: its presence is the single source of truth for "installed",
//! and its link maps let uninstall remove exactly what install created.
//! Maps are ordered so repeated installs of the same recipe produce
//! byte-identical receipts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::purl::Purl;

/// Receipt filename inside the package directory
pub const RECEIPT_FILE: &str = "mason-receipt.json";

/// Exported-path -> in-package-path maps for each link tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub bin: BTreeMap<String, String>,
    #[serde(default)]
    pub share: BTreeMap<String, String>,
    #[serde(default)]
    pub opt: BTreeMap<String, String>,
}

/// The original PURL the package was installed from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimarySource {
    pub id: String,
}

/// On-disk commit record of an install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub name: String,
    pub primary_source: PrimarySource,
    pub links: Links,
}

impl Receipt {
    /// Build a receipt for a completed install
    pub fn new(name: &str, source_id: &str, links: Links) -> Self {
        Self {
            name: name.to_string(),
            primary_source: PrimarySource {
                id: source_id.to_string(),
            },
            links,
        }
    }

    /// Receipt path inside a package directory
    pub fn path(pkg_dir: &Path) -> PathBuf {
        pkg_dir.join(RECEIPT_FILE)
    }

    /// True when the package directory holds a receipt
    pub fn exists(pkg_dir: &Path) -> bool {
        Self::path(pkg_dir).exists()
    }

    /// Read the receipt from a package directory
    pub fn read(pkg_dir: &Path) -> Result<Self> {
        let data = fs::read(Self::path(pkg_dir))?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Write the receipt into a package directory
    ///
    /// This is the install's commit point; it runs after every other step
    /// has succeeded.
    pub fn write(&self, pkg_dir: &Path) -> Result<()> {
        fs::write(Self::path(pkg_dir), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Version recorded in the primary source PURL
    pub fn version(&self) -> String {
        Purl::parse(&self.primary_source.id).version
    }
}
