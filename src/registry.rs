// src/registry.rs

//! Recipe registry store
//!
//! Two backends provide recipes:
//!
//! - **github**: recipes ship as a `registry.json.zip` release asset with a
//!   sibling `checksums.txt`. The cache lives at
//!   `registries/github/<owner>/<repo>/{registry.json, info.json}` and is
//!   refreshed when the latest release tag differs from the cached
//!   `info.version`.
//! - **file**: a local directory of `packages/<name>/package.yaml` files,
//!   parsed as a concatenated multi-document YAML stream.
//!
//! Downloads are staged and checksum-verified before anything replaces the
//! cached registry; a corrupted release leaves the previous cache intact.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::archive;
use crate::config::{Config, RegistrySource};
use crate::error::{Error, Result};
use crate::http::HttpClient;

/// Release asset holding the recipe array
const REGISTRY_ARCHIVE: &str = "registry.json.zip";

/// Release asset listing `<sha256> <filename>` pairs
const CHECKSUMS_FILE: &str = "checksums.txt";

/// Decoded recipe array filename
const REGISTRY_JSON: &str = "registry.json";

/// Cache metadata filename
const INFO_JSON: &str = "info.json";

/// Cache metadata for a downloaded registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryInfo {
    /// Unix timestamp of the download
    pub download_timestamp: i64,
    /// Release tag the cache was built from
    pub version: String,
    /// filename -> sha256 from the release's checksum list
    pub checksums: BTreeMap<String, String>,
}

/// GitHub "latest release" response (the fields we read)
#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

/// A loaded recipe source
#[derive(Debug)]
pub struct Registry {
    /// Where the recipes come from
    pub source: RegistrySource,
    /// On-disk location (cache dir for github, the directory itself for file)
    pub path: PathBuf,
    /// Decoded recipes in registry order
    pub packages: Vec<Value>,
    /// Cache metadata; `None` for file registries
    pub info: Option<RegistryInfo>,
}

impl Registry {
    /// Load a registry, downloading a github registry on first use
    pub fn load(config: &Config, source: RegistrySource, client: &HttpClient) -> Result<Self> {
        let path = config.registry_dir(&source);
        let mut registry = Registry {
            source,
            path,
            packages: Vec::new(),
            info: None,
        };

        let needs_download = matches!(registry.source, RegistrySource::GitHub { .. })
            && !registry.path.join(REGISTRY_JSON).exists();
        if needs_download {
            println!("Downloading registry...");
            registry.update(client)?;
        } else {
            registry.reload()?;
        }

        Ok(registry)
    }

    /// Refresh the registry from its source
    ///
    /// Returns true when new recipes were fetched.
    pub fn update(&mut self, client: &HttpClient) -> Result<bool> {
        match self.source.clone() {
            RegistrySource::GitHub { repo } => {
                let release: Release = client.fetch_json(&format!(
                    "https://api.github.com/repos/{repo}/releases/latest"
                ))?;

                if let Some(info) = &self.info {
                    if info.version == release.tag_name {
                        info!("Registry {} up-to-date ({})", repo, info.version);
                        return Ok(false);
                    }
                }

                self.download_release(client, &release)?;
                self.reload()?;
                println!("Registry updated to {}", release.tag_name);
                Ok(true)
            }
            RegistrySource::File { .. } => {
                self.reload()?;
                Ok(true)
            }
        }
    }

    /// Download and verify a github release, then commit it to the cache
    ///
    /// All work happens in a staging directory next to the cache; only a
    /// fully verified registry replaces the cached one.
    fn download_release(&self, client: &HttpClient, release: &Release) -> Result<()> {
        fs::create_dir_all(&self.path)?;
        let staging = tempfile::tempdir_in(&self.path)?;

        for name in [CHECKSUMS_FILE, REGISTRY_ARCHIVE] {
            let url = release
                .assets
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.browser_download_url.as_str())
                .ok_or_else(|| {
                    Error::RegistryCorrupt(format!("release {} has no '{name}' asset", release.tag_name))
                })?;
            client.download_file(url, &staging.path().join(name))?;
        }

        archive::extract(&staging.path().join(REGISTRY_ARCHIVE), staging.path())?;
        let checksums = verify_checksums(&staging.path().join(CHECKSUMS_FILE))?;

        let decoded = staging.path().join(REGISTRY_JSON);
        if !decoded.exists() {
            return Err(Error::RegistryCorrupt(format!(
                "{REGISTRY_ARCHIVE} did not contain {REGISTRY_JSON}"
            )));
        }
        fs::rename(&decoded, self.path.join(REGISTRY_JSON))?;

        let info = RegistryInfo {
            download_timestamp: chrono::Utc::now().timestamp(),
            version: release.tag_name.clone(),
            checksums,
        };
        fs::write(
            self.path.join(INFO_JSON),
            serde_json::to_string_pretty(&info)?,
        )?;

        // The staging directory (archive + checksum file) is removed on drop
        Ok(())
    }

    /// Re-read recipes (and cache info) from disk
    fn reload(&mut self) -> Result<()> {
        match &self.source {
            RegistrySource::GitHub { .. } => {
                let data = fs::read(self.path.join(REGISTRY_JSON))?;
                self.packages = serde_json::from_slice(&data)?;
                let info_path = self.path.join(INFO_JSON);
                self.info = if info_path.exists() {
                    Some(serde_json::from_slice(&fs::read(info_path)?)?)
                } else {
                    None
                };
            }
            RegistrySource::File { dir } => {
                self.packages = load_yaml_packages(dir)?;
                self.info = None;
            }
        }
        debug!(
            "Loaded {} recipes from {}",
            self.packages.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Verify every `<sha256> <filename>` line against the files beside it
///
/// Missing files are [`Error::RegistryCorrupt`]; content drift is
/// [`Error::ChecksumMismatch`]. Returns the parsed filename -> hash map.
pub fn verify_checksums(checksums_path: &Path) -> Result<BTreeMap<String, String>> {
    let dir = checksums_path
        .parent()
        .ok_or_else(|| Error::RegistryCorrupt("checksum file has no parent".into()))?;
    let mut map = BTreeMap::new();

    for line in fs::read_to_string(checksums_path)?.lines() {
        let mut parts = line.split_whitespace();
        let (Some(expected), Some(file)) = (parts.next(), parts.next()) else {
            continue;
        };

        let file_path = dir.join(file);
        if !file_path.exists() {
            return Err(Error::RegistryCorrupt(format!(
                "checksum list references missing file '{file}'"
            )));
        }

        let actual = sha256_file(&file_path)?;
        if actual != expected {
            return Err(Error::ChecksumMismatch {
                file: file.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }

        map.insert(file.to_string(), expected.to_string());
    }

    Ok(map)
}

/// Hex SHA-256 of a file's contents
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Parse `packages/<name>/package.yaml` files as one multi-document stream
fn load_yaml_packages(dir: &Path) -> Result<Vec<Value>> {
    let packages_dir = dir.join("packages");
    let mut entries: Vec<PathBuf> = match fs::read_dir(&packages_dir) {
        Ok(read) => read
            .filter_map(|e| e.ok())
            .map(|e| e.path().join("package.yaml"))
            .filter(|p| p.exists())
            .collect(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::RegistryCorrupt(format!(
                "file registry has no packages directory: {}",
                packages_dir.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };
    entries.sort();

    let mut packages = Vec::new();
    for path in entries {
        let text = fs::read_to_string(&path)?;
        for document in serde_yaml::Deserializer::from_str(&text) {
            let yaml: serde_yaml::Value = serde::Deserialize::deserialize(document)?;
            packages.push(serde_json::to_value(yaml)?);
        }
    }
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data");
        fs::write(&path, b"hello").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_verify_checksums_ok() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), b"hello").unwrap();
        fs::write(
            dir.path().join("checksums.txt"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824  a.json\n",
        )
        .unwrap();

        let map = verify_checksums(&dir.path().join("checksums.txt")).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("a.json"));
    }

    #[test]
    fn test_verify_checksums_detects_mutation() {
        let dir = TempDir::new().unwrap();
        // One byte off from "hello"
        fs::write(dir.path().join("a.json"), b"hellp").unwrap();
        fs::write(
            dir.path().join("checksums.txt"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824  a.json\n",
        )
        .unwrap();

        let err = verify_checksums(&dir.path().join("checksums.txt")).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_verify_checksums_missing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("checksums.txt"), "abc123  ghost.json\n").unwrap();

        let err = verify_checksums(&dir.path().join("checksums.txt")).unwrap_err();
        assert!(matches!(err, Error::RegistryCorrupt(_)));
    }

    #[test]
    fn test_load_yaml_packages() {
        let dir = TempDir::new().unwrap();
        let pkg_dir = dir.path().join("packages/tool-a");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(
            pkg_dir.join("package.yaml"),
            "name: tool-a\nsource:\n  id: pkg:cargo/tool-a@1.0\n",
        )
        .unwrap();
        let pkg_dir = dir.path().join("packages/tool-b");
        fs::create_dir_all(&pkg_dir).unwrap();
        // Multi-document file
        fs::write(
            pkg_dir.join("package.yaml"),
            "name: tool-b\n---\nname: tool-b-extra\n",
        )
        .unwrap();

        let packages = load_yaml_packages(dir.path()).unwrap();
        let names: Vec<&str> = packages
            .iter()
            .filter_map(|p| p.get("name").and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["tool-a", "tool-b", "tool-b-extra"]);
    }

    #[test]
    fn test_load_yaml_packages_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = load_yaml_packages(dir.path()).unwrap_err();
        assert!(matches!(err, Error::RegistryCorrupt(_)));
    }
}
