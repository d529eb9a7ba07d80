// src/config.rs

//! Filesystem layout and registry configuration
//!
//! All mason state lives under a single data directory:
//!
//! - `packages/<name>/` - per-package roots (plus `mason-receipt.json`)
//! - `bin/`, `share/`, `opt/` - exported link trees
//! - `registries/github/<owner>/<repo>/` - cached registries
//! - `mason.lock` - advisory lock for the mutating command path
//!
//! The config is built once at startup from the environment and threaded
//! through [`crate::context::Context`]; nothing reads these paths from
//! globals.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Default registry repository when `MASON_REGISTRY_REPO` is unset
pub const DEFAULT_REGISTRY_REPO: &str = "mason-org/mason-registry";

/// Where a registry's recipes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// GitHub repository releasing `registry.json.zip` + `checksums.txt`
    GitHub { repo: String },
    /// Local directory of `packages/<name>/package.yaml` files
    File { dir: PathBuf },
}

/// Immutable runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of all mason state
    pub data_dir: PathBuf,
    /// Scratch space for downloads
    pub cache_dir: PathBuf,
    /// Exported executables
    pub bin_dir: PathBuf,
    /// Exported data trees
    pub share_dir: PathBuf,
    /// Exported optional trees
    pub opt_dir: PathBuf,
    /// Per-package roots
    pub packages_dir: PathBuf,
    /// Cached registries
    pub registries_dir: PathBuf,
    /// Advisory lock file guarding mutating commands
    pub lock_path: PathBuf,
    /// Configured registries, highest priority first
    pub registries: Vec<RegistrySource>,
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Self {
        let data_dir = env::var_os("MASON_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let cache_dir = env::var_os("MASON_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);

        Self::at(data_dir, cache_dir, registries_from_env())
    }

    /// Build a configuration rooted at explicit directories
    ///
    /// Used by tests and anywhere the environment should not leak in.
    pub fn at(data_dir: PathBuf, cache_dir: PathBuf, registries: Vec<RegistrySource>) -> Self {
        Self {
            bin_dir: data_dir.join("bin"),
            share_dir: data_dir.join("share"),
            opt_dir: data_dir.join("opt"),
            packages_dir: data_dir.join("packages"),
            registries_dir: data_dir.join("registries"),
            lock_path: data_dir.join("mason.lock"),
            data_dir,
            cache_dir,
            registries,
        }
    }

    /// Create the exported directory tree if it does not exist
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.data_dir,
            &self.cache_dir,
            &self.bin_dir,
            &self.share_dir,
            &self.opt_dir,
            &self.packages_dir,
            &self.registries_dir,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Root directory of the named package
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.packages_dir.join(name)
    }

    /// Cache directory for a registry source
    pub fn registry_dir(&self, source: &RegistrySource) -> PathBuf {
        match source {
            RegistrySource::GitHub { repo } => self.registries_dir.join("github").join(repo),
            RegistrySource::File { dir } => dir.clone(),
        }
    }

    /// True if `path` is rooted under the mason data directory
    ///
    /// Guard for destructive operations: rmtree must never act on a path
    /// outside the tree we own, no matter what a recipe expanded to.
    pub fn owns(&self, path: &Path) -> bool {
        path.starts_with(&self.data_dir)
    }
}

fn default_data_dir() -> PathBuf {
    if cfg!(windows) {
        env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("mason")
    } else {
        env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(dirs::data_dir)
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join("mason")
    }
}

fn default_cache_dir() -> PathBuf {
    if cfg!(windows) {
        env::var_os("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("mason")
    } else {
        env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(dirs::cache_dir)
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("mason")
    }
}

/// Parse the registry list from the environment
///
/// `MASON_REGISTRIES` is a comma-separated list of `github:owner/repo` and
/// `file:<dir>` entries, highest priority first. When unset, the single
/// GitHub registry named by `MASON_REGISTRY_REPO` is used.
fn registries_from_env() -> Vec<RegistrySource> {
    if let Some(spec) = env::var("MASON_REGISTRIES").ok().filter(|s| !s.is_empty()) {
        return spec.split(',').filter_map(parse_registry_spec).collect();
    }
    let repo = env::var("MASON_REGISTRY_REPO").unwrap_or_else(|_| DEFAULT_REGISTRY_REPO.into());
    vec![RegistrySource::GitHub { repo }]
}

fn parse_registry_spec(spec: &str) -> Option<RegistrySource> {
    let spec = spec.trim();
    if let Some(repo) = spec.strip_prefix("github:") {
        Some(RegistrySource::GitHub { repo: repo.to_string() })
    } else if let Some(dir) = spec.strip_prefix("file:") {
        Some(RegistrySource::File { dir: PathBuf::from(dir) })
    } else if !spec.is_empty() {
        // Bare `owner/repo` is treated as a GitHub registry
        Some(RegistrySource::GitHub { repo: spec.to_string() })
    } else {
        None
    }
}
