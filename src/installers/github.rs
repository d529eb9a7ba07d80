// src/installers/github.rs

//! `pkg:github/<owner>/<repo>@<version>` - release assets or git checkouts
//!
//! With a file list, each entry names a release asset with an optional
//! destination:
//!
//! - `asset` - download into the package root
//! - `asset:dest/` - download into the `dest/` directory
//! - `asset:dest` - download, then rename to `dest`
//!
//! Without files, the repository itself is checked out at the pinned tag
//! with a shallow clone.

use std::fs;
use std::path::PathBuf;

use crate::archive;
use crate::error::Result;
use crate::http::{self, HttpClient};
use crate::package::{Files, Package};

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package, client: &HttpClient) -> Result<()> {
    let repo = format!("{}/{}", pkg.purl.namespace, pkg.purl.name);
    let version = &pkg.purl.version;

    match &pkg.files {
        Some(Files::List(files)) => {
            for entry in files {
                let (asset_path, out_dir) =
                    fetch_asset(ws, client, &repo, version, entry)?;
                if archive::is_extractable(&asset_path) {
                    archive::extract(&asset_path, &out_dir)?;
                }
            }
            Ok(())
        }
        _ => checkout(ws, &repo, version),
    }
}

/// Download one asset entry, returning the downloaded path and the
/// directory archives should extract into
fn fetch_asset(
    ws: &Workspace,
    client: &HttpClient,
    repo: &str,
    version: &str,
    entry: &str,
) -> Result<(PathBuf, PathBuf)> {
    match entry.split_once(':') {
        Some((source, dest)) if dest.ends_with('/') => {
            let out_dir = ws.dir.join(dest);
            fs::create_dir_all(&out_dir)?;
            http::download_github_release_asset(client, repo, source, version, &out_dir)?;
            Ok((out_dir.join(source), out_dir))
        }
        Some((source, dest)) => {
            http::download_github_release_asset(client, repo, source, version, &ws.dir)?;
            let renamed = ws.dir.join(dest);
            fs::rename(ws.dir.join(source), &renamed)?;
            Ok((renamed, ws.dir.clone()))
        }
        None => {
            http::download_github_release_asset(client, repo, entry, version, &ws.dir)?;
            Ok((ws.dir.join(entry), ws.dir.clone()))
        }
    }
}

/// Shallow-checkout the repository at the pinned version
///
/// An existing checkout is advanced in place; a fresh directory is cloned
/// first. Both paths end with the work tree hard-reset to the tag.
fn checkout(ws: &Workspace, repo: &str, version: &str) -> Result<()> {
    if !ws.dir.join(".git").exists() {
        ws.run(
            "git",
            [
                "clone".to_string(),
                "--depth=1".to_string(),
                format!("https://github.com/{repo}.git"),
                ".".to_string(),
            ],
        )?;
    }
    ws.run("git", ["fetch", "--depth=1", "--tags", "origin", version])?;
    ws.run("git", ["reset", "--hard", version])
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_asset_entry_forms() {
        // The three spellings of a file entry
        assert_eq!("asset.tar.gz".split_once(':'), None);
        assert_eq!(
            "asset.tar.gz:libexec/".split_once(':'),
            Some(("asset.tar.gz", "libexec/"))
        );
        assert_eq!(
            "server.js:index.js".split_once(':'),
            Some(("server.js", "index.js"))
        );
    }
}
