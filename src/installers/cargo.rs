// src/installers/cargo.rs

//! `pkg:cargo/<name>@<version>` - crates.io and git-sourced Rust tools

use crate::error::Result;
use crate::package::Package;
use crate::purl::Purl;

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package) -> Result<()> {
    ws.run("cargo", build_args(&pkg.purl))
}

/// Assemble the `cargo install` argument list from the PURL
///
/// A `repository_url` qualifier switches to a git build pinned by `--rev`
/// (when `rev=true`) or `--tag`; otherwise the registry version is pinned
/// with `--version`. `features` and `locked` pass through.
fn build_args(purl: &Purl) -> Vec<String> {
    let mut args: Vec<String> = vec!["install".into(), "--root".into(), ".".into()];

    if let Some(repo_url) = purl.qualifier("repository_url") {
        args.push("--git".into());
        args.push(repo_url);
        args.push(if purl.qualifier_flag("rev") { "--rev" } else { "--tag" }.into());
        args.push(purl.version.clone());
    } else if !purl.version.is_empty() {
        args.push("--version".into());
        args.push(purl.version.clone());
    }

    if let Some(features) = purl.qualifier("features") {
        args.push("--features".into());
        args.push(features);
    }
    if purl.qualifier_flag("locked") {
        args.push("--locked".into());
    }

    args.push(purl.name.clone());
    args
}
