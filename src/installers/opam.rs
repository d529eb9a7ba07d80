// src/installers/opam.rs

//! `pkg:opam/<name>@<version>` - OCaml tools via opam

use crate::error::Result;
use crate::package::Package;

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package) -> Result<()> {
    ws.run(
        "opam",
        [
            "install".to_string(),
            "--destdir=.".to_string(),
            "--yes".to_string(),
            "--verbose".to_string(),
            format!("{}.{}", pkg.purl.name, pkg.purl.version),
        ],
    )
}
