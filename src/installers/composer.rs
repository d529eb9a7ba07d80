// src/installers/composer.rs

//! `pkg:composer/<vendor>/<name>@<version>` - PHP tools via Composer

use crate::error::Result;
use crate::package::Package;

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package) -> Result<()> {
    ws.run("composer", ["init", "--no-interaction", "--stability=stable"])?;
    ws.run(
        "composer",
        [
            "require".to_string(),
            format!("{}/{}:{}", pkg.purl.namespace, pkg.purl.name, pkg.purl.version),
        ],
    )
}
