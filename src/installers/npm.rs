// src/installers/npm.rs

//! `pkg:npm/<name>@<version>` - Node tools in a throwaway npm project
//!
//! `install-strategy=shallow` keeps the dependency tree flat enough that
//! `node_modules/.bin` holds the executables the linker expects.

use std::fs;

use crate::error::Result;
use crate::package::Package;

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package) -> Result<()> {
    fs::write(ws.dir.join(".npmrc"), "install-strategy=shallow")?;
    ws.run("npm", ["init", "--yes", "--scope=mason"])?;

    let mut args: Vec<String> = vec![
        "install".into(),
        format!("{}@{}", pkg.purl.name, pkg.purl.version),
    ];
    args.extend(pkg.extra_packages.iter().cloned());
    ws.run("npm", args)
}
