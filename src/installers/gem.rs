// src/installers/gem.rs

//! `pkg:gem/<name>@<version>` - Ruby tools installed into the package dir

use std::collections::BTreeMap;

use crate::error::Result;
use crate::package::Package;

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package) -> Result<()> {
    let env = BTreeMap::from([("GEM_HOME".to_string(), ws.dir_str())]);
    ws.run_with_env(
        "gem",
        [
            "install".to_string(),
            "--no-user-install".to_string(),
            "--no-format-executable".to_string(),
            "--install-dir=.".to_string(),
            "--bindir=bin".to_string(),
            "--no-document".to_string(),
            format!("{}:{}", pkg.purl.name, pkg.purl.version),
        ],
        &env,
    )
}
