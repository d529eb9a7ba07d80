// src/installers/luarocks.rs

//! `pkg:luarocks/<name>@<version>` - Lua rocks installed into a local tree

use crate::error::Result;
use crate::package::Package;

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package) -> Result<()> {
    let mut args: Vec<String> = vec!["install".into(), "--tree".into(), ws.dir_str()];

    if let Some(server) = pkg.purl.qualifier("repository_url") {
        args.push("--server".into());
        args.push(server);
    }
    if pkg.purl.qualifier_flag("dev") {
        args.push("--dev".into());
    }

    args.push(pkg.purl.name.clone());
    args.push(pkg.purl.version.clone());
    ws.run("luarocks", args)
}
