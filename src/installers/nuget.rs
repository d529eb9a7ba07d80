// src/installers/nuget.rs

//! `pkg:nuget/<name>@<version>` - .NET tools via `dotnet tool`

use crate::error::Result;
use crate::package::Package;

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package) -> Result<()> {
    ws.run(
        "dotnet",
        [
            "tool",
            "update",
            "--tool-path",
            ".",
            "--version",
            pkg.purl.version.as_str(),
            pkg.purl.name.as_str(),
        ],
    )
}
