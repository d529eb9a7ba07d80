// src/installers/pypi.rs

//! `pkg:pypi/<name>@<version>` - Python tools in a per-package virtualenv
//!
//! The venv is created with `--system-site-packages` so tools that plug
//! into system interpreters (debuggers, formatters with native deps) can
//! see them; pip then installs the pinned release into the venv.

use crate::error::Result;
use crate::package::Package;
use crate::purl::Purl;

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package) -> Result<()> {
    let python = if cfg!(windows) { "python" } else { "python3" };
    ws.run(python, ["-m", "venv", "venv", "--system-site-packages"])?;

    let venv_python = if cfg!(windows) {
        ws.dir.join("venv").join("Scripts").join("python.exe")
    } else {
        ws.dir.join("venv").join("bin").join("python")
    };

    let mut args: Vec<String> = vec![
        "-m".into(),
        "pip".into(),
        "--disable-pip-version-check".into(),
        "install".into(),
        "--ignore-installed".into(),
        "-U".into(),
        requirement(&pkg.purl),
    ];
    args.extend(pkg.extra_packages.iter().cloned());
    ws.run(&venv_python.to_string_lossy(), args)
}

/// `name[extra]==version` pip requirement
fn requirement(purl: &Purl) -> String {
    let extra = purl
        .qualifier("extra")
        .map(|e| format!("[{e}]"))
        .unwrap_or_default();
    format!("{}{}=={}", purl.name, extra, purl.version)
}
