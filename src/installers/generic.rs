// src/installers/generic.rs

//! `pkg:generic/<name>@<version>` - direct downloads from arbitrary URLs
//!
//! The selected download variant maps destination filenames to URLs; each
//! file is streamed into the package directory and extracted when the name
//! looks like an archive.

use tracing::info;

use crate::archive;
use crate::error::Result;
use crate::http::HttpClient;
use crate::package::{Files, Package};

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package, client: &HttpClient) -> Result<()> {
    let Some(Files::Map(files)) = &pkg.files else {
        info!("Package '{}' has no files for this platform", pkg.name);
        return Ok(());
    };

    for (filename, url) in files {
        let out_path = ws.dir.join(filename);
        client.download_file(url, &out_path)?;
        if archive::is_extractable(&out_path) {
            archive::extract(&out_path, &ws.dir)?;
        }
    }
    Ok(())
}
