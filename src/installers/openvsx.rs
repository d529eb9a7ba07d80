// src/installers/openvsx.rs

//! `pkg:openvsx/<publisher>/<name>@<version>` - VS Code extensions from
//! the Open VSX registry (vsix archives)

use crate::archive;
use crate::error::Result;
use crate::http::HttpClient;
use crate::package::{Files, Package};

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package, client: &HttpClient) -> Result<()> {
    let Some(Files::List(files)) = &pkg.files else {
        return Ok(());
    };

    for file in files {
        let url = format!(
            "https://open-vsx.org/api/{}/{}/{}/file/{}",
            pkg.purl.namespace, pkg.purl.name, pkg.purl.version, file
        );
        let out_path = ws.dir.join(file);
        client.download_file(&url, &out_path)?;
        if archive::is_extractable(&out_path) {
            archive::extract(&out_path, &ws.dir)?;
        }
    }
    Ok(())
}
