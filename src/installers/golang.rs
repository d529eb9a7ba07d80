// src/installers/golang.rs

//! `pkg:golang/<module-path>/<name>@<version>` - Go tools via `go install`

use std::collections::BTreeMap;

use crate::error::Result;
use crate::package::Package;
use crate::purl::Purl;

use super::Workspace;

pub fn install(ws: &Workspace, pkg: &Package) -> Result<()> {
    let env = BTreeMap::from([("GOBIN".to_string(), ws.dir_str())]);
    ws.run_with_env("go", ["install".to_string(), "-v".to_string(), module_spec(&pkg.purl)], &env)
}

/// `<namespace>/<name>[/<subpath>]@<version>`
fn module_spec(purl: &Purl) -> String {
    let mut spec = format!("{}/{}", purl.namespace, purl.name);
    if !purl.subpath.is_empty() {
        spec.push('/');
        spec.push_str(&purl.subpath);
    }
    spec.push('@');
    spec.push_str(&purl.version);
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_spec() {
        let purl = Purl::parse("pkg:golang/github.com/owner/tool@v1.2.3");
        assert_eq!(module_spec(&purl), "github.com/owner/tool@v1.2.3");
    }

    #[test]
    fn test_module_spec_with_subpath() {
        let purl = Purl::parse("pkg:golang/golang.org/x/tools@v0.9.0#cmd/gopls");
        assert_eq!(module_spec(&purl), "golang.org/x/tools/cmd/gopls@v0.9.0");
    }
}
