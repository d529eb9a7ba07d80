// src/lifecycle.rs

//! Atomic install and uninstall
//!
//! `install` orchestrates the whole pipeline: mkdir the package dir,
//! dispatch the ecosystem installer, run the optional build step, emit
//! wrappers and links, then write the receipt. The receipt write is the
//! commit point. Until it lands, an [`InstallJournal`] tracks the package
//! dir and every exported link; any error (or panic) unwinds through the
//! journal's Drop, which unlinks the recorded paths in reverse and removes
//! the package dir.
//!
//! Destructive filesystem operations go through [`guarded_rmtree`], which
//! refuses any path not rooted under the mason data directory. Template
//! expansion feeds the package dir path, so the guard keeps a hostile or
//! broken recipe from ever aiming the cleanup somewhere else.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::installers::{self, Workspace};
use crate::link;
use crate::package::Package;
use crate::receipt::Receipt;

/// Rollback journal for an in-flight install
///
/// Records everything created outside the receipt; dropping an uncommitted
/// journal undoes it all.
pub struct InstallJournal<'a> {
    config: &'a Config,
    pkg_dir: PathBuf,
    links: Vec<PathBuf>,
    committed: bool,
}

impl<'a> InstallJournal<'a> {
    /// Start journaling an install into `pkg_dir`
    pub fn new(config: &'a Config, pkg_dir: &Path) -> Self {
        Self {
            config,
            pkg_dir: pkg_dir.to_path_buf(),
            links: Vec::new(),
            committed: false,
        }
    }

    /// Record an exported link that now exists
    pub fn record_link(&mut self, path: PathBuf) {
        self.links.push(path);
    }

    /// Disarm the journal; the install is committed
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for InstallJournal<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        debug!("Rolling back install of {}", self.pkg_dir.display());
        for link in self.links.iter().rev() {
            if let Err(e) = fs::remove_file(link) {
                warn!("Rollback: failed to unlink {}: {}", link.display(), e);
            }
        }
        if let Err(e) = guarded_rmtree(self.config, &self.pkg_dir) {
            warn!(
                "Rollback: failed to remove {}: {}",
                self.pkg_dir.display(),
                e
            );
        }
    }
}

/// Remove a directory tree, refusing paths outside the mason data dir
pub fn guarded_rmtree(config: &Config, path: &Path) -> Result<()> {
    if !config.owns(path) {
        return Err(Error::PathTraversal(format!(
            "refusing to remove {} (outside {})",
            path.display(),
            config.data_dir.display()
        )));
    }
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Install a resolved package
///
/// The caller holds the process lock. On success the receipt is on disk
/// and every exported link resolves into the package dir; on error nothing
/// of the attempt remains.
pub fn install(config: &Config, pkg: &Package, client: &HttpClient) -> Result<()> {
    if let Some(message) = &pkg.deprecation {
        return Err(Error::Deprecated {
            name: pkg.name.clone(),
            message: message.clone(),
        });
    }
    if pkg.is_unsupported() {
        return Err(Error::UnsupportedTarget(pkg.name.clone()));
    }

    fs::create_dir_all(&pkg.dir)?;
    let mut journal = InstallJournal::new(config, &pkg.dir);

    run_install_steps(config, pkg, client, &mut journal)?;

    journal.commit();
    Ok(())
}

fn run_install_steps(
    config: &Config,
    pkg: &Package,
    client: &HttpClient,
    journal: &mut InstallJournal,
) -> Result<()> {
    let ws = Workspace::new(&pkg.dir);
    installers::run_installer(&ws, pkg, client)?;

    if let Some(build) = &pkg.build {
        println!("Building '{}'...", pkg.name);
        for cmd in &build.cmds {
            println!("Running '{cmd}'");
            ws.run_shell(cmd, &build.env)?;
        }
    }

    let links = link::link_package(config, pkg, journal)?;
    Receipt::new(&pkg.name, &pkg.source_id, links).write(&pkg.dir)?;
    Ok(())
}

/// Uninstall by receipt
///
/// Removes exactly the recorded link destinations, then the package dir.
pub fn uninstall(config: &Config, name: &str) -> Result<()> {
    let pkg_dir = config.package_dir(name);
    if !Receipt::exists(&pkg_dir) {
        return Err(Error::NotInstalled(name.to_string()));
    }
    let receipt = Receipt::read(&pkg_dir)?;

    for (dir, links) in [
        (&config.bin_dir, &receipt.links.bin),
        (&config.share_dir, &receipt.links.share),
        (&config.opt_dir, &receipt.links.opt),
    ] {
        for dest in links.keys() {
            let path = dir.join(dest);
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!("Link {} was already gone", path.display());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    guarded_rmtree(config, &pkg_dir)
}
