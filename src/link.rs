// src/link.rs

//! Linker and shim writer
//!
//! Wires installed package contents into the exported `bin/`, `share/`,
//! and `opt/` trees. Bin entries either point straight at a file the
//! ecosystem produced (resolved through a per-manager path table) or name
//! an interpreter/runtime, in which case a small wrapper script is
//! generated inside the package directory and linked instead.
//!
//! Every path this module creates is reported to the install journal so a
//! failed install can unlink it again, and returned in the link maps that
//! end up in the receipt.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lifecycle::InstallJournal;
use crate::package::Package;
use crate::receipt::Links;

/// A parsed bin entry value
#[derive(Debug, Clone, PartialEq, Eq)]
enum BinSpec {
    /// Plain path relative to the package dir
    Path(String),
    /// `manager:target` specifier
    Typed { kind: String, target: String },
}

fn parse_bin_spec(spec: &str) -> BinSpec {
    match spec.split_once(':') {
        Some((kind, target)) => BinSpec::Typed {
            kind: kind.to_string(),
            target: target.to_string(),
        },
        None => BinSpec::Path(spec.to_string()),
    }
}

/// Create all bin/share/opt links for a freshly installed package
pub fn link_package(
    config: &Config,
    pkg: &Package,
    journal: &mut InstallJournal,
) -> Result<Links> {
    let mut links = Links::default();

    for (name, spec) in &pkg.bin {
        let source = resolve_bin_source(pkg, name, spec)?;
        #[cfg(unix)]
        make_executable(&source)?;
        let dest = config.bin_dir.join(name);
        create_links(&source, &dest, journal, name, &mut links.bin, &pkg.dir)?;
    }

    for (dest, path) in &pkg.share {
        let source = pkg.dir.join(path);
        let dest_path = config.share_dir.join(dest.trim_end_matches('/'));
        create_links(&source, &dest_path, journal, dest, &mut links.share, &pkg.dir)?;
    }

    for (dest, path) in &pkg.opt {
        let source = pkg.dir.join(path);
        let dest_path = config.opt_dir.join(dest.trim_end_matches('/'));
        create_links(&source, &dest_path, journal, dest, &mut links.opt, &pkg.dir)?;
    }

    Ok(links)
}

/// Compute (and, for wrapper kinds, generate) the in-package bin source
fn resolve_bin_source(pkg: &Package, name: &str, spec: &str) -> Result<PathBuf> {
    let windows = cfg!(windows);
    let relative = |path: String| pkg.dir.join(path);

    match parse_bin_spec(spec) {
        BinSpec::Path(path) => Ok(relative(path)),
        BinSpec::Typed { kind, target } => match kind.as_str() {
            // Paths the ecosystem's own installer produced
            "cargo" => Ok(relative(format!("bin/{target}{}", exe_suffix(windows)))),
            "composer" => Ok(relative(format!("vendor/bin/{target}{}", bat_suffix(windows)))),
            "golang" => Ok(relative(format!("{target}{}", exe_suffix(windows)))),
            "luarocks" => Ok(relative(format!("bin/{target}{}", bat_suffix(windows)))),
            "npm" => Ok(relative(format!("node_modules/.bin/{target}{}", cmd_suffix(windows)))),
            "nuget" => Ok(relative(format!("{target}{}", exe_suffix(windows)))),
            "opam" => Ok(relative(format!("bin/{target}{}", exe_suffix(windows)))),
            "pypi" => Ok(if windows {
                relative(format!("venv/Scripts/{target}.exe"))
            } else {
                relative(format!("venv/bin/{target}"))
            }),

            // Kinds that need a generated wrapper script
            "exec" => write_wrapper(pkg, name, &pkg.dir.join(&target).display().to_string(), None),
            "dotnet" => write_wrapper(
                pkg,
                name,
                &format!("dotnet \"{}\"", pkg.dir.join(&target).display()),
                None,
            ),
            "gem" => {
                let script = pkg.dir.join("bin").join(format!("{target}{}", bat_suffix(windows)));
                let gem_path = if windows {
                    format!("{};%GEM_PATH%", pkg.dir.display())
                } else {
                    format!("{}:$GEM_PATH", pkg.dir.display())
                };
                let env = BTreeMap::from([("GEM_PATH".to_string(), gem_path)]);
                write_wrapper(pkg, name, &script.display().to_string(), Some(env))
            }
            "java-jar" => write_wrapper(
                pkg,
                name,
                &format!("java -jar \"{}\"", pkg.dir.join(&target).display()),
                None,
            ),
            "node" => write_wrapper(
                pkg,
                name,
                &format!("node \"{}\"", pkg.dir.join(&target).display()),
                None,
            ),
            "php" => write_wrapper(
                pkg,
                name,
                &format!("php \"{}\"", pkg.dir.join(&target).display()),
                None,
            ),
            "python" => {
                let python = if windows { "python" } else { "python3" };
                write_wrapper(
                    pkg,
                    name,
                    &format!("{python} \"{}\"", pkg.dir.join(&target).display()),
                    None,
                )
            }
            "pyvenv" => {
                let interpreter = if windows {
                    pkg.dir.join("venv/Scripts/python.exe")
                } else {
                    pkg.dir.join("venv/bin/python")
                };
                write_wrapper(
                    pkg,
                    name,
                    &format!("{} -m {target}", interpreter.display()),
                    None,
                )
            }
            "ruby" => write_wrapper(
                pkg,
                name,
                &format!("ruby \"{}\"", pkg.dir.join(&target).display()),
                None,
            ),

            other => Err(Error::UnsupportedInstaller(format!("bin type '{other}'"))),
        },
    }
}

fn exe_suffix(windows: bool) -> &'static str {
    if windows { ".exe" } else { "" }
}

fn bat_suffix(windows: bool) -> &'static str {
    if windows { ".bat" } else { "" }
}

fn cmd_suffix(windows: bool) -> &'static str {
    if windows { ".cmd" } else { "" }
}

/// Write an exec wrapper script into the package dir and return its path
///
/// POSIX scripts exec the command so signals and exit codes pass through;
/// Windows scripts are plain `.cmd` batch files.
fn write_wrapper(
    pkg: &Package,
    name: &str,
    command: &str,
    env: Option<BTreeMap<String, String>>,
) -> Result<PathBuf> {
    let env = env.unwrap_or_default();
    let path = if cfg!(windows) {
        pkg.dir.join(format!("{name}.cmd"))
    } else {
        pkg.dir.join(name)
    };

    let script = if cfg!(windows) {
        let sets: String = env
            .iter()
            .map(|(k, v)| format!("SET {k}={v}\r\n"))
            .collect();
        format!("@ECHO off\r\n{sets}{command} %*\r\n")
    } else {
        let exports: String = env
            .iter()
            .map(|(k, v)| format!("export {k}={v}\n"))
            .collect();
        format!("#!/usr/bin/env bash\n{exports}exec {command} \"$@\"\n")
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, script)?;
    debug!("Wrote wrapper script {}", path.display());
    Ok(path)
}

/// Symlink `source` (file or directory) at `dest`
///
/// Directory sources are mirrored one symlink per contained file. Existing
/// symlinks at a destination are replaced; anything else there is a
/// [`Error::LinkConflict`]. Each created link is journaled and recorded in
/// the receipt map as dest-key -> package-relative source.
fn create_links(
    source: &Path,
    dest: &Path,
    journal: &mut InstallJournal,
    dest_key: &str,
    map: &mut BTreeMap<String, String>,
    pkg_dir: &Path,
) -> Result<()> {
    if source.is_dir() {
        for entry in WalkDir::new(source).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(source)
                .expect("walkdir yields children of its root");
            let target = dest.join(rel);
            create_one_link(entry.path(), &target, journal)?;
            map.insert(
                format!("{}/{}", dest_key.trim_end_matches('/'), rel.display()),
                relative_to(entry.path(), pkg_dir),
            );
        }
        Ok(())
    } else {
        create_one_link(source, dest, journal)?;
        map.insert(dest_key.to_string(), relative_to(source, pkg_dir));
        Ok(())
    }
}

fn relative_to(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn create_one_link(source: &Path, dest: &Path, journal: &mut InstallJournal) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    if let Ok(metadata) = dest.symlink_metadata() {
        if !metadata.file_type().is_symlink() {
            return Err(Error::LinkConflict(dest.to_path_buf()));
        }
        fs::remove_file(dest)?;
    }

    debug!("Linking {} -> {}", dest.display(), source.display());
    // Record before creating: a failed symlink call must not leave an
    // untracked path behind on retry.
    journal.record_link(dest.to_path_buf());
    symlink(source, dest)?;
    Ok(())
}

#[cfg(unix)]
fn symlink(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(windows)]
fn symlink(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(source, dest)
}

/// OR the execute bits into the source file's mode
#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let metadata = fs::metadata(path)?;
    let mut perms = metadata.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)?;
    Ok(())
}
