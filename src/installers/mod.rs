// src/installers/mod.rs

//! Installer dispatch
//!
//! One handler per PURL type. Each handler runs upstream ecosystem tools
//! inside the package directory via a [`Workspace`]: the working directory
//! and environment travel with the value instead of mutating process
//! globals, so a failed install never leaves the process chdir'd into a
//! half-removed directory.
//!
//! Subprocesses inherit stdio so the user sees upstream output in real
//! time; exit codes are checked and any non-zero status aborts the install.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::package::Package;

mod cargo;
mod composer;
mod gem;
mod generic;
mod github;
mod golang;
mod luarocks;
mod npm;
mod nuget;
mod opam;
mod openvsx;
mod pypi;

/// Working directory and environment for installer subprocesses
#[derive(Debug, Clone)]
pub struct Workspace {
    /// The package directory; every subprocess runs here
    pub dir: PathBuf,
    /// Environment overlayed on the process environment
    pub env: BTreeMap<String, String>,
}

impl Workspace {
    /// Create a workspace rooted at the package directory
    pub fn new(dir: &Path) -> Self {
        let mut env = BTreeMap::new();
        env.insert("PWD".to_string(), dir.to_string_lossy().into_owned());
        Self {
            dir: dir.to_path_buf(),
            env,
        }
    }

    /// Run a tool with arguments, checking the exit status
    pub fn run<I, S>(&self, program: &str, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.run_with_env(program, args, &BTreeMap::new())
    }

    /// Run a tool with arguments and extra environment variables
    pub fn run_with_env<I, S>(
        &self,
        program: &str,
        args: I,
        extra_env: &BTreeMap<String, String>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Resolve the tool up front so a missing ecosystem surfaces as a
        // clear error instead of a raw spawn failure. This also picks up
        // .cmd/.bat shims on Windows.
        let resolved =
            which::which(program).map_err(|_| Error::ToolNotFound(program.to_string()))?;

        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let command_display = format!("{} {}", program, args.join(" "));
        debug!("Running: {command_display} (in {})", self.dir.display());

        let status = Command::new(resolved)
            .args(&args)
            .current_dir(&self.dir)
            .envs(&self.env)
            .envs(extra_env)
            .status()?;

        if !status.success() {
            return Err(Error::SubprocessFailed {
                command: command_display,
                status: status.to_string(),
            });
        }
        Ok(())
    }

    /// Run one build line through the system shell
    pub fn run_shell(&self, line: &str, extra_env: &BTreeMap<String, String>) -> Result<()> {
        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        debug!("Running (shell): {line}");

        let status = Command::new(shell)
            .arg(flag)
            .arg(line)
            .current_dir(&self.dir)
            .envs(&self.env)
            .envs(extra_env)
            .status()?;

        if !status.success() {
            return Err(Error::SubprocessFailed {
                command: line.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    /// Workspace directory as a string for env values and `--tree`-style args
    pub fn dir_str(&self) -> String {
        self.dir.to_string_lossy().into_owned()
    }
}

/// Dispatch to the handler for the package's PURL type
pub fn run_installer(ws: &Workspace, pkg: &Package, client: &HttpClient) -> Result<()> {
    match pkg.purl.r#type.as_str() {
        "cargo" => cargo::install(ws, pkg),
        "composer" => composer::install(ws, pkg),
        "gem" => gem::install(ws, pkg),
        "generic" => generic::install(ws, pkg, client),
        "github" => github::install(ws, pkg, client),
        "golang" => golang::install(ws, pkg),
        "luarocks" => luarocks::install(ws, pkg),
        "npm" => npm::install(ws, pkg),
        "nuget" => nuget::install(ws, pkg),
        "opam" => opam::install(ws, pkg),
        "openvsx" => openvsx::install(ws, pkg, client),
        "pypi" => pypi::install(ws, pkg),
        other => Err(Error::UnsupportedInstaller(other.to_string())),
    }
}
