// src/lib.rs

//! Mason - cross-ecosystem developer-tool installer
//!
//! Mason turns a symbolic package name (an LSP server, linter, formatter,
//! or debug adapter) into a self-contained per-package directory plus
//! user-visible shims on PATH.
//!
//! # Architecture
//!
//! - Registry recipes are fetched, checksum-verified, and cached; a local
//!   YAML directory backend serves development setups
//! - Recipes resolve against the host platform and expand their template
//!   placeholders before anything touches the filesystem
//! - One installer per upstream ecosystem (cargo, npm, pypi, github, ...)
//!   fetches the tool into its package directory
//! - The linker wires binaries into stable `bin/` targets, generating
//!   wrapper scripts for interpreted and JVM tools
//! - A receipt is the commit point; failed installs roll back to nothing

pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
mod error;
pub mod http;
pub mod installers;
pub mod lifecycle;
pub mod link;
pub mod lock;
pub mod package;
pub mod platform;
pub mod progress;
pub mod purl;
pub mod receipt;
pub mod registry;
pub mod resolver;

pub use config::{Config, RegistrySource};
pub use context::{Context, SearchQuery};
pub use error::{Error, Result};
pub use package::{Build, Files, Package};
pub use purl::Purl;
pub use receipt::{Links, Receipt};
