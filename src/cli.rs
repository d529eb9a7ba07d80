// src/cli.rs
//! Clap surface for the mason binary
//!
//! Only argument shapes live here; what each subcommand actually does is
//! implemented in `commands`.

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "mason")]
#[command(version)]
#[command(about = "Installer for developer tools: LSP servers, linters, formatters, DAP adapters", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install packages
    Install {
        /// Packages to install
        #[arg(required = true)]
        package: Vec<String>,

        /// Update registries before installing
        #[arg(short = 'u', long)]
        update_registries: bool,
    },

    /// Uninstall packages
    Uninstall {
        /// Packages to uninstall
        #[arg(required = true)]
        package: Vec<String>,
    },

    /// Update registries
    Update,

    /// Upgrade installed packages to their registry versions
    Upgrade {
        /// Packages to upgrade (all installed when omitted)
        package: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List installed packages
    List,

    /// Search the registries
    Search {
        /// Substring matched against package names and descriptions
        query: Option<String>,

        /// Restrict to a category
        #[arg(short, long, value_parser = ["dap", "formatter", "linter", "lsp"])]
        category: Option<String>,

        /// Restrict to a language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
