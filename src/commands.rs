// src/commands.rs
//! One handler per mason subcommand
//!
//! The binary acquires the process-wide lock before any mutating command
//! (install, uninstall, update, upgrade) reaches these handlers; list and
//! search are pure reads and run lock-free. Within one invocation packages
//! are processed strictly in argument order: a package is fully committed
//! (receipt on disk) before the next one starts.

use std::io::{self, Write};

use tracing::info;

use crate::context::{Context, SearchQuery};
use crate::error::{Error, Result};
use crate::lifecycle;
use crate::package::Package;

/// `mason install [-u] <pkg>...`
pub fn install(ctx: &mut Context, packages: &[String], update_registries: bool) -> Result<()> {
    if update_registries {
        println!("Updating registries...");
        ctx.update_registries()?;
    }

    for name in packages {
        let pkg = ctx.package(name)?;
        println!("Installing '{name}'...");
        lifecycle::install(&ctx.config, &pkg, &ctx.client)?;
        println!("Installed '{}@{}'", pkg.name, pkg.purl.version);
    }
    Ok(())
}

/// `mason uninstall <pkg>...`
pub fn uninstall(ctx: &Context, packages: &[String]) -> Result<()> {
    for name in packages {
        if ctx.receipt(name).is_none() {
            // Distinguish "never heard of it" from "not installed"
            if ctx.recipe(name).is_none() {
                return Err(Error::NotFound(name.clone()));
            }
            return Err(Error::NotInstalled(name.clone()));
        }
        println!("Uninstalling '{name}'...");
        lifecycle::uninstall(&ctx.config, name)?;
    }
    Ok(())
}

/// `mason update`
pub fn update(ctx: &mut Context) -> Result<()> {
    ctx.update_registries()
}

/// `mason upgrade [<pkg>...]`
pub fn upgrade(ctx: &mut Context, packages: &[String], assume_yes: bool) -> Result<()> {
    let names: Vec<String> = if packages.is_empty() {
        ctx.installed().iter().map(|s| s.to_string()).collect()
    } else {
        packages.to_vec()
    };

    let mut pending: Vec<(Package, String)> = Vec::new();
    for name in &names {
        let pkg = ctx.package(name)?;
        let receipt = ctx
            .receipt(name)
            .ok_or_else(|| Error::NotInstalled(name.clone()))?;
        let installed_version = receipt.version();
        if pkg.purl.version != installed_version {
            pending.push((pkg, installed_version));
        }
    }

    if pending.is_empty() {
        println!("All packages are up to date");
        return Ok(());
    }

    for (pkg, old_version) in &pending {
        println!("{} {} -> {}", pkg.name, old_version, pkg.purl.version);
    }

    if !assume_yes && !confirm("Upgrade? [y/N]: ")? {
        return Ok(());
    }

    for (pkg, _) in &pending {
        info!("Upgrading {}", pkg.name);
        lifecycle::uninstall(&ctx.config, &pkg.name)?;
        lifecycle::install(&ctx.config, pkg, &ctx.client)?;
        println!("Upgraded '{}@{}'", pkg.name, pkg.purl.version);
    }
    Ok(())
}

/// `mason list`
pub fn list(ctx: &Context) -> Result<()> {
    for name in ctx.installed() {
        if let Some(receipt) = ctx.receipt(name) {
            println!("{}@{}", receipt.name, receipt.version());
        }
    }
    Ok(())
}

/// `mason search [-c CATEGORY] [-l LANG] [query]`
pub fn search(
    ctx: &Context,
    query: Option<&str>,
    category: Option<&str>,
    language: Option<&str>,
) -> Result<()> {
    let query = SearchQuery {
        query: query.unwrap_or_default().to_string(),
        category: category.map(String::from),
        language: language.map(String::from),
    };

    for pkg in ctx.search(&query) {
        println!("{} {}", pkg.name, pkg.purl.version);
        if let Some(deprecation) = &pkg.deprecation {
            println!("    Deprecation: {deprecation}");
        }
        println!("    Description: {}", pkg.description);
        println!("    Homepage: {}", pkg.homepage);
        println!("    Categories: {}", pkg.categories.join(", "));
        if !pkg.languages.is_empty() {
            println!("    Languages: {}", pkg.languages.join(", "));
        }
        println!("    Licenses: {}", pkg.licenses.join(", "));
        println!();
    }
    Ok(())
}

/// Ask a yes/no question on stdin
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
