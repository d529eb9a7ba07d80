// src/package.rs

//! The resolved package model
//!
//! A [`Package`] is a registry recipe after platform variant selection and
//! template expansion: every string is concrete, exactly zero or one
//! asset/download/build variant remains, and the files/bin/share/opt
//! fields are normalized into typed shapes the installers and linker
//! consume directly.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::purl::Purl;
use crate::resolver::{self, VariantSelection};

/// Artifact list for the selected variant
///
/// github/openvsx recipes carry a list of asset names; generic recipes map
/// destination filenames to download URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Files {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

/// Post-install build step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Build {
    /// Shell commands, one per line of the recipe's `run` string
    pub cmds: Vec<String>,
    /// Extra environment for every command
    pub env: BTreeMap<String, String>,
}

/// A platform-resolved, template-expanded package
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub description: String,
    pub homepage: String,
    pub licenses: Vec<String>,
    pub languages: Vec<String>,
    pub categories: Vec<String>,
    /// Deprecation message when the recipe is retired
    pub deprecation: Option<String>,
    /// The upstream source identifier
    pub purl: Purl,
    /// Raw PURL string as it appeared in the recipe (kept for the receipt)
    pub source_id: String,
    /// Companion packages some ecosystems install alongside (npm, pypi)
    pub extra_packages: Vec<String>,
    /// Artifacts of the selected variant, if any
    pub files: Option<Files>,
    /// Post-install build step, if any
    pub build: Option<Build>,
    /// Executable name -> bin specifier
    pub bin: BTreeMap<String, String>,
    /// share/ dest -> in-package path
    pub share: BTreeMap<String, String>,
    /// opt/ dest -> in-package path
    pub opt: BTreeMap<String, String>,
    /// Package root (not created until install)
    pub dir: PathBuf,
    /// True when variant arrays existed but none matched the host
    unsupported: bool,
}

impl Package {
    /// Resolve a raw registry recipe into a concrete package
    pub fn resolve(recipe: &Value, config: &Config) -> Result<Self> {
        let name = str_field(recipe, "name")?;
        let source_id = recipe
            .get("source")
            .and_then(|s| s.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidRecipe(format!("'{name}' has no source.id")))?
            .to_string();
        let purl = Purl::parse(&source_id);

        let mut tree = recipe.clone();
        let selection = resolver::select_variants(&mut tree);
        let tree = resolver::expand_templates(&tree, &purl.version)?;
        let source = tree.get("source").cloned().unwrap_or(Value::Null);

        Ok(Package {
            description: str_field(&tree, "description")
                .map(|d| d.replace('\n', " ").trim().to_string())
                .unwrap_or_default(),
            homepage: str_field(&tree, "homepage").unwrap_or_default(),
            licenses: str_list(&tree, "licenses"),
            languages: str_list(&tree, "languages"),
            categories: str_list(&tree, "categories"),
            deprecation: tree
                .get("deprecation")
                .and_then(|d| d.get("message"))
                .and_then(Value::as_str)
                .map(String::from),
            extra_packages: source
                .get("extra_packages")
                .map(|v| value_str_list(v))
                .unwrap_or_default(),
            files: extract_files(&source),
            build: extract_build(&source),
            bin: str_map(&tree, "bin"),
            share: str_map(&tree, "share"),
            opt: str_map(&tree, "opt"),
            dir: config.package_dir(&name),
            unsupported: selection == VariantSelection::Unsupported,
            purl,
            source_id,
            name,
        })
    }

    /// True when no asset/download/build variant matched the host platform
    ///
    /// Installation must refuse such packages before touching the
    /// filesystem.
    pub fn is_unsupported(&self) -> bool {
        self.unsupported
    }
}

fn str_field(value: &Value, key: &str) -> Result<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| Error::InvalidRecipe(format!("missing '{key}' field")))
}

fn str_list(value: &Value, key: &str) -> Vec<String> {
    value.get(key).map(value_str_list).unwrap_or_default()
}

fn value_str_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn str_map(value: &Value, key: &str) -> BTreeMap<String, String> {
    value
        .get(key)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Pull the artifact list out of the selected variant
///
/// Priority: `source.asset.file`, then `source.download.files` or
/// `source.download.file`.
fn extract_files(source: &Value) -> Option<Files> {
    let asset = source.get("asset").filter(|v| !v.is_null());
    if let Some(asset) = asset {
        return match asset.get("file") {
            Some(Value::String(s)) => Some(Files::List(vec![s.clone()])),
            Some(list @ Value::Array(_)) => Some(Files::List(value_str_list(list))),
            _ => None,
        };
    }

    let download = source.get("download").filter(|v| !v.is_null())?;
    match download.get("files") {
        Some(Value::Object(map)) => Some(Files::Map(
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
        )),
        Some(list @ Value::Array(_)) => Some(Files::List(value_str_list(list))),
        _ => match download.get("file") {
            Some(Value::String(s)) => Some(Files::List(vec![s.clone()])),
            _ => None,
        },
    }
}

fn extract_build(source: &Value) -> Option<Build> {
    let build = source.get("build").filter(|v| !v.is_null())?;
    let run = build.get("run").and_then(Value::as_str)?;
    let env = build
        .get("env")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(k, v)| {
                    let value = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default();

    Some(Build {
        cmds: run
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect(),
        env,
    })
}
