// src/context.rs

//! Runtime context: registries, recipes, and installed state
//!
//! The context owns the configuration, the loaded registries, the merged
//! name -> recipe map, and the receipts of installed packages. Commands
//! operate exclusively through it.
//!
//! When several registries define the same package name, the first
//! configured registry wins; later occurrences are ignored.

use std::collections::BTreeMap;
use std::fs;

use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::package::Package;
use crate::receipt::Receipt;
use crate::registry::Registry;

/// Search filter for `mason search`
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Substring matched against name and description
    pub query: String,
    /// Case-insensitive category membership (dap, formatter, linter, lsp)
    pub category: Option<String>,
    /// Case-insensitive language membership
    pub language: Option<String>,
}

/// Loaded registries plus installed-package state
pub struct Context {
    pub config: Config,
    pub client: HttpClient,
    registries: Vec<Registry>,
    /// name -> raw recipe, first configured registry wins
    recipes: BTreeMap<String, Value>,
    /// name -> receipt for every installed package
    receipts: BTreeMap<String, Receipt>,
}

impl Context {
    /// Load registries and scan installed receipts
    pub fn new(config: Config) -> Result<Self> {
        let client = HttpClient::new()?;
        config.ensure_dirs()?;

        let mut registries = Vec::new();
        for source in &config.registries {
            registries.push(Registry::load(&config, source.clone(), &client)?);
        }

        let mut ctx = Context {
            config,
            client,
            registries,
            recipes: BTreeMap::new(),
            receipts: BTreeMap::new(),
        };
        ctx.rebuild_recipe_index();
        ctx.scan_receipts()?;
        Ok(ctx)
    }

    /// Union the registries' recipe lists, first occurrence winning
    fn rebuild_recipe_index(&mut self) {
        self.recipes.clear();
        for registry in &self.registries {
            for recipe in &registry.packages {
                let Some(name) = recipe.get("name").and_then(Value::as_str) else {
                    continue;
                };
                self.recipes
                    .entry(name.to_string())
                    .or_insert_with(|| recipe.clone());
            }
        }
        debug!("Indexed {} recipes", self.recipes.len());
    }

    /// Scan `packages/*/mason-receipt.json`
    fn scan_receipts(&mut self) -> Result<()> {
        self.receipts.clear();
        for entry in fs::read_dir(&self.config.packages_dir)? {
            let dir = entry?.path();
            if Receipt::exists(&dir) {
                let receipt = Receipt::read(&dir)?;
                self.receipts.insert(receipt.name.clone(), receipt);
            }
        }
        Ok(())
    }

    /// The raw recipe for a package name
    pub fn recipe(&self, name: &str) -> Option<&Value> {
        self.recipes.get(name)
    }

    /// Resolve a package by name
    pub fn package(&self, name: &str) -> Result<Package> {
        let recipe = self
            .recipes
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        Package::resolve(recipe, &self.config)
    }

    /// Receipt of an installed package
    pub fn receipt(&self, name: &str) -> Option<&Receipt> {
        self.receipts.get(name)
    }

    /// Names of installed packages, sorted
    pub fn installed(&self) -> Vec<&str> {
        self.receipts.keys().map(String::as_str).collect()
    }

    /// Refresh every configured registry, then re-index
    pub fn update_registries(&mut self) -> Result<()> {
        for registry in &mut self.registries {
            registry.update(&self.client)?;
        }
        self.rebuild_recipe_index();
        Ok(())
    }

    /// Recipes matching a search query, resolved for display
    ///
    /// Recipes that fail to resolve (for example referencing a platform
    /// with no matching variant) still resolve structurally; resolution
    /// errors here mean a malformed recipe and are skipped.
    pub fn search(&self, query: &SearchQuery) -> Vec<Package> {
        self.recipes
            .values()
            .filter(|recipe| recipe_matches(recipe, query))
            .filter_map(|recipe| Package::resolve(recipe, &self.config).ok())
            .collect()
    }
}

fn recipe_matches(recipe: &Value, query: &SearchQuery) -> bool {
    if let Some(category) = &query.category {
        if !list_contains_ci(recipe.get("categories"), category) {
            return false;
        }
    }
    if let Some(language) = &query.language {
        if !list_contains_ci(recipe.get("languages"), language) {
            return false;
        }
    }
    if query.query.is_empty() {
        return true;
    }
    let name = recipe.get("name").and_then(Value::as_str).unwrap_or_default();
    let description = recipe
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    name.contains(&query.query) || description.contains(&query.query)
}

fn list_contains_ci(list: Option<&Value>, needle: &str) -> bool {
    list.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .any(|item| item.eq_ignore_ascii_case(needle))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recipe_matches_query() {
        let recipe = json!({
            "name": "rust-analyzer",
            "description": "LSP server for Rust",
            "categories": ["LSP"],
            "languages": ["Rust"]
        });

        let query = SearchQuery { query: "analyzer".into(), ..Default::default() };
        assert!(recipe_matches(&recipe, &query));

        let query = SearchQuery { query: "server for Rust".into(), ..Default::default() };
        assert!(recipe_matches(&recipe, &query));

        let query = SearchQuery { query: "zig".into(), ..Default::default() };
        assert!(!recipe_matches(&recipe, &query));
    }

    #[test]
    fn test_recipe_matches_category_case_insensitive() {
        let recipe = json!({
            "name": "x",
            "description": "",
            "categories": ["LSP"],
            "languages": []
        });

        let query = SearchQuery { category: Some("lsp".into()), ..Default::default() };
        assert!(recipe_matches(&recipe, &query));

        let query = SearchQuery { category: Some("formatter".into()), ..Default::default() };
        assert!(!recipe_matches(&recipe, &query));
    }

    #[test]
    fn test_recipe_matches_language() {
        let recipe = json!({
            "name": "x",
            "description": "",
            "categories": [],
            "languages": ["Python"]
        });

        let query = SearchQuery { language: Some("python".into()), ..Default::default() };
        assert!(recipe_matches(&recipe, &query));

        let query = SearchQuery { language: Some("ruby".into()), ..Default::default() };
        assert!(!recipe_matches(&recipe, &query));
    }

    #[test]
    fn test_missing_fields_do_not_match_filters() {
        let recipe = json!({"name": "bare", "description": ""});
        let query = SearchQuery { category: Some("lsp".into()), ..Default::default() };
        assert!(!recipe_matches(&recipe, &query));
    }
}
