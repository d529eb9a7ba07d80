// src/resolver.rs

//! Recipe resolution: platform variant selection and template expansion
//!
//! Registry recipes are JSON trees whose string fields may contain template
//! placeholders. Resolution happens in two stages:
//!
//! 1. Each of `source.asset`, `source.download`, `source.build` that is an
//!    array is replaced by its first element whose `target` matches the
//!    host platform (or by null when none does).
//! 2. The tree is serialized and rendered through a template engine until
//!    the text stops changing, then re-parsed. The engine exposes the
//!    recipe itself as the context plus a `version` global, the filters
//!    `strip_prefix` and `take_if_not`, and the `is_platform` global.
//!
//! The registry predates the current engine and carries two legacy
//! spellings which are normalised before rendering: `a || b` means
//! "a, else b" and becomes the engine's `or` operator, and filter
//! arguments may be written without parentheses (`strip_prefix "v"`).

use std::sync::OnceLock;

use minijinja::value::Value as TemplateValue;
use minijinja::Environment;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::platform::{self, Targets};

/// Upper bound on render passes for pathological self-referencing recipes
const MAX_RENDER_PASSES: usize = 10;

/// The variant-bearing keys under `source`
const VARIANT_KEYS: [&str; 3] = ["asset", "download", "build"];

/// Outcome of platform variant selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantSelection {
    /// No variant arrays present; recipe is platform-independent
    NotApplicable,
    /// At least one variant array matched the host
    Matched,
    /// Variant arrays exist but none matches the host
    Unsupported,
}

/// Replace each variant array under `source` with its first matching element
///
/// Returns how selection went so the caller can refuse unsupported
/// packages before touching the filesystem.
pub fn select_variants(recipe: &mut Value) -> VariantSelection {
    let Some(source) = recipe.get_mut("source").and_then(Value::as_object_mut) else {
        return VariantSelection::NotApplicable;
    };

    let mut saw_array = false;
    let mut matched = false;

    for key in VARIANT_KEYS {
        let Some(value) = source.get(key) else { continue };
        if !value.is_array() {
            // A bare object variant applies unconditionally
            continue;
        }
        saw_array = true;
        let selected = value
            .as_array()
            .into_iter()
            .flatten()
            .find(|variant| {
                variant
                    .get("target")
                    .map(|t| platform::is_platform(&Targets::from(t)))
                    .unwrap_or(false)
            })
            .cloned();
        if selected.is_some() {
            matched = true;
        }
        source.insert(key.to_string(), selected.unwrap_or(Value::Null));
    }

    if !saw_array {
        VariantSelection::NotApplicable
    } else if matched {
        VariantSelection::Matched
    } else {
        VariantSelection::Unsupported
    }
}

/// Expand all template placeholders in the recipe to a fixed point
///
/// The recipe itself is the template context, so fields can reference other
/// fields (`{{ source.asset.file }}`) that themselves contain templates;
/// rendering loops until the serialized text is stable.
pub fn expand_templates(recipe: &Value, version: &str) -> Result<Value> {
    let env = template_env();

    let mut context = recipe.clone();
    if let Some(object) = context.as_object_mut() {
        object.insert("version".to_string(), Value::String(version.to_string()));
    }

    let mut text = serde_json::to_string(&context)?;
    for pass in 0..MAX_RENDER_PASSES {
        let normalized = normalize_legacy_syntax(&text);
        // Context comes from the current (pre-normalization) text so later
        // passes see already-expanded fields; fall back to the original
        // tree if a rendered value broke the JSON.
        let ctx: Value = serde_json::from_str(&text).unwrap_or_else(|_| context.clone());
        let rendered = env
            .render_str(&normalized, TemplateValue::from_serialize(&ctx))
            .map_err(|e| Error::TemplateError(format!("{e:#}")))?;
        trace!("Render pass {pass}: {} -> {} bytes", text.len(), rendered.len());
        if rendered == text {
            break;
        }
        text = rendered;
    }

    Ok(serde_json::from_str(&text)?)
}

/// Normalise the registry's legacy template spellings
///
/// - `a || b` becomes `a or b` (alternation: left if truthy, else right);
///   single `|` is untouched and keeps meaning filter piping.
/// - `strip_prefix "x"` gains parentheses.
/// - String literals inside placeholders lose the backslash escaping they
///   pick up from JSON serialization; the engine's lexer requires bare
///   quotes, and the placeholder is gone from the text after rendering.
fn normalize_legacy_syntax(text: &str) -> String {
    static ALTERNATION: OnceLock<Regex> = OnceLock::new();
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    static STRIP_PREFIX: OnceLock<Regex> = OnceLock::new();

    let alternation = ALTERNATION.get_or_init(|| Regex::new(r"\|\|").expect("static regex"));
    let placeholder =
        PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{.*?\}\}").expect("static regex"));
    let strip_prefix = STRIP_PREFIX
        .get_or_init(|| Regex::new(r#"strip_prefix\s*\\?"(.*?)\\?""#).expect("static regex"));

    let text = alternation.replace_all(text, " or ");
    let text = placeholder.replace_all(&text, |caps: &regex::Captures<'_>| {
        caps[0].replace("\\\"", "\"")
    });
    strip_prefix.replace_all(&text, r#"strip_prefix("$1")"#).into_owned()
}

/// The shared template environment with mason's filter set
fn template_env() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();

        env.add_filter("strip_prefix", |value: String, prefix: String| {
            value
                .strip_prefix(&prefix)
                .map(String::from)
                .unwrap_or(value)
        });

        // Identity when the condition is falsy; drops the value (renders as
        // the empty string) otherwise.
        env.add_filter("take_if_not", |value: TemplateValue, cond: TemplateValue| {
            if cond.is_true() {
                TemplateValue::UNDEFINED
            } else {
                value
            }
        });

        env.add_function("is_platform", |target: TemplateValue| {
            platform::is_platform(&targets_from_template(&target))
        });

        env
    })
}

fn targets_from_template(value: &TemplateValue) -> Targets {
    match value.as_str() {
        Some(s) => Targets::One(s.to_string()),
        None => match value.try_iter() {
            Ok(iter) => Targets::Many(
                iter.map(|v| v.as_str().unwrap_or_default().to_string())
                    .collect(),
            ),
            Err(_) => Targets::One(String::new()),
        },
    }
}
