// src/purl.rs

//! Package-URL parsing
//!
//! Every recipe names its upstream source with a PURL:
//! `pkg:<type>/<namespace>/<name>@<version>?<qualifiers>#<subpath>`
//!
//! Examples:
//! - `pkg:cargo/ripgrep@13.0.0?features=pcre2&locked=true`
//! - `pkg:github/rust-lang/rust-analyzer@2024-01-01`
//! - `pkg:golang/golang.org/x/tools@v0.1.0#cmd/gopls`
//!
//! The parser is total: a bare name parses, and every missing component is
//! an empty string or empty map. Components are percent-decoded; qualifier
//! keys are lowercased and the `checksums` qualifier splits on `,`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use percent_encoding::percent_decode_str;

/// A qualifier value: a plain string, or a list for `checksums`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifierValue {
    One(String),
    Many(Vec<String>),
}

impl QualifierValue {
    /// The scalar form; list values rejoin on `,`
    pub fn as_str(&self) -> String {
        match self {
            QualifierValue::One(v) => v.clone(),
            QualifierValue::Many(vs) => vs.join(","),
        }
    }
}

/// A parsed Package-URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Purl {
    /// URL scheme, normally `pkg`
    pub scheme: String,
    /// Ecosystem tag (cargo, npm, github, ...)
    pub r#type: String,
    /// Optional `/`-joined path segments before the name
    pub namespace: String,
    /// Package name
    pub name: String,
    /// Version (empty when unpinned)
    pub version: String,
    /// Unordered qualifier map, keys lowercased
    pub qualifiers: BTreeMap<String, QualifierValue>,
    /// Cleaned subpath (no empty, `.`, or `..` segments)
    pub subpath: String,
}

impl Purl {
    /// Parse a PURL string
    ///
    /// Strips the subpath and qualifiers off the right, the scheme and type
    /// off the left, then the version and name off the right of what
    /// remains; anything still left is the namespace.
    pub fn parse(purl: &str) -> Self {
        let mut out = Purl::default();
        let mut rest = purl;

        if let Some((head, subpath)) = rest.rsplit_once('#') {
            rest = head;
            out.subpath = subpath
                .trim_matches('/')
                .split('/')
                .filter(|p| !matches!(*p, "" | "." | ".."))
                .map(decode)
                .collect::<Vec<_>>()
                .join("/");
        }

        if let Some((head, qualifiers)) = rest.rsplit_once('?') {
            rest = head;
            for pair in qualifiers.split('&') {
                let Some((k, v)) = pair.split_once('=') else { continue };
                if v.is_empty() {
                    continue;
                }
                let key = k.to_lowercase();
                let value = if key == "checksums" {
                    QualifierValue::Many(decode(v).split(',').map(String::from).collect())
                } else {
                    QualifierValue::One(decode(v))
                };
                out.qualifiers.insert(key, value);
            }
        }

        if let Some((scheme, tail)) = rest.split_once(':') {
            out.scheme = scheme.to_lowercase();
            rest = tail;
        }

        rest = rest.trim_matches('/');
        if let Some((r#type, tail)) = rest.split_once('/') {
            out.r#type = r#type.to_lowercase();
            rest = tail;
        }

        if let Some((head, version)) = rest.rsplit_once('@') {
            out.version = decode(version);
            rest = head;
        }

        if let Some((namespace, name)) = rest.rsplit_once('/') {
            out.name = decode(name);
            out.namespace = namespace
                .split('/')
                .filter(|p| !p.is_empty())
                .map(decode)
                .collect::<Vec<_>>()
                .join("/");
        } else {
            out.name = decode(rest);
        }

        out
    }

    /// Qualifier value by key, scalar form
    pub fn qualifier(&self, key: &str) -> Option<String> {
        self.qualifiers.get(key).map(QualifierValue::as_str)
    }

    /// True when the qualifier is the literal string "true"
    pub fn qualifier_flag(&self, key: &str) -> bool {
        self.qualifier(key).as_deref() == Some("true")
    }
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

impl fmt::Display for Purl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }
        if !self.r#type.is_empty() {
            write!(f, "{}/", self.r#type)?;
        }
        if !self.namespace.is_empty() {
            write!(f, "{}/", self.namespace)?;
        }
        write!(f, "{}", self.name)?;
        if !self.version.is_empty() {
            write!(f, "@{}", self.version)?;
        }
        if !self.qualifiers.is_empty() {
            let pairs: Vec<String> = self
                .qualifiers
                .iter()
                .map(|(k, v)| format!("{}={}", k, v.as_str()))
                .collect();
            write!(f, "?{}", pairs.join("&"))?;
        }
        if !self.subpath.is_empty() {
            write!(f, "#{}", self.subpath)?;
        }
        Ok(())
    }
}

impl FromStr for Purl {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Purl::parse(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let purl = Purl::parse("pkg:cargo/ripgrep@13.0.0?features=pcre2,simd&locked=true");
        assert_eq!(purl.scheme, "pkg");
        assert_eq!(purl.r#type, "cargo");
        assert_eq!(purl.namespace, "");
        assert_eq!(purl.name, "ripgrep");
        assert_eq!(purl.version, "13.0.0");
        assert_eq!(purl.qualifier("features").as_deref(), Some("pcre2,simd"));
        assert_eq!(purl.qualifier("locked").as_deref(), Some("true"));
        assert!(purl.qualifier_flag("locked"));
        assert_eq!(purl.subpath, "");
    }

    #[test]
    fn test_parse_namespace_and_subpath() {
        let purl = Purl::parse("pkg:golang/golang.org/x/tools@v0.1.0#cmd/gopls");
        assert_eq!(purl.r#type, "golang");
        assert_eq!(purl.namespace, "golang.org/x");
        assert_eq!(purl.name, "tools");
        assert_eq!(purl.version, "v0.1.0");
        assert_eq!(purl.subpath, "cmd/gopls");
    }

    #[test]
    fn test_parse_minimal() {
        let purl = Purl::parse("foo");
        assert_eq!(purl.scheme, "");
        assert_eq!(purl.r#type, "");
        assert_eq!(purl.name, "foo");
        assert_eq!(purl.version, "");
        assert!(purl.qualifiers.is_empty());
    }

    #[test]
    fn test_subpath_is_cleaned() {
        let purl = Purl::parse("pkg:generic/tool@1.0#/a/./..//b/");
        assert_eq!(purl.subpath, "a/b");
    }

    #[test]
    fn test_percent_decoding() {
        let purl = Purl::parse("pkg:npm/%40scope/pkg@1.0.0?note=hello%20world");
        assert_eq!(purl.namespace, "@scope");
        assert_eq!(purl.qualifier("note").as_deref(), Some("hello world"));
    }

    #[test]
    fn test_checksums_qualifier_splits() {
        let purl = Purl::parse("pkg:generic/t@1?checksums=sha256:aa,sha256:bb");
        assert_eq!(
            purl.qualifiers.get("checksums"),
            Some(&QualifierValue::Many(vec![
                "sha256:aa".into(),
                "sha256:bb".into()
            ]))
        );
    }

    #[test]
    fn test_empty_qualifier_values_dropped() {
        let purl = Purl::parse("pkg:cargo/x@1?empty=&kept=v");
        assert!(purl.qualifier("empty").is_none());
        assert_eq!(purl.qualifier("kept").as_deref(), Some("v"));
    }

    #[test]
    fn test_qualifier_keys_lowercased() {
        let purl = Purl::parse("pkg:cargo/x@1?Locked=true");
        assert!(purl.qualifier_flag("locked"));
    }

    #[test]
    fn test_parse_format_roundtrip() {
        for input in [
            "pkg:cargo/ripgrep@13.0.0?features=pcre2,simd&locked=true",
            "pkg:golang/golang.org/x/tools@v0.1.0#cmd/gopls",
            "pkg:npm/prettier@3.0.0",
            "pkg:github/rust-lang/rust-analyzer@2024-01-01",
            "name-only",
        ] {
            let first = Purl::parse(input);
            let second = Purl::parse(&first.to_string());
            assert_eq!(first, second, "roundtrip failed for {input}");
        }
    }
}
