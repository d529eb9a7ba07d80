// src/platform.rs

//! Platform probe
//!
//! Recipes tag their variants with target strings such as `linux_x64_gnu`,
//! `darwin_arm64`, `win_x64` or the family tags `unix`/`win`. This module
//! computes the set of tags matching the current host once per process and
//! answers membership queries for variant selection and the `is_platform`
//! template global.

use std::process::Command;
use std::sync::OnceLock;

use tracing::debug;

/// A recipe `target` field: a single tag or a list of tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    One(String),
    Many(Vec<String>),
}

impl Targets {
    fn iter(&self) -> impl Iterator<Item = &str> {
        let slice = match self {
            Targets::One(t) => std::slice::from_ref(t),
            Targets::Many(ts) => ts.as_slice(),
        };
        slice.iter().map(String::as_str)
    }
}

impl From<&serde_json::Value> for Targets {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(items) => Targets::Many(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
            ),
            other => Targets::One(other.as_str().unwrap_or_default().to_string()),
        }
    }
}

/// True iff any of the requested target tags matches the current host
pub fn is_platform(targets: &Targets) -> bool {
    let tags = host_tags();
    targets.iter().any(|t| tags.iter().any(|tag| tag == t))
}

/// The memoized tag set for the current host
pub fn host_tags() -> &'static [String] {
    static TAGS: OnceLock<Vec<String>> = OnceLock::new();
    TAGS.get_or_init(|| {
        let tags = compute_tags(os_name(), &machine_arch(), probe_libc().as_deref());
        debug!("Platform tags: {:?}", tags);
        tags
    })
}

/// Assemble the tag set from os/arch/libc
///
/// Pure so the selection logic is testable independently of the host.
fn compute_tags(os: &str, arch: &str, libc: Option<&str>) -> Vec<String> {
    let arch = match arch {
        "x86_64" | "amd64" => "x64",
        "i386" | "i686" => "x86",
        "aarch64" | "arm64" => "arm64",
        other => other,
    };
    let mut tags = vec![os.to_string(), format!("{os}_{arch}")];
    let family = if os == "win" { "win" } else { "unix" };
    if family != os {
        tags.push(family.to_string());
    }
    if os == "linux" {
        tags.push(format!("{os}_{arch}_{}", libc.unwrap_or("gnu")));
    }
    tags
}

fn os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win",
        other => {
            // linux, freebsd, ... - recipes only know the three majors, so
            // anything else simply fails to match any variant
            if other == "linux" { "linux" } else { other }
        }
    }
}

/// Machine name as the kernel reports it
///
/// `std::env::consts::ARCH` collapses armv6l/armv7l into "arm", which
/// recipes distinguish, so prefer `uname -m` where available.
fn machine_arch() -> String {
    #[cfg(unix)]
    {
        if let Ok(output) = Command::new("uname").arg("-m").output() {
            let machine = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !machine.is_empty() {
                return machine;
            }
        }
    }
    std::env::consts::ARCH.to_string()
}

/// Infer the host libc by asking the dynamic linker for its version
fn probe_libc() -> Option<String> {
    if std::env::consts::OS != "linux" {
        return None;
    }
    let output = Command::new("ldd").arg("--version").output().ok()?;
    // musl's ldd prints to stderr; glibc prints to stdout
    let text = if output.stdout.is_empty() { &output.stderr } else { &output.stdout };
    let first_line = String::from_utf8_lossy(text);
    let first_line = first_line.lines().next().unwrap_or_default();
    if first_line.contains("musl") {
        Some("musl".to_string())
    } else if first_line.contains("glibc") || first_line.contains("GNU") {
        Some("gnu".to_string())
    } else {
        None
    }
}
