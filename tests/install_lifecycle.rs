// tests/install_lifecycle.rs

//! End-to-end install lifecycle against a local file registry
//!
//! These tests drive the real pipeline - context construction, recipe
//! resolution, install, link, receipt, uninstall, rollback - using
//! recipes whose "fetch" step is a local build command, so no network or
//! upstream toolchain is needed.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use mason::{lifecycle, Config, Context, Error, RegistrySource};
use tempfile::TempDir;

/// Write a package.yaml into the file registry
fn write_recipe(registry_dir: &Path, name: &str, yaml: &str) {
    let dir = registry_dir.join("packages").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.yaml"), yaml).unwrap();
}

fn test_context(root: &TempDir, registry_dir: PathBuf) -> Context {
    let config = Config::at(
        root.path().join("data"),
        root.path().join("cache"),
        vec![RegistrySource::File { dir: registry_dir }],
    );
    Context::new(config).unwrap()
}

fn hello_recipe() -> &'static str {
    r#"name: hello-tool
description: Greets the caller
homepage: https://example.com/hello
licenses:
  - MIT
languages: []
categories:
  - LSP
source:
  id: pkg:generic/hello-tool@1.0.0
  build:
    run: |
      printf '#!/bin/sh\necho hello from %s\n' "$GREETER" > hello.sh
    env:
      GREETER: mason
bin:
  hello: hello.sh
"#
}

#[test]
fn test_install_writes_receipt_and_links() {
    let root = TempDir::new().unwrap();
    let registry = root.path().join("registry");
    write_recipe(&registry, "hello-tool", hello_recipe());

    let ctx = test_context(&root, registry);
    let pkg = ctx.package("hello-tool").unwrap();
    lifecycle::install(&ctx.config, &pkg, &ctx.client).unwrap();

    // Receipt is on disk and names the original PURL
    let receipt = mason::Receipt::read(&pkg.dir).unwrap();
    assert_eq!(receipt.name, "hello-tool");
    assert_eq!(receipt.primary_source.id, "pkg:generic/hello-tool@1.0.0");
    assert_eq!(receipt.version(), "1.0.0");

    // The exported bin entry is a symlink resolving into the package dir
    let link = ctx.config.bin_dir.join("hello");
    assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
    let target = fs::read_link(&link).unwrap();
    assert!(target.starts_with(&pkg.dir));

    // Source was made executable before linking
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(&target).unwrap().permissions().mode();
    assert_eq!(mode & 0o111, 0o111);
}

#[test]
fn test_reinstall_produces_identical_receipt() {
    let root = TempDir::new().unwrap();
    let registry = root.path().join("registry");
    write_recipe(&registry, "hello-tool", hello_recipe());

    let ctx = test_context(&root, registry);
    let pkg = ctx.package("hello-tool").unwrap();

    lifecycle::install(&ctx.config, &pkg, &ctx.client).unwrap();
    let first = fs::read(pkg.dir.join("mason-receipt.json")).unwrap();

    lifecycle::uninstall(&ctx.config, "hello-tool").unwrap();
    assert!(!pkg.dir.exists());
    assert!(ctx.config.bin_dir.join("hello").symlink_metadata().is_err());

    lifecycle::install(&ctx.config, &pkg, &ctx.client).unwrap();
    let second = fs::read(pkg.dir.join("mason-receipt.json")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_failed_build_rolls_back_completely() {
    let root = TempDir::new().unwrap();
    let registry = root.path().join("registry");
    write_recipe(
        &registry,
        "broken-tool",
        r#"name: broken-tool
description: Always fails to build
homepage: https://example.com
licenses: []
languages: []
categories: []
source:
  id: pkg:generic/broken-tool@0.1.0
  build:
    run: |
      touch partial-artifact
      exit 1
bin:
  broken: broken.sh
"#,
    );

    let ctx = test_context(&root, registry);
    let pkg = ctx.package("broken-tool").unwrap();
    let err = lifecycle::install(&ctx.config, &pkg, &ctx.client).unwrap_err();
    assert!(matches!(err, Error::SubprocessFailed { .. }));

    // No package dir, no receipt, no dangling links
    assert!(!pkg.dir.exists());
    assert!(ctx.config.bin_dir.join("broken").symlink_metadata().is_err());
}

#[test]
fn test_failed_link_rolls_back_created_links() {
    let root = TempDir::new().unwrap();
    let registry = root.path().join("registry");
    // Two bin entries; the second points at a file the build never creates
    write_recipe(
        &registry,
        "half-linked",
        r#"name: half-linked
description: Second bin entry is broken
homepage: https://example.com
licenses: []
languages: []
categories: []
source:
  id: pkg:generic/half-linked@1.0.0
  build:
    run: |
      printf '#!/bin/sh\n' > a.sh
bin:
  aaa-first: a.sh
  zzz-missing: never-created.sh
"#,
    );

    let ctx = test_context(&root, registry);
    let pkg = ctx.package("half-linked").unwrap();
    assert!(lifecycle::install(&ctx.config, &pkg, &ctx.client).is_err());

    // The link that was created before the failure is rolled back too
    assert!(ctx.config.bin_dir.join("aaa-first").symlink_metadata().is_err());
    assert!(!pkg.dir.exists());
}

#[test]
fn test_unsupported_target_touches_nothing() {
    let root = TempDir::new().unwrap();
    let registry = root.path().join("registry");
    write_recipe(
        &registry,
        "alien-tool",
        r#"name: alien-tool
description: Built for an imaginary platform
homepage: https://example.com
licenses: []
languages: []
categories: []
source:
  id: pkg:github/owner/alien-tool@v1.0.0
  asset:
    - target: imaginary_arch128
      file: alien.tar.gz
"#,
    );

    let ctx = test_context(&root, registry);
    let pkg = ctx.package("alien-tool").unwrap();
    assert!(pkg.is_unsupported());
    assert!(pkg.files.is_none());

    let err = lifecycle::install(&ctx.config, &pkg, &ctx.client).unwrap_err();
    assert!(matches!(err, Error::UnsupportedTarget(_)));
    assert!(!pkg.dir.exists());
}

#[test]
fn test_deprecated_package_refused() {
    let root = TempDir::new().unwrap();
    let registry = root.path().join("registry");
    write_recipe(
        &registry,
        "old-tool",
        r#"name: old-tool
description: Retired
homepage: https://example.com
licenses: []
languages: []
categories: []
deprecation:
  message: use new-tool instead
source:
  id: pkg:generic/old-tool@9.0.0
"#,
    );

    let ctx = test_context(&root, registry);
    let pkg = ctx.package("old-tool").unwrap();
    let err = lifecycle::install(&ctx.config, &pkg, &ctx.client).unwrap_err();
    assert!(matches!(err, Error::Deprecated { .. }));
    assert!(!pkg.dir.exists());
}

#[test]
fn test_unknown_package_not_found() {
    let root = TempDir::new().unwrap();
    let registry = root.path().join("registry");
    fs::create_dir_all(registry.join("packages")).unwrap();

    let ctx = test_context(&root, registry);
    let err = ctx.package("no-such-tool").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn test_first_registry_wins_on_name_collision() {
    let root = TempDir::new().unwrap();
    let reg_a = root.path().join("registry-a");
    let reg_b = root.path().join("registry-b");
    write_recipe(
        &reg_a,
        "shared-tool",
        "name: shared-tool\ndescription: from A\nhomepage: h\nlicenses: []\nlanguages: []\ncategories: []\nsource:\n  id: pkg:generic/shared-tool@1.0.0\n",
    );
    write_recipe(
        &reg_b,
        "shared-tool",
        "name: shared-tool\ndescription: from B\nhomepage: h\nlicenses: []\nlanguages: []\ncategories: []\nsource:\n  id: pkg:generic/shared-tool@2.0.0\n",
    );

    let config = Config::at(
        root.path().join("data"),
        root.path().join("cache"),
        vec![
            RegistrySource::File { dir: reg_a },
            RegistrySource::File { dir: reg_b },
        ],
    );
    let ctx = Context::new(config).unwrap();
    let pkg = ctx.package("shared-tool").unwrap();
    assert_eq!(pkg.description, "from A");
    assert_eq!(pkg.purl.version, "1.0.0");
}

#[test]
fn test_wrapper_script_bin_entry() {
    let root = TempDir::new().unwrap();
    let registry = root.path().join("registry");
    write_recipe(
        &registry,
        "jar-tool",
        r#"name: jar-tool
description: JVM language server
homepage: https://example.com
licenses: []
languages: []
categories: []
source:
  id: pkg:generic/jar-tool@2.0.0
  build:
    run: |
      touch server.jar
bin:
  jar-tool: java-jar:server.jar
"#,
    );

    let ctx = test_context(&root, registry);
    let pkg = ctx.package("jar-tool").unwrap();
    lifecycle::install(&ctx.config, &pkg, &ctx.client).unwrap();

    // The bin link points at a generated wrapper inside the package dir
    let link = ctx.config.bin_dir.join("jar-tool");
    let wrapper = fs::read_link(&link).unwrap();
    assert_eq!(wrapper, pkg.dir.join("jar-tool"));

    let script = fs::read_to_string(&wrapper).unwrap();
    assert!(script.starts_with("#!/usr/bin/env bash"));
    assert!(script.contains("exec java -jar"));
    assert!(script.contains("server.jar"));
}

#[test]
fn test_share_directory_expansion_in_receipt() {
    let root = TempDir::new().unwrap();
    let registry = root.path().join("registry");
    write_recipe(
        &registry,
        "data-tool",
        r#"name: data-tool
description: Ships data files
homepage: https://example.com
licenses: []
languages: []
categories: []
source:
  id: pkg:generic/data-tool@1.0.0
  build:
    run: |
      mkdir -p assets
      touch assets/one.dat assets/two.dat
share:
  data-tool/: assets
"#,
    );

    let ctx = test_context(&root, registry);
    let pkg = ctx.package("data-tool").unwrap();
    lifecycle::install(&ctx.config, &pkg, &ctx.client).unwrap();

    // Directory share entries become one receipt entry per file
    let receipt = mason::Receipt::read(&pkg.dir).unwrap();
    assert_eq!(receipt.links.share.len(), 2);
    assert!(ctx.config.share_dir.join("data-tool/one.dat").symlink_metadata().is_ok());

    lifecycle::uninstall(&ctx.config, "data-tool").unwrap();
    assert!(ctx.config.share_dir.join("data-tool/one.dat").symlink_metadata().is_err());
}
