// src/archive.rs

//! Archive classification and extraction
//!
//! Downloaded artifacts arrive as tarballs (gz/bz2/xz), zip files (including
//! `.vsix` extensions), or bare gzip members. Classification keys off the
//! last two path suffixes so `foo-1.2.tar.gz` and `foo.tgz` both resolve to
//! a gzipped tarball.
//!
//! Tar entries pass through a sanitizer that rejects absolute paths and
//! `..` traversal before anything touches the filesystem.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Recognised archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// `.tar.gz` / `.tgz`
    TarGz,
    /// `.tar.bz2` / `.tbz2`
    TarBz2,
    /// `.tar.xz` / `.txz`
    TarXz,
    /// Uncompressed `.tar`
    Tar,
    /// Bare gzip member; extracts to `out/<stem>`
    Gz,
    /// `.zip` / `.vsix`
    Zip,
}

impl ArchiveFormat {
    /// Classify a path by its last two suffixes
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            Some(Self::TarBz2)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(Self::TarXz)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else if name.ends_with(".gz") {
            Some(Self::Gz)
        } else if name.ends_with(".zip") || name.ends_with(".vsix") {
            Some(Self::Zip)
        } else {
            None
        }
    }
}

/// True if `extract` knows how to unpack this file
pub fn is_extractable(path: &Path) -> bool {
    ArchiveFormat::from_path(path).is_some()
}

/// Extract an archive into `out`
///
/// The output directory is created if needed. Unknown formats are an
/// [`Error::ArchiveError`].
pub fn extract(path: &Path, out: &Path) -> Result<()> {
    let format = ArchiveFormat::from_path(path)
        .ok_or_else(|| Error::ArchiveError(format!("Unsupported file type: {}", path.display())))?;

    debug!("Extracting {} ({:?})", path.display(), format);
    fs::create_dir_all(out)?;

    let file = File::open(path)?;
    match format {
        ArchiveFormat::TarGz => unpack_tar(flate2::read::GzDecoder::new(file), out),
        ArchiveFormat::TarBz2 => unpack_tar(bzip2::read::BzDecoder::new(file), out),
        ArchiveFormat::TarXz => unpack_tar(xz2::read::XzDecoder::new(file), out),
        ArchiveFormat::Tar => unpack_tar(file, out),
        ArchiveFormat::Gz => {
            let stem = path
                .file_stem()
                .map(PathBuf::from)
                .ok_or_else(|| Error::ArchiveError(format!("No stem for {}", path.display())))?;
            let mut decoder = flate2::read::GzDecoder::new(file);
            let mut dest = File::create(out.join(stem))?;
            io::copy(&mut decoder, &mut dest)
                .map_err(|e| Error::ArchiveError(format!("Failed to decompress {}: {e}", path.display())))?;
            Ok(())
        }
        ArchiveFormat::Zip => {
            let mut archive = zip::ZipArchive::new(file)
                .map_err(|e| Error::ArchiveError(format!("Failed to read {}: {e}", path.display())))?;
            archive
                .extract(out)
                .map_err(|e| Error::ArchiveError(format!("Failed to extract {}: {e}", path.display())))?;
            Ok(())
        }
    }
}

fn unpack_tar<R: Read>(reader: R, out: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    for entry in archive
        .entries()
        .map_err(|e| Error::ArchiveError(format!("Failed to read tar archive: {e}")))?
    {
        let mut entry =
            entry.map_err(|e| Error::ArchiveError(format!("Corrupt tar entry: {e}")))?;
        let raw = entry
            .path()
            .map_err(|e| Error::ArchiveError(format!("Invalid tar entry path: {e}")))?
            .into_owned();
        let Some(safe) = sanitize_entry_path(&raw)? else {
            // Entry collapsed to nothing (e.g. "./"); skip it
            continue;
        };
        let dest = out.join(safe);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        entry
            .unpack(&dest)
            .map_err(|e| Error::ArchiveError(format!("Failed to unpack {}: {e}", raw.display())))?;
    }
    Ok(())
}

/// Strip root markers and reject `..` from an archive entry path
///
/// Returns `Ok(None)` for paths that collapse to nothing after cleaning.
fn sanitize_entry_path(path: &Path) -> Result<Option<PathBuf>> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(c) => clean.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(path.display().to_string()));
            }
            // Absolute entries are re-rooted under the output directory
            Component::Prefix(_) | Component::RootDir => {}
        }
    }
    if clean.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(clean))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_classification() {
        let cases = [
            ("tool-1.0.tar.gz", Some(ArchiveFormat::TarGz)),
            ("tool.tgz", Some(ArchiveFormat::TarGz)),
            ("tool.tar.bz2", Some(ArchiveFormat::TarBz2)),
            ("tool.tbz2", Some(ArchiveFormat::TarBz2)),
            ("tool.tar.xz", Some(ArchiveFormat::TarXz)),
            ("tool.txz", Some(ArchiveFormat::TarXz)),
            ("tool.tar", Some(ArchiveFormat::Tar)),
            ("tool.gz", Some(ArchiveFormat::Gz)),
            ("tool.zip", Some(ArchiveFormat::Zip)),
            ("extension.vsix", Some(ArchiveFormat::Zip)),
            ("tool.exe", None),
            ("tool", None),
        ];
        for (name, expected) in cases {
            assert_eq!(ArchiveFormat::from_path(Path::new(name)), expected, "{name}");
        }
    }

    #[test]
    fn test_is_extractable() {
        assert!(is_extractable(Path::new("a.tar.gz")));
        assert!(is_extractable(Path::new("a.vsix")));
        assert!(!is_extractable(Path::new("a.bin")));
    }

    #[test]
    fn test_sanitize_entry_path() {
        assert_eq!(
            sanitize_entry_path(Path::new("usr/bin/tool")).unwrap(),
            Some(PathBuf::from("usr/bin/tool"))
        );
        assert_eq!(
            sanitize_entry_path(Path::new("/etc/passwd")).unwrap(),
            Some(PathBuf::from("etc/passwd"))
        );
        assert_eq!(sanitize_entry_path(Path::new("./")).unwrap(), None);
        assert!(sanitize_entry_path(Path::new("../escape")).is_err());
        assert!(sanitize_entry_path(Path::new("a/../../b")).is_err());
    }

    #[test]
    fn test_extract_tar_gz_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let archive_path = dir.path().join("sample.tar.gz");

        // Build a small tar.gz with one file
        let gz = flate2::write::GzEncoder::new(
            File::create(&archive_path).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(gz);
        let data = b"hello from the tarball";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "nested/file.txt", &data[..]).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let out = dir.path().join("out");
        extract(&archive_path, &out).unwrap();
        let content = fs::read_to_string(out.join("nested/file.txt")).unwrap();
        assert_eq!(content, "hello from the tarball");
    }

    #[test]
    fn test_extract_traversal_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let archive_path = dir.path().join("evil.tar");

        let mut builder = tar::Builder::new(File::create(&archive_path).unwrap());
        let data = b"payload";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        // `append_data`/`set_path` reject `..` components outright, so the
        // malicious name is written straight into the raw header bytes to
        // simulate an archive crafted outside this crate's control.
        let name_field = &mut header.as_mut_bytes()[0..100];
        let raw_name = b"../escape.txt";
        name_field[..raw_name.len()].copy_from_slice(raw_name);
        header.set_cksum();
        builder.append(&header, &data[..]).unwrap();
        builder.into_inner().unwrap();

        let out = dir.path().join("out");
        let err = extract(&archive_path, &out).unwrap_err();
        assert!(matches!(err, Error::PathTraversal(_)));
        assert!(!dir.path().join("escape.txt").exists());
    }

    #[test]
    fn test_extract_bare_gz() {
        let dir = tempfile::TempDir::new().unwrap();
        let gz_path = dir.path().join("notes.txt.gz");

        let mut encoder = flate2::write::GzEncoder::new(
            File::create(&gz_path).unwrap(),
            flate2::Compression::default(),
        );
        encoder.write_all(b"plain contents").unwrap();
        encoder.finish().unwrap();

        let out = dir.path().join("out");
        extract(&gz_path, &out).unwrap();
        assert_eq!(fs::read_to_string(out.join("notes.txt")).unwrap(), "plain contents");
    }

    #[test]
    fn test_extract_zip() {
        let dir = tempfile::TempDir::new().unwrap();
        let zip_path = dir.path().join("bundle.zip");

        let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
        writer
            .start_file("inner/data.json", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"{\"ok\":true}").unwrap();
        writer.finish().unwrap();

        let out = dir.path().join("out");
        extract(&zip_path, &out).unwrap();
        assert_eq!(
            fs::read_to_string(out.join("inner/data.json")).unwrap(),
            "{\"ok\":true}"
        );
    }

    #[test]
    fn test_extract_unknown_format() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mystery.bin");
        fs::write(&path, b"data").unwrap();
        let err = extract(&path, dir.path()).unwrap_err();
        assert!(matches!(err, Error::ArchiveError(_)));
    }
}
