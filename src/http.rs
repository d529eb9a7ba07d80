// src/http.rs

//! HTTP client for registry and artifact downloads
//!
//! Wraps reqwest's blocking client with retry support and streaming
//! downloads. Files are written to a `.tmp` sibling and renamed into place
//! so a partial download never masquerades as a finished artifact.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use indicatif::ProgressBar;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::progress;

/// Default timeout for HTTP requests (connect + first byte)
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed requests
const MAX_RETRIES: u32 = 3;

/// Base retry delay in milliseconds (multiplied by the attempt number)
const RETRY_DELAY_MS: u64 = 1000;

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// HTTP client wrapper with retry support
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("mason/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::NetworkError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Fetch a URL and decode the JSON body
    pub fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get_with_retry(url)?;
        response
            .json()
            .map_err(|e| Error::NetworkError(format!("Failed to parse JSON from {url}: {e}")))
    }

    /// Download a URL to the given path, streaming in chunks
    ///
    /// A progress bar is drawn while the body streams; it is sized from the
    /// `content-length` header when present and falls back to a byte
    /// counter otherwise.
    pub fn download_file(&self, url: &str, dest_path: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, dest_path.display());

        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let response = self.get_with_retry(url)?;
        let total_size = response.content_length().unwrap_or(0);

        let display_name = dest_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());
        let pb = if total_size > 0 {
            progress::download_bar(total_size, &display_name)
        } else {
            progress::download_spinner(&display_name)
        };

        // Write to a temporary sibling first, rename once complete
        let temp_path = dest_path.with_extension("tmp");
        let result = (|| {
            let mut file = File::create(&temp_path)?;
            stream_to_file(response, &mut file, &pb)?;
            fs::rename(&temp_path, dest_path)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                pb.finish_and_clear();
                debug!("Downloaded {}", dest_path.display());
                Ok(())
            }
            Err(e) => {
                pb.abandon();
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    /// GET with bounded retries; non-2xx is a [`Error::NetworkError`]
    fn get_with_retry(&self, url: &str) -> Result<reqwest::blocking::Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::NetworkError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::NetworkError(format!(
                            "Failed to fetch {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Request attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }
}

/// Stream a response body to a file, updating the progress bar per chunk
fn stream_to_file(
    mut response: reqwest::blocking::Response,
    file: &mut File,
    pb: &ProgressBar,
) -> Result<u64> {
    let mut downloaded: u64 = 0;
    let mut buffer = [0u8; STREAM_BUFFER_SIZE];

    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| Error::NetworkError(format!("Failed to read response: {e}")))?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }

    Ok(downloaded)
}

/// Download a named asset from a GitHub release
///
/// `version` is a release tag; the asset URL follows GitHub's stable
/// `releases/download/<tag>/<asset>` layout.
pub fn download_github_release_asset(
    client: &HttpClient,
    repo: &str,
    asset: &str,
    version: &str,
    out_dir: &Path,
) -> Result<()> {
    let url = format!("https://github.com/{repo}/releases/download/{version}/{asset}");
    client.download_file(&url, &out_dir.join(asset))
}
