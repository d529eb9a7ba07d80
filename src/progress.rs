// src/progress.rs

//! Progress bar construction for downloads

use indicatif::{ProgressBar, ProgressStyle};

/// Create a styled progress bar for a download of known size
pub fn download_bar(size: u64, name: &str) -> ProgressBar {
    let pb = ProgressBar::new(size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message(name.to_string());
    pb
}

/// Create a spinner for a download of unknown size
pub fn download_spinner(name: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {bytes} ({bytes_per_sec}) {msg}")
            .expect("Invalid spinner template"),
    );
    pb.set_message(name.to_string());
    pb
}
