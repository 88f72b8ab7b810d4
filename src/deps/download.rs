//! HTTP download of the prebuilt dependency bundle

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::utils::terminal::{create_download_bar, create_spinner};

/// Download `url` to `dest`, overwriting it. Returns the number of bytes written.
pub fn download(url: &str, dest: &Path) -> Result<u64> {
    // No overall timeout: the bundle is large and slow links are expected
    let client = reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(None::<Duration>)
        .user_agent(format!("nomdev/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to download {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Failed to download {}: HTTP {}", url, status.as_u16());
    }

    let message = format!("Downloading {}", url);
    let pb = match response.content_length() {
        Some(len) => create_download_bar(len, &message),
        None => create_spinner(&message),
    };

    let mut file =
        File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    let written = io::copy(&mut pb.wrap_read(response), &mut file)
        .with_context(|| format!("Failed to write {}", dest.display()))?;
    pb.finish_and_clear();

    Ok(written)
}
