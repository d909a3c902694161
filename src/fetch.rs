//! Network retrieval of release archives and installer scripts.
//!
//! Steps never talk to the network directly; they go through [`Fetcher`] so
//! integration tests can serve canned files.
use anyhow::{Context, Result, bail};
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

/// Upper bound on a single download.
const MAX_DOWNLOAD_BYTES: u64 = 512 * 1024 * 1024;

/// Timeout applied to the whole request, body included.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);

/// Retrieve a URL into a local file.
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    /// Download `url` to `dest`, which must not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success HTTP status, a
    /// body larger than the download limit, or if `dest` exists or cannot
    /// be written.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Production [`Fetcher`] backed by `ureq`.
#[derive(Debug)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(TRANSFER_TIMEOUT))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let response = match self.agent.get(url).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(code)) => bail!("download of {url} failed: HTTP {code}"),
            Err(e) => return Err(anyhow::Error::new(e).context(format!("downloading {url}"))),
        };

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .with_context(|| format!("creating {}", dest.display()))?;
        let reader = response.into_body().into_reader();
        if let Err(e) = copy_limited(reader, file, MAX_DOWNLOAD_BYTES) {
            let _ = std::fs::remove_file(dest);
            return Err(e.context(format!("downloading {url} to {}", dest.display())));
        }
        Ok(())
    }
}

/// Copy `reader` into `writer`, failing once more than `limit` bytes arrive.
///
/// # Errors
///
/// Returns an error on I/O failure or when the body exceeds `limit`.
pub fn copy_limited(reader: impl Read, mut writer: impl Write, limit: u64) -> Result<u64> {
    // One byte past the limit tells a body of exactly `limit` from a longer one.
    let mut limited = reader.take(limit.saturating_add(1));
    let copied = io::copy(&mut limited, &mut writer)?;
    if copied > limit {
        bail!("download exceeds the {limit} byte limit");
    }
    writer.flush()?;
    Ok(copied)
}

/// Compute the lowercase hex SHA-256 digest of the file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_sha256(path: &Path) -> Result<String> {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let mut file =
        std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("reading {} for checksum", path.display()))?;
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(64);
    for b in &digest {
        write!(hex, "{b:02x}").unwrap_or(());
    }
    Ok(hex)
}

/// Verify `path` against an expected SHA-256 digest (case-insensitive hex).
///
/// # Errors
///
/// Returns an error if the digests differ or the file cannot be read.
pub fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    let actual = compute_sha256(path)?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        bail!(
            "checksum mismatch for {}: expected {}, got {actual}",
            path.display(),
            expected.trim()
        );
    }
    Ok(())
}
