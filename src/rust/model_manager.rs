use std::env;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use sha2::{Digest, Sha256};

/// Canonical location of the fastText lid.176 language identification model (~128MB).
pub const DEFAULT_MODEL_URL: &str =
    "https://dl.fbaipublicfiles.com/fasttext/supervised-models/lid.176.bin";
/// File name of the cached artifact inside the cache directory.
pub const DEFAULT_MODEL_FILE: &str = "language.bin";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const CACHE_ENV: &str = "LUGA_CACHE";
pub const MODEL_URL_ENV: &str = "LUGA_MODEL_URL";
pub const CONNECT_TIMEOUT_ENV: &str = "LUGA_CONNECT_TIMEOUT";
pub const TIMEOUT_ENV: &str = "LUGA_TIMEOUT";
pub const SHA256_ENV: &str = "LUGA_MODEL_SHA256";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Transfer error: {0}")]
    Transfer(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
    #[error("Empty response body from {url}")]
    EmptyArtifact { url: String },
}

/// Where the model artifact comes from, where it is cached and how long a
/// transfer may take.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactConfig {
    pub source_url: String,
    pub cache_dir: PathBuf,
    pub file_name: String,
    /// Budget for establishing the connection.
    pub connect_timeout: Duration,
    /// Budget for the whole transfer. `None` disables it.
    pub timeout: Option<Duration>,
    /// Expected lowercase hex SHA-256 of the artifact.
    pub sha256: Option<String>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_MODEL_URL.to_string(),
            cache_dir: resolve_models_dir(None),
            file_name: DEFAULT_MODEL_FILE.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: Some(DEFAULT_TIMEOUT),
            sha256: None,
        }
    }
}

impl ArtifactConfig {
    /// Builds a config from the `LUGA_*` environment variables, falling back
    /// to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            cache_dir: resolve_models_dir(lookup(CACHE_ENV)),
            ..Self::default()
        };

        if let Some(url) = lookup(MODEL_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.source_url = url.trim().to_string();
        }
        if let Some(secs) = parse_secs(&lookup, CONNECT_TIMEOUT_ENV) {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_secs(&lookup, TIMEOUT_ENV) {
            // 0 means no overall budget
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(hash) = lookup(SHA256_ENV).filter(|hash| !hash.trim().is_empty()) {
            config.sha256 = Some(hash.trim().to_ascii_lowercase());
        }
        config
    }

    /// Returns the default models directory path
    pub fn default_cache_dir() -> PathBuf {
        resolve_models_dir(env::var(CACHE_ENV).ok())
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.cache_dir.join(&self.file_name)
    }
}

fn resolve_models_dir(cache_root: Option<String>) -> PathBuf {
    // 1. Explicit cache root
    if let Some(path) = cache_root.filter(|path| !path.is_empty()) {
        return PathBuf::from(path).join("models");
    }

    // 2. Use platform-specific cache directory
    if let Some(cache_dir) = dirs::cache_dir() {
        return cache_dir.join("luga").join("models");
    }

    // 3. Fallback to user's home directory
    if let Some(home_dir) = dirs::home_dir() {
        return home_dir.join(".cache").join("luga").join("models");
    }

    // 4. If all else fails, use system temp directory (platform agnostic)
    env::temp_dir().join("luga").join("models")
}

fn parse_secs<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: expected a whole number of seconds", key, raw);
            None
        }
    }
}

/// Blocking transfer of a remote artifact.
pub trait Fetch: Send + Sync {
    /// Streams the body found at `url` into `sink` and returns the number of
    /// bytes written.
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ModelError>;
}

/// [`Fetch`] over HTTP(S) with separate connect and overall budgets.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(connect_timeout: Duration, timeout: Option<Duration>) -> Result<Self, ModelError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ArtifactConfig) -> Result<Self, ModelError> {
        Self::new(config.connect_timeout, config.timeout)
    }

    /// Uses a preconfigured client, e.g. one with proxy or TLS settings.
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64, ModelError> {
        let mut response = self.client.get(url).send()?.error_for_status()?;
        log::info!("Download response status: {}", response.status());
        let written = response.copy_to(sink)?;
        Ok(written)
    }
}

/// Hashes everything written through it.
struct DigestWriter<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> DigestWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn hex_digest(&self) -> String {
        format!("{:x}", self.hasher.clone().finalize())
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn hash_file(path: &Path) -> Result<String, ModelError> {
    let mut file = File::open(path)?;
    let mut writer = DigestWriter::new(io::sink());
    let bytes = io::copy(&mut file, &mut writer)?;
    log::debug!("Hashed {} bytes from {:?}", bytes, path);
    Ok(writer.hex_digest())
}

/// Keeps a single cached copy of the model artifact on disk.
///
/// The artifact is either absent or complete: bodies are staged in a
/// temporary file next to the target and renamed into place only after the
/// transfer (and checksum, when configured) succeeded.
#[derive(Clone)]
pub struct ModelManager<F = HttpFetcher> {
    config: ArtifactConfig,
    fetcher: F,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager<HttpFetcher> {
    /// Creates a manager fetching over HTTP with the config's timeouts
    pub fn new(config: ArtifactConfig) -> Result<Self, ModelError> {
        let fetcher = HttpFetcher::from_config(&config)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Creates a new ModelManager configured from the environment
    pub fn new_default() -> Result<Self, ModelError> {
        Self::new(ArtifactConfig::from_env())
    }
}

impl<F: Fetch> ModelManager<F> {
    pub fn with_fetcher(config: ArtifactConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            download_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn config(&self) -> &ArtifactConfig {
        &self.config
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.config.artifact_path()
    }

    pub fn is_present(&self) -> bool {
        self.artifact_path().is_file()
    }

    /// Makes sure the artifact exists locally, fetching it from `source_url`
    /// when it is missing or when `force` is set.
    ///
    /// No retries: any transfer or filesystem failure is returned as is.
    pub fn ensure_present(&self, source_url: &str, force: bool) -> Result<(), ModelError> {
        if !force && self.is_present() {
            log::debug!("Artifact already cached at {:?}", self.artifact_path());
            return Ok(());
        }

        let _lock = self.download_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // another caller may have finished the download while we waited
        if !force && self.is_present() {
            log::debug!("Artifact appeared at {:?} while waiting", self.artifact_path());
            return Ok(());
        }

        self.download(source_url)
    }

    /// [`ensure_present`](Self::ensure_present) against the configured source.
    pub fn ensure_default(&self, force: bool) -> Result<(), ModelError> {
        self.ensure_present(&self.config.source_url, force)
    }

    fn download(&self, url: &str) -> Result<(), ModelError> {
        let path = self.artifact_path();
        log::info!("Creating model directory at {:?}", self.config.cache_dir);
        fs::create_dir_all(&self.config.cache_dir)?;

        // staged next to the target so the final rename stays on one filesystem
        let staged = tempfile::Builder::new()
            .prefix(&format!(".{}.", self.config.file_name))
            .suffix(".part")
            .tempfile_in(&self.config.cache_dir)?;

        log::info!("Downloading model from {} to {:?}", url, path);
        let mut writer = DigestWriter::new(BufWriter::new(staged.as_file()));
        let written = self.fetcher.fetch(url, &mut writer)?;
        writer.flush()?;
        let actual = writer.hex_digest();
        drop(writer);
        log::info!("Downloaded {} bytes", written);

        if written == 0 {
            return Err(ModelError::EmptyArtifact { url: url.to_string() });
        }
        staged.as_file().sync_all()?;

        if let Some(expected) = &self.config.sha256 {
            log::info!("Calculated hash: {}", actual);
            log::info!("Expected hash:   {}", expected);
            if !expected.eq_ignore_ascii_case(&actual) {
                log::error!("Artifact hash mismatch: expected {}, got {}", expected, actual);
                return Err(ModelError::HashMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        staged.persist(&path).map_err(|e| e.error)?;
        log::info!("Model artifact ready at {:?}", path);
        Ok(())
    }

    /// Deletes the cached artifact. Returns whether anything was deleted.
    pub fn evict(&self) -> Result<bool, ModelError> {
        let path = self.artifact_path();
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Removed model artifact at {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No model artifact at {:?}", path);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks the cached artifact against the configured checksum.
    ///
    /// Absent artifacts never verify; without a configured checksum any
    /// present artifact does.
    pub fn verify(&self) -> Result<bool, ModelError> {
        let path = self.artifact_path();
        if !path.is_file() {
            log::info!("Artifact {:?} does not exist", path);
            return Ok(false);
        }

        let Some(expected) = &self.config.sha256 else {
            return Ok(true);
        };
        let actual = hash_file(&path)?;
        log::info!("Calculated hash: {}", actual);
        log::info!("Expected hash:   {}", expected);
        Ok(actual.eq_ignore_ascii_case(expected))
    }
}
