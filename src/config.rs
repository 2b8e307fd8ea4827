// src/config.rs
// =============================================================================
// The scan configuration, built once at startup from the command line.
//
// Nothing in here changes after construction: the fetcher and the pipeline
// both borrow the same ScanConfig, so there is no global mutable state.
//
// Validation happens here, before the first request:
// - the target domain must parse as a URL with a host
// - the proxy address (if any) must parse as a URL with a host
// - the worker pool must have at least one slot
// =============================================================================

use crate::cli::Cli;
use crate::error::ScanError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Default number of concurrent fetch workers
pub const DEFAULT_WORKERS: usize = 4;

/// Request timeout without a proxy
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Request timeout when going through a proxy (proxies add latency)
pub const PROXY_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Directory that holds every scan's output
pub const DEFAULT_OUTPUT_ROOT: &str = "output";

#[derive(Debug, Clone)]
pub struct ScanConfig {
    target: Url,
    robots_url: Url,
    proxy: Option<Url>,
    output_name: Option<String>,
    output_root: PathBuf,
    workers: usize,
    fail_fast: bool,
}

impl ScanConfig {
    /// Validates the raw values and builds a configuration with defaults
    pub fn new(
        domain: &str,
        proxy: Option<&str>,
        output_name: Option<&str>,
    ) -> Result<Self, ScanError> {
        let normalized = normalize_domain(domain.trim());
        let target = Url::parse(&normalized)
            .map_err(|e| ScanError::Config(format!("invalid domain '{}': {}", domain, e)))?;
        if target.host_str().is_none() {
            return Err(ScanError::Config(format!("domain '{}' has no host", domain)));
        }

        // robots.txt always lives at the root of the given address
        let robots_url = Url::parse(&format!("{}/robots.txt", normalized))
            .map_err(|e| ScanError::Config(format!("invalid robots.txt address: {}", e)))?;

        let proxy = match proxy.map(str::trim).filter(|p| !p.is_empty()) {
            Some(address) => Some(parse_proxy(address)?),
            None => None,
        };

        let output_name = output_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(Self {
            target,
            robots_url,
            proxy,
            output_name,
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            workers: DEFAULT_WORKERS,
            fail_fast: false,
        })
    }

    /// Builds the configuration from parsed command-line arguments
    pub fn from_cli(cli: &Cli) -> Result<Self, ScanError> {
        let config = Self::new(&cli.domain, cli.proxy.as_deref(), cli.output.as_deref())?
            .with_workers(cli.workers)?
            .with_fail_fast(cli.fail_fast);

        Ok(match &cli.output_dir {
            Some(root) => config.with_output_root(root),
            None => config,
        })
    }

    pub fn with_workers(mut self, workers: usize) -> Result<Self, ScanError> {
        if workers == 0 {
            return Err(ScanError::Config(
                "worker pool needs at least one worker".to_string(),
            ));
        }
        self.workers = workers;
        Ok(self)
    }

    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn robots_url(&self) -> &Url {
        &self.robots_url
    }

    pub fn proxy(&self) -> Option<&Url> {
        self.proxy.as_ref()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    /// Per-request timeout; relaxed when a proxy is in use
    pub fn request_timeout(&self) -> Duration {
        if self.proxy.is_some() {
            PROXY_REQUEST_TIMEOUT
        } else {
            REQUEST_TIMEOUT
        }
    }

    /// The --output name, or the target host when none was given
    pub fn scan_name(&self) -> String {
        match &self.output_name {
            Some(name) => name.clone(),
            None => self.target.host_str().unwrap_or("scan").to_string(),
        }
    }

    /// Directory that receives the fetched bodies
    pub fn scan_dir(&self) -> PathBuf {
        self.output_root.join(self.scan_name())
    }

    /// File listing every URL that was found and saved
    pub fn success_list_path(&self) -> PathBuf {
        self.output_root.join(format!("{}.log", self.scan_name()))
    }
}

/// Ensures the address has an http(s) scheme and no trailing slash
///
/// Examples:
///   "example.com"          -> "http://example.com"
///   "https://example.com/" -> "https://example.com"
pub fn normalize_domain(input: &str) -> String {
    let with_scheme = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("http://{}", input)
    };

    match with_scheme.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => with_scheme,
    }
}

fn parse_proxy(address: &str) -> Result<Url, ScanError> {
    let proxy = Url::parse(&normalize_domain(address))
        .map_err(|e| ScanError::Config(format!("invalid proxy address '{}': {}", address, e)))?;

    if proxy.host_str().is_none() {
        return Err(ScanError::Config(format!(
            "invalid proxy address '{}': missing host",
            address
        )));
    }

    Ok(proxy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme() {
        assert_eq!(normalize_domain("example.com"), "http://example.com");
        assert_eq!(normalize_domain("https://example.com/"), "https://example.com");
        assert_eq!(normalize_domain("http://example.com"), "http://example.com");
    }

    #[test]
    fn test_robots_url_at_domain_root() {
        let config = ScanConfig::new("example.com", None, None).unwrap();
        assert_eq!(config.robots_url().as_str(), "http://example.com/robots.txt");
        assert_eq!(config.request_timeout(), REQUEST_TIMEOUT);
        assert_eq!(config.workers(), DEFAULT_WORKERS);
    }

    #[test]
    fn test_bad_proxy_is_config_error() {
        let err = ScanConfig::new("example.com", Some("badproxy:::1"), None).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[test]
    fn test_proxy_relaxes_timeout() {
        let config = ScanConfig::new("example.com", Some("127.0.0.1:8080"), None).unwrap();
        assert_eq!(config.proxy().unwrap().as_str(), "http://127.0.0.1:8080/");
        assert_eq!(config.request_timeout(), PROXY_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_empty_proxy_means_none() {
        let config = ScanConfig::new("example.com", Some("  "), None).unwrap();
        assert!(config.proxy().is_none());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = ScanConfig::new("example.com", None, None).unwrap();
        assert!(config.with_workers(0).is_err());
    }

    #[test]
    fn test_output_paths() {
        let config = ScanConfig::new("https://example.com", None, None)
            .unwrap()
            .with_output_root("/tmp/out");
        assert_eq!(config.scan_dir(), PathBuf::from("/tmp/out/example.com"));
        assert_eq!(
            config.success_list_path(),
            PathBuf::from("/tmp/out/example.com.log")
        );

        let named = ScanConfig::new("example.com", None, Some("nightly")).unwrap();
        assert_eq!(named.scan_name(), "nightly");
    }
}
