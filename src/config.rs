//! Importer Configuration
//!
//! Built once (from the NIF load data or by a Rust caller) and never changed
//! afterwards. Every call reads the same values.

use std::str::FromStr;
use std::time::Duration;

/// Minimum TLS protocol version accepted for outbound fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TlsVersion {
    Tls1_0,
    Tls1_1,
    Tls1_2,
    Tls1_3,
}

impl FromStr for TlsVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let version = trimmed
            .strip_prefix("tls")
            .or_else(|| trimmed.strip_prefix("TLS"))
            .unwrap_or(trimmed)
            .trim_start_matches(['v', 'V', ' ']);
        match version {
            "1.0" | "1" => Ok(TlsVersion::Tls1_0),
            "1.1" => Ok(TlsVersion::Tls1_1),
            "1.2" => Ok(TlsVersion::Tls1_2),
            "1.3" => Ok(TlsVersion::Tls1_3),
            _ => Err(format!("Unknown TLS version: {}", s)),
        }
    }
}

impl From<TlsVersion> for reqwest::tls::Version {
    fn from(version: TlsVersion) -> Self {
        match version {
            TlsVersion::Tls1_0 => reqwest::tls::Version::TLS_1_0,
            TlsVersion::Tls1_1 => reqwest::tls::Version::TLS_1_1,
            TlsVersion::Tls1_2 => reqwest::tls::Version::TLS_1_2,
            TlsVersion::Tls1_3 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

/// What a query returns when it matches several nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Text of the first match in document order, as a scalar
    #[default]
    First,
    /// Text of every match, as a sequence
    All,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(MatchPolicy::First),
            "all" => Ok(MatchPolicy::All),
            _ => Err(format!("Unknown match policy: {}", s)),
        }
    }
}

/// Process-wide importer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub min_tls_version: TlsVersion,
    pub timeout: Duration,
    pub user_agent: String,
    /// Same-scheme redirect hops followed before the fetch fails
    pub max_redirects: usize,
    pub match_policy: MatchPolicy,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            min_tls_version: TlsVersion::Tls1_2,
            timeout: Duration::from_secs(30),
            user_agent: concat!("rustyimport/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 10,
            match_policy: MatchPolicy::First,
        }
    }
}

impl ImportConfig {
    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }
}
