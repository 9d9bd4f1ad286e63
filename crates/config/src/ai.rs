// Oracle credentials
//
// API keys are looked up in:
// 1. System keychain (with the `keychain` feature)
// 2. PRODMATCH_OPENAI_KEY
// 3. OPENAI_API_KEY
//
// Keys are NEVER stored in prodmatch.toml

use std::env;

use crate::settings::OracleSettings;

/// Service name for keychain storage
#[cfg(feature = "keychain")]
const KEYCHAIN_SERVICE: &str = "prodmatch";

#[cfg(feature = "keychain")]
const KEYCHAIN_ACCOUNT: &str = "oracle/openai";

/// Environment variables consulted, in order.
pub const KEY_ENV_VARS: [&str; 2] = ["PRODMATCH_OPENAI_KEY", "OPENAI_API_KEY"];

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key retrieved from system keychain
    Keychain,
    /// Key retrieved from the named environment variable
    Environment(&'static str),
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment(var) => *var,
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Get the oracle API key from the keychain or environment
pub fn get_api_key() -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    lookup_env(|name| env::var(name).ok())
}

/// First non-empty value among [`KEY_ENV_VARS`], read through `get`.
pub fn lookup_env(get: impl Fn(&str) -> Option<String>) -> KeyLookup {
    for name in KEY_ENV_VARS {
        if let Some(key) = get(name).filter(|k| !k.trim().is_empty()) {
            return KeyLookup {
                key: Some(key),
                source: KeySource::Environment(name),
            };
        }
    }
    KeyLookup {
        key: None,
        source: KeySource::None,
    }
}

/// Status of the oracle configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleStatus {
    Ready,
    MissingKey,
}

impl OracleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// The effective oracle configuration for one run.
#[derive(Debug, Clone)]
pub struct ResolvedOracleConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// API key (if available)
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub status: OracleStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

impl ResolvedOracleConfig {
    /// Resolve against the real keychain and environment.
    pub fn from_settings(settings: &OracleSettings) -> Self {
        Self::with_lookup(settings, get_api_key())
    }

    pub fn with_lookup(settings: &OracleSettings, lookup: KeyLookup) -> Self {
        let (status, blocking_reason) = match lookup.key {
            Some(_) => (OracleStatus::Ready, None),
            None => (
                OracleStatus::MissingKey,
                Some(format!("No API key found. Set {}", KEY_ENV_VARS.join(" or "))),
            ),
        };

        Self {
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout_secs,
            api_key: lookup.key,
            key_source: lookup.source,
            status,
            blocking_reason,
        }
    }
}
