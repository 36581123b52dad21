// ── Runtime configuration ──
//
// These types describe *what* to reconcile and how to reach it. They carry
// resolved credentials and tuning, but never touch disk; `vlansync-config`
// builds a `SyncConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use vlansync_api::{RetryPolicy, TlsMode, TransportConfig};

use crate::model::VlanTranslations;

/// Connection settings for the NetBox instance.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub url: Url,
    pub token: SecretString,
    pub timeout: Duration,
    pub verify_ssl: bool,
    pub max_retries: u32,
}

impl InventoryConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: tls_mode(self.verify_ssl),
            timeout: self.timeout,
        }
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy::with_max_retries(self.max_retries)
    }
}

/// One FortiGate to pull managed switches from.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Operator-facing name, used in logs.
    pub name: String,
    pub url: Url,
    pub token: SecretString,
    pub verify_ssl: bool,
    pub vdom: Option<String>,
    pub timeout: Duration,
}

impl SourceConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: tls_mode(self.verify_ssl),
            timeout: self.timeout,
        }
    }
}

/// Local response cache settings.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Directory for cached responses; `None` disables caching entirely.
    pub dir: Option<PathBuf>,
    /// Serve reads from the cache when an entry exists.
    pub use_cached_data: bool,
}

/// Everything one reconciliation run needs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub netbox: InventoryConfig,
    pub fortigates: Vec<SourceConfig>,
    pub translations: VlanTranslations,
    pub cache: CacheConfig,
    /// NetBox writes allowed in single-switch mode.
    pub max_updates: u32,
}

fn tls_mode(verify_ssl: bool) -> TlsMode {
    if verify_ssl {
        TlsMode::System
    } else {
        TlsMode::DangerAcceptInvalid
    }
}
