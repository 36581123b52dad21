// ── Core error types ──
//
// Run-level failures of the reconciliation engine. Transport details from
// `vlansync-api` are folded into `Inventory` / `SourceFetch` so callers
// only branch on what matters to a run: which step failed, and whether
// the whole run must stop.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fatal run conditions ─────────────────────────────────────────
    /// A FortiGate could not be queried for its managed switches.
    #[error("Failed to retrieve switches from FortiGate {device}: {message}")]
    SourceFetch { device: String, message: String },

    /// A reported switch has no NetBox device of the same name.
    #[error("Missing switch in NetBox: name={name}")]
    MissingDevice { name: String },

    /// The requested target switch is not managed by any FortiGate.
    #[error("Switch not found on any FortiGate: name={name}")]
    TargetNotFound { name: String },

    // ── Write-back ───────────────────────────────────────────────────
    /// A desired VLAN has no NetBox VLAN object (or no vid at all).
    #[error("Cannot resolve {vlan} to a NetBox VLAN")]
    UnresolvableVlan { vlan: String },

    // ── Inventory API (wrapped) ──────────────────────────────────────
    #[error("NetBox request failed: {message}")]
    Inventory {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Whether this error aborts the whole run (as opposed to one port).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnresolvableVlan { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vlansync_api::Error> for CoreError {
    fn from(err: vlansync_api::Error) -> Self {
        match err {
            vlansync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vlansync_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            other => CoreError::Inventory {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_message_is_machine_readable() {
        let err = CoreError::MissingDevice { name: "SW1".into() };
        assert_eq!(err.to_string(), "Missing switch in NetBox: name=SW1");
        assert!(err.is_fatal());
    }

    #[test]
    fn api_http_errors_keep_status() {
        let err: CoreError = vlansync_api::Error::Http {
            status: 503,
            url: "https://netbox/api/dcim/devices/".into(),
            message: "unavailable".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Inventory { status: Some(503), .. }));
    }

    #[test]
    fn unresolvable_vlan_is_not_fatal() {
        let err = CoreError::UnresolvableVlan {
            vlan: "VLAN-4000".into(),
        };
        assert!(!err.is_fatal());
    }
}
