// FortiGate REST client (switch-controller CMDB).
//
// Read-only: the FortiGate is the source of truth and is never written.
// Auth is a REST API admin token sent as a bearer header.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};
use url::Url;

use super::models::{CmdbResponse, ManagedSwitch};
use crate::cache::ResponseCache;
use crate::error::Error;
use crate::transport::{self, TransportConfig};

const MANAGED_SWITCH_PATH: &str = "api/v2/cmdb/switch-controller/managed-switch";

/// Async client for one FortiGate appliance.
pub struct FortiGateClient {
    http: reqwest::Client,
    base_url: Url,
    vdom: Option<String>,
    cache: Option<Arc<ResponseCache>>,
}

impl FortiGateClient {
    /// Build from an API token and transport config.
    ///
    /// `base_url` is the appliance root, e.g. `https://fg1.example.com`.
    pub fn new(
        base_url: Url,
        api_token: &SecretString,
        vdom: Option<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid FortiGate token header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, base_url, vdom))
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: Url, vdom: Option<String>) -> Self {
        Self {
            http,
            base_url: with_trailing_slash(base_url),
            vdom,
            cache: None,
        }
    }

    /// Attach a response cache.
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// `host[:port]` of the appliance, used in logs and cache keys.
    pub fn host(&self) -> String {
        let host = self.base_url.host_str().unwrap_or("unknown");
        match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        }
    }

    fn switches_cache_key(&self) -> String {
        match &self.vdom {
            Some(vdom) => format!("fortigate_{}_{vdom}_managed_switches", self.host()),
            None => format!("fortigate_{}_managed_switches", self.host()),
        }
    }

    /// Fetch every managed FortiSwitch with its port table.
    pub async fn list_managed_switches(&self) -> Result<Vec<ManagedSwitch>, Error> {
        let key = self.switches_cache_key();
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            info!(host = %self.host(), "using cached managed-switch data");
            return Ok(cached);
        }

        let url = self.base_url.join(MANAGED_SWITCH_PATH)?;
        let mut request = self.http.get(url.clone());
        if let Some(vdom) = &self.vdom {
            request = request.query(&[("vdom", vdom.as_str())]);
        }

        debug!("GET {url}");
        let resp = request.send().await?;
        let envelope: CmdbResponse<ManagedSwitch> = transport::decode_json(resp).await?;

        if let Some(status) = envelope.status.as_deref().filter(|s| *s != "success") {
            warn!(host = %self.host(), status, "FortiGate reported non-success status");
        }

        let switches = envelope.results;
        info!(host = %self.host(), count = switches.len(), "fetched managed switches");

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &switches) {
                warn!(error = %e, "failed to cache managed-switch data");
            }
        }

        Ok(switches)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
