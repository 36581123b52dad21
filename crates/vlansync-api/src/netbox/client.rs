// NetBox REST client (DCIM devices/interfaces, IPAM VLANs).
//
// Authenticated with `Authorization: Token <token>`. List endpoints use
// offset pagination; the client walks pages until `next` is null.
// Transient failures (timeouts, connect errors, 429/502/503/504) are
// retried with exponential backoff per `RetryPolicy`.

use std::sync::Arc;

use dashmap::DashMap;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::models::{Device, Interface, InterfaceVlanPatch, Page, Vlan};
use crate::cache::ResponseCache;
use crate::error::Error;
use crate::retry::RetryPolicy;
use crate::transport::{self, TransportConfig};

const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Async client for a NetBox instance.
pub struct NetBoxClient {
    http: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
    page_size: u32,
    cache: Option<Arc<ResponseCache>>,
    /// vid -> NetBox VLAN object id, filled lazily by `resolve_vlan`.
    vlan_ids: DashMap<i64, u64>,
}

impl NetBoxClient {
    /// Build from an API token and transport config.
    pub fn new(
        base_url: Url,
        api_token: &SecretString,
        transport: &TransportConfig,
        retry: RetryPolicy,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {}", api_token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid NetBox token header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, base_url).with_retry(retry))
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http,
            base_url,
            retry: RetryPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
            cache: None,
            vlan_ids: DashMap::new(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cache key for a device's interface listing.
    pub fn interfaces_cache_key(device_id: u64) -> String {
        format!("netbox_device_{device_id}_interfaces")
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("api/{path}"))?)
    }

    /// Send a request (rebuilt per attempt) and decode the JSON body,
    /// retrying transient failures.
    async fn send_json<T, F>(&self, build: F) -> Result<T, Error>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let result = match build().send().await {
                Ok(resp) => transport::decode_json(resp).await,
                Err(e) => Err(Error::Transport(e)),
            };

            match result {
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        error = %e,
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "transient NetBox failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("GET {url} {query:?}");
        self.send_json(|| self.http.get(url.clone()).query(query))
            .await
    }

    /// Walk an offset-paginated endpoint until `next` is null.
    async fn paginate_all<T: DeserializeOwned>(
        &self,
        url: &Url,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, Error> {
        let mut all = Vec::new();
        let mut offset: u64 = 0;

        loop {
            let mut query = filters.to_vec();
            query.push(("limit", self.page_size.to_string()));
            query.push(("offset", offset.to_string()));

            let page: Page<T> = self.get_json(url, &query).await?;
            let fetched = u64::try_from(page.results.len()).unwrap_or(u64::MAX);
            all.extend(page.results);

            if page.next.is_none() || fetched == 0 {
                break;
            }
            offset += fetched;
        }

        Ok(all)
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Look up a device by exact name. Names are assumed unique; with
    /// several matches the first one is used.
    pub async fn find_device_by_name(&self, name: &str) -> Result<Option<Device>, Error> {
        let url = self.api_url("dcim/devices/")?;
        let page: Page<Device> = self.get_json(&url, &[("name", name.to_owned())]).await?;

        if page.results.len() > 1 {
            warn!(name, count = page.results.len(), "multiple NetBox devices share this name, using the first");
        }
        Ok(page.results.into_iter().next())
    }

    // ── Interfaces ───────────────────────────────────────────────────

    /// All interfaces of a device, served from the cache when allowed.
    pub async fn list_interfaces(&self, device_id: u64) -> Result<Vec<Interface>, Error> {
        let key = Self::interfaces_cache_key(device_id);
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            info!(device_id, "using cached NetBox interfaces");
            return Ok(cached);
        }

        let url = self.api_url("dcim/interfaces/")?;
        let interfaces: Vec<Interface> = self
            .paginate_all(&url, &[("device_id", device_id.to_string())])
            .await?;
        info!(device_id, count = interfaces.len(), "fetched NetBox interfaces");

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&key, &interfaces) {
                warn!(error = %e, "failed to cache NetBox interfaces");
            }
        }
        Ok(interfaces)
    }

    /// Fetch one interface fresh. Never served from the cache.
    pub async fn get_interface(&self, interface_id: u64) -> Result<Interface, Error> {
        let url = self.api_url(&format!("dcim/interfaces/{interface_id}/"))?;
        self.get_json(&url, &[]).await
    }

    /// Apply a mode / native / tagged assignment to one interface.
    pub async fn update_interface_vlans(
        &self,
        interface_id: u64,
        patch: &InterfaceVlanPatch,
    ) -> Result<Interface, Error> {
        let url = self.api_url(&format!("dcim/interfaces/{interface_id}/"))?;
        debug!("PATCH {url} {patch:?}");
        self.send_json(|| self.http.patch(url.clone()).json(patch))
            .await
    }

    /// Drop the cached interface listing for a device after a write.
    pub fn invalidate_interfaces(&self, device_id: u64) -> Result<(), Error> {
        if let Some(cache) = &self.cache {
            cache.delete(&Self::interfaces_cache_key(device_id))?;
        }
        Ok(())
    }

    // ── VLANs ────────────────────────────────────────────────────────

    /// Resolve a vid to its NetBox VLAN object id.
    ///
    /// `Ok(None)` when no VLAN carries that vid. Successful lookups are
    /// memoized for the lifetime of the client; misses are not.
    pub async fn resolve_vlan(&self, vid: i64) -> Result<Option<u64>, Error> {
        if let Some(id) = self.vlan_ids.get(&vid) {
            return Ok(Some(*id));
        }

        let url = self.api_url("ipam/vlans/")?;
        let page: Page<Vlan> = self.get_json(&url, &[("vid", vid.to_string())]).await?;

        if page.results.len() > 1 {
            warn!(vid, count = page.results.len(), "multiple NetBox VLANs share this vid, using the first");
        }
        let Some(vlan) = page.results.into_iter().next() else {
            return Ok(None);
        };

        self.vlan_ids.insert(vid, vlan.id);
        Ok(Some(vlan.id))
    }
}
