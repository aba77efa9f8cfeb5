//! AudioAddict API client
//!
//! [`AudioAddictClient`] holds one listening session: the selected service,
//! listen key, stream tier and preferred source, plus cached channel lists.
//! It is a single-owner object: every call blocks until the response is in,
//! and the client is not meant to be shared between callers.
//!
//! # Example
//!
//! ```no_run
//! use pmoaudioaddict::AudioAddictClient;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = AudioAddictClient::new()?;
//!     client.select_service("di")?;
//!     client.select_stream_tier("premium_high")?;
//!     client.set_listen_key(Some("0123456789abcdef".into()));
//!
//!     let keys: Vec<String> = client
//!         .channel_list(false)?
//!         .iter()
//!         .map(|c| c.key.clone())
//!         .collect();
//!
//!     for key in keys.iter().take(3) {
//!         println!("{} -> {}", key, client.resolve_stream_url(key)?);
//!     }
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result, UpstreamError};
use crate::models::{BatchResponse, Channel, HistoryEntry};
use crate::selection::{select_source, with_listen_key};
use crate::services::{self, HostPrefix, Service, ALL_SERVICES};
use crate::stream_cache::{StreamKey, StreamUrlCache};
use crate::tiers::{self, TierDetails, DEFAULT_TIER};
use crate::transport::{
    HttpTransport, ReqwestTransport, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default AudioAddict API base URL
pub const DEFAULT_API_BASE: &str = "http://api.audioaddict.com/v1";

/// Shared application credential of the mobile batch endpoint.
///
/// Not tied to any listener; every client sends the same value.
pub const BATCH_AUTHORIZATION: &str = "Basic ZXBoZW1lcm9uOmRheWVpcGgwbmVAcHA=";

/// A channel list together with the (service, tier) it was fetched for
#[derive(Debug, Clone)]
struct ScopedChannels {
    service: Service,
    tier: String,
    channels: Vec<Channel>,
}

impl ScopedChannels {
    fn is_fresh_for(&self, service: Service, tier: &str) -> bool {
        self.service == service && self.tier == tier && !self.channels.is_empty()
    }
}

fn fresh(cache: &Option<ScopedChannels>, service: Service, tier: &str) -> bool {
    cache
        .as_ref()
        .is_some_and(|c| c.is_fresh_for(service, tier))
}

fn cached_slice(cache: &Option<ScopedChannels>) -> &[Channel] {
    cache
        .as_ref()
        .map(|c| c.channels.as_slice())
        .unwrap_or_default()
}

/// AudioAddict session client
pub struct AudioAddictClient {
    transport: Box<dyn HttpTransport>,
    api_base: String,
    timeout: Duration,
    service: Option<Service>,
    listen_key: Option<String>,
    tier: String,
    source_pref: Option<String>,
    channels: Option<ScopedChannels>,
    batch: Option<ScopedChannels>,
    rng: StdRng,
}

impl fmt::Debug for AudioAddictClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioAddictClient")
            .field("api_base", &self.api_base)
            .field("service", &self.service)
            .field("tier", &self.tier)
            .field("listen_key", &self.listen_key.as_ref().map(|_| "<set>"))
            .field("source_pref", &self.source_pref)
            .finish_non_exhaustive()
    }
}

impl AudioAddictClient {
    /// Create a new client with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Create a client over a custom transport, with default settings
    pub fn with_transport(transport: impl HttpTransport + 'static) -> Self {
        Self::from_parts(
            Box::new(transport),
            DEFAULT_API_BASE.to_string(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            StdRng::from_os_rng(),
        )
    }

    fn from_parts(
        transport: Box<dyn HttpTransport>,
        api_base: String,
        timeout: Duration,
        rng: StdRng,
    ) -> Self {
        Self {
            transport,
            api_base,
            timeout,
            service: None,
            listen_key: None,
            tier: DEFAULT_TIER.to_string(),
            source_pref: None,
            channels: None,
            batch: None,
            rng,
        }
    }

    /// Get the API base URL
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// All services of the catalog
    pub fn services() -> &'static [Service] {
        &ALL_SERVICES
    }

    /// Currently selected service
    pub fn service(&self) -> Option<Service> {
        self.service
    }

    /// Select the service all further calls refer to.
    ///
    /// Switching to a different service drops the cached channel and batch
    /// lists. The tier is kept as is: if the new service does not offer it,
    /// every fetch fails with [`Error::InvalidTier`] until a valid tier is
    /// selected.
    pub fn select_service(&mut self, id: &str) -> Result<()> {
        let service: Service = id.parse()?;

        if self.service != Some(service) {
            let had_cache = self.channels.is_some() || self.batch.is_some();
            self.channels = None;
            self.batch = None;
            if had_cache {
                debug!(
                    "Dropped cached channel lists of {:?} on switch to {}",
                    self.service, service
                );
            }
            self.service = Some(service);
        }

        if !tiers::is_valid(service, &self.tier) {
            warn!(
                "Tier '{}' is not offered by {}; select another tier before fetching",
                self.tier, service
            );
        }

        Ok(())
    }

    /// Set the listen key; `None` (or an empty key) means public access.
    ///
    /// A new key drops the cached batch, whose URLs embed the old one.
    pub fn set_listen_key(&mut self, listen_key: Option<String>) {
        let listen_key = listen_key.filter(|k| !k.is_empty());
        if listen_key != self.listen_key && self.batch.take().is_some() {
            debug!("Dropped cached batch on listen key change");
        }
        self.listen_key = listen_key;
    }

    pub fn listen_key(&self) -> Option<&str> {
        self.listen_key.as_deref()
    }

    /// `?listen_key=<token>`, or an empty string without a key
    pub fn listen_key_query(&self) -> String {
        self.listen_key
            .as_deref()
            .map(|k| format!("?listen_key={k}"))
            .unwrap_or_default()
    }

    /// Select the stream tier; it must be offered by the selected service
    pub fn select_stream_tier(&mut self, tier: &str) -> Result<()> {
        let service = self.require_service()?;
        if !tiers::is_valid(service, tier) {
            return Err(Error::InvalidTier {
                service: service.id().to_string(),
                tier: tier.to_string(),
            });
        }
        self.tier = tier.to_string();
        Ok(())
    }

    pub fn stream_tier(&self) -> &str {
        &self.tier
    }

    /// Tiers offered by the selected service
    pub fn valid_stream_tiers(&self) -> Result<Vec<&'static str>> {
        Ok(tiers::valid_tiers(self.require_service()?))
    }

    /// Set a substring that pins source selection to matching URLs
    pub fn set_preferred_source(&mut self, source: Option<String>) {
        self.source_pref = source.filter(|s| !s.is_empty());
    }

    pub fn preferred_source(&self) -> Option<&str> {
        self.source_pref.as_deref()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Display name of `id`, or of the selected service when `id` is `None`
    pub fn service_display_name(&self, id: Option<&str>) -> Result<&'static str> {
        let service = match id {
            Some(id) => id.parse::<Service>()?,
            None => self.require_service()?,
        };
        Ok(service.display_name())
    }

    /// Codec and bitrate of the selected tier, if known
    pub fn stream_tier_details(&self) -> Option<TierDetails> {
        tiers::details(self.service?, &self.tier)
    }

    /// `http://<prefix>.<domain>` of `service`, or of the selected service
    pub fn service_base_url(&self, prefix: HostPrefix, service: Option<Service>) -> Result<String> {
        let service = match service {
            Some(s) => s,
            None => self.require_service()?,
        };
        Ok(services::base_url(prefix, service))
    }

    fn require_service(&self) -> Result<Service> {
        self.service.ok_or(Error::ServiceNotSelected)
    }

    /// Selected service, provided it offers the current tier
    fn require_scope(&self) -> Result<Service> {
        let service = self.require_service()?;
        if !tiers::is_valid(service, &self.tier) {
            return Err(Error::InvalidTier {
                service: service.id().to_string(),
                tier: self.tier.clone(),
            });
        }
        Ok(service)
    }

    // ========================================================================
    // Channel lists
    // ========================================================================

    /// Channel list of the selected service and tier.
    ///
    /// Served from cache unless `force_refresh` is set, the cache is empty,
    /// or it was fetched for another tier.
    pub fn channel_list(&mut self, force_refresh: bool) -> Result<&[Channel]> {
        let service = self.require_scope()?;

        if force_refresh || !fresh(&self.channels, service, &self.tier) {
            let url = format!(
                "{}/{}",
                services::base_url(HostPrefix::Listen, service),
                self.tier
            );
            let channels: Vec<Channel> = self.fetch_json(&url, &[])?;
            info!("Fetched {} channels for {}/{}", channels.len(), service, self.tier);

            self.channels = Some(ScopedChannels {
                service,
                tier: self.tier.clone(),
                channels,
            });
        } else {
            debug!("Using cached channel list for {}/{}", service, self.tier);
        }

        Ok(cached_slice(&self.channels))
    }

    /// Look up a channel in the cached lists; never fetches.
    ///
    /// The plain channel list is searched first, then the batch list.
    pub fn channel_info(&self, key: &str) -> Result<&Channel> {
        cached_slice(&self.channels)
            .iter()
            .chain(cached_slice(&self.batch))
            .find(|c| c.key == key)
            .ok_or_else(|| Error::ChannelNotFound(key.to_string()))
    }

    /// Channel list with resolved stream URLs, from the mobile batch endpoint.
    ///
    /// Only channels of the "All" filter are returned. Channels without an
    /// entry in the stream set keep `stream_url == None`.
    pub fn batch_info(&mut self, force_refresh: bool) -> Result<&[Channel]> {
        let service = self.require_scope()?;

        if force_refresh || !fresh(&self.batch, service, &self.tier) {
            let mut url = Url::parse(&format!(
                "{}/{}/mobile/batch_update",
                self.api_base,
                service.id()
            ))?;
            url.query_pairs_mut().append_pair("stream_set_key", &self.tier);

            let batch: BatchResponse = self.fetch_json(
                url.as_str(),
                &[
                    ("Authorization", BATCH_AUTHORIZATION),
                    ("Accept-Encoding", "gzip"),
                ],
            )?;
            let channels = self.resolve_batch(&batch)?;
            info!(
                "Fetched batch of {} channels for {}/{}",
                channels.len(),
                service,
                self.tier
            );

            self.batch = Some(ScopedChannels {
                service,
                tier: self.tier.clone(),
                channels,
            });
        } else {
            debug!("Using cached batch for {}/{}", service, self.tier);
        }

        Ok(cached_slice(&self.batch))
    }

    fn resolve_batch(&mut self, batch: &BatchResponse) -> Result<Vec<Channel>> {
        let all = batch.all_filter().ok_or(Error::MissingAllFilter)?;

        let mut channels = Vec::with_capacity(all.channels.len());
        for channel in &all.channels {
            let mut channel = channel.clone();
            if let Some(streams) = batch.streams_for(channel.id) {
                channel.stream_url =
                    select_source(streams, self.source_pref.as_deref(), &mut self.rng)
                        .map(|url| with_listen_key(url, self.listen_key.as_deref()));
            }
            channels.push(channel);
        }
        Ok(channels)
    }

    // ========================================================================
    // Stream URLs
    // ========================================================================

    /// Fetch the source list of a channel and pick one URL.
    ///
    /// The first source containing the preferred substring wins; otherwise
    /// one is drawn at random.
    pub fn resolve_stream_url(&mut self, key: &str) -> Result<String> {
        let service = self.require_scope()?;
        let url = format!(
            "{}/{}/{}{}",
            services::base_url(HostPrefix::Listen, service),
            self.tier,
            key,
            self.listen_key_query()
        );

        let sources: Vec<String> = self.fetch_json(&url, &[])?;
        let picked = select_source(
            sources.as_slice(),
            self.source_pref.as_deref(),
            &mut self.rng,
        )
        .ok_or_else(|| Error::NoSourcesAvailable(key.to_string()))?;

        debug!("Resolved {} -> {}", key, picked);
        Ok(picked.to_string())
    }

    /// Resolve once, reuse until forced.
    ///
    /// Looks up (service, tier, key) in `cache` and only calls
    /// [`resolve_stream_url`](Self::resolve_stream_url) on a miss or when
    /// `force_refresh` is set. Entries resolved under another listen key
    /// are discarded first.
    pub fn stream_url(
        &mut self,
        cache: &mut StreamUrlCache,
        key: &str,
        force_refresh: bool,
    ) -> Result<String> {
        let cache_key = StreamKey::new(self.require_scope()?, self.tier.clone(), key);
        cache.bind_listen_key(self.listen_key.as_deref());

        if !force_refresh {
            if let Some(url) = cache.get(&cache_key) {
                return Ok(url.to_string());
            }
        }

        let url = self.resolve_stream_url(key)?;
        cache.insert(cache_key, url.clone());
        Ok(url)
    }

    // ========================================================================
    // Track history
    // ========================================================================

    /// Recent tracks of a channel; the channel must be in a cached list
    pub fn channel_history(&self, key: &str) -> Result<Vec<HistoryEntry>> {
        let service = self.require_service()?;
        let id = self.channel_info(key)?.id;
        let url = format!(
            "{}/{}/track_history/channel/{}",
            self.api_base,
            service.id(),
            id
        );
        self.fetch_json(&url, &[])
    }

    /// "Artist - Title" currently playing, skipping a leading advertisement
    pub fn now_playing(&self, key: &str) -> Result<String> {
        let history = self.channel_history(key)?;
        let index = match history.first() {
            Some(entry) if entry.is_ad() => 1,
            _ => 0,
        };

        history
            .get(index)
            .map(|entry| entry.track.clone())
            .ok_or_else(|| Error::HistoryUnavailable(key.to_string()))
    }

    // ========================================================================
    // HTTP
    // ========================================================================

    fn fetch_json<T: DeserializeOwned>(&self, url: &str, headers: &[(&str, &str)]) -> Result<T> {
        debug!("GET {}", url);

        let response = self.transport.get(url, headers)?;
        if !response.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: response.status,
            }
            .into());
        }

        let body = response.decoded_body()?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Builder for configuring an AudioAddictClient
pub struct ClientBuilder {
    transport: Option<Box<dyn HttpTransport>>,
    api_base: String,
    timeout: Duration,
    user_agent: String,
    proxy: Option<String>,
    seed: Option<u64>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            transport: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            seed: None,
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom transport instead of reqwest
    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Set the API base URL (batch and history endpoints)
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Seed the random source picker (reproducible selection)
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<AudioAddictClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(ReqwestTransport::new(
                self.timeout,
                &self.user_agent,
                self.proxy.as_deref(),
            )?),
        };

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(AudioAddictClient::from_parts(
            transport,
            self.api_base.trim_end_matches('/').to_string(),
            self.timeout,
            rng,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpResponse;

    struct NoNetwork;

    impl HttpTransport for NoNetwork {
        fn get(
            &self,
            url: &str,
            _: &[(&str, &str)],
        ) -> std::result::Result<HttpResponse, UpstreamError> {
            Err(UpstreamError::Transport(format!("unexpected request to {url}")))
        }
    }

    fn client() -> AudioAddictClient {
        AudioAddictClient::builder()
            .transport(NoNetwork)
            .seed(42)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::default();
        assert_eq!(builder.api_base, DEFAULT_API_BASE);
        assert_eq!(
            builder.timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_select_service() {
        let mut client = client();
        for service in AudioAddictClient::services() {
            client.select_service(service.id()).unwrap();
            assert_eq!(client.service_display_name(None).unwrap(), service.display_name());
        }
        assert!(matches!(
            client.select_service("pandora"),
            Err(Error::InvalidService(_))
        ));
        // A failed selection keeps the previous service
        assert_eq!(client.service(), Some(Service::Zen));
    }

    #[test]
    fn test_service_required() {
        let mut client = client();
        assert!(matches!(
            client.select_stream_tier("premium_high"),
            Err(Error::ServiceNotSelected)
        ));
        assert!(matches!(
            client.service_display_name(None),
            Err(Error::ServiceNotSelected)
        ));
        assert!(matches!(
            client.channel_list(false),
            Err(Error::ServiceNotSelected)
        ));
        assert_eq!(client.stream_tier_details(), None);
        assert_eq!(client.service_display_name(Some("jazz")).unwrap(), "JazzRadio.com");
    }

    #[test]
    fn test_select_stream_tier() {
        let mut client = client();
        client.select_service("rock").unwrap();
        client.select_stream_tier("android_premium_high").unwrap();
        assert_eq!(client.stream_tier_details().unwrap().bitrate, 256);

        // Switching to a service without that tier keeps it, and fetches fail
        client.select_service("di").unwrap();
        assert_eq!(client.stream_tier(), "android_premium_high");
        assert_eq!(client.stream_tier_details(), None);
        assert!(matches!(
            client.channel_list(false),
            Err(Error::InvalidTier { service, tier })
                if service == "di" && tier == "android_premium_high"
        ));
        assert!(matches!(
            client.resolve_stream_url("trance"),
            Err(Error::InvalidTier { .. })
        ));

        assert!(matches!(
            client.select_stream_tier("android_premium_high"),
            Err(Error::InvalidTier { .. })
        ));
        client.select_stream_tier(DEFAULT_TIER).unwrap();
        assert_eq!(client.stream_tier_details().unwrap().bitrate, 96);
    }

    #[test]
    fn test_listen_key_query() {
        let mut client = client();
        assert_eq!(client.listen_key_query(), "");
        client.set_listen_key(Some("abc".into()));
        assert_eq!(client.listen_key_query(), "?listen_key=abc");
        client.set_listen_key(Some(String::new()));
        assert_eq!(client.listen_key(), None);
    }

    #[test]
    fn test_service_base_url() {
        let mut client = client();
        assert_eq!(
            client
                .service_base_url(HostPrefix::Www, Some(Service::Zen))
                .unwrap(),
            "http://www.zenradio.com"
        );
        client.select_service("di").unwrap();
        assert_eq!(
            client.service_base_url(HostPrefix::Listen, None).unwrap(),
            "http://listen.di.fm"
        );
    }

    #[test]
    fn test_channel_info_requires_cached_list() {
        let mut client = client();
        client.select_service("di").unwrap();
        assert!(matches!(
            client.channel_info("trance"),
            Err(Error::ChannelNotFound(k)) if k == "trance"
        ));
    }

    #[test]
    fn test_transport_errors_are_upstream() {
        let mut client = client();
        client.select_service("di").unwrap();
        let err = client.resolve_stream_url("trance").unwrap_err();
        assert!(err.is_upstream());
    }

    // ========================================================================
    // Integration Tests (real API calls)
    //
    // Run with: cargo test -p pmoaudioaddict -- --ignored
    // ========================================================================

    #[test]
    #[ignore = "Integration test - calls real AudioAddict API"]
    fn test_public_channel_list() {
        let mut client = AudioAddictClient::new().unwrap();
        client.select_service("di").unwrap();

        let channels = client.channel_list(false).unwrap();
        assert!(!channels.is_empty());
        let key = channels[0].key.clone();

        let url = client.resolve_stream_url(&key).unwrap();
        assert!(url.starts_with("http"));
    }
}
