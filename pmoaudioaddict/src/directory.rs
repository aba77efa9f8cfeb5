//! Browsable menu objects
//!
//! A media host shows one entry per service, then one playable item per
//! channel. These types carry what such a host needs (title, summary,
//! thumbnail, container, codec, bitrate) without tying the crate to any
//! particular host API.

use crate::client::AudioAddictClient;
use crate::config::AudioAddictConfig;
use crate::error::{Error, Result};
use crate::models::Channel;
use crate::services::ALL_SERVICES;
use crate::stream_cache::{StreamKey, StreamUrlCache};
use crate::tiers::{Codec, TierDetails};
use serde::Serialize;
use tracing::{debug, warn};

/// Top-level menu entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    pub id: &'static str,
    pub title: &'static str,
}

/// One entry per service, sorted by display name
pub fn service_menu() -> Vec<ServiceEntry> {
    let mut entries: Vec<ServiceEntry> = ALL_SERVICES
        .iter()
        .map(|s| ServiceEntry {
            id: s.id(),
            title: s.display_name(),
        })
        .collect();
    entries.sort_by(|a, b| a.title.cmp(b.title));
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp3,
    Mp4,
    Asf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Mp3,
    Aac,
    Wma,
}

/// Playback description of a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaInfo {
    pub container: Container,
    pub audio_codec: AudioCodec,
    pub bitrate: u32,
    pub audio_channels: u8,
    pub optimized_for_streaming: bool,
}

impl From<TierDetails> for MediaInfo {
    fn from(details: TierDetails) -> Self {
        let (container, audio_codec) = match details.codec {
            Codec::Mp3 => (Container::Mp3, AudioCodec::Mp3),
            Codec::Aac => (Container::Mp4, AudioCodec::Aac),
            Codec::Wma => (Container::Asf, AudioCodec::Wma),
        };
        Self {
            container,
            audio_codec,
            bitrate: details.bitrate,
            audio_channels: 2,
            optimized_for_streaming: true,
        }
    }
}

/// A playable channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackItem {
    pub key: String,
    pub url: String,
    pub title: String,
    pub summary: String,
    pub thumb: Option<String>,
    pub media: MediaInfo,
}

impl TrackItem {
    /// Build an item; `debug` appends codec, bitrate and URL to the summary
    pub fn new(channel: &Channel, url: String, details: TierDetails, debug: bool) -> Self {
        let mut summary = vec![channel.description.clone()];
        if debug {
            summary.push(format!("[{}, {}]", details.codec, details.bitrate));
            summary.push(format!("[{}]", url));
        }

        Self {
            key: channel.key.clone(),
            title: channel.name.clone(),
            summary: summary.join(" "),
            thumb: channel.thumbnail_url(),
            media: details.into(),
            url,
        }
    }
}

/// Channel listing of one service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelDirectory {
    pub title: String,
    pub items: Vec<TrackItem>,
}

/// Build the channel listing of `service` using the configured preferences.
///
/// Channels come from the batch endpoint. Each URL is taken from `cache`
/// unless `config.force_refresh` is set; on a miss the batch-provided URL is
/// used, falling back to a per-channel resolution. Channels whose URL cannot
/// be resolved are skipped. A cache filled under another listen key is
/// emptied first.
pub fn channel_directory(
    client: &mut AudioAddictClient,
    cache: &mut StreamUrlCache,
    config: &AudioAddictConfig,
    service: &str,
) -> Result<ChannelDirectory> {
    config.apply(client, service)?;
    cache.bind_listen_key(client.listen_key());

    let title = client.service_display_name(None)?.to_string();
    let details = client
        .stream_tier_details()
        .ok_or_else(|| Error::InvalidTier {
            service: service.to_string(),
            tier: client.stream_tier().to_string(),
        })?;

    let channels = client.batch_info(true)?.to_vec();
    let mut items = Vec::with_capacity(channels.len());

    for channel in &channels {
        match channel_url(client, cache, channel, config.force_refresh) {
            Ok(url) => {
                if config.debug {
                    debug!("saving {} -> {}", channel.key, url);
                }
                items.push(TrackItem::new(channel, url, details, config.debug));
            }
            Err(e) => warn!("Skipping channel {}: {}", channel.key, e),
        }
    }

    items.sort_by(|a, b| a.title.cmp(&b.title));
    Ok(ChannelDirectory { title, items })
}

fn channel_url(
    client: &mut AudioAddictClient,
    cache: &mut StreamUrlCache,
    channel: &Channel,
    force_refresh: bool,
) -> Result<String> {
    match (&channel.stream_url, client.service()) {
        (Some(url), Some(service)) => {
            let key = StreamKey::new(service, client.stream_tier(), channel.key.as_str());
            if !force_refresh {
                if let Some(cached) = cache.get(&key) {
                    return Ok(cached.to_string());
                }
            }
            cache.insert(key, url.clone());
            Ok(url.clone())
        }
        _ => client.stream_url(cache, &channel.key, force_refresh),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn channel() -> Channel {
        serde_json::from_value(json!({
            "id": 3,
            "key": "lounge",
            "name": "Lounge",
            "description": "Chill",
            "asset_url": "//static.audioaddict.com/lounge.png"
        }))
        .unwrap()
    }

    #[test]
    fn test_service_menu_sorted() {
        let menu = service_menu();
        assert_eq!(menu.len(), ALL_SERVICES.len());
        assert_eq!(menu[0].title, "ClassicalRadio.com");
        assert!(menu.windows(2).all(|w| w[0].title <= w[1].title));
    }

    #[test]
    fn test_media_info_from_codec() {
        let aac = MediaInfo::from(TierDetails {
            codec: Codec::Aac,
            bitrate: 64,
        });
        assert_eq!(aac.container, Container::Mp4);
        assert_eq!(aac.audio_codec, AudioCodec::Aac);
        assert_eq!(aac.audio_channels, 2);
    }

    #[test]
    fn test_track_item_summary() {
        let details = TierDetails {
            codec: Codec::Mp3,
            bitrate: 96,
        };

        let plain = TrackItem::new(&channel(), "http://a/1".into(), details, false);
        assert_eq!(plain.summary, "Chill");
        assert_eq!(plain.thumb.as_deref(), Some("http://static.audioaddict.com/lounge.png"));

        let verbose = TrackItem::new(&channel(), "http://a/1".into(), details, true);
        assert_eq!(verbose.summary, "Chill [mp3, 96] [http://a/1]");
    }
}
