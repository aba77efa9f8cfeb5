//! Data models for AudioAddict API responses

use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a string that the API sometimes sends as `null`
fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a field whose presence matters more than its value: a
/// present `null` is `Some(Value::Null)`, only an absent field is `None`
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

// ============================================================================
// Channels
// ============================================================================

/// A channel of a service, as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Unique key, used in stream URLs (e.g. "trance")
    pub key: String,
    /// Numeric id, used for track history
    pub id: u64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub description: String,
    /// Artwork URL, usually protocol-relative (`//static.audioaddict.com/...`)
    #[serde(default, deserialize_with = "nullable_string")]
    pub asset_url: String,
    /// Stream URL chosen by the batch endpoint, if any
    #[serde(default, skip_deserializing)]
    pub stream_url: Option<String>,
}

impl Channel {
    /// Artwork URL with an explicit scheme, or `None` if the channel has no asset
    pub fn thumbnail_url(&self) -> Option<String> {
        if self.asset_url.is_empty() {
            None
        } else if self.asset_url.starts_with("//") {
            Some(format!("http:{}", self.asset_url))
        } else {
            Some(self.asset_url.clone())
        }
    }
}

// ============================================================================
// Track history
// ============================================================================

/// One entry of a channel's track history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// "Artist - Title"
    #[serde(default, deserialize_with = "nullable_string")]
    pub track: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Unix timestamp at which the track started
    #[serde(default)]
    pub started: Option<i64>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<i64>,
    /// Present on advertisement entries, whatever its value (even `null`)
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub ad: Option<serde_json::Value>,
}

impl HistoryEntry {
    pub fn is_ad(&self) -> bool {
        self.ad.is_some()
    }
}

// ============================================================================
// Batch update endpoint
// ============================================================================

/// Response of `/{service}/mobile/batch_update`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub channel_filters: Vec<ChannelFilter>,
    #[serde(default)]
    pub stream_sets: Vec<StreamSet>,
}

/// A named grouping of channels ("All", "Featured", genre filters...)
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelFilter {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamSet {
    pub streamlist: StreamList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamList {
    #[serde(default)]
    pub channels: Vec<StreamListChannel>,
}

/// Streams offered for one channel in a stream set
#[derive(Debug, Clone, Deserialize)]
pub struct StreamListChannel {
    pub id: u64,
    #[serde(default)]
    pub streams: Vec<StreamSource>,
}

/// One interchangeable source URL for a channel/tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    pub url: String,
}

impl AsRef<str> for StreamSource {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl BatchResponse {
    /// The filter named exactly "All"
    pub fn all_filter(&self) -> Option<&ChannelFilter> {
        self.channel_filters.iter().find(|f| f.name == "All")
    }

    /// Streams listed for a channel id in the first stream set
    pub fn streams_for(&self, id: u64) -> Option<&[StreamSource]> {
        self.stream_sets
            .first()?
            .streamlist
            .channels
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.streams.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_deserialization() {
        let channel: Channel = serde_json::from_value(json!({
            "id": 1,
            "key": "trance",
            "name": "Trance",
            "description": null,
            "asset_url": "//static.audioaddict.com/trance.png",
            "playlist": "http://listen.di.fm/public3/trance.pls"
        }))
        .unwrap();

        assert_eq!(channel.key, "trance");
        assert_eq!(channel.description, "");
        assert_eq!(channel.stream_url, None);
        assert_eq!(
            channel.thumbnail_url().as_deref(),
            Some("http://static.audioaddict.com/trance.png")
        );
    }

    #[test]
    fn test_history_ad_detection() {
        let entries: Vec<HistoryEntry> = serde_json::from_value(json!([
            {"ad": true, "track": "X"},
            {"track": "Artist - Title", "artist": "Artist", "title": "Title"}
        ]))
        .unwrap();

        assert!(entries[0].is_ad());
        assert!(!entries[1].is_ad());
        assert_eq!(entries[1].artist.as_deref(), Some("Artist"));
    }

    #[test]
    fn test_history_null_ad_is_present() {
        let entries: Vec<HistoryEntry> = serde_json::from_value(json!([
            {"ad": null, "track": "X"},
            {"ad": false, "track": "Y"},
            {"track": "Artist - Title"}
        ]))
        .unwrap();

        assert!(entries[0].is_ad());
        assert!(entries[1].is_ad());
        assert!(!entries[2].is_ad());
    }

    #[test]
    fn test_batch_lookup() {
        let batch: BatchResponse = serde_json::from_value(json!({
            "channel_filters": [
                {"name": "Featured", "channels": []},
                {"name": "All", "channels": [{"id": 7, "key": "house", "name": "House"}]}
            ],
            "stream_sets": [
                {"streamlist": {"channels": [{"id": 7, "streams": [{"url": "http://a/house"}]}]}}
            ]
        }))
        .unwrap();

        assert_eq!(batch.all_filter().unwrap().channels.len(), 1);
        assert_eq!(batch.streams_for(7).unwrap()[0].url, "http://a/house");
        assert!(batch.streams_for(8).is_none());
    }
}
