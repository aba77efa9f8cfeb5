//! AudioAddict client library for PMOMusic
//!
//! This crate provides a blocking client for the AudioAddict radio network
//! (Sky.fm, DI.fm, JazzRadio.com, RockRadio.com, RadioTunes.com,
//! ClassicalRadio.com, ZenRadio.com): it lists services and channels,
//! resolves a channel to a playable stream URL, and describes the result
//! with the metadata a media host needs.
//!
//! # Features
//!
//! - **Channel Lists**: per service and stream tier, cached until refreshed
//! - **Stream Resolution**: preferred CDN source, else a random one
//! - **Batch Endpoint**: all channels with resolved URLs in one (gzipped) call
//! - **Track History**: recent tracks and "now playing", skipping ads
//! - **Stream URL Cache**: resolve once, reuse until forced, optionally on disk
//! - **Preferences**: YAML file with environment overrides
//!
//! # Example
//!
//! ```no_run
//! use pmoaudioaddict::{AudioAddictClient, StreamUrlCache};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = AudioAddictClient::new()?;
//!     client.select_service("jazz")?;
//!
//!     let mut cache = StreamUrlCache::new();
//!     let keys: Vec<String> = client.batch_info(false)?.iter().map(|c| c.key.clone()).collect();
//!     for key in &keys {
//!         let url = client.stream_url(&mut cache, key, false)?;
//!         println!("{key}: {url}");
//!     }
//!
//!     println!("Now on bebop: {}", client.now_playing("bebop")?);
//!     Ok(())
//! }
//! ```
//!
//! # Usage Constraints
//!
//! A client is owned by one caller and used sequentially. There is no retry
//! and no internal locking; errors are returned to the caller unchanged.

pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod selection;
pub mod services;
pub mod stream_cache;
pub mod tiers;
pub mod transport;

// Re-exports
pub use client::{AudioAddictClient, ClientBuilder, BATCH_AUTHORIZATION, DEFAULT_API_BASE};
pub use config::AudioAddictConfig;
pub use directory::{
    channel_directory, service_menu, AudioCodec, ChannelDirectory, Container, MediaInfo,
    ServiceEntry, TrackItem,
};
pub use error::{Error, Result, UpstreamError};
pub use models::{BatchResponse, Channel, ChannelFilter, HistoryEntry, StreamSource};
pub use services::{HostPrefix, Service, ALL_SERVICES};
pub use stream_cache::{StreamKey, StreamUrlCache};
pub use tiers::{Codec, TierDetails, DEFAULT_TIER};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
