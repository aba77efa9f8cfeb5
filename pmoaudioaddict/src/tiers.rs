//! Stream tier catalog
//!
//! A tier (`stream_set_key` in API terms) names a fixed codec/bitrate
//! profile. Most tiers are offered by every service; a few are service
//! specific.

use crate::services::Service;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tier available on every service, used as the default.
pub const DEFAULT_TIER: &str = "public3";

/// Audio codec of a stream tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Mp3,
    Aac,
    Wma,
}

impl Codec {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Wma => "wma",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Codec and bitrate of a tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDetails {
    pub codec: Codec,
    /// Bitrate in kbps
    pub bitrate: u32,
}

impl TierDetails {
    const fn new(codec: Codec, bitrate: u32) -> Self {
        Self { codec, bitrate }
    }
}

#[derive(Debug, Clone, Copy)]
struct TierDescriptor {
    key: &'static str,
    details: TierDetails,
    /// `None` when every service offers the tier
    only: Option<Service>,
}

const fn common(key: &'static str, codec: Codec, bitrate: u32) -> TierDescriptor {
    TierDescriptor {
        key,
        details: TierDetails::new(codec, bitrate),
        only: None,
    }
}

const TIERS: [TierDescriptor; 10] = [
    common("public1", Codec::Aac, 64),
    common("public2", Codec::Aac, 40),
    common("public3", Codec::Mp3, 96),
    common("premium_low", Codec::Aac, 40),
    common("premium_medium", Codec::Aac, 64),
    common("premium", Codec::Aac, 128),
    common("premium_high", Codec::Mp3, 256),
    common("premium_wma_low", Codec::Wma, 64),
    common("premium_wma", Codec::Wma, 128),
    TierDescriptor {
        key: "android_premium_high",
        details: TierDetails::new(Codec::Mp3, 256),
        only: Some(Service::Rock),
    },
];

fn descriptor(service: Service, tier: &str) -> Option<&'static TierDescriptor> {
    TIERS
        .iter()
        .find(|d| d.key == tier && d.only.map_or(true, |s| s == service))
}

/// Whether `tier` can be selected for `service`
pub fn is_valid(service: Service, tier: &str) -> bool {
    descriptor(service, tier).is_some()
}

/// Codec and bitrate for (service, tier)
pub fn details(service: Service, tier: &str) -> Option<TierDetails> {
    descriptor(service, tier).map(|d| d.details)
}

/// Tier keys offered by a service, in catalog order
pub fn valid_tiers(service: Service) -> Vec<&'static str> {
    TIERS
        .iter()
        .filter(|d| d.only.map_or(true, |s| s == service))
        .map(|d| d.key)
        .collect()
}
