//! AudioAddict service catalog
//!
//! The AudioAddict network runs several branded services that share one API.
//! Each service's display name doubles as its domain (modulo case), so
//! `DI.fm` is served from `listen.di.fm`.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One streaming brand of the AudioAddict network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Sky,
    Di,
    Jazz,
    Rock,
    RadioTunes,
    Classical,
    Zen,
}

impl Service {
    pub const fn id(self) -> &'static str {
        match self {
            Self::Sky => "sky",
            Self::Di => "di",
            Self::Jazz => "jazz",
            Self::Rock => "rock",
            Self::RadioTunes => "radiotunes",
            Self::Classical => "classical",
            Self::Zen => "zen",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Sky => "Sky.fm",
            Self::Di => "DI.fm",
            Self::Jazz => "JazzRadio.com",
            Self::Rock => "RockRadio.com",
            Self::RadioTunes => "RadioTunes.com",
            Self::Classical => "ClassicalRadio.com",
            Self::Zen => "ZenRadio.com",
        }
    }

    /// Domain name, derived from the display name
    pub fn domain(self) -> String {
        self.display_name().to_lowercase()
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Service {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ALL_SERVICES
            .iter()
            .copied()
            .find(|service| service.id() == s)
            .ok_or_else(|| Error::InvalidService(s.to_string()))
    }
}

/// All services in the catalog
pub const ALL_SERVICES: [Service; 7] = [
    Service::Sky,
    Service::Di,
    Service::Jazz,
    Service::Rock,
    Service::RadioTunes,
    Service::Classical,
    Service::Zen,
];

/// Host prefix of a service URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPrefix {
    /// `listen.<domain>`, the channel and source list API
    Listen,
    /// `www.<domain>`, the public website
    Www,
}

impl HostPrefix {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Listen => "listen",
            Self::Www => "www",
        }
    }
}

/// Build `http://<prefix>.<domain>` for a service
pub fn base_url(prefix: HostPrefix, service: Service) -> String {
    format!("http://{}.{}", prefix.as_str(), service.domain())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_from_str() {
        for service in ALL_SERVICES {
            assert_eq!(service.id().parse::<Service>().unwrap(), service);
        }
        assert!(matches!(
            "DI".parse::<Service>(),
            Err(Error::InvalidService(s)) if s == "DI"
        ));
        assert!("".parse::<Service>().is_err());
    }

    #[test]
    fn test_domain_is_lowercased_display_name() {
        assert_eq!(Service::Di.domain(), "di.fm");
        assert_eq!(Service::Jazz.domain(), "jazzradio.com");
        assert_eq!(Service::Classical.domain(), "classicalradio.com");
    }

    #[test]
    fn test_base_url() {
        assert_eq!(base_url(HostPrefix::Listen, Service::Sky), "http://listen.sky.fm");
        assert_eq!(
            base_url(HostPrefix::Www, Service::Rock),
            "http://www.rockradio.com"
        );
    }
}
