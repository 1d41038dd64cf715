//! Best-effort IP geolocation
//!
//! Lookups are bounded by a client timeout and never fail: any error
//! degrades to [`GeoLocation::unknown`].

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GeoConfig;
use crate::domain::GeoLocation;

const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait GeoLocator: Send + Sync {
    /// Resolve `ip`, going to the network if needed.
    async fn locate(&self, ip: &str) -> GeoLocation;

    /// Previously resolved location, without any I/O.
    fn cached(&self, ip: &str) -> Option<GeoLocation>;
}

/// Addresses worth sending to an external service
pub fn is_public_ip(ip: &str) -> bool {
    match ip.parse::<IpAddr>().map(|ip| ip.to_canonical()) {
        Ok(IpAddr::V4(v4)) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_unspecified()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation())
        }
        Ok(IpAddr::V6(v6)) => {
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
        Err(_) => false,
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    country_name: Option<String>,
    city: Option<String>,
    region: Option<String>,
    timezone: Option<String>,
    #[serde(default)]
    error: bool,
}

impl IpApiResponse {
    fn into_location(self) -> Option<GeoLocation> {
        if self.error {
            return None;
        }
        let unknown = || crate::domain::session::model::UNKNOWN.to_string();
        Some(GeoLocation {
            country: self.country_name.unwrap_or_else(unknown),
            city: self.city.unwrap_or_else(unknown),
            region: self.region.unwrap_or_else(unknown),
            timezone: self.timezone.unwrap_or_else(unknown),
        })
    }
}

/// ipapi.co style client (`GET {base_url}/{ip}/json/`) with a TTL cache
pub struct IpApiLocator {
    client: Client,
    base_url: String,
    ttl: Duration,
    capacity: usize,
    cache: DashMap<String, (GeoLocation, Instant)>,
}

impl IpApiLocator {
    pub fn new(config: &GeoConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ttl: Duration::from_secs(config.cache_ttl_secs),
            capacity: config.cache_capacity.max(1),
            cache: DashMap::new(),
        })
    }

    async fn fetch(&self, ip: &str) -> Result<Option<GeoLocation>, reqwest::Error> {
        let url = format!("{}/{}/json/", self.base_url, ip);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: IpApiResponse = response.json().await?;
        Ok(body.into_location())
    }

    /// Insert, purging expired entries first when the cache is full. If it
    /// is still full the oldest entry makes room.
    fn remember(&self, ip: &str, location: GeoLocation) {
        if self.cache.len() >= self.capacity && !self.cache.contains_key(ip) {
            let ttl = self.ttl;
            self.cache.retain(|_, (_, at)| at.elapsed() < ttl);

            if self.cache.len() >= self.capacity {
                let oldest = self
                    .cache
                    .iter()
                    .min_by_key(|entry| entry.value().1)
                    .map(|entry| entry.key().clone());
                if let Some(key) = oldest {
                    self.cache.remove(&key);
                }
            }
        }
        self.cache.insert(ip.to_string(), (location, Instant::now()));
    }
}

#[async_trait]
impl GeoLocator for IpApiLocator {
    async fn locate(&self, ip: &str) -> GeoLocation {
        if !is_public_ip(ip) {
            return GeoLocation::unknown();
        }
        if let Some(hit) = self.cached(ip) {
            return hit;
        }

        match self.fetch(ip).await {
            Ok(Some(location)) => {
                debug!(ip = %ip, country = %location.country, "Resolved IP location");
                self.remember(ip, location.clone());
                location
            }
            Ok(None) => GeoLocation::unknown(),
            Err(e) => {
                warn!(ip = %ip, error = %e, "Geolocation lookup failed");
                GeoLocation::unknown()
            }
        }
    }

    fn cached(&self, ip: &str) -> Option<GeoLocation> {
        let entry = self.cache.get(ip)?;
        let (location, at) = entry.value();
        if at.elapsed() < self.ttl {
            Some(location.clone())
        } else {
            drop(entry);
            self.cache.remove(ip);
            None
        }
    }
}

/// Fixed table, no network. Used when lookups are disabled and in tests.
#[derive(Default)]
pub struct StaticGeoLocator {
    entries: HashMap<String, GeoLocation>,
}

impl StaticGeoLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ip: &str, location: GeoLocation) -> Self {
        self.entries.insert(ip.to_string(), location);
        self
    }
}

#[async_trait]
impl GeoLocator for StaticGeoLocator {
    async fn locate(&self, ip: &str) -> GeoLocation {
        self.cached(ip).unwrap_or_default()
    }

    fn cached(&self, ip: &str) -> Option<GeoLocation> {
        self.entries.get(ip).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kyiv() -> GeoLocation {
        GeoLocation {
            country: "Ukraine".into(),
            city: "Kyiv".into(),
            region: "Kyiv City".into(),
            timezone: "Europe/Kyiv".into(),
        }
    }

    fn unreachable_config(ttl: u64) -> GeoConfig {
        GeoConfig {
            enabled: true,
            base_url: "http://127.0.0.1:9".into(),
            timeout_ms: 300,
            cache_ttl_secs: ttl,
            cache_capacity: 2,
        }
    }

    #[test]
    fn private_addresses_are_not_public() {
        assert!(!is_public_ip("127.0.0.1"));
        assert!(!is_public_ip("10.0.0.5"));
        assert!(!is_public_ip("192.168.1.10"));
        assert!(!is_public_ip("::1"));
        assert!(!is_public_ip("fd00::1"));
        assert!(!is_public_ip("::ffff:127.0.0.1"));
        assert!(!is_public_ip("garbage"));
        assert!(is_public_ip("8.8.8.8"));
        assert!(is_public_ip("2a00:1450::1"));
    }

    #[test]
    fn response_mapping_fills_gaps() {
        let body: IpApiResponse =
            serde_json::from_str(r#"{"country_name":"Ukraine","city":null}"#).unwrap();
        let geo = body.into_location().unwrap();
        assert_eq!(geo.country, "Ukraine");
        assert_eq!(geo.city, "Unknown");

        let failed: IpApiResponse =
            serde_json::from_str(r#"{"error":true,"reason":"RateLimited"}"#).unwrap();
        assert!(failed.into_location().is_none());
    }

    #[tokio::test]
    async fn lookup_failure_degrades_to_unknown() {
        let locator = IpApiLocator::new(&unreachable_config(60)).unwrap();
        assert_eq!(locator.locate("8.8.8.8").await, GeoLocation::unknown());
        assert_eq!(locator.locate("10.0.0.5").await, GeoLocation::unknown());
        assert!(locator.cached("8.8.8.8").is_none());
    }

    #[tokio::test]
    async fn cache_is_served_until_ttl() {
        let locator = IpApiLocator::new(&unreachable_config(60)).unwrap();
        locator.remember("8.8.8.8", kyiv());
        assert_eq!(locator.cached("8.8.8.8"), Some(kyiv()));
        assert_eq!(locator.locate("8.8.8.8").await, kyiv());

        let expired = IpApiLocator::new(&unreachable_config(0)).unwrap();
        expired.remember("8.8.8.8", kyiv());
        assert!(expired.cached("8.8.8.8").is_none());
    }

    #[test]
    fn cache_stays_within_capacity() {
        let expired = IpApiLocator::new(&unreachable_config(0)).unwrap();
        for ip in ["8.8.8.8", "8.8.4.4", "1.1.1.1", "9.9.9.9"] {
            expired.remember(ip, kyiv());
        }
        assert!(expired.cache.len() <= 2);
        assert!(expired.cache.contains_key("9.9.9.9"));

        let live = IpApiLocator::new(&unreachable_config(60)).unwrap();
        live.remember("8.8.8.8", kyiv());
        std::thread::sleep(Duration::from_millis(5));
        live.remember("8.8.4.4", kyiv());
        live.remember("1.1.1.1", kyiv());
        assert_eq!(live.cache.len(), 2);
        assert!(live.cached("8.8.8.8").is_none());
        assert_eq!(live.cached("8.8.4.4"), Some(kyiv()));
        assert_eq!(live.cached("1.1.1.1"), Some(kyiv()));
    }

    #[tokio::test]
    async fn static_locator() {
        let locator = StaticGeoLocator::new().with("1.2.3.4", kyiv());
        assert_eq!(locator.locate("1.2.3.4").await, kyiv());
        assert_eq!(locator.locate("5.6.7.8").await, GeoLocation::unknown());
    }
}
