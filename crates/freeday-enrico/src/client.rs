//! Async HTTP client for the Enrico JSON API.

use std::{num::NonZeroU32, time::Duration};

use chrono::NaiveDate;
use freeday_core::source::{CalendarSource, SourceCountry, SourceDay};
use governor::{
  Quota, RateLimiter,
  clock::DefaultClock,
  state::{InMemoryState, NotKeyed},
};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  wire::{self, Query, WireCountry, WireHoliday},
};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Connection settings for the Enrico API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnricoConfig {
  pub base_url:            String,
  /// Upper bound on requests sent per second.
  pub requests_per_second: u32,
  pub timeout_secs:        u64,
}

impl Default for EnricoConfig {
  fn default() -> Self {
    Self {
      base_url:            "https://kayaposoft.com/enrico/json/v2.0".into(),
      requests_per_second: 2,
      timeout_secs:        30,
    }
  }
}

/// Rate-limited client for the Enrico holiday service.
pub struct EnricoClient {
  client:   Client,
  base_url: String,
  limiter:  DirectRateLimiter,
}

impl EnricoClient {
  pub fn new(config: &EnricoConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_owned(),
      limiter: RateLimiter::direct(Quota::per_second(per_second)),
    })
  }

  async fn get<T: DeserializeOwned>(&self, query: Query) -> Result<T> {
    self.limiter.until_ready().await;
    let action = query.first().map(|(_, v)| v.clone()).unwrap_or_default();
    debug!(%action, "calling upstream");

    let resp = self.client.get(&self.base_url).query(&query).send().await?;
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
      warn!(%action, %status, "upstream request failed");
      return Err(match wire::rejection(&body) {
        Some(msg) => Error::Rejected(msg),
        None => Error::Status { status, body },
      });
    }
    wire::decode(&body).inspect_err(|e| warn!(%action, error = %e, "unusable upstream response"))
  }

  async fn holidays(&self, query: Query) -> Result<Vec<SourceDay>> {
    let wire: Vec<WireHoliday> = self.get(query).await?;
    wire.into_iter().map(SourceDay::try_from).collect()
  }
}

impl CalendarSource for EnricoClient {
  type Error = Error;

  async fn list_countries(&self) -> Result<Vec<SourceCountry>> {
    let wire: Vec<WireCountry> = self.get(wire::countries_query()).await?;
    Ok(wire.into_iter().map(SourceCountry::from).collect())
  }

  async fn list_year_days(
    &self,
    country: &str,
    year: i32,
    region: Option<&str>,
  ) -> Result<Vec<SourceDay>> {
    self.holidays(wire::year_query(country, year, region)).await
  }

  async fn list_date_range_days(
    &self,
    from: NaiveDate,
    to: NaiveDate,
    country: &str,
    region: Option<&str>,
  ) -> Result<Vec<SourceDay>> {
    self
      .holidays(wire::range_query(from, to, country, region))
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn config_defaults_to_the_public_endpoint() {
    let c = EnricoConfig::default();
    assert!(c.base_url.ends_with("/json/v2.0"));
    assert_eq!(c.requests_per_second, 2);
  }

  #[test]
  fn partial_config_keeps_defaults() {
    let c: EnricoConfig = serde_json::from_str(r#"{"requests_per_second": 5}"#).unwrap();
    assert_eq!(c.requests_per_second, 5);
    assert_eq!(c.timeout_secs, 30);
  }

  #[tokio::test]
  async fn zero_quota_still_admits_requests() {
    let client = EnricoClient::new(&EnricoConfig {
      base_url: "http://localhost:9/".into(),
      requests_per_second: 0,
      timeout_secs: 1,
    })
    .unwrap();
    assert_eq!(client.base_url, "http://localhost:9");
    client.limiter.until_ready().await;
  }
}
