//! Configuration: the YAML file read by the binary, and the [`PipelineSettings`]
//! the library runs with.

use crate::publish::Topics;
use crate::quota::{LimiterKind, QuotaPolicy};
use crate::retrieval::RetryPolicy;
use bon::Builder;
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the provider API key.
pub const API_TOKEN_ENV: &str = "API_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] serde_yaml::Error),

    #[error("Environment variable {0} is not set")]
    MissingToken(&'static str),

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn default_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(11, 30, 0).unwrap_or(NaiveTime::MIN)
}

fn default_schedule_time() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 30, 0).unwrap_or(NaiveTime::MIN)
}

/// Everything a cycle needs besides its collaborators. Defaults are the reference
/// values the provider's quota was tuned against.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct PipelineSettings {
    #[builder(default)]
    pub quota: QuotaPolicy,
    /// Requests allowed in flight at once across all stations.
    #[builder(default = 1)]
    pub max_in_flight: usize,
    #[builder(default)]
    pub retry: RetryPolicy,
    #[builder(default = 5)]
    pub max_passes: u32,
    #[builder(default = Duration::from_secs(60))]
    pub pass_cooldown: Duration,
    #[builder(default = Duration::from_secs(60))]
    pub batch_cooldown: Duration,
    /// Wait after taking and before releasing the lock, letting the quota refill.
    #[builder(default = Duration::from_secs(60))]
    pub quota_refresh: Duration,
    /// Before this time of day (UTC) only the early hours of yesterday are certified.
    #[builder(default = default_cutoff())]
    pub cutoff: NaiveTime,
    #[builder(default = crate::parsing::table::DEFAULT_DELIMITER)]
    pub delimiter: u8,
    #[builder(default)]
    pub topics: Topics,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The `pipeline:` section of the config file. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    pub limiter: LimiterKind,
    pub request_spacing_secs: f64,
    pub requests_per_minute: u32,
    pub quota_penalty_secs: f64,
    pub max_in_flight: usize,
    pub max_attempts: u32,
    pub transport_backoff_secs: f64,
    pub max_passes: u32,
    pub pass_cooldown_secs: f64,
    pub batch_cooldown_secs: f64,
    pub quota_refresh_secs: f64,
    #[serde(deserialize_with = "deserialize_hour_minute")]
    pub cutoff: NaiveTime,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            limiter: LimiterKind::Fixed,
            request_spacing_secs: 2.5,
            requests_per_minute: 50,
            quota_penalty_secs: 90.0,
            max_in_flight: 1,
            max_attempts: 3,
            transport_backoff_secs: 5.0,
            max_passes: 5,
            pass_cooldown_secs: 60.0,
            batch_cooldown_secs: 60.0,
            quota_refresh_secs: 60.0,
            cutoff: default_cutoff(),
        }
    }
}

/// The producer's YAML config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProducerConfig {
    pub api_url: String,
    /// HTTP timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: f64,
    #[serde(default = "default_batch_file")]
    pub batch_file: PathBuf,
    #[serde(default = "default_record_topic")]
    pub record_topic: String,
    #[serde(default = "default_status_topic")]
    pub status_topic: String,
    /// Local time of day the daily cycle starts.
    #[serde(
        default = "default_schedule_time",
        deserialize_with = "deserialize_hour_minute"
    )]
    pub schedule_time: NaiveTime,
    #[serde(default)]
    pub pipeline: PipelineSection,
}

fn default_fetch_timeout() -> f64 {
    30.0
}

fn default_batch_file() -> PathBuf {
    PathBuf::from("utils/batches.json")
}

fn default_record_topic() -> String {
    Topics::default().records
}

fn default_status_topic() -> String {
    Topics::default().status
}

fn deserialize_hour_minute<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .map_err(serde::de::Error::custom)
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })
}

fn at_least_one<T: PartialOrd + From<u8>>(field: &'static str, value: T) -> Result<T, ConfigError> {
    if value < T::from(1) {
        return Err(ConfigError::Invalid {
            field,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

impl ProducerConfig {
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_yaml(&text, path)
    }

    fn from_yaml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn fetch_timeout(&self) -> Result<Duration, ConfigError> {
        let timeout = seconds("fetch_timeout", self.fetch_timeout)?;
        if timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "fetch_timeout",
                reason: "must be positive".to_string(),
            });
        }
        Ok(timeout)
    }

    /// Converts the file's tunables into validated runtime settings.
    pub fn pipeline_settings(&self) -> Result<PipelineSettings, ConfigError> {
        let section = &self.pipeline;
        Ok(PipelineSettings::builder()
            .quota(QuotaPolicy {
                kind: section.limiter,
                request_spacing: seconds("request_spacing_secs", section.request_spacing_secs)?,
                requests_per_minute: at_least_one(
                    "requests_per_minute",
                    section.requests_per_minute,
                )?,
                penalty: seconds("quota_penalty_secs", section.quota_penalty_secs)?,
            })
            .max_in_flight(at_least_one("max_in_flight", section.max_in_flight)?)
            .retry(RetryPolicy {
                max_attempts: at_least_one("max_attempts", section.max_attempts)?,
                backoff_step: seconds("transport_backoff_secs", section.transport_backoff_secs)?,
            })
            .max_passes(at_least_one("max_passes", section.max_passes)?)
            .pass_cooldown(seconds("pass_cooldown_secs", section.pass_cooldown_secs)?)
            .batch_cooldown(seconds("batch_cooldown_secs", section.batch_cooldown_secs)?)
            .quota_refresh(seconds("quota_refresh_secs", section.quota_refresh_secs)?)
            .cutoff(section.cutoff)
            .topics(Topics {
                records: self.record_topic.clone(),
                status: self.status_topic.clone(),
            })
            .build())
    }
}

/// Reads the provider API key from [`API_TOKEN_ENV`].
pub fn api_token_from_env() -> Result<String, ConfigError> {
    std::env::var(API_TOKEN_ENV)
        .ok()
        .filter(|token| !token.trim().is_empty())
        .ok_or(ConfigError::MissingToken(API_TOKEN_ENV))
}
