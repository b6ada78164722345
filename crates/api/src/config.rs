//! Service configuration, read from the environment supplied by the
//! deployment layer.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const MODEL_PATH_ENV: &str = "MODEL_PATH";
pub const BIND_ADDR_ENV: &str = "BIND_ADDR";
pub const WORKER_THREADS_ENV: &str = "WORKER_THREADS";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const MAX_BATCH_SIZE_ENV: &str = "MAX_BATCH_SIZE";
pub const MAX_BODY_BYTES_ENV: &str = "MAX_BODY_BYTES";
pub const FAILURE_THRESHOLD_ENV: &str = "INFERENCE_FAILURE_THRESHOLD";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub bind_addr: SocketAddr,
    /// `None` keeps the runtime default (one worker per core).
    pub worker_threads: Option<usize>,
    pub request_timeout: Duration,
    pub max_batch_size: usize,
    pub max_body_bytes: usize,
    /// Consecutive inference failures that demote readiness.
    pub inference_failure_threshold: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("deploy/iris-model.json"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            worker_threads: None,
            request_timeout: Duration::from_secs(30),
            max_batch_size: 100,
            max_body_bytes: 256 * 1024,
            inference_failure_threshold: 5,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; unset or blank variables keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let model_path = get(MODEL_PATH_ENV).map(PathBuf::from).unwrap_or(defaults.model_path);

        let bind_addr = match get(BIND_ADDR_ENV) {
            Some(v) => parse(BIND_ADDR_ENV, &v)?,
            None => defaults.bind_addr,
        };

        let worker_threads = match get(WORKER_THREADS_ENV) {
            Some(v) => Some(positive(WORKER_THREADS_ENV, &v)?),
            None => None,
        };

        let request_timeout = match get(REQUEST_TIMEOUT_ENV) {
            Some(v) => Duration::from_secs(positive(REQUEST_TIMEOUT_ENV, &v)?),
            None => defaults.request_timeout,
        };

        let max_batch_size = match get(MAX_BATCH_SIZE_ENV) {
            Some(v) => positive(MAX_BATCH_SIZE_ENV, &v)?,
            None => defaults.max_batch_size,
        };

        let max_body_bytes = match get(MAX_BODY_BYTES_ENV) {
            Some(v) => positive(MAX_BODY_BYTES_ENV, &v)?,
            None => defaults.max_body_bytes,
        };

        let inference_failure_threshold = match get(FAILURE_THRESHOLD_ENV) {
            Some(v) => positive(FAILURE_THRESHOLD_ENV, &v)?,
            None => defaults.inference_failure_threshold,
        };

        Ok(Self {
            model_path,
            bind_addr,
            worker_threads,
            request_timeout,
            max_batch_size,
            max_body_bytes,
            inference_failure_threshold,
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn positive<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
    T::Err: fmt::Display,
{
    let parsed: T = parse(var, value)?;
    if parsed == T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}
