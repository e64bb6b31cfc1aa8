use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

pub const THRESHOLD_ENV: &str = "THRESHOLD";
pub const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Error)]
pub enum ThresholdError {
    #[error("THRESHOLD={0:?} is not a number")]
    InvalidOverride(String),
    #[error("failed to read {}: {source}", .path.display())]
    MetaRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    MetaParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("threshold in {} is not a number: {value}", .path.display())]
    InvalidMetaValue { path: PathBuf, value: Value },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdSource {
    Environment,
    Metadata,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedThreshold {
    pub value: f64,
    pub source: ThresholdSource,
}

/// Resolves the decision cutoff from `THRESHOLD`, then `meta_path`, then
/// `default`.
pub fn resolve_threshold(meta_path: &Path, default: f64) -> Result<ResolvedThreshold, ThresholdError> {
    let env_value = std::env::var(THRESHOLD_ENV).ok();
    resolve_with_override(env_value.as_deref(), meta_path, default)
}

pub fn resolve_with_override(
    env_value: Option<&str>,
    meta_path: &Path,
    default: f64,
) -> Result<ResolvedThreshold, ThresholdError> {
    if let Some(raw) = env_value {
        let value = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ThresholdError::InvalidOverride(raw.to_string()))?;
        return Ok(ResolvedThreshold {
            value,
            source: ThresholdSource::Environment,
        });
    }

    if meta_path.exists() {
        if let Some(value) = read_meta_threshold(meta_path)? {
            return Ok(ResolvedThreshold {
                value,
                source: ThresholdSource::Metadata,
            });
        }
    }

    Ok(ResolvedThreshold {
        value: default,
        source: ThresholdSource::Default,
    })
}

fn read_meta_threshold(path: &Path) -> Result<Option<f64>, ThresholdError> {
    let data = std::fs::read(path).map_err(|source| ThresholdError::MetaRead {
        path: path.to_path_buf(),
        source,
    })?;
    let meta = serde_json::from_slice::<Value>(&data).map_err(|source| ThresholdError::MetaParse {
        path: path.to_path_buf(),
        source,
    })?;

    let Some(raw) = meta.get("threshold") else {
        return Ok(None);
    };

    let invalid = || ThresholdError::InvalidMetaValue {
        path: path.to_path_buf(),
        value: raw.clone(),
    };
    match raw {
        Value::Number(number) => number.as_f64().map(Some).ok_or_else(invalid),
        Value::String(text) => text.trim().parse::<f64>().map(Some).map_err(|_| invalid()),
        Value::Bool(flag) => Ok(Some(if *flag { 1.0 } else { 0.0 })),
        _ => Err(invalid()),
    }
}
