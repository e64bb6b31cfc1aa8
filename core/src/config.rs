use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_addr: String,
    pub model_path: PathBuf,
    pub meta_path: PathBuf,
    pub cors_origin: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let api_addr = std::env::var("PROPENSITY_API_ADDR")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "127.0.0.1:8000".to_string());

        let model_path = std::env::var("PROPENSITY_MODEL_PATH")
            .ok()
            .and_then(|value| non_empty_path(&value))
            .unwrap_or_else(default_model_path);

        let meta_path = std::env::var("PROPENSITY_META_PATH")
            .ok()
            .and_then(|value| non_empty_path(&value))
            .unwrap_or_else(|| default_meta_path(&model_path));

        let cors_origin =
            std::env::var("PROPENSITY_CORS_ORIGIN").unwrap_or_else(|_| "*".to_string());

        ServiceConfig {
            api_addr,
            model_path,
            meta_path,
            cors_origin,
        }
    }
}

fn non_empty_path(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}

fn default_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("models")
        .join("model.json")
}

fn default_meta_path(model_path: &Path) -> PathBuf {
    model_path
        .parent()
        .map(|dir| dir.join("meta.json"))
        .unwrap_or_else(|| PathBuf::from("meta.json"))
}
