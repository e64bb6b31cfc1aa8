// Membership Propensity API
// Scores customers with a pre-trained binary classifier over HTTP.

mod config;
mod error;
mod frame;
mod http;
mod ml;
mod normalize;
mod scorer;
mod threshold;
mod types;

use std::process::ExitCode;
use std::sync::Arc;

use config::ServiceConfig;
use error::StartupError;

use crate::http::ApiState;
use crate::ml::{extract_required_and_numeric, ModelArtifact};
use crate::scorer::Scorer;
use crate::threshold::{resolve_threshold, DEFAULT_THRESHOLD};

const SERVICE_TITLE: &str = "Membership Propensity API";

fn main() -> ExitCode {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{}", error);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), StartupError> {
    let config = ServiceConfig::from_env();
    let state = build_state(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let shutdown = async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                log::error!("failed to listen for shutdown: {}", error);
            }
            log::info!("shutting down gracefully");
        };

        crate::http::serve(&config.api_addr, state, &config.cors_origin, shutdown).await
    })
}

/// Loads everything the handlers read. Any failure here keeps the service
/// from starting.
fn build_state(config: &ServiceConfig) -> Result<ApiState, StartupError> {
    log::info!(
        "{} v{} starting",
        SERVICE_TITLE,
        env!("CARGO_PKG_VERSION")
    );

    let model = ModelArtifact::load(&config.model_path)?;
    log::info!(
        "loaded model '{}' from {}",
        model.name.as_deref().unwrap_or("unnamed"),
        config.model_path.display()
    );

    let threshold = resolve_threshold(&config.meta_path, DEFAULT_THRESHOLD)?;
    if !(0.0..=1.0).contains(&threshold.value) {
        log::warn!("threshold {} is outside [0, 1]", threshold.value);
    }
    log::info!(
        "decision threshold {} ({:?})",
        threshold.value,
        threshold.source
    );

    let schema = extract_required_and_numeric(&model);
    if schema.required.is_empty() {
        log::warn!("model declares no input columns; requests are passed through unaligned");
    }
    for field in &types::CUSTOMER_FIELDS {
        if !schema.required.iter().any(|column| column == field.column) {
            log::warn!("field '{}' is not used by the model", field.column);
        } else if field.kind == types::FieldKind::Numeric
            && !schema.numeric.iter().any(|column| column == field.column)
        {
            log::warn!("numeric field '{}' is not coerced by the model", field.column);
        }
    }
    log::info!(
        "input schema: {} required, {} numeric",
        schema.required.len(),
        schema.numeric.len()
    );

    Ok(ApiState {
        schema: Arc::new(schema),
        scorer: Arc::new(Scorer::new(Arc::new(model), threshold.value)),
    })
}
