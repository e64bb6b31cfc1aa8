use std::sync::Arc;

use crate::frame::Table;
use crate::ml::{ModelArtifact, PredictError};
use crate::types::ScoredResult;

#[derive(Debug, Clone, PartialEq)]
pub struct Scores {
    pub probabilities: Vec<f64>,
    pub decisions: Vec<u8>,
}

/// Applies the loaded model and the decision cutoff to normalized tables.
pub struct Scorer {
    model: Arc<ModelArtifact>,
    threshold: f64,
}

impl Scorer {
    pub fn new(model: Arc<ModelArtifact>, threshold: f64) -> Self {
        Self { model, threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn score(&self, table: &Table) -> Result<Scores, PredictError> {
        let proba = match self.model.predict_proba(table) {
            Ok(proba) => proba,
            Err(error) => {
                log::warn!("prediction failed: {}", error);
                log::warn!("incoming columns: {:?}", table.columns());
                for (column, dtype) in table.dtypes() {
                    log::warn!("  {column}: {dtype}");
                }
                return Err(error);
            }
        };

        let probabilities = proba.iter().map(|pair| pair[1]).collect::<Vec<_>>();
        let decisions = probabilities
            .iter()
            .map(|&p| u8::from(p >= self.threshold))
            .collect();

        Ok(Scores {
            probabilities,
            decisions,
        })
    }

    pub fn results(&self, scores: &Scores) -> Vec<ScoredResult> {
        scores
            .probabilities
            .iter()
            .zip(&scores.decisions)
            .map(|(&probability, &prediction)| ScoredResult {
                probability,
                prediction,
                threshold: self.threshold,
            })
            .collect()
    }
}
