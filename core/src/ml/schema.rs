use std::collections::HashSet;

use serde::Serialize;

use crate::ml::artifact::{ColumnSelector, ModelArtifact};

/// Column contract derived from the loaded artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InputSchema {
    pub required: Vec<String>,
    pub numeric: Vec<String>,
}

/// Walks the preprocessor branches once and collects the columns every
/// request has to be reshaped to. Only explicit name lists on a branch named
/// `num` (any case) mark columns as numeric. Selectors that cannot be expanded
/// are skipped. An artifact without a preprocessor yields an empty schema.
pub fn extract_required_and_numeric(model: &ModelArtifact) -> InputSchema {
    let Some(pre) = model.preprocessor.as_ref() else {
        return InputSchema::default();
    };

    let mut required = Vec::new();
    let mut numeric = Vec::new();

    for branch in &pre.transformers {
        let Some(selector) = branch.columns.as_ref() else {
            continue;
        };

        match selector {
            ColumnSelector::Names(names) => {
                required.extend(names.iter().cloned());
                if branch.name.eq_ignore_ascii_case("num") {
                    numeric.extend(names.iter().cloned());
                }
            }
            other => {
                if let Some(names) = other.expand(pre.feature_names_in.as_deref()) {
                    required.extend(names);
                } else {
                    log::debug!(
                        "skipping branch '{}': column selector is not expandable",
                        branch.name
                    );
                }
            }
        }
    }

    InputSchema {
        required: dedup(required),
        numeric: dedup(numeric),
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn load(name: &str) -> ModelArtifact {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name);
        ModelArtifact::load(&path).unwrap()
    }

    #[test]
    fn customer_pipeline_columns() {
        let schema = extract_required_and_numeric(&load("model.json"));

        assert_eq!(
            schema.required,
            vec![
                "Age",
                "Purchase Amount (USD)",
                "Review Rating",
                "Previous Purchases",
                "Gender",
                "Location",
                "Payment Method",
                "Frequency of Purchases",
            ]
        );
        assert_eq!(
            schema.numeric,
            vec![
                "Age",
                "Purchase Amount (USD)",
                "Review Rating",
                "Previous Purchases"
            ]
        );
    }

    #[test]
    fn mixed_selectors_are_expanded_or_skipped() {
        let schema = extract_required_and_numeric(&load("model_mixed_selectors.json"));

        assert_eq!(
            schema.required,
            vec!["Age", "Review Rating", "Gender", "Location", "Tenure"]
        );
        // Index selectors never count as numeric, even on a numeric-looking branch.
        assert_eq!(schema.numeric, vec!["Age", "Review Rating"]);
    }

    #[test]
    fn required_has_no_duplicates() {
        let schema = extract_required_and_numeric(&load("model_mixed_selectors.json"));
        let unique = schema.required.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), schema.required.len());
    }

    #[test]
    fn bare_classifier_has_empty_schema() {
        let schema = extract_required_and_numeric(&load("model_without_preprocessor.json"));
        assert!(schema.required.is_empty());
        assert!(schema.numeric.is_empty());
    }
}
