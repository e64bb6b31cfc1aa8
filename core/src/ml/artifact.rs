use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("model path must be a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("model read error ({}): {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("model parse error ({}): {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("model classifier has no coefficients")]
    EmptyClassifier,
}

/// Trained pipeline exported by the training job: an optional column
/// preprocessor followed by a binary classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preprocessor: Option<ColumnTransformer>,
    pub classifier: Classifier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnTransformer {
    #[serde(default)]
    pub feature_names_in: Option<Vec<String>>,
    pub transformers: Vec<TransformerBranch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformerBranch {
    pub name: String,
    #[serde(default)]
    pub columns: Option<ColumnSelector>,
    #[serde(default)]
    pub steps: Vec<TransformStep>,
}

/// How a branch names its input columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ColumnSelector {
    Names(Vec<String>),
    Index { index: Vec<String> },
    Slice(SliceSelector),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SliceSelector {
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub stop: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformStep {
    SimpleImputer {
        statistics: Vec<FillValue>,
    },
    StandardScaler {
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    OneHotEncoder {
        categories: Vec<Vec<String>>,
        #[serde(default)]
        handle_unknown: HandleUnknown,
    },
    Passthrough,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FillValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Ignore,
    Error,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression {
        coef: Vec<f64>,
        intercept: f64,
        #[serde(default)]
        feature_names: Vec<String>,
    },
}

impl ColumnSelector {
    /// Expands the selector into column names. `None` when the selector
    /// cannot be resolved against this transformer.
    pub fn expand(&self, feature_names_in: Option<&[String]>) -> Option<Vec<String>> {
        match self {
            ColumnSelector::Names(names) => Some(names.clone()),
            ColumnSelector::Index { index } => Some(index.clone()),
            ColumnSelector::Slice(slice) => {
                let names = feature_names_in?;
                let start = slice.start.unwrap_or(0);
                let stop = slice.stop.unwrap_or(names.len()).min(names.len());
                if start > stop {
                    return Some(Vec::new());
                }
                Some(names[start..stop].to_vec())
            }
            ColumnSelector::Other(_) => None,
        }
    }
}

impl ColumnTransformer {
    pub fn branch_columns(&self, branch: &TransformerBranch) -> Option<Vec<String>> {
        branch
            .columns
            .as_ref()?
            .expand(self.feature_names_in.as_deref())
    }
}

impl ModelArtifact {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }
        if path.is_dir() {
            return Err(ArtifactError::NotAFile(path.to_path_buf()));
        }

        let data = std::fs::read(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact = serde_json::from_slice::<ModelArtifact>(&data).map_err(|source| {
            ArtifactError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let empty = match &artifact.classifier {
            Classifier::LogisticRegression { coef, .. } => coef.is_empty(),
        };
        if empty {
            return Err(ArtifactError::EmptyClassifier);
        }
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn loads_fixture_pipeline() {
        let artifact = ModelArtifact::load(&fixture("model.json")).unwrap();
        let pre = artifact.preprocessor.expect("preprocessor");

        assert_eq!(pre.transformers.len(), 2);
        assert_eq!(pre.transformers[0].name, "num");
        assert!(matches!(
            pre.transformers[0].columns,
            Some(ColumnSelector::Names(_))
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let error = ModelArtifact::load(&fixture("does_not_exist.json")).unwrap_err();
        assert!(matches!(error, ArtifactError::NotFound(_)));
    }

    #[test]
    fn directory_is_rejected() {
        let error = ModelArtifact::load(&fixture("")).unwrap_err();
        assert!(matches!(error, ArtifactError::NotAFile(_)));
    }

    #[test]
    fn selectors_deserialize_by_shape() {
        let selectors: Vec<ColumnSelector> = serde_json::from_str(
            r#"[["a", "b"], {"index": ["c"]}, {"start": 1, "stop": 3}, {"callable": "make_selector"}]"#,
        )
        .unwrap();

        assert!(matches!(selectors[0], ColumnSelector::Names(_)));
        assert!(matches!(selectors[1], ColumnSelector::Index { .. }));
        assert!(matches!(selectors[2], ColumnSelector::Slice(_)));
        assert!(matches!(selectors[3], ColumnSelector::Other(_)));
    }

    #[test]
    fn slice_needs_feature_names() {
        let slice = ColumnSelector::Slice(SliceSelector {
            start: Some(1),
            stop: None,
        });
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        assert_eq!(slice.expand(None), None);
        assert_eq!(
            slice.expand(Some(&names)),
            Some(vec!["b".to_string(), "c".to_string()])
        );
    }
}
