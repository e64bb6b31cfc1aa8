use thiserror::Error;

use crate::frame::{Cell, Table};
use crate::ml::artifact::{
    Classifier, ColumnTransformer, FillValue, HandleUnknown, ModelArtifact, TransformStep,
    TransformerBranch,
};

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("found array with 0 sample(s); a minimum of 1 is required")]
    EmptyInput,
    #[error("columns are missing: {0:?}")]
    MissingColumns(Vec<String>),
    #[error("could not convert string to float: '{0}'")]
    NotNumeric(String),
    #[error("input X contains NaN")]
    ContainsMissing,
    #[error("input X contains infinity or a value too large")]
    ContainsInfinity,
    #[error("found unknown category '{value}' in column '{column}'")]
    UnknownCategory { column: String, value: String },
    #[error("branch '{branch}': {step} expects {expected} columns, got {actual}")]
    StepShape {
        branch: String,
        step: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("branch '{0}': column selector cannot be resolved")]
    UnresolvedSelector(String),
    #[error("X has {actual} features, but the classifier is expecting {expected} features as input")]
    FeatureCount { expected: usize, actual: usize },
}

/// Intermediate values of one branch while its steps run.
enum BranchData {
    Cells(Vec<Vec<Cell>>),
    Dense(Vec<Vec<f64>>),
}

impl BranchData {
    /// Values per row at this point of the branch. Encoders widen rows, so
    /// this can differ from the branch's column count.
    fn width(&self) -> Option<usize> {
        match self {
            BranchData::Cells(rows) => rows.first().map(Vec::len),
            BranchData::Dense(rows) => rows.first().map(Vec::len),
        }
    }
}

impl ModelArtifact {
    /// Two-class probabilities per row: `[negative, positive]`.
    pub fn predict_proba(&self, table: &Table) -> Result<Vec<[f64; 2]>, PredictError> {
        if table.n_rows() == 0 {
            return Err(PredictError::EmptyInput);
        }

        let features = match self.preprocessor.as_ref() {
            Some(pre) => pre.transform(table)?,
            None => self.classifier.read_features(table)?,
        };

        features
            .iter()
            .map(|row| self.classifier.probability(row).map(|p| [1.0 - p, p]))
            .collect()
    }
}

impl ColumnTransformer {
    /// Runs every branch and concatenates their outputs in branch order.
    /// Columns no branch selects are dropped.
    pub fn transform(&self, table: &Table) -> Result<Vec<Vec<f64>>, PredictError> {
        let mut output = vec![Vec::new(); table.n_rows()];

        for branch in &self.transformers {
            if branch.columns.is_none() {
                continue;
            }
            let columns = self
                .branch_columns(branch)
                .ok_or_else(|| PredictError::UnresolvedSelector(branch.name.clone()))?;
            if columns.is_empty() {
                continue;
            }

            let dense = run_branch(branch, &columns, table)?;
            for (row, values) in output.iter_mut().zip(dense) {
                row.extend(values);
            }
        }

        Ok(output)
    }
}

fn run_branch(
    branch: &TransformerBranch,
    columns: &[String],
    table: &Table,
) -> Result<Vec<Vec<f64>>, PredictError> {
    let missing = columns
        .iter()
        .filter(|column| !table.has_column(column))
        .cloned()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(PredictError::MissingColumns(missing));
    }

    let indices = columns
        .iter()
        .filter_map(|column| table.column_index(column))
        .collect::<Vec<_>>();
    let cells = table
        .rows()
        .iter()
        .map(|row| indices.iter().map(|&i| row[i].clone()).collect::<Vec<_>>())
        .collect();

    let mut data = BranchData::Cells(cells);
    for step in &branch.steps {
        data = apply_step(step, data, branch, columns)?;
    }

    match data {
        BranchData::Dense(rows) => Ok(rows),
        BranchData::Cells(rows) => to_dense(rows),
    }
}

fn apply_step(
    step: &TransformStep,
    data: BranchData,
    branch: &TransformerBranch,
    columns: &[String],
) -> Result<BranchData, PredictError> {
    let width = data.width().unwrap_or(columns.len());
    let check = |name: &'static str, expected: usize| {
        if expected == width {
            Ok(())
        } else {
            Err(PredictError::StepShape {
                branch: branch.name.clone(),
                step: name,
                expected,
                actual: width,
            })
        }
    };

    match step {
        TransformStep::Passthrough => Ok(data),
        TransformStep::SimpleImputer { statistics } => {
            check("simple_imputer", statistics.len())?;
            Ok(impute(data, statistics))
        }
        TransformStep::StandardScaler { mean, scale } => {
            check("standard_scaler", mean.len())?;
            check("standard_scaler", scale.len())?;
            let mut rows = match data {
                BranchData::Dense(rows) => rows,
                BranchData::Cells(rows) => to_dense(rows)?,
            };
            for row in &mut rows {
                for (j, value) in row.iter_mut().enumerate() {
                    let divisor = if scale[j] == 0.0 { 1.0 } else { scale[j] };
                    *value = (*value - mean[j]) / divisor;
                }
            }
            Ok(BranchData::Dense(rows))
        }
        TransformStep::OneHotEncoder {
            categories,
            handle_unknown,
        } => {
            check("one_hot_encoder", categories.len())?;
            let rows = match data {
                BranchData::Cells(rows) => rows,
                BranchData::Dense(rows) => rows
                    .into_iter()
                    .map(|row| row.into_iter().map(number_cell).collect::<Vec<_>>())
                    .collect(),
            };
            one_hot(rows, categories, *handle_unknown, columns).map(BranchData::Dense)
        }
    }
}

fn impute(data: BranchData, statistics: &[FillValue]) -> BranchData {
    match data {
        BranchData::Cells(mut rows) => {
            for row in &mut rows {
                for (j, cell) in row.iter_mut().enumerate() {
                    if matches!(cell, Cell::Missing | Cell::Null) {
                        *cell = match &statistics[j] {
                            FillValue::Number(value) => Cell::Number(*value),
                            FillValue::Text(value) => Cell::Text(value.clone()),
                        };
                    }
                }
            }
            BranchData::Cells(rows)
        }
        BranchData::Dense(mut rows) => {
            for row in &mut rows {
                for (j, value) in row.iter_mut().enumerate() {
                    if value.is_nan() {
                        if let FillValue::Number(fill) = &statistics[j] {
                            *value = *fill;
                        }
                    }
                }
            }
            BranchData::Dense(rows)
        }
    }
}

fn one_hot(
    rows: Vec<Vec<Cell>>,
    categories: &[Vec<String>],
    handle_unknown: HandleUnknown,
    columns: &[String],
) -> Result<Vec<Vec<f64>>, PredictError> {
    let width = categories.iter().map(Vec::len).sum::<usize>();

    rows.into_iter()
        .map(|row| {
            let mut encoded = Vec::with_capacity(width);
            for (j, cell) in row.iter().enumerate() {
                let value = category_label(cell);
                let hit = value
                    .as_deref()
                    .and_then(|value| categories[j].iter().position(|c| c == value));
                if hit.is_none() && handle_unknown == HandleUnknown::Error {
                    return Err(PredictError::UnknownCategory {
                        column: columns
                            .get(j)
                            .cloned()
                            .unwrap_or_else(|| format!("x{j}")),
                        value: value.unwrap_or_else(|| "nan".to_string()),
                    });
                }
                encoded.extend((0..categories[j].len()).map(|k| {
                    if Some(k) == hit {
                        1.0
                    } else {
                        0.0
                    }
                }));
            }
            Ok(encoded)
        })
        .collect()
}

fn category_label(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Text(value) => Some(value.clone()),
        Cell::Number(value) if value.is_nan() => None,
        Cell::Number(value) => Some(value.to_string()),
        Cell::Missing | Cell::Null => None,
    }
}

fn number_cell(value: f64) -> Cell {
    if value.is_nan() {
        Cell::Missing
    } else {
        Cell::Number(value)
    }
}

fn to_number(cell: &Cell) -> Result<f64, PredictError> {
    match cell {
        Cell::Number(value) => Ok(*value),
        Cell::Missing | Cell::Null => Ok(f64::NAN),
        Cell::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| PredictError::NotNumeric(text.clone())),
    }
}

fn to_dense(rows: Vec<Vec<Cell>>) -> Result<Vec<Vec<f64>>, PredictError> {
    rows.iter()
        .map(|row| row.iter().map(to_number).collect::<Result<Vec<_>, _>>())
        .collect()
}

impl Classifier {
    fn read_features(&self, table: &Table) -> Result<Vec<Vec<f64>>, PredictError> {
        let Classifier::LogisticRegression { feature_names, .. } = self;

        let missing = feature_names
            .iter()
            .filter(|name| !table.has_column(name))
            .cloned()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(PredictError::MissingColumns(missing));
        }

        let indices = feature_names
            .iter()
            .filter_map(|name| table.column_index(name))
            .collect::<Vec<_>>();
        table
            .rows()
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|&i| to_number(&row[i]))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect()
    }

    fn probability(&self, features: &[f64]) -> Result<f64, PredictError> {
        let Classifier::LogisticRegression {
            coef, intercept, ..
        } = self;

        if features.len() != coef.len() {
            return Err(PredictError::FeatureCount {
                expected: coef.len(),
                actual: features.len(),
            });
        }
        if features.iter().any(|value| value.is_nan()) {
            return Err(PredictError::ContainsMissing);
        }
        if features.iter().any(|value| !value.is_finite()) {
            return Err(PredictError::ContainsInfinity);
        }

        let total = coef
            .iter()
            .zip(features)
            .fold(*intercept, |acc, (weight, value)| acc + weight * value);
        let p = sigmoid(total);
        if !p.is_finite() {
            return Err(PredictError::ContainsInfinity);
        }
        Ok(p)
    }
}

fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}
