use serde::{Deserialize, Deserializer, Serialize};

use crate::frame::{Cell, TabularRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Categorical,
}

/// Wire contract of one customer field: the Rust-side name, the column name
/// the model was trained on (also accepted on input), and its kind. Every
/// field is required.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

pub const CUSTOMER_FIELDS: [FieldSpec; 8] = [
    FieldSpec {
        name: "Age",
        column: "Age",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        name: "Purchase_Amount_USD",
        column: "Purchase Amount (USD)",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        name: "Review_Rating",
        column: "Review Rating",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        name: "Previous_Purchases",
        column: "Previous Purchases",
        kind: FieldKind::Numeric,
    },
    FieldSpec {
        name: "Gender",
        column: "Gender",
        kind: FieldKind::Categorical,
    },
    FieldSpec {
        name: "Location",
        column: "Location",
        kind: FieldKind::Categorical,
    },
    FieldSpec {
        name: "Payment_Method",
        column: "Payment Method",
        kind: FieldKind::Categorical,
    },
    FieldSpec {
        name: "Frequency_of_Purchases",
        column: "Frequency of Purchases",
        kind: FieldKind::Categorical,
    },
];

/// One customer row as submitted by a client. Serializes with the trained
/// column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(rename = "Age", deserialize_with = "lenient_f64")]
    pub age: f64,
    #[serde(
        rename = "Purchase Amount (USD)",
        alias = "Purchase_Amount_USD",
        deserialize_with = "lenient_f64"
    )]
    pub purchase_amount_usd: f64,
    #[serde(
        rename = "Review Rating",
        alias = "Review_Rating",
        deserialize_with = "lenient_f64"
    )]
    pub review_rating: f64,
    #[serde(
        rename = "Previous Purchases",
        alias = "Previous_Purchases",
        deserialize_with = "lenient_f64"
    )]
    pub previous_purchases: f64,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Payment Method", alias = "Payment_Method")]
    pub payment_method: String,
    #[serde(rename = "Frequency of Purchases", alias = "Frequency_of_Purchases")]
    pub frequency_of_purchases: String,
}

impl CustomerRecord {
    fn cell(&self, field: &str) -> Cell {
        match field {
            "Age" => Cell::Number(self.age),
            "Purchase_Amount_USD" => Cell::Number(self.purchase_amount_usd),
            "Review_Rating" => Cell::Number(self.review_rating),
            "Previous_Purchases" => Cell::Number(self.previous_purchases),
            "Gender" => Cell::Text(self.gender.clone()),
            "Location" => Cell::Text(self.location.clone()),
            "Payment_Method" => Cell::Text(self.payment_method.clone()),
            "Frequency_of_Purchases" => Cell::Text(self.frequency_of_purchases.clone()),
            _ => Cell::Missing,
        }
    }
}

impl TabularRecord for CustomerRecord {
    fn to_row(&self) -> Vec<(String, Cell)> {
        CUSTOMER_FIELDS
            .iter()
            .map(|field| (field.column.to_string(), self.cell(field.name)))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub items: Vec<CustomerRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub probability: f64,
    pub prediction: u8,
    pub threshold: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub results: Vec<ScoredResult>,
}

/// Accepts JSON numbers and numeric strings.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!("input should be a valid number, got {text:?}"))
        }),
    }
}
