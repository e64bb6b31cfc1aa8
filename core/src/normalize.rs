use crate::frame::{Cell, TabularRecord, Table};
use crate::ml::InputSchema;

impl InputSchema {
    /// Reshapes client records into exactly the table the model expects.
    ///
    /// Absent required columns are added as `Missing`, the column order
    /// becomes `required` (everything else is dropped), `Null` folds into
    /// `Missing`, numeric columns are coerced with unparsable values turned
    /// into `Missing`, and blank strings anywhere become `Missing`. None of
    /// these steps can fail.
    ///
    /// With an empty `required` list the record columns are kept as-is.
    pub fn normalize<R: TabularRecord>(&self, records: &[R]) -> Table {
        let mut table = Table::from_rows(records.iter().map(TabularRecord::to_row).collect());

        if !self.required.is_empty() {
            for column in &self.required {
                if !table.has_column(column) {
                    table.add_column(column, Cell::Missing);
                }
            }
            table.select(&self.required);
        }

        table.map_cells(|cell| match cell {
            Cell::Null => Cell::Missing,
            other => other,
        });

        for column in &self.numeric {
            table.map_column(column, coerce_numeric);
        }

        table.map_cells(|cell| match cell {
            Cell::Text(text) if text.trim().is_empty() => Cell::Missing,
            other => other,
        });

        table
    }
}

fn coerce_numeric(cell: Cell) -> Cell {
    match cell {
        Cell::Number(value) if value.is_nan() => Cell::Missing,
        Cell::Number(value) => Cell::Number(value),
        Cell::Text(text) => match text.trim().parse::<f64>() {
            Ok(value) if !value.is_nan() => Cell::Number(value),
            _ => Cell::Missing,
        },
        Cell::Missing | Cell::Null => Cell::Missing,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use super::*;

    fn schema() -> InputSchema {
        InputSchema {
            required: vec![
                "Age".to_string(),
                "Review Rating".to_string(),
                "Gender".to_string(),
                "Location".to_string(),
            ],
            numeric: vec!["Age".to_string(), "Review Rating".to_string()],
        }
    }

    fn records(values: Value) -> Vec<Map<String, Value>> {
        serde_json::from_value(values).unwrap()
    }

    #[test]
    fn output_columns_match_required_order() {
        let input = records(json!([
            {"Location": "CA", "Gender": "Male", "Review Rating": 4.5, "Age": 25, "Extra": "x"}
        ]));

        let table = schema().normalize(&input);

        assert_eq!(table.columns(), ["Age", "Review Rating", "Gender", "Location"]);
        assert_eq!(
            table.rows()[0],
            vec![
                Cell::Number(25.0),
                Cell::Number(4.5),
                Cell::Text("Male".to_string()),
                Cell::Text("CA".to_string()),
            ]
        );
    }

    #[test]
    fn absent_required_column_is_filled_with_missing() {
        let input = records(json!([
            {"Age": 25, "Review Rating": 4.5, "Gender": "Male"},
            {"Age": 30, "Review Rating": 3.0, "Gender": "Female"}
        ]));

        let table = schema().normalize(&input);

        assert_eq!(table.cell(0, "Location"), Some(&Cell::Missing));
        assert_eq!(table.cell(1, "Location"), Some(&Cell::Missing));
    }

    #[test]
    fn null_becomes_missing() {
        let input = records(json!([
            {"Age": 25, "Review Rating": null, "Gender": null, "Location": "CA"}
        ]));

        let table = schema().normalize(&input);

        assert_eq!(table.cell(0, "Review Rating"), Some(&Cell::Missing));
        assert_eq!(table.cell(0, "Gender"), Some(&Cell::Missing));
    }

    #[test]
    fn numeric_columns_are_coerced() {
        let input = records(json!([
            {"Age": "31", "Review Rating": "four", "Gender": "Male", "Location": "CA"},
            {"Age": " 2.5e1 ", "Review Rating": 4, "Gender": "Male", "Location": "CA"}
        ]));

        let table = schema().normalize(&input);

        assert_eq!(table.cell(0, "Age"), Some(&Cell::Number(31.0)));
        assert_eq!(table.cell(0, "Review Rating"), Some(&Cell::Missing));
        assert_eq!(table.cell(1, "Age"), Some(&Cell::Number(25.0)));
        assert_eq!(table.cell(1, "Review Rating"), Some(&Cell::Number(4.0)));
    }

    #[test]
    fn blank_strings_become_missing() {
        let input = records(json!([
            {"Age": 25, "Review Rating": "  ", "Gender": "", "Location": " \t "}
        ]));

        let table = schema().normalize(&input);

        assert_eq!(table.cell(0, "Review Rating"), Some(&Cell::Missing));
        assert_eq!(table.cell(0, "Gender"), Some(&Cell::Missing));
        assert_eq!(table.cell(0, "Location"), Some(&Cell::Missing));
    }

    #[test]
    fn empty_schema_keeps_record_columns() {
        let input = records(json!([{"b": 1, "a": null, "c": " "}]));

        let table = InputSchema::default().normalize(&input);

        assert_eq!(table.columns().len(), 3);
        assert_eq!(table.cell(0, "a"), Some(&Cell::Missing));
        assert_eq!(table.cell(0, "b"), Some(&Cell::Number(1.0)));
        assert_eq!(table.cell(0, "c"), Some(&Cell::Missing));
    }
}
