use serde_json::Value;

/// A single value in a tabular batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Canonical "no value" marker used after normalization.
    Missing,
    /// Database-style absent marker as it arrives from a client (JSON `null`).
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Number(number) => number.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Value::String(text) => Cell::Text(text.clone()),
            Value::Bool(flag) => Cell::Number(if *flag { 1.0 } else { 0.0 }),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Anything that can be laid out as one row of named cells.
pub trait TabularRecord {
    fn to_row(&self) -> Vec<(String, Cell)>;
}

impl TabularRecord for serde_json::Map<String, Value> {
    fn to_row(&self) -> Vec<(String, Cell)> {
        self.iter()
            .map(|(name, value)| (name.clone(), Cell::from(value)))
            .collect()
    }
}

/// Row-major table with named, ordered columns. Every row has exactly
/// `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Builds a table from heterogeneous rows. Columns appear in first-seen
    /// order; cells a row does not provide are `Missing`.
    pub fn from_rows(rows: Vec<Vec<(String, Cell)>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for (name, _) in row {
                if !columns.iter().any(|existing| existing == name) {
                    columns.push(name.clone());
                }
            }
        }

        let rows = rows
            .into_iter()
            .map(|row| {
                let mut cells = vec![Cell::Missing; columns.len()];
                for (name, cell) in row {
                    if let Some(index) = columns.iter().position(|existing| *existing == name) {
                        cells[index] = cell;
                    }
                }
                cells
            })
            .collect();

        Table { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(index))
    }

    /// Appends a column where every row holds a clone of `fill`.
    pub fn add_column(&mut self, name: &str, fill: Cell) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(fill.clone());
        }
    }

    /// Keeps exactly `order`, in that order. Names absent from the table are
    /// ignored.
    pub fn select(&mut self, order: &[String]) {
        let indices = order
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect::<Vec<_>>();

        self.columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = indices.iter().map(|&i| row[i].clone()).collect();
        }
    }

    pub fn map_column<F>(&mut self, name: &str, mut f: F)
    where
        F: FnMut(Cell) -> Cell,
    {
        let Some(index) = self.column_index(name) else {
            return;
        };
        for row in &mut self.rows {
            let cell = std::mem::replace(&mut row[index], Cell::Missing);
            row[index] = f(cell);
        }
    }

    pub fn map_cells<F>(&mut self, mut f: F)
    where
        F: FnMut(Cell) -> Cell,
    {
        for row in &mut self.rows {
            for slot in row.iter_mut() {
                let cell = std::mem::replace(slot, Cell::Missing);
                *slot = f(cell);
            }
        }
    }

    /// Inferred type per column, named the way dataframe tooling reports
    /// them: `object` when any text is present, `float64` otherwise.
    pub fn dtypes(&self) -> Vec<(&str, &'static str)> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let has_text = self
                    .rows
                    .iter()
                    .any(|row| matches!(row[index], Cell::Text(_)));
                (name.as_str(), if has_text { "object" } else { "float64" })
            })
            .collect()
    }
}
