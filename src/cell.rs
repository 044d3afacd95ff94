use serde::{Deserialize, Serialize};

/// A single spreadsheet cell as ingested, before any cleaning.
///
/// Workbooks hand us a mixture of numbers, strings and blanks in every column, so
/// nothing about a cell's type is trusted until a normalizer has looked at it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawCell {
    Number(f64),
    Text(String),
    Missing,
}

impl RawCell {
    /// Builds a text cell, treating the empty string as a blank.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            RawCell::Missing
        } else {
            RawCell::Text(text)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawCell::Missing)
    }

    /// Renders the cell as a label (brand, model, colour, ...).
    ///
    /// Whole numbers print without a trailing `.0` so a numeric model name such as
    /// `125` reads the way it does in the sheet.
    pub fn label(&self) -> Option<String> {
        match self {
            RawCell::Text(text) => Some(text.clone()),
            RawCell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            RawCell::Number(n) => Some(n.to_string()),
            RawCell::Missing => None,
        }
    }
}

impl From<&calamine::Data> for RawCell {
    fn from(data: &calamine::Data) -> Self {
        use calamine::Data;

        match data {
            Data::Int(i) => RawCell::Number(*i as f64),
            Data::Float(f) => RawCell::Number(*f),
            Data::String(s) => RawCell::from_text(s.as_str()),
            Data::Bool(b) => RawCell::Text(b.to_string()),
            Data::Empty | Data::Error(_) => RawCell::Missing,
            // Dates and durations only ever reach label columns; keep their rendering
            other => RawCell::from_text(other.to_string()),
        }
    }
}

/// CSV fields are always text; an empty field is a blank cell.
impl From<&str> for RawCell {
    fn from(field: &str) -> Self {
        RawCell::from_text(field)
    }
}
