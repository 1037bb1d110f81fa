use std::fmt::Display;
use std::str::FromStr;

use indexmap::IndexMap;

use super::schema::Value;

/// The shape in which [`super::Table::search`] hands rows back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowFormat {
    /// Values only, in projection order.
    Sequence,
    /// Field name to value, in projection order.
    #[default]
    Mapping,
}

impl FromStr for RowFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "list" | "sequence" => Ok(RowFormat::Sequence),
            "dict" | "mapping" => Ok(RowFormat::Mapping),
            other => Err(format!("invalid row format {}: use 'list' or 'dict'", other)),
        }
    }
}

/// A single projected row.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Sequence(Vec<Option<Value>>),
    Mapping(IndexMap<String, Option<Value>>),
}

impl Row {
    pub fn values(&self) -> Vec<Option<&Value>> {
        match self {
            Row::Sequence(values) => values.iter().map(Option::as_ref).collect(),
            Row::Mapping(values) => values.values().map(Option::as_ref).collect(),
        }
    }

    pub fn get(&self, field_name: &str) -> Option<&Value> {
        //! Look a value up by field name. Always [`None`] on a sequence row.

        match self {
            Row::Sequence(_) => None,
            Row::Mapping(values) => values.get(field_name).and_then(Option::as_ref),
        }
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let row: Vec<String> = self
            .values()
            .iter()
            .map(|value| match value {
                Some(value) => value.to_string(),
                None => "NIL".to_string(),
            })
            .collect();
        write!(f, "{}", row.join(" | "))
    }
}
