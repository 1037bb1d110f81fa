use std::fmt::Display;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::error::{EntityKind, StoreError, StoreResult};

use super::field::Field;
use super::row::{Row, RowFormat};
use super::schema::Value;

/// An ordered mapping of field names to values.
///
/// Used for the data of an insert or update, and as the condition of a
/// search, update or delete: a row matches when every named field holds the
/// given value.
pub type Assignments = IndexMap<String, Option<Value>>;

/// Which fields a search projects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    Fields(Vec<String>),
}

/// Order of the rows a search returns, by row index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// A row aligned collection of named [`Field`]s.
///
/// Row `i` of the table is position `i` in every field. The table is the only
/// place that adds or removes whole rows, so it owns the invariant that every
/// field has exactly [`Table::row_count`] values.
///
/// # Atomicity
/// - Inserts resolve the value of every field before any field is appended.
/// - Updates snapshot the fields they touch and restore them if any write is
/// rejected half way through.
/// - Deletes compute the matching row indices once and remove them from the
/// highest index down, so earlier removals don't move later targets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    fields: IndexMap<String, Field>,
    row_count: usize,
}

impl Table {
    pub fn new() -> Table {
        Table::default()
    }

    pub fn from_fields(fields: Vec<(String, Field)>) -> StoreResult<Table> {
        //! Create a table from an ordered list of named fields.
        //!
        //! Fields may already hold data, in which case they all have to agree
        //! on the row count. Empty fields are padded like in [`Table::add_field`].

        let mut table = Table::new();

        for (name, field) in fields {
            table.add_field(&name, field, None)?;
        }

        Ok(table)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn add_field(&mut self, name: &str, mut field: Field, fill: Option<Value>) -> StoreResult<()> {
        //! Add a column to the table.
        //!
        //! - The first field of a table sets the row count.
        //! - A field that already has rows must match the row count exactly.
        //! - An empty field is padded up to the row count with `fill` (or its
        //! own default / increment when `fill` is [`None`]).

        if self.fields.contains_key(name) {
            return Err(StoreError::DuplicateEntity {
                kind: EntityKind::Field,
                name: name.to_string(),
            });
        }

        if self.fields.is_empty() {
            self.row_count = field.len();
        } else if !field.is_empty() {
            if field.len() != self.row_count {
                return Err(StoreError::RowCountMismatch {
                    expected: self.row_count,
                    found: field.len(),
                });
            }
        } else {
            for _ in 0..self.row_count {
                field
                    .add(fill.clone())
                    .map_err(|error| StoreError::rejected_by(name, error))?;
            }
        }

        info!("field '{}' ({}) added with {} rows", name, field.data_type(), field.len());
        self.fields.insert(name.to_string(), field);

        Ok(())
    }

    pub fn insert(&mut self, data: &Assignments) -> StoreResult<usize> {
        //! Insert one row. Fields not named in `data` receive a null, which
        //! their own default or auto increment may replace.
        //!
        //! Returns the index of the new row.

        self.check_field_names(data.keys())?;

        if self.fields.is_empty() {
            return Err(StoreError::invalid_declaration("table has no fields"));
        }

        let mut resolved = Vec::with_capacity(self.fields.len());

        for (name, field) in self.fields.iter() {
            let value = data.get(name).cloned().flatten();
            let value = field.resolve(value).map_err(|error| {
                warn!("insert rejected by field '{}': {}", name, error);
                StoreError::rejected_by(name, error)
            })?;
            resolved.push(value);
        }

        for (field, value) in self.fields.values_mut().zip(resolved) {
            field.push_resolved(value);
        }

        self.row_count += 1;
        debug!("row {} inserted", self.row_count - 1);

        Ok(self.row_count - 1)
    }

    pub fn insert_many(&mut self, rows: &[Assignments]) -> StoreResult<usize> {
        //! Insert every row or none of them. A row rejected part way through
        //! undoes the rows already inserted by this call.
        //!
        //! Returns the number of inserted rows.

        let fields = self.fields.clone();
        let row_count = self.row_count;

        for (position, data) in rows.iter().enumerate() {
            if let Err(error) = self.insert(data) {
                warn!("insert of {} rows rolled back at row {}", rows.len(), position);
                self.fields = fields;
                self.row_count = row_count;
                return Err(error);
            }
        }

        Ok(rows.len())
    }

    pub fn delete(&mut self, conditions: &Assignments) -> StoreResult<usize> {
        //! Delete every row matching `conditions`.
        //!
        //! Returns the number of deleted rows.

        let indices = self.matching_rows(conditions)?;

        for field in self.fields.values_mut() {
            for &index in indices.iter().rev() {
                field.delete(index)?;
            }
        }

        self.row_count = self.fields.values().next().map_or(0, Field::len);
        debug!("{} rows deleted, {} remain", indices.len(), self.row_count);

        Ok(indices.len())
    }

    pub fn update(&mut self, data: &Assignments, conditions: &Assignments) -> StoreResult<usize> {
        //! Set the fields named in `data` on every row matching `conditions`.
        //!
        //! Either every write succeeds or the table is left untouched.
        //! Returns the number of matched rows.

        self.check_field_names(data.keys())?;
        let indices = self.matching_rows(conditions)?;

        let backup: Vec<(String, Field)> = data
            .keys()
            .filter_map(|name| self.fields.get(name).map(|field| (name.clone(), field.clone())))
            .collect();

        if let Err(error) = self.apply_update(data, &indices) {
            warn!("update rolled back: {}", error);

            for (name, field) in backup {
                self.fields.insert(name, field);
            }

            return Err(error);
        }

        debug!("{} rows updated", indices.len());
        Ok(indices.len())
    }

    pub fn search(
        &self,
        projection: &Projection,
        sort: SortOrder,
        format: RowFormat,
        conditions: &Assignments,
    ) -> StoreResult<Vec<Row>> {
        //! Linear scan for the rows matching `conditions`.
        //!
        //! Rows come back in ascending row index order, or reversed for
        //! [`SortOrder::Desc`].

        let columns: Vec<(&str, &Field)> = match projection {
            Projection::All => self
                .fields
                .iter()
                .map(|(name, field)| (name.as_str(), field))
                .collect(),
            Projection::Fields(names) => names
                .iter()
                .map(|name| self.lookup(name).map(|field| (name.as_str(), field)))
                .collect::<StoreResult<_>>()?,
        };

        let indices = self.matching_rows(conditions)?;

        let mut rows: Vec<Row> = indices
            .iter()
            .map(|&index| match format {
                RowFormat::Sequence => Row::Sequence(
                    columns
                        .iter()
                        .map(|(_, field)| field.values()[index].clone())
                        .collect(),
                ),
                RowFormat::Mapping => Row::Mapping(
                    columns
                        .iter()
                        .map(|(name, field)| (name.to_string(), field.values()[index].clone()))
                        .collect(),
                ),
            })
            .collect();

        if sort == SortOrder::Desc {
            rows.reverse();
        }

        Ok(rows)
    }

    pub fn matching_rows(&self, conditions: &Assignments) -> StoreResult<Vec<usize>> {
        //! Resolve `conditions` into the ascending list of matching row
        //! indices. A row matches when every named field equals the expected
        //! value; no conditions match every row.

        let checks: Vec<(&Field, &Option<Value>)> = conditions
            .iter()
            .map(|(name, expected)| self.lookup(name).map(|field| (field, expected)))
            .collect::<StoreResult<_>>()?;

        Ok((0..self.row_count)
            .filter(|&index| {
                checks
                    .iter()
                    .all(|(field, expected)| field.values()[index] == **expected)
            })
            .collect())
    }

    fn apply_update(&mut self, data: &Assignments, indices: &[usize]) -> StoreResult<()> {
        for (name, value) in data {
            let field = self
                .fields
                .get_mut(name)
                .ok_or_else(|| StoreError::UnknownField { name: name.clone() })?;

            for &index in indices {
                field
                    .modify(index, value.clone())
                    .map_err(|error| StoreError::rejected_by(name, error))?;
            }
        }

        Ok(())
    }

    fn lookup(&self, name: &str) -> StoreResult<&Field> {
        self.fields.get(name).ok_or_else(|| StoreError::UnknownField {
            name: name.to_string(),
        })
    }

    fn check_field_names<'a, I>(&self, names: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for name in names {
            self.lookup(name)?;
        }
        Ok(())
    }

    pub fn serialize(&self) -> StoreResult<String> {
        //! Serialize to a JSON object of field name to field blob, in
        //! declaration order. Each field blob is itself a JSON text.

        let record = self
            .fields
            .iter()
            .map(|(name, field)| field.serialize().map(|blob| (name.as_str(), blob)))
            .collect::<StoreResult<IndexMap<&str, String>>>()?;

        Ok(serde_json::to_string(&record)?)
    }

    pub fn deserialize(blob: &str) -> StoreResult<Table> {
        //! Rebuild a table from its blob. Stored columns are never padded:
        //! every field must hold exactly as many rows as the first one.

        let record: IndexMap<String, String> = serde_json::from_str(blob)?;
        let mut table = Table::new();

        for (name, field_blob) in record {
            let field =
                Field::deserialize(&field_blob).map_err(|error| StoreError::rejected_by(&name, error))?;

            if !table.fields.is_empty() && field.len() != table.row_count {
                return Err(StoreError::rejected_by(
                    &name,
                    StoreError::RowCountMismatch {
                        expected: table.row_count,
                        found: field.len(),
                    },
                ));
            }

            table.add_field(&name, field, None)?;
        }

        Ok(table)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let header: Vec<String> = self
            .fields
            .iter()
            .map(|(name, field)| format!("{} ({})", name, field.data_type()))
            .collect();

        let rows: Vec<String> = (0..self.row_count)
            .map(|index| {
                let row = Row::Sequence(
                    self.fields
                        .values()
                        .map(|field| field.values()[index].clone())
                        .collect(),
                );
                format!("{}", row)
            })
            .collect();

        writeln!(f, "{}\n{}", header.join(" | "), rows.join("\n"))
    }
}
