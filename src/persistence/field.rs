use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

use super::schema::{DataType, FieldKey, Value};

/// A single typed and constrained column.
///
/// The position of a value inside the column is its row id. The owning
/// [`super::Table`] keeps every column of a table at the same length, the
/// [`Field`] itself only knows how to guard its own values.
///
/// All writes go through one gate ([`Field::add`] and [`Field::modify`] both
/// resolve and check the value first), so a rejected write never touches the
/// stored values.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    data_type: DataType,
    keys: IndexSet<FieldKey>,
    default: Option<Value>,
    values: Vec<Option<Value>>,
}

/// How [`Field::check`] fills in a missing value.
#[derive(Clone, Copy, PartialEq)]
enum Fill {
    /// Next auto increment number, otherwise the declared default.
    Add,
    /// Next auto increment number only.
    Modify,
    /// Nothing, the value is checked as stored.
    Replay,
}

/// The persisted shape of a [`Field`].
#[derive(Serialize, Deserialize)]
struct FieldRecord {
    keys: Vec<FieldKey>,
    #[serde(rename = "type")]
    data_type: DataType,
    values: Vec<Option<Value>>,
    default: Option<Value>,
}

impl Field {
    pub fn new<K>(data_type: DataType, keys: K, default: Option<Value>) -> StoreResult<Field>
    where
        K: IntoIterator<Item = FieldKey>,
    {
        //! Declare an empty column of `data_type`.
        //!
        //! Repeated keys collapse into one. The combination of keys and default
        //! is validated here, so a [`Field`] that exists is always well declared.

        let mut keys: IndexSet<FieldKey> = keys.into_iter().collect();

        if keys.is_empty() {
            keys.insert(FieldKey::Null);
        } else if keys.len() > 1 {
            keys.shift_remove(&FieldKey::Null);
        }

        if keys.contains(&FieldKey::Increment) {
            if data_type != DataType::Int {
                return Err(StoreError::invalid_declaration(format!(
                    "{} requires type {}, got {}",
                    FieldKey::Increment,
                    DataType::Int,
                    data_type
                )));
            }

            if !keys.contains(&FieldKey::Primary) {
                return Err(StoreError::invalid_declaration(format!(
                    "{} requires {}",
                    FieldKey::Increment,
                    FieldKey::Primary
                )));
            }

            if default.is_some() {
                return Err(StoreError::invalid_declaration(format!(
                    "{} does not allow a default value",
                    FieldKey::Increment
                )));
            }
        }

        if keys.contains(&FieldKey::Unique) && default.is_some() {
            return Err(StoreError::invalid_declaration(format!(
                "{} does not allow a default value",
                FieldKey::Unique
            )));
        }

        if let Some(value) = default.as_ref() {
            if value.data_type() != data_type {
                return Err(StoreError::TypeMismatch {
                    expected: data_type,
                    found: value.data_type().to_string(),
                });
            }

            if !value.is_finite() {
                return Err(StoreError::invalid_declaration(format!(
                    "default {} is not a finite number",
                    value
                )));
            }
        }

        Ok(Field {
            data_type,
            keys,
            default,
            values: Vec::new(),
        })
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.keys.iter().copied()
    }

    pub fn has_key(&self, key: FieldKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> StoreResult<Option<&Value>> {
        self.check_index(index)?;
        Ok(self.values[index].as_ref())
    }

    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn add(&mut self, value: Option<Value>) -> StoreResult<()> {
        //! Append one row.
        //!
        //! A missing value takes the next auto increment number on an
        //! [`FieldKey::Increment`] field, otherwise the declared default.

        let value = self.resolve(value)?;
        self.push_resolved(value);
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> StoreResult<Option<Value>> {
        //! Remove the row at `index`, shifting later rows down by one.
        //!
        //! Returns the removed value.

        self.check_index(index)?;
        Ok(self.values.remove(index))
    }

    pub fn modify(&mut self, index: usize, value: Option<Value>) -> StoreResult<()> {
        //! Replace the value at `index` in place.
        //!
        //! Runs the same checks as [`Field::add`], except that the value being
        //! overwritten does not count against uniqueness. A null on an increment
        //! field takes the next number; the default is never substituted here.

        self.check_index(index)?;
        let value = self.check(value, Some(index), Fill::Modify)?;
        self.values[index] = value;
        Ok(())
    }

    pub(crate) fn resolve(&self, value: Option<Value>) -> StoreResult<Option<Value>> {
        //! Resolve and validate the value an [`Field::add`] would append,
        //! without appending it.

        self.check(value, None, Fill::Add)
    }

    pub(crate) fn push_resolved(&mut self, value: Option<Value>) {
        self.values.push(value);
    }

    fn is_unique(&self) -> bool {
        self.has_key(FieldKey::Primary) || self.has_key(FieldKey::Unique)
    }

    fn is_not_null(&self) -> bool {
        self.has_key(FieldKey::Primary) || self.has_key(FieldKey::NotNull)
    }

    fn next_increment(&self) -> StoreResult<i64> {
        match self.values.iter().flatten().filter_map(Value::as_int).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| {
                StoreError::invalid_declaration(format!(
                    "{} exhausted, {} is the largest value",
                    FieldKey::Increment,
                    max
                ))
            }),
        }
    }

    fn check_index(&self, index: usize) -> StoreResult<()> {
        if index < self.values.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                index,
                rows: self.values.len(),
            })
        }
    }

    fn check(
        &self,
        value: Option<Value>,
        skip: Option<usize>,
        fill: Fill,
    ) -> StoreResult<Option<Value>> {
        let value = match value {
            Some(value) => Some(value),
            None if fill == Fill::Replay => None,
            None if self.has_key(FieldKey::Increment) => Some(Value::Int(self.next_increment()?)),
            None if fill == Fill::Add => self.default.clone(),
            None => None,
        };

        let Some(value) = value else {
            if self.is_not_null() {
                return Err(StoreError::NotNullViolation);
            }
            return Ok(None);
        };

        if value.data_type() != self.data_type {
            return Err(StoreError::TypeMismatch {
                expected: self.data_type,
                found: value.data_type().to_string(),
            });
        }

        // Non-finite floats have no JSON form and would not survive a commit.
        if !value.is_finite() {
            return Err(StoreError::TypeMismatch {
                expected: self.data_type,
                found: value.to_string(),
            });
        }

        if self.is_unique() {
            let taken = self
                .values
                .iter()
                .enumerate()
                .any(|(index, existing)| Some(index) != skip && existing.as_ref() == Some(&value));

            if taken {
                return Err(StoreError::UniquenessViolation { value });
            }
        }

        Ok(Some(value))
    }

    pub fn serialize(&self) -> StoreResult<String> {
        let record = FieldRecord {
            keys: self.keys().collect(),
            data_type: self.data_type,
            values: self.values.clone(),
            default: self.default.clone(),
        };

        Ok(serde_json::to_string(&record)?)
    }

    pub fn deserialize(blob: &str) -> StoreResult<Field> {
        //! Rebuild a field from its persisted blob.
        //!
        //! Every stored value is replayed through the same checks as
        //! [`Field::add`], so a snapshot that breaks a declared constraint fails
        //! to load. Stored nulls stay null, so a null in a NOT NULL column fails
        //! instead of taking the default or an auto increment number.

        let record: FieldRecord = serde_json::from_str(blob)?;
        let mut field = Field::new(record.data_type, record.keys, record.default)?;

        for value in record.values {
            let value = field.check(value, None, Fill::Replay)?;
            field.push_resolved(value);
        }

        Ok(field)
    }
}
