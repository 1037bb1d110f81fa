use indexmap::IndexMap;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, StoreError, StoreResult};

use super::field::Field;
use super::table::Table;

/// The collective of multiple [`Table`] objects.
///
/// A [`Database`] is a named registry of tables, nothing more: all row level
/// work is delegated to the [`Table`] itself. Table names keep their creation
/// order so a snapshot lists them the same way every time.
#[derive(Debug, Clone, PartialEq)]
pub struct Database {
    name: String,
    tables: IndexMap<String, Table>,
}

/// The persisted shape of a [`Database`]. Each table blob is itself a JSON
/// text produced by [`Table::serialize`].
#[derive(Serialize, Deserialize)]
struct DatabaseRecord {
    name: String,
    tables: Vec<(String, String)>,
}

impl Database {
    pub fn new(name: &str) -> Database {
        //! Create a new database with no tables.

        Database {
            name: name.to_string(),
            tables: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_table(&mut self, name: &str, fields: Vec<(String, Field)>) -> StoreResult<&mut Table> {
        //! Create a [`Table`] from its named fields and register it.

        if self.tables.contains_key(name) {
            return Err(StoreError::DuplicateEntity {
                kind: EntityKind::Table,
                name: name.to_string(),
            });
        }

        let table = Table::from_fields(fields)?;
        info!("table '{}' created in database '{}'", name, self.name);

        Ok(self.tables.entry(name.to_string()).or_insert(table))
    }

    pub fn add_table(&mut self, name: &str, table: Table) -> StoreResult<()> {
        //! Register an already built table, e.g. one restored from a snapshot.

        if self.tables.contains_key(name) {
            return Err(StoreError::DuplicateEntity {
                kind: EntityKind::Table,
                name: name.to_string(),
            });
        }

        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> StoreResult<Table> {
        let table = self
            .tables
            .shift_remove(name)
            .ok_or_else(|| StoreError::NotFound {
                kind: EntityKind::Table,
                name: name.to_string(),
            })?;

        info!("table '{}' dropped from database '{}'", name, self.name);
        Ok(table)
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn serialize(&self) -> StoreResult<String> {
        let tables = self
            .tables
            .iter()
            .map(|(name, table)| table.serialize().map(|blob| (name.clone(), blob)))
            .collect::<StoreResult<Vec<_>>>()?;

        let record = DatabaseRecord {
            name: self.name.clone(),
            tables,
        };

        Ok(serde_json::to_string(&record)?)
    }

    pub fn deserialize(blob: &str) -> StoreResult<Database> {
        //! Rebuild a database and every table in it from a snapshot blob.

        let record: DatabaseRecord = serde_json::from_str(blob)?;
        let mut database = Database::new(&record.name);

        for (name, table_blob) in record.tables {
            database.add_table(&name, Table::deserialize(&table_blob)?)?;
        }

        Ok(database)
    }
}
