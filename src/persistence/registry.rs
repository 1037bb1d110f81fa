use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;

use crate::config::Config;
use crate::error::{EntityKind, StoreError, StoreResult};

use super::codec;
use super::database::Database;
use super::field::Field;
use super::row::{Row, RowFormat};
use super::table::{Assignments, Projection, SortOrder, Table};

/// A single place to store all databases.
///
/// The registry owns every [`Database`], remembers which one is currently
/// selected, and knows where its snapshot lives on disk. Table operations
/// always run against the selected database.
///
/// Simply, it is also based on an [`IndexMap`] registry pattern. The order
/// prevails and keys will always appear in the same order, in memory and in
/// the snapshot.
///
/// # Concurrency
/// A registry is a plain owned value with no interior locking. It is meant
/// for one writer at a time; callers that share it across threads have to
/// wrap it themselves (e.g. in an `RwLock`).
#[derive(Debug, Clone)]
pub struct DatabaseRegistry {
    registry: IndexMap<String, Database>,
    selected: Option<String>,
    data_path: PathBuf,
    row_format: RowFormat,
}

impl DatabaseRegistry {
    pub fn new(data_path: impl Into<PathBuf>) -> DatabaseRegistry {
        DatabaseRegistry {
            registry: IndexMap::new(),
            selected: None,
            data_path: data_path.into(),
            row_format: RowFormat::default(),
        }
    }

    pub fn with_config(config: &Config) -> DatabaseRegistry {
        let mut registry = DatabaseRegistry::new(config.data_path.clone());
        registry.row_format = config.row_format;
        registry
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn row_format(&self) -> RowFormat {
        self.row_format
    }

    pub fn set_row_format(&mut self, row_format: RowFormat) {
        self.row_format = row_format;
    }

    pub fn exists(&self, db_name: &str) -> bool {
        //! Check if a database already exists in the registry.

        self.registry.contains_key(db_name)
    }

    pub fn create_database(&mut self, db_name: &str, if_not_exists: bool) -> StoreResult<&mut Database> {
        //! Create a new database if it does not already exist.
        //!
        //! With `if_not_exists` an existing database of that name is returned
        //! instead of failing.

        if self.registry.contains_key(db_name) && !if_not_exists {
            return Err(StoreError::DuplicateEntity {
                kind: EntityKind::Database,
                name: db_name.to_string(),
            });
        }

        if !self.registry.contains_key(db_name) {
            info!("database '{}' created", db_name);
        }

        Ok(self
            .registry
            .entry(db_name.to_string())
            .or_insert_with(|| Database::new(db_name)))
    }

    pub fn drop_database(&mut self, db_name: &str) -> StoreResult<Database> {
        //! Delete an existing database, deselecting it if it was selected.

        let database = self
            .registry
            .shift_remove(db_name)
            .ok_or_else(|| StoreError::NotFound {
                kind: EntityKind::Database,
                name: db_name.to_string(),
            })?;

        if self.selected.as_deref() == Some(db_name) {
            self.selected = None;
        }

        info!("database '{}' dropped", db_name);
        Ok(database)
    }

    pub fn select_database(&mut self, db_name: &str) -> StoreResult<()> {
        //! Set the currently active database for future table operations.

        if !self.registry.contains_key(db_name) {
            return Err(StoreError::NotFound {
                kind: EntityKind::Database,
                name: db_name.to_string(),
            });
        }

        self.selected = Some(db_name.to_string());
        Ok(())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn get_database(&self, db_name: &str) -> Option<&Database> {
        self.registry.get(db_name)
    }

    pub fn get_database_names(&self) -> Vec<String> {
        //! Get a list of all available databases in the registry.

        self.registry.keys().cloned().collect()
    }

    pub fn active(&self) -> StoreResult<&Database> {
        self.selected
            .as_ref()
            .and_then(|name| self.registry.get(name))
            .ok_or(StoreError::NoDatabaseSelected)
    }

    pub fn active_mut(&mut self) -> StoreResult<&mut Database> {
        self.selected
            .as_ref()
            .and_then(|name| self.registry.get_mut(name))
            .ok_or(StoreError::NoDatabaseSelected)
    }

    pub fn create_table(&mut self, table_name: &str, fields: Vec<(String, Field)>) -> StoreResult<()> {
        self.active_mut()?.create_table(table_name, fields)?;
        Ok(())
    }

    pub fn drop_table(&mut self, table_name: &str) -> StoreResult<Table> {
        self.active_mut()?.drop_table(table_name)
    }

    pub fn get_table_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.active()?.table_names())
    }

    pub fn get_table(&self, table_name: &str) -> StoreResult<&Table> {
        self.active()?
            .get_table(table_name)
            .ok_or_else(|| StoreError::NotFound {
                kind: EntityKind::Table,
                name: table_name.to_string(),
            })
    }

    fn get_table_mut(&mut self, table_name: &str) -> StoreResult<&mut Table> {
        self.active_mut()?
            .get_table_mut(table_name)
            .ok_or_else(|| StoreError::NotFound {
                kind: EntityKind::Table,
                name: table_name.to_string(),
            })
    }

    pub fn insert(&mut self, table_name: &str, data: &Assignments) -> StoreResult<usize> {
        self.get_table_mut(table_name)?.insert(data)
    }

    pub fn insert_many(&mut self, table_name: &str, rows: &[Assignments]) -> StoreResult<usize> {
        self.get_table_mut(table_name)?.insert_many(rows)
    }

    pub fn search(
        &self,
        table_name: &str,
        projection: &Projection,
        sort: SortOrder,
        conditions: &Assignments,
    ) -> StoreResult<Vec<Row>> {
        //! Search the named table, shaping rows by the registry's [`RowFormat`].

        self.get_table(table_name)?
            .search(projection, sort, self.row_format, conditions)
    }

    pub fn update(&mut self, table_name: &str, data: &Assignments, conditions: &Assignments) -> StoreResult<usize> {
        self.get_table_mut(table_name)?.update(data, conditions)
    }

    pub fn delete(&mut self, table_name: &str, conditions: &Assignments) -> StoreResult<usize> {
        self.get_table_mut(table_name)?.delete(conditions)
    }

    pub fn serialize(&self) -> StoreResult<String> {
        //! Serialize every database into one snapshot text: a JSON array of
        //! database blobs.

        let blobs = self
            .registry
            .values()
            .map(Database::serialize)
            .collect::<StoreResult<Vec<String>>>()?;

        Ok(serde_json::to_string(&blobs)?)
    }

    pub fn deserialize(text: &str) -> StoreResult<IndexMap<String, Database>> {
        //! Decode a snapshot text into its databases. An empty text is an
        //! empty snapshot.

        let mut databases = IndexMap::new();

        if text.trim().is_empty() {
            return Ok(databases);
        }

        let blobs: Vec<String> = serde_json::from_str(text)?;

        for blob in blobs {
            let database = Database::deserialize(&blob)?;

            if databases.contains_key(database.name()) {
                return Err(StoreError::DuplicateEntity {
                    kind: EntityKind::Database,
                    name: database.name().to_string(),
                });
            }

            databases.insert(database.name().to_string(), database);
        }

        Ok(databases)
    }

    pub fn commit(&self) -> StoreResult<()> {
        //! Write the whole registry to the snapshot file.

        codec::write_snapshot(&self.data_path, &self.serialize()?)?;
        info!(
            "committed {} databases to {}",
            self.registry.len(),
            self.data_path.display()
        );

        Ok(())
    }

    pub fn rollback(&mut self) -> StoreResult<bool> {
        //! Replace the in-memory databases with the last committed snapshot.
        //!
        //! Returns `false` and changes nothing when no snapshot file exists.
        //! This is a full replace: databases created since the commit are gone.
        //! The selection is kept if the snapshot has a database of that name.

        let Some(text) = codec::read_snapshot(&self.data_path)? else {
            info!("rollback skipped, no snapshot at {}", self.data_path.display());
            return Ok(false);
        };

        self.registry = DatabaseRegistry::deserialize(&text)?;

        if let Some(name) = self.selected.as_ref() {
            if !self.registry.contains_key(name) {
                self.selected = None;
            }
        }

        info!(
            "rolled back to {} databases from {}",
            self.registry.len(),
            self.data_path.display()
        );

        Ok(true)
    }
}
