use std::fs;

use ferrite_store::StoreError;
use ferrite_store::config::Config;
use ferrite_store::persistence::{
    Assignments, DataType, DatabaseRegistry, Field, FieldKey, Projection, Row, RowFormat,
    SortOrder, Value, obfuscate, reveal,
};
use tempfile::TempDir;

fn _values(pairs: Vec<(&str, Option<Value>)>) -> Assignments {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn _prepare_registry(dir: &TempDir) -> DatabaseRegistry {
    let mut registry = DatabaseRegistry::new(dir.path().join("db.data"));
    registry.set_row_format(RowFormat::Sequence);
    registry.create_database("shop", false).unwrap();
    registry.select_database("shop").unwrap();
    registry
        .create_table(
            "users",
            vec![
                (
                    "id".to_string(),
                    Field::new(DataType::Int, vec![FieldKey::Primary, FieldKey::Increment], None)
                        .unwrap(),
                ),
                (
                    "name".to_string(),
                    Field::new(DataType::Str, vec![FieldKey::NotNull], None).unwrap(),
                ),
            ],
        )
        .unwrap();
    registry
}

fn _search_all(registry: &DatabaseRegistry) -> Vec<Row> {
    registry
        .search("users", &Projection::All, SortOrder::Asc, &Assignments::new())
        .unwrap()
}

fn _row(id: i64, name: &str) -> Row {
    Row::Sequence(vec![Some(Value::Int(id)), Some(Value::from(name))])
}

#[test]
fn registry_walkthrough() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);

    registry.insert("users", &_values(vec![("name", Some("a".into()))])).unwrap();
    registry.insert("users", &_values(vec![("name", Some("b".into()))])).unwrap();
    assert_eq!(_search_all(&registry), vec![_row(1, "a"), _row(2, "b")]);

    let duplicate = registry.insert(
        "users",
        &_values(vec![("id", Some(2.into())), ("name", Some("c".into()))]),
    );
    assert!(matches!(
        duplicate.as_ref().map_err(StoreError::root_cause),
        Err(StoreError::UniquenessViolation { .. })
    ));

    let missing_name = registry.insert("users", &Assignments::new());
    assert!(matches!(
        missing_name.as_ref().map_err(StoreError::root_cause),
        Err(StoreError::NotNullViolation)
    ));
    assert_eq!(registry.get_table("users").unwrap().row_count(), 2);

    registry
        .delete("users", &_values(vec![("id", Some(1.into()))]))
        .unwrap();
    assert_eq!(_search_all(&registry), vec![_row(2, "b")]);

    registry
        .update(
            "users",
            &_values(vec![("name", Some("z".into()))]),
            &_values(vec![("id", Some(2.into()))]),
        )
        .unwrap();
    assert_eq!(_search_all(&registry), vec![_row(2, "z")]);
}

#[test]
fn registry_requires_selected_database() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = DatabaseRegistry::new(dir.path().join("db.data"));
    registry.create_database("shop", false).unwrap();

    assert!(matches!(
        registry.create_table("users", vec![]),
        Err(StoreError::NoDatabaseSelected)
    ));
    assert!(matches!(
        registry.insert("users", &Assignments::new()),
        Err(StoreError::NoDatabaseSelected)
    ));
    assert!(matches!(
        registry.get_table_names(),
        Err(StoreError::NoDatabaseSelected)
    ));
}

#[test]
fn registry_missing_table() {
    let dir = tempfile::tempdir().unwrap();
    let registry = _prepare_registry(&dir);

    assert!(matches!(
        registry.search("ghost", &Projection::All, SortOrder::Asc, &Assignments::new()),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn registry_database_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);

    assert!(matches!(
        registry.create_database("shop", false),
        Err(StoreError::DuplicateEntity { .. })
    ));
    registry.create_database("shop", true).unwrap();
    assert!(matches!(
        registry.select_database("ghost"),
        Err(StoreError::NotFound { .. })
    ));

    registry.drop_database("shop").unwrap();
    assert_eq!(registry.selected(), None);
    assert!(!registry.exists("shop"));
    assert!(matches!(
        registry.drop_database("shop"),
        Err(StoreError::NotFound { .. })
    ));
}

#[test]
fn registry_search_uses_configured_format() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);
    registry.set_row_format(RowFormat::Mapping);
    registry.insert("users", &_values(vec![("name", Some("a".into()))])).unwrap();

    let rows = _search_all(&registry);
    assert_eq!(rows[0].get("name"), Some(&Value::from("a")));
}

#[test]
fn registry_commit_then_rollback_restores_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);
    registry.insert("users", &_values(vec![("name", Some("a".into()))])).unwrap();
    registry.insert("users", &_values(vec![("name", Some("b".into()))])).unwrap();

    let before = registry.get_database("shop").unwrap().clone();
    registry.commit().unwrap();

    assert!(registry.rollback().unwrap());
    assert_eq!(registry.get_database("shop").unwrap(), &before);
    assert_eq!(registry.selected(), Some("shop"));
}

#[test]
fn registry_non_finite_float_never_reaches_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);
    registry
        .create_table(
            "readings",
            vec![(
                "x".to_string(),
                Field::new(DataType::Float, vec![FieldKey::NotNull], None).unwrap(),
            )],
        )
        .unwrap();

    registry.insert("readings", &_values(vec![("x", Some(Value::Float(0.5)))])).unwrap();
    let error = registry
        .insert("readings", &_values(vec![("x", Some(Value::Float(f64::INFINITY)))]))
        .unwrap_err();
    assert!(matches!(error.root_cause(), StoreError::TypeMismatch { .. }));

    let before = registry.get_database("shop").unwrap().clone();
    registry.commit().unwrap();

    assert!(registry.rollback().unwrap());
    assert_eq!(registry.get_database("shop").unwrap(), &before);
}

#[test]
fn registry_rollback_discards_uncommitted_changes() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);
    registry.insert("users", &_values(vec![("name", Some("a".into()))])).unwrap();
    registry.commit().unwrap();

    registry.insert("users", &_values(vec![("name", Some("b".into()))])).unwrap();
    registry.create_database("scratch", false).unwrap();
    registry.rollback().unwrap();

    assert_eq!(_search_all(&registry), vec![_row(1, "a")]);
    assert_eq!(registry.get_database_names(), vec!["shop".to_string()]);
}

#[test]
fn registry_rollback_without_snapshot_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);

    assert!(!registry.rollback().unwrap());
    assert!(registry.exists("shop"));
}

#[test]
fn registry_rollback_from_empty_file_empties_registry() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);
    fs::write(registry.data_path(), "").unwrap();

    assert!(registry.rollback().unwrap());
    assert!(registry.get_database_names().is_empty());
    assert_eq!(registry.selected(), None);
}

#[test]
fn registry_rollback_rejects_corrupted_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);
    fs::write(registry.data_path(), "%%% definitely not a snapshot %%%").unwrap();

    assert!(matches!(registry.rollback(), Err(StoreError::Format { .. })));
    assert!(registry.exists("shop"));
}

#[test]
fn registry_rollback_rejects_constraint_breaking_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);
    registry.insert("users", &_values(vec![("name", Some("a".into()))])).unwrap();
    registry.insert("users", &_values(vec![("name", Some("b".into()))])).unwrap();
    registry.commit().unwrap();

    // Hand edit the snapshot so both rows share id 1.
    let text = reveal(&fs::read(registry.data_path()).unwrap()).unwrap();
    let edited = text.replace("[1,2]", "[1,1]");
    assert_ne!(text, edited);
    fs::write(registry.data_path(), obfuscate(&edited)).unwrap();

    assert!(registry.rollback().is_err());
    assert_eq!(registry.get_table("users").unwrap().row_count(), 2);
}

#[test]
fn registry_snapshot_file_is_obfuscated() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = _prepare_registry(&dir);
    registry.insert("users", &_values(vec![("name", Some("visible".into()))])).unwrap();
    registry.commit().unwrap();

    let content = fs::read_to_string(registry.data_path()).unwrap();
    assert!(!content.contains("visible"));
    assert_eq!(reveal(content.as_bytes()).unwrap(), registry.serialize().unwrap());
}

#[test]
fn registry_with_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        data_path: dir.path().join("custom.data"),
        row_format: RowFormat::Sequence,
    };

    let registry = DatabaseRegistry::with_config(&config);

    assert_eq!(registry.data_path(), config.data_path.as_path());
    assert_eq!(registry.row_format(), RowFormat::Sequence);
}

#[test]
fn registry_deserialize_empty_text() {
    assert!(DatabaseRegistry::deserialize("").unwrap().is_empty());
    assert!(DatabaseRegistry::deserialize("[]").unwrap().is_empty());
}
