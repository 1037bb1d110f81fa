use ferrite_store::cli::execute_sql;
use ferrite_store::persistence::{DatabaseRegistry, Row, RowFormat, Value};
use ferrite_store::sessions::session::Session;
use tempfile::TempDir;

fn _prepare_session(dir: &TempDir) -> Session {
    let mut registry = DatabaseRegistry::new(dir.path().join("db.data"));
    registry.set_row_format(RowFormat::Sequence);
    let mut session = Session::client(registry);

    for sql in [
        "CREATE DATABASE shop",
        "USE shop",
        "CREATE TABLE users (id INT PRIMARY KEY AUTO_INCREMENT, name VARCHAR(50) NOT NULL, score FLOAT DEFAULT 1)",
    ] {
        execute_sql(&mut session, sql).unwrap();
    }

    session
}

fn _select(session: &mut Session, sql: &str) -> Vec<Row> {
    execute_sql(session, sql).unwrap().rows.unwrap()
}

#[test]
fn cli_create_table_declares_fields() {
    let dir = tempfile::tempdir().unwrap();
    let session = _prepare_session(&dir);

    let table = session.registry().get_table("users").unwrap();
    assert_eq!(table.field_names(), vec!["id", "name", "score"]);
    assert_eq!(
        table.field("score").unwrap().default_value(),
        Some(&Value::Float(1.0))
    );
}

#[test]
fn cli_insert_and_select() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);

    let result = execute_sql(&mut session, "INSERT INTO users (name) VALUES ('a'), ('b')").unwrap();
    assert_eq!(result.n_rows_processed, Some(2));

    let rows = _select(&mut session, "SELECT id, name FROM users WHERE name = 'b'");
    assert_eq!(
        rows,
        vec![Row::Sequence(vec![Some(Value::Int(2)), Some(Value::from("b"))])]
    );
}

#[test]
fn cli_select_wildcard_desc() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);
    execute_sql(&mut session, "INSERT INTO users (name, score) VALUES ('a', 2), ('b', 3.5)").unwrap();

    let result = execute_sql(&mut session, "SELECT * FROM users ORDER BY id DESC").unwrap();

    assert_eq!(result.header, vec!["id", "name", "score"]);
    assert_eq!(
        result.rows.unwrap(),
        vec![
            Row::Sequence(vec![Some(Value::Int(2)), Some("b".into()), Some(Value::Float(3.5))]),
            Row::Sequence(vec![Some(Value::Int(1)), Some("a".into()), Some(Value::Float(2.0))]),
        ]
    );
}

#[test]
fn cli_update_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);
    execute_sql(&mut session, "INSERT INTO users (name) VALUES ('a'), ('b'), ('c')").unwrap();

    let updated = execute_sql(&mut session, "UPDATE users SET name = 'z' WHERE id = 2").unwrap();
    assert_eq!(updated.n_rows_processed, Some(1));

    let deleted = execute_sql(&mut session, "DELETE FROM users WHERE id = 1 AND name = 'a'").unwrap();
    assert_eq!(deleted.n_rows_processed, Some(1));

    let rows = _select(&mut session, "SELECT name FROM users");
    assert_eq!(
        rows,
        vec![
            Row::Sequence(vec![Some("z".into())]),
            Row::Sequence(vec![Some("c".into())]),
        ]
    );
}

#[test]
fn cli_rejects_constraint_violations() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);
    execute_sql(&mut session, "INSERT INTO users (name) VALUES ('a')").unwrap();

    assert!(execute_sql(&mut session, "INSERT INTO users (id, name) VALUES (1, 'b')").is_err());
    assert!(execute_sql(&mut session, "INSERT INTO users (score) VALUES (2)").is_err());
    assert_eq!(session.registry().get_table("users").unwrap().row_count(), 1);
}

#[test]
fn cli_rejects_unsupported_filters() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);

    assert!(execute_sql(&mut session, "SELECT * FROM users WHERE id > 1").is_err());
    assert!(execute_sql(&mut session, "DELETE FROM users WHERE id = 1 OR id = 2").is_err());
}

#[test]
fn cli_rejects_repeated_filter_columns() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);
    execute_sql(&mut session, "INSERT INTO users (name) VALUES ('a'), ('b')").unwrap();

    assert!(execute_sql(&mut session, "SELECT * FROM users WHERE id = 1 AND id = 2").is_err());
    assert!(execute_sql(&mut session, "DELETE FROM users WHERE id = 1 AND (name = 'a' AND id = 2)").is_err());
    assert!(execute_sql(&mut session, "DELETE FROM users WHERE name IS NULL AND name = 'a'").is_err());
    assert_eq!(session.registry().get_table("users").unwrap().row_count(), 2);
}

#[test]
fn cli_multi_row_insert_is_atomic() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);
    execute_sql(&mut session, "INSERT INTO users (name) VALUES ('a')").unwrap();

    let result = execute_sql(
        &mut session,
        "INSERT INTO users (id, name) VALUES (5, 'b'), (6, 'c'), (1, 'd')",
    );
    assert!(result.is_err());

    let rows = _select(&mut session, "SELECT id FROM users");
    assert_eq!(rows, vec![Row::Sequence(vec![Some(Value::Int(1))])]);
}

#[test]
fn cli_commit_and_rollback() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);
    execute_sql(&mut session, "INSERT INTO users (name) VALUES ('a')").unwrap();
    execute_sql(&mut session, "COMMIT").unwrap();

    execute_sql(&mut session, "INSERT INTO users (name) VALUES ('b')").unwrap();
    execute_sql(&mut session, "DROP TABLE users").unwrap();
    execute_sql(&mut session, "ROLLBACK").unwrap();

    let rows = _select(&mut session, "SELECT name FROM users");
    assert_eq!(rows, vec![Row::Sequence(vec![Some("a".into())])]);
}

#[test]
fn cli_requires_selected_database() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DatabaseRegistry::new(dir.path().join("db.data"));
    let mut session = Session::client(registry);

    assert!(execute_sql(&mut session, "SELECT * FROM users").is_err());
}

#[test]
fn cli_drop_database_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);

    let result = execute_sql(&mut session, "DROP DATABASE IF EXISTS ghost").unwrap();
    assert_eq!(result.n_rows_processed, Some(0));
    assert!(execute_sql(&mut session, "DROP DATABASE ghost").is_err());

    execute_sql(&mut session, "DROP DATABASE shop").unwrap();
    assert!(session.registry().get_database_names().is_empty());
}

#[test]
fn session_history_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = _prepare_session(&dir);
    session.add_to_command_history("SHOW TABLES");
    session.add_to_command_history("SELECT * FROM users");

    assert_eq!(session.get_last_command(1), Some("SELECT * FROM users"));
    assert_eq!(session.get_last_command(2), Some("SHOW TABLES"));
    assert_eq!(session.get_last_command(3), None);
    assert_eq!(session.get_last_command(0), None);
}
