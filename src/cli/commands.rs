//! This module where all the commands are stored.
//!
//! Ferrite command line syntax:
//!
//! - ferrite --help | Command Line Help
//! - ferrite client | Run the CLI app.
//!
//! Once the user is inside the REPL, SQL parser takes over. Every statement
//! is translated onto the [`crate::persistence::DatabaseRegistry`] API:
//!
//! - CREATE DATABASE db; DROP DATABASE db; USE db; SHOW DATABASES;
//! - CREATE TABLE table (col TYPE [PRIMARY KEY] [AUTO_INCREMENT] [UNIQUE] [NOT NULL] [DEFAULT v], ...);
//! - DROP TABLE table; SHOW TABLES;
//! - INSERT INTO table [(cols*)] VALUES (values)*;
//! - SELECT cols*|* FROM table [WHERE col = v AND ...] [ORDER BY col DESC];
//! - UPDATE table SET col = v, ... [WHERE ...];
//! - DELETE FROM table [WHERE ...];
//! - COMMIT; ROLLBACK;
//!
//! Here * means more than one such values separated by a comma. A WHERE clause
//! only accepts equality checks joined by AND (and `col IS NULL`).

use std::fmt::Display;

use sqlparser::ast::{
    self, Assignment, BinaryOperator, ColumnDef, ColumnOption, Expr, ObjectName, SelectItem,
    SetExpr, Statement, TableFactor, TableObject, TableWithJoins, Use, ValueWithSpan,
};

use crate::cli::messages::{highlight_argument, system_message};
use crate::error::StoreError;
use crate::persistence::{
    Assignments, DataType, Field, FieldKey, Projection, Row, SortOrder, Value,
};
use crate::sessions::session::Session;

/// The executor class that runs the statements.
///
/// Every statement needs an executor to be run. The executor translates the
/// parsed statement into calls on the session's registry and never touches
/// tables or fields directly.
pub struct SqlExecutor {
    statement: Statement,
}

/// After a query runs and completes its execution, the result of the query
/// needs to be displayed in some cases on the terminal.
///
/// The [`SqlResult`] is a simple struct that stores the displayable rows
/// (with their column header) and returns them to the main terminal loop.
pub struct SqlResult {
    pub header: Vec<String>,
    pub rows: Option<Vec<Row>>,
    pub n_rows_processed: Option<usize>,
}

impl SqlResult {
    fn processed(n_rows: usize) -> SqlResult {
        SqlResult {
            header: vec![],
            rows: None,
            n_rows_processed: Some(n_rows),
        }
    }
}

impl Display for SqlResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(rows) = self.rows.as_ref() {
            writeln!(f, "{}", self.header.join(" | "))?;
            for row in rows {
                writeln!(f, "{}", row)?;
            }
        }
        Ok(())
    }
}

fn store_error(error: StoreError) -> String {
    system_message("store", error.to_string())
}

impl SqlExecutor {
    pub fn new(statement: Statement) -> SqlExecutor {
        SqlExecutor { statement }
    }

    fn _parse_object_name(&self, obj_name: &ObjectName) -> Result<String, String> {
        //! Parse the annoying name object and obtain its string value.

        obj_name
            .0
            .iter()
            .map(|part| {
                part.as_ident()
                    .map(|ident| ident.value.clone())
                    .ok_or_else(|| format!("Invalid object name '{}'.", obj_name))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|parts| parts.join("."))
    }

    fn _extract_table_name(&self, table_with_joins: &TableWithJoins) -> Result<String, String> {
        match &table_with_joins.relation {
            TableFactor::Table { name, .. } => self._parse_object_name(name),
            _ => Err(system_message(
                "exctr",
                "Invalid table name format.".to_string(),
            )),
        }
    }

    fn _parse_value(&self, value: &ValueWithSpan) -> Result<Option<Value>, String> {
        //! Match the [`ast::Value`] object properly to its subtype and return
        //! the engine value. `NULL` becomes [`None`].

        match &value.value {
            ast::Value::Number(number, _) => {
                if let Ok(int) = number.parse::<i64>() {
                    Ok(Some(Value::Int(int)))
                } else if let Ok(float) = number.parse::<f64>() {
                    Ok(Some(Value::Float(float)))
                } else {
                    Err(format!("Invalid number {}.", highlight_argument(number)))
                }
            }
            ast::Value::SingleQuotedString(string) | ast::Value::DoubleQuotedString(string) => {
                Ok(Some(Value::Str(string.clone())))
            }
            ast::Value::Boolean(boolean) => Ok(Some(Value::Bool(*boolean))),
            ast::Value::Null => Ok(None),
            _ => Err(system_message(
                "system",
                format!(
                    "Unsupported value: {}",
                    highlight_argument(&value.to_string())
                ),
            )),
        }
    }

    fn _parse_literal(&self, expr: &Expr) -> Result<Option<Value>, String> {
        match expr {
            Expr::Value(value) => self._parse_value(value),
            Expr::Nested(inner) => self._parse_literal(inner),
            Expr::UnaryOp { op, expr } => match (op, self._parse_literal(expr)?) {
                (ast::UnaryOperator::Minus, Some(Value::Int(int))) => Ok(Some(Value::Int(-int))),
                (ast::UnaryOperator::Minus, Some(Value::Float(float))) => {
                    Ok(Some(Value::Float(-float)))
                }
                _ => Err(system_message(
                    "system",
                    "Unsupported unary operator.".to_string(),
                )),
            },
            _ => Err(system_message(
                "system",
                format!("Unsupported value {}. Check your query.", highlight_argument(&expr.to_string())),
            )),
        }
    }

    fn _parse_identifier(&self, expr: &Expr) -> Result<String, String> {
        match expr {
            Expr::Identifier(ident) => Ok(ident.value.clone()),
            Expr::CompoundIdentifier(idents) => idents
                .last()
                .map(|ident| ident.value.clone())
                .ok_or_else(|| "Invalid column name.".to_string()),
            _ => Err(format!(
                "Expected a column name, got {}.",
                highlight_argument(&expr.to_string())
            )),
        }
    }

    fn _add_condition(
        &self,
        conditions: &mut Assignments,
        column: String,
        value: Option<Value>,
    ) -> Result<(), String> {
        //! A column may only be compared once per WHERE clause.

        if conditions.contains_key(&column) {
            return Err(format!(
                "Column {} is compared more than once in the filter.",
                highlight_argument(&column)
            ));
        }

        conditions.insert(column, value);
        Ok(())
    }

    fn _parse_selection(&self, selection: &Expr, conditions: &mut Assignments) -> Result<(), String> {
        //! Flatten a WHERE clause into equality conditions.
        //!
        //! Only `col = value`, `col IS NULL` and their AND combinations are
        //! accepted, since a row matches when all conditions hold.

        match selection {
            Expr::Nested(inner) => self._parse_selection(inner, conditions),
            Expr::BinaryOp { left, op, right } => match op {
                BinaryOperator::And => {
                    self._parse_selection(left, conditions)?;
                    self._parse_selection(right, conditions)
                }
                BinaryOperator::Eq => {
                    let (column, value) = match self._parse_identifier(left) {
                        Ok(column) => (column, self._parse_literal(right)?),
                        Err(_) => (self._parse_identifier(right)?, self._parse_literal(left)?),
                    };
                    self._add_condition(conditions, column, value)
                }
                _ => Err(format!(
                    "Invalid query filter {}; only '=' joined by AND is supported.",
                    highlight_argument(&op.to_string())
                )),
            },
            Expr::IsNull(expr) => {
                let column = self._parse_identifier(expr)?;
                self._add_condition(conditions, column, None)
            }
            _ => Err(format!("Invalid column selection. Check your query.")),
        }
    }

    fn _conditions(&self, selection: Option<&Expr>) -> Result<Assignments, String> {
        let mut conditions = Assignments::new();
        if let Some(selection) = selection {
            self._parse_selection(selection, &mut conditions)?;
        }
        Ok(conditions)
    }

    fn _coerce(&self, session: &Session, table_name: &str, data: Assignments) -> Assignments {
        //! Integer literals written into FLOAT fields become floats; the SQL
        //! text can't tell `1` from `1.0` the way the user meant it.

        let Ok(table) = session.registry().get_table(table_name) else {
            return data;
        };

        data.into_iter()
            .map(|(column, value)| {
                let is_float = table
                    .field(&column)
                    .is_some_and(|field| field.data_type() == DataType::Float);

                match value {
                    Some(Value::Int(int)) if is_float => (column, Some(Value::Float(int as f64))),
                    other => (column, other),
                }
            })
            .collect()
    }

    fn _parse_assignment(&self, assignment: &Assignment) -> Result<(String, Option<Value>), String> {
        let col_name = match &assignment.target {
            ast::AssignmentTarget::ColumnName(object) => self._parse_object_name(object)?,
            _ => return Err(format!("Invalid column name. Check your query.")),
        };
        let value = self._parse_literal(&assignment.value)?;

        Ok((col_name, value))
    }

    fn _extract_field(&self, column_definition: &ColumnDef) -> Result<(String, Field), String> {
        //! Build a [`Field`] from a [`ColumnDef`]: the SQL type picks the
        //! field type and the column options become key constraints.

        let col_name = column_definition.name.value.clone();

        let data_type = match &column_definition.data_type {
            ast::DataType::Int(_) | ast::DataType::Integer(_) | ast::DataType::BigInt(_) => {
                DataType::Int
            }
            ast::DataType::Varchar(_) | ast::DataType::Char(_) | ast::DataType::Text => DataType::Str,
            ast::DataType::Float(_) | ast::DataType::Real => DataType::Float,
            ast::DataType::Bool | ast::DataType::Boolean => DataType::Bool,
            other => {
                return Err(format!(
                    "Invalid type {} for column {}",
                    highlight_argument(&other.to_string()),
                    col_name
                ));
            }
        };

        let mut keys = vec![];
        let mut default = None;

        for option in column_definition.options.iter() {
            match &option.option {
                ColumnOption::PrimaryKey(_) => keys.push(FieldKey::Primary),
                ColumnOption::Unique(_) => keys.push(FieldKey::Unique),
                ColumnOption::NotNull => keys.push(FieldKey::NotNull),
                ColumnOption::Null => keys.push(FieldKey::Null),
                ColumnOption::Default(expr) => {
                    default = self._parse_literal(expr)?;
                    if data_type == DataType::Float {
                        if let Some(Value::Int(int)) = default {
                            default = Some(Value::Float(int as f64));
                        }
                    }
                }
                ColumnOption::DialectSpecific(tokens)
                    if tokens
                        .iter()
                        .any(|token| token.to_string().eq_ignore_ascii_case("AUTO_INCREMENT")) =>
                {
                    keys.push(FieldKey::Increment)
                }
                _ => {
                    return Err(format!(
                        "Invalid option {} for column {}",
                        highlight_argument(&option.option.to_string()),
                        col_name
                    ));
                }
            }
        }

        let field = Field::new(data_type, keys, default).map_err(store_error)?;
        Ok((col_name, field))
    }

    fn _execute_select(&self, query: &ast::Query, session: &Session) -> Result<SqlResult, String> {
        let select = match query.body.as_ref() {
            SetExpr::Select(select) => select,
            _ => {
                return Err(system_message(
                    "exctr",
                    "This type of query is not handled by the engine yet!".to_string(),
                ));
            }
        };

        let table_with_joins = select.from.first().ok_or(system_message(
            "exctr",
            "There is no table name after FROM keyword.".to_string(),
        ))?;
        let table_name = self._extract_table_name(table_with_joins)?;

        let mut columns = vec![];
        let mut wildcard = false;

        for item in &select.projection {
            match item {
                SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(_, _) => wildcard = true,
                SelectItem::UnnamedExpr(expr) => columns.push(self._parse_identifier(expr)?),
                _ => {
                    return Err(system_message(
                        "exctr",
                        format!("Invalid column identifier expression '{}'!", item),
                    ));
                }
            }
        }

        let projection = if wildcard {
            Projection::All
        } else {
            Projection::Fields(columns.clone())
        };

        let mut sort = SortOrder::Asc;
        if let Some(order_by) = query.order_by.as_ref() {
            if let ast::OrderByKind::Expressions(expressions) = &order_by.kind {
                if expressions.iter().any(|order| order.options.asc == Some(false)) {
                    sort = SortOrder::Desc;
                }
            }

            println!(
                "{}",
                system_message(
                    "sorter",
                    format!(
                        "Rows are ordered by insertion, {}.",
                        highlight_argument(if sort == SortOrder::Desc { "newest first" } else { "oldest first" })
                    )
                )
            );
        }

        let conditions = self._conditions(select.selection.as_ref())?;
        let conditions = self._coerce(session, &table_name, conditions);

        let registry = session.registry();
        let rows = registry
            .search(&table_name, &projection, sort, &conditions)
            .map_err(store_error)?;

        let header = if wildcard {
            registry
                .get_table(&table_name)
                .map_err(store_error)?
                .field_names()
        } else {
            columns
        };

        Ok(SqlResult {
            header,
            n_rows_processed: Some(rows.len()),
            rows: Some(rows),
        })
    }

    fn _execute_insert(&self, insert: &ast::Insert, session: &mut Session) -> Result<SqlResult, String> {
        let table_name = match &insert.table {
            TableObject::TableName(obj) => self._parse_object_name(obj)?,
            _ => return Err("Invalid table name. Please check your query.".to_string()),
        };

        let field_names = session
            .registry()
            .get_table(&table_name)
            .map_err(store_error)?
            .field_names();

        let columns: Vec<String> = if insert.columns.is_empty() {
            field_names
        } else {
            insert.columns.iter().map(|ident| ident.value.clone()).collect()
        };

        let query_body = insert.source.as_ref().ok_or(system_message(
            "system",
            "No values to insert.".to_string(),
        ))?;

        let query_rows = match query_body.body.as_ref() {
            SetExpr::Values(values) => &values.rows,
            _ => {
                return Err("Invalid values list. Please check your query.".to_string());
            }
        };

        let mut rows = Vec::with_capacity(query_rows.len());

        for row in query_rows {
            if row.len() != columns.len() {
                return Err(format!(
                    "Expected {} values, got {}.",
                    columns.len(),
                    row.len()
                ));
            }

            let mut data = Assignments::new();
            for (column, expr) in columns.iter().zip(row) {
                data.insert(column.clone(), self._parse_literal(expr)?);
            }

            rows.push(self._coerce(session, &table_name, data));
        }

        // All rows of one statement go in together or not at all.
        let n_insertions = session
            .registry_mut()
            .insert_many(&table_name, &rows)
            .map_err(store_error)?;

        Ok(SqlResult::processed(n_insertions))
    }

    pub fn execute(&self, session: &mut Session) -> Result<SqlResult, String> {
        //! Run the assigned statement against the session's registry.
        //!
        //! Returns the rows to display, if any, and the count of processed rows.

        match &self.statement {
            Statement::Query(query) => self._execute_select(query, session),
            Statement::Insert(insert) => self._execute_insert(insert, session),
            Statement::ShowTables { .. } => {
                let table_names = session.registry().get_table_names().map_err(store_error)?;

                if table_names.is_empty() {
                    println!("There are no tables in this database.");
                } else {
                    println!("There are {} tables in this database.", table_names.len());
                    for (index, table_name) in table_names.iter().enumerate() {
                        println!("{:5}. {:10}", index + 1, table_name);
                    }
                }

                Ok(SqlResult::processed(0))
            }
            Statement::CreateTable(create_table) => {
                let table_name = self._parse_object_name(&create_table.name)?;

                if !create_table.constraints.is_empty() {
                    return Err(format!(
                        "Table level constraints are not supported; declare keys on the columns of {}.",
                        highlight_argument(&table_name)
                    ));
                }

                let fields = create_table
                    .columns
                    .iter()
                    .map(|column_definition| self._extract_field(column_definition))
                    .collect::<Result<Vec<_>, _>>()?;

                session
                    .registry_mut()
                    .create_table(&table_name, fields)
                    .map_err(store_error)?;

                Ok(SqlResult::processed(0))
            }
            Statement::Delete(delete) => {
                let table_with_joins = match &delete.from {
                    ast::FromTable::WithFromKeyword(joins) | ast::FromTable::WithoutKeyword(joins) => {
                        joins.first().ok_or(system_message(
                            "exctr",
                            "There is no table name after FROM keyword.".to_string(),
                        ))?
                    }
                };
                let table_name = self._extract_table_name(table_with_joins)?;

                let conditions = self._conditions(delete.selection.as_ref())?;
                let conditions = self._coerce(session, &table_name, conditions);

                let deleted_row_count = session
                    .registry_mut()
                    .delete(&table_name, &conditions)
                    .map_err(store_error)?;

                Ok(SqlResult::processed(deleted_row_count))
            }
            Statement::Update(update) => {
                let table_name = self._extract_table_name(&update.table)?;

                let conditions = self._conditions(update.selection.as_ref())?;
                let conditions = self._coerce(session, &table_name, conditions);

                let mut updates = Assignments::new();
                for assignment in update.assignments.iter() {
                    let (column, value) = self._parse_assignment(assignment)?;
                    updates.insert(column, value);
                }
                let updates = self._coerce(session, &table_name, updates);

                let updated_row_count = session
                    .registry_mut()
                    .update(&table_name, &updates, &conditions)
                    .map_err(store_error)?;

                Ok(SqlResult::processed(updated_row_count))
            }
            Statement::CreateDatabase {
                db_name,
                if_not_exists,
                ..
            } => {
                let database_name = self._parse_object_name(db_name)?;

                session
                    .registry_mut()
                    .create_database(&database_name, *if_not_exists)
                    .map_err(store_error)?;

                Ok(SqlResult::processed(0))
            }
            Statement::Use(use_stmt) => {
                let db_name = match use_stmt {
                    Use::Object(db) => self._parse_object_name(db)?,
                    _ => {
                        return Err(system_message(
                            "system",
                            format!(
                                "No other case than {} is handled yet.",
                                highlight_argument("USE <db_name>")
                            ),
                        ));
                    }
                };

                session
                    .registry_mut()
                    .select_database(&db_name)
                    .map_err(store_error)?;

                Ok(SqlResult::processed(0))
            }
            Statement::ShowDatabases { .. } => {
                let database_names = session.registry().get_database_names();

                if database_names.is_empty() {
                    println!("There are no databases in the registry yet.");
                } else {
                    println!(
                        "There are {} databases in the registry.",
                        database_names.len()
                    );
                    for (index, db_name) in database_names.iter().enumerate() {
                        println!("{:5}. {:10}", index + 1, db_name);
                    }
                }

                Ok(SqlResult::processed(0))
            }
            Statement::Drop {
                object_type,
                if_exists,
                names,
                ..
            } => {
                let mut n_dropped = 0;

                for name in names {
                    let name = self._parse_object_name(name)?;
                    let registry = session.registry_mut();

                    let dropped = match object_type {
                        ast::ObjectType::Database => registry.drop_database(&name).map(|_| ()),
                        ast::ObjectType::Table => registry.drop_table(&name).map(|_| ()),
                        _ => {
                            return Err(system_message(
                                "system",
                                format!(
                                    "No other case than {} is handled yet.",
                                    highlight_argument("DROP DATABASE|TABLE <name>")
                                ),
                            ));
                        }
                    };

                    match dropped {
                        Ok(()) => n_dropped += 1,
                        Err(StoreError::NotFound { .. }) if *if_exists => {}
                        Err(error) => return Err(store_error(error)),
                    }
                }

                Ok(SqlResult::processed(n_dropped))
            }
            Statement::Commit { .. } => {
                session.registry().commit().map_err(store_error)?;

                println!(
                    "{}",
                    system_message(
                        "store",
                        format!(
                            "Committed to {}.",
                            highlight_argument(&session.registry().data_path().display().to_string())
                        )
                    )
                );

                Ok(SqlResult::processed(0))
            }
            Statement::Rollback { .. } => {
                let restored = session.registry_mut().rollback().map_err(store_error)?;

                let message = if restored {
                    "Rolled back to the last commit."
                } else {
                    "Nothing to roll back to; no commit was made yet."
                };
                println!("{}", system_message("store", message.to_string()));

                Ok(SqlResult::processed(0))
            }
            _ => Err(system_message(
                "exctr",
                "This statement is not handled by the engine yet!".to_string(),
            )),
        }
    }
}
