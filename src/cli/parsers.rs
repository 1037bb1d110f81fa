//! The place where CLI and SQL parsers are defined.
//!
//! When the functionality becomes extensive, they will
//! each have their own files.

use clap::{Parser, ValueEnum, arg, command};
use sqlparser::{ast::Statement, dialect::Dialect, parser};

use crate::cli::messages::{highlight_argument, system_message};

#[derive(Parser)]
#[command(name = "ferrite")]
#[command(about = "An embedded column-oriented record store", long_about = None)]
pub struct CliParser {
    // Operating mode, only the local client for now.
    #[arg(required = true)]
    pub mode: Option<CliMode>,

    // Snapshot file used by COMMIT and ROLLBACK, overrides FERRITE_DATA_PATH.
    #[arg(long)]
    pub data_path: Option<std::path::PathBuf>,

    // Roll back to the snapshot file before the first prompt.
    #[arg(long, default_value_t = false)]
    pub load: bool,
}

#[derive(Clone, ValueEnum)]
pub enum CliMode {
    // Start a REPL client instance (no-remote).
    Client,
}

/// An SQL parser that performs the parsing of the SQL statements.
///
/// For now, it only supports a single dialect, but in future, may support
/// multiple ones.
pub struct SqlParser {
    dialect: Box<dyn Dialect>,
}

impl SqlParser {
    pub fn new(dialect: Box<dyn Dialect>) -> SqlParser {
        SqlParser { dialect }
    }

    pub fn parse_sql(&self, statement: &str) -> Result<Vec<Statement>, String> {
        //! Parse one or more SQL queries at once.
        //!
        //! Returns an AST of statements.

        let ast = parser::Parser::parse_sql(self.dialect.as_ref(), statement);
        ast.map_err(|e| {
            system_message(
                "parser",
                format!(
                    "Error parsing query: {}",
                    highlight_argument(e.to_string().as_str())
                ),
            )
        })
    }

    pub fn parse_single_sql(&self, statement: &str) -> Result<Statement, String> {
        //! Parse only one SQL query at once.
        //!
        //! Returns an AST of the statement.

        let mut statements = self.parse_sql(statement)?;

        match statements.len() {
            0 => Err(system_message(
                "parser",
                "There is no statement to run.".to_string(),
            )),
            1 => Ok(statements.remove(0)),
            _ => Err(system_message(
                "parser",
                "Please write a single statement at a time.".to_string(),
            )),
        }
    }
}
