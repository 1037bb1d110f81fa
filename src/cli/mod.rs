use std::io::{self, Write};

use colored::Colorize;
use log::error;
use sqlparser::dialect::MySqlDialect;

use crate::{
    cli::{
        colors::FERRITE_RUST,
        messages::{highlight_argument, hint, system_message},
        parsers::SqlParser,
    },
    config::Config,
    persistence::DatabaseRegistry,
    sessions::session::Session,
};

mod colors;
mod commands;
mod messages;
pub mod parsers;
mod splash_screen;

pub use commands::{SqlExecutor, SqlResult};

const DEFAULT_LAST_COMMAND_DELIMITER: &str = "!";

const FERRITE_ENGINE_COMMANDS_LIST: [(&str, &str); 4] = [
    ("!", "execute the last command, add more to go further back"),
    ("help", "list all available commands"),
    ("history", "list command history for this session"),
    (
        "corrode",
        "iron corrodes and so does this session when you exit",
    ),
];

pub fn run_client(config: Config, load: bool) {
    splash_screen::splash_screen();

    let mut registry = DatabaseRegistry::with_config(&config);

    println!(
        "{}",
        system_message(
            "info",
            format!(
                "A database registry was created, snapshots go to '{}'.",
                highlight_argument(&config.data_path.display().to_string())
            )
        )
    );

    if load {
        match registry.rollback() {
            Ok(true) => println!(
                "{}",
                system_message("store", "Loaded the last committed snapshot.".to_string())
            ),
            Ok(false) => println!(
                "{}",
                system_message("store", "No snapshot found, starting empty.".to_string())
            ),
            Err(error) => {
                error!("failed to load snapshot: {}", error);
                println!("{}", system_message("store", error.to_string()));
            }
        }
    }

    start_repl(Session::client(registry));
}

pub fn show_help() {
    println!(
        "{}",
        system_message(
            "info",
            format!(
                "Any other statements are considered {}.",
                highlight_argument("sql statements")
            )
        )
    );
    println!(
        "{}",
        hint("Changes live in memory until COMMIT; ROLLBACK restores the last commit.")
    );

    println!();
    println!("{:10} {}", "COMMAND".color(FERRITE_RUST), "DETAILS");
    for (command, details) in FERRITE_ENGINE_COMMANDS_LIST {
        println!("{:10} {}", command.color(FERRITE_RUST), details)
    }
}

pub fn execute_sql(session: &mut Session, sql: &str) -> Result<SqlResult, String> {
    //! Parse a single statement and run it against the session's registry.

    let dialect = Box::new(MySqlDialect {});
    let parser = SqlParser::new(dialect);

    let statement = parser.parse_single_sql(sql)?;
    SqlExecutor::new(statement).execute(session)
}

fn run_statement(session: &mut Session, sql: &str) -> Option<SqlResult> {
    match execute_sql(session, sql) {
        Ok(result) => {
            println!(
                "{}",
                system_message(
                    "ferrite",
                    format!(
                        "{} row(s) processed!",
                        result.n_rows_processed.unwrap_or(0)
                    )
                )
            );
            Some(result)
        }
        Err(error) => {
            println!("{}", error);
            None
        }
    }
}

fn start_repl(mut session: Session) {
    println!(
        "{}",
        system_message(
            "system",
            format!(
                "Use '{}' to quit and '{}' to know all commands available.",
                highlight_argument("corrode"),
                highlight_argument("help"),
            ),
        )
    );

    println!(
        "{}",
        system_message(
            "system",
            format!(
                "New session initiated at '{}'.",
                highlight_argument(&session.start_time_string())
            ),
        )
    );

    loop {
        println!();
        print!("{:7} > ", "ferrite".color(FERRITE_RUST).bold());
        if io::stdout().flush().is_err() {
            break;
        }

        let mut buffer = String::new();
        match io::stdin().read_line(&mut buffer) {
            Ok(0) => break,
            Ok(_) => {}
            Err(error) => {
                error!("failed to read from stdin: {}", error);
                break;
            }
        }

        if buffer.starts_with(DEFAULT_LAST_COMMAND_DELIMITER) {
            let last = buffer.matches(DEFAULT_LAST_COMMAND_DELIMITER).count();

            match session.get_last_command(last) {
                Some(command) => buffer = command.to_string(),
                None => {
                    println!(
                        "{}",
                        system_message(
                            "system",
                            format!(
                                "No command {} steps back.",
                                highlight_argument(&last.to_string())
                            ),
                        )
                    );
                    continue;
                }
            }
        }

        let command = buffer.trim();
        if command.is_empty() {
            continue;
        }

        session.add_to_command_history(command);

        match command {
            "history" => session.show_command_history(None),
            "help" => show_help(),
            "exit" => println!("did you mean '{}'?", "corrode".color(FERRITE_RUST)),
            "corrode" => break,
            sql => {
                if let Some(result) = run_statement(&mut session, sql) {
                    if result.rows.is_some() {
                        print!("{}", result);
                    }
                }
            }
        }
    }

    println!("Goodbye!")
}
