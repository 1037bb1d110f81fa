//! The only point of truth for all information that is related to the
//! current user session in the engine. A session will contain information
//! that is related to the command line session of the user. This includes
//! things like command history and the database registry the user works
//! against (which in turn remembers the currently selected database).
//!
//! At the end of a session the history is discarded. Anything not committed
//! to the snapshot file is discarded with it.

use std::{fmt::Display, time::SystemTime};

use chrono::{DateTime, Local};

use crate::persistence::DatabaseRegistry;

struct CommandHistory {
    command: String,
    command_time: SystemTime,
}

impl CommandHistory {
    pub fn command_time_string(&self) -> String {
        let datetime: DateTime<Local> = self.command_time.into();
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl Display for CommandHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.command_time_string(), self.command)
    }
}

pub struct Session {
    command_history: Vec<CommandHistory>,
    start_time: SystemTime,
    registry: DatabaseRegistry,
}

impl Session {
    pub fn client(registry: DatabaseRegistry) -> Session {
        //! Returns a new client session working on `registry`.

        Session {
            command_history: vec![],
            start_time: SystemTime::now(),
            registry,
        }
    }

    pub fn registry(&self) -> &DatabaseRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DatabaseRegistry {
        &mut self.registry
    }

    pub fn add_to_command_history(&mut self, command: &str) {
        self.command_history.push(CommandHistory {
            command: command.to_string(),
            command_time: SystemTime::now(),
        });
    }

    pub fn history_len(&self) -> usize {
        self.command_history.len()
    }

    pub fn start_time_string(&self) -> String {
        //! Convert the [`SystemTime`] object into a string representation
        //! to be more readable.

        let datetime: DateTime<Local> = self.start_time.into();
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    pub fn show_command_history(&self, n_prev: Option<usize>) {
        //! Show the list of previously invoked commands.
        //! Use `n_prev` to limit the number of commands you see.

        let limit = n_prev.unwrap_or(self.command_history.len());

        for (index, command) in self.command_history.iter().rev().enumerate() {
            if index < limit {
                println!("{:3} | {}", index, command);
            }
        }
    }

    pub fn get_last_command(&self, nth_back: usize) -> Option<&str> {
        //! Gets the `nth_back`th last command from the history.

        if nth_back == 0 {
            return None;
        }

        self.command_history
            .iter()
            .nth_back(nth_back - 1)
            .map(|cmd| cmd.command.as_str())
    }
}
