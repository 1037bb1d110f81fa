//! Runtime configuration.
//!
//! Values are read from the process environment after a `.env` file in the
//! working directory (if there is one) has been loaded into it.
//!
//! - `FERRITE_DATA_PATH`: snapshot file used by commit and rollback.
//! - `FERRITE_ROW_FORMAT`: `list` or `dict`, the shape of search results.

use std::env;
use std::path::PathBuf;

use log::warn;

use crate::persistence::RowFormat;

pub const DATA_PATH_VAR: &str = "FERRITE_DATA_PATH";
pub const ROW_FORMAT_VAR: &str = "FERRITE_ROW_FORMAT";

const DEFAULT_DATA_PATH: &str = "db.data";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub row_format: RowFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            row_format: RowFormat::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        //! Load the configuration, falling back to the defaults for anything
        //! unset. An unreadable row format is logged and ignored.

        let _ = dotenvy::dotenv();
        let mut config = Config::default();

        if let Ok(path) = env::var(DATA_PATH_VAR) {
            if !path.trim().is_empty() {
                config.data_path = PathBuf::from(path);
            }
        }

        if let Ok(format) = env::var(ROW_FORMAT_VAR) {
            match format.parse::<RowFormat>() {
                Ok(row_format) => config.row_format = row_format,
                Err(message) => warn!("{}: {}", ROW_FORMAT_VAR, message),
            }
        }

        config
    }
}
