use clap::Parser;
use ferrite_store::cli::{
    self,
    parsers::{CliMode, CliParser},
};
use ferrite_store::config::Config;

fn main() {
    let args = CliParser::parse();

    let mut config = Config::from_env();
    if let Some(data_path) = args.data_path {
        config.data_path = data_path;
    }

    match args.mode {
        Some(CliMode::Client) => cli::run_client(config, args.load),
        None => cli::show_help(),
    }
}
