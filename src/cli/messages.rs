//! General message formatting functions for prettifying the CLI.
//! Includes basic utility functions such as:
//!
//! - Highlight Text (make the text rust colored but not bold)
//! - System message formatting functions that produce the same
//! format messages.
//! - Hints, dimmed text for secondary information.

use colored::Colorize;

use crate::cli::colors::{FERRITE_GREY, FERRITE_RUST};

pub fn highlight_argument(argument: &str) -> String {
    //! Highlight a piece of text in the ferrite rust
    //! color to make it obvious.
    //!
    //! Returns a formatted string.

    format!("{}", argument.color(FERRITE_RUST))
}

pub fn hint(text: &str) -> String {
    format!("{}", text.color(FERRITE_GREY).italic())
}

pub fn system_message(source_name: &str, message: String) -> String {
    //! Write a system message on the command line, properly
    //! formatted, according to the command line theme.
    //!
    //! Takes in a source name (like 'system') as [`str`] and
    //! the message as a formatted text; output of [`format!`].

    let source_formatted = format!("{:6}", source_name.color(FERRITE_RUST).bold());

    format!("[{}] {}", source_formatted, message)
}
