//! The module contains function for displaying CLI splash screen.
//!
//! - Title
//! - Short Description
//! - Version Information

use colored::*;

use crate::cli::colors::FERRITE_RUST;

pub fn splash_screen() {
    show_splash_screen();
    show_version_info();
}

fn show_splash_screen() {
    print!(
        r#"
    {}
        "#,
        r"
    ███████╗███████╗██████╗ ██████╗ ██╗████████╗███████╗
    ██╔════╝██╔════╝██╔══██╗██╔══██╗██║╚══██╔══╝██╔════╝
    █████╗  █████╗  ██████╔╝██████╔╝██║   ██║   █████╗
    ██╔══╝  ██╔══╝  ██╔══██╗██╔══██╗██║   ██║   ██╔══╝
    ██║     ███████╗██║  ██║██║  ██║██║   ██║   ███████╗
    ╚═╝     ╚══════╝╚═╝  ╚═╝╚═╝  ╚═╝╚═╝   ╚═╝   ╚══════╝
        "
        .color(FERRITE_RUST)
    )
}

fn show_version_info() {
    println!(
        r"
    {}

    Version {}
    Authored by {}
        ",
        env!("CARGO_PKG_DESCRIPTION").color(FERRITE_RUST),
        env!("CARGO_PKG_VERSION").color(FERRITE_RUST).italic(),
        env!("CARGO_PKG_AUTHORS").color(FERRITE_RUST).italic(),
    )
}
