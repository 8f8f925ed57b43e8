use crate::commands;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "preflight",
    about = "audit package size, licenses and dependency count before installing",
    version,
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Audit a package (or the whole project manifest) before installing
    #[command(alias = "i")]
    Install(commands::install::InstallArgs),
}
