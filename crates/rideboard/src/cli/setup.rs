use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const ENTRY_TYPES: [&str; 4] = [
    "offering-ride",
    "seeking-ride",
    "rideshare-split",
    "flight-info",
];

#[derive(Parser, Debug)]
#[command(
    name = "rideboard",
    bin_name = "rideboard",
    version,
    disable_help_subcommand = true,
    after_help = "Backends and keys are configured in rideboard.toml or RIDEBOARD_* variables.\nSee `rideboard config`."
)]
#[command(about = "Share rides and flight info with your cohort", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file layered over the user config
    #[arg(long, global = true, value_name = "FILE", help_heading = "Options")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List travel plans (default)
    #[command(alias = "ls")]
    List(ListArgs),

    /// Share a travel plan
    Add(AddArgs),

    /// Delete a travel plan
    #[command(alias = "rm")]
    Delete {
        /// Id shown at the bottom of the card
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Reload from the board and list
    Refresh(ListArgs),

    /// Keep the listing on screen, reloading periodically
    Watch {
        /// Seconds between reloads (defaults to refresh_secs)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        #[command(flatten)]
        filter: ListArgs,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Only show one kind of plan
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "all")]
    pub kind: String,

    /// Only show plans on this date
    #[arg(short, long, value_name = "YYYY-MM-DD")]
    pub date: Option<String>,

    /// Print entries as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Your name
    #[arg(long)]
    pub name: String,

    #[arg(short = 't', long = "type", value_name = "TYPE", value_parser = ENTRY_TYPES)]
    pub kind: String,

    /// Where from
    #[arg(long)]
    pub from: String,

    /// Where to
    #[arg(long)]
    pub to: String,

    /// Contact number
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Travel date
    #[arg(short, long, value_name = "YYYY-MM-DD", default_value = "")]
    pub date: String,

    /// Departure or arrival time
    #[arg(long, value_name = "HH:MM", default_value = "")]
    pub time: String,

    /// Seats, flight number, luggage...
    #[arg(long, default_value = "")]
    pub details: String,
}
