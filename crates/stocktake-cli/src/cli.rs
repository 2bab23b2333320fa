use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "stocktake")]
#[command(bin_name = "stocktake")]
#[command(version)]
#[command(about = "Count stock for a store, import item lists and export counts")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Write a diagnostics log under ~/.config/stocktake/diagnostics"
    )]
    pub diagnostics: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Run configuration and server checks")]
    Doctor,
    #[command(about = "Print the items and lists of the configured store")]
    Items,
    #[command(about = "Import items from a CSV file")]
    Import(ImportArgs),
    #[command(about = "Export the items table to a CSV file")]
    Export(ExportArgs),
    #[command(about = "Record one counted amount by item and list name")]
    Count(CountArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(help = "CSV file with a header row")]
    pub file: PathBuf,

    #[arg(
        long = "name",
        value_name = "COLUMN",
        help = "Column joined into the item name, repeat in order"
    )]
    pub name: Vec<String>,

    #[arg(long, value_name = "COLUMN", help = "Numeric column holding the amount")]
    pub quantity: Option<String>,

    #[arg(
        long,
        value_name = "CHAR",
        help = "Field delimiter, detected from the extension when omitted"
    )]
    pub delimiter: Option<char>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[arg(long, short, value_name = "PATH", help = "Output file, defaults to '<store title>.csv'")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Export from the local cache without contacting the server")]
    pub offline: bool,

    #[arg(
        long,
        conflicts_with = "output",
        help = "Print the CSV as a data URI instead of writing a file"
    )]
    pub data_uri: bool,
}

#[derive(Debug, Args)]
pub struct CountArgs {
    #[arg(help = "Item name")]
    pub item: String,
    #[arg(help = "Count list name")]
    pub list: String,
    #[arg(help = "Counted amount, a non-negative number")]
    pub amount: String,
}
