use clap::{Parser, Subcommand, ValueEnum};
use hlspcheck_core::HduView;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "hlspcheck",
    version,
    about = "Check FITS header keywords of high-level science products against standard dictionaries"
)]
pub struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check observed headers against one or more dictionaries
    Check(CheckArgs),
    /// Inspect built-in and file dictionaries
    Dictionaries(DictionariesArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Observed-header documents (YAML or JSON, HDU index -> keywords)
    #[arg(value_name = "HEADER_FILE", required = true)]
    pub headers: Vec<PathBuf>,

    /// Dictionary references: built-in name (timeseries/tess) or file path
    #[arg(long = "dictionary", short = 'd', value_delimiter = ',', required = true)]
    pub dictionaries: Vec<String>,

    /// Keyword updates layered over every dictionary
    #[arg(long)]
    pub updates: Option<PathBuf>,

    /// Check options file (YAML)
    #[arg(long, env = "HLSPCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Per-HDU view for rules spanning several HDUs (overrides config)
    #[arg(long, value_enum)]
    pub hdu_view: Option<HduViewArg>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HduViewArg {
    Any,
    Every,
}

impl From<HduViewArg> for HduView {
    fn from(arg: HduViewArg) -> Self {
        match arg {
            HduViewArg::Any => HduView::Any,
            HduViewArg::Every => HduView::Every,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug, Clone)]
pub struct DictionariesArgs {
    #[command(subcommand)]
    pub cmd: DictionariesSub,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DictionariesSub {
    /// List built-in dictionaries
    List,
    /// Print a dictionary's normalized rules and digest as JSON
    Show {
        /// Built-in name or file path
        #[arg(value_name = "REF")]
        reference: String,

        /// Keyword updates to apply before printing
        #[arg(long)]
        updates: Option<PathBuf>,
    },
}
