pub mod cli;
pub mod convert;
pub mod date_format;
pub mod error;
pub mod io_utils;
pub mod schema;
pub mod template;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::{
    cli::{Cli, Commands},
    io_utils::InputFormat,
};

pub use convert::{ConvertOptions, ConvertSummary, HeaderPlan, convert_csv};
pub use date_format::parse_date_format;
pub use error::CsvUtilError;
pub use io_utils::decode_reader;
pub use schema::{HeaderSchema, SchemaEntry};
pub use template::generate_template;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_schema_rename", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let format = InputFormat {
        encoding: io_utils::resolve_encoding(cli.input_encoding.as_deref(), cli.shift_jis)?,
        delimiter: cli.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER),
    };
    debug!(
        "Input encoding {}, delimiter '{}'",
        format.encoding.name(),
        printable_delimiter(format.delimiter)
    );
    match cli.command {
        Commands::Template(args) => template::execute(&args, &format),
        Commands::Convert(args) => convert::execute(&args, &format),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
