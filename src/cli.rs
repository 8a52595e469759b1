use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Rename CSV headers from a schema mapping", long_about = None)]
pub struct Cli {
    /// Read inputs (CSV and schema) as Shift_JIS
    #[arg(long = "shiftjis", global = true)]
    pub shift_jis: bool,
    /// Character encoding of the inputs (defaults to utf-8)
    #[arg(long = "input-encoding", global = true)]
    pub input_encoding: Option<String>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, global = true, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a schema template listing every column of a CSV
    Template(TemplateArgs),
    /// Convert CSV headers (and date columns) using a schema file
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// CSV file whose header seeds the template
    pub input: PathBuf,
    /// Template file to write (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// One or more CSV files followed by the schema file
    #[arg(required = true, num_args = 2.., value_name = "PATH")]
    pub paths: Vec<PathBuf>,
    /// Directory that receives the converted files
    #[arg(short = 'o', long = "output")]
    pub output_dir: PathBuf,
    /// Drop columns that have no entry in the schema
    #[arg(long = "skip-empty")]
    pub skip_empty: bool,
}

impl ConvertArgs {
    /// Splits the positional paths into the CSV inputs and the trailing schema.
    pub fn inputs_and_schema(&self) -> Option<(&[PathBuf], &PathBuf)> {
        let (schema, inputs) = self.paths.split_last()?;
        if inputs.is_empty() {
            None
        } else {
            Some((inputs, schema))
        }
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
