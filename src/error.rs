use std::path::PathBuf;

use thiserror::Error;

/// Domain failures raised by the converter; I/O and CSV errors travel as
/// `anyhow` context chains instead.
#[derive(Debug, Error)]
pub enum CsvUtilError {
    #[error("Input has no header row")]
    MissingHeader,
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Same output file: {} -> {}", .input.display(), .output.display())]
    SameOutputFile { input: PathBuf, output: PathBuf },
    #[error("Not a CSV file: {}", .0.display())]
    NotCsv(PathBuf),
}
