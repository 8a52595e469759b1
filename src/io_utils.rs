//! I/O utilities for CSV reading, writing, and legacy encoding decoding.
//!
//! All file I/O in csv-schema-rename flows through this module. It provides:
//!
//! - **Encoding**: label resolution via `encoding_rs` (defaulting to UTF-8) and
//!   [`DecodingReader`], which turns a legacy byte stream such as Shift_JIS
//!   into UTF-8 as it is read.
//! - **Reader/writer construction**: `open_csv_reader` and `open_csv_writer`
//!   over any `Read`/`Write`, plus path helpers for files and standard streams.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Decoder, DecoderResult, Encoding, SHIFT_JIS, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';

const RAW_CHUNK_SIZE: usize = 8 * 1024;

/// How input files (data and schema alike) are read.
#[derive(Debug, Clone, Copy)]
pub struct InputFormat {
    pub encoding: &'static Encoding,
    pub delimiter: u8,
}

impl Default for InputFormat {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            delimiter: DEFAULT_CSV_DELIMITER,
        }
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

/// Resolves the input encoding from the CLI flags. `--shiftjis` wins over an
/// explicit label; with neither the input is read as UTF-8.
pub fn resolve_encoding(label: Option<&str>, shift_jis: bool) -> Result<&'static Encoding> {
    if shift_jis {
        return Ok(SHIFT_JIS);
    }
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8, flexible: bool) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(flexible);
    builder.from_reader(reader)
}

pub fn open_csv_writer<W>(writer: W, delimiter: u8) -> csv::Writer<W>
where
    W: Write,
{
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(writer)
}

/// Opens `path` (or stdin for `-`) and wraps it in a decoder for `encoding`.
pub fn open_input(path: &Path, encoding: &'static Encoding) -> Result<Box<dyn Read>> {
    let raw: Box<dyn Read> = if is_dash(path) {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(decode_reader(raw, encoding))
}

/// Opens `path` for writing, or stdout when no path (or `-`) is given.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    })
}

/// Wraps a raw byte stream so that reads yield UTF-8. UTF-8 input is passed
/// through untouched.
pub fn decode_reader<'a, R>(raw: R, encoding: &'static Encoding) -> Box<dyn Read + 'a>
where
    R: Read + 'a,
{
    if encoding == UTF_8 {
        Box::new(raw)
    } else {
        Box::new(DecodingReader::new(raw, encoding))
    }
}

/// Incremental decoder from a legacy encoding into UTF-8.
///
/// Malformed byte sequences are reported as [`io::ErrorKind::InvalidData`]
/// rather than replaced, so a corrupt input fails the read instead of
/// silently producing U+FFFD.
pub struct DecodingReader<R: Read> {
    inner: R,
    decoder: Decoder,
    encoding: &'static Encoding,
    pending: Vec<u8>,
    pending_pos: usize,
    consumed: u64,
    finished: bool,
}

impl<R: Read> DecodingReader<R> {
    pub fn new(inner: R, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            decoder: encoding.new_decoder(),
            encoding,
            pending: Vec::new(),
            pending_pos: 0,
            consumed: 0,
            finished: false,
        }
    }

    fn fill_pending(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; RAW_CHUNK_SIZE];
        let read = loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        };
        let last = read == 0;
        let src = &chunk[..read];

        self.pending.clear();
        self.pending_pos = 0;
        let mut offset = 0;
        let mut written_total = 0;
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length_without_replacement(src.len() - offset)
                .ok_or_else(|| io::Error::other("Decode buffer size overflow"))?;
            self.pending.resize(written_total + needed, 0);
            let (result, taken, written) = self.decoder.decode_to_utf8_without_replacement(
                &src[offset..],
                &mut self.pending[written_total..],
                last,
            );
            offset += taken;
            written_total += written;
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(bad, _) => {
                    let position = self.consumed + offset as u64;
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "Malformed {} sequence ({bad} byte(s)) before byte offset {position}",
                            self.encoding.name()
                        ),
                    ));
                }
            }
        }
        self.pending.truncate(written_total);
        self.consumed += read as u64;
        if last {
            self.finished = true;
        }
        Ok(())
    }
}

impl<R: Read> Read for DecodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.pending_pos < self.pending.len() {
                let available = &self.pending[self.pending_pos..];
                let n = available.len().min(buf.len());
                buf[..n].copy_from_slice(&available[..n]);
                self.pending_pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }
            self.fill_pending()?;
        }
    }
}
