//! CSV reading and writing with encoding auto-detection.
//!
//! Files are loaded whole into memory and split into raw string records.
//! Header handling is left to each transform. No cleaning logic here.

use csv::{ReaderBuilder, WriterBuilder};
use encoding_rs::{Encoding, UTF_8};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{CsvError, CsvResult};

const UTF8_BOM: &str = "\u{feff}";

/// Raw records of a CSV file with decoding metadata.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Every record of the file, header included, as read.
    pub records: Vec<Vec<String>>,
    /// Detected encoding label.
    pub encoding: String,
}

impl RawTable {
    /// Number of fields of the first record.
    pub fn width(&self) -> usize {
        self.records.first().map(Vec::len).unwrap_or(0)
    }
}

/// Detect the encoding of raw bytes using chardet.
///
/// Valid UTF-8 is reported as such without consulting the detector:
/// short Spanish samples are otherwise easily mistaken for Latin-1.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes using the given encoding label.
///
/// Unknown labels fall back to UTF-8. Undecodable sequences are replaced,
/// never rejected, so one bad byte does not fail a whole export.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let encoding = Encoding::for_label(encoding.as_bytes()).unwrap_or(UTF_8);
    let (decoded, _, _) = encoding.decode(bytes);
    let decoded = decoded.into_owned();
    match decoded.strip_prefix(UTF8_BOM) {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Parse decoded CSV content into raw records.
///
/// Comma delimited, rows may have differing lengths, blank lines skipped.
pub fn parse_str(content: &str) -> CsvResult<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        records.push(record.iter().map(String::from).collect());
    }
    Ok(records)
}

/// Parse CSV bytes with encoding auto-detection.
pub fn parse_bytes(bytes: &[u8]) -> CsvResult<RawTable> {
    if bytes.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let records = parse_str(&content)?;

    if records.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    Ok(RawTable { records, encoding })
}

/// Read a CSV file with encoding auto-detection.
///
/// # Example
/// ```ignore
/// let table = read_csv_file("/path/to/export.csv")?;
/// println!("Encoding: {}, records: {}", table.encoding, table.records.len());
/// ```
pub fn read_csv_file<P: AsRef<Path>>(path: P) -> CsvResult<RawTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes)
}

/// Render a cell the way cleaned exports expect it.
///
/// Null is empty, integers have no decimal part, integral floats keep one
/// (`8.0`), booleans are `True`/`False`.
pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                return n.to_string();
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e16 => format!("{:.1}", f),
                Some(f) => f.to_string(),
                None => n.to_string(),
            }
        }
        other => other.to_string(),
    }
}

/// Write a header and rows to a CSV file, optionally prefixed with a BOM.
pub fn write_csv_file(
    path: &Path,
    header: &[String],
    rows: &[Vec<Value>],
    bom: bool,
) -> CsvResult<()> {
    let mut file = File::create(path)?;
    if bom {
        file.write_all(UTF8_BOM.as_bytes())?;
    }

    let mut writer = WriterBuilder::new().flexible(true).from_writer(file);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(render_cell))?;
    }
    writer.flush()?;
    Ok(())
}
