// src/csv.rs
use std::io::Write;

use crate::config::options::ExportFormat;
use crate::data::DataSet;

/* ---------------- Writing ---------------- */

fn writer<W: Write>(w: W, format: ExportFormat) -> ::csv::Writer<W> {
    ::csv::WriterBuilder::new()
        .delimiter(format.delim())
        .flexible(true)
        .from_writer(w)
}

/// Write a dataset to any writer. Quoting follows the `csv` crate's rules
/// (fields with the delimiter, quotes, or newlines are quoted).
pub fn write_dataset<W: Write>(
    w: W,
    ds: &DataSet,
    format: ExportFormat,
    include_headers: bool,
) -> Result<(), ::csv::Error> {
    let mut out = writer(w, format);
    if include_headers && !ds.headers.is_empty() {
        out.write_record(&ds.headers)?;
    }
    for row in &ds.rows {
        out.write_record(row)?;
    }
    out.flush()?;
    Ok(())
}

/// The whole export as a string (stdout, clipboard-style use).
pub fn to_export_string(ds: &DataSet, format: ExportFormat, include_headers: bool) -> String {
    let mut buf: Vec<u8> = Vec::new();
    if let Err(e) = write_dataset(&mut buf, ds, format, include_headers) {
        logw!("Export to string stopped early: {e}");
    }
    match String::from_utf8(buf) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(&e.into_bytes()).into_owned(),
    }
}

/* ---------------- Parsing ---------------- */

/// Read rows back (first row included). Used to inspect written exports.
pub fn parse_rows(text: &str, format: ExportFormat) -> Result<Vec<Vec<String>>, ::csv::Error> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .delimiter(format.delim())
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    rdr.records()
        .map(|r| r.map(|rec| rec.iter().map(String::from).collect()))
        .collect()
}
