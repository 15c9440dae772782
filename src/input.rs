//! Record loader: CSV archive exports (optionally zstd-compressed) into `SourceRecord`s.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::fs;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zstd::stream::read::Decoder;

use crate::record::SourceRecord;
use crate::util::open_with_backoff;

/// A `Read` wrapper that drops embedded NUL bytes before the CSV parser sees them.
pub struct NulStripReader<R: Read> {
    inner: R,
}

impl<R: Read> NulStripReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> Read for NulStripReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }
            let mut w = 0;
            for r in 0..n {
                if buf[r] != 0 {
                    buf[w] = buf[r];
                    w += 1;
                }
            }
            // a chunk made only of NULs is not EOF
            if w > 0 {
                return Ok(w);
            }
        }
    }
}

/// A `Read` wrapper that reports raw bytes read to a progress bar.
struct CountingReader<R: Read> {
    inner: R,
    pb: Option<ProgressBar>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some(pb) = &self.pb {
            pb.inc(n as u64);
        }
        Ok(n)
    }
}

#[inline]
fn is_zst(path: &Path) -> bool {
    path.extension().map(|e| e.eq_ignore_ascii_case("zst")).unwrap_or(false)
}

fn is_csv_input(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_lowercase();
    name.ends_with(".csv") || name.ends_with(".csv.zst")
}

/// Parse every row of an archive CSV read from `reader`.
/// Malformed rows (missing columns, bad quoting) are fatal.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<SourceRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .has_headers(true)
        .from_reader(NulStripReader::new(reader));
    let mut out = Vec::new();
    for (i, row) in rdr.deserialize::<SourceRecord>().enumerate() {
        // header is line 1
        let rec = row.with_context(|| format!("row {}", i + 2))?;
        out.push(rec);
    }
    Ok(out)
}

/// Load one CSV file (`.zst` inputs are decoded transparently).
pub fn load_csv(path: &Path, read_buf_bytes: usize, pb: Option<ProgressBar>) -> Result<Vec<SourceRecord>> {
    let file = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let counted = CountingReader { inner: file, pb };
    let records = if is_zst(path) {
        let mut decoder = Decoder::new(counted)?;
        decoder.window_log_max(31)?;
        read_records(BufReader::with_capacity(read_buf_bytes, decoder))
    } else {
        read_records(BufReader::with_capacity(read_buf_bytes, counted))
    };
    records.with_context(|| format!("parse {}", path.display()))
}

/// Expand directory arguments into the CSV files they contain, sorted by path.
/// Plain file arguments are kept as given, whatever their extension.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for p in inputs {
        if p.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(p).min_depth(1).follow_links(true) {
                let ent = entry.with_context(|| format!("walk {}", p.display()))?;
                if ent.file_type().is_file() && is_csv_input(ent.path()) {
                    found.push(ent.path().to_path_buf());
                }
            }
            found.sort();
            if found.is_empty() {
                tracing::warn!("no CSV files found under {}", p.display());
            }
            out.extend(found);
        } else {
            out.push(p.clone());
        }
    }
    Ok(out)
}

pub fn total_input_size(files: &[PathBuf]) -> u64 {
    files
        .iter()
        .map(|p| fs::metadata(p).map(|m| m.len()).unwrap_or(0))
        .sum()
}

/// Load all files in parallel; records are concatenated in argument order.
pub fn load_all(files: &[PathBuf], read_buf_bytes: usize, pb: Option<ProgressBar>) -> Result<Vec<SourceRecord>> {
    let per_file: Vec<Vec<SourceRecord>> = files
        .par_iter()
        .map(|p| {
            tracing::debug!("loading {}", p.display());
            load_csv(p, read_buf_bytes, pb.clone())
        })
        .collect::<Result<_>>()?;
    Ok(per_file.into_iter().flatten().collect())
}
