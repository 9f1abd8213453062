// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Writes scraped comments to CSV files.

use crate::scrape::OutputRow;
use chrono::Local;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Which columns are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Columns {
    /// `body,score`.
    #[default]
    Basic,

    /// `body,score,post,author`.
    WithMetadata,
}

impl Columns {
    fn header(&self) -> &'static [&'static str] {
        match self {
            Columns::Basic => &["body", "score"],
            Columns::WithMetadata => &["body", "score", "post", "author"],
        }
    }
}

/// Options controlling how a file is written.
#[derive(Clone, Copy, Debug, Default)]
pub struct WriteOptions {
    columns: Columns,
    no_clobber: bool,
}

impl WriteOptions {
    /// Sets which columns are written.
    pub fn columns(self, columns: Columns) -> Self {
        Self { columns, ..self }
    }

    /// Refuse to replace an existing file.
    pub fn no_clobber(self, no_clobber: bool) -> Self {
        Self { no_clobber, ..self }
    }

    /// Which columns are written.
    pub fn column_set(&self) -> Columns {
        self.columns
    }

    /// True if an existing file is never replaced.
    pub fn is_no_clobber(&self) -> bool {
        self.no_clobber
    }
}

/// A sensible file name for comments scraped from `subreddit` right now,
/// such as `rust_2025-07-04_13-45-00.csv`. A leading `r/` is ignored.
pub fn default_path(subreddit: &str) -> PathBuf {
    let subreddit = subreddit.strip_prefix("r/").unwrap_or(subreddit);
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    PathBuf::from(format!("{subreddit}_{timestamp}.csv"))
}

/// Writes `rows` to a CSV file at `path`.
///
/// The file is first written to a temporary file in the same directory
/// and then moved over `path`, so `path` either holds the complete
/// output or is left as it was. Missing parent directories are created.
pub fn write_rows(path: &Path, rows: &[OutputRow], opts: &WriteOptions) -> Result<(), Error> {
    if opts.no_clobber && path.exists() {
        return Err(Error::Exists(path.to_path_buf()));
    }

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        writer.write_record(opts.columns.header())?;
        for row in rows {
            let score = row.score().to_string();
            match opts.columns {
                Columns::Basic => writer.write_record([row.body(), score.as_str()])?,
                Columns::WithMetadata => writer.write_record([
                    row.body(),
                    score.as_str(),
                    row.post(),
                    row.author().unwrap_or(""),
                ])?,
            }
        }
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;

    if opts.no_clobber {
        tmp.persist_noclobber(path).map_err(|e| Error::Persist(e.error))?;
    } else {
        tmp.persist(path).map_err(|e| Error::Persist(e.error))?;
    }
    debug!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// An error writing output.
#[derive(Debug, Error)]
pub enum Error {
    /// The destination already exists and clobbering was not allowed.
    #[error("{} already exists", .0.display())]
    Exists(PathBuf),

    /// A file or directory could not be created or written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A row could not be serialized.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The finished file could not be moved into place.
    #[error("Could not move output into place: {0}")]
    Persist(io::Error),
}
