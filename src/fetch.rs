// src/fetch.rs
//! Sheet download and decoding into a [`Snapshot`].
//!
//! The payload is CSV with a header row. Columns are looked up by
//! lower-cased name, so reordering or renaming case upstream is harmless;
//! losing the identifier column is not.

use reqwest::blocking::Client;

use crate::config::SourceOptions;
use crate::config::consts::CSV_SEP;
use crate::core::net;
use crate::csv::{normalize_header, parse_rows};
use crate::error::{FetchError, ParseError};
use crate::snapshot::{Entry, Field, Snapshot};

/// Where the raw tabular payload comes from.
pub trait Source {
    /// Human-readable locator for logs.
    fn locator(&self) -> &str;
    fn fetch(&self) -> Result<String, FetchError>;
}

/// The published spreadsheet, over HTTP(S).
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(opts: &SourceOptions) -> Result<Self, FetchError> {
        let client = net::client(opts.timeout()).map_err(FetchError::Client)?;
        Ok(Self::with_client(client, &opts.url))
    }

    pub fn with_client(client: Client, url: &str) -> Self {
        Self { client, url: s!(url) }
    }
}

impl Source for HttpSource {
    fn locator(&self) -> &str { &self.url }

    fn fetch(&self) -> Result<String, FetchError> {
        logd!("Fetch: GET {}", self.url);
        let body = net::http_get(&self.client, &self.url)?;
        logd!("Fetch: {} bytes", body.len());
        Ok(body)
    }
}

/// Resolved column positions for one payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Columns {
    pub id: usize,
    /// `None` when the sheet lacks that column; values then read as "".
    pub fields: Vec<(Field, Option<usize>)>,
}

impl Columns {
    pub fn resolve(header: &[String], opts: &SourceOptions) -> Result<Self, ParseError> {
        let header = normalize_header(header);
        let find = |name: &str| {
            let name = name.trim().to_lowercase();
            header.iter().position(|h| *h == name)
        };

        let id = find(opts.id_column.as_str()).ok_or_else(|| ParseError::MissingColumn {
            column: s!(opts.id_column.as_str()),
            header: header.clone(),
        })?;

        let fields = Field::ALL
            .iter()
            .map(|&f| {
                let name = match f {
                    Field::Location => &opts.location_column,
                    Field::Time => &opts.time_column,
                };
                let pos = find(name.as_str());
                if pos.is_none() {
                    logw!("Parse: tracked column '{}' missing from header; '{}' reads as empty", name, f);
                }
                (f, pos)
            })
            .collect();

        Ok(Self { id, fields })
    }

    /// Name + entry for a data row. `None` if the row has no usable identifier
    /// (too short, or blank in that cell).
    pub fn entry<'r>(&self, row: &'r [String]) -> Option<(&'r str, Entry)> {
        let name = row.get(self.id).map(|c| c.trim()).filter(|c| !c.is_empty())?;
        let mut entry = Entry::default();
        for &(field, pos) in &self.fields {
            let value = pos.and_then(|i| row.get(i)).map(|c| c.trim()).unwrap_or("");
            entry.set(field, s!(value));
        }
        Some((name, entry))
    }
}

/// Decode a CSV payload into a snapshot.
pub fn parse_snapshot(text: &str, opts: &SourceOptions) -> Result<Snapshot, ParseError> {
    let mut rows = parse_rows(text, CSV_SEP).into_iter();
    let header = rows.next().ok_or(ParseError::NoHeader)?;
    let cols = Columns::resolve(&header, opts)?;

    let mut snap = Snapshot::new();
    let mut skipped = 0usize;
    for row in rows {
        match cols.entry(&row) {
            Some((name, entry)) => { snap.insert(name, entry); }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        logd!("Parse: skipped {skipped} row(s) without an identifier");
    }
    Ok(snap)
}

/// Fetch, then decode.
pub fn fetch_snapshot(source: &dyn Source, opts: &SourceOptions) -> Result<Snapshot, crate::error::RunError> {
    let text = source.fetch()?;
    Ok(parse_snapshot(&text, opts)?)
}
