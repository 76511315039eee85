//! Tweet identifier extraction from CSV tables
//!
//! The first column of an input table is an index and is ignored by
//! default; every other column is a source of tweet ids. Each column is
//! deduplicated, and the columns can be merged into one set.
//!
//! Rows shorter than the header are padded with empty cells; rows longer
//! than the header are rejected.

use csv::{ReaderBuilder, Trim};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tweetfetch_common::{Error, Result, TweetId};

/// Which columns supply identifiers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColumnSelection {
    /// Every column except the first (index) column
    #[default]
    AllButFirst,
    /// Columns by header name
    Named(Vec<String>),
}

impl ColumnSelection {
    /// Selection of a single named column
    pub fn single(name: impl Into<String>) -> Self {
        ColumnSelection::Named(vec![name.into()])
    }
}

/// Deduplicated identifiers of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIds {
    pub column: String,
    pub ids: BTreeSet<TweetId>,
}

/// Extraction result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedIds {
    /// Union of all selected columns
    Joined(BTreeSet<TweetId>),
    /// One set per selected column, in selection order
    PerColumn(Vec<ColumnIds>),
}

impl ExtractedIds {
    /// Flatten into a single set regardless of variant
    pub fn into_joined(self) -> BTreeSet<TweetId> {
        match self {
            ExtractedIds::Joined(ids) => ids,
            ExtractedIds::PerColumn(columns) => columns.into_iter().flat_map(|c| c.ids).collect(),
        }
    }
}

/// Load the working identifier set of an input file
///
/// All columns but the first, merged into one set.
pub fn load_ids(path: &Path) -> Result<BTreeSet<TweetId>> {
    Ok(extract_ids(path, &ColumnSelection::AllButFirst, true)?.into_joined())
}

/// Extract identifiers from a CSV file
pub fn extract_ids(path: &Path, selection: &ColumnSelection, join: bool) -> Result<ExtractedIds> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::NotFound(format!("{}: {}", path.display(), e)))?;

    let extracted = extract_ids_from_reader(file, selection, join).map_err(|e| match e {
        Error::InvalidInput(msg) => Error::InvalidInput(format!("{}: {}", path.display(), msg)),
        other => other,
    })?;

    Ok(extracted)
}

/// Extract identifiers from CSV content with a header row
pub fn extract_ids_from_reader<R: Read>(
    reader: R,
    selection: &ColumnSelection,
    join: bool,
) -> Result<ExtractedIds> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(Error::InvalidInput("CSV has no header row".to_string()));
    }

    let columns = resolve_columns(&headers, selection)?;
    let mut sets: Vec<BTreeSet<TweetId>> = vec![BTreeSet::new(); columns.len()];

    let mut skipped = 0usize;
    let mut first_skipped: Option<String> = None;

    for record in reader.records() {
        let record = record?;
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(Error::InvalidInput(format!(
                "line {} has {} fields, header has {}",
                line,
                record.len(),
                headers.len()
            )));
        }

        for (slot, (_, index)) in columns.iter().enumerate() {
            let cell = record.get(*index).unwrap_or("");
            match TweetId::from_cell(cell) {
                Ok(Some(id)) => {
                    sets[slot].insert(id);
                }
                Ok(None) => {}
                Err(_) => {
                    skipped += 1;
                    if first_skipped.is_none() {
                        first_skipped = Some(cell.to_string());
                    }
                }
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(
            skipped = skipped,
            example = %first_skipped.unwrap_or_default(),
            "Skipped cells that are not tweet ids"
        );
    }

    if join {
        return Ok(ExtractedIds::Joined(sets.into_iter().flatten().collect()));
    }

    Ok(ExtractedIds::PerColumn(
        columns
            .into_iter()
            .zip(sets)
            .map(|((column, _), ids)| ColumnIds { column, ids })
            .collect(),
    ))
}

fn resolve_columns(
    headers: &csv::StringRecord,
    selection: &ColumnSelection,
) -> Result<Vec<(String, usize)>> {
    match selection {
        ColumnSelection::AllButFirst => Ok(headers
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, name)| (name.to_string(), index))
            .collect()),
        ColumnSelection::Named(names) => names
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == name.as_str())
                    .map(|index| (name.clone(), index))
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("Column '{}' not found", name))
                    })
            })
            .collect(),
    }
}
