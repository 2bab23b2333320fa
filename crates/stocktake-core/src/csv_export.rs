use std::time::{Duration, Instant};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use thiserror::Error;

use crate::model::{Item, List};

pub const DOWNLOAD_WINDOW: Duration = Duration::from_millis(1800);
pub const DATA_URI_PREFIX: &str = "data:text/csv;charset=utf-8,";

/// Characters a browser's `encodeURI` leaves untouched.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#');

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to finish csv output: {0}")]
    Finish(String),
}

/// Header `Item` then one column per list; absent amounts are blank.
pub fn export_rows(items: &[Item], lists: &[List]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(items.len() + 1);

    let mut header = vec!["Item".to_string()];
    header.extend(lists.iter().map(|list| list.name.clone()));
    rows.push(header);

    for item in items {
        let mut row = vec![item.name.clone()];
        row.extend(lists.iter().map(|list| {
            item.amount_for(list.id)
                .map(|amount| amount.to_string())
                .unwrap_or_default()
        }));
        rows.push(row);
    }

    rows
}

pub fn to_csv(rows: &[Vec<String>]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| ExportError::Finish(error.to_string()))?;
    String::from_utf8(bytes).map_err(|error| ExportError::Finish(error.to_string()))
}

pub fn file_name(title: &str) -> String {
    format!("{title}.csv")
}

pub fn data_uri(csv: &str) -> String {
    format!(
        "{DATA_URI_PREFIX}{}",
        utf8_percent_encode(csv, URI_ENCODE_SET)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownPoll {
    Idle,
    Active,
    Expired,
}

/// Single-shot window during which the export control stays disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadCooldown {
    started_at: Option<Instant>,
}

impl DownloadCooldown {
    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    /// Returns `false` when a window is already open.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    /// Reports `Expired` once, then goes back to `Idle`.
    pub fn poll(&mut self, now: Instant) -> CooldownPoll {
        match self.started_at {
            None => CooldownPoll::Idle,
            Some(started_at) if now.saturating_duration_since(started_at) >= DOWNLOAD_WINDOW => {
                self.started_at = None;
                CooldownPoll::Expired
            }
            Some(_) => CooldownPoll::Active,
        }
    }
}
