//! Startup bulk load.
//!
//! An archive is either a zip file or a directory. Entries are grouped by
//! file name prefix (`accounts_`/`users_`, `places_`/`locations_`,
//! `visits_`); each holds a JSON object wrapping one array of records. An
//! optional `options.txt` carries the age reference instant on its first
//! line.
//!
//! Accounts and places are stored before any visit. Visit entries are parsed
//! in parallel. Records are stored without field validation; a record whose
//! id (or email) is already taken is skipped and counted.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use roamdb_core::{Account, Place, Timestamp, Visit};
use roamdb_engine::Store;
use serde::de::DeserializeOwned;
use thiserror::Error;

const OPTIONS_ENTRY: &str = "options.txt";

/// Errors opening an archive.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading a file failed
    #[error("cannot read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The zip container is broken
    #[error("bad zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Entity group an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// `accounts_*` or `users_*`
    Accounts,
    /// `places_*` or `locations_*`
    Places,
    /// `visits_*`
    Visits,
}

impl Group {
    /// Classify an entry by its file name.
    pub fn of(name: &str) -> Option<Self> {
        let file = name.rsplit('/').next().unwrap_or(name);
        if !file.ends_with(".json") {
            return None;
        }
        if file.starts_with("accounts_") || file.starts_with("users_") {
            Some(Group::Accounts)
        } else if file.starts_with("places_") || file.starts_with("locations_") {
            Some(Group::Places)
        } else if file.starts_with("visits_") {
            Some(Group::Visits)
        } else {
            None
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Group::Accounts => "accounts",
            Group::Places => "places",
            Group::Visits => "visits",
        }
    }
}

/// One archive member, fully read.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Name inside the archive
    pub name: String,
    /// Raw contents
    pub bytes: Vec<u8>,
}

/// Contents of a startup archive.
#[derive(Debug, Default)]
pub struct Archive {
    entries: Vec<Entry>,
}

impl Archive {
    /// Build an archive from in-memory entries.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Read a zip file or a directory.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        if path.is_dir() {
            Self::read_dir(path)
        } else {
            Self::read_zip(path)
        }
    }

    fn read_zip(path: &Path) -> Result<Self, LoadError> {
        let io_error = |source: std::io::Error| LoadError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        let mut zip = zip::ZipArchive::new(file)?;
        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut member = zip.by_index(index)?;
            if member.is_dir() {
                continue;
            }
            let name = member.name().to_string();
            let mut bytes = Vec::with_capacity(member.size() as usize);
            member.read_to_end(&mut bytes).map_err(io_error)?;
            entries.push(Entry { name, bytes });
        }
        Ok(Self { entries })
    }

    fn read_dir(path: &Path) -> Result<Self, LoadError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| LoadError::Io { path, source }
        };
        let mut entries = Vec::new();
        for item in std::fs::read_dir(path).map_err(io_error(path))? {
            let item = item.map_err(io_error(path))?;
            let member = item.path();
            if !member.is_file() {
                continue;
            }
            let bytes = std::fs::read(&member).map_err(io_error(&member))?;
            entries.push(Entry {
                name: item.file_name().to_string_lossy().into_owned(),
                bytes,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { entries })
    }

    /// Names of all entries.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Reference instant from `options.txt`, if present and readable.
    pub fn reference_time(&self) -> Option<Timestamp> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name.rsplit('/').next() == Some(OPTIONS_ENTRY))?;
        let text = String::from_utf8_lossy(&entry.bytes);
        let line = text.lines().next()?.trim();
        match line.parse() {
            Ok(reference) => Some(reference),
            Err(e) => {
                tracing::warn!(target: "roamdb::loader", error = %e, line, "ignoring unreadable options.txt");
                None
            }
        }
    }

    fn group(&self, group: Group) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| Group::of(&e.name) == Some(group))
            .collect()
    }
}

/// What a bulk load stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Accounts stored
    pub accounts: usize,
    /// Places stored
    pub places: usize,
    /// Visits stored
    pub visits: usize,
    /// Records skipped for a taken id or email
    pub skipped: usize,
    /// Entries that could not be parsed
    pub bad_entries: usize,
    /// Wall time of the whole load
    pub elapsed: Duration,
}

/// Parse one entry: an object whose values are arrays of `T`.
fn parse_entry<T: DeserializeOwned>(entry: &Entry) -> Option<Vec<T>> {
    match serde_json::from_slice::<HashMap<String, Vec<T>>>(&entry.bytes) {
        Ok(wrapped) => Some(wrapped.into_values().flatten().collect()),
        Err(e) => {
            tracing::warn!(target: "roamdb::loader", entry = %entry.name, error = %e, "skipping unreadable entry");
            None
        }
    }
}

fn load_rows<T: DeserializeOwned>(
    archive: &Archive,
    group: Group,
    report: &mut LoadReport,
    mut store_row: impl FnMut(T) -> bool,
) -> usize {
    let started = Instant::now();
    let mut stored = 0;
    for entry in archive.group(group) {
        let Some(rows) = parse_entry::<T>(entry) else {
            report.bad_entries += 1;
            continue;
        };
        let total = rows.len();
        let before = stored;
        for row in rows {
            if store_row(row) {
                stored += 1;
            }
        }
        report.skipped += total - (stored - before);
        tracing::debug!(target: "roamdb::loader", entry = %entry.name, records = total, "entry loaded");
    }
    tracing::info!(
        target: "roamdb::loader",
        group = group.as_str(),
        records = stored,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "group loaded"
    );
    stored
}

/// Load every entry of `archive` into `store`.
pub fn load(store: &Store, archive: &Archive) -> LoadReport {
    let started = Instant::now();
    let mut report = LoadReport::default();

    let accounts = load_rows(archive, Group::Accounts, &mut report, |account: Account| {
        store.create_account(account).is_ok()
    });
    let places = load_rows(archive, Group::Places, &mut report, |place: Place| {
        store.create_place(place).is_ok()
    });
    report.accounts = accounts;
    report.places = places;

    let visits_started = Instant::now();
    let batches: Vec<Option<(usize, usize)>> = archive
        .group(Group::Visits)
        .par_iter()
        .map(|entry| {
            let rows = parse_entry::<Visit>(entry)?;
            let total = rows.len();
            Some((total, store.create_visits(rows)))
        })
        .collect();
    for batch in batches {
        match batch {
            Some((total, stored)) => {
                report.visits += stored;
                report.skipped += total - stored;
            }
            None => report.bad_entries += 1,
        }
    }
    tracing::info!(
        target: "roamdb::loader",
        group = Group::Visits.as_str(),
        records = report.visits,
        elapsed_ms = visits_started.elapsed().as_millis() as u64,
        "group loaded"
    );

    report.elapsed = started.elapsed();
    let stats = store.stats();
    tracing::info!(
        target: "roamdb::loader",
        accounts = stats.accounts,
        places = stats.places,
        visits = stats.visits,
        skipped = report.skipped,
        bad_entries = report.bad_entries,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "bulk load finished"
    );
    report
}

/// Run [`load`] on the blocking pool while the server starts accepting
/// requests. A panic during the load is logged rather than lost; the handle
/// then yields `None`.
pub fn load_in_background(
    store: Arc<Store>,
    archive: Archive,
) -> tokio::task::JoinHandle<Option<LoadReport>> {
    let loading = tokio::task::spawn_blocking(move || load(&store, &archive));
    tokio::spawn(async move {
        match loading.await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(target: "roamdb::loader", error = %e, "bulk load aborted");
                None
            }
        }
    })
}
