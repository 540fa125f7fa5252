//! The resumable batch loader.
//!
//! Every run walks the freshly fetched records from the start. Records whose natural
//! key is already stored are passed over, the rest are inserted until the batch
//! limit of *new* rows is reached. The upstream list can shrink or reorder between
//! runs (importers skip items that fail), so a position into it is never trusted:
//! the stored row count is kept only as the watermark shown in progress reports.

use derive_getters::Getters;
use rusqlite::Connection;
use std::fmt;
use strum::{Display, EnumIter, EnumString, VariantNames};

use crate::importer::{
    api_client::DocumentSource, genshin_fandom_wiki, genshin_jmp_blue, gsi_fly_dev,
};
use crate::store::{row_count, Store};
use crate::Result;

/// The tables a loader run can fill, in dependency order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, VariantNames, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Table {
    Weapons,
    Characters,
    Banners,
    Artifacts,
    Media,
}

impl Table {
    pub fn sql_name(&self) -> &'static str {
        match self {
            Table::Weapons => "Weapons",
            Table::Characters => "Characters",
            Table::Banners => "Banners",
            Table::Artifacts => "Artifacts",
            Table::Media => "Media",
        }
    }

    /// Singular noun for progress messages.
    pub fn noun(&self) -> &'static str {
        match self {
            Table::Weapons => "weapon",
            Table::Characters => "character",
            Table::Banners => "banner",
            Table::Artifacts => "artifact",
            Table::Media => "media",
        }
    }
}

/// A record that can be inserted idempotently into one table.
pub trait Loadable: Sized {
    const TABLE: Table;

    /// Whether a row with this record's natural key is already in the table.
    fn is_stored(&self, conn: &Connection) -> Result<bool>;

    /// Seeds lookup tables the records refer to. Runs in the batch transaction.
    fn prepare(_records: &[Self], _conn: &Connection) -> Result<()> {
        Ok(())
    }

    /// Returns whether a row was inserted or replaced.
    fn insert(&self, conn: &Connection) -> Result<bool>;
}

pub const DEFAULT_BATCH_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum number of rows written per run, `None` for no limit.
    pub limit: Option<usize>,
    /// Write records again even when they are already stored, e.g. to refresh media counts.
    pub rescan: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            limit: Some(DEFAULT_BATCH_LIMIT),
            rescan: false,
        }
    }
}

impl BatchOptions {
    pub fn unlimited() -> Self {
        BatchOptions {
            limit: None,
            rescan: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct LoadReport {
    table: Table,
    /// Records fetched from upstream this run.
    source_len: usize,
    /// Rows in the table before the run.
    watermark: usize,
    /// Records passed over because they were already stored.
    skipped: usize,
    inserted: usize,
    /// Records written but left unchanged, e.g. duplicates within the source.
    ignored: usize,
    /// Rows in the table after the run.
    rows: usize,
    /// Whether no record is left unwritten.
    complete: bool,
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = self.table.noun();
        if self.complete {
            write!(
                f,
                "All {noun} data added to the database ({} rows, {} new this run).",
                self.rows, self.inserted
            )
        } else {
            write!(
                f,
                "{} / {} total rows of {noun} data added to the database. Run again!",
                self.rows, self.source_len
            )
        }
    }
}

/// Inserts the next batch of `records` into `T::TABLE`.
/// The whole batch is one transaction: on error the table is left as it was.
pub fn load_batch<T: Loadable>(
    store: &mut Store,
    records: &[T],
    options: &BatchOptions,
) -> Result<LoadReport> {
    let table = T::TABLE;
    let tx = store.transaction()?;

    let watermark = row_count(&tx, table)?;
    log::info!(
        "Loading {table}: {watermark} rows stored, {} records (limit {:?})",
        records.len(),
        options.limit
    );

    T::prepare(records, &tx)?;

    let mut skipped = 0;
    let mut inserted = 0;
    let mut ignored = 0;
    let mut complete = true;
    for record in records {
        if !options.rescan && record.is_stored(&tx)? {
            skipped += 1;
            continue;
        }
        if options.limit.is_some_and(|limit| inserted >= limit) {
            complete = false;
            break;
        }
        if record.insert(&tx)? {
            inserted += 1;
        } else {
            ignored += 1;
        }
    }

    let rows = row_count(&tx, table)?;
    tx.commit()?;

    let report = LoadReport {
        table,
        source_len: records.len(),
        watermark,
        skipped,
        inserted,
        ignored,
        rows,
        complete,
    };
    log::info!(
        "{table}: {inserted} inserted, {skipped} already stored, {ignored} unchanged, {rows} rows"
    );
    Ok(report)
}

/// Fetches the source documents for `table` and loads one batch of them.
/// Media is fetched for the characters already stored, so load those first.
pub async fn fetch_and_load(
    source: &impl DocumentSource,
    store: &mut Store,
    table: Table,
    options: &BatchOptions,
) -> Result<LoadReport> {
    match table {
        Table::Weapons => {
            let weapons = genshin_jmp_blue::fetch_weapons(source).await?;
            load_batch(store, &weapons, options)
        }
        Table::Characters => {
            let characters = gsi_fly_dev::fetch_characters(source).await?;
            load_batch(store, &characters, options)
        }
        Table::Banners => {
            let banners = gsi_fly_dev::fetch_banners(source).await?;
            load_batch(store, &banners, options)
        }
        Table::Artifacts => {
            let sets = genshin_fandom_wiki::fetch_artifact_sets(source).await?;
            load_batch(store, &genshin_fandom_wiki::artifacts(&sets), options)
        }
        Table::Media => {
            let characters = store.characters()?;
            let media = gsi_fly_dev::fetch_media(source, &characters).await?;
            load_batch(store, &media, options)
        }
    }
}

#[cfg(test)]
mod tests;
