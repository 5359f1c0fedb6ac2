//! SQLite storage implementation

use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use rusqlite::{Connection, params, OptionalExtension};
use crate::{Result, Error};
use crate::channel::ChannelStatus;
use crate::measurement::{MeasurementReport, MAX_NEIGHBORS, NO_NCELL_REPORT};
use crate::status::{NeighborSlot, PhysicalStatus};
use super::schema;

/// Separator line bracketing each record in a dump
pub const DUMP_SEPARATOR: &str =
    "##################################################################";

/// SQLite-backed store of per-channel physical status.
///
/// The connection is owned by the store and guarded by one mutex. Every
/// write sequence (create-if-absent followed by the snapshot update) runs
/// under a single guard, so concurrent channel handlers never interleave.
pub struct PhysicalStatusStore {
    conn: Mutex<Connection>,
}

impl PhysicalStatusStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| {
            tracing::error!("Cannot open PhysicalStatus database at {}: {}", path.display(), source);
            Error::Open { path: path.display().to_string(), source }
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::initialize_schema(&conn).map_err(|e| {
            tracing::error!("Cannot create {} table: {}", schema::TABLE, e);
            Error::Schema(e)
        })?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Initialize the database schema
    fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Lock the connection. A poisoned lock is recovered: a panic in another
    /// handler cannot leave a half-applied write because writes are transactional.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Close the connection, surfacing any error from SQLite
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().unwrap_or_else(PoisonError::into_inner);
        conn.close().map_err(|(_, e)| Error::Storage(e))
    }

    // ========== Write Operations ==========

    /// Insert an empty row for the channel if none exists.
    ///
    /// Returns `true` if a row was inserted and `false` if it was already there.
    pub fn create_entry(&self, chan: &dyn ChannelStatus) -> Result<bool> {
        let key = channel_key(chan)?;
        let conn = self.lock();
        insert_if_absent(&conn, &key, now_epoch()).inspect_err(|e| {
            tracing::warn!("Cannot create status entry for {}: {}", key, e);
        })
    }

    /// Record the latest measurement snapshot for a channel.
    ///
    /// Creates the row if needed, then overwrites every measurement field,
    /// the neighbor count, all six neighbor slots and the access time.
    pub fn set_physical(&self, chan: &dyn ChannelStatus, report: &dyn MeasurementReport) -> Result<()> {
        let result = channel_key(chan).and_then(|key| {
            let (no_ncell, neighbors) = neighbor_slots(report)?;
            let mut conn = self.lock();
            Self::upsert(&mut conn, &key, chan, report, no_ncell, &neighbors)
        });
        if let Err(e) = &result {
            tracing::warn!("Cannot update status for {:?}: {}", chan.descriptive_string(), e);
        }
        result
    }

    fn upsert(
        conn: &mut Connection,
        key: &str,
        chan: &dyn ChannelStatus,
        report: &dyn MeasurementReport,
        no_ncell: Option<i32>,
        neighbors: &[NeighborSlot; MAX_NEIGHBORS],
    ) -> Result<()> {
        let tx = conn.transaction()?;
        let now = now_epoch();

        insert_if_absent(&tx, key, now)?;

        let [n1, n2, n3, n4, n5, n6] = neighbors;
        let rows = tx.execute(
            schema::UPDATE_PHYSTATUS,
            params![
                no_ncell,
                n1.rxlev, n1.bcch_freq, n1.bsic,
                n2.rxlev, n2.bcch_freq, n2.bsic,
                n3.rxlev, n3.bcch_freq, n3.bsic,
                n4.rxlev, n4.bcch_freq, n4.bsic,
                n5.rxlev, n5.bcch_freq, n5.bsic,
                n6.rxlev, n6.bcch_freq, n6.bsic,
                report.rxlev_full_serving_cell_dbm(),
                report.rxlev_sub_serving_cell_dbm(),
                report.rxqual_full_serving_cell_ber(),
                report.rxqual_sub_serving_cell_ber(),
                chan.rssi(),
                chan.timing_error(),
                chan.actual_ms_power(),
                chan.actual_ms_timing(),
                chan.fer(),
                now,
                chan.arfcn(),
                key,
            ],
        )?;

        if rows != 1 {
            // dropping the transaction rolls back the insert as well
            return Err(Error::RowNotUpdated { key: key.to_string(), rows });
        }

        tx.commit()?;
        tracing::debug!("Updated status for {} (neighbors: {:?})", key, no_ncell);
        Ok(())
    }

    // ========== Read Operations ==========

    /// Get the status row for a channel key
    pub fn get(&self, key: &str) -> Result<Option<PhysicalStatus>> {
        let conn = self.lock();
        let sql = format!(
            "SELECT {} FROM {} WHERE CN_TN_TYPE_AND_OFFSET = ?1",
            schema::STATUS_COLUMNS,
            schema::TABLE
        );
        conn.query_row(&sql, [key], row_to_status)
            .optional()
            .map_err(Into::into)
    }

    /// All status rows, ordered by key
    pub fn records(&self) -> Result<Vec<PhysicalStatus>> {
        self.select_all("ORDER BY CN_TN_TYPE_AND_OFFSET")
    }

    fn select_all(&self, order: &str) -> Result<Vec<PhysicalStatus>> {
        let conn = self.lock();
        let sql = format!("SELECT {} FROM {} {}", schema::STATUS_COLUMNS, schema::TABLE, order);
        let mut stmt = conn.prepare(&sql)?;

        let records = stmt
            .query_map([], row_to_status)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Count all status rows
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM PHYSTATUS", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get table statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.lock();
        conn.query_row(
            "SELECT COUNT(*), COUNT(NO_NCELL), MIN(ACCESSED), MAX(ACCESSED) FROM PHYSTATUS",
            [],
            |row| {
                let channels: i64 = row.get(0)?;
                let with_neighbor_report: i64 = row.get(1)?;
                Ok(StoreStats {
                    channels: channels as usize,
                    with_neighbor_report: with_neighbor_report as usize,
                    oldest_access: row.get(2)?,
                    newest_access: row.get(3)?,
                })
            },
        )
        .map_err(Into::into)
    }

    /// Write a human-readable report of every row to `out`.
    ///
    /// Rows come in whatever order SQLite returns them. The lock is released
    /// before anything is written, so a slow sink never stalls channel writers.
    /// Returns the number of records written.
    pub fn dump(&self, out: &mut dyn Write) -> Result<usize> {
        let records = self.select_all("")?;

        writeln!(out, "{}", DUMP_SEPARATOR)?;
        writeln!(out, "\t\tMeasurement Report:")?;
        writeln!(out, "{}", DUMP_SEPARATOR)?;

        for record in &records {
            write!(out, "{}", record)?;
            writeln!(out)?;
            writeln!(out, "{}", DUMP_SEPARATOR)?;
        }

        Ok(records.len())
    }
}

/// Table statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub channels: usize,
    pub with_neighbor_report: usize,
    pub oldest_access: Option<i64>,
    pub newest_access: Option<i64>,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Physical Status:")?;
        writeln!(f, "  Channels: {}", self.channels)?;
        writeln!(f, "  With neighbor report: {}", self.with_neighbor_report)?;
        match (self.oldest_access, self.newest_access) {
            (Some(oldest), Some(newest)) => writeln!(f, "  Accessed: {} .. {}", oldest, newest),
            _ => writeln!(f, "  Accessed: -"),
        }
    }
}

fn channel_key(chan: &dyn ChannelStatus) -> Result<String> {
    let key = chan.descriptive_string();
    if key.is_empty() {
        return Err(Error::InvalidChannel("empty channel descriptor".to_string()));
    }
    Ok(key)
}

/// Insert the bare row for `key`. The primary key makes this a no-op when the
/// row exists, so the check and the insert cannot race.
fn insert_if_absent(conn: &Connection, key: &str, now: i64) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO PHYSTATUS (CN_TN_TYPE_AND_OFFSET, ACCESSED) VALUES (?1, ?2)",
        params![key, now],
    )?;

    if inserted == 0 {
        tracing::debug!("Status entry for {} already present", key);
        return Ok(false);
    }
    tracing::debug!("Created status entry for {}", key);
    Ok(true)
}

/// Build the neighbor count column and the six slots from a report.
///
/// The sentinel count leaves every slot unset without touching the
/// neighbor accessors; otherwise slots `0..count` are copied in order.
fn neighbor_slots(report: &dyn MeasurementReport) -> Result<(Option<i32>, [NeighborSlot; MAX_NEIGHBORS])> {
    let mut slots = [NeighborSlot::default(); MAX_NEIGHBORS];

    let count = report.no_ncell();
    if count == NO_NCELL_REPORT {
        return Ok((None, slots));
    }
    if usize::from(count) > MAX_NEIGHBORS {
        return Err(Error::InvalidReport(format!("NO-NCELL out of range: {}", count)));
    }

    for (i, slot) in slots.iter_mut().enumerate().take(usize::from(count)) {
        *slot = NeighborSlot {
            rxlev: Some(i32::from(report.rxlev_ncell(i))),
            bcch_freq: Some(i32::from(report.bcch_freq_ncell(i))),
            bsic: Some(i32::from(report.bsic_ncell(i))),
        };
    }

    Ok((Some(i32::from(count)), slots))
}

/// Helper to convert a row to a PhysicalStatus
fn row_to_status(row: &rusqlite::Row) -> rusqlite::Result<PhysicalStatus> {
    let mut neighbors = [NeighborSlot::default(); MAX_NEIGHBORS];
    for (i, slot) in neighbors.iter_mut().enumerate() {
        let base = schema::FIRST_NEIGHBOR_COLUMN + 3 * i;
        *slot = NeighborSlot {
            rxlev: row.get(base)?,
            bcch_freq: row.get(base + 1)?,
            bsic: row.get(base + 2)?,
        };
    }

    Ok(PhysicalStatus {
        key: row.get(0)?,
        arfcn: row.get(1)?,
        accessed: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
        rxlev_full_serving_cell: row.get(3)?,
        rxlev_sub_serving_cell: row.get(4)?,
        rxqual_full_serving_cell_ber: row.get(5)?,
        rxqual_sub_serving_cell_ber: row.get(6)?,
        rssi: row.get(7)?,
        time_err: row.get(8)?,
        trans_pwr: row.get(9)?,
        time_advc: row.get(10)?,
        fer: row.get(11)?,
        no_ncell: row.get(12)?,
        neighbors,
    })
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
