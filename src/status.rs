//! Stored per-channel status record

use crate::measurement::MAX_NEIGHBORS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One neighbor-cell slot of a status row. All fields are unset until a
/// report with at least that many neighbors has been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborSlot {
    /// RXLEV code as reported (0-63)
    pub rxlev: Option<i32>,
    /// BCCH frequency index (0-31)
    pub bcch_freq: Option<i32>,
    /// Base station identity code
    pub bsic: Option<i32>,
}

impl NeighborSlot {
    pub fn is_set(&self) -> bool {
        self.rxlev.is_some() || self.bcch_freq.is_some() || self.bsic.is_some()
    }
}

/// The most recent physical-layer snapshot for one channel.
///
/// `None` means the value has not been measured yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalStatus {
    /// Channel descriptor, the primary key
    pub key: String,
    /// Assigned carrier frequency index
    pub arfcn: Option<i64>,
    /// Unix time of the last create or update
    pub accessed: i64,
    /// Serving-cell level over all frames, dBm
    pub rxlev_full_serving_cell: Option<i32>,
    /// Serving-cell level over the SACCH sub-set, dBm
    pub rxlev_sub_serving_cell: Option<i32>,
    /// Serving-cell bit error rate over all frames
    pub rxqual_full_serving_cell_ber: Option<f64>,
    /// Serving-cell bit error rate over the SACCH sub-set
    pub rxqual_sub_serving_cell_ber: Option<f64>,
    /// Uplink RSSI relative to full scale
    pub rssi: Option<f64>,
    /// Timing advance error in symbol periods
    pub time_err: Option<f64>,
    /// Commanded handset tx power, dBm
    pub trans_pwr: Option<i32>,
    /// Commanded handset timing advance, symbol periods
    pub time_advc: Option<i32>,
    /// Uplink frame erasure rate
    pub fer: Option<f64>,
    /// Neighbor count; `None` if the last report carried no neighbor list
    pub no_ncell: Option<i32>,
    pub neighbors: [NeighborSlot; MAX_NEIGHBORS],
}

impl PhysicalStatus {
    /// Fresh row as created before the first measurement arrives
    pub fn unmeasured(key: impl Into<String>, accessed: i64) -> Self {
        Self {
            key: key.into(),
            arfcn: None,
            accessed,
            rxlev_full_serving_cell: None,
            rxlev_sub_serving_cell: None,
            rxqual_full_serving_cell_ber: None,
            rxqual_sub_serving_cell_ber: None,
            rssi: None,
            time_err: None,
            trans_pwr: None,
            time_advc: None,
            fer: None,
            no_ncell: None,
            neighbors: [NeighborSlot::default(); MAX_NEIGHBORS],
        }
    }

    /// Number of populated neighbor slots
    pub fn populated_neighbors(&self) -> usize {
        self.neighbors.iter().filter(|slot| slot.is_set()).count()
    }
}

struct Value<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "-"),
        }
    }
}

struct Unit<T>(Option<T>, &'static str);

impl<T: fmt::Display> fmt::Display for Unit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => write!(f, "{} {}", v, self.1),
            None => write!(f, "-"),
        }
    }
}

impl fmt::Display for PhysicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CN_TN_TYPE_AND_OFFSET\t\t=\t{}", self.key)?;
        writeln!(f, "ARFCN\t\t\t\t=\t{}", Value(self.arfcn))?;
        writeln!(f, "ACCESSED\t\t\t=\t{}", self.accessed)?;
        writeln!(f, "RSSI\t\t\t\t=\t{}", Value(self.rssi))?;
        writeln!(f, "TIME_ERR\t\t\t=\t{}", Value(self.time_err))?;
        writeln!(f, "TIME_ADVC\t\t\t=\t{}", Value(self.time_advc))?;
        writeln!(f, "TRANS_PWR\t\t\t=\t{}", Unit(self.trans_pwr, "dBm"))?;
        writeln!(f, "FER\t\t\t\t=\t{}", Value(self.fer))?;
        writeln!(f, "RXLEV_FULL_SERVING_CELL\t\t=\t{}", Unit(self.rxlev_full_serving_cell, "dBm"))?;
        writeln!(f, "RXLEV_SUB_SERVING_CELL\t\t=\t{}", Unit(self.rxlev_sub_serving_cell, "dBm"))?;
        writeln!(f, "RXQUAL_FULL_SERVING_CELL_BER\t=\t{}", Value(self.rxqual_full_serving_cell_ber))?;
        writeln!(f, "RXQUAL_SUB_SERVING_CELL_BER\t=\t{}", Value(self.rxqual_sub_serving_cell_ber))?;
        writeln!(f, "NO_NCELL\t\t\t=\t{}", Value(self.no_ncell))?;
        for (i, slot) in self.neighbors.iter().enumerate() {
            let n = i + 1;
            writeln!(
                f,
                "RXLEV_CELL_{n} = {}, BCCH_FREQ_CELL_{n} = {}, BSIC_CELL_{n} = {}",
                Value(slot.rxlev),
                Value(slot.bcch_freq),
                Value(slot.bsic),
            )?;
        }
        Ok(())
    }
}
