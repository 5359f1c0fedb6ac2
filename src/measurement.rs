//! Handset measurement reports
//!
//! A measurement report carries the serving-cell downlink level and quality,
//! sampled over the full frame set and the SACCH sub-set, plus up to six
//! neighbor cells. Levels arrive as RXLEV codes (0-63) and quality as RXQUAL
//! codes (0-7); the accessors on [`MeasurementReport`] return decoded values.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Neighbor count value meaning the handset sent no neighbor list.
pub const NO_NCELL_REPORT: u8 = 7;

/// Number of neighbor slots a report (and a status row) can hold.
pub const MAX_NEIGHBORS: usize = 6;

/// Highest RXLEV code
pub const RXLEV_MAX: u8 = 63;

/// Highest RXQUAL code
pub const RXQUAL_MAX: u8 = 7;

/// Highest BCCH frequency index in the neighbor list
pub const BCCH_FREQ_MAX: u8 = 31;

/// Highest BSIC value (6 bits)
pub const BSIC_MAX: u8 = 63;

/// Median bit error rate for each RXQUAL code, in percent (GSM 05.08 8.2.4).
const RXQUAL_BER_PERCENT: [f64; 8] = [0.14, 0.28, 0.57, 1.13, 2.26, 4.53, 9.05, 18.10];

/// Convert an RXLEV code to dBm
pub fn rxlev_to_dbm(rxlev: u8) -> i32 {
    i32::from(rxlev) - 111
}

/// Convert an RXQUAL code to a bit error rate (0.0-1.0)
pub fn rxqual_to_ber(rxqual: u8) -> f64 {
    let idx = usize::from(rxqual.min(RXQUAL_MAX));
    0.01 * RXQUAL_BER_PERCENT[idx]
}

/// Decoded view of a measurement report, as the status store reads it.
///
/// Neighbor accessors are only valid for `i < no_ncell()`, and only when
/// `no_ncell()` is not [`NO_NCELL_REPORT`].
pub trait MeasurementReport {
    /// Neighbor count, 0-6, or [`NO_NCELL_REPORT`]
    fn no_ncell(&self) -> u8;

    /// RXLEV code of neighbor `i` (0-63), as reported
    fn rxlev_ncell(&self, i: usize) -> u8;

    /// BCCH frequency index of neighbor `i` (0-31)
    fn bcch_freq_ncell(&self, i: usize) -> u8;

    /// Base station identity code of neighbor `i` (6 bits)
    fn bsic_ncell(&self, i: usize) -> u8;

    /// Serving-cell level over all frames, in dBm
    fn rxlev_full_serving_cell_dbm(&self) -> i32;

    /// Serving-cell level over the SACCH sub-set, in dBm
    fn rxlev_sub_serving_cell_dbm(&self) -> i32;

    /// Serving-cell bit error rate over all frames
    fn rxqual_full_serving_cell_ber(&self) -> f64;

    /// Serving-cell bit error rate over the SACCH sub-set
    fn rxqual_sub_serving_cell_ber(&self) -> f64;
}

/// One neighbor cell entry as carried in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborCell {
    /// RXLEV code (0-63)
    pub rxlev: u8,
    /// Index into the BCCH allocation list (0-31)
    pub bcch_freq: u8,
    /// Base station identity code (0-63)
    pub bsic: u8,
}

impl NeighborCell {
    pub fn new(rxlev: u8, bcch_freq: u8, bsic: u8) -> Result<Self> {
        if rxlev > RXLEV_MAX {
            return Err(Error::InvalidReport(format!("Neighbor RXLEV out of range: {}", rxlev)));
        }
        if bcch_freq > BCCH_FREQ_MAX {
            return Err(Error::InvalidReport(format!("BCCH-FREQ out of range: {}", bcch_freq)));
        }
        if bsic > BSIC_MAX {
            return Err(Error::InvalidReport(format!("BSIC out of range: {}", bsic)));
        }
        Ok(Self { rxlev, bcch_freq, bsic })
    }
}

/// Raw wire form of [`MeasurementResults`], checked on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawMeasurementResults {
    rxlev_full_serving_cell: u8,
    rxlev_sub_serving_cell: u8,
    rxqual_full_serving_cell: u8,
    rxqual_sub_serving_cell: u8,
    no_ncell: u8,
    #[serde(default)]
    neighbors: Vec<NeighborCell>,
}

/// Measurement results from one handset report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMeasurementResults", into = "RawMeasurementResults")]
pub struct MeasurementResults {
    rxlev_full_serving_cell: u8,
    rxlev_sub_serving_cell: u8,
    rxqual_full_serving_cell: u8,
    rxqual_sub_serving_cell: u8,
    no_ncell: u8,
    neighbors: Vec<NeighborCell>,
}

impl MeasurementResults {
    /// Create a report with the given serving-cell codes and no neighbor list
    pub fn new(rxlev_full: u8, rxlev_sub: u8, rxqual_full: u8, rxqual_sub: u8) -> Result<Self> {
        for (name, value, max) in [
            ("RXLEV-FULL", rxlev_full, RXLEV_MAX),
            ("RXLEV-SUB", rxlev_sub, RXLEV_MAX),
            ("RXQUAL-FULL", rxqual_full, RXQUAL_MAX),
            ("RXQUAL-SUB", rxqual_sub, RXQUAL_MAX),
        ] {
            if value > max {
                return Err(Error::InvalidReport(format!("{} out of range: {}", name, value)));
            }
        }

        Ok(Self {
            rxlev_full_serving_cell: rxlev_full,
            rxlev_sub_serving_cell: rxlev_sub,
            rxqual_full_serving_cell: rxqual_full,
            rxqual_sub_serving_cell: rxqual_sub,
            no_ncell: NO_NCELL_REPORT,
            neighbors: Vec::new(),
        })
    }

    /// Attach a neighbor list (0-6 entries)
    pub fn with_neighbors(mut self, neighbors: Vec<NeighborCell>) -> Result<Self> {
        if neighbors.len() > MAX_NEIGHBORS {
            return Err(Error::InvalidReport(format!(
                "Too many neighbor cells: {}",
                neighbors.len()
            )));
        }
        self.no_ncell = neighbors.len() as u8;
        self.neighbors = neighbors;
        Ok(self)
    }

    /// Neighbor entries carried by this report (empty when none were reported)
    pub fn neighbors(&self) -> &[NeighborCell] {
        &self.neighbors
    }

    /// Whether the handset sent a neighbor list at all
    pub fn has_neighbor_report(&self) -> bool {
        self.no_ncell != NO_NCELL_REPORT
    }
}

impl TryFrom<RawMeasurementResults> for MeasurementResults {
    type Error = Error;

    fn try_from(raw: RawMeasurementResults) -> Result<Self> {
        let report = MeasurementResults::new(
            raw.rxlev_full_serving_cell,
            raw.rxlev_sub_serving_cell,
            raw.rxqual_full_serving_cell,
            raw.rxqual_sub_serving_cell,
        )?;

        if raw.no_ncell == NO_NCELL_REPORT {
            if !raw.neighbors.is_empty() {
                return Err(Error::InvalidReport(
                    "Neighbor entries present without a neighbor report".to_string(),
                ));
            }
            return Ok(report);
        }

        if usize::from(raw.no_ncell) != raw.neighbors.len() {
            return Err(Error::InvalidReport(format!(
                "NO-NCELL is {} but {} neighbors were given",
                raw.no_ncell,
                raw.neighbors.len()
            )));
        }

        let neighbors = raw
            .neighbors
            .into_iter()
            .map(|n| NeighborCell::new(n.rxlev, n.bcch_freq, n.bsic))
            .collect::<Result<Vec<_>>>()?;

        report.with_neighbors(neighbors)
    }
}

impl From<MeasurementResults> for RawMeasurementResults {
    fn from(report: MeasurementResults) -> Self {
        Self {
            rxlev_full_serving_cell: report.rxlev_full_serving_cell,
            rxlev_sub_serving_cell: report.rxlev_sub_serving_cell,
            rxqual_full_serving_cell: report.rxqual_full_serving_cell,
            rxqual_sub_serving_cell: report.rxqual_sub_serving_cell,
            no_ncell: report.no_ncell,
            neighbors: report.neighbors,
        }
    }
}

impl MeasurementReport for MeasurementResults {
    fn no_ncell(&self) -> u8 {
        self.no_ncell
    }

    fn rxlev_ncell(&self, i: usize) -> u8 {
        self.neighbors[i].rxlev
    }

    fn bcch_freq_ncell(&self, i: usize) -> u8 {
        self.neighbors[i].bcch_freq
    }

    fn bsic_ncell(&self, i: usize) -> u8 {
        self.neighbors[i].bsic
    }

    fn rxlev_full_serving_cell_dbm(&self) -> i32 {
        rxlev_to_dbm(self.rxlev_full_serving_cell)
    }

    fn rxlev_sub_serving_cell_dbm(&self) -> i32 {
        rxlev_to_dbm(self.rxlev_sub_serving_cell)
    }

    fn rxqual_full_serving_cell_ber(&self) -> f64 {
        rxqual_to_ber(self.rxqual_full_serving_cell)
    }

    fn rxqual_sub_serving_cell_ber(&self) -> f64 {
        rxqual_to_ber(self.rxqual_sub_serving_cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rxlev_decoding() {
        assert_eq!(rxlev_to_dbm(0), -111);
        assert_eq!(rxlev_to_dbm(63), -48);
    }

    #[test]
    fn test_rxqual_decoding() {
        assert!((rxqual_to_ber(0) - 0.0014).abs() < 1e-9);
        assert!((rxqual_to_ber(7) - 0.181).abs() < 1e-9);
    }

    #[test]
    fn test_report_without_neighbors() {
        let report = MeasurementResults::new(40, 38, 0, 1).unwrap();
        assert_eq!(report.no_ncell(), NO_NCELL_REPORT);
        assert!(!report.has_neighbor_report());
        assert_eq!(report.rxlev_full_serving_cell_dbm(), -71);
        assert_eq!(report.rxlev_sub_serving_cell_dbm(), -73);
    }

    #[test]
    fn test_report_with_neighbors() {
        let report = MeasurementResults::new(40, 38, 0, 1)
            .unwrap()
            .with_neighbors(vec![
                NeighborCell::new(30, 2, 17).unwrap(),
                NeighborCell::new(25, 5, 33).unwrap(),
            ])
            .unwrap();

        assert_eq!(report.no_ncell(), 2);
        assert_eq!(report.rxlev_ncell(1), 25);
        assert_eq!(report.bcch_freq_ncell(1), 5);
        assert_eq!(report.bsic_ncell(0), 17);
    }

    #[test]
    fn test_out_of_range_values() {
        assert!(MeasurementResults::new(64, 0, 0, 0).is_err());
        assert!(MeasurementResults::new(0, 0, 8, 0).is_err());
        assert!(NeighborCell::new(10, 32, 0).is_err());
        assert!(NeighborCell::new(10, 0, 64).is_err());

        let seven = vec![NeighborCell::new(1, 1, 1).unwrap(); 7];
        assert!(MeasurementResults::new(0, 0, 0, 0).unwrap().with_neighbors(seven).is_err());
    }

    #[test]
    fn test_json_checks_neighbor_count() {
        let ok = r#"{"rxlev_full_serving_cell":40,"rxlev_sub_serving_cell":40,
            "rxqual_full_serving_cell":0,"rxqual_sub_serving_cell":0,
            "no_ncell":1,"neighbors":[{"rxlev":20,"bcch_freq":3,"bsic":9}]}"#;
        let report: MeasurementResults = serde_json::from_str(ok).unwrap();
        assert_eq!(report.neighbors().len(), 1);

        let mismatch = ok.replace("\"no_ncell\":1", "\"no_ncell\":2");
        assert!(serde_json::from_str::<MeasurementResults>(&mismatch).is_err());

        let sentinel = r#"{"rxlev_full_serving_cell":40,"rxlev_sub_serving_cell":40,
            "rxqual_full_serving_cell":0,"rxqual_sub_serving_cell":0,"no_ncell":7}"#;
        let report: MeasurementResults = serde_json::from_str(sentinel).unwrap();
        assert!(!report.has_neighbor_report());
    }
}
