//! Database schema definitions

/// Name of the status table
pub const TABLE: &str = "PHYSTATUS";

/// SQL to create the physical status table, one row per channel descriptor
pub const CREATE_PHYSTATUS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS PHYSTATUS (
    CN_TN_TYPE_AND_OFFSET TEXT PRIMARY KEY,
    ARFCN INTEGER DEFAULT NULL,
    ACCESSED INTEGER DEFAULT 0,
    RXLEV_FULL_SERVING_CELL INTEGER DEFAULT NULL,
    RXLEV_SUB_SERVING_CELL INTEGER DEFAULT NULL,
    RXQUAL_FULL_SERVING_CELL_BER REAL DEFAULT NULL,
    RXQUAL_SUB_SERVING_CELL_BER REAL DEFAULT NULL,
    RSSI REAL DEFAULT NULL,
    TIME_ERR REAL DEFAULT NULL,
    TRANS_PWR INTEGER DEFAULT NULL,
    TIME_ADVC INTEGER DEFAULT NULL,
    FER REAL DEFAULT NULL,
    NO_NCELL INTEGER DEFAULT NULL,
    RXLEV_CELL_1 INTEGER DEFAULT NULL,
    BCCH_FREQ_CELL_1 INTEGER DEFAULT NULL,
    BSIC_CELL_1 INTEGER DEFAULT NULL,
    RXLEV_CELL_2 INTEGER DEFAULT NULL,
    BCCH_FREQ_CELL_2 INTEGER DEFAULT NULL,
    BSIC_CELL_2 INTEGER DEFAULT NULL,
    RXLEV_CELL_3 INTEGER DEFAULT NULL,
    BCCH_FREQ_CELL_3 INTEGER DEFAULT NULL,
    BSIC_CELL_3 INTEGER DEFAULT NULL,
    RXLEV_CELL_4 INTEGER DEFAULT NULL,
    BCCH_FREQ_CELL_4 INTEGER DEFAULT NULL,
    BSIC_CELL_4 INTEGER DEFAULT NULL,
    RXLEV_CELL_5 INTEGER DEFAULT NULL,
    BCCH_FREQ_CELL_5 INTEGER DEFAULT NULL,
    BSIC_CELL_5 INTEGER DEFAULT NULL,
    RXLEV_CELL_6 INTEGER DEFAULT NULL,
    BCCH_FREQ_CELL_6 INTEGER DEFAULT NULL,
    BSIC_CELL_6 INTEGER DEFAULT NULL
)
"#;

/// Column list in the order `row_to_status` reads it
pub const STATUS_COLUMNS: &str = "CN_TN_TYPE_AND_OFFSET, ARFCN, ACCESSED, \
    RXLEV_FULL_SERVING_CELL, RXLEV_SUB_SERVING_CELL, \
    RXQUAL_FULL_SERVING_CELL_BER, RXQUAL_SUB_SERVING_CELL_BER, \
    RSSI, TIME_ERR, TRANS_PWR, TIME_ADVC, FER, NO_NCELL, \
    RXLEV_CELL_1, BCCH_FREQ_CELL_1, BSIC_CELL_1, \
    RXLEV_CELL_2, BCCH_FREQ_CELL_2, BSIC_CELL_2, \
    RXLEV_CELL_3, BCCH_FREQ_CELL_3, BSIC_CELL_3, \
    RXLEV_CELL_4, BCCH_FREQ_CELL_4, BSIC_CELL_4, \
    RXLEV_CELL_5, BCCH_FREQ_CELL_5, BSIC_CELL_5, \
    RXLEV_CELL_6, BCCH_FREQ_CELL_6, BSIC_CELL_6";

/// Index of the first neighbor column in [`STATUS_COLUMNS`]
pub const FIRST_NEIGHBOR_COLUMN: usize = 13;

/// Full-snapshot update, bound as ?1..?31 with the key last
pub const UPDATE_PHYSTATUS: &str = r#"
UPDATE PHYSTATUS SET
    NO_NCELL = ?1,
    RXLEV_CELL_1 = ?2, BCCH_FREQ_CELL_1 = ?3, BSIC_CELL_1 = ?4,
    RXLEV_CELL_2 = ?5, BCCH_FREQ_CELL_2 = ?6, BSIC_CELL_2 = ?7,
    RXLEV_CELL_3 = ?8, BCCH_FREQ_CELL_3 = ?9, BSIC_CELL_3 = ?10,
    RXLEV_CELL_4 = ?11, BCCH_FREQ_CELL_4 = ?12, BSIC_CELL_4 = ?13,
    RXLEV_CELL_5 = ?14, BCCH_FREQ_CELL_5 = ?15, BSIC_CELL_5 = ?16,
    RXLEV_CELL_6 = ?17, BCCH_FREQ_CELL_6 = ?18, BSIC_CELL_6 = ?19,
    RXLEV_FULL_SERVING_CELL = ?20,
    RXLEV_SUB_SERVING_CELL = ?21,
    RXQUAL_FULL_SERVING_CELL_BER = ?22,
    RXQUAL_SUB_SERVING_CELL_BER = ?23,
    RSSI = ?24,
    TIME_ERR = ?25,
    TRANS_PWR = ?26,
    TIME_ADVC = ?27,
    FER = ?28,
    ACCESSED = ?29,
    ARFCN = ?30
WHERE CN_TN_TYPE_AND_OFFSET = ?31
"#;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![CREATE_PHYSTATUS_TABLE]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_cleanly() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        for stmt in all_schema_statements() {
            conn.execute(stmt, []).unwrap();
            // idempotent
            conn.execute(stmt, []).unwrap();
        }

        let columns: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info(?1)",
                [TABLE],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(columns, 31);
        assert_eq!(STATUS_COLUMNS.split(',').count(), 31);
    }
}
