use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Render the store statistics as a two-column table
pub fn stats_table(stats: &crate::storage::StoreStats) -> String {
    let access = |t: Option<i64>| t.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());

    let mut builder = TableBuilder::new();
    builder.add_row("Channels", &stats.channels.to_string());
    builder.add_row("With neighbor report", &stats.with_neighbor_report.to_string());
    builder.add_row("Oldest access", &access(stats.oldest_access));
    builder.add_row("Newest access", &access(stats.newest_access));
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreStats;

    #[test]
    fn test_empty_table() {
        assert!(TableBuilder::new().build().is_empty());
    }

    #[test]
    fn test_stats_table() {
        let stats = StoreStats {
            channels: 3,
            with_neighbor_report: 1,
            oldest_access: Some(100),
            newest_access: None,
        };
        let table = stats_table(&stats);
        assert!(table.contains("Channels"));
        assert!(table.contains("With neighbor report"));
        assert!(table.contains("100"));
    }
}
