//! Table rendering for CLI output using comfy-table.
//!
//! Provides consistent table formatting for commands that display tabular data.
//!
//! ## Tables Overview
//!
//! | Command | Table Function |
//! |---------|----------------|
//! | `reelforge rank` | `render_rank_table()` |
//! | `reelforge index all` | `render_index_report_table()` |
//! | `reelforge cache metrics` | `render_metrics_table()` |

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};

use super::format::truncate_str;

/// One scored item, ready for display in `rank`'s result table.
#[derive(Debug, Clone)]
pub struct RankRow {
    pub item_id: String,
    pub title: String,
    pub score: f64,
    pub matched_criteria: Vec<String>,
}

/// One item's reindex outcome, ready for display in `index all`'s report table.
#[derive(Debug, Clone)]
pub struct IndexReportRow {
    pub item_id: String,
    pub outcome: String,
}

/// Render a ranking table for `reelforge rank`.
///
/// # Example Output
///
/// ```text
/// ITEM          TITLE                SCORE    MATCHED
/// movie-042     Spirited Away        0.874    genre, era
/// movie-017     Paprika              0.810    genre
/// ```
pub fn render_rank_table(rows: &[RankRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);

    table.set_header(vec![
        Cell::new("ITEM"),
        Cell::new("TITLE"),
        Cell::new("SCORE").set_alignment(CellAlignment::Right),
        Cell::new("MATCHED"),
    ]);

    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(20)),
        ColumnConstraint::LowerBoundary(Width::Fixed(7)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
    ]);

    for row in rows {
        table.add_row(vec![
            Cell::new(&row.item_id),
            Cell::new(truncate_str(&row.title, 30)),
            Cell::new(format!("{:.3}", row.score)).set_alignment(CellAlignment::Right),
            Cell::new(row.matched_criteria.join(", ")),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render a reindex report table for `reelforge index all`.
///
/// # Example Output
///
/// ```text
/// ITEM          OUTCOME
/// movie-042     indexed
/// movie-017     stale: embedding unavailable
/// ```
pub fn render_index_report_table(rows: &[IndexReportRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);

    table.set_header(vec![Cell::new("ITEM"), Cell::new("OUTCOME")]);

    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
    ]);

    for row in rows {
        table.add_row(vec![Cell::new(&row.item_id), Cell::new(&row.outcome)]);
    }

    table.trim_fmt().to_string()
}

/// Render a simple key-value metrics table, used by `reelforge cache metrics`.
///
/// # Example Output
///
/// ```text
/// METRIC              VALUE
/// entries                62
/// size_bytes       1,060,224
/// ```
pub fn render_metrics_table(metrics: &[(&str, String)]) -> String {
    if metrics.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);

    table.set_header(vec![
        Cell::new("METRIC"),
        Cell::new("VALUE").set_alignment(CellAlignment::Right),
    ]);

    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(18)),
        ColumnConstraint::LowerBoundary(Width::Fixed(12)),
    ]);

    for (key, value) in metrics {
        table.add_row(vec![
            Cell::new(*key),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }

    table.trim_fmt().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_table_renders_headers_and_rows() {
        let rows = vec![
            RankRow {
                item_id: "movie-042".to_string(),
                title: "Spirited Away".to_string(),
                score: 0.874,
                matched_criteria: vec!["genre".to_string(), "era".to_string()],
            },
            RankRow {
                item_id: "movie-017".to_string(),
                title: "Paprika".to_string(),
                score: 0.810,
                matched_criteria: vec!["genre".to_string()],
            },
        ];

        let output = render_rank_table(&rows);
        assert!(output.contains("ITEM"));
        assert!(output.contains("SCORE"));
        assert!(output.contains("Spirited Away"));
        assert!(output.contains("0.874"));
        assert!(output.contains("genre, era"));
    }

    #[test]
    fn index_report_table_renders_outcomes() {
        let rows = vec![IndexReportRow {
            item_id: "movie-042".to_string(),
            outcome: "indexed".to_string(),
        }];
        let output = render_index_report_table(&rows);
        assert!(output.contains("OUTCOME"));
        assert!(output.contains("indexed"));
    }

    #[test]
    fn metrics_table_renders_key_value_pairs() {
        let output = render_metrics_table(&[("entries", "62".to_string())]);
        assert!(output.contains("METRIC"));
        assert!(output.contains("entries"));
        assert!(output.contains("62"));
    }

    #[test]
    fn empty_tables_render_empty_string() {
        assert_eq!(render_rank_table(&[]), "");
        assert_eq!(render_index_report_table(&[]), "");
        assert_eq!(render_metrics_table(&[]), "");
    }
}
