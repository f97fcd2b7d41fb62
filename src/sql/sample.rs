//! Illustrative SQL for UI preview. Never executed by the engine.

use crate::ports::ColumnInfo;

const MAX_SAMPLE_COLUMNS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleKind {
    Select,
    Count,
    Preview,
}

impl SampleKind {
    /// `SELECT` and `COUNT` (any case) select their variants; anything else previews rows.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "SELECT" => SampleKind::Select,
            "COUNT" => SampleKind::Count,
            _ => SampleKind::Preview,
        }
    }
}

pub fn sample(table_name: &str, columns: &[ColumnInfo], kind: SampleKind) -> String {
    match kind {
        SampleKind::Select => {
            let list = columns
                .iter()
                .take(MAX_SAMPLE_COLUMNS)
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let mut sql = format!("SELECT {} FROM {} WHERE 1=1", list, table_name);
            if let Some(col) = columns.iter().find(|c| is_temporal(&c.data_type)) {
                sql.push_str(&format!(" AND {} >= '{{dataTime}}'", col.name));
            }
            sql.push_str(" LIMIT 100");
            sql
        }
        SampleKind::Count => format!("SELECT COUNT(*) AS total_count FROM {} WHERE 1=1", table_name),
        SampleKind::Preview => format!("SELECT * FROM {} LIMIT 10", table_name),
    }
}

fn is_temporal(data_type: &str) -> bool {
    let t = data_type.to_lowercase();
    t.contains("date") || t.contains("time")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, data_type: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            comment: None,
        }
    }

    #[test]
    fn select_caps_columns_and_adds_date_predicate() {
        let mut columns: Vec<ColumnInfo> = (0..12).map(|i| col(&format!("c{}", i), "integer")).collect();
        columns.push(col("trade_date", "date"));
        let sql = sample("t_trade", &columns, SampleKind::parse("select"));
        assert_eq!(
            sql,
            "SELECT c0, c1, c2, c3, c4, c5, c6, c7, c8, c9 FROM t_trade WHERE 1=1 AND trade_date >= '{dataTime}' LIMIT 100"
        );
    }

    #[test]
    fn count_and_fallback_variants() {
        let columns = vec![col("id", "bigint")];
        assert_eq!(
            sample("t", &columns, SampleKind::parse("COUNT")),
            "SELECT COUNT(*) AS total_count FROM t WHERE 1=1"
        );
        assert_eq!(sample("t", &columns, SampleKind::parse("other")), "SELECT * FROM t LIMIT 10");
        assert_eq!(
            sample("t", &columns, SampleKind::Select),
            "SELECT id FROM t WHERE 1=1 LIMIT 100"
        );
    }
}
