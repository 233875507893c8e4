//! Wide-to-long normalization of three-entity position tables.
//!
//! A wide table has one row per timestamp and nine coordinate columns
//! (`N0x` .. `N2z`). Normalization resolves those columns once, coerces the
//! time column as a whole, and emits one [`TidyRecord`] per complete
//! (row, entity) pair.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::error::{FormatError, PipelineError};
use super::table::RawTable;
use super::time::{parse_calendar, parse_epoch_seconds};
use crate::schema::{EntityId, TidyRecord, TidySet};

/// Logical time column and its accepted header spellings, in priority order.
const TIME_ALIASES: &[&str] = &["time", "simtime"];

/// Logical coordinate column names, indexed `[entity][axis]`.
const COORD_COLUMNS: [[&str; 3]; 3] = [
    ["n0x", "n0y", "n0z"],
    ["n1x", "n1y", "n1z"],
    ["n2x", "n2y", "n2z"],
];

/// How the time column was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    /// Every value parsed as calendar date-time text.
    Calendar,
    /// At least one value was not calendar text; the whole column is epoch seconds.
    EpochSeconds,
}

/// Header positions of the ten logical columns, resolved once per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub time: usize,
    pub coords: [[usize; 3]; 3],
}

/// Canonical header key: lowercase with all whitespace removed.
pub fn normalize_header(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl ColumnMap {
    /// Resolve logical columns against the table headers.
    pub fn resolve(headers: &[String]) -> Result<Self, FormatError> {
        // Later duplicates overwrite earlier ones.
        let lookup: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (normalize_header(h), i))
            .collect();

        let mut missing = Vec::new();

        let time = TIME_ALIASES.iter().find_map(|alias| lookup.get(*alias).copied());
        if time.is_none() {
            missing.push(TIME_ALIASES[0].to_string());
        }

        let mut coords = [[0usize; 3]; 3];
        for (entity, names) in COORD_COLUMNS.iter().enumerate() {
            for (axis, name) in names.iter().enumerate() {
                match lookup.get(*name) {
                    Some(&index) => coords[entity][axis] = index,
                    None => missing.push(name.to_string()),
                }
            }
        }

        match time {
            Some(time) if missing.is_empty() => Ok(Self { time, coords }),
            _ => Err(FormatError::MissingColumns {
                missing,
                found: headers.to_vec(),
            }),
        }
    }
}

/// Coerce the whole time column, choosing one interpretation for every row.
pub fn coerce_time_column(
    table: &RawTable,
    column: usize,
) -> Result<(Vec<DateTime<Utc>>, TimeEncoding), FormatError> {
    let calendar: Option<Vec<_>> = (0..table.row_count())
        .map(|row| parse_calendar(table.cell(row, column)))
        .collect();
    if let Some(times) = calendar {
        return Ok((times, TimeEncoding::Calendar));
    }

    log::info!("Time column is not uniformly date-time text, reading it as epoch seconds");
    let times = (0..table.row_count())
        .map(|row| {
            let value = table.cell(row, column);
            parse_epoch_seconds(value).ok_or_else(|| FormatError::UnparseableTime {
                row,
                value: value.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((times, TimeEncoding::EpochSeconds))
}

/// Parse a coordinate cell; anything but a finite number is missing.
#[inline]
fn parse_coordinate(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Result of normalizing a wide table.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub records: TidySet,
    pub time_encoding: TimeEncoding,
    pub columns: ColumnMap,
}

/// Normalize a wide table, also reporting how it was interpreted.
pub fn normalize_detailed(table: &RawTable) -> Result<Normalized, PipelineError> {
    if table.is_empty() {
        return Err(FormatError::EmptyTable.into());
    }

    let columns = ColumnMap::resolve(table.headers())?;
    log::debug!("Resolved columns: {:?}", columns);

    let (times, time_encoding) = coerce_time_column(table, columns.time)?;

    let mut records = Vec::with_capacity(table.row_count() * EntityId::COUNT);
    let mut dropped_rows = 0usize;
    for (row, &timestamp) in times.iter().enumerate() {
        let before = records.len();
        for entity in EntityId::ALL {
            let [cx, cy, cz] = columns.coords[entity.index()];
            let x = parse_coordinate(table.cell(row, cx));
            let y = parse_coordinate(table.cell(row, cy));
            let z = parse_coordinate(table.cell(row, cz));
            if let (Some(x), Some(y), Some(z)) = (x, y, z) {
                records.push(TidyRecord {
                    timestamp,
                    entity_id: entity,
                    x,
                    y,
                    z,
                });
            }
        }
        if records.len() == before {
            dropped_rows += 1;
        }
    }

    if dropped_rows > 0 {
        log::warn!(
            "{} of {} rows had no complete entity coordinates",
            dropped_rows,
            table.row_count()
        );
    }
    if records.is_empty() {
        return Err(PipelineError::NoValidData);
    }

    Ok(Normalized {
        records: TidySet::from_unsorted(records),
        time_encoding,
        columns,
    })
}

/// Normalize a wide table into a time-sorted [`TidySet`].
pub fn normalize(table: &RawTable) -> Result<TidySet, PipelineError> {
    normalize_detailed(table).map(|n| n.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    const HEADER: &str = "Time,N0x,N0y,N0z,N1x,N1y,N1z,N2x,N2y,N2z";

    fn table(text: &str) -> RawTable {
        RawTable::parse(text, None).unwrap()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Sim Time "), "simtime");
        assert_eq!(normalize_header("N0\tX"), "n0x");
    }

    #[test]
    fn test_incomplete_entity_dropped() {
        let t = table(&format!(
            "{HEADER}\n2024-01-01T00:00:00Z,1,1,1,2,2,2,,3,3\n"
        ));
        let set = normalize(&t).unwrap();
        assert_eq!(set.len(), 2);
        let ids: Vec<_> = set.iter().map(|r| r.entity_id).collect();
        assert_eq!(ids, vec![EntityId::N0, EntityId::N1]);
        assert_eq!(set.records()[1].position(), [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_non_numeric_and_nan_are_missing() {
        let t = table(&format!("{HEADER}\n0,1,abc,1,NaN,2,2,3,3,inf\n1,1,1,1,2,2,2,3,3,3\n"));
        let set = normalize(&t).unwrap();
        // Row 0 contributes nothing, row 1 all three.
        assert_eq!(set.len(), 3);
        assert!(set.iter().all(|r| r.timestamp.timestamp() == 1));
    }

    #[test]
    fn test_missing_columns_reported() {
        let t = table("Stamp;N0x;N0y;N0z;N1x;N1y;N1z;N2x;N2y\n0;1;1;1;2;2;2;3;3\n");
        match normalize(&t) {
            Err(PipelineError::Format(FormatError::MissingColumns { missing, found })) => {
                assert_eq!(missing, vec!["time".to_string(), "n2z".to_string()]);
                assert_eq!(found.len(), 9);
                assert_eq!(found[0], "Stamp");
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_table_is_format_error() {
        assert!(matches!(
            normalize(&table(HEADER)),
            Err(PipelineError::Format(FormatError::EmptyTable))
        ));
        assert!(matches!(
            normalize(&RawTable::default()),
            Err(PipelineError::Format(FormatError::EmptyTable))
        ));
    }

    #[test]
    fn test_no_complete_rows_is_no_valid_data() {
        let t = table(&format!("{HEADER}\n0,,,,,,,,,\n"));
        assert!(matches!(normalize(&t), Err(PipelineError::NoValidData)));
    }

    #[test]
    fn test_simtime_alias_equivalent() {
        let rows = "2024-01-01 00:00:00;1;2;3;4;5;6;7;8;9\n2024-01-01 00:00:01;1;2;3;;5;6;7;8;9\n";
        let a = table(&format!("Time;N0x;N0y;N0z;N1x;N1y;N1z;N2x;N2y;N2z\n{rows}"));
        let b = table(&format!("SimTime;N0x;N0y;N0z;N1x;N1y;N1z;N2x;N2y;N2z\n{rows}"));
        assert_eq!(normalize(&a).unwrap(), normalize(&b).unwrap());
    }

    #[test]
    fn test_time_preferred_over_simtime() {
        let t = table("simtime,time,n0x,n0y,n0z,n1x,n1y,n1z,n2x,n2y,n2z\n100,5,1,1,1,,,,,,\n");
        let set = normalize(&t).unwrap();
        assert_eq!(set.records()[0].timestamp.timestamp(), 5);
    }

    #[test]
    fn test_whole_column_epoch_fallback() {
        let mut text = String::from(HEADER);
        for i in 0..9 {
            text.push_str(&format!("\n2024-01-01T00:00:0{i}Z,1,1,1,,,,,,"));
        }
        text.push_str("\n1700000000,1,1,1,,,,,,");
        let t = table(&text);

        // The ISO values cannot be epoch seconds either, so the reparse fails.
        match normalize_detailed(&t) {
            Err(PipelineError::Format(FormatError::UnparseableTime { row, value })) => {
                assert_eq!(row, 0);
                assert_eq!(value, "2024-01-01T00:00:00Z");
            }
            other => panic!("expected UnparseableTime, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_column_read_as_epoch_seconds() {
        let mut text = String::from(HEADER);
        for i in 0..10 {
            text.push_str(&format!("\n{},1,1,1,,,,,,", i * 10));
        }
        let normalized = normalize_detailed(&table(&text)).unwrap();
        assert_eq!(normalized.time_encoding, TimeEncoding::EpochSeconds);
        assert_eq!(normalized.records.len(), 10);
        assert_eq!(
            normalized.records.end(),
            Some(Utc.timestamp_opt(90, 0).unwrap())
        );
    }

    #[test]
    fn test_calendar_encoding_detected() {
        let t = table(&format!("{HEADER}\n2024-01-01 00:00:05,1,1,1,,,,,,\n"));
        let normalized = normalize_detailed(&t).unwrap();
        assert_eq!(normalized.time_encoding, TimeEncoding::Calendar);
        assert_eq!(normalized.columns.time, 0);
        assert_eq!(normalized.columns.coords[2], [7, 8, 9]);
    }

    #[test]
    fn test_rows_sorted_by_time_stably() {
        let t = table(&format!(
            "{HEADER}\n30,1,1,1,,,,,,\n10,2,2,2,3,3,3,,,\n20,4,4,4,,,,,,\n10,5,5,5,,,,,,\n"
        ));
        let set = normalize(&t).unwrap();
        let order: Vec<_> = set.iter().map(|r| (r.timestamp.timestamp(), r.x)).collect();
        assert_eq!(
            order,
            vec![(10, 2.0), (10, 3.0), (10, 5.0), (20, 4.0), (30, 1.0)]
        );
    }

    proptest! {
        #[test]
        fn prop_records_complete_and_sorted(
            rows in prop::collection::vec(
                (0u32..10_000, prop::collection::vec(prop::option::of(-1e6f64..1e6), 9)),
                1..40,
            )
        ) {
            let mut text = String::from(HEADER);
            for (t, coords) in &rows {
                text.push('\n');
                text.push_str(&t.to_string());
                for c in coords {
                    text.push(',');
                    if let Some(v) = c {
                        text.push_str(&v.to_string());
                    }
                }
            }
            let expected: usize = rows
                .iter()
                .map(|(_, c)| c.chunks(3).filter(|e| e.iter().all(Option::is_some)).count())
                .sum();

            match normalize(&table(&text)) {
                Ok(set) => {
                    prop_assert_eq!(set.len(), expected);
                    prop_assert!(set.iter().all(|r| r.x.is_finite() && r.y.is_finite() && r.z.is_finite()));
                    prop_assert!(set.records().windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
                }
                Err(PipelineError::NoValidData) => prop_assert_eq!(expected, 0),
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
        }
    }
}
