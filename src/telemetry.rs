use std::collections::BTreeMap;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::photo::{PhotoRecord, RtkStatus};

/// One parsed RTK log line: the 1-based capture sequence index and its fix tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub index: u32,
    pub status: RtkStatus,
}

/// Parser for per-shot RTK logs (e.g. DJI `Timestamp.MRK` files).
///
/// Each line starts with the shot index; the quality code token
/// `50,Q` / `20,Q` / `34,Q` somewhere on the line gives the fix tier.
pub struct RtkLogParser {
    index_pattern: Regex,
}

impl RtkLogParser {
    pub fn new() -> Self {
        Self {
            index_pattern: Regex::new(r"^\s*(\d+)").unwrap(),
        }
    }

    /// Parse a whole log into records, in file order. Lines without a
    /// leading index are skipped.
    pub fn parse_records(&self, content: &str) -> Vec<TelemetryRecord> {
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match self.parse_line(line) {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("RTK log: skipped {} malformed lines", skipped);
        }
        records
    }

    /// Parse a log into an index → status map. Later lines win on duplicate indices.
    pub fn parse(&self, content: &str) -> BTreeMap<u32, RtkStatus> {
        self.parse_records(content)
            .into_iter()
            .map(|r| (r.index, r.status))
            .collect()
    }

    fn parse_line(&self, line: &str) -> Option<TelemetryRecord> {
        let caps = self.index_pattern.captures(line)?;
        let index: u32 = caps[1].parse().ok()?;
        Some(TelemetryRecord {
            index,
            status: classify(line),
        })
    }
}

impl Default for RtkLogParser {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(line: &str) -> RtkStatus {
    if line.contains("50,Q") {
        RtkStatus::Fixed
    } else if line.contains("20,Q") || line.contains("34,Q") {
        RtkStatus::Float
    } else {
        RtkStatus::Single
    }
}

/// Annotates photos with the parsed statuses.
///
/// Index `n` maps to the `n`-th photo in capture order, counting from 1.
/// The ordering is stable, so photos sharing a timestamp keep their input
/// order. Photos the log does not cover keep `None`. Returns how many photos
/// were annotated.
pub fn apply_rtk_statuses(photos: &mut [PhotoRecord], statuses: &BTreeMap<u32, RtkStatus>) -> usize {
    let mut order: Vec<usize> = (0..photos.len()).collect();
    order.sort_by_key(|&i| photos[i].timestamp_ms);

    let mut applied = 0;
    for (position, &photo_idx) in order.iter().enumerate() {
        let index = (position + 1) as u32;
        if let Some(&status) = statuses.get(&index) {
            photos[photo_idx].rtk_status = Some(status);
            applied += 1;
        }
    }

    debug!(
        "RTK log: annotated {} of {} photos ({} log entries)",
        applied,
        photos.len(),
        statuses.len()
    );
    applied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quality_codes() {
        let log = "1  ...50,Q...\n2  ...34,Q...\n3  ...99,Q...\n";
        let map = RtkLogParser::new().parse(log);
        assert_eq!(map.len(), 3);
        assert_eq!(map[&1], RtkStatus::Fixed);
        assert_eq!(map[&2], RtkStatus::Float);
        assert_eq!(map[&3], RtkStatus::Single);
    }

    #[test]
    fn test_parse_mrk_line() {
        let log = "1\t280510.123456\t[2209]\t    10,N\t   -12,E\t   136,V\t47.37691234,Lat\t8.54170123,Lon\t512.345,Ellh\t0.012, 0.010, 0.021\t20,Q\n";
        let map = RtkLogParser::new().parse(log);
        assert_eq!(map[&1], RtkStatus::Float);
    }

    #[test]
    fn test_malformed_and_blank_lines_skipped() {
        let log = "header line\n\n   \n  7 stuff 50,Q\nno index 50,Q\n";
        let records = RtkLogParser::new().parse_records(log);
        assert_eq!(
            records,
            vec![TelemetryRecord {
                index: 7,
                status: RtkStatus::Fixed
            }]
        );
    }

    #[test]
    fn test_apply_follows_capture_order_and_leaves_gaps() {
        let mut photos = vec![
            PhotoRecord::new("b", "b.jpg", 0.0, 0.0, 0.0, 2000),
            PhotoRecord::new("a", "a.jpg", 0.0, 0.0, 0.0, 1000),
            PhotoRecord::new("c", "c.jpg", 0.0, 0.0, 0.0, 3000),
        ];
        let map = RtkLogParser::new().parse("1 50,Q\n2 20,Q\n");
        assert_eq!(apply_rtk_statuses(&mut photos, &map), 2);
        assert_eq!(photos[1].rtk_status, Some(RtkStatus::Fixed));
        assert_eq!(photos[0].rtk_status, Some(RtkStatus::Float));
        // Beyond the log: unannotated, not Single.
        assert_eq!(photos[2].rtk_status, None);
    }

    #[test]
    fn test_tied_timestamps_keep_input_order() {
        let mut photos = vec![
            PhotoRecord::new("x", "x.jpg", 0.0, 0.0, 0.0, 5000),
            PhotoRecord::new("y", "y.jpg", 0.0, 0.0, 0.0, 5000),
            PhotoRecord::new("z", "z.jpg", 0.0, 0.0, 0.0, 1000),
        ];
        let map = RtkLogParser::new().parse("1 16,Q
2 50,Q
3 34,Q
");
        assert_eq!(apply_rtk_statuses(&mut photos, &map), 3);
        assert_eq!(photos[2].rtk_status, Some(RtkStatus::Single));
        assert_eq!(photos[0].rtk_status, Some(RtkStatus::Fixed));
        assert_eq!(photos[1].rtk_status, Some(RtkStatus::Float));
    }
}
