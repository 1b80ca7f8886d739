//! Turns a completed experiment log into per-(input, level) mean timings and
//! a speedup series, and writes the averaged summary artifact.
//!
//! Aggregation is a pure function of the log rows: re-aggregating the same
//! log yields identical records, byte for byte in the summary.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use sweep_core::{HarnessError, LogRecord};

/// One aggregated group. `result` is the verified ground-truth text for the
/// input (identical across the group's trials by the determinism invariant).
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    pub input_id: String,
    pub concurrency_level: u32,
    pub result: String,
    pub mean_elapsed: f64,
    pub speedup: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeedupReport {
    /// Groups in first-encounter order, which under the sequential driver is
    /// corpus order × configured grid order.
    pub records: Vec<AggregatedRecord>,
    /// Set when the log contains a mismatch row: the run aborted and this
    /// report covers partial evidence, not a full successful experiment.
    pub aborted: bool,
}

impl SpeedupReport {
    /// Input ids in first-encounter order.
    pub fn input_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for record in &self.records {
            if ids.last() != Some(&record.input_id.as_str())
                && !ids.contains(&record.input_id.as_str())
            {
                ids.push(&record.input_id);
            }
        }
        ids
    }

    /// `(level, speedup)` points for one input, in group order.
    pub fn series_for(&self, input_id: &str) -> Vec<(u32, f64)> {
        self.records
            .iter()
            .filter(|r| r.input_id == input_id)
            .map(|r| (r.concurrency_level, r.speedup))
            .collect()
    }
}

/// Groups ok rows by `(input, level)`, averages elapsed time, and derives
/// `speedup = reference_elapsed / mean_elapsed`. The reference for each input
/// is its first group in log order — the designated baseline level — so
/// `speedup(reference)` is exactly 1.0.
pub fn aggregate(records: &[LogRecord]) -> SpeedupReport {
    let mut order: Vec<(String, u32)> = Vec::new();
    let mut groups: HashMap<(String, u32), (String, f64, usize)> = HashMap::new();
    let mut aborted = false;

    for record in records {
        match record {
            LogRecord::Ok(t) => {
                let key = (t.input_id.clone(), t.concurrency_level);
                let entry = groups.entry(key.clone()).or_insert_with(|| {
                    order.push(key);
                    (t.result.clone(), 0.0, 0)
                });
                entry.1 += t.elapsed_time;
                entry.2 += 1;
            }
            LogRecord::Mismatch {
                input_id,
                expected,
                actual,
                ..
            } => {
                aborted = true;
                tracing::warn!(
                    input = %input_id,
                    expected,
                    actual,
                    "log contains a mismatch row; aggregating partial evidence of an aborted run"
                );
            }
        }
    }

    let mut reference: HashMap<&str, f64> = HashMap::new();
    let mut out = Vec::with_capacity(order.len());
    for key in &order {
        let (result, sum, count) = &groups[key];
        let mean_elapsed = sum / *count as f64;
        let reference_elapsed = *reference.entry(key.0.as_str()).or_insert(mean_elapsed);
        out.push(AggregatedRecord {
            input_id: key.0.clone(),
            concurrency_level: key.1,
            result: result.clone(),
            mean_elapsed,
            speedup: reference_elapsed / mean_elapsed,
        });
    }

    SpeedupReport {
        records: out,
        aborted,
    }
}

/// Writes the averaged table: the four log columns, one row per group, with
/// a header line.
pub fn write_summary(report: &SpeedupReport, path: &Path) -> Result<(), HarnessError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)?;
    writeln!(file, "input,concurrency_level,result,elapsed_time")?;
    for record in &report.records {
        writeln!(
            file,
            "{},{},{},{}",
            record.input_id, record.concurrency_level, record.result, record.mean_elapsed
        )?;
    }
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_core::Trial;

    fn ok_row(input: &str, level: u32, result: &str, elapsed: f64) -> LogRecord {
        LogRecord::Ok(Trial {
            input_id: input.to_string(),
            concurrency_level: level,
            result: result.to_string(),
            elapsed_time: elapsed,
        })
    }

    /// Grid [0,1,2,4], two epochs, elapsed [10,10,6,6,4,4,3,3] in level
    /// order: means {0:10, 1:6, 2:4, 4:3}, speedups relative to level 0.
    fn worked_example() -> Vec<LogRecord> {
        let elapsed = [10.0, 10.0, 6.0, 6.0, 4.0, 4.0, 3.0, 3.0];
        let levels = [0u32, 0, 1, 1, 2, 2, 4, 4];
        levels
            .iter()
            .zip(elapsed.iter())
            .map(|(&level, &t)| ok_row("inputs/a.txt", level, "42", t))
            .collect()
    }

    #[test]
    fn means_and_speedups_match_the_worked_example() {
        let report = aggregate(&worked_example());
        assert!(!report.aborted);
        assert_eq!(report.records.len(), 4);

        let by_level: Vec<(u32, f64, f64)> = report
            .records
            .iter()
            .map(|r| (r.concurrency_level, r.mean_elapsed, r.speedup))
            .collect();
        assert_eq!(by_level[0], (0, 10.0, 1.0));
        assert_eq!(by_level[1].0, 1);
        assert_eq!(by_level[1].1, 6.0);
        assert!((by_level[1].2 - 1.667).abs() < 1e-3);
        assert_eq!(by_level[2], (2, 4.0, 2.5));
        assert_eq!(by_level[3].0, 4);
        assert!((by_level[3].2 - 3.333).abs() < 1e-3);
    }

    #[test]
    fn speedup_at_reference_is_exactly_one() {
        let report = aggregate(&worked_example());
        assert_eq!(report.records[0].speedup, 1.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rows = worked_example();
        assert_eq!(aggregate(&rows), aggregate(&rows));
    }

    #[test]
    fn mismatch_row_flags_the_report_as_aborted() {
        let mut rows = worked_example();
        rows.push(LogRecord::Mismatch {
            input_id: "inputs/a.txt".to_string(),
            concurrency_level: 4,
            expected: "42".to_string(),
            actual: "41".to_string(),
        });
        let report = aggregate(&rows);
        assert!(report.aborted);
        // The ok rows are still aggregated for postmortem use.
        assert_eq!(report.records.len(), 4);
    }

    #[test]
    fn inputs_are_normalized_independently() {
        let mut rows = worked_example();
        rows.push(ok_row("inputs/b.txt", 0, "7", 2.0));
        rows.push(ok_row("inputs/b.txt", 4, "7", 0.5));
        let report = aggregate(&rows);
        assert_eq!(report.input_ids(), vec!["inputs/a.txt", "inputs/b.txt"]);
        let series = report.series_for("inputs/b.txt");
        assert_eq!(series, vec![(0, 1.0), (4, 4.0)]);
    }

    #[test]
    fn summary_artifact_is_stable_across_rewrites() {
        let dir = std::env::temp_dir().join(format!(
            "sweep_analysis_test_{}_{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        let report = aggregate(&worked_example());
        let first = dir.join("average_1.csv");
        let second = dir.join("average_2.csv");
        write_summary(&report, &first).expect("write summary");
        write_summary(&report, &second).expect("rewrite summary");
        let a = fs::read(&first).expect("read first");
        let b = fs::read(&second).expect("read second");
        assert_eq!(a, b);
        let text = String::from_utf8(a).expect("utf8 summary");
        assert!(text.starts_with("input,concurrency_level,result,elapsed_time\n"));
        assert!(text.contains("inputs/a.txt,0,42,10\n"));
        assert!(text.contains("inputs/a.txt,4,42,3\n"));
        let _ = fs::remove_dir_all(dir);
    }
}
