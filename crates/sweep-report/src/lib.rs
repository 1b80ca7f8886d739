//! Chart artifacts: one speedup-vs-concurrency PNG per input.
//!
//! Presentation only. A rendering failure is reported and skipped; it never
//! invalidates the aggregated data it was drawn from.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use plotters::prelude::*;

use sweep_analysis::SpeedupReport;

/// Renders one chart per input into `out_dir`, named from the input's base
/// name. Returns the paths that rendered; failures are logged at warn and
/// skipped.
pub fn render_all(report: &SpeedupReport, out_dir: &Path) -> Vec<PathBuf> {
    let mut rendered = Vec::new();
    if let Err(e) = fs::create_dir_all(out_dir) {
        tracing::warn!(dir = %out_dir.display(), error = %e, "cannot create chart directory");
        return rendered;
    }
    for input_id in report.input_ids() {
        let base = Path::new(input_id)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input_id.to_string());
        let out_path = out_dir.join(format!("{}.png", base));
        match render_speedup_chart(input_id, &report.series_for(input_id), &out_path) {
            Ok(()) => rendered.push(out_path),
            Err(e) => {
                tracing::warn!(input = %input_id, error = %e, "chart rendering failed")
            }
        }
    }
    rendered
}

/// Speedup curve on log2/log2 axes with three reference lines: `speedup = 1`,
/// the theoretical upper bound `y = x`, and the lower bound `y = 1/x`. Level
/// 0 (the serial mode) cannot sit on a log axis, so its speedup is drawn as a
/// horizontal line instead of a point.
pub fn render_speedup_chart(
    input_id: &str,
    series: &[(u32, f64)],
    out_path: &Path,
) -> Result<()> {
    let points: Vec<(f64, f64)> = series
        .iter()
        .filter(|(level, _)| *level >= 1)
        .map(|(level, speedup)| (f64::from(*level), *speedup))
        .collect();
    let serial_speedup = series
        .iter()
        .find(|(level, _)| *level == 0)
        .map(|(_, speedup)| *speedup);
    if points.is_empty() {
        return Err(anyhow!("no concurrency levels >= 1 to plot for {}", input_id));
    }
    let max_level = points.iter().map(|(x, _)| *x).fold(2.0f64, f64::max);

    let root = BitMapBackend::new(out_path, (1200, 700)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| anyhow!("fill: {}", e))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(input_id, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (1.0..max_level).log_scale().base(2.0),
            ((1.0 / max_level)..max_level).log_scale().base(2.0),
        )
        .map_err(|e| anyhow!("axes: {}", e))?;

    chart
        .configure_mesh()
        .x_desc("concurrency level")
        .y_desc("speedup")
        .draw()
        .map_err(|e| anyhow!("mesh: {}", e))?;

    chart
        .draw_series(LineSeries::new(points.clone(), &BLUE))
        .map_err(|e| anyhow!("series: {}", e))?
        .label("measured speedup")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(1.0, 1.0), (max_level, 1.0)],
            BLACK.mix(0.6),
        )))
        .map_err(|e| anyhow!("baseline: {}", e))?
        .label("speedup = 1")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.mix(0.6)));

    if let Some(speedup) = serial_speedup {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(1.0, speedup), (max_level, speedup)],
                GREEN,
            )))
            .map_err(|e| anyhow!("serial line: {}", e))?
            .label("serial mode (level 0)")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], GREEN));
    }

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(1.0, 1.0), (max_level, max_level)],
            RED.mix(0.5),
        )))
        .map_err(|e| anyhow!("upper bound: {}", e))?
        .label("upper bound y = x")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.mix(0.5)));

    chart
        .draw_series(std::iter::once(PathElement::new(
            vec![(1.0, 1.0), (max_level, 1.0 / max_level)],
            MAGENTA.mix(0.5),
        )))
        .map_err(|e| anyhow!("lower bound: {}", e))?
        .label("lower bound y = 1/x")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MAGENTA.mix(0.5)));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| anyhow!("legend: {}", e))?;

    root.present().map_err(|e| anyhow!("present: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweep_analysis::AggregatedRecord;

    fn test_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "sweep_report_test_{}_{}_{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0)
        ));
        fs::create_dir_all(&dir).expect("create test dir");
        dir
    }

    #[test]
    fn chart_lands_on_disk() {
        let dir = test_dir("single");
        let out = dir.join("case_01.txt.png");
        let series = vec![(0u32, 1.0), (1, 1.4), (2, 2.2), (4, 3.1), (8, 4.0)];
        render_speedup_chart("inputs/case_01.txt", &series, &out).expect("render chart");
        let meta = fs::metadata(&out).expect("chart file exists");
        assert!(meta.len() > 0);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn render_all_skips_failures_and_keeps_going() {
        let dir = test_dir("render_all");
        let record = |input: &str, level: u32, speedup: f64| AggregatedRecord {
            input_id: input.to_string(),
            concurrency_level: level,
            result: "42".to_string(),
            mean_elapsed: 1.0 / speedup,
            speedup,
        };
        let report = SpeedupReport {
            records: vec![
                // Only a serial group: unplottable, must be skipped with a warning.
                record("inputs/serial_only.txt", 0, 1.0),
                record("inputs/good.txt", 0, 1.0),
                record("inputs/good.txt", 2, 1.8),
                record("inputs/good.txt", 4, 3.2),
            ],
            aborted: false,
        };
        let rendered = render_all(&report, &dir);
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0], dir.join("good.txt.png"));
        assert!(rendered[0].exists());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn serial_only_series_is_an_error_not_a_panic() {
        let dir = test_dir("serial_only");
        let out = dir.join("x.png");
        let err = render_speedup_chart("inputs/x.txt", &[(0u32, 1.0)], &out)
            .expect_err("nothing to plot");
        assert!(err.to_string().contains("no concurrency levels"));
        assert!(!out.exists() || fs::metadata(&out).map(|m| m.len()).unwrap_or(0) == 0);
        let _ = fs::remove_dir_all(dir);
    }
}
