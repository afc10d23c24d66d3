//! Column-aligned text report of frame and subsystem timings.

use std::time::Duration;

use num_width::NumberWidth;
use smallvec::SmallVec;
use thousands::Separable;

use crate::systems::profiling::MetricSummary;

/// Lines a metrics report usually has: the frame total plus a handful of subsystems.
pub const REPORT_LINES: usize = 12;

/// Display units, largest first, with their size in nanoseconds.
const UNITS: [(u128, &str); 4] = [(1_000_000_000, "s"), (1_000_000, "ms"), (1_000, "µs"), (1, "ns")];

/// Mean, std-dev, most recent and max.
const COLUMNS: usize = 4;

/// A duration scaled to the largest unit it reaches, kept to three decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reading {
    whole: u64,
    thousandths: u32,
    unit: &'static str,
}

impl From<Duration> for Reading {
    fn from(duration: Duration) -> Self {
        let nanos = duration.as_nanos();
        let (scale, unit) = UNITS
            .into_iter()
            .find(|(scale, _)| nanos >= *scale)
            .unwrap_or(UNITS[UNITS.len() - 1]);
        Self {
            whole: (nanos / scale) as u64,
            thousandths: (nanos % scale * 1000 / scale) as u32,
            unit,
        }
    }
}

impl Reading {
    /// Right-aligns the whole part so decimal points and units line up across rows.
    fn render(&self, whole_width: usize) -> String {
        format!("{:>whole_width$}.{:03}{:<2}", self.whole, self.thousandths, self.unit)
    }
}

/// Effective frame rate for a mean frame time, used as the heading of the frame row.
pub fn fps_label(mean_frame: Duration) -> String {
    let fps = 1.0 / mean_frame.as_secs_f64();
    if !fps.is_finite() {
        "--- FPS".to_string()
    } else if fps >= 1000.0 {
        format!("{} FPS", (fps.round() as u64).separate_with_commas())
    } else if fps < 10.0 {
        format!("{fps:.1} FPS")
    } else {
        format!("{fps:.0} FPS")
    }
}

/// One line per row: `name : mean ± std-dev  now current  max peak`.
pub fn format_report(rows: impl IntoIterator<Item = (String, MetricSummary)>) -> SmallVec<[String; REPORT_LINES]> {
    let rows: SmallVec<[(String, [Reading; COLUMNS]); REPORT_LINES]> = rows
        .into_iter()
        .map(|(name, summary)| {
            let readings = [summary.average, summary.std_dev, summary.current, summary.max].map(Reading::from);
            (name, readings)
        })
        .collect();

    let name_width = rows.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0);
    let mut widths = [1usize; COLUMNS];
    for (_, readings) in &rows {
        for (width, reading) in widths.iter_mut().zip(readings) {
            *width = (*width).max(reading.whole.width() as usize);
        }
    }

    rows.iter()
        .map(|(name, [mean, std_dev, current, max])| {
            format!(
                "{name:name_width$} : {} ± {}  now {}  max {}",
                mean.render(widths[0]),
                std_dev.render(widths[1]),
                current.render(widths[2]),
                max.render(widths[3]),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_picks_the_largest_unit() {
        assert_eq!(
            Reading::from(Duration::from_micros(2345)),
            Reading {
                whole: 2,
                thousandths: 345,
                unit: "ms"
            }
        );
        assert_eq!(Reading::from(Duration::ZERO).unit, "ns");
        assert_eq!(Reading::from(Duration::from_millis(1500)).render(3), "  1.500s ");
    }

    #[test]
    fn test_fps_label() {
        assert_eq!(fps_label(Duration::ZERO), "--- FPS");
        assert_eq!(fps_label(Duration::from_micros(250)), "4,000 FPS");
        assert_eq!(fps_label(Duration::from_millis(200)), "5.0 FPS");
    }
}
