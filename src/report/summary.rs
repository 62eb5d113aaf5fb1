//! Console summary of aggregated metrics
//!
//! One line per group:
//!
//! ```text
//! sweep/lr0.1: 0.9120
//! sweep/lr0.1: 0.9120 +/- 0.0140
//! sweep/lr0.1: 0.9120 - 0.8900(-) 0.9310(+)
//! ```
//!
//! The first form is used for groups with a single member.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::align::{AlignedSeries, Spread};

/// Which grid point a summary line reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// Last grid point.
    #[default]
    Final,
    /// Grid point with the largest mean.
    Max,
    /// Grid point with the smallest mean.
    Min,
}

/// Whether summary lines carry ANSI escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// 16-color ANSI escapes.
    #[default]
    Ansi,
    /// Plain text.
    Plain,
}

impl ColorMode {
    /// Plain when `NO_COLOR` is set, ANSI otherwise.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_with_env(std::env::var_os("NO_COLOR").as_deref())
    }

    /// Detect from an explicit `NO_COLOR` value (for testing).
    #[must_use]
    pub const fn detect_with_env(no_color: Option<&std::ffi::OsStr>) -> Self {
        if no_color.is_some() {
            Self::Plain
        } else {
            Self::Ansi
        }
    }
}

/// ANSI foreground colors used by the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tint {
    Red,
    Green,
    Yellow,
    Cyan,
}

impl Tint {
    const fn code(self) -> u8 {
        match self {
            Self::Red => 31,
            Self::Green => 32,
            Self::Yellow => 33,
            Self::Cyan => 36,
        }
    }
}

struct Styled<'a> {
    text: &'a str,
    fg: Option<Tint>,
    bold: bool,
    mode: ColorMode,
}

impl<'a> Styled<'a> {
    const fn new(text: &'a str, mode: ColorMode) -> Self {
        Self {
            text,
            fg: None,
            bold: false,
            mode,
        }
    }

    const fn fg(mut self, tint: Tint) -> Self {
        self.fg = Some(tint);
        self
    }

    const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

impl fmt::Display for Styled<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode == ColorMode::Plain || (self.fg.is_none() && !self.bold) {
            return f.write_str(self.text);
        }
        if self.bold {
            f.write_str("\x1b[1m")?;
        }
        if let Some(tint) = self.fg {
            write!(f, "\x1b[{}m", tint.code())?;
        }
        write!(f, "{}\x1b[0m", self.text)
    }
}

/// Index of the grid point reported under `mode`.
#[must_use]
pub fn summary_index(series: &AlignedSeries, mode: SummaryMode) -> Option<usize> {
    let finite = series
        .mean()
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan());
    match mode {
        SummaryMode::Final => series.len().checked_sub(1),
        SummaryMode::Max => finite.max_by(|a, b| a.1.total_cmp(b.1)).map(|(i, _)| i),
        SummaryMode::Min => finite.min_by(|a, b| a.1.total_cmp(b.1)).map(|(i, _)| i),
    }
}

fn number(value: f64) -> String {
    format!("{value:.4}")
}

/// Summary line of one group, or `None` for an empty series.
#[must_use]
pub fn summary_line(
    label: &str,
    series: &AlignedSeries,
    mode: SummaryMode,
    color: ColorMode,
) -> Option<String> {
    let i = summary_index(series, mode)?;
    let mean = number(series.mean()[i]);
    let head = format!(
        "{}: {}",
        Styled::new(label, color).fg(Tint::Cyan),
        Styled::new(&mean, color).bold()
    );
    if series.members().len() < 2 {
        return Some(head);
    }
    Some(match series.spread() {
        Spread::Std(std) => {
            let std = number(std[i]);
            format!("{head} +/- {}", Styled::new(&std, color).fg(Tint::Yellow))
        }
        Spread::MinMax { min, max } => {
            let (min, max) = (number(min[i]), number(max[i]));
            format!(
                "{head} - {}(-) {}(+)",
                Styled::new(&min, color).fg(Tint::Red),
                Styled::new(&max, color).fg(Tint::Green)
            )
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::align::{Aggregator, Statistic};
    use crate::experiment::ScalarSeries;

    fn two_seeds(statistic: Statistic) -> AlignedSeries {
        let runs: BTreeMap<String, ScalarSeries> = [
            ("exp/seed0", [1.0, 2.0, 3.0]),
            ("exp/seed1", [2.0, 4.0, 1.0]),
        ]
        .iter()
        .map(|(name, values)| {
            ((*name).to_string(), ScalarSeries::from_steps_values(&[0, 10, 20], values))
        })
        .collect();
        Aggregator::new(3)
            .stats_key("/seed")
            .statistic(statistic)
            .aggregate(&runs)
            .unwrap()
            .series
            .remove("exp")
            .unwrap()
    }

    #[test]
    fn test_min_max_line() {
        let series = two_seeds(Statistic::MinMax);
        let line = summary_line("exp", &series, SummaryMode::Final, ColorMode::Plain).unwrap();
        assert_eq!(line, "exp: 2.0000 - 1.0000(-) 3.0000(+)");
    }

    #[test]
    fn test_std_line_at_max() {
        let series = two_seeds(Statistic::Std);
        let line = summary_line("exp", &series, SummaryMode::Max, ColorMode::Plain).unwrap();
        assert_eq!(line, "exp: 3.0000 +/- 1.0000");
    }

    #[test]
    fn test_single_member_has_no_spread() {
        let runs: BTreeMap<String, ScalarSeries> =
            [("solo".to_string(), ScalarSeries::from_steps_values(&[0, 1], &[5.0, 1.0]))]
                .into_iter()
                .collect();
        let series = &Aggregator::new(2).aggregate(&runs).unwrap().series["solo"];
        let line = summary_line("solo", series, SummaryMode::Min, ColorMode::Plain).unwrap();
        assert_eq!(line, "solo: 1.0000");
    }

    #[test]
    fn test_ansi_escapes() {
        let series = two_seeds(Statistic::Std);
        let line = summary_line("exp", &series, SummaryMode::Final, ColorMode::Ansi).unwrap();
        assert!(line.contains("\x1b[36mexp\x1b[0m"));
        assert!(line.contains("\x1b[0m"));
    }

    #[test]
    fn test_no_color_detection() {
        assert_eq!(
            ColorMode::detect_with_env(Some(std::ffi::OsStr::new("1"))),
            ColorMode::Plain
        );
        assert_eq!(ColorMode::detect_with_env(None), ColorMode::Ansi);
    }
}
