//! Export mode usage statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::ExportMode;
use crate::workflow::case::ExportCase;

/// How often each export mode was chosen.
///
/// Cases without a selected mode are not counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeUsageReport {
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Cases with a selected mode.
    pub total_exports: usize,
    /// Cases in vertical mode.
    pub vertical_mode: usize,
    /// Share of vertical cases, 0-100 with 2 decimal places.
    pub vertical_percentage: Decimal,
    /// Cases in horizontal mode.
    pub horizontal_mode: usize,
    /// Share of horizontal cases, 0-100 with 2 decimal places.
    pub horizontal_percentage: Decimal,
}

impl ModeUsageReport {
    /// Tally the modes of `cases`.
    pub fn from_cases<'a>(
        cases: impl IntoIterator<Item = &'a ExportCase>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let (mut vertical, mut horizontal) = (0usize, 0usize);
        for case in cases {
            match case.export_mode {
                Some(ExportMode::Vertical) => vertical += 1,
                Some(ExportMode::Horizontal) => horizontal += 1,
                None => {}
            }
        }
        let total = vertical + horizontal;
        Self {
            generated_at,
            total_exports: total,
            vertical_mode: vertical,
            vertical_percentage: percentage(vertical, total),
            horizontal_mode: horizontal,
            horizontal_percentage: percentage(horizontal, total),
        }
    }
}

fn percentage(part: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) / Decimal::from(total) * Decimal::ONE_HUNDRED).round_dp(2)
}
