//! Tunable parts of the slot-filling heuristic.

use serde::{Deserialize, Serialize};

/// How a fallback repeat of a neighbouring subject is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RepeatAccounting {
    /// The repeat consumes one unit of the subject's quota. No subject is ever
    /// placed more often than its quota.
    #[default]
    QuotaBearing,
    /// The repeat leaves the quota untouched, so a subject may end up placed
    /// more often than its quota.
    Free,
}

/// Order in which the periods of a day are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotOrder {
    /// First period to last.
    #[default]
    Sequential,
    /// Middle of the day outwards; the earlier period wins ties.
    CenterOut,
}

impl SlotOrder {
    /// Period indices of one day in visiting order.
    pub fn periods(self, periods_per_day: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..periods_per_day).collect();
        if self == SlotOrder::CenterOut {
            // |2p + 1 - n| is twice the distance of period p from the centre
            order.sort_by_key(|&p| (2 * p + 1).abs_diff(periods_per_day));
        }
        order
    }
}

/// Parameters of the fallback taken when every subject with quota left is
/// blocked by the adjacency rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillPolicy {
    /// Chance of repeating the blocked neighbour instead of leaving the slot
    /// free.
    pub repeat_probability: f64,
    pub repeat_accounting: RepeatAccounting,
    /// Allow the repeat in the first and last period of a day.
    pub repeat_at_day_edges: bool,
    pub slot_order: SlotOrder,
}

impl Default for FillPolicy {
    fn default() -> Self {
        Self {
            repeat_probability: 0.5,
            repeat_accounting: RepeatAccounting::QuotaBearing,
            repeat_at_day_edges: false,
            slot_order: SlotOrder::Sequential,
        }
    }
}

impl FillPolicy {
    /// Policy that never repeats a subject back to back.
    pub fn never_repeat() -> Self {
        Self {
            repeat_probability: 0.0,
            ..Self::default()
        }
    }

    /// Policy that always prefers a repeat over a free slot, edges included.
    pub fn always_repeat() -> Self {
        Self {
            repeat_probability: 1.0,
            repeat_at_day_edges: true,
            ..Self::default()
        }
    }

    /// `repeat_probability` clamped to `[0, 1]`; NaN counts as zero.
    pub fn repeat_chance(&self) -> f64 {
        if self.repeat_probability.is_nan() {
            0.0
        } else {
            self.repeat_probability.clamp(0.0, 1.0)
        }
    }

    /// Whether a repeat may be considered for `period`.
    pub fn allows_repeat_at(&self, period: usize, periods_per_day: usize) -> bool {
        let interior = period > 0 && period + 1 < periods_per_day;
        interior || self.repeat_at_day_edges
    }
}
