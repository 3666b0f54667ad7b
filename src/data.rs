use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::policy::{RepeatAccounting, SlotOrder};

/// A subject name, unique within one timetable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Subject(pub String);

impl Subject {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Subject {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// One timetable cell. `None` is a free slot.
pub type Cell = Option<Subject>;

/// A (day, period) coordinate, both 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Slot {
    pub day: usize,
    pub period: usize,
}

/// Validated input for the scheduler.
///
/// Every subject in `subjects` has an entry in `quotas` and vice versa.
/// Construct through [`crate::validation::validate_request`] or
/// [`TimetableConfig::new`] when the input is already known to be sound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableConfig {
    pub subjects: Vec<Subject>,
    pub days: Vec<String>,
    pub periods_per_day: usize,
    pub quotas: HashMap<Subject, u32>,
}

impl TimetableConfig {
    pub fn new(
        subjects: Vec<Subject>,
        days: Vec<String>,
        periods_per_day: usize,
        quotas: HashMap<Subject, u32>,
    ) -> Self {
        Self {
            subjects,
            days,
            periods_per_day,
            quotas,
        }
    }

    /// Weekly quota of `subject`, zero for subjects that are not configured.
    pub fn quota(&self, subject: &Subject) -> u32 {
        self.quotas.get(subject).copied().unwrap_or(0)
    }

    pub fn total_slots(&self) -> usize {
        self.days.len() * self.periods_per_day
    }

    pub fn total_quota(&self) -> u64 {
        self.quotas.values().map(|&q| u64::from(q)).sum()
    }
}

/// A generated weekly grid: `grid[day][period]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub days: Vec<String>,
    pub periods_per_day: usize,
    pub grid: Vec<Vec<Cell>>,
}

impl Timetable {
    pub fn new(days: Vec<String>, periods_per_day: usize, grid: Vec<Vec<Cell>>) -> Self {
        Self {
            days,
            periods_per_day,
            grid,
        }
    }

    pub fn get(&self, slot: Slot) -> Option<&Subject> {
        self.grid.get(slot.day)?.get(slot.period)?.as_ref()
    }

    /// All cells in day-major order.
    pub fn slots(&self) -> impl Iterator<Item = (Slot, &Cell)> + '_ {
        self.grid.iter().enumerate().flat_map(|(day, row)| {
            row.iter()
                .enumerate()
                .map(move |(period, cell)| (Slot { day, period }, cell))
        })
    }

    pub fn total_slots(&self) -> usize {
        self.grid.iter().map(Vec::len).sum()
    }

    pub fn free_slots(&self) -> usize {
        self.slots().filter(|(_, cell)| cell.is_none()).count()
    }

    pub fn count_of(&self, subject: &Subject) -> usize {
        self.slots()
            .filter(|(_, cell)| cell.as_ref() == Some(subject))
            .count()
    }

    /// Slots whose subject equals the subject of the following period.
    pub fn adjacent_repeats(&self) -> Vec<Slot> {
        let mut repeats = Vec::new();
        for (day, row) in self.grid.iter().enumerate() {
            for (period, pair) in row.windows(2).enumerate() {
                if pair[0].is_some() && pair[0] == pair[1] {
                    repeats.push(Slot { day, period });
                }
            }
        }
        repeats
    }

    /// Period-major view: one row per period, one column per day.
    pub fn period_rows(&self) -> Vec<Vec<Cell>> {
        (0..self.periods_per_day)
            .map(|period| {
                self.grid
                    .iter()
                    .map(|row| row.get(period).cloned().flatten())
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for Timetable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6}", "")?;
        for day in &self.days {
            write!(f, " | {day:<10}")?;
        }
        writeln!(f)?;
        for (period, row) in self.period_rows().iter().enumerate() {
            write!(f, "{:>6}", period + 1)?;
            for cell in row {
                match cell {
                    Some(subject) => write!(f, " | {:<10}", subject.as_str())?,
                    None => write!(f, " | {:<10}", "-")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Subjects as a JSON array or as one comma-separated string.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SubjectList {
    Names(Vec<String>),
    Csv(String),
}

impl SubjectList {
    /// Trimmed names in input order. Blank names are kept so validation can
    /// report them.
    pub fn names(&self) -> Vec<String> {
        match self {
            SubjectList::Names(names) => names.iter().map(|n| n.trim().to_string()).collect(),
            SubjectList::Csv(csv) => csv.split(',').map(|n| n.trim().to_string()).collect(),
        }
    }
}

/// Day labels, or a number of days labelled from Monday on.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DaySpec {
    Count(usize),
    Labels(Vec<String>),
}

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

impl DaySpec {
    /// Number of days, without building any labels.
    pub fn len(&self) -> usize {
        match self {
            DaySpec::Labels(labels) => labels.len(),
            DaySpec::Count(count) => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn labels(&self) -> Vec<String> {
        match self {
            DaySpec::Labels(labels) => labels.iter().map(|l| l.trim().to_string()).collect(),
            DaySpec::Count(count) => (0..*count)
                .map(|i| match WEEKDAYS.get(i) {
                    Some(name) => name.to_string(),
                    None => format!("Day {}", i + 1),
                })
                .collect(),
        }
    }
}

/// The complete input for one generation request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRequest {
    pub subjects: SubjectList,
    pub days: DaySpec,
    pub periods_per_day: usize,
    #[serde(default)]
    pub quotas: HashMap<String, u32>,
    #[serde(default)]
    pub default_quota: Option<u32>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_strict")]
    pub strict: bool,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub repeat_probability: Option<f64>,
    #[serde(default)]
    pub repeat_accounting: Option<RepeatAccounting>,
    #[serde(default)]
    pub repeat_at_day_edges: Option<bool>,
    #[serde(default)]
    pub slot_order: Option<SlotOrder>,
}

fn default_strict() -> bool {
    true
}

/// Describes a soft constraint that was not met in the final timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetSoftConstraint {
    pub constraint_type: String,
    pub description: String,
}

impl fmt::Display for UnmetSoftConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.constraint_type, self.description)
    }
}

/// Placement count of one subject against its quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectUsage {
    pub subject: Subject,
    pub quota: u32,
    pub placed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableStats {
    pub total_slots: usize,
    pub filled_slots: usize,
    pub free_slots: usize,
    pub adjacent_repeats: usize,
    pub subjects: Vec<SubjectUsage>,
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableOutput {
    pub days: Vec<String>,
    pub periods_per_day: usize,
    pub grid: Vec<Vec<Cell>>,
    pub table: Vec<Vec<Cell>>,
    pub valid: bool,
    pub attempts: u32,
    pub seed: u64,
    pub stats: TimetableStats,
    pub score: i32,
    pub unmet_soft_constraints: Vec<UnmetSoftConstraint>,
}

/// Input of the grid check endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub grid: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutput {
    pub valid: bool,
    pub adjacent_repeats: Vec<Slot>,
}
