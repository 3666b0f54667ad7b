//! Display statistics and soft-constraint report for a generated timetable.
//!
//! Nothing here feeds back into generation.

use itertools::Itertools;
use std::collections::HashMap;

use crate::data::{
    Subject, SubjectUsage, Timetable, TimetableConfig, TimetableStats, UnmetSoftConstraint,
};

/// Computes slot counts, per-subject usage, a score and the list of soft
/// constraints the timetable misses.
///
/// Score: +1 per filled slot, -1 per free slot, -1 per adjacent repeat.
pub fn calculate_stats(
    config: &TimetableConfig,
    timetable: &Timetable,
) -> (TimetableStats, i32, Vec<UnmetSoftConstraint>) {
    let placed: HashMap<&Subject, usize> = timetable
        .slots()
        .filter_map(|(_, cell)| cell.as_ref())
        .counts();

    let subjects: Vec<SubjectUsage> = config
        .subjects
        .iter()
        .map(|subject| SubjectUsage {
            subject: subject.clone(),
            quota: config.quota(subject),
            placed: placed.get(subject).copied().unwrap_or(0),
        })
        .collect();

    let total_slots = timetable.total_slots();
    let free_slots = timetable.free_slots();
    let filled_slots = total_slots - free_slots;
    let repeats = timetable.adjacent_repeats();

    let mut unmet = Vec::new();

    // avoid the same subject twice in a row
    for slot in &repeats {
        let subject = timetable
            .get(*slot)
            .map(Subject::as_str)
            .unwrap_or_default();
        let day = timetable
            .days
            .get(slot.day)
            .map(String::as_str)
            .unwrap_or_default();
        unmet.push(UnmetSoftConstraint {
            constraint_type: "Avoid Consecutive Repeats".to_string(),
            description: format!(
                "{} is scheduled in consecutive periods {} and {} on {}.",
                subject,
                slot.period + 1,
                slot.period + 2,
                day
            ),
        });
    }

    // meet every weekly quota
    for usage in &subjects {
        let quota = usage.quota as usize;
        if usage.placed < quota {
            unmet.push(UnmetSoftConstraint {
                constraint_type: "Weekly Quota".to_string(),
                description: format!(
                    "{} is scheduled {} of {} times; {} left unplaced.",
                    usage.subject,
                    usage.placed,
                    quota,
                    quota - usage.placed
                ),
            });
        } else if usage.placed > quota {
            unmet.push(UnmetSoftConstraint {
                constraint_type: "Weekly Quota".to_string(),
                description: format!(
                    "{} is scheduled {} times, {} over its quota of {}.",
                    usage.subject,
                    usage.placed,
                    usage.placed - quota,
                    quota
                ),
            });
        }
    }

    let score = to_score(filled_slots) - to_score(free_slots) - to_score(repeats.len());

    let stats = TimetableStats {
        total_slots,
        filled_slots,
        free_slots,
        adjacent_repeats: repeats.len(),
        subjects,
    };
    (stats, score, unmet)
}

fn to_score(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
