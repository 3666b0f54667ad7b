use crate::config::Limits;
use crate::data::{Timetable, TimetableConfig, TimetableOutput, TimetableRequest};
use crate::policy::{FillPolicy, RepeatAccounting};
use crate::stats::calculate_stats;
use crate::validation::{ValidationError, validate_request};
use itertools::Itertools;
use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("invalid timetable request: {}", .0.iter().join("; "))]
    Invalid(Vec<ValidationError>),
}

/// Result of [`generate_strict`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrictOutcome {
    pub timetable: Timetable,
    /// Attempts made, including the returned one.
    pub attempts: u32,
    pub valid: bool,
}

/// Fills a timetable with the default [`FillPolicy`].
pub fn generate<R: Rng + ?Sized>(config: &TimetableConfig, rng: &mut R) -> Timetable {
    generate_with_policy(config, &FillPolicy::default(), rng)
}

/// Greedy, quota-aware slot filling.
///
/// Visits the days in order and, within a day, the periods in the order of
/// `policy.slot_order`. Each slot gets a subject drawn uniformly from those
/// with quota left that do not already sit in a filled neighbouring period.
/// When only blocked subjects have quota left, the slot either repeats the
/// neighbour (with `policy.repeat_probability`, never in the first or last
/// period unless `policy.repeat_at_day_edges`) or stays free. Once every
/// quota is spent the remaining slots stay free.
///
/// The random source is consumed only by the subject draw and the repeat
/// coin flip, so a seeded `rng` reproduces the same timetable.
pub fn generate_with_policy<R: Rng + ?Sized>(
    config: &TimetableConfig,
    policy: &FillPolicy,
    rng: &mut R,
) -> Timetable {
    let periods = config.periods_per_day;
    let order = policy.slot_order.periods(periods);
    let mut remaining: Vec<u32> = config.subjects.iter().map(|s| config.quota(s)).collect();
    let mut grid: Vec<Vec<Option<usize>>> = vec![vec![None; periods]; config.days.len()];

    for (day, row) in grid.iter_mut().enumerate() {
        for &period in &order {
            let left = period.checked_sub(1).and_then(|p| row[p]);
            let right = row.get(period + 1).copied().flatten();

            let available: Vec<usize> = (0..remaining.len())
                .filter(|&i| remaining[i] > 0 && Some(i) != left && Some(i) != right)
                .collect();

            let placed = if let Some(&choice) = available.choose(rng) {
                remaining[choice] -= 1;
                Some(choice)
            } else if remaining.iter().any(|&q| q > 0) {
                repeat_neighbour(left, right, period, periods, &mut remaining, policy, rng)
            } else {
                None
            };

            if let Some(i) = placed {
                trace!("{} period {}: {}", config.days[day], period + 1, config.subjects[i]);
            }
            row[period] = placed;
        }
    }

    let grid = grid
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| cell.map(|i| config.subjects[i].clone()))
                .collect()
        })
        .collect();
    Timetable::new(config.days.clone(), periods, grid)
}

// fallback when every subject with quota left is adjacent to this slot
fn repeat_neighbour<R: Rng + ?Sized>(
    left: Option<usize>,
    right: Option<usize>,
    period: usize,
    periods: usize,
    remaining: &mut [u32],
    policy: &FillPolicy,
    rng: &mut R,
) -> Option<usize> {
    if !policy.allows_repeat_at(period, periods) {
        return None;
    }
    let candidate = [left, right]
        .into_iter()
        .flatten()
        .find(|&i| remaining[i] > 0)?;
    if !rng.random_bool(policy.repeat_chance()) {
        debug!("period {}: left free instead of repeating", period + 1);
        return None;
    }
    if policy.repeat_accounting == RepeatAccounting::QuotaBearing {
        remaining[candidate] -= 1;
    }
    debug!("period {}: repeating neighbouring subject", period + 1);
    Some(candidate)
}

/// Whether no day holds the same subject in two consecutive periods. Free
/// slots never count as a repeat.
pub fn is_valid(timetable: &Timetable) -> bool {
    timetable.adjacent_repeats().is_empty()
}

/// Regenerates until [`is_valid`] passes or `max_attempts` timetables have
/// been tried (at least one is always tried).
///
/// When the budget runs out the best attempt is returned: fewest adjacent
/// repeats, then fewest free slots, then the earliest.
pub fn generate_strict<R: Rng + ?Sized>(
    config: &TimetableConfig,
    policy: &FillPolicy,
    max_attempts: u32,
    rng: &mut R,
) -> StrictOutcome {
    let budget = max_attempts.max(1);
    let mut best = generate_with_policy(config, policy, rng);
    let mut best_rank = rank(&best);
    let mut attempts = 1;

    while best_rank.0 > 0 && attempts < budget {
        let candidate = generate_with_policy(config, policy, rng);
        let candidate_rank = rank(&candidate);
        attempts += 1;
        debug!(
            "attempt {}: {} adjacent repeats, {} free slots",
            attempts, candidate_rank.0, candidate_rank.1
        );
        if candidate_rank < best_rank {
            best = candidate;
            best_rank = candidate_rank;
        }
    }

    StrictOutcome {
        timetable: best,
        attempts,
        valid: best_rank.0 == 0,
    }
}

// (adjacent repeats, free slots)
fn rank(timetable: &Timetable) -> (usize, usize) {
    (timetable.adjacent_repeats().len(), timetable.free_slots())
}

/// solves one timetable request: validation, generation and statistics.
pub fn solve(input: &TimetableRequest, limits: &Limits) -> Result<TimetableOutput, SolveError> {
    let start_time = Instant::now();
    let request = validate_request(input, limits).map_err(SolveError::Invalid)?;
    let config = &request.config;

    info!(
        "Generating timetable for {} subjects over {} days x {} periods ({} quota for {} slots)...",
        config.subjects.len(),
        config.days.len(),
        config.periods_per_day,
        config.total_quota(),
        config.total_slots()
    );

    let seed = request.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let outcome = if request.strict {
        generate_strict(config, &request.policy, request.max_attempts, &mut rng)
    } else {
        let timetable = generate_with_policy(config, &request.policy, &mut rng);
        let valid = is_valid(&timetable);
        StrictOutcome {
            timetable,
            attempts: 1,
            valid,
        }
    };

    let duration = start_time.elapsed();
    info!(
        "Timetable generated in {:.2?} after {} attempt(s), valid: {}",
        duration, outcome.attempts, outcome.valid
    );
    trace!("seed {}\n{}", seed, outcome.timetable);

    let (stats, score, unmet_soft_constraints) = calculate_stats(config, &outcome.timetable);
    let table = outcome.timetable.period_rows();
    let Timetable {
        days,
        periods_per_day,
        grid,
    } = outcome.timetable;

    Ok(TimetableOutput {
        days,
        periods_per_day,
        grid,
        table,
        valid: outcome.valid,
        attempts: outcome.attempts,
        seed,
        stats,
        score,
        unmet_soft_constraints,
    })
}
