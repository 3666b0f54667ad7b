//! Input validation for timetable requests.
//!
//! Turns a raw [`TimetableRequest`] into a [`TimetableConfig`] and
//! [`FillPolicy`] the scheduler can trust. Detects:
//! - Empty, blank or duplicate subjects and days
//! - Non-positive periods and quotas
//! - Quotas for subjects that are not in the subject list, and subjects
//!   without a quota, and quota keys that name the same subject once trimmed
//! - Values above the configured limits
//!
//! Every problem found is reported, not just the first.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::config::Limits;
use crate::data::{Subject, TimetableConfig, TimetableRequest};
use crate::policy::FillPolicy;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("at least one subject is required")]
    NoSubjects,
    #[error("subject #{0} has a blank name")]
    BlankSubject(usize),
    #[error("duplicate subject '{0}'")]
    DuplicateSubject(String),
    #[error("at least one day is required")]
    NoDays,
    #[error("day #{0} has a blank label")]
    BlankDay(usize),
    #[error("duplicate day '{0}'")]
    DuplicateDay(String),
    #[error("{count} days requested, at most {max} allowed")]
    TooManyDays { count: usize, max: usize },
    #[error("periods per day must be at least 1")]
    ZeroPeriods,
    #[error("{count} periods per day requested, at most {max} allowed")]
    TooManyPeriods { count: usize, max: usize },
    #[error("subject '{0}' has no weekly quota")]
    MissingQuota(String),
    #[error("subject '{0}' has a zero weekly quota")]
    ZeroQuota(String),
    #[error("subject '{subject}' has quota {quota}, at most {max} allowed")]
    QuotaTooLarge {
        subject: String,
        quota: u32,
        max: u32,
    },
    #[error("quota for '{0}' is given more than once")]
    DuplicateQuota(String),
    #[error("quota given for unknown subject '{0}'")]
    UnknownQuotaSubject(String),
    #[error("repeat probability must be within [0, 1], got {0}")]
    InvalidRepeatProbability(f64),
    #[error("max attempts must be at least 1")]
    ZeroAttempts,
    #[error("{requested} attempts requested, at most {max} allowed")]
    TooManyAttempts { requested: u32, max: u32 },
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub config: TimetableConfig,
    pub policy: FillPolicy,
    pub strict: bool,
    pub max_attempts: u32,
    pub seed: Option<u64>,
}

/// Validates a timetable request against `limits`.
///
/// # Returns
/// The scheduler input on success, `Err(errors)` with all detected issues
/// otherwise.
pub fn validate_request(
    request: &TimetableRequest,
    limits: &Limits,
) -> Result<ValidatedRequest, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let names = request.subjects.names();
    if names.iter().all(String::is_empty) {
        errors.push(ValidationError::NoSubjects);
    } else {
        let mut seen = HashSet::new();
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                errors.push(ValidationError::BlankSubject(i + 1));
            } else if !seen.insert(name.as_str()) {
                errors.push(ValidationError::DuplicateSubject(name.clone()));
            }
        }
    }

    // labels are only built once the count is within the limit
    let day_count = request.days.len();
    let days = if day_count == 0 {
        errors.push(ValidationError::NoDays);
        Vec::new()
    } else if day_count > limits.max_days {
        errors.push(ValidationError::TooManyDays {
            count: day_count,
            max: limits.max_days,
        });
        Vec::new()
    } else {
        request.days.labels()
    };
    let mut seen_days = HashSet::new();
    for (i, day) in days.iter().enumerate() {
        if day.is_empty() {
            errors.push(ValidationError::BlankDay(i + 1));
        } else if !seen_days.insert(day.as_str()) {
            errors.push(ValidationError::DuplicateDay(day.clone()));
        }
    }

    if request.periods_per_day == 0 {
        errors.push(ValidationError::ZeroPeriods);
    } else if request.periods_per_day > limits.max_periods {
        errors.push(ValidationError::TooManyPeriods {
            count: request.periods_per_day,
            max: limits.max_periods,
        });
    }

    let mut keyed: Vec<(&str, u32)> = request
        .quotas
        .iter()
        .map(|(name, &quota)| (name.trim(), quota))
        .collect();
    keyed.sort_unstable();
    let mut explicit: HashMap<&str, u32> = HashMap::new();
    for (name, quota) in keyed {
        if explicit.insert(name, quota).is_some() {
            errors.push(ValidationError::DuplicateQuota(name.to_string()));
        }
    }
    let known: HashSet<&str> = names.iter().map(String::as_str).collect();
    let mut unknown: Vec<&str> = explicit
        .keys()
        .copied()
        .filter(|name| !known.contains(name))
        .collect();
    unknown.sort_unstable();
    for name in unknown {
        errors.push(ValidationError::UnknownQuotaSubject(name.to_string()));
    }

    let mut quotas = HashMap::new();
    let mut subjects = Vec::new();
    for name in names.iter().filter(|n| !n.is_empty()) {
        let subject = Subject::new(name.as_str());
        if quotas.contains_key(&subject) {
            continue;
        }
        match explicit.get(name.as_str()).copied().or(request.default_quota) {
            None => errors.push(ValidationError::MissingQuota(name.clone())),
            Some(0) => errors.push(ValidationError::ZeroQuota(name.clone())),
            Some(quota) if quota > limits.max_quota => {
                errors.push(ValidationError::QuotaTooLarge {
                    subject: name.clone(),
                    quota,
                    max: limits.max_quota,
                })
            }
            Some(quota) => {
                quotas.insert(subject.clone(), quota);
                subjects.push(subject);
            }
        }
    }

    let mut policy = FillPolicy::default();
    if let Some(p) = request.repeat_probability {
        if (0.0..=1.0).contains(&p) {
            policy.repeat_probability = p;
        } else {
            errors.push(ValidationError::InvalidRepeatProbability(p));
        }
    }
    if let Some(accounting) = request.repeat_accounting {
        policy.repeat_accounting = accounting;
    }
    if let Some(edges) = request.repeat_at_day_edges {
        policy.repeat_at_day_edges = edges;
    }
    if let Some(order) = request.slot_order {
        policy.slot_order = order;
    }

    let max_attempts = request.max_attempts.unwrap_or(limits.default_attempts);
    if max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    } else if max_attempts > limits.max_attempts {
        errors.push(ValidationError::TooManyAttempts {
            requested: max_attempts,
            max: limits.max_attempts,
        });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ValidatedRequest {
        config: TimetableConfig::new(subjects, days, request.periods_per_day, quotas),
        policy,
        strict: request.strict,
        max_attempts,
        seed: request.seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DaySpec, SubjectList};
    use crate::policy::SlotOrder;

    fn request(subjects: &str, days: usize, periods: usize) -> TimetableRequest {
        TimetableRequest {
            subjects: SubjectList::Csv(subjects.to_string()),
            days: DaySpec::Count(days),
            periods_per_day: periods,
            quotas: HashMap::new(),
            default_quota: Some(2),
            seed: None,
            strict: true,
            max_attempts: None,
            repeat_probability: None,
            repeat_accounting: None,
            repeat_at_day_edges: None,
            slot_order: None,
        }
    }

    fn has(errors: &[ValidationError], expected: &ValidationError) -> bool {
        errors.iter().any(|e| e == expected)
    }

    #[test]
    fn test_valid_request() {
        let mut req = request("Korean, Math, English", 3, 3);
        req.quotas.insert("Math".into(), 4);
        req.slot_order = Some(SlotOrder::CenterOut);

        let validated = validate_request(&req, &Limits::default()).unwrap();
        let config = &validated.config;
        assert_eq!(
            config.subjects,
            vec![
                Subject::from("Korean"),
                Subject::from("Math"),
                Subject::from("English")
            ]
        );
        assert_eq!(config.days, vec!["Mon", "Tue", "Wed"]);
        assert_eq!(config.quota(&"Math".into()), 4);
        assert_eq!(config.quota(&"Korean".into()), 2);
        assert_eq!(config.quotas.len(), 3);
        assert_eq!(validated.policy.slot_order, SlotOrder::CenterOut);
        assert_eq!(validated.max_attempts, Limits::default().default_attempts);
        assert!(validated.strict);
    }

    #[test]
    fn test_quota_keys_are_trimmed() {
        let mut req = request("A,B", 1, 4);
        req.default_quota = None;
        req.quotas.insert(" A ".into(), 1);
        req.quotas.insert("B".into(), 3);
        let validated = validate_request(&req, &Limits::default()).unwrap();
        assert_eq!(validated.config.quota(&"A".into()), 1);
    }

    #[test]
    fn test_empty_subjects() {
        let req = request("", 1, 1);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert!(has(&errors, &ValidationError::NoSubjects));

        let mut req = request("", 1, 1);
        req.subjects = SubjectList::Names(vec![]);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert!(has(&errors, &ValidationError::NoSubjects));
    }

    #[test]
    fn test_blank_and_duplicate_subjects() {
        let req = request("A,,A", 1, 3);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert!(has(&errors, &ValidationError::BlankSubject(2)));
        assert!(has(&errors, &ValidationError::DuplicateSubject("A".into())));
    }

    #[test]
    fn test_days_and_periods() {
        let req = request("A", 0, 0);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert!(has(&errors, &ValidationError::NoDays));
        assert!(has(&errors, &ValidationError::ZeroPeriods));

        let req = request("A", 8, 11);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert!(has(&errors, &ValidationError::TooManyDays { count: 8, max: 7 }));
        assert!(has(&errors, &ValidationError::TooManyPeriods { count: 11, max: 10 }));

        let mut req = request("A", 1, 1);
        req.days = DaySpec::Labels(vec!["Mon".into(), "Mon".into(), " ".into()]);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert!(has(&errors, &ValidationError::DuplicateDay("Mon".into())));
        assert!(has(&errors, &ValidationError::BlankDay(3)));
    }

    #[test]
    fn test_huge_day_count_is_rejected_without_labels() {
        let mut req = request("A", 1, 3);
        req.days = DaySpec::Count(1usize << 40);
        req.default_quota = Some(1);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::TooManyDays {
                count: 1usize << 40,
                max: 7
            }]
        );
    }

    #[test]
    fn test_quota_keys_colliding_after_trim() {
        let mut req = request("A,B", 1, 4);
        req.quotas.insert("A".into(), 1);
        req.quotas.insert(" A ".into(), 3);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DuplicateQuota("A".into())]);
    }

    #[test]
    fn test_quota_errors() {
        let mut req = request("A,B,C", 1, 3);
        req.default_quota = None;
        req.quotas.insert("A".into(), 0);
        req.quotas.insert("B".into(), 11);
        req.quotas.insert("Z".into(), 1);

        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert!(has(&errors, &ValidationError::ZeroQuota("A".into())));
        assert!(has(
            &errors,
            &ValidationError::QuotaTooLarge {
                subject: "B".into(),
                quota: 11,
                max: 10
            }
        ));
        assert!(has(&errors, &ValidationError::MissingQuota("C".into())));
        assert!(has(&errors, &ValidationError::UnknownQuotaSubject("Z".into())));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_policy_and_attempt_errors() {
        let mut req = request("A", 1, 3);
        req.repeat_probability = Some(1.5);
        req.max_attempts = Some(0);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert!(has(&errors, &ValidationError::InvalidRepeatProbability(1.5)));
        assert!(has(&errors, &ValidationError::ZeroAttempts));

        let mut req = request("A", 1, 3);
        req.max_attempts = Some(5000);
        let errors = validate_request(&req, &Limits::default()).unwrap_err();
        assert!(has(
            &errors,
            &ValidationError::TooManyAttempts {
                requested: 5000,
                max: 1000
            }
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::MissingQuota("Math".into()).to_string(),
            "subject 'Math' has no weekly quota"
        );
        assert_eq!(
            ValidationError::TooManyDays { count: 9, max: 7 }.to_string(),
            "9 days requested, at most 7 allowed"
        );
    }
}
