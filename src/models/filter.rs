use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::vacancy::{EmploymentType, VacancyRecord};

/// Snapshot filter criteria. Every dimension is optional; the absent ones
/// leave the corpus unfiltered. All set dimensions are AND-combined, the
/// employment flags are OR-combined within their dimension.
///
/// The matcher carries a deliberate inclusion bias: a record that does not
/// state a salary bound, currency, employment type or remote flag passes
/// the corresponding filter rather than being discarded as incomplete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    #[serde(default)]
    pub full_time: bool,
    #[serde(default)]
    pub part_time: bool,
    #[serde(default)]
    pub project: bool,
    #[serde(default)]
    pub remote: bool,
}

impl FilterCriteria {
    pub fn matches(&self, record: &VacancyRecord) -> bool {
        self.date_matches(record)
            && self.salary_matches(record)
            && self.currency_matches(record)
            && self.remote_matches(record)
            && self.employment_matches(record)
    }

    fn date_matches(&self, record: &VacancyRecord) -> bool {
        let published = record.published_at.date_naive();
        if let Some(from) = self.date_from {
            if published < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if published > to {
                return false;
            }
        }
        true
    }

    fn salary_matches(&self, record: &VacancyRecord) -> bool {
        if let Some(floor) = self.salary_min {
            match record.salary_min {
                Some(min) if min < floor => return false,
                _ => {}
            }
        }
        if let Some(ceiling) = self.salary_max {
            match record.salary_max {
                Some(max) if max > ceiling => return false,
                _ => {}
            }
        }
        true
    }

    /// Selecting `RUR` also accepts `RUB` and records with no currency;
    /// any other selected currency accepts itself or no currency. The
    /// asymmetry (no reverse RUB rule) is preserved from the source data
    /// conventions.
    fn currency_matches(&self, record: &VacancyRecord) -> bool {
        let Some(wanted) = self.salary_currency.as_deref() else {
            return true;
        };
        match record.salary_currency.as_deref() {
            None => true,
            Some(tagged) if tagged == wanted => true,
            Some("RUB") if wanted == "RUR" => true,
            Some(_) => false,
        }
    }

    fn remote_matches(&self, record: &VacancyRecord) -> bool {
        if !self.remote {
            return true;
        }
        // Unknown remote status matches a remote-only filter.
        record.is_remote.unwrap_or(true)
    }

    fn employment_matches(&self, record: &VacancyRecord) -> bool {
        let wanted: Vec<EmploymentType> = [
            (self.full_time, EmploymentType::FullTime),
            (self.part_time, EmploymentType::PartTime),
            (self.project, EmploymentType::Project),
        ]
        .into_iter()
        .filter_map(|(set, ty)| set.then_some(ty))
        .collect();

        if wanted.is_empty() {
            return true;
        }
        match record.employment_type {
            None => true,
            Some(ty) => wanted.contains(&ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn record() -> VacancyRecord {
        VacancyRecord {
            id: Uuid::new_v4(),
            url: "https://api.hh.ru/vacancies/10".into(),
            title: "Backend Developer".into(),
            company: "Acme".into(),
            city: Some("Москва".into()),
            description: None,
            published_at: Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap(),
            source: "hh.ru".into(),
            salary_min: Some(90_000.0),
            salary_max: Some(140_000.0),
            salary_currency: Some("RUB".into()),
            is_remote: Some(false),
            employment_type: Some(EmploymentType::FullTime),
            skills: vec!["Rust".into()],
        }
    }

    #[test]
    fn empty_criteria_matches_everything() {
        assert!(FilterCriteria::default().matches(&record()));
    }

    #[test]
    fn absent_salary_bounds_accept_any_record() {
        let criteria = FilterCriteria::default();
        let mut r = record();
        r.salary_min = None;
        r.salary_max = None;
        assert!(criteria.matches(&r));
    }

    #[test]
    fn unknown_salary_passes_a_salary_floor() {
        let criteria = FilterCriteria {
            salary_min: Some(100_000.0),
            ..Default::default()
        };
        let mut r = record();
        r.salary_min = None;
        assert!(criteria.matches(&r));

        r.salary_min = Some(50_000.0);
        assert!(!criteria.matches(&r));
    }

    #[test]
    fn salary_ceiling_excludes_only_known_higher_maxima() {
        let criteria = FilterCriteria {
            salary_max: Some(120_000.0),
            ..Default::default()
        };
        let mut r = record();
        assert!(!criteria.matches(&r));

        r.salary_max = None;
        assert!(criteria.matches(&r));
    }

    #[test]
    fn rur_selection_accepts_rub_and_untagged() {
        let criteria = FilterCriteria {
            salary_currency: Some("RUR".into()),
            ..Default::default()
        };
        let mut r = record();
        assert!(criteria.matches(&r)); // RUB

        r.salary_currency = Some("RUR".into());
        assert!(criteria.matches(&r));

        r.salary_currency = None;
        assert!(criteria.matches(&r));

        r.salary_currency = Some("USD".into());
        assert!(!criteria.matches(&r));
    }

    #[test]
    fn non_rur_selection_has_no_alias() {
        let criteria = FilterCriteria {
            salary_currency: Some("USD".into()),
            ..Default::default()
        };
        let mut r = record();
        assert!(!criteria.matches(&r)); // RUB is not USD

        r.salary_currency = None;
        assert!(criteria.matches(&r));
    }

    #[test]
    fn employment_flags_or_combine() {
        let criteria = FilterCriteria {
            part_time: true,
            project: true,
            ..Default::default()
        };
        let mut r = record();
        assert!(!criteria.matches(&r)); // full-time

        r.employment_type = Some(EmploymentType::Project);
        assert!(criteria.matches(&r));

        // Unknown employment is a match-or-unset state, never "false".
        r.employment_type = None;
        assert!(criteria.matches(&r));
    }

    #[test]
    fn remote_filter_keeps_remote_and_unknown() {
        let criteria = FilterCriteria {
            remote: true,
            ..Default::default()
        };
        let mut r = record();
        assert!(!criteria.matches(&r));

        r.is_remote = Some(true);
        assert!(criteria.matches(&r));

        r.is_remote = None;
        assert!(criteria.matches(&r));
    }

    #[test]
    fn date_range_is_inclusive() {
        let criteria = FilterCriteria {
            date_from: Some(NaiveDate::from_ymd_opt(2026, 5, 10).unwrap()),
            date_to: Some(NaiveDate::from_ymd_opt(2026, 5, 10).unwrap()),
            ..Default::default()
        };
        assert!(criteria.matches(&record()));

        let outside = FilterCriteria {
            date_from: Some(NaiveDate::from_ymd_opt(2026, 5, 11).unwrap()),
            ..Default::default()
        };
        assert!(!outside.matches(&record()));
    }
}
