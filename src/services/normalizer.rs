use chrono::Utc;

use crate::error::{Error, Result};
use crate::models::vacancy::{
    EmploymentType, NormalizedVacancy, MAX_DESCRIPTION_CHARS, SOURCE_HEADHUNTER,
};
use crate::services::hh_client::{RawVacancyDetails, RawVacancyItem};
use crate::utils::time::parse_published_at;

/// Turns one raw search item plus its detail payload into the canonical
/// write model. The only hard requirement is the public URL; every other
/// missing field gets a placeholder or stays unknown.
pub fn normalize(item: &RawVacancyItem, details: &RawVacancyDetails) -> Result<NormalizedVacancy> {
    let url = item
        .alternate_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::InvalidInput("Vacancy item has no URL".to_string()))?
        .to_string();

    let title = item
        .name
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
        .to_string();

    let company = item
        .employer
        .as_ref()
        .and_then(|e| e.name.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let city = item
        .area
        .as_ref()
        .and_then(|a| a.name.clone())
        .filter(|c| !c.is_empty());

    let description = details
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| d.chars().take(MAX_DESCRIPTION_CHARS).collect());

    let (salary_min, salary_max, salary_currency) = match &item.salary {
        Some(salary) => (salary.from, salary.to, salary.currency.clone()),
        None => (None, None, None),
    };

    // Absent schedule must stay unknown, not "not remote".
    let is_remote = item
        .schedule
        .as_ref()
        .and_then(|s| s.id.as_deref())
        .map(|id| id == "remote");

    let employment_type = item.employment.as_ref().and_then(|e| {
        e.id.as_deref()
            .and_then(EmploymentType::from_source)
            .or_else(|| e.name.as_deref().and_then(EmploymentType::from_source))
    });

    let skills = details
        .key_skills
        .iter()
        .filter_map(|s| s.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    Ok(NormalizedVacancy {
        url,
        title,
        company,
        city,
        description,
        published_at: parse_published_at(item.published_at.as_deref()),
        source: SOURCE_HEADHUNTER.to_string(),
        salary_min,
        salary_max,
        salary_currency,
        is_remote,
        employment_type,
        skills,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::hh_client::{RawEmployment, RawKeySkill, RawSchedule};

    fn item(url: Option<&str>) -> RawVacancyItem {
        serde_json::from_value(serde_json::json!({
            "alternate_url": url,
            "name": "Rust Developer",
            "employer": { "name": "Acme" },
            "salary": { "from": 100000.0, "to": 150000.0, "currency": "RUR" },
            "published_at": "2026-05-01T10:00:00+0300",
            "area": { "name": "Москва" },
        }))
        .unwrap()
    }

    #[test]
    fn url_is_mandatory() {
        let err = normalize(&item(None), &RawVacancyDetails::default());
        assert!(matches!(err, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn missing_title_and_company_get_placeholders() {
        let mut raw = item(Some("https://hh.ru/vacancy/1"));
        raw.name = None;
        raw.employer = None;

        let normalized = normalize(&raw, &RawVacancyDetails::default()).unwrap();
        assert_eq!(normalized.title, "Untitled");
        assert_eq!(normalized.company, "Unknown");
    }

    #[test]
    fn description_truncates_by_characters() {
        let details = RawVacancyDetails {
            description: Some("ф".repeat(MAX_DESCRIPTION_CHARS + 10)),
            key_skills: vec![],
        };
        let normalized = normalize(&item(Some("https://hh.ru/vacancy/1")), &details).unwrap();
        assert_eq!(
            normalized.description.unwrap().chars().count(),
            MAX_DESCRIPTION_CHARS
        );
    }

    #[test]
    fn nameless_skills_are_dropped() {
        let details = RawVacancyDetails {
            description: None,
            key_skills: vec![
                RawKeySkill { name: Some("Rust".into()) },
                RawKeySkill { name: None },
                RawKeySkill { name: Some("  ".into()) },
            ],
        };
        let normalized = normalize(&item(Some("https://hh.ru/vacancy/1")), &details).unwrap();
        assert_eq!(normalized.skills, vec!["Rust".to_string()]);
    }

    #[test]
    fn schedule_drives_remote_flag() {
        let mut raw = item(Some("https://hh.ru/vacancy/1"));
        assert_eq!(
            normalize(&raw, &RawVacancyDetails::default())
                .unwrap()
                .is_remote,
            None
        );

        raw.schedule = Some(RawSchedule { id: Some("remote".into()) });
        assert_eq!(
            normalize(&raw, &RawVacancyDetails::default())
                .unwrap()
                .is_remote,
            Some(true)
        );

        raw.schedule = Some(RawSchedule { id: Some("fullDay".into()) });
        assert_eq!(
            normalize(&raw, &RawVacancyDetails::default())
                .unwrap()
                .is_remote,
            Some(false)
        );
    }

    #[test]
    fn employment_prefers_id_over_name() {
        let mut raw = item(Some("https://hh.ru/vacancy/1"));
        raw.employment = Some(RawEmployment {
            id: Some("part".into()),
            name: Some("Полная занятость".into()),
        });
        let normalized = normalize(&raw, &RawVacancyDetails::default()).unwrap();
        assert_eq!(normalized.employment_type, Some(EmploymentType::PartTime));
    }
}
