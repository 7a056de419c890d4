use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SOURCE_HEADHUNTER: &str = "hh.ru";

/// Descriptions are truncated to bound storage; counted in characters,
/// not bytes, so multi-byte text never splits a code point.
pub const MAX_DESCRIPTION_CHARS: usize = 15_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Project,
}

impl EmploymentType {
    /// Maps hh.ru employment ids and display names. Anything else is
    /// treated as unknown, which the filter engine never reads as "false".
    pub fn from_source(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "full" | "полная занятость" => Some(Self::FullTime),
            "part" | "частичная занятость" => Some(Self::PartTime),
            "project" | "проектная работа" => Some(Self::Project),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullTime => "full_time",
            Self::PartTime => "part_time",
            Self::Project => "project",
        }
    }
}

impl std::str::FromStr for EmploymentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_time" => Ok(Self::FullTime),
            "part_time" => Ok(Self::PartTime),
            "project" => Ok(Self::Project),
            _ => Err(()),
        }
    }
}

/// Canonical vacancy read model: scalar fields plus the resolved company
/// name and skill set. Identity within one corpus scope is the source URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacancyRecord {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub company: String,
    pub city: Option<String>,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    /// None = the source did not say; distinct from "not remote".
    pub is_remote: Option<bool>,
    pub employment_type: Option<EmploymentType>,
    pub skills: Vec<String>,
}

impl VacancyRecord {
    /// `(min + max) / 2`, only when both bounds are known.
    pub fn salary_midpoint(&self) -> Option<f64> {
        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) => Some((min + max) / 2.0),
            _ => None,
        }
    }

    /// Write model for copying this record into another corpus scope.
    /// Company and skill identity is re-resolved at the destination.
    pub fn to_draft(&self) -> NormalizedVacancy {
        NormalizedVacancy {
            url: self.url.clone(),
            title: self.title.clone(),
            company: self.company.clone(),
            city: self.city.clone(),
            description: self.description.clone(),
            published_at: self.published_at,
            source: self.source.clone(),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            salary_currency: self.salary_currency.clone(),
            is_remote: self.is_remote,
            employment_type: self.employment_type,
            skills: self.skills.clone(),
        }
    }
}

/// Normalized write model handed to a corpus store. The store resolves
/// the company and each skill by exact name (find-or-create) inside one
/// transaction per record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedVacancy {
    pub url: String,
    pub title: String,
    pub company: String,
    pub city: Option<String>,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub is_remote: Option<bool>,
    pub employment_type: Option<EmploymentType>,
    pub skills: Vec<String>,
}
