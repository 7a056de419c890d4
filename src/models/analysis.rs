use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-skill aggregate over one analysis snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSkillStat {
    pub skill: String,
    pub vacancy_count: i64,
    /// `100 * vacancy_count / total_vacancies`, 0 when the snapshot is empty.
    pub frequency: f64,
    pub min_salary: Option<f64>,
    pub max_salary: Option<f64>,
    /// Mean of per-record salary midpoints; absent when no record in the
    /// snapshot carries both bounds for this skill.
    pub avg_salary: Option<f64>,
}

/// Immutable result of one aggregation run over a tenant snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub template: Option<String>,
    pub created_at: DateTime<Utc>,
    pub total_vacancies: i64,
    pub skill_stats: Vec<AnalysisSkillStat>,
}

/// Report ordering is caller-defined; the aggregation itself imposes none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSort {
    #[default]
    Popularity,
    MinSalary,
    MaxSalary,
    AvgSalary,
}

/// Salary-sorted views push rows without any known salary to the bottom;
/// a stable sort keeps their relative order.
pub fn sort_skill_stats(stats: &mut [AnalysisSkillStat], sort: SkillSort) {
    match sort {
        SkillSort::Popularity => stats.sort_by(|a, b| b.vacancy_count.cmp(&a.vacancy_count)),
        SkillSort::MinSalary => stats.sort_by(|a, b| {
            salary_unknown(a).cmp(&salary_unknown(b)).then(
                a.min_salary
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.min_salary.unwrap_or(f64::INFINITY)),
            )
        }),
        SkillSort::MaxSalary => stats.sort_by(|a, b| {
            salary_unknown(a).cmp(&salary_unknown(b)).then(
                b.max_salary
                    .unwrap_or(f64::NEG_INFINITY)
                    .total_cmp(&a.max_salary.unwrap_or(f64::NEG_INFINITY)),
            )
        }),
        SkillSort::AvgSalary => stats.sort_by(|a, b| {
            salary_unknown(a).cmp(&salary_unknown(b)).then(
                a.avg_salary
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.avg_salary.unwrap_or(f64::INFINITY)),
            )
        }),
    }
}

fn salary_unknown(stat: &AnalysisSkillStat) -> bool {
    stat.avg_salary.is_none()
}
