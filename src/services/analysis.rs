use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::analysis::{sort_skill_stats, Analysis, AnalysisSkillStat, SkillSort};
use crate::models::vacancy::VacancyRecord;
use crate::store::{ensure_tenant_id, CorpusScope, CorpusStore};

/// Per-skill aggregation over one set of records. Salary bounds feed the
/// min and max independently; the average only sees records carrying
/// both bounds, as their midpoint.
pub fn aggregate(records: &[VacancyRecord]) -> Vec<AnalysisSkillStat> {
    #[derive(Default)]
    struct Acc {
        count: i64,
        mins: Vec<f64>,
        maxes: Vec<f64>,
        midpoints: Vec<f64>,
    }

    let total = records.len() as i64;
    let mut by_skill: BTreeMap<&str, Acc> = BTreeMap::new();

    for record in records {
        for skill in &record.skills {
            let acc = by_skill.entry(skill.as_str()).or_default();
            acc.count += 1;
            if let Some(min) = record.salary_min {
                acc.mins.push(min);
            }
            if let Some(max) = record.salary_max {
                acc.maxes.push(max);
            }
            if let Some(mid) = record.salary_midpoint() {
                acc.midpoints.push(mid);
            }
        }
    }

    by_skill
        .into_iter()
        .map(|(skill, acc)| AnalysisSkillStat {
            skill: skill.to_string(),
            vacancy_count: acc.count,
            frequency: if total > 0 {
                acc.count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            min_salary: acc.mins.into_iter().reduce(f64::min),
            max_salary: acc.maxes.into_iter().reduce(f64::max),
            avg_salary: mean(&acc.midpoints),
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Creates and serves immutable analyses over a tenant corpus.
#[derive(Clone)]
pub struct AnalysisService {
    store: Arc<dyn CorpusStore>,
}

impl AnalysisService {
    pub fn new(store: Arc<dyn CorpusStore>) -> Self {
        Self { store }
    }

    /// Aggregates the tenant corpus as it stands right now and persists
    /// the result. An empty corpus is an error, not an empty report.
    pub async fn create(
        &self,
        tenant: Uuid,
        name: Option<String>,
        template: Option<String>,
    ) -> Result<Analysis> {
        ensure_tenant_id(tenant)?;

        let records = self
            .store
            .list_vacancies(CorpusScope::Tenant(tenant))
            .await?;
        if records.is_empty() {
            return Err(Error::BadRequest(
                "Tenant corpus is empty, nothing to analyze".to_string(),
            ));
        }

        let created_at = Utc::now();
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Analysis of {}", created_at.format("%Y-%m-%d %H:%M:%S")));

        let analysis = Analysis {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            name,
            template,
            created_at,
            total_vacancies: records.len() as i64,
            skill_stats: aggregate(&records),
        };
        self.store.insert_analysis(&analysis).await?;

        info!(
            %tenant,
            analysis = %analysis.id,
            total = analysis.total_vacancies,
            skills = analysis.skill_stats.len(),
            "Analysis created"
        );
        Ok(analysis)
    }

    pub async fn get(&self, tenant: Uuid, id: Uuid, sort: SkillSort) -> Result<Analysis> {
        ensure_tenant_id(tenant)?;
        let mut analysis = self.store.get_analysis(tenant, id).await?;
        sort_skill_stats(&mut analysis.skill_stats, sort);
        Ok(analysis)
    }

    pub async fn list(&self, tenant: Uuid) -> Result<Vec<Analysis>> {
        ensure_tenant_id(tenant)?;
        self.store.list_analyses(tenant).await
    }
}
