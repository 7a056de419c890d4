use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::analysis::{Analysis, AnalysisSkillStat};
use crate::models::vacancy::{NormalizedVacancy, VacancyRecord};
use crate::store::{CorpusScope, CorpusStore, InsertOutcome};

pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(50)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Postgres corpus store. All queries are runtime-bound so the crate
/// builds without a live database; uniqueness lives in the schema
/// constraints and each record insert runs in one transaction.
#[derive(Clone)]
pub struct PgCorpus {
    pool: PgPool,
}

impl PgCorpus {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("Migration failed: {}", e)))?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct VacancyRow {
    id: Uuid,
    url: String,
    title: String,
    company: String,
    city: Option<String>,
    description: Option<String>,
    published_at: DateTime<Utc>,
    source: String,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    salary_currency: Option<String>,
    is_remote: Option<bool>,
    employment_type: Option<String>,
}

impl VacancyRow {
    fn into_record(self, skills: Vec<String>) -> VacancyRecord {
        VacancyRecord {
            id: self.id,
            url: self.url,
            title: self.title,
            company: self.company,
            city: self.city,
            description: self.description,
            published_at: self.published_at,
            source: self.source,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            salary_currency: self.salary_currency,
            is_remote: self.is_remote,
            employment_type: self
                .employment_type
                .as_deref()
                .and_then(|raw| raw.parse().ok()),
            skills,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnalysisRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    template: Option<String>,
    created_at: DateTime<Utc>,
    total_vacancies: i64,
}

#[derive(sqlx::FromRow)]
struct SkillStatRow {
    analysis_id: Uuid,
    skill: String,
    vacancy_count: i64,
    frequency: f64,
    min_salary: Option<f64>,
    max_salary: Option<f64>,
    avg_salary: Option<f64>,
}

async fn insert_draft(
    tx: &mut Transaction<'_, Postgres>,
    scope_key: Uuid,
    draft: &NormalizedVacancy,
) -> Result<InsertOutcome> {
    let company_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO companies (id, tenant_id, name) VALUES ($1, $2, $3)
        ON CONFLICT (tenant_id, name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(scope_key)
    .bind(&draft.company)
    .fetch_one(&mut **tx)
    .await?;

    let vacancy_id: Option<Uuid> = sqlx::query_scalar(
        r#"
        INSERT INTO vacancies (
            id, tenant_id, url, title, company_id, city, description,
            published_at, source, salary_min, salary_max, salary_currency,
            is_remote, employment_type
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
        ON CONFLICT (tenant_id, url) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(scope_key)
    .bind(&draft.url)
    .bind(&draft.title)
    .bind(company_id)
    .bind(&draft.city)
    .bind(&draft.description)
    .bind(draft.published_at)
    .bind(&draft.source)
    .bind(draft.salary_min)
    .bind(draft.salary_max)
    .bind(&draft.salary_currency)
    .bind(draft.is_remote)
    .bind(draft.employment_type.map(|t| t.as_str()))
    .fetch_optional(&mut **tx)
    .await?;

    let Some(vacancy_id) = vacancy_id else {
        return Ok(InsertOutcome::Duplicate);
    };

    for name in &draft.skills {
        let skill_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO skills (id, tenant_id, name) VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(scope_key)
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query(
            "INSERT INTO vacancy_skills (vacancy_id, skill_id) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(vacancy_id)
        .bind(skill_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(InsertOutcome::Inserted)
}

async fn insert_analysis_tx(
    tx: &mut Transaction<'_, Postgres>,
    analysis: &Analysis,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO analyses (id, tenant_id, name, template, created_at, total_vacancies)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(analysis.id)
    .bind(analysis.tenant_id)
    .bind(&analysis.name)
    .bind(&analysis.template)
    .bind(analysis.created_at)
    .bind(analysis.total_vacancies)
    .execute(&mut **tx)
    .await?;

    for stat in &analysis.skill_stats {
        sqlx::query(
            r#"
            INSERT INTO analysis_skills (
                analysis_id, skill, vacancy_count, frequency,
                min_salary, max_salary, avg_salary
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(analysis.id)
        .bind(&stat.skill)
        .bind(stat.vacancy_count)
        .bind(stat.frequency)
        .bind(stat.min_salary)
        .bind(stat.max_salary)
        .bind(stat.avg_salary)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn load_skill_stats(
    pool: &PgPool,
    analysis_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<AnalysisSkillStat>>> {
    let rows: Vec<SkillStatRow> = sqlx::query_as(
        r#"
        SELECT analysis_id, skill, vacancy_count, frequency,
               min_salary, max_salary, avg_salary
        FROM analysis_skills
        WHERE analysis_id = ANY($1)
        ORDER BY skill
        "#,
    )
    .bind(analysis_ids)
    .fetch_all(pool)
    .await?;

    let mut by_analysis: HashMap<Uuid, Vec<AnalysisSkillStat>> = HashMap::new();
    for row in rows {
        by_analysis
            .entry(row.analysis_id)
            .or_default()
            .push(AnalysisSkillStat {
                skill: row.skill,
                vacancy_count: row.vacancy_count,
                frequency: row.frequency,
                min_salary: row.min_salary,
                max_salary: row.max_salary,
                avg_salary: row.avg_salary,
            });
    }
    Ok(by_analysis)
}

#[async_trait]
impl CorpusStore for PgCorpus {
    async fn contains_url(&self, scope: CorpusScope, url: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM vacancies WHERE tenant_id = $1 AND url = $2)",
        )
        .bind(scope.key())
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_vacancy(
        &self,
        scope: CorpusScope,
        draft: &NormalizedVacancy,
    ) -> Result<InsertOutcome> {
        let mut tx = self.pool.begin().await?;
        let outcome = insert_draft(&mut tx, scope.key(), draft).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn list_vacancies(&self, scope: CorpusScope) -> Result<Vec<VacancyRecord>> {
        let rows: Vec<VacancyRow> = sqlx::query_as(
            r#"
            SELECT v.id, v.url, v.title, c.name AS company, v.city, v.description,
                   v.published_at, v.source, v.salary_min, v.salary_max,
                   v.salary_currency, v.is_remote, v.employment_type
            FROM vacancies v
            JOIN companies c ON c.id = v.company_id
            WHERE v.tenant_id = $1
            ORDER BY v.published_at DESC
            "#,
        )
        .bind(scope.key())
        .fetch_all(&self.pool)
        .await?;

        let skill_rows: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT vs.vacancy_id, s.name
            FROM vacancy_skills vs
            JOIN skills s ON s.id = vs.skill_id
            JOIN vacancies v ON v.id = vs.vacancy_id
            WHERE v.tenant_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(scope.key())
        .fetch_all(&self.pool)
        .await?;

        let mut skills_by_vacancy: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (vacancy_id, skill) in skill_rows {
            skills_by_vacancy.entry(vacancy_id).or_default().push(skill);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let skills = skills_by_vacancy.remove(&row.id).unwrap_or_default();
                row.into_record(skills)
            })
            .collect())
    }

    async fn count_vacancies(&self, scope: CorpusScope) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vacancies WHERE tenant_id = $1")
                .bind(scope.key())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn replace_tenant_corpus(
        &self,
        tenant: Uuid,
        drafts: Vec<NormalizedVacancy>,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM vacancy_skills vs
            USING vacancies v
            WHERE vs.vacancy_id = v.id AND v.tenant_id = $1
            "#,
        )
        .bind(tenant)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM vacancies WHERE tenant_id = $1")
            .bind(tenant)
            .execute(&mut *tx)
            .await?;

        let mut copied = 0i64;
        for draft in &drafts {
            if insert_draft(&mut tx, tenant, draft).await? == InsertOutcome::Inserted {
                copied += 1;
            }
        }

        tx.commit().await?;
        Ok(copied)
    }

    async fn insert_analysis(&self, analysis: &Analysis) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_analysis_tx(&mut tx, analysis).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_analysis(&self, tenant: Uuid, id: Uuid) -> Result<Analysis> {
        let row: Option<AnalysisRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, template, created_at, total_vacancies
            FROM analyses
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| Error::NotFound(format!("Analysis {} not found", id)))?;
        let mut stats = load_skill_stats(&self.pool, &[row.id]).await?;

        Ok(Analysis {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            template: row.template,
            created_at: row.created_at,
            total_vacancies: row.total_vacancies,
            skill_stats: stats.remove(&id).unwrap_or_default(),
        })
    }

    async fn list_analyses(&self, tenant: Uuid) -> Result<Vec<Analysis>> {
        let rows: Vec<AnalysisRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, template, created_at, total_vacancies
            FROM analyses
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut stats = load_skill_stats(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| Analysis {
                id: row.id,
                tenant_id: row.tenant_id,
                name: row.name,
                template: row.template,
                created_at: row.created_at,
                total_vacancies: row.total_vacancies,
                skill_stats: stats.remove(&row.id).unwrap_or_default(),
            })
            .collect())
    }
}
