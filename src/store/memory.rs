use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::analysis::Analysis;
use crate::models::vacancy::{NormalizedVacancy, VacancyRecord};
use crate::store::{CorpusScope, CorpusStore, InsertOutcome};

/// In-memory corpus store: one arena per scope key, so tenant record sets
/// can never collide with each other or with the shared corpus. The write
/// lock held across each insert is the transaction boundary that keeps
/// lazy company/skill resolution free of duplicate-name races.
#[derive(Default)]
pub struct MemoryCorpus {
    arenas: RwLock<HashMap<Uuid, Arena>>,
}

#[derive(Default)]
struct Arena {
    companies: HashMap<String, Uuid>,
    company_names: HashMap<Uuid, String>,
    skills: HashMap<String, Uuid>,
    skill_names: HashMap<Uuid, String>,
    vacancies: Vec<StoredVacancy>,
    urls: HashSet<String>,
    links: HashSet<(Uuid, Uuid)>,
    analyses: Vec<Analysis>,
}

struct StoredVacancy {
    id: Uuid,
    draft: NormalizedVacancy,
    company_id: Uuid,
    skill_ids: Vec<Uuid>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Arena {
    fn resolve_company(&mut self, name: &str) -> Uuid {
        if let Some(id) = self.companies.get(name) {
            return *id;
        }
        let id = Uuid::new_v4();
        self.companies.insert(name.to_string(), id);
        self.company_names.insert(id, name.to_string());
        id
    }

    fn resolve_skill(&mut self, name: &str) -> Uuid {
        if let Some(id) = self.skills.get(name) {
            return *id;
        }
        let id = Uuid::new_v4();
        self.skills.insert(name.to_string(), id);
        self.skill_names.insert(id, name.to_string());
        id
    }

    fn insert(&mut self, draft: &NormalizedVacancy) -> InsertOutcome {
        if self.urls.contains(&draft.url) {
            return InsertOutcome::Duplicate;
        }

        let vacancy_id = Uuid::new_v4();
        let company_id = self.resolve_company(&draft.company);

        let mut skill_ids = Vec::new();
        for name in &draft.skills {
            let skill_id = self.resolve_skill(name);
            // (vacancy, skill) pairs are unique; repeated names collapse.
            if self.links.insert((vacancy_id, skill_id)) {
                skill_ids.push(skill_id);
            }
        }

        self.urls.insert(draft.url.clone());
        self.vacancies.push(StoredVacancy {
            id: vacancy_id,
            draft: draft.clone(),
            company_id,
            skill_ids,
        });
        InsertOutcome::Inserted
    }

    fn records(&self) -> Vec<VacancyRecord> {
        let mut records: Vec<VacancyRecord> = self
            .vacancies
            .iter()
            .map(|stored| {
                VacancyRecord {
                    id: stored.id,
                    url: stored.draft.url.clone(),
                    title: stored.draft.title.clone(),
                    company: self
                        .company_names
                        .get(&stored.company_id)
                        .cloned()
                        .unwrap_or_else(|| stored.draft.company.clone()),
                    city: stored.draft.city.clone(),
                    description: stored.draft.description.clone(),
                    published_at: stored.draft.published_at,
                    source: stored.draft.source.clone(),
                    salary_min: stored.draft.salary_min,
                    salary_max: stored.draft.salary_max,
                    salary_currency: stored.draft.salary_currency.clone(),
                    is_remote: stored.draft.is_remote,
                    employment_type: stored.draft.employment_type,
                    skills: stored
                        .skill_ids
                        .iter()
                        .filter_map(|id| self.skill_names.get(id).cloned())
                        .collect(),
                }
            })
            .collect();
        records.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        records
    }
}

#[async_trait]
impl CorpusStore for MemoryCorpus {
    async fn contains_url(&self, scope: CorpusScope, url: &str) -> Result<bool> {
        let arenas = self.arenas.read().await;
        Ok(arenas
            .get(&scope.key())
            .map(|arena| arena.urls.contains(url))
            .unwrap_or(false))
    }

    async fn insert_vacancy(
        &self,
        scope: CorpusScope,
        draft: &NormalizedVacancy,
    ) -> Result<InsertOutcome> {
        let mut arenas = self.arenas.write().await;
        let arena = arenas.entry(scope.key()).or_default();
        Ok(arena.insert(draft))
    }

    async fn list_vacancies(&self, scope: CorpusScope) -> Result<Vec<VacancyRecord>> {
        let arenas = self.arenas.read().await;
        Ok(arenas
            .get(&scope.key())
            .map(Arena::records)
            .unwrap_or_default())
    }

    async fn count_vacancies(&self, scope: CorpusScope) -> Result<i64> {
        let arenas = self.arenas.read().await;
        Ok(arenas
            .get(&scope.key())
            .map(|arena| arena.vacancies.len() as i64)
            .unwrap_or(0))
    }

    async fn replace_tenant_corpus(
        &self,
        tenant: Uuid,
        drafts: Vec<NormalizedVacancy>,
    ) -> Result<i64> {
        let mut arenas = self.arenas.write().await;
        let arena = arenas.entry(tenant).or_default();

        // Vacancy and association rows go; companies, skills and finished
        // analyses survive the replacement.
        arena.vacancies.clear();
        arena.urls.clear();
        arena.links.clear();

        let mut copied = 0i64;
        for draft in &drafts {
            if arena.insert(draft) == InsertOutcome::Inserted {
                copied += 1;
            }
        }
        Ok(copied)
    }

    async fn insert_analysis(&self, analysis: &Analysis) -> Result<()> {
        let mut arenas = self.arenas.write().await;
        let arena = arenas.entry(analysis.tenant_id).or_default();
        arena.analyses.push(analysis.clone());
        Ok(())
    }

    async fn get_analysis(&self, tenant: Uuid, id: Uuid) -> Result<Analysis> {
        let arenas = self.arenas.read().await;
        arenas
            .get(&tenant)
            .and_then(|arena| arena.analyses.iter().find(|a| a.id == id).cloned())
            .ok_or_else(|| Error::NotFound(format!("Analysis {} not found", id)))
    }

    async fn list_analyses(&self, tenant: Uuid) -> Result<Vec<Analysis>> {
        let arenas = self.arenas.read().await;
        let mut analyses = arenas
            .get(&tenant)
            .map(|arena| arena.analyses.clone())
            .unwrap_or_default();
        analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(analyses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn draft(url: &str, company: &str, skills: &[&str]) -> NormalizedVacancy {
        NormalizedVacancy {
            url: url.into(),
            title: "Developer".into(),
            company: company.into(),
            city: None,
            description: None,
            published_at: Utc::now(),
            source: "hh.ru".into(),
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            is_remote: None,
            employment_type: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn url_is_unique_within_a_scope() {
        let store = MemoryCorpus::new();
        let d = draft("https://api.hh.ru/vacancies/1", "Acme", &["Rust"]);

        assert_eq!(
            store.insert_vacancy(CorpusScope::Shared, &d).await.unwrap(),
            InsertOutcome::Inserted
        );
        assert_eq!(
            store.insert_vacancy(CorpusScope::Shared, &d).await.unwrap(),
            InsertOutcome::Duplicate
        );
        assert_eq!(store.count_vacancies(CorpusScope::Shared).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn scopes_are_isolated() {
        let store = MemoryCorpus::new();
        let tenant = Uuid::new_v4();
        let d = draft("https://api.hh.ru/vacancies/1", "Acme", &[]);

        store
            .insert_vacancy(CorpusScope::Shared, &d)
            .await
            .unwrap();
        assert!(!store
            .contains_url(CorpusScope::Tenant(tenant), &d.url)
            .await
            .unwrap());
        assert_eq!(
            store
                .count_vacancies(CorpusScope::Tenant(tenant))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn company_and_skill_identity_is_reused() {
        let store = MemoryCorpus::new();
        store
            .insert_vacancy(
                CorpusScope::Shared,
                &draft("https://api.hh.ru/vacancies/1", "Acme", &["Rust", "SQL"]),
            )
            .await
            .unwrap();
        store
            .insert_vacancy(
                CorpusScope::Shared,
                &draft("https://api.hh.ru/vacancies/2", "Acme", &["Rust"]),
            )
            .await
            .unwrap();

        let arenas = store.arenas.read().await;
        let arena = arenas.get(&Uuid::nil()).unwrap();
        assert_eq!(arena.companies.len(), 1);
        assert_eq!(arena.skills.len(), 2);
        assert_eq!(arena.links.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_skill_names_collapse_to_one_pair() {
        let store = MemoryCorpus::new();
        store
            .insert_vacancy(
                CorpusScope::Shared,
                &draft("https://api.hh.ru/vacancies/1", "Acme", &["Rust", "Rust"]),
            )
            .await
            .unwrap();

        let records = store.list_vacancies(CorpusScope::Shared).await.unwrap();
        assert_eq!(records[0].skills, vec!["Rust".to_string()]);
    }

    #[tokio::test]
    async fn replace_is_destructive_not_additive() {
        let store = MemoryCorpus::new();
        let tenant = Uuid::new_v4();

        store
            .replace_tenant_corpus(
                tenant,
                vec![draft("https://api.hh.ru/vacancies/1", "Acme", &["Rust"])],
            )
            .await
            .unwrap();
        let copied = store
            .replace_tenant_corpus(
                tenant,
                vec![
                    draft("https://api.hh.ru/vacancies/2", "Globex", &[]),
                    draft("https://api.hh.ru/vacancies/3", "Globex", &[]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(copied, 2);
        let records = store
            .list_vacancies(CorpusScope::Tenant(tenant))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.company == "Globex"));
    }
}
