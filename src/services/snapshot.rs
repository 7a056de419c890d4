use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::filter::FilterCriteria;
use crate::models::vacancy::VacancyRecord;
use crate::store::{ensure_tenant_id, CorpusScope, CorpusStore};

/// Rebuilds one tenant corpus from the shared corpus. The copy is
/// destructive for the tenant's vacancies but leaves its analyses
/// intact, so older reports keep describing the corpus they were
/// computed from.
#[derive(Clone)]
pub struct SnapshotService {
    store: Arc<dyn CorpusStore>,
}

impl SnapshotService {
    pub fn new(store: Arc<dyn CorpusStore>) -> Self {
        Self { store }
    }

    /// Filters the shared corpus by title queries (case-insensitive
    /// substring, OR-combined; no queries means everything) and the
    /// criteria, then replaces the tenant corpus with the result.
    /// Returns the number of records copied.
    pub async fn copy(
        &self,
        tenant: Uuid,
        queries: &[String],
        criteria: &FilterCriteria,
    ) -> Result<i64> {
        ensure_tenant_id(tenant)?;

        let needles: Vec<String> = queries
            .iter()
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty())
            .collect();

        let drafts = self
            .store
            .list_vacancies(CorpusScope::Shared)
            .await?
            .into_iter()
            .filter(|record| title_matches(&needles, record) && criteria.matches(record))
            .map(|record| record.to_draft())
            .collect();

        let copied = self.store.replace_tenant_corpus(tenant, drafts).await?;
        info!(%tenant, copied, "Tenant corpus rebuilt");
        Ok(copied)
    }
}

fn title_matches(needles: &[String], record: &VacancyRecord) -> bool {
    if needles.is_empty() {
        return true;
    }
    let title = record.title.to_lowercase();
    needles.iter().any(|needle| title.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vacancy::{NormalizedVacancy, SOURCE_HEADHUNTER};
    use crate::store::MemoryCorpus;
    use chrono::Utc;

    fn draft(url: &str, title: &str) -> NormalizedVacancy {
        NormalizedVacancy {
            url: url.to_string(),
            title: title.to_string(),
            company: "Acme".into(),
            city: None,
            description: None,
            published_at: Utc::now(),
            source: SOURCE_HEADHUNTER.into(),
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            is_remote: None,
            employment_type: None,
            skills: vec![],
        }
    }

    #[tokio::test]
    async fn queries_are_or_combined_over_titles() {
        let store = Arc::new(MemoryCorpus::new());
        for (url, title) in [
            ("https://hh.ru/vacancy/1", "Senior Rust Developer"),
            ("https://hh.ru/vacancy/2", "Go Developer"),
            ("https://hh.ru/vacancy/3", "Python Engineer"),
        ] {
            store
                .insert_vacancy(CorpusScope::Shared, &draft(url, title))
                .await
                .unwrap();
        }

        let service = SnapshotService::new(store.clone());
        let tenant = Uuid::new_v4();
        let copied = service
            .copy(
                tenant,
                &["rust".to_string(), "python".to_string()],
                &FilterCriteria::default(),
            )
            .await
            .unwrap();

        assert_eq!(copied, 2);
        let titles: Vec<String> = store
            .list_vacancies(CorpusScope::Tenant(tenant))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert!(titles.contains(&"Senior Rust Developer".to_string()));
        assert!(titles.contains(&"Python Engineer".to_string()));
    }

    #[tokio::test]
    async fn nil_tenant_cannot_replace_the_shared_corpus() {
        let store = Arc::new(MemoryCorpus::new());
        store
            .insert_vacancy(
                CorpusScope::Shared,
                &draft("https://hh.ru/vacancy/1", "Rust Developer"),
            )
            .await
            .unwrap();
        store
            .insert_vacancy(
                CorpusScope::Shared,
                &draft("https://hh.ru/vacancy/2", "Go Developer"),
            )
            .await
            .unwrap();

        let service = SnapshotService::new(store.clone());
        let result = service
            .copy(
                Uuid::nil(),
                &["rust".to_string()],
                &FilterCriteria::default(),
            )
            .await;

        assert!(matches!(result, Err(crate::error::Error::BadRequest(_))));
        assert_eq!(
            store.count_vacancies(CorpusScope::Shared).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn empty_queries_copy_the_whole_shared_corpus() {
        let store = Arc::new(MemoryCorpus::new());
        store
            .insert_vacancy(CorpusScope::Shared, &draft("https://hh.ru/vacancy/1", "A"))
            .await
            .unwrap();
        store
            .insert_vacancy(CorpusScope::Shared, &draft("https://hh.ru/vacancy/2", "B"))
            .await
            .unwrap();

        let service = SnapshotService::new(store.clone());
        let copied = service
            .copy(Uuid::new_v4(), &[], &FilterCriteria::default())
            .await
            .unwrap();
        assert_eq!(copied, 2);
    }

    #[tokio::test]
    async fn recopy_replaces_the_previous_snapshot() {
        let store = Arc::new(MemoryCorpus::new());
        store
            .insert_vacancy(
                CorpusScope::Shared,
                &draft("https://hh.ru/vacancy/1", "Rust Developer"),
            )
            .await
            .unwrap();
        store
            .insert_vacancy(
                CorpusScope::Shared,
                &draft("https://hh.ru/vacancy/2", "Go Developer"),
            )
            .await
            .unwrap();

        let service = SnapshotService::new(store.clone());
        let tenant = Uuid::new_v4();

        service
            .copy(tenant, &["rust".to_string()], &FilterCriteria::default())
            .await
            .unwrap();
        let copied = service
            .copy(tenant, &["go".to_string()], &FilterCriteria::default())
            .await
            .unwrap();

        assert_eq!(copied, 1);
        let records = store
            .list_vacancies(CorpusScope::Tenant(tenant))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Go Developer");
    }
}
