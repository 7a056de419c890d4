pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::analysis::Analysis;
use crate::models::vacancy::{NormalizedVacancy, VacancyRecord};

pub use memory::MemoryCorpus;
pub use postgres::PgCorpus;

/// One corpus scope: the process-wide shared record set fed by the
/// collector, or a tenant's isolated copy fed by snapshot replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorpusScope {
    Shared,
    Tenant(Uuid),
}

impl CorpusScope {
    /// Storage key; the shared scope maps to the nil UUID so that the
    /// per-scope uniqueness constraints cover it too.
    pub fn key(&self) -> Uuid {
        match self {
            CorpusScope::Shared => Uuid::nil(),
            CorpusScope::Tenant(id) => *id,
        }
    }
}

/// The shared corpus lives under the nil key, so a caller-supplied
/// tenant id must never be nil: it would alias the shared corpus and a
/// tenant snapshot could destructively replace it. Every service that
/// accepts an external tenant id goes through this check.
pub fn ensure_tenant_id(tenant: Uuid) -> Result<()> {
    if tenant.is_nil() {
        return Err(Error::BadRequest(
            "Tenant id must not be the nil UUID".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A record with the same URL already exists in this scope.
    Duplicate,
}

/// Persistence seam for the vacancy corpus. Uniqueness invariants per
/// scope: vacancy URL, company name, skill name, (vacancy, skill) pair.
///
/// `insert_vacancy` resolves company and skill identity lazily
/// (find-or-create) inside a single transaction or lock scope per record,
/// so concurrent normalize-and-insert steps cannot race duplicate names.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    async fn contains_url(&self, scope: CorpusScope, url: &str) -> Result<bool>;

    async fn insert_vacancy(
        &self,
        scope: CorpusScope,
        draft: &NormalizedVacancy,
    ) -> Result<InsertOutcome>;

    /// All records of a scope, newest publication first.
    async fn list_vacancies(&self, scope: CorpusScope) -> Result<Vec<VacancyRecord>>;

    async fn count_vacancies(&self, scope: CorpusScope) -> Result<i64>;

    /// Destructive snapshot replacement: clears the tenant's vacancy and
    /// association rows, then inserts the drafts, re-resolving company and
    /// skill identity against the tenant scope. All-or-nothing: a mid-copy
    /// failure leaves the destination cleared, never partially populated.
    async fn replace_tenant_corpus(
        &self,
        tenant: Uuid,
        drafts: Vec<NormalizedVacancy>,
    ) -> Result<i64>;

    async fn insert_analysis(&self, analysis: &Analysis) -> Result<()>;

    async fn get_analysis(&self, tenant: Uuid, id: Uuid) -> Result<Analysis>;

    /// Newest first.
    async fn list_analyses(&self, tenant: Uuid) -> Result<Vec<Analysis>>;
}
