use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

/// hh.ru caps search pagination at 50 items per page.
pub const PER_PAGE: u32 = 50;

/// One search page of the hh.ru API. `pages` is re-read from every
/// response because the upstream total can shrink while paging.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub found: u64,
    #[serde(default = "default_pages")]
    pub pages: u32,
    #[serde(default)]
    pub items: Vec<RawVacancyItem>,
}

fn default_pages() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVacancyItem {
    pub alternate_url: Option<String>,
    pub name: Option<String>,
    pub employer: Option<RawEmployer>,
    pub salary: Option<RawSalary>,
    pub published_at: Option<String>,
    pub area: Option<RawArea>,
    pub schedule: Option<RawSchedule>,
    pub employment: Option<RawEmployment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEmployer {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSalary {
    pub from: Option<f64>,
    pub to: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArea {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSchedule {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEmployment {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawVacancyDetails {
    pub description: Option<String>,
    #[serde(default)]
    pub key_skills: Vec<RawKeySkill>,
}

#[derive(Debug, Deserialize)]
pub struct RawKeySkill {
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HhClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Delay before retrying a transport failure on a detail fetch.
    pub retry_delay: Duration,
    /// Base of the doubling backoff applied to 403/429 responses.
    pub backoff_base: Duration,
}

impl HhClientConfig {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: user_agent.into(),
            timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(1),
            // First 403/429 backoff is 1s, the second 2s.
            backoff_base: Duration::from_secs(1),
        }
    }
}

const DETAIL_ATTEMPTS: u32 = 3;

/// Thin client over the hh.ru public API: one call per search page and
/// one per vacancy detail, with the retry taxonomy applied to details.
#[derive(Clone)]
pub struct HhClient {
    client: reqwest::Client,
    config: HhClientConfig,
}

impl HhClient {
    pub fn new(config: HhClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetches one search page. Any failure here is terminal for the
    /// page loop, so no retries are attempted.
    pub async fn search(&self, query: &str, area: u32, page: u32) -> Result<SearchPage> {
        let url = format!("{}/vacancies", self.config.base_url);
        let page_str = page.to_string();
        let per_page_str = PER_PAGE.to_string();
        let area_str = area.to_string();
        let params = [
            ("text", query),
            ("area", area_str.as_str()),
            ("page", page_str.as_str()),
            ("per_page", per_page_str.as_str()),
        ];

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::NetworkTransient(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "Search returned {} for query '{}'",
                status, query
            )));
        }

        response
            .json::<SearchPage>()
            .await
            .map_err(|e| Error::Parse(format!("Malformed search page: {}", e)))
    }

    /// Fetches the detail payload behind a search item's public URL.
    ///
    /// Retry taxonomy, sharing one attempt budget:
    ///   404            -> NotFound immediately, the item is skipped
    ///   403/429        -> doubling backoff, RateLimited once exhausted
    ///   transport      -> fixed delay, NetworkTransient once exhausted
    ///   other non-2xx  -> Upstream immediately
    pub async fn vacancy_details(&self, vacancy_url: &str) -> Result<RawVacancyDetails> {
        let endpoint = self.detail_endpoint(vacancy_url)?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.client.get(&endpoint).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<RawVacancyDetails>().await.map_err(|e| {
                            Error::Parse(format!("Malformed vacancy details: {}", e))
                        });
                    }
                    if status == StatusCode::NOT_FOUND {
                        return Err(Error::NotFound(format!(
                            "Vacancy gone upstream: {}",
                            vacancy_url
                        )));
                    }
                    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                        if attempt >= DETAIL_ATTEMPTS {
                            return Err(Error::RateLimited(format!(
                                "Upstream kept returning {} for {}",
                                status, vacancy_url
                            )));
                        }
                        let backoff = self.config.backoff_base * 2u32.pow(attempt - 1);
                        warn!(url = vacancy_url, %status, "Backing off detail fetch");
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    return Err(Error::Upstream(format!(
                        "Detail fetch returned {} for {}",
                        status, vacancy_url
                    )));
                }
                Err(e) => {
                    if attempt >= DETAIL_ATTEMPTS {
                        return Err(Error::NetworkTransient(format!(
                            "Detail fetch failed for {}: {}",
                            vacancy_url, e
                        )));
                    }
                    warn!(url = vacancy_url, error = %e, "Retrying detail fetch");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    /// Detail API endpoint for a public vacancy URL. The numeric id is
    /// the last path segment of the public link.
    fn detail_endpoint(&self, vacancy_url: &str) -> Result<String> {
        let parsed = url::Url::parse(vacancy_url)
            .map_err(|e| Error::InvalidInput(format!("Bad vacancy URL '{}': {}", vacancy_url, e)))?;
        let id = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .filter(|last| last.chars().all(|c| c.is_ascii_digit()))
            .ok_or_else(|| {
                Error::InvalidInput(format!("No vacancy id in URL '{}'", vacancy_url))
            })?;
        Ok(format!("{}/vacancies/{}", self.config.base_url, id))
    }
}
