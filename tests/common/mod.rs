#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Canned reply for one vacancy detail endpoint.
#[derive(Clone)]
pub enum DetailReply {
    Ok(Value),
    Status(u16),
    /// Never answers within any client timeout, so every fetch attempt
    /// surfaces as a transport failure.
    Stall,
}

/// Local stand-in for the hh.ru API. Search pages are served by index,
/// details by vacancy id; every detail call is recorded so tests can
/// assert on fetch counts.
#[derive(Clone, Default)]
pub struct StubHh {
    pages: Arc<Mutex<Vec<Value>>>,
    details: Arc<Mutex<HashMap<String, DetailReply>>>,
    detail_calls: Arc<Mutex<Vec<String>>>,
    detail_delay: Arc<Mutex<Duration>>,
}

impl StubHh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pages(&self, pages: Vec<Value>) {
        *self.pages.lock().unwrap() = pages;
    }

    pub fn set_detail(&self, id: &str, reply: DetailReply) {
        self.details.lock().unwrap().insert(id.to_string(), reply);
    }

    pub fn set_detail_delay(&self, delay: Duration) {
        *self.detail_delay.lock().unwrap() = delay;
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls.lock().unwrap().clone()
    }

    pub fn detail_calls_for(&self, id: &str) -> usize {
        self.detail_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|called| called.as_str() == id)
            .count()
    }

    /// Binds the stub to an ephemeral port and returns its base URL.
    pub async fn spawn(self) -> String {
        let app = Router::new()
            .route("/vacancies", get(search))
            .route("/vacancies/:id", get(detail))
            .with_state(self);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve stub");
        });
        format!("http://{}", addr)
    }
}

async fn search(
    State(stub): State<StubHh>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let page: usize = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    let pages = stub.pages.lock().unwrap();
    Json(
        pages
            .get(page)
            .cloned()
            .unwrap_or_else(|| json!({ "found": 0, "pages": 0, "items": [] })),
    )
}

async fn detail(State(stub): State<StubHh>, Path(id): Path<String>) -> Response {
    stub.detail_calls.lock().unwrap().push(id.clone());
    let delay = *stub.detail_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reply = stub.details.lock().unwrap().get(&id).cloned();
    match reply {
        Some(DetailReply::Ok(body)) => Json(body).into_response(),
        Some(DetailReply::Status(code)) => StatusCode::from_u16(code)
            .expect("valid status code")
            .into_response(),
        Some(DetailReply::Stall) => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            StatusCode::REQUEST_TIMEOUT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// One search item in the upstream wire shape. The public URL's trailing
/// segment is the id the detail endpoint is derived from.
pub fn search_item(id: u32, title: &str) -> Value {
    json!({
        "alternate_url": format!("https://hh.ru/vacancy/{}", id),
        "name": title,
        "employer": { "name": "Acme" },
        "salary": { "from": 100000.0, "to": 150000.0, "currency": "RUR" },
        "published_at": "2026-05-01T10:00:00+0300",
        "area": { "name": "Москва" },
        "schedule": { "id": "fullDay" },
        "employment": { "id": "full", "name": "Полная занятость" },
    })
}

pub fn search_page(pages: u32, items: Vec<Value>) -> Value {
    json!({
        "found": items.len(),
        "pages": pages,
        "items": items,
    })
}

pub fn detail_body(description: &str, skills: &[&str]) -> Value {
    json!({
        "description": description,
        "key_skills": skills.iter().map(|s| json!({ "name": s })).collect::<Vec<_>>(),
    })
}
