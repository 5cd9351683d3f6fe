#![cfg(not(tarpaulin_include))]

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::parser::{Table, parse_csv};
use crate::render::HtmlTable;
use crate::state::{CheckboxView, LoadOutcome, StateManager, TrackedColumns};
use crate::store::StateStore;

const PAGE_TEMPLATE: &str = include_str!("./static/table.html");

pub struct AppState {
    csv_path: PathBuf,
    tracked: TrackedColumns,
}

/// [`StateStore`] backed by the request's cookie jar.
///
/// `set` records the cookie with a root path and an expiry `ttl_days` out;
/// the handler hands the jar back to axum so the response carries the
/// matching `Set-Cookie` header.
pub struct CookieStateStore {
    jar: CookieJar,
}

impl CookieStateStore {
    pub fn new(jar: CookieJar) -> Self {
        CookieStateStore { jar }
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl StateStore for CookieStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.jar.get(key).map(|cookie| cookie.value().to_string())
    }

    fn set(&mut self, key: &str, value: String, ttl_days: i64) {
        let mut cookie = Cookie::new(key.to_string(), value);
        cookie.set_path("/");
        cookie.set_expires(OffsetDateTime::now_utc() + Duration::days(ttl_days));
        self.jar = self.jar.clone().add(cookie);
    }

    fn clear(&mut self, key: &str) {
        self.jar = self.jar.clone().remove(Cookie::from(key.to_string()));
    }
}

#[derive(Deserialize)]
struct CheckUpdate {
    row: usize,
    column: usize,
    checked: bool,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

impl StatusResponse {
    fn ok() -> Json<Self> {
        Json(StatusResponse {
            status: "ok".to_string(),
            message: None,
        })
    }

    fn error(message: String) -> Json<Self> {
        Json(StatusResponse {
            status: "error".to_string(),
            message: Some(message),
        })
    }
}

pub async fn run(addr: &str, csv_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = csv_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let app_state = Arc::new(AppState {
        csv_path,
        tracked: TrackedColumns::LastTwo,
    });

    // Build router
    let app = Router::new()
        .route("/", get(serve_table))
        .route("/api/check", post(update_checkbox))
        .route("/api/reset/:column", post(reset_column))
        .nest_service("/data", ServeDir::new(data_dir))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(app_state);

    // Start server
    let listener = TcpListener::bind(addr).await?;
    log::info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Serve the table page.
///
/// Reads the CSV on every request so the page always reflects the current
/// file, renders it, and applies any saved checkbox state from the cookie.
/// A read failure becomes a full-width error row instead of an error status.
async fn serve_table(State(state): State<Arc<AppState>>, jar: CookieJar) -> Html<String> {
    match tokio::fs::read_to_string(&state.csv_path).await {
        Ok(text) => {
            let table = parse_csv(&text);
            let mut view = HtmlTable::new(&table, &state.tracked);

            let manager =
                StateManager::with_tracked(CookieStateStore::new(jar), state.tracked.clone());
            let status = match manager.load(&table, &mut view) {
                LoadOutcome::Loaded => Some("Checkbox states loaded from saved data"),
                LoadOutcome::NotLoaded => None,
            };

            Html(render_page(&view.to_html(), status))
        }
        Err(e) => {
            log::error!("error reading {}: {}", state.csv_path.display(), e);
            let error_row =
                HtmlTable::error_row_html("Error loading data. Please try again later.");
            Html(render_page(&error_row, None))
        }
    }
}

/// Apply one checkbox toggle and persist the full recomputed state.
async fn update_checkbox(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(update): Json<CheckUpdate>,
) -> impl IntoResponse {
    match load_view(&state).await {
        Ok((table, mut view)) => {
            let mut manager =
                StateManager::with_tracked(CookieStateStore::new(jar), state.tracked.clone());

            // Rehydrate the view first so the save keeps every other checkbox
            manager.load(&table, &mut view);
            view.set_checked(update.row, update.column, update.checked);
            manager.save(&table, &view);

            (manager.into_store().into_jar(), StatusResponse::ok()).into_response()
        }
        Err(e) => {
            log::error!("error updating checkbox state: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusResponse::error(e.to_string()),
            )
                .into_response()
        }
    }
}

/// Uncheck an entire column and persist the result.
async fn reset_column(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(column): Path<usize>,
) -> impl IntoResponse {
    match load_view(&state).await {
        Ok((table, mut view)) => {
            let mut manager =
                StateManager::with_tracked(CookieStateStore::new(jar), state.tracked.clone());

            manager.load(&table, &mut view);
            manager.reset_column(&table, &mut view, column);

            (manager.into_store().into_jar(), StatusResponse::ok()).into_response()
        }
        Err(e) => {
            log::error!("error updating state after reset: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusResponse::error(e.to_string()),
            )
                .into_response()
        }
    }
}

async fn load_view(state: &AppState) -> io::Result<(Table, HtmlTable)> {
    let text = tokio::fs::read_to_string(&state.csv_path).await?;
    let table = parse_csv(&text);
    let view = HtmlTable::new(&table, &state.tracked);
    Ok((table, view))
}

fn render_page(table_html: &str, status: Option<&str>) -> String {
    let handlebars = Handlebars::new();
    handlebars
        .render_template(
            PAGE_TEMPLATE,
            &serde_json::json!({ "table": table_html, "status": status }),
        )
        .unwrap_or_else(|e| {
            log::error!("failed to render page template: {}", e);
            format!("<table id=\"data-table\">{}</table>", table_html)
        })
}
