use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use uuid::Uuid;

use crate::config::DashboardConfig;
use crate::dashboard::{DashboardView, current_year, render_dashboard};
use crate::error::EditError;
use crate::factors::FactorEdit;
use crate::loader::{LoadedRecords, load_records};
use crate::section::SectionKind;
use crate::session::SessionStore;
use crate::timeline::TimelineEdit;

const SESSION_COOKIE: &str = "session";

pub struct AppState {
    config: DashboardConfig,
    records: OnceLock<LoadedRecords>,
    sessions: SessionStore,
    templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Result<Self, handlebars::TemplateError> {
        let mut templates = Handlebars::new();
        templates.register_template_string("dashboard", include_str!("./static/dashboard.hbs"))?;

        Ok(Self {
            sessions: SessionStore::new(Duration::from_secs(config.session_ttl_secs)),
            config,
            records: OnceLock::new(),
            templates,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Records of the data workbook, read on first use
    pub fn records(&self) -> &LoadedRecords {
        self.records.get_or_init(|| {
            log::info!("Loading records from '{}'", self.config.data_path.display());
            load_records(&self.config.data_path, &self.config.loader)
        })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Render outside the session lock, then store whatever was seeded
    pub fn render(&self, id: &str) -> DashboardView {
        let records = self.records();
        let now = SystemTime::now();

        let mut session = self.sessions.check_out(id, now);
        let view = render_dashboard(records, &mut session, &self.config, current_year());
        self.sessions.check_in(id, session, now);

        view
    }

    fn edit_section(
        &self,
        id: &str,
        kind: SectionKind,
        edits: &[FactorEdit],
    ) -> Result<usize, EditError> {
        let section = self
            .config
            .section(kind)
            .ok_or_else(|| EditError::UnknownSection(kind.slug().to_string()))?;
        self.sessions
            .with_live(id, SystemTime::now(), |session| {
                session.edit_factors(section, edits, &self.config.factor_domain)
            })
            .unwrap_or(Err(EditError::NotInitialized))
    }

    fn edit_timeline(&self, id: &str, edits: &[TimelineEdit]) -> Result<usize, EditError> {
        self.sessions
            .with_live(id, SystemTime::now(), |session| {
                session.edit_timeline(edits, &self.config.timeline.years)
            })
            .unwrap_or(Err(EditError::NotInitialized))
    }
}

#[derive(Serialize)]
struct EditResponse {
    status: String,
    changed: usize,
    message: Option<String>,
}

impl EditResponse {
    fn from_result(result: Result<usize, EditError>) -> Response {
        match result {
            Ok(changed) => Json(EditResponse {
                status: "ok".to_string(),
                changed,
                message: Some(format!("Updated {} value(s)", changed)),
            })
            .into_response(),
            Err(e) => {
                let code = match e {
                    EditError::UnknownSection(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_REQUEST,
                };
                let body = Json(EditResponse {
                    status: "error".to_string(),
                    changed: 0,
                    message: Some(e.to_string()),
                });
                (code, body).into_response()
            }
        }
    }
}

/// Build the dashboard router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/dashboard", get(get_dashboard))
        .route("/sections/:section/factors", post(submit_factors))
        .route("/api/sections/:section/factors", post(update_factors))
        .route("/timeline", post(submit_timeline))
        .route("/api/timeline", post(update_timeline))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
}

pub async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let bind = config.bind.clone();
    let state = Arc::new(AppState::new(config)?);

    let listener = TcpListener::bind(&bind).await?;
    log::info!("Listening on http://{}", bind);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// The session id from the cookie, or a fresh one set on the returned jar
fn session_id(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if Uuid::parse_str(cookie.value()).is_ok() {
            let id = cookie.value().to_string();
            return (jar, id);
        }
    }

    let id = Uuid::new_v4().to_string();
    let mut cookie = Cookie::new(SESSION_COOKIE, id.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    (jar.add(cookie), id)
}

async fn serve_dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, id) = session_id(jar);
    let view = state.render(&id);

    match state.templates.render("dashboard", &view) {
        Ok(html) => (jar, Html(html)).into_response(),
        Err(e) => {
            log::error!("Failed to render dashboard: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render dashboard: {}", e),
            )
                .into_response()
        }
    }
}

async fn get_dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> impl IntoResponse {
    let (jar, id) = session_id(jar);
    let view = state.render(&id);
    (jar, Json(view))
}

fn section_kind(slug: &str) -> Result<SectionKind, Response> {
    SectionKind::from_slug(slug)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown section '{}'", slug)).into_response())
}

/// Grid edits from form fields named `<prefix><row>`, in row order
fn form_edits<T>(
    form: &HashMap<String, String>,
    prefix: &str,
    parse: impl Fn(usize, &str) -> Option<T>,
) -> Result<Vec<T>, EditError> {
    let mut rows: Vec<(usize, &str)> = form
        .iter()
        .filter_map(|(key, value)| {
            let row = key.strip_prefix(prefix)?.parse().ok()?;
            Some((row, value.as_str()))
        })
        .collect();
    rows.sort_by_key(|(row, _)| *row);

    rows.into_iter()
        .map(|(row, value)| parse(row, value.trim()).ok_or(EditError::NotANumber(row)))
        .collect()
}

fn parse_factor(row: usize, value: &str) -> Option<FactorEdit> {
    let factor = value.replace(',', ".").parse::<f64>().ok()?;
    Some(FactorEdit { row, factor })
}

fn parse_jaren(row: usize, value: &str) -> Option<TimelineEdit> {
    let jaren = match value.parse::<i64>() {
        Ok(jaren) => jaren,
        Err(_) => {
            let years = value.replace(',', ".").parse::<f64>().ok()?;
            if !years.is_finite() {
                return None;
            }
            years.round() as i64
        }
    };
    Some(TimelineEdit { row, jaren })
}

async fn submit_factors(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    jar: CookieJar,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let kind = match section_kind(&slug) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let (jar, id) = session_id(jar);

    let result = form_edits(&form, "factor_", parse_factor)
        .and_then(|edits| state.edit_section(&id, kind, &edits));
    if let Err(e) = result {
        log::warn!("Rejected factor edits for '{}': {}", slug, e);
    }

    (jar, Redirect::to("/")).into_response()
}

async fn update_factors(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    jar: CookieJar,
    Json(edits): Json<Vec<FactorEdit>>,
) -> Response {
    let kind = match section_kind(&slug) {
        Ok(kind) => kind,
        Err(response) => return response,
    };
    let (jar, id) = session_id(jar);

    (jar, EditResponse::from_result(state.edit_section(&id, kind, &edits))).into_response()
}

async fn submit_timeline(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<HashMap<String, String>>,
) -> (CookieJar, Redirect) {
    let (jar, id) = session_id(jar);

    let result = form_edits(&form, "jaren_", parse_jaren)
        .and_then(|edits| state.edit_timeline(&id, &edits));
    if let Err(e) = result {
        log::warn!("Rejected timeline edits: {}", e);
    }

    (jar, Redirect::to("/"))
}

async fn update_timeline(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(edits): Json<Vec<TimelineEdit>>,
) -> Response {
    let (jar, id) = session_id(jar);
    (jar, EditResponse::from_result(state.edit_timeline(&id, &edits))).into_response()
}
