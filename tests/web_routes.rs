#![cfg(feature = "web")]

use asset_dashboard::app::{AppState, router};
use asset_dashboard::config::DashboardConfig;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use rust_xlsxwriter::Workbook;
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn write_data(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Copied Data").unwrap();
    for (row, (object, waarde)) in [("Asfalt", 1000.0), ("Bermen", 250.0), ("Kolken", 80.0), ("Totaal", 1330.0)]
        .iter()
        .enumerate()
    {
        sheet.write_string(row as u32, 0, *object).unwrap();
        sheet.write_number(row as u32, 1, *waarde).unwrap();
    }
    workbook.save(path).unwrap();
}

fn app(dir: &tempfile::TempDir) -> Router {
    let data_path = dir.path().join("copied_values.xlsx");
    write_data(&data_path);
    let config = DashboardConfig {
        data_path,
        ..DashboardConfig::default()
    };
    router(Arc::new(AppState::new(config).unwrap()))
}

fn session_cookie(response: &axum::response::Response) -> String {
    let value = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    value.split(';').next().unwrap().to_string()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    request.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_form(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn first_visit_sets_a_session_and_renders_everything() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let response = app.clone().oneshot(get("/api/dashboard", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).starts_with("session="));

    let view = body_json(response).await;
    assert_eq!(view["notices"], json!([]));
    assert_eq!(view["sections"].as_array().unwrap().len(), 2);
    assert_eq!(view["sections"][1]["title"], "Exploitatiebudget");
    assert_eq!(view["sections"][0]["view"]["totals"]["original_display"], "€ 1.330,00");
    assert_eq!(view["timeline"]["details"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn html_page_shows_sections_and_timeline() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let response = app.oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Vervangingsinvesteringen"));
    assert!(html.contains("Exploitatiebudget"));
    assert!(html.contains("Afwaardering Details"));
    assert!(html.contains("name=\"factor_0\""));
    assert!(html.contains("<svg"));
    for label in [
        "Gegevenstabel",
        "Vergelijking Waarden",
        "Verdeling",
        "Vermenigvuldigingsfactoren",
        "Totale Waarde Na Vermenigvuldiging",
        "Afwaardering Periode per Object",
    ] {
        assert!(html.contains(label), "missing '{}'", label);
    }
}

#[tokio::test]
async fn factor_edits_stick_to_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let first = app.clone().oneshot(get("/api/dashboard", None)).await.unwrap();
    let cookie = session_cookie(&first);
    let before = body_json(first).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/sections/operating-budget/factors",
            &cookie,
            json!([{ "row": 0, "factor": 1.5 }]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reply = body_json(response).await;
    assert_eq!(reply["status"], "ok");
    assert_eq!(reply["changed"], 1);

    let after = body_json(app.clone().oneshot(get("/api/dashboard", Some(&cookie))).await.unwrap()).await;
    let rows = &after["sections"][1]["view"]["rows"];
    assert_eq!(rows[0]["factor"], 1.5);
    assert_eq!(rows[0]["resultaat"], 1500.0);
    assert_eq!(after["sections"][0], before["sections"][0]);

    // another visitor still sees the seeded table
    let other = body_json(app.oneshot(get("/api/dashboard", None)).await.unwrap()).await;
    assert_eq!(other["sections"][1], before["sections"][1]);
}

#[tokio::test]
async fn read_only_and_unknown_sections_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    let cookie = session_cookie(&app.clone().oneshot(get("/api/dashboard", None)).await.unwrap());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/sections/replacement-investments/factors",
            &cookie,
            json!([{ "row": 0, "factor": 1.5 }]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let reply = body_json(response).await;
    assert_eq!(reply["status"], "error");
    assert_eq!(reply["message"], "section 'Vervangingsinvesteringen' is read-only");

    let response = app
        .oneshot(post_json("/api/sections/onbekend/factors", &cookie, json!([])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn timeline_form_clamps_and_redirects() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    let cookie = session_cookie(&app.clone().oneshot(get("/", None)).await.unwrap());

    let response = app
        .clone()
        .oneshot(post_form("/timeline", &cookie, "jaren_0=70&jaren_2=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");

    let view = body_json(app.oneshot(get("/api/dashboard", Some(&cookie))).await.unwrap()).await;
    let timeline = &view["timeline"];
    assert_eq!(timeline["entries"][0]["jaren"], 50);
    assert_eq!(timeline["entries"][2]["jaren"], 10);
    assert_eq!(timeline["state"], "edited");

    let start = view["start_year"].as_i64().unwrap();
    assert_eq!(timeline["details"][0]["eind_jaar"].as_i64().unwrap(), start + 50);
}

#[tokio::test]
async fn not_a_number_years_leave_the_timeline_alone() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    let first = app.clone().oneshot(get("/api/dashboard", None)).await.unwrap();
    let cookie = session_cookie(&first);
    let before = body_json(first).await;

    let response = app
        .clone()
        .oneshot(post_form("/timeline", &cookie, "jaren_0=NaN&jaren_1=30"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let after = body_json(app.oneshot(get("/api/dashboard", Some(&cookie))).await.unwrap()).await;
    assert_eq!(after["timeline"]["entries"], before["timeline"]["entries"]);
}

#[tokio::test]
async fn edits_before_the_first_render_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let response = app
        .oneshot(post_json(
            "/api/timeline",
            "session=0b6c1a4e-5f3f-4c55-9c59-7d7f1f4f2a11",
            json!([{ "row": 0, "jaren": 20 }]),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let reply = body_json(response).await;
    assert_eq!(reply["message"], "table has not been initialized yet");
}
