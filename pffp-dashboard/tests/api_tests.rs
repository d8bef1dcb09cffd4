//! Integration tests for pffp-dashboard API endpoints
//!
//! Drives the full router with an in-memory data source:
//! - Health and build info
//! - Dashboard, KPI, chart and filter-option reads
//! - Filter changes, resets and validation
//! - Language switching
//! - Refresh success, failure and data retention
//! - Tables, training history and export

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

use pffp_common::engine::SpeciesMatch;
use pffp_common::Language;
use pffp_dashboard::export::{CsvBundleSink, ExportSink};
use pffp_dashboard::source::{DataSource, FeedData, FeedPayload, FetchError};
use pffp_dashboard::store::Dashboard;
use pffp_dashboard::{build_router, AppState};

const FEED: &str = r#"{
    "combinedData": [
        {"Farmer_ID": "SL001", "Full_Name": "Y Bhim", "Full_Name_EN": "Bhim Y", "Status": "Act",
         "Village_ID": "VIL01", "Village_Name": "Buôn Ja", "Village_Name_EN": "Ja Village",
         "Ethnicity": "Ede", "Plot_Id": "P1", "Area (ha)": "1.5",
         "TrainingHistory": [
            {"Training_Year": 2022, "Training_Topic": "Pruning", "Who organize": "SLOW"},
            {"Training_Year": "2023", "Training_Topic": "Composting"}
         ]},
        {"Farmer_ID": "SL001", "Status": "Act", "Village_ID": "VIL01", "Village_Name": "Buôn Ja",
         "Record_Id": "R1", "Year": 2023, "Number_Shade_Trees_Planted": 30,
         "Shade_Trees_Species_Names": "Acacia, Grevillea, Cassia",
         "Farm registered for support from": "SLOW", "Activity": "Done"},
        {"Farmer_ID": "SL002", "Full_Name": "H Lan", "Status": "Act", "Village_ID": "VIL02",
         "Village_Name": "Buôn Kô", "Ethnicity": "Kinh", "Plot_Id": "P2", "Area (ha)": 2.25,
         "Record_Id": "R2", "Year": "2024", "Number_Shade_Trees_Planted": "12",
         "Shade_Trees_Species_Names": "Acacia", "Farm registered for support from": "SLOW"},
        {"Farmer_ID": "WF010", "Full_Name": "A Dam", "Status": "Inact", "Village_ID": "VIL03",
         "Village_Name": "Làng Mới", "Plot_Id": "P3", "Area (ha)": 4,
         "Record_Id": "R3", "Year": 2024, "Number_Shade_Trees_Planted": 50,
         "Shade_Trees_Species_Names": "Macadamia", "Farm registered for support from": "WWF"}
    ],
    "speciesList": [
        {"Species_ID": "S1", "Species_name": "Acacia", "Species type": "Shade"},
        {"Species_ID": "S2", "Species_name": "Macadamia", "Species type": "Fruit"}
    ],
    "adminData": [
        {"Adm_ID": "COM01", "Label VN": "Xã Ea", "Label EN": "Ea Commune"},
        {"Adm_ID": "VIL01", "Label VN": "Buôn Ja", "Label EN": "Ja Village"},
        {"Adm_ID": "VIL02", "Label VN": "Buôn Kô", "Label EN": "Ko Village"}
    ]
}"#;

/// Serves the fixed feed, or fails while `failing` is set
struct MemorySource {
    failing: AtomicBool,
}

impl MemorySource {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            failing: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch(&self) -> Result<FeedData, FetchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Status(500, "Internal Server Error".to_string()));
        }
        FeedPayload::parse(FEED)?.into_feed()
    }
}

/// Test helper: loaded dashboard plus a handle on its source
async fn setup_state(export_sink: Option<Arc<dyn ExportSink>>) -> (AppState, Arc<MemorySource>) {
    let source = MemorySource::new();
    let dashboard = Arc::new(Dashboard::new(source.clone(), Language::Vi, SpeciesMatch::Token));
    dashboard.refresh().await.expect("Initial load should succeed");
    (AppState::new(dashboard, export_sink), source)
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: send one request through a fresh router
async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

// =============================================================================
// Health and build info
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (state, _) = setup_state(None).await;
    let (status, body) = send(&state, test_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "pffp-dashboard");
    assert_eq!(body["loading"], false);
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let (state, _) = setup_state(None).await;
    let (status, body) = send(&state, test_request("GET", "/api/buildinfo")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["version"].is_string());
    assert!(body["git_hash"].is_string());
}

// =============================================================================
// Dashboard reads
// =============================================================================

#[tokio::test]
async fn test_dashboard_unfiltered() {
    let (state, _) = setup_state(None).await;
    let (status, body) = send(&state, test_request("GET", "/api/dashboard")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "vi");
    assert_eq!(body["total_records"], 4);
    assert_eq!(body["filtered_records"], 4);
    assert!(body["last_error"].is_null());

    let kpis = &body["kpis"];
    assert_eq!(kpis["totalFarmers"], 2);
    assert_eq!(kpis["totalPlots"], 2);
    assert_eq!(kpis["totalArea"], "3.75");
    assert_eq!(kpis["totalPlantedTrees"], 42);
    assert_eq!(kpis["totalSpecies"], 3);
    assert_eq!(kpis["totalVillages"], 3);
    assert_eq!(kpis["totalSoilTests"], 1);

    let options = &body["filter_options"];
    assert_eq!(options["Year"], json!([
        {"value": "2024", "label": "2024"},
        {"value": "2023", "label": "2023"}
    ]));
    assert_eq!(options["Village_ID"][0], json!({"value": "VIL01", "label": "Buôn Ja"}));
    assert_eq!(options["support"], json!([
        {"value": "SLOW", "label": "SLOW"},
        {"value": "WWF", "label": "WWF"}
    ]));
}

#[tokio::test]
async fn test_charts_follow_language() {
    let (state, _) = setup_state(None).await;

    let (_, charts) = send(&state, test_request("GET", "/api/charts")).await;
    assert_eq!(charts["areaByVillage"][0], json!({"name": "Buôn Ja", "value": 1.5}));

    send(&state, test_request("POST", "/api/language/toggle")).await;
    let (_, charts) = send(&state, test_request("GET", "/api/charts")).await;
    assert_eq!(charts["areaByVillage"][0], json!({"name": "Ja Village", "value": 1.5}));

    let acacia = charts["treesBySpecies"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "Acacia")
        .unwrap()
        .clone();
    assert_eq!(acacia["value"], 22.0);
}

// =============================================================================
// Filters
// =============================================================================

#[tokio::test]
async fn test_set_filter_narrows_view_but_not_options() {
    let (state, _) = setup_state(None).await;

    let (status, filters) = send(
        &state,
        json_request("PUT", "/api/filters/project", json!({"value": "WWF"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filters["project"], "WWF");

    let (_, body) = send(&state, test_request("GET", "/api/dashboard")).await;
    assert_eq!(body["filtered_records"], 1);
    assert_eq!(body["kpis"]["totalVillages"], 1);
    // Active-scoped KPIs ignore the filters
    assert_eq!(body["kpis"]["totalFarmers"], 2);
    assert_eq!(body["filter_options"]["Farmer_ID"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_empty_value_clears_filter() {
    let (state, _) = setup_state(None).await;

    send(&state, json_request("PUT", "/api/filters/Year", json!({"value": "2024"}))).await;
    let (_, filters) = send(&state, test_request("GET", "/api/filters")).await;
    assert_eq!(filters["Year"], "2024");

    send(&state, json_request("PUT", "/api/filters/Year", json!({"value": ""}))).await;
    let (_, filters) = send(&state, test_request("GET", "/api/filters")).await;
    assert!(filters["Year"].is_null());
}

#[tokio::test]
async fn test_reset_filters() {
    let (state, _) = setup_state(None).await;

    send(&state, json_request("PUT", "/api/filters/species", json!({"value": "Acacia"}))).await;
    send(&state, json_request("PUT", "/api/filters/Farmer_ID", json!({"value": "SL002"}))).await;

    let (status, filters) = send(&state, test_request("POST", "/api/filters/reset")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(filters["species"].is_null());
    assert!(filters["Farmer_ID"].is_null());

    let (_, body) = send(&state, test_request("GET", "/api/dashboard")).await;
    assert_eq!(body["filtered_records"], 4);
}

#[tokio::test]
async fn test_invalid_filter_requests() {
    let (state, _) = setup_state(None).await;

    let (status, body) = send(
        &state,
        json_request("PUT", "/api/filters/colour", json!({"value": "red"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(
        &state,
        json_request("PUT", "/api/filters/project", json!({"value": "UNDP"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, filters) = send(&state, test_request("GET", "/api/filters")).await;
    assert!(filters["project"].is_null());
}

// =============================================================================
// Language
// =============================================================================

#[tokio::test]
async fn test_language_endpoints() {
    let (state, _) = setup_state(None).await;

    let (_, body) = send(&state, test_request("GET", "/api/language")).await;
    assert_eq!(body["language"], "vi");

    let (_, body) = send(&state, test_request("POST", "/api/language/toggle")).await;
    assert_eq!(body["language"], "en");

    let (status, body) = send(
        &state,
        json_request("PUT", "/api/language", json!({"language": "vi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "vi");
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_resets_filters() {
    let (state, _) = setup_state(None).await;
    send(&state, json_request("PUT", "/api/filters/Year", json!({"value": "2023"}))).await;

    let (status, body) = send(&state, test_request("POST", "/api/refresh")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], 4);
    assert_eq!(body["species"], 2);
    assert_eq!(body["admin_units"], 3);

    let (_, filters) = send(&state, test_request("GET", "/api/filters")).await;
    assert!(filters["Year"].is_null());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_data() {
    let (state, source) = setup_state(None).await;
    source.failing.store(true, Ordering::SeqCst);

    let (status, body) = send(&state, test_request("POST", "/api/refresh")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "FETCH_FAILED");

    let (_, body) = send(&state, test_request("GET", "/api/dashboard")).await;
    assert_eq!(body["total_records"], 4);
    assert!(body["last_error"]
        .as_str()
        .unwrap()
        .starts_with("Could not load data"));
    assert_eq!(body["loading"], false);
}

// =============================================================================
// Tables and training
// =============================================================================

#[tokio::test]
async fn test_farmers_table() {
    let (state, _) = setup_state(None).await;
    let (status, body) = send(&state, test_request("GET", "/api/tables/farmers")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table_name"], "farmers");
    assert_eq!(body["total_rows"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 100);
    assert_eq!(body["total_pages"], 1);
    assert_eq!(body["columns"][0], "Farmer_ID");
    assert_eq!(body["rows"][0][1], "Y Bhim");
}

#[tokio::test]
async fn test_table_page_is_clamped() {
    let (state, _) = setup_state(None).await;
    let (status, body) = send(&state, test_request("GET", "/api/tables/plots?page=9")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["rows"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_table() {
    let (state, _) = setup_state(None).await;
    let (status, body) = send(&state, test_request("GET", "/api/tables/passages")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_training_history() {
    let (state, _) = setup_state(None).await;
    send(&state, test_request("POST", "/api/language/toggle")).await;

    let (status, body) = send(&state, test_request("GET", "/api/farmers/SL001/training")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["farmer_id"], "SL001");
    assert_eq!(body["full_name"], "Bhim Y");
    assert_eq!(body["training"][0]["Training_Topic"], "Pruning");
    assert_eq!(body["training"][1]["Training_Year"], "2023");

    let (status, body) = send(&state, test_request("GET", "/api/farmers/SL002/training")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["training"], json!([]));
}

#[tokio::test]
async fn test_training_unknown_or_filtered_out_farmer() {
    let (state, _) = setup_state(None).await;

    let (status, _) = send(&state, test_request("GET", "/api/farmers/XX999/training")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&state, json_request("PUT", "/api/filters/project", json!({"value": "WWF"}))).await;
    let (status, _) = send(&state, test_request("GET", "/api/farmers/SL001/training")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Export
// =============================================================================

#[tokio::test]
async fn test_export_unavailable_without_sink() {
    let (state, _) = setup_state(None).await;
    let (status, body) = send(&state, test_request("POST", "/api/export")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "UNAVAILABLE");
}

#[tokio::test]
async fn test_export_writes_filtered_report() {
    let temp_dir = TempDir::new().unwrap();
    let sink: Arc<dyn ExportSink> = Arc::new(CsvBundleSink::new(temp_dir.path()));
    let (state, _) = setup_state(Some(sink)).await;

    send(&state, json_request("PUT", "/api/filters/Farmer_ID", json!({"value": "SL002"}))).await;
    let (status, body) = send(&state, test_request("POST", "/api/export")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_name"], "PFFP_Dashboard_Report.xlsx");
    assert_eq!(body["sheets"], 4);

    let report_dir = temp_dir.path().join("PFFP_Dashboard_Report");
    let farmers = std::fs::read_to_string(report_dir.join("Farmers.csv")).unwrap();
    assert_eq!(farmers.lines().count(), 2);
    assert!(farmers.contains("SL002"));

    let species = std::fs::read_to_string(report_dir.join("Species.csv")).unwrap();
    assert_eq!(species.lines().count(), 3);
}
