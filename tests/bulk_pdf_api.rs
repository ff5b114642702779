//! HTTP tests for the bulk inspection export endpoints

mod common;

use std::io::Cursor;

use axum::http::StatusCode;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};

use common::{bearer, day, page_count, spawn_app, EMPLOYEE_TOKEN, EXPIRED_TOKEN, MANAGER_TOKEN};
use fleet_reports_server::export::InspectionStatus;

const PATH: &str = "/api/reports/inspections/bulk-pdf";

fn lines(body: &str) -> Vec<Value> {
    body.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let app = spawn_app(80).await;

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_small_export_is_single_pdf() {
    let app = spawn_app(80).await;
    app.add_inspections(5, &[]).await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "2024-01-01")
        .add_query_param("dateTo", "2024-01-31")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "application/pdf");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"All_Inspections_2024-01-01_to_2024-01-31.pdf\""
    );
    assert_eq!(page_count(response.as_bytes()), 5);
}

#[tokio::test]
async fn test_large_export_is_zip_of_parts() {
    let app = spawn_app(80).await;
    app.add_inspections(165, &[]).await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "2024-01-01")
        .add_query_param("dateTo", "2024-12-31")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.header("content-type"), "application/zip");

    let mut archive = zip::ZipArchive::new(Cursor::new(response.as_bytes().to_vec())).unwrap();
    assert_eq!(archive.len(), 3);

    let expected = [("Part1", 80), ("Part2", 80), ("Part3", 5)];
    for (index, (part, pages)) in expected.iter().enumerate() {
        let mut entry = archive.by_index(index).unwrap();
        assert_eq!(
            entry.name(),
            format!("All_Inspections_2024-01-01_to_2024-12-31_{}.pdf", part)
        );
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut bytes).unwrap();
        assert_eq!(page_count(&bytes), *pages);
    }
}

#[tokio::test]
async fn test_stream_skips_record_without_items() {
    let app = spawn_app(80).await;
    app.add_inspections(10, &[4]).await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .post(PATH)
        .add_header(name, value)
        .json(&json!({ "dateFrom": "2024-01-01", "dateTo": "2024-01-31" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.header("content-type").to_str().unwrap().starts_with("text/plain"));
    assert_eq!(response.header("cache-control"), "no-cache");

    let events = lines(&response.text());
    assert_eq!(events[0], json!({ "type": "init", "total": 10, "needsZip": false, "numParts": 1 }));

    let progress: Vec<&Value> = events.iter().filter(|e| e["type"] == "progress").collect();
    assert_eq!(progress.len(), 10);
    for (index, event) in progress.iter().enumerate() {
        assert_eq!(event["current"], index + 1);
        assert_eq!(event["total"], 10);
    }

    let terminal = events.last().unwrap();
    assert_eq!(terminal["type"], "complete");
    assert_eq!(terminal["contentType"], "application/pdf");
    assert_eq!(terminal["fileName"], "All_Inspections_2024-01-01_to_2024-01-31.pdf");
    let pdf = BASE64.decode(terminal["data"].as_str().unwrap()).unwrap();
    assert_eq!(page_count(&pdf), 9);
}

#[tokio::test]
async fn test_stream_multi_part_announces_zip() {
    let app = spawn_app(4).await;
    app.add_inspections(9, &[]).await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .post(PATH)
        .add_header(name, value)
        .json(&json!({ "dateFrom": "2024-01-01", "dateTo": "2024-01-31" }))
        .await;

    let events = lines(&response.text());
    assert_eq!(events[0]["needsZip"], true);
    assert_eq!(events[0]["numParts"], 3);
    assert_eq!(events.iter().filter(|e| e["type"] == "complete").count(), 1);

    let parts: Vec<u64> = events
        .iter()
        .filter(|e| e["type"] == "progress")
        .map(|e| e["currentPart"].as_u64().unwrap())
        .collect();
    assert_eq!(parts, vec![1, 1, 1, 1, 2, 2, 2, 2, 3]);

    let terminal = events.last().unwrap();
    assert_eq!(terminal["contentType"], "application/zip");
    let bytes = BASE64.decode(terminal["data"].as_str().unwrap()).unwrap();
    assert_eq!(zip::ZipArchive::new(Cursor::new(bytes)).unwrap().len(), 3);
}

#[tokio::test]
async fn test_missing_date_from_never_queries() {
    let app = spawn_app(80).await;
    app.add_inspections(3, &[]).await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateTo", "2024-01-31")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Missing required parameter: dateFrom");
    assert_eq!(app.source.range_calls(), 0);
}

#[tokio::test]
async fn test_stream_missing_params_is_plain_error() {
    let app = spawn_app(80).await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .post(PATH)
        .add_header(name, value)
        .json(&json!({ "dateFrom": "2024-01-01" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Missing required parameter: dateTo");
    assert_eq!(app.source.range_calls(), 0);
}

#[tokio::test]
async fn test_employee_is_forbidden() {
    let app = spawn_app(80).await;
    app.add_inspections(3, &[]).await;

    let (name, value) = bearer(EMPLOYEE_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "not-a-date")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(app.source.range_calls(), 0);
}

#[tokio::test]
async fn test_unauthenticated_requests() {
    let app = spawn_app(80).await;

    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "2024-01-01")
        .add_query_param("dateTo", "2024-01-31")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let (name, value) = bearer("no-such-token");
    let response = app.server.get(PATH).add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let (name, value) = bearer(EXPIRED_TOKEN);
    let response = app.server.get(PATH).add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_range_is_not_found() {
    let app = spawn_app(80).await;
    app.add_inspections(3, &[]).await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "2023-01-01")
        .add_query_param("dateTo", "2023-12-31")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert!(body["error"].as_str().unwrap().starts_with("No inspections found"));
    assert_eq!(app.source.range_calls(), 1);
}

#[tokio::test]
async fn test_drafts_are_not_exported() {
    let app = spawn_app(80).await;
    app.add_van_inspection(day(0), InspectionStatus::Draft).await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "2024-01-01")
        .add_query_param("dateTo", "2024-01-31")
        .add_header(name, value)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    app.add_van_inspection(day(7), InspectionStatus::Approved).await;
    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "2024-01-01")
        .add_query_param("dateTo", "2024-01-31")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    // 30 van rows fit on one page
    assert_eq!(page_count(response.as_bytes()), 1);
}

#[tokio::test]
async fn test_repeated_export_is_identical() {
    let app = spawn_app(3).await;
    app.add_inspections(7, &[2]).await;

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let (name, value) = bearer(MANAGER_TOKEN);
        let response = app
            .server
            .get(PATH)
            .add_query_param("dateFrom", "2024-01-01")
            .add_query_param("dateTo", "2024-01-31")
            .add_header(name, value)
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        bodies.push(response.as_bytes().to_vec());
    }

    assert_eq!(bodies[0], bodies[1]);
}

#[tokio::test]
async fn test_unknown_status_is_still_exported() {
    let app = spawn_app(80).await;
    app.add_inspections(3, &[]).await;
    app.set_inspection_column(day(1), "status", "in_progress").await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "2024-01-01")
        .add_query_param("dateTo", "2024-01-31")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(page_count(response.as_bytes()), 3);
}

#[tokio::test]
async fn test_last_day_with_fractional_seconds_included() {
    let app = spawn_app(80).await;
    app.add_inspections(5, &[]).await;
    app.set_inspection_column(day(4), "inspection_date", "2024-01-05T23:59:59.5Z").await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "2024-01-01")
        .add_query_param("dateTo", "2024-01-05")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(page_count(response.as_bytes()), 5);
}

#[tokio::test]
async fn test_fetch_failure_is_server_error() {
    let app = spawn_app(80).await;
    app.add_inspections(3, &[]).await;
    app.source.fail_range_queries();

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .get(PATH)
        .add_query_param("dateFrom", "2024-01-01")
        .add_query_param("dateTo", "2024-01-31")
        .add_header(name, value)
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Failed to fetch inspections");
    assert_eq!(body["details"], "database is unavailable");

    // Selection runs before the stream opens, so the streaming variant answers the same way
    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .post(PATH)
        .add_header(name, value)
        .json(&json!({ "dateFrom": "2024-01-01", "dateTo": "2024-01-31" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"], "Failed to fetch inspections");
}

#[tokio::test]
async fn test_stream_failure_after_open_ends_with_error_line() {
    let app = spawn_app(80).await;
    app.add_inspections(2, &[1, 2]).await;

    let (name, value) = bearer(MANAGER_TOKEN);
    let response = app
        .server
        .post(PATH)
        .add_header(name, value)
        .json(&json!({ "dateFrom": "2024-01-01", "dateTo": "2024-01-31" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let events = lines(&response.text());
    assert_eq!(events[0]["type"], "init");
    assert_eq!(events.iter().filter(|e| e["type"] == "progress").count(), 2);
    assert_eq!(events.iter().filter(|e| e["type"] == "complete").count(), 0);

    let terminal = events.last().unwrap();
    assert_eq!(terminal["type"], "error");
    assert!(terminal["error"].as_str().unwrap().contains("could be rendered"));
}
