//! HTTP API tests: requests through the router, no socket.

#[path = "../common/mod.rs"]
mod common;

use std::io::Read;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use flate2::read::GzDecoder;
use serde_json::Value;
use tower::ServiceExt;

use dataquery::web::router;

struct TestResponse {
    status: StatusCode,
    headers: axum::http::HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn header(&self, name: header::HeaderName) -> &str {
        self.headers.get(name).unwrap().to_str().unwrap()
    }
}

async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    TestResponse {
        status,
        headers,
        body,
    }
}

async fn get(app: Router, uri: &str) -> TestResponse {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: Router, uri: &str, body: &str) -> TestResponse {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

fn url(path: &str) -> String {
    format!("/v1/data-sets/{}{}", common::DATA_SET_ID, path)
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_get_query() {
    let fixture = common::Fixture::new();
    let app = router(fixture.service());
    let response = get(
        app,
        &url("/query?timePeriods.eq=2020%2F2021%7CAY&geographicLevels.in=REG,LA&indicators=enrolments&pageSize=4"),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["paging"]["totalResults"], 6);
    assert_eq!(json["paging"]["totalPages"], 2);
    assert_eq!(json["results"].as_array().unwrap().len(), 4);
    assert_eq!(json["results"][0]["geographicLevel"], "REG");
    assert_eq!(json["results"][0]["values"]["enrolments"], "400");
    assert!(json["results"][0]["values"].get("sess_auth").is_none());

    assert_eq!(json["warnings"][0]["code"], "GeographicLevelsNotFound");
    assert_eq!(json["warnings"][0]["path"], "geographicLevels.in");
    assert_eq!(json["warnings"][0]["detail"]["items"][0], "LA");
}

#[tokio::test]
async fn test_post_query() {
    let fixture = common::Fixture::new();
    let app = router(fixture.service());
    let response = post_json(
        app,
        &url("/query?page=1&pageSize=2&dataSetVersion=1.*"),
        r#"{
            "criteria": {"or": [
                {"locations": {"eq": "REG|id|loc-yorks"}},
                {"filters": {"in": ["fo-gone"]}}
            ]},
            "sorts": [{"field": "indicator|enrolments", "direction": "Desc"}]
        }"#,
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["paging"]["totalResults"], 9);
    assert_eq!(json["results"][0]["values"]["enrolments"], "2400");
    assert_eq!(json["results"][0]["locations"]["REG"], "loc-yorks");
    assert_eq!(json["warnings"][0]["path"], "criteria.or[1].filters.in");
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = common::Fixture::new();
    let app = router(fixture.service());
    let response = get(
        app,
        &url("/query?sorts=filter%7Cmissing%7CAsc&locations.eq=REG%7Cpostcode%7CS1&page=0"),
    )
    .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let json = response.json();
    assert_eq!(json["code"], "VALIDATION_FAILED");
    let paths: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["page", "locations.eq", "sorts[0]"]);
}

#[tokio::test]
async fn test_bad_requests() {
    let fixture = common::Fixture::new();

    let response = get(router(fixture.service()), &url("/query?colour=red")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["code"], "BAD_REQUEST");

    let response = get(router(fixture.service()), &url("/query?dataSetVersion=latest")).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["errors"][0]["path"], "dataSetVersion");
    assert_eq!(response.json()["errors"][0]["code"], "InvalidVersion");

    let response = post_json(router(fixture.service()), &url("/query"), "{\"criteria\": ").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_not_found() {
    let fixture = common::Fixture::new();

    let response = get(
        router(fixture.service()),
        "/v1/data-sets/00000000-0000-0000-0000-000000000001/query",
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["code"], "DATA_SET_NOT_FOUND");

    let response = get(router(fixture.service()), "/v1/data-sets/not-a-uuid/meta").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = get(router(fixture.service()), &url("/query?dataSetVersion=2.1")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["code"], "VERSION_NOT_FOUND");
}

// ============================================================================
// Metadata and versions
// ============================================================================

#[tokio::test]
async fn test_meta() {
    let fixture = common::Fixture::new();
    let response = get(router(fixture.service()), &url("/meta?dataSetVersion=1.0")).await;

    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["version"], "1.0");
    assert_eq!(json["filters"][0]["options"][0]["label"], "State-funded primary");
    assert_eq!(json["filters"][0]["options"][2]["isAggregate"], true);
    assert_eq!(json["geographicLevels"][1]["code"], "REG");
    assert_eq!(json["timePeriods"][0]["period"], "2019/2020");

    let text = String::from_utf8(response.body).unwrap().to_lowercase();
    assert!(!text.contains("surrogate"));
    assert!(!text.contains("\"column\""));
}

#[tokio::test]
async fn test_versions_and_changes() {
    let fixture = common::Fixture::new();

    let response = get(router(fixture.service()), &url("/versions?pageSize=2")).await;
    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["paging"]["totalResults"], 3);
    assert_eq!(json["results"][0]["version"], "2.0");
    assert_eq!(json["results"][1]["version"], "1.1");

    let response = get(router(fixture.service()), &url("/versions/1.1/changes")).await;
    assert_eq!(response.status, StatusCode::OK);
    let json = response.json();
    assert_eq!(json["previousVersion"], "1.0");
    assert_eq!(json["filterOptions"][1]["currentState"]["id"], "fo-y3");

    let response = get(router(fixture.service()), &url("/versions/2.1/changes")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// CSV
// ============================================================================

#[tokio::test]
async fn test_csv_download() {
    let fixture = common::Fixture::new();
    let response = get(router(fixture.service()), &url("/csv")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), "text/csv");
    assert_eq!(response.header(header::CONTENT_ENCODING), "gzip");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        format!("attachment; filename=\"{}_v2.0.csv\"", common::DATA_SET_ID)
    );

    let mut csv = String::new();
    GzDecoder::new(response.body.as_slice())
        .read_to_string(&mut csv)
        .unwrap();
    assert!(csv.starts_with("Time period,Time identifier,Geographic level,"));
    assert_eq!(csv.lines().count(), 28);
}
