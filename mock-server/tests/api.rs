use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, API_VERSION, KNOWN_SENSORS};
use serde_json::Value;
use tower::ServiceExt;

const READ_KEY: &str = "read-0123";
const WRITE_KEY: &str = "write-4567";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str, key: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().uri(uri);
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, key: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", key)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

async fn create_group(app: &Router, name: &str) -> u64 {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/groups",
            WRITE_KEY,
            &format!(r#"{{"name":"{name}"}}"#),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["group_id"].as_u64().unwrap()
}

// --- keys ---

#[tokio::test]
async fn keys_report_type_by_prefix() {
    let app = app();
    for (key, expected) in [(READ_KEY, "READ"), (WRITE_KEY, "WRITE")] {
        let resp = app.clone().oneshot(get("/v1/keys", Some(key))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["api_key_type"], expected);
        assert_eq!(body["api_version"], API_VERSION);
    }
}

#[tokio::test]
async fn unknown_key_returns_403_with_details() {
    let resp = app().oneshot(get("/v1/keys", Some("bogus"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "ApiKeyInvalidError");
    assert!(body["description"].as_str().is_some());
}

#[tokio::test]
async fn missing_key_returns_403() {
    let resp = app().oneshot(get("/v1/sensors/1", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["error"], "ApiKeyMissingError");
}

// --- sensors ---

#[tokio::test]
async fn sensor_fields_are_selected() {
    let resp = app()
        .oneshot(get("/v1/sensors/42?fields=name,humidity", Some(READ_KEY)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let sensor = body_json(resp).await["sensor"].clone();
    assert_eq!(sensor["sensor_index"], 42);
    assert_eq!(sensor["humidity"], 41);
    assert!(sensor.get("pm2.5").is_none());
}

#[tokio::test]
async fn missing_sensor_returns_404() {
    let resp = app().oneshot(get("/v1/sensors/0", Some(READ_KEY))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "NotFoundError");
}

#[tokio::test]
async fn write_key_cannot_read() {
    let resp = app().oneshot(get("/v1/sensors/1", Some(WRITE_KEY))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["error"], "ApiKeyTypeMismatchError");
}

#[tokio::test]
async fn sensor_list_echoes_filters() {
    let resp = app()
        .oneshot(get(
            "/v1/sensors?fields=name&location_type=0&max_age=0&show_only=7,8",
            Some(READ_KEY),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["location_type"], 0);
    assert_eq!(body["max_age"], 0);
    assert_eq!(body["fields"], serde_json::json!(["sensor_index", "name"]));
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0][0], 7);
}

#[tokio::test]
async fn sensor_list_defaults_to_known_sensors() {
    let resp = app()
        .oneshot(get("/v1/sensors?fields=name", Some(READ_KEY)))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), KNOWN_SENSORS.len());
    assert_eq!(body["max_age"], 604800);
}

#[tokio::test]
async fn sensor_list_requires_fields() {
    let resp = app().oneshot(get("/v1/sensors", Some(READ_KEY))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sensor_history_json_and_csv() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(get(
            "/v1/sensors/5/history?fields=humidity&start_timestamp=1000&end_timestamp=5000&average=60",
            Some(READ_KEY),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["start_timestamp"], 1000);
    assert_eq!(body["average"], 60);
    assert_eq!(body["data"][1][0], 1000 + 60 * 60);

    let resp = app
        .oneshot(get("/v1/sensors/5/history/csv?fields=humidity", Some(READ_KEY)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let csv = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
    assert!(csv.starts_with("time_stamp,sensor_index,humidity\n"));
    assert_eq!(csv.lines().count(), 4);
}

// --- groups and members ---

#[tokio::test]
async fn group_lifecycle() {
    let app = app();
    let group_id = create_group(&app, "Backyard").await;

    let resp = app.clone().oneshot(get("/v1/groups/", Some(READ_KEY))).await.unwrap();
    let groups = body_json(resp).await["groups"].clone();
    assert_eq!(groups[0]["id"], group_id);
    assert_eq!(groups[0]["name"], "Backyard");

    let uri = format!("/v1/groups/{group_id}");
    let resp = app.clone().oneshot(get(&uri, Some(READ_KEY))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["members"], serde_json::json!([]));

    let resp = app
        .clone()
        .oneshot(json_request("DELETE", &uri, WRITE_KEY, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_bytes(resp).await.is_empty());

    let resp = app.oneshot(get(&uri, Some(READ_KEY))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn read_key_cannot_create_groups() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/groups", READ_KEY, r#"{"name":"x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn member_lifecycle() {
    let app = app();
    let group_id = create_group(&app, "Members").await;
    let members_uri = format!("/v1/groups/{group_id}/members");

    let resp = app
        .clone()
        .oneshot(json_request("POST", &members_uri, WRITE_KEY, r#"{"sensor_index":77}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let member_id = body_json(resp).await["member_id"].as_u64().unwrap();

    let member_uri = format!("{members_uri}/{member_id}");
    let resp = app
        .clone()
        .oneshot(get(&format!("{member_uri}?fields=name"), Some(READ_KEY)))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["sensor"]["sensor_index"], 77);
    assert_eq!(body["sensor"]["name"], "Mock sensor 77");

    let resp = app
        .clone()
        .oneshot(get(&format!("{member_uri}/history/?fields=humidity"), Some(READ_KEY)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["sensor_index"], 77);

    let resp = app
        .clone()
        .oneshot(get(&format!("{members_uri}?fields=humidity"), Some(READ_KEY)))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"][0][0], member_id);
    assert_eq!(body["data"][0][1], 77);

    let resp = app
        .clone()
        .oneshot(json_request("DELETE", &member_uri, WRITE_KEY, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get(&member_uri, Some(READ_KEY))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn member_without_sensor_returns_400() {
    let app = app();
    let group_id = create_group(&app, "Bad").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/v1/groups/{group_id}/members"),
            WRITE_KEY,
            r#"{"owner_email":"owner@example.com"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "InvalidParameterError");
}

#[tokio::test]
async fn member_of_missing_group_returns_404() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/groups/99/members", WRITE_KEY, r#"{"sensor_index":1}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- organization and local ---

#[tokio::test]
async fn organization_accepts_any_valid_key() {
    let resp = app().oneshot(get("/v1/organization", Some(WRITE_KEY))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["organization_id"], "mock-org");
}

#[tokio::test]
async fn local_json_needs_no_key() {
    let resp = app().oneshot(get("/json", None)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["Geo"], "PurpleAir-c8ee");
}
