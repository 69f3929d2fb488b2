//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `PurpleAirClient`
//! over real HTTP with the default ureq transport. Covers key checks, every
//! read and write endpoint, local polling and failure mapping.

use std::net::SocketAddr;
use std::time::Duration;

use purpleair_core::{
    ApiError, ApiKeyType, ClientConfig, CreateMemberParams, HistoryFormat, HistoryQuery, MemberHistoryQuery,
    MembersQuery, PurpleAirClient, SensorFilter, SensorsQuery, Timestamp,
};

const READ_KEY: &str = "read-integration";
const WRITE_KEY: &str = "write-integration";

fn start_server() -> SocketAddr {
    serve(mock_server::app())
}

fn serve(router: axum::Router) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, router).await
        })
        .unwrap();
    });

    addr
}

fn config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::new(&format!("http://{addr}/v1"), Duration::from_secs(5))
}

#[test]
fn read_endpoints() {
    let addr = start_server();
    let client = PurpleAirClient::builder()
        .config(config(addr))
        .read_key(READ_KEY)
        .build()
        .unwrap();
    assert_eq!(client.api_key_types()[READ_KEY], ApiKeyType::Read);
    assert_eq!(client.api_versions()[READ_KEY], mock_server::API_VERSION);
    let read = client.read().unwrap();

    let sensor = read.request_sensor_data(42, None, Some("name,humidity")).unwrap();
    assert_eq!(sensor["sensor"]["sensor_index"], 42);
    assert_eq!(sensor["sensor"]["humidity"], 41);

    // Sanitizing fills every documented field the response left out.
    let sanitized = read.request_sanitized_sensor_data(42, None, Some("name")).unwrap();
    assert_eq!(sanitized["sensor"]["name"], "Mock sensor 42");
    assert!(sanitized["sensor"].get("pm2.5_atm").is_some());
    assert!(sanitized["sensor"].get("primary_id_a").is_some());

    let list = read
        .request_multiple_sensors_data(&SensorsQuery {
            fields: "name".to_string(),
            filter: SensorFilter {
                location_type: Some(0),
                show_only: Some("7,8".to_string()),
                max_age: Some(0),
                ..Default::default()
            },
        })
        .unwrap();
    assert_eq!(list["location_type"], 0);
    assert_eq!(list["data"].as_array().unwrap().len(), 2);

    let history = read
        .request_sensor_history(
            42,
            &HistoryQuery {
                fields: "humidity".to_string(),
                start_timestamp: Some(Timestamp::Unix(1000)),
                end_timestamp: Some(Timestamp::Unix(5000)),
                average: Some(60),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(history["start_timestamp"], 1000);
    assert_eq!(history["average"], 60);

    let csv = read
        .request_sensor_history(
            42,
            &HistoryQuery {
                fields: "humidity".to_string(),
                format: HistoryFormat::Csv,
                ..Default::default()
            },
        )
        .unwrap();
    assert!(csv.as_str().unwrap().starts_with("time_stamp,sensor_index,humidity"));

    let org = read.request_organization_data().unwrap();
    assert_eq!(org["organization_id"], "mock-org");

    let missing = read.request_sensor_data(0, None, None).unwrap_err();
    match missing {
        ApiError::Status { status, error, .. } => {
            assert_eq!(status, 404);
            assert_eq!(error.as_deref(), Some("NotFoundError"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[test]
fn group_and_member_lifecycle() {
    let addr = start_server();
    let client = PurpleAirClient::builder()
        .config(config(addr))
        .read_key(READ_KEY)
        .write_key(WRITE_KEY)
        .build()
        .unwrap();
    let (read, write) = (client.read().unwrap(), client.write().unwrap());

    let created = write.post_create_group_data("Integration").unwrap();
    let group_id = created["group_id"].as_u64().unwrap();

    let groups = read.request_group_list_data().unwrap();
    assert_eq!(groups["groups"][0]["name"], "Integration");

    let member = write
        .post_create_member(
            group_id,
            &CreateMemberParams {
                sensor_index: Some(77),
                ..Default::default()
            },
        )
        .unwrap();
    let member_id = member["member_id"].as_u64().unwrap();

    let private = write
        .post_create_member(
            group_id,
            &CreateMemberParams {
                sensor_id: Some("84:f3:eb:7b:c8:ee".to_string()),
                owner_email: Some("owner@example.com".to_string()),
                location_type: Some(0),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(private["member_id"].as_u64().is_some());

    let detail = read.request_group_detail_data(group_id).unwrap();
    assert_eq!(detail["members"].as_array().unwrap().len(), 2);

    let data = read.request_member_data(group_id, member_id, Some("name")).unwrap();
    assert_eq!(data["sensor"]["sensor_index"], 77);

    let history = read
        .request_member_history(
            group_id,
            member_id,
            &MemberHistoryQuery {
                fields: "humidity".to_string(),
                average: Some(30),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(history["sensor_index"], 77);
    assert_eq!(history["average"], 30);

    let members = read
        .request_members_data(
            group_id,
            &MembersQuery {
                fields: "humidity".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(members["data"][0][0], member_id);

    write.post_delete_member(group_id, member_id).unwrap();
    let gone = read.request_member_data(group_id, member_id, None).unwrap_err();
    assert!(matches!(gone, ApiError::Status { status: 404, .. }));

    write.post_delete_group(group_id).unwrap();
    let gone = read.request_group_detail_data(group_id).unwrap_err();
    assert!(matches!(gone, ApiError::Status { status: 404, .. }));
}

#[test]
fn invalid_member_mode_sends_nothing() {
    let addr = start_server();
    let client = PurpleAirClient::builder()
        .config(config(addr))
        .write_key(WRITE_KEY)
        .build()
        .unwrap();
    let err = client
        .write()
        .unwrap()
        .post_create_member(1, &CreateMemberParams::default())
        .unwrap_err();
    assert!(matches!(err, ApiError::Config(_)));
}

#[test]
fn rejected_and_mismatched_keys() {
    let addr = start_server();

    let err = PurpleAirClient::builder()
        .config(config(addr))
        .read_key("bogus")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::Status { status: 403, .. }));
    assert!(err.to_string().starts_with("403: ApiKeyInvalidError - "));

    let err = PurpleAirClient::builder()
        .config(config(addr))
        .read_key(WRITE_KEY)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::Config(_)));
}

#[test]
fn local_sensor_polling() {
    let addr = start_server();
    let host = format!("127.0.0.1:{}", addr.port());
    let client = PurpleAirClient::builder()
        .config(config(addr))
        .ipv4_addresses([host.clone()])
        .build()
        .unwrap();

    let data = client.local().unwrap().request_local_sensor_data().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[&host]["Geo"], "PurpleAir-c8ee");
    assert!(client.read().is_err());
}

#[test]
fn unreachable_host_is_a_transport_error() {
    // Bind then drop a listener so the port is very likely closed.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = PurpleAirClient::builder()
        .ipv4_addresses([format!("127.0.0.1:{port}")])
        .build()
        .unwrap();

    let err = client.local().unwrap().request_local_sensor_data().unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[test]
fn bodies_larger_than_ten_megabytes_are_read() {
    let blob = "x".repeat(12 * 1024 * 1024);
    let router = axum::Router::new().route(
        "/json",
        axum::routing::get(move || {
            let blob = blob.clone();
            async move { axum::Json(serde_json::json!({ "blob": blob })) }
        }),
    );
    let addr = serve(router);
    let host = format!("127.0.0.1:{}", addr.port());
    let client = PurpleAirClient::builder()
        .ipv4_addresses([host.clone()])
        .build()
        .unwrap();

    let data = client.local().unwrap().request_local_sensor_data().unwrap();
    assert_eq!(data[&host]["blob"].as_str().unwrap().len(), 12 * 1024 * 1024);
}
