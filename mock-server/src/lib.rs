//! In-memory imitation of the PurpleAir v1 API and of a sensor's local
//! `/json` endpoint.
//!
//! Keys starting with `read-` are READ keys and keys starting with `write-`
//! are WRITE keys; anything else is rejected. Groups and members live in
//! memory for the lifetime of the router.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const API_VERSION: &str = "V1.0.14-0.0.58";
pub const READ_KEY_PREFIX: &str = "read-";
pub const WRITE_KEY_PREFIX: &str = "write-";

/// Sensor indexes returned by `GET /v1/sensors` when `show_only` is absent.
pub const KNOWN_SENSORS: [u64; 3] = [1001, 1002, 1003];

/// Sensor index the API reports as missing.
pub const MISSING_SENSOR: u64 = 0;

#[derive(Clone, Debug, Serialize)]
pub struct Member {
    pub id: u64,
    pub sensor_index: u64,
    pub created: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub created: i64,
    #[serde(skip)]
    pub members: BTreeMap<u64, Member>,
}

#[derive(Debug, Default)]
pub struct Store {
    groups: BTreeMap<u64, Group>,
    next_group_id: u64,
    next_member_id: u64,
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyType {
    Read,
    Write,
}

/// Failure rendered the way the API does: status plus `error`/`description`.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    error: &'static str,
    description: String,
}

impl ApiFailure {
    fn new(status: StatusCode, error: &'static str, description: impl Into<String>) -> Self {
        Self {
            status,
            error,
            description: description.into(),
        }
    }

    fn not_found(description: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NotFoundError", description)
    }

    fn bad_request(error: &'static str, description: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, description)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = json!({
            "api_version": API_VERSION,
            "time_stamp": now(),
            "error": self.error,
            "description": self.description,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T = Json<Value>> = Result<T, ApiFailure>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/v1/keys", get(check_key))
        .route("/v1/organization", get(organization))
        .route("/v1/sensors", get(list_sensors))
        .route("/v1/sensors/{sensor_index}", get(get_sensor))
        .route("/v1/sensors/{sensor_index}/history", get(sensor_history))
        .route("/v1/sensors/{sensor_index}/history/csv", get(sensor_history_csv))
        .route("/v1/groups", post(create_group))
        .route("/v1/groups/", get(list_groups))
        .route("/v1/groups/{group_id}", get(get_group).delete(delete_group))
        .route("/v1/groups/{group_id}/members", get(list_members).post(create_member))
        .route(
            "/v1/groups/{group_id}/members/{member_id}",
            get(get_member).delete(delete_member),
        )
        .route(
            "/v1/groups/{group_id}/members/{member_id}/history/",
            get(member_history),
        )
        .route("/json", get(local_json))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

fn key_type(headers: &HeaderMap) -> ApiResult<KeyType> {
    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiFailure::new(
                StatusCode::FORBIDDEN,
                "ApiKeyMissingError",
                "An API key is required, send it in the X-API-Key header.",
            )
        })?;

    if key.starts_with(READ_KEY_PREFIX) {
        Ok(KeyType::Read)
    } else if key.starts_with(WRITE_KEY_PREFIX) {
        Ok(KeyType::Write)
    } else {
        Err(ApiFailure::new(
            StatusCode::FORBIDDEN,
            "ApiKeyInvalidError",
            "The provided api_key was not valid.",
        ))
    }
}

fn require(headers: &HeaderMap, expected: KeyType) -> ApiResult<()> {
    if key_type(headers)? == expected {
        Ok(())
    } else {
        Err(ApiFailure::new(
            StatusCode::FORBIDDEN,
            "ApiKeyTypeMismatchError",
            format!("Keys of type {expected:?} must be used for this request."),
        ))
    }
}

fn envelope(extra: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("api_version".to_string(), json!(API_VERSION));
    body.insert("time_stamp".to_string(), json!(now()));
    if let Value::Object(extra) = extra {
        body.extend(extra);
    }
    Json(Value::Object(body))
}

fn split_fields(params: &HashMap<String, String>) -> Option<Vec<String>> {
    params
        .get("fields")
        .map(|f| f.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

fn require_fields(params: &HashMap<String, String>) -> ApiResult<Vec<String>> {
    split_fields(params).ok_or_else(|| {
        ApiFailure::bad_request("ApiFieldsRequiredError", "The fields parameter is required.")
    })
}

fn sample_sensor(sensor_index: u64) -> Map<String, Value> {
    let sensor = json!({
        "sensor_index": sensor_index,
        "name": format!("Mock sensor {sensor_index}"),
        "model": "PA-II",
        "location_type": 0,
        "latitude": 37.75,
        "longitude": -122.44,
        "rssi": -62,
        "humidity": 41,
        "temperature": 68,
        "pressure": 1012.4,
        "pm2.5": 4.2,
        "pm2.5_atm": 4.1,
        "pm10.0": 6.8,
    });
    match sensor {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn select_fields(sensor: Map<String, Value>, fields: Option<&[String]>) -> Map<String, Value> {
    match fields {
        None => sensor,
        Some(fields) => sensor
            .into_iter()
            .filter(|(name, _)| name == "sensor_index" || fields.iter().any(|f| f == name))
            .collect(),
    }
}

async fn check_key(headers: HeaderMap) -> ApiResult {
    let api_key_type = match key_type(&headers)? {
        KeyType::Read => "READ",
        KeyType::Write => "WRITE",
    };
    Ok(envelope(json!({ "api_key_type": api_key_type })))
}

async fn organization(headers: HeaderMap) -> ApiResult {
    key_type(&headers)?;
    Ok(envelope(json!({
        "organization_id": "mock-org",
        "organization_name": "Mock Organization",
        "remaining_points": 1_000_000,
        "consumption_rate": 0,
    })))
}

async fn get_sensor(
    Path(sensor_index): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult {
    require(&headers, KeyType::Read)?;
    if sensor_index == MISSING_SENSOR {
        return Err(ApiFailure::not_found(
            "Cannot find a sensor with the provided parameters.",
        ));
    }
    let fields = split_fields(&params);
    let sensor = select_fields(sample_sensor(sensor_index), fields.as_deref());
    Ok(envelope(json!({
        "data_time_stamp": now(),
        "sensor": sensor,
    })))
}

async fn list_sensors(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult {
    require(&headers, KeyType::Read)?;
    let fields = require_fields(&params)?;

    let indexes: Vec<u64> = match params.get("show_only") {
        Some(list) => list.split(',').filter_map(|s| s.trim().parse().ok()).collect(),
        None => KNOWN_SENSORS.to_vec(),
    };

    let mut columns = vec!["sensor_index".to_string()];
    columns.extend(fields.iter().filter(|f| *f != "sensor_index").cloned());
    let data: Vec<Value> = indexes
        .iter()
        .map(|index| {
            let sensor = sample_sensor(*index);
            Value::Array(
                columns
                    .iter()
                    .map(|c| sensor.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            )
        })
        .collect();

    let max_age: u64 = params
        .get("max_age")
        .and_then(|v| v.parse().ok())
        .unwrap_or(604800);
    let mut body = json!({
        "data_time_stamp": now(),
        "max_age": max_age,
        "firmware_default_version": "7.02",
        "fields": columns,
        "data": data,
    });
    if let Some(location_type) = params.get("location_type").and_then(|v| v.parse::<u8>().ok()) {
        body["location_type"] = json!(location_type);
    }
    if let Some(modified_since) = params.get("modified_since").and_then(|v| v.parse::<i64>().ok()) {
        body["modified_since"] = json!(modified_since);
    }
    Ok(envelope(body))
}

fn history_window(params: &HashMap<String, String>) -> (i64, i64, u32) {
    let end = params
        .get("end_timestamp")
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(now);
    let start = params
        .get("start_timestamp")
        .and_then(|v| v.parse().ok())
        .unwrap_or(end - 86_400);
    let average = params
        .get("average")
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);
    (start, end, average)
}

fn history_rows(sensor_index: u64, fields: &[String], start: i64, average: u32) -> Vec<Vec<Value>> {
    let sensor = sample_sensor(sensor_index);
    (0..3)
        .map(|i| {
            let mut row = vec![json!(start + i64::from(average) * 60 * i)];
            row.extend(fields.iter().map(|f| sensor.get(f).cloned().unwrap_or(json!(0))));
            row
        })
        .collect()
}

async fn sensor_history(
    Path(sensor_index): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult {
    require(&headers, KeyType::Read)?;
    let fields = require_fields(&params)?;
    let (start, end, average) = history_window(&params);

    let mut columns = vec!["time_stamp".to_string()];
    columns.extend(fields.iter().cloned());
    Ok(envelope(json!({
        "sensor_index": sensor_index,
        "start_timestamp": start,
        "end_timestamp": end,
        "average": average,
        "fields": columns,
        "data": history_rows(sensor_index, &fields, start, average),
    })))
}

async fn sensor_history_csv(
    Path(sensor_index): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    require(&headers, KeyType::Read)?;
    let fields = require_fields(&params)?;
    let (start, _, average) = history_window(&params);

    let mut csv = format!("time_stamp,sensor_index,{}\n", fields.join(","));
    for row in history_rows(sensor_index, &fields, start, average) {
        let mut cells: Vec<String> = row.iter().map(Value::to_string).collect();
        cells.insert(1, sensor_index.to_string());
        csv.push_str(&cells.join(","));
        csv.push('\n');
    }
    Ok(([("content-type", "text/csv")], csv).into_response())
}

async fn list_groups(State(db): State<Db>, headers: HeaderMap) -> ApiResult {
    require(&headers, KeyType::Read)?;
    let store = db.read().await;
    let groups: Vec<&Group> = store.groups.values().collect();
    Ok(envelope(json!({ "groups": groups })))
}

async fn create_group(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require(&headers, KeyType::Write)?;
    let name = input
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiFailure::bad_request("GroupNameRequiredError", "A group name is required."))?
        .to_string();

    let mut store = db.write().await;
    store.next_group_id += 1;
    let id = store.next_group_id;
    store.groups.insert(
        id,
        Group {
            id,
            name,
            created: now(),
            members: BTreeMap::new(),
        },
    );
    tracing::info!(group_id = id, "group created");
    Ok((StatusCode::CREATED, envelope(json!({ "group_id": id }))))
}

async fn get_group(State(db): State<Db>, Path(group_id): Path<u64>, headers: HeaderMap) -> ApiResult {
    require(&headers, KeyType::Read)?;
    let store = db.read().await;
    let group = store
        .groups
        .get(&group_id)
        .ok_or_else(|| ApiFailure::not_found("Cannot find a group with the provided parameters."))?;
    let members: Vec<&Member> = group.members.values().collect();
    Ok(envelope(json!({
        "group_id": group.id,
        "name": group.name,
        "created": group.created,
        "members": members,
    })))
}

// Deletes answer 200 with an empty body; the client treats 204 as unknown.
async fn delete_group(
    State(db): State<Db>,
    Path(group_id): Path<u64>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    require(&headers, KeyType::Write)?;
    let mut store = db.write().await;
    store
        .groups
        .remove(&group_id)
        .map(|_| StatusCode::OK)
        .ok_or_else(|| ApiFailure::not_found("Cannot find a group with the provided parameters."))
}

async fn create_member(
    State(db): State<Db>,
    Path(group_id): Path<u64>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require(&headers, KeyType::Write)?;
    let sensor_index = input.get("sensor_index").and_then(Value::as_u64);
    let sensor_id = input.get("sensor_id").and_then(Value::as_str);
    let owner_email = input.get("owner_email").and_then(Value::as_str);
    if sensor_index.is_none() && sensor_id.is_none() {
        return Err(ApiFailure::bad_request(
            "InvalidParameterError",
            "Either sensor_index or sensor_id is required.",
        ));
    }
    if owner_email.is_some() && sensor_id.is_none() {
        return Err(ApiFailure::bad_request(
            "InvalidParameterError",
            "owner_email can only be used together with sensor_id.",
        ));
    }

    let mut store = db.write().await;
    store.next_member_id += 1;
    let member_id = store.next_member_id;
    let group = store
        .groups
        .get_mut(&group_id)
        .ok_or_else(|| ApiFailure::not_found("Cannot find a group with the provided parameters."))?;
    let member = Member {
        id: member_id,
        sensor_index: sensor_index.unwrap_or(100_000 + member_id),
        created: now(),
    };
    group.members.insert(member_id, member.clone());
    Ok((
        StatusCode::CREATED,
        envelope(json!({
            "group_id": group_id,
            "member_id": member.id,
            "sensor_index": member.sensor_index,
        })),
    ))
}

async fn find_member(db: &Db, group_id: u64, member_id: u64) -> ApiResult<Member> {
    let store = db.read().await;
    store
        .groups
        .get(&group_id)
        .and_then(|g| g.members.get(&member_id))
        .cloned()
        .ok_or_else(|| ApiFailure::not_found("Cannot find a member with the provided parameters."))
}

async fn get_member(
    State(db): State<Db>,
    Path((group_id, member_id)): Path<(u64, u64)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult {
    require(&headers, KeyType::Read)?;
    let member = find_member(&db, group_id, member_id).await?;
    let fields = split_fields(&params);
    let sensor = select_fields(sample_sensor(member.sensor_index), fields.as_deref());
    Ok(envelope(json!({
        "group_id": group_id,
        "member_id": member_id,
        "sensor": sensor,
    })))
}

async fn member_history(
    State(db): State<Db>,
    Path((group_id, member_id)): Path<(u64, u64)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult {
    require(&headers, KeyType::Read)?;
    let member = find_member(&db, group_id, member_id).await?;
    let fields = require_fields(&params)?;
    let (start, end, average) = history_window(&params);

    let mut columns = vec!["time_stamp".to_string()];
    columns.extend(fields.iter().cloned());
    Ok(envelope(json!({
        "group_id": group_id,
        "member_id": member_id,
        "sensor_index": member.sensor_index,
        "start_timestamp": start,
        "end_timestamp": end,
        "average": average,
        "fields": columns,
        "data": history_rows(member.sensor_index, &fields, start, average),
    })))
}

async fn list_members(
    State(db): State<Db>,
    Path(group_id): Path<u64>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> ApiResult {
    require(&headers, KeyType::Read)?;
    let fields = require_fields(&params)?;
    let store = db.read().await;
    let group = store
        .groups
        .get(&group_id)
        .ok_or_else(|| ApiFailure::not_found("Cannot find a group with the provided parameters."))?;

    let mut columns = vec!["member_id".to_string(), "sensor_index".to_string()];
    columns.extend(fields.iter().filter(|f| *f != "sensor_index").cloned());
    let data: Vec<Value> = group
        .members
        .values()
        .map(|member| {
            let sensor = sample_sensor(member.sensor_index);
            let mut row = vec![json!(member.id)];
            row.extend(
                columns[1..]
                    .iter()
                    .map(|c| sensor.get(c).cloned().unwrap_or(Value::Null)),
            );
            Value::Array(row)
        })
        .collect();

    Ok(envelope(json!({
        "group_id": group_id,
        "fields": columns,
        "data": data,
    })))
}

async fn delete_member(
    State(db): State<Db>,
    Path((group_id, member_id)): Path<(u64, u64)>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    require(&headers, KeyType::Write)?;
    let mut store = db.write().await;
    store
        .groups
        .get_mut(&group_id)
        .and_then(|g| g.members.remove(&member_id))
        .map(|_| StatusCode::OK)
        .ok_or_else(|| ApiFailure::not_found("Cannot find a member with the provided parameters."))
}

/// What a sensor's embedded web server answers on `/json`.
async fn local_json() -> Json<Value> {
    Json(json!({
        "SensorId": "84:f3:eb:7b:c8:ee",
        "DateTime": "2024/01/01T00:00:00z",
        "Geo": "PurpleAir-c8ee",
        "Mem": 19960,
        "Id": 4125,
        "lat": 37.75,
        "lon": -122.44,
        "place": "outside",
        "version": "7.02",
        "current_temp_f": 68,
        "current_humidity": 41,
        "pressure": 1012.4,
        "pm2_5_atm": 4.1,
        "pm2_5_cf_1": 4.2,
    }))
}
