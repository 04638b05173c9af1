//! An in-process stand-in for the token endpoint and the warehouse REST API.
#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bigquery_session::{Client, ClientOptions, CredentialsConfig};
use serde_json::{Map, Value as JsonValue, json};

pub const PROJECT_ID: &str = "test-project";

const JWT_BEARER: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DATASET_PAGE_SIZE: usize = 2;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fixture_key_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/service-account.pem")
}

pub fn credentials_config() -> CredentialsConfig {
    CredentialsConfig {
        client_id: "1234.apps.example.com".to_owned(),
        project_id: PROJECT_ID.to_owned(),
        service_account: "loader@test-project.iam.gserviceaccount.com".to_owned(),
        credentials_file: fixture_key_path(),
        ..Default::default()
    }
}

/// Endpoints that can be told to fail with a canned error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    InsertDataset,
    GetTable,
    InsertTable,
}

struct StoredTable {
    schema: JsonValue,
    rows: Vec<Map<String, JsonValue>>,
}

pub struct Warehouse {
    token_requests: AtomicUsize,
    expires_in: AtomicI64,
    reject_tokens: AtomicBool,
    incomplete_queries: AtomicBool,
    faults: Mutex<HashMap<Route, (StatusCode, &'static str)>>,
    table_inserts: AtomicUsize,
    issued: Mutex<Vec<String>>,
    datasets: Mutex<BTreeSet<String>>,
    tables: Mutex<HashMap<(String, String), StoredTable>>,
    last_query: Mutex<Option<JsonValue>>,
}

impl Default for Warehouse {
    fn default() -> Self {
        Self {
            token_requests: AtomicUsize::new(0),
            expires_in: AtomicI64::new(3600),
            reject_tokens: AtomicBool::new(false),
            incomplete_queries: AtomicBool::new(false),
            faults: Mutex::new(HashMap::new()),
            table_inserts: AtomicUsize::new(0),
            issued: Mutex::new(Vec::new()),
            datasets: Mutex::new(BTreeSet::new()),
            tables: Mutex::new(HashMap::new()),
            last_query: Mutex::new(None),
        }
    }
}

pub struct FakeWarehouse {
    state: Arc<Warehouse>,
    addr: SocketAddr,
}

impl FakeWarehouse {
    pub async fn start() -> Self {
        init_tracing();

        let state = Arc::new(Warehouse::default());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { state, addr }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn token_uri(&self) -> String {
        format!("http://{}/token", self.addr)
    }

    pub fn options(&self) -> ClientOptions {
        ClientOptions {
            http_client: Some(reqwest::Client::builder().no_proxy().build().unwrap()),
            ..ClientOptions::with_endpoints(self.base_url(), self.token_uri())
        }
    }

    pub async fn connect(&self) -> Client {
        Client::connect(&credentials_config(), self.options())
            .await
            .unwrap()
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }

    pub fn set_expires_in(&self, seconds: i64) {
        self.state.expires_in.store(seconds, Ordering::SeqCst);
    }

    pub fn reject_tokens(&self, reject: bool) {
        self.state.reject_tokens.store(reject, Ordering::SeqCst);
    }

    pub fn incomplete_queries(&self, incomplete: bool) {
        self.state.incomplete_queries.store(incomplete, Ordering::SeqCst);
    }

    /// Makes every request to `route` fail with `status` and `reason`.
    pub fn fail(&self, route: Route, status: StatusCode, reason: &'static str) {
        self.state
            .faults
            .lock()
            .unwrap()
            .insert(route, (status, reason));
    }

    pub fn recover(&self, route: Route) {
        self.state.faults.lock().unwrap().remove(&route);
    }

    /// Number of table insert requests received, including failed ones.
    pub fn table_inserts(&self) -> usize {
        self.state.table_inserts.load(Ordering::SeqCst)
    }

    /// Deletes a dataset and its tables, bypassing the API.
    pub fn drop_dataset(&self, dataset: &str) {
        self.state.datasets.lock().unwrap().remove(dataset);
        self.state
            .tables
            .lock()
            .unwrap()
            .retain(|(ds, _), _| ds != dataset);
    }

    pub fn dataset_ids(&self) -> Vec<String> {
        self.state.datasets.lock().unwrap().iter().cloned().collect()
    }

    pub fn table_schema(&self, dataset: &str, table: &str) -> Option<JsonValue> {
        let tables = self.state.tables.lock().unwrap();
        tables
            .get(&(dataset.to_owned(), table.to_owned()))
            .map(|table| table.schema.clone())
    }

    pub fn row_count(&self, dataset: &str, table: &str) -> usize {
        let tables = self.state.tables.lock().unwrap();
        tables
            .get(&(dataset.to_owned(), table.to_owned()))
            .map_or(0, |table| table.rows.len())
    }

    pub fn last_query(&self) -> Option<JsonValue> {
        self.state.last_query.lock().unwrap().clone()
    }

    /// Creates (or replaces) a table holding `rows`, bypassing the API.
    pub fn seed_table(&self, dataset: &str, table: &str, schema: JsonValue, rows: Vec<JsonValue>) {
        self.state.datasets.lock().unwrap().insert(dataset.to_owned());

        let rows = rows
            .into_iter()
            .map(|row| match row {
                JsonValue::Object(map) => map,
                other => panic!("seeded rows must be objects, got {other}"),
            })
            .collect();

        self.state
            .tables
            .lock()
            .unwrap()
            .insert((dataset.to_owned(), table.to_owned()), StoredTable { schema, rows });
    }
}

fn router(state: Arc<Warehouse>) -> Router {
    Router::new()
        .route("/token", post(issue_token))
        .route(
            "/projects/{project}/datasets",
            get(list_datasets).post(insert_dataset),
        )
        .route(
            "/projects/{project}/datasets/{dataset}/tables",
            post(insert_table),
        )
        .route(
            "/projects/{project}/datasets/{dataset}/tables/{table}",
            get(get_table),
        )
        .route(
            "/projects/{project}/datasets/{dataset}/tables/{table}/insertAll",
            post(insert_all),
        )
        .route("/projects/{project}/queries", post(run_query))
        .with_state(state)
}

fn error(status: StatusCode, reason: &str, message: impl Into<String>) -> Response {
    let message = message.into();
    let body = json!({
        "error": {
            "code": status.as_u16(),
            "message": message,
            "errors": [{ "message": message, "domain": "global", "reason": reason }],
        }
    });

    (status, Json(body)).into_response()
}

impl Warehouse {
    fn fault(&self, route: Route) -> Result<(), Response> {
        match self.faults.lock().unwrap().get(&route) {
            Some(&(status, reason)) => Err(error(
                status,
                reason,
                format!("injected failure for {route:?}"),
            )),
            None => Ok(()),
        }
    }
}

fn authorize(state: &Warehouse, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match token {
        Some(token) if state.issued.lock().unwrap().iter().any(|t| t == token) => Ok(()),
        _ => Err(error(
            StatusCode::UNAUTHORIZED,
            "authError",
            "Request had invalid authentication credentials.",
        )),
    }
}

async fn issue_token(
    State(state): State<Arc<Warehouse>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    state.token_requests.fetch_add(1, Ordering::SeqCst);

    if form.get("grant_type").map(String::as_str) != Some(JWT_BEARER) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unsupported_grant_type" })),
        )
            .into_response();
    }

    let well_formed = form
        .get("assertion")
        .is_some_and(|jwt| jwt.split('.').count() == 3);

    if !well_formed || state.reject_tokens.load(Ordering::SeqCst) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid JWT Signature.",
            })),
        )
            .into_response();
    }

    let mut issued = state.issued.lock().unwrap();
    let token = format!("token-{}", issued.len() + 1);
    issued.push(token.clone());

    Json(json!({
        "access_token": token,
        "expires_in": state.expires_in.load(Ordering::SeqCst),
        "token_type": "Bearer",
    }))
    .into_response()
}

async fn list_datasets(
    State(state): State<Arc<Warehouse>>,
    headers: HeaderMap,
    Path(project): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }

    let offset = params
        .get("pageToken")
        .and_then(|token| token.parse::<usize>().ok())
        .unwrap_or(0);

    let all = state.datasets.lock().unwrap().iter().cloned().collect::<Vec<_>>();
    let page = all
        .iter()
        .skip(offset)
        .take(DATASET_PAGE_SIZE)
        .map(|id| {
            json!({
                "kind": "bigquery#dataset",
                "id": format!("{project}:{id}"),
                "datasetReference": { "projectId": project, "datasetId": id },
                "location": "US",
            })
        })
        .collect::<Vec<_>>();

    let mut body = json!({ "kind": "bigquery#datasetList", "datasets": page });
    if offset + DATASET_PAGE_SIZE < all.len() {
        body["nextPageToken"] = json!((offset + DATASET_PAGE_SIZE).to_string());
    }

    Json(body).into_response()
}

async fn insert_dataset(
    State(state): State<Arc<Warehouse>>,
    headers: HeaderMap,
    Path(project): Path<String>,
    Json(mut body): Json<JsonValue>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }

    if let Err(resp) = state.fault(Route::InsertDataset) {
        return resp;
    }

    let Some(dataset_id) = body["datasetReference"]["datasetId"].as_str().map(str::to_owned)
    else {
        return error(StatusCode::BAD_REQUEST, "invalid", "datasetReference is required");
    };

    if !state.datasets.lock().unwrap().insert(dataset_id.clone()) {
        return error(
            StatusCode::CONFLICT,
            "duplicate",
            format!("Already Exists: Dataset {project}:{dataset_id}"),
        );
    }

    body["id"] = json!(format!("{project}:{dataset_id}"));
    Json(body).into_response()
}

async fn insert_table(
    State(state): State<Arc<Warehouse>>,
    headers: HeaderMap,
    Path((project, dataset)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }

    state.table_inserts.fetch_add(1, Ordering::SeqCst);
    if let Err(resp) = state.fault(Route::InsertTable) {
        return resp;
    }

    if !state.datasets.lock().unwrap().contains(&dataset) {
        return error(
            StatusCode::NOT_FOUND,
            "notFound",
            format!("Not found: Dataset {project}:{dataset}"),
        );
    }

    let Some(table_id) = body["tableReference"]["tableId"].as_str().map(str::to_owned) else {
        return error(StatusCode::BAD_REQUEST, "invalid", "tableReference is required");
    };

    let mut tables = state.tables.lock().unwrap();
    let key = (dataset.clone(), table_id.clone());
    if tables.contains_key(&key) {
        return error(
            StatusCode::CONFLICT,
            "duplicate",
            format!("Already Exists: Table {project}:{dataset}.{table_id}"),
        );
    }

    let schema = match body.get("schema") {
        Some(schema) => schema.clone(),
        None => json!({ "fields": [] }),
    };

    tables.insert(
        key,
        StoredTable {
            schema,
            rows: Vec::new(),
        },
    );

    Json(body).into_response()
}

async fn get_table(
    State(state): State<Arc<Warehouse>>,
    headers: HeaderMap,
    Path((project, dataset, table)): Path<(String, String, String)>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }

    if let Err(resp) = state.fault(Route::GetTable) {
        return resp;
    }

    let tables = state.tables.lock().unwrap();
    match tables.get(&(dataset.clone(), table.clone())) {
        Some(stored) => Json(json!({
            "kind": "bigquery#table",
            "id": format!("{project}:{dataset}.{table}"),
            "tableReference": { "projectId": project, "datasetId": dataset, "tableId": table },
            "schema": stored.schema,
            "numRows": stored.rows.len().to_string(),
        }))
        .into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            "notFound",
            format!("Not found: Table {project}:{dataset}.{table}"),
        ),
    }
}

fn field_names(schema: &JsonValue) -> Vec<String> {
    schema["fields"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(|field| field["name"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

async fn insert_all(
    State(state): State<Arc<Warehouse>>,
    headers: HeaderMap,
    Path((project, dataset, table)): Path<(String, String, String)>,
    Json(body): Json<JsonValue>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }

    let mut tables = state.tables.lock().unwrap();
    let Some(stored) = tables.get_mut(&(dataset.clone(), table.clone())) else {
        return error(
            StatusCode::NOT_FOUND,
            "notFound",
            format!("Not found: Table {project}:{dataset}.{table}"),
        );
    };

    let columns = field_names(&stored.schema);
    let rows = body["rows"].as_array().cloned().unwrap_or_default();

    let mut accepted = Vec::with_capacity(rows.len());
    let mut insert_errors = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        if !row["insertId"].is_string() {
            return error(StatusCode::BAD_REQUEST, "invalid", "insertId is required");
        }

        let Some(json) = row["json"].as_object() else {
            return error(StatusCode::BAD_REQUEST, "invalid", "rows[].json must be an object");
        };

        let unknown = json
            .keys()
            .filter(|key| !columns.contains(key))
            .map(|key| {
                json!({
                    "reason": "invalid",
                    "location": key,
                    "message": format!("no such field: {key}."),
                })
            })
            .collect::<Vec<_>>();

        if unknown.is_empty() {
            accepted.push(json.clone());
        } else {
            insert_errors.push(json!({ "index": index, "errors": unknown }));
        }
    }

    if !insert_errors.is_empty() {
        return Json(json!({
            "kind": "bigquery#tableDataInsertAllResponse",
            "insertErrors": insert_errors,
        }))
        .into_response();
    }

    stored.rows.extend(accepted);
    Json(json!({ "kind": "bigquery#tableDataInsertAllResponse" })).into_response()
}

/// Understands `SELECT <cols|*> FROM [dataset.]table`, nothing more.
fn parse_select(sql: &str) -> Option<(Vec<String>, String)> {
    let sql = sql.trim().trim_end_matches(';');
    let upper = sql.to_ascii_uppercase();

    if !upper.starts_with("SELECT ") {
        return None;
    }

    let from = upper.find(" FROM ")?;
    let columns = sql["SELECT ".len()..from]
        .split(',')
        .map(|column| column.trim().to_owned())
        .collect::<Vec<_>>();

    let table = sql[from + " FROM ".len()..]
        .split_whitespace()
        .next()?
        .trim_matches('`');
    let table = table.rsplit('.').next()?.to_owned();

    Some((columns, table))
}

fn encode_cell(value: Option<&JsonValue>) -> JsonValue {
    match value {
        None | Some(JsonValue::Null) => json!({ "v": null }),
        Some(JsonValue::String(s)) => json!({ "v": s }),
        Some(JsonValue::Array(values)) => {
            let cells = values.iter().map(|v| encode_cell(Some(v))).collect::<Vec<_>>();
            json!({ "v": cells })
        }
        Some(other) => json!({ "v": other.to_string() }),
    }
}

async fn run_query(
    State(state): State<Arc<Warehouse>>,
    headers: HeaderMap,
    Path(project): Path<String>,
    Json(body): Json<JsonValue>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }

    *state.last_query.lock().unwrap() = Some(body.clone());

    let job_reference = json!({ "projectId": project, "jobId": "job-1", "location": "US" });

    if state.incomplete_queries.load(Ordering::SeqCst) {
        return Json(json!({
            "kind": "bigquery#queryResponse",
            "jobReference": job_reference,
            "jobComplete": false,
        }))
        .into_response();
    }

    let Some((columns, table)) = body["query"].as_str().and_then(parse_select) else {
        return error(StatusCode::BAD_REQUEST, "invalidQuery", "Syntax error");
    };

    let dataset = body["defaultDataset"]["datasetId"]
        .as_str()
        .unwrap_or_default()
        .to_owned();

    let tables = state.tables.lock().unwrap();
    let Some(stored) = tables.get(&(dataset.clone(), table.clone())) else {
        return error(
            StatusCode::NOT_FOUND,
            "notFound",
            format!("Not found: Table {project}:{dataset}.{table}"),
        );
    };

    let all_fields = stored.schema["fields"].as_array().cloned().unwrap_or_default();
    let fields = if columns.len() == 1 && columns[0] == "*" {
        all_fields
    } else {
        let mut selected = Vec::with_capacity(columns.len());
        for column in &columns {
            match all_fields.iter().find(|field| field["name"] == column.as_str()) {
                Some(field) => selected.push(field.clone()),
                None => {
                    return error(
                        StatusCode::BAD_REQUEST,
                        "invalidQuery",
                        format!("Unrecognized name: {column}"),
                    );
                }
            }
        }
        selected
    };

    let limit = body["maxResults"]
        .as_u64()
        .map_or(usize::MAX, |max| max as usize);

    let rows = stored
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            let cells = fields
                .iter()
                .map(|field| encode_cell(field["name"].as_str().and_then(|name| row.get(name))))
                .collect::<Vec<_>>();
            json!({ "f": cells })
        })
        .collect::<Vec<_>>();

    let mut response = json!({
        "kind": "bigquery#queryResponse",
        "jobReference": job_reference,
        "schema": { "fields": fields },
        "totalRows": stored.rows.len().to_string(),
        "jobComplete": true,
    });

    if !rows.is_empty() {
        response["rows"] = json!(rows);
    }

    Json(response).into_response()
}
