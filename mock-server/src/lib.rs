//! In-memory stand-in for the AMP360 API, mounted under `/v1`.
//!
//! Responses use the same envelopes as the real service, including its
//! quirks: a plain-text 404 when updating parameters of an unknown terminal
//! and a 502 "Failed to find ..." for unknown template parameter sets.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Multipart, Path, Query, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

/// The only `authorization` value the server accepts.
pub const TOKEN: &str = "mock-token";

const SEEDED_AT: &str = "2021-11-18T06:17:45.000Z";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Terminal {
    pub id: u64,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub status: String,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    #[serde(rename = "AppTemplateId")]
    pub app_template_id: Option<u64>,
    #[serde(rename = "ClientId")]
    pub client_id: Option<String>,
    #[serde(rename = "TerminalModelId")]
    pub terminal_model_id: String,
}

#[derive(Debug, Deserialize)]
pub struct NewTerminal {
    #[serde(rename = "modelId")]
    pub model_id: String,
    #[serde(rename = "serialNumber")]
    pub serial_number: String,
    pub name: String,
    #[serde(rename = "clientId", default)]
    pub client_id: Option<String>,
    #[serde(rename = "templateId", default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Param {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub tag: String,
    pub name: String,
    pub value: Option<String>,
    #[serde(rename = "defaultValue")]
    pub default_value: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "ParamCategoryId")]
    pub category_id: String,
    #[serde(rename = "categoryName")]
    pub category_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TerminalsFilter {
    pub id: Option<u64>,
    #[serde(rename = "serialNumber")]
    pub serial_number: Option<String>,
    pub size: usize,
    pub page: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub size: usize,
    pub page: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ParamsFilter {
    #[serde(rename = "categoryId")]
    pub category_id: Option<String>,
}

#[derive(Debug)]
pub struct Store {
    terminals: BTreeMap<u64, Terminal>,
    next_terminal_id: u64,
    templates: Vec<Value>,
    models: Vec<Value>,
    companies: Vec<Value>,
    template_params: HashMap<u64, Vec<Param>>,
    terminal_params: HashMap<u64, Vec<Param>>,
}

pub type Db = Arc<RwLock<Store>>;

impl Default for Store {
    fn default() -> Self {
        Self::seeded()
    }
}

impl Store {
    /// Two templates, three models, two companies and one terminal.
    pub fn seeded() -> Self {
        let companies = vec![
            json!({"id": "ce16c215-e5a2-4ce6-9429-3bea82624a87", "name": "TEST", "type": "merchant"}),
            json!({"id": "0b4c8f1e-2d1f-4c47-9e57-5a8b3f1d2e6a", "name": "TEST CHILD", "type": "reseller"}),
        ];
        let templates = vec![template(1, "APITEST"), template(2, "RETAIL")];
        let models = vec![
            json!({"id": "test1", "name": "TEST1", "hardwareId": "CD", "jointName": "TEST1-CD", "maintenanceInterval": 180, "createdAt": SEEDED_AT}),
            json!({"id": "test2", "name": "TEST2", "hardwareId": "EF", "jointName": "TEST2-EF", "maintenanceInterval": 365, "createdAt": SEEDED_AT}),
            json!({"id": "test3", "name": "TEST3", "hardwareId": "GH", "jointName": null, "maintenanceInterval": null, "createdAt": SEEDED_AT}),
        ];

        let template_params = HashMap::from([(1, default_params(1)), (2, default_params(2))]);

        let terminal = Terminal {
            id: 1,
            serial_number: "SN-0001".to_string(),
            status: "active".to_string(),
            name: "Front desk".to_string(),
            created_at: SEEDED_AT.to_string(),
            updated_at: SEEDED_AT.to_string(),
            app_template_id: Some(1),
            client_id: Some("ce16c215-e5a2-4ce6-9429-3bea82624a87".to_string()),
            terminal_model_id: "test1".to_string(),
        };
        let terminal_params = HashMap::from([(1, default_params(1))]);

        Self {
            terminals: BTreeMap::from([(1, terminal)]),
            next_terminal_id: 2,
            templates,
            models,
            companies,
            template_params,
            terminal_params,
        }
    }
}

fn template(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "createdAt": SEEDED_AT,
        "updatedAt": SEEDED_AT,
        "ClientId": "ce16c215-e5a2-4ce6-9429-3bea82624a87",
        "parentId": null,
        "Client": {"id": "ce16c215-e5a2-4ce6-9429-3bea82624a87", "name": "TEST"},
        "Applications": [{
            "id": "766d0d8f-a0fd-4fa6-97e3-e44028305ba3",
            "name": "PAYMENT",
            "version": "02.03.029",
            "state": "Production",
            "fileName": "payment.apk",
            "createdAt": SEEDED_AT
        }],
        "parentInfo": null
    })
}

fn default_params(template_id: u64) -> Vec<Param> {
    let param = |offset: u64, tag: &str, value: &str, category: &str| Param {
        id: template_id * 100 + offset,
        kind: "STRING".to_string(),
        tag: tag.to_string(),
        name: tag.to_string(),
        value: Some(value.to_string()),
        default_value: Some(value.to_string()),
        file_path: None,
        category_id: category.to_lowercase(),
        category_name: category.to_string(),
    };
    vec![
        param(1, "ACQS._1.ACQINFO.MERCHANTID", "000000000", "TERMINAL"),
        param(2, "ACQS._1.ACQINFO.TERMINALID", "00000000", "TERMINAL"),
        param(3, "HOST.PRIMARY.URL", "https://host.example", "HOST"),
    ]
}

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Store::seeded())))
}

pub fn app_with(db: Db) -> Router {
    let api = Router::new()
        .route("/terminals", get(list_terminals).post(create_terminal))
        .route("/terminals/details", get(terminal_details))
        .route("/terminals/{id}", put(update_terminal).delete(delete_terminal))
        .route(
            "/terminals/params/{id}",
            get(terminal_params).post(update_terminal_params),
        )
        .route("/templates", get(list_templates))
        .route(
            "/templates/params/{id}",
            get(template_params).post(update_template_params),
        )
        .route("/models", get(list_models))
        .route("/client/children", get(list_companies))
        .layer(middleware::from_fn(require_token))
        .with_state(db);
    Router::new().nest("/v1", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_token(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(TOKEN);
    if !authorized {
        debug!(uri = %request.uri(), "rejecting request without valid token");
        return failure(StatusCode::UNAUTHORIZED, "Invalid token");
    }
    next.run(request).await
}

fn success(data: impl Serialize) -> Response {
    Json(json!({"success": true, "message": "", "data": data})).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"success": false, "message": message}))).into_response()
}

fn page<T: Clone + Serialize>(rows: &[T], size: usize, page: usize) -> Value {
    let selected: Vec<T> = if size == 0 {
        rows.to_vec()
    } else {
        rows.iter()
            .skip(page.saturating_sub(1) * size)
            .take(size)
            .cloned()
            .collect()
    };
    json!({"count": rows.len(), "rows": selected})
}

fn categories() -> Value {
    json!([{"id": "terminal", "name": "TERMINAL"}, {"id": "host", "name": "HOST"}])
}

fn param_set(params: &[Param], filter: &ParamsFilter) -> Value {
    let rows: Vec<&Param> = params
        .iter()
        .filter(|p| {
            filter
                .category_id
                .as_deref()
                .filter(|c| !c.is_empty())
                .is_none_or(|c| p.category_id == c)
        })
        .collect();
    json!({"categories": categories(), "count": rows.len(), "rows": rows})
}

async fn list_terminals(State(db): State<Db>, Query(filter): Query<TerminalsFilter>) -> Response {
    let store = db.read().await;
    let rows: Vec<Terminal> = store
        .terminals
        .values()
        .filter(|t| filter.id.is_none_or(|id| t.id == id))
        .filter(|t| {
            filter
                .serial_number
                .as_ref()
                .is_none_or(|sn| &t.serial_number == sn)
        })
        .cloned()
        .collect();
    success(page(&rows, filter.size, filter.page))
}

async fn terminal_details(State(db): State<Db>, Query(filter): Query<TerminalsFilter>) -> Response {
    let store = db.read().await;
    let found = store.terminals.values().find(|t| {
        filter.id == Some(t.id) || filter.serial_number.as_deref() == Some(t.serial_number.as_str())
    });
    let Some(terminal) = found else {
        return failure(StatusCode::NOT_FOUND, "Terminal not found");
    };

    let model = store
        .models
        .iter()
        .find(|m| m["id"] == terminal.terminal_model_id.as_str())
        .cloned();
    let mut info = json!(terminal);
    info["queueFirmware"] = json!(0);
    info["TerminalModel"] = model.unwrap_or(Value::Null);
    success(json!({"templateDetails": [], "terminal": info}))
}

async fn create_terminal(State(db): State<Db>, Json(input): Json<NewTerminal>) -> Response {
    let mut store = db.write().await;
    if store
        .terminals
        .values()
        .any(|t| t.serial_number == input.serial_number)
    {
        return failure(StatusCode::CONFLICT, "Terminal with this serial number already exists");
    }

    let id = store.next_terminal_id;
    store.next_terminal_id += 1;

    let template_id = input.template_id.as_deref().and_then(|t| t.parse::<u64>().ok());
    let mut params = template_id
        .and_then(|t| store.template_params.get(&t).cloned())
        .unwrap_or_default();
    for param in &mut params {
        if let Some(value) = input.parameters.get(&param.tag) {
            param.value = Some(match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
    }

    let terminal = Terminal {
        id,
        serial_number: input.serial_number,
        status: "active".to_string(),
        name: input.name,
        created_at: SEEDED_AT.to_string(),
        updated_at: SEEDED_AT.to_string(),
        app_template_id: template_id,
        client_id: input.client_id,
        terminal_model_id: input.model_id,
    };
    store.terminal_params.insert(id, params);
    store.terminals.insert(id, terminal.clone());
    success(terminal)
}

async fn update_terminal(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<NewTerminal>,
) -> Response {
    let mut store = db.write().await;
    if store
        .terminals
        .values()
        .any(|t| t.id != id && t.serial_number == input.serial_number)
    {
        return failure(StatusCode::CONFLICT, "Terminal with this serial number already exists");
    }
    let Some(terminal) = store.terminals.get_mut(&id) else {
        return failure(StatusCode::NOT_FOUND, "Terminal not found");
    };
    terminal.serial_number = input.serial_number;
    terminal.name = input.name;
    terminal.terminal_model_id = input.model_id;
    if input.client_id.is_some() {
        terminal.client_id = input.client_id;
    }
    success(json!([1]))
}

async fn delete_terminal(State(db): State<Db>, Path(id): Path<u64>) -> Response {
    let mut store = db.write().await;
    if store.terminals.remove(&id).is_none() {
        return failure(StatusCode::NOT_FOUND, "Terminal not found");
    }
    store.terminal_params.remove(&id);
    success(Value::Null)
}

async fn terminal_params(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(filter): Query<ParamsFilter>,
) -> Response {
    let store = db.read().await;
    match store.terminal_params.get(&id) {
        Some(params) => success(param_set(params, &filter)),
        None => failure(StatusCode::NOT_FOUND, "Terminal not found"),
    }
}

async fn template_params(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(filter): Query<ParamsFilter>,
) -> Response {
    let store = db.read().await;
    match store.template_params.get(&id) {
        Some(params) => success(param_set(params, &filter)),
        None => failure(
            StatusCode::BAD_GATEWAY,
            &format!("Failed to find template with id {id}"),
        ),
    }
}

async fn update_terminal_params(
    State(db): State<Db>,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Response {
    let values = match read_form(multipart).await {
        Ok(values) => values,
        Err(response) => return response,
    };
    let mut store = db.write().await;
    let Some(params) = store.terminal_params.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };
    let (updated, failed) = apply(params, values);
    Json(json!({
        "success": true,
        "message": format!("Successfully updated {} parameter(s).", updated.len()),
        "updated": updated,
        "failed": failed,
    }))
    .into_response()
}

async fn update_template_params(
    State(db): State<Db>,
    Path(id): Path<u64>,
    multipart: Multipart,
) -> Response {
    let values = match read_form(multipart).await {
        Ok(values) => values,
        Err(response) => return response,
    };
    let mut store = db.write().await;
    let terminals = store
        .terminals
        .values()
        .filter(|t| t.app_template_id == Some(id))
        .count();
    let Some(params) = store.template_params.get_mut(&id) else {
        return failure(
            StatusCode::BAD_GATEWAY,
            &format!("Failed to find template with id {id}"),
        );
    };
    let (updated, failed) = apply(params, values);
    Json(json!({
        "success": true,
        "message": format!(
            "Successfully updated {} parameter(s) and propagated the changes to {terminals} terminals.",
            updated.len()
        ),
        "updated": updated,
        "failed": failed,
    }))
    .into_response()
}

/// Collect `tag -> value`; file parts contribute their contents as the value.
async fn read_form(mut multipart: Multipart) -> Result<Vec<(String, String)>, Response> {
    let mut values = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(failure(StatusCode::BAD_REQUEST, &err.body_text())),
        };
        let name = field.name().unwrap_or_default().to_string();
        let text = field
            .text()
            .await
            .map_err(|err| failure(StatusCode::BAD_REQUEST, &err.body_text()))?;
        values.push((name, text));
    }
    Ok(values)
}

fn apply(params: &mut [Param], values: Vec<(String, String)>) -> (Vec<String>, Vec<String>) {
    let mut updated = Vec::new();
    let mut failed = Vec::new();
    for (tag, value) in values {
        match params.iter_mut().find(|p| p.tag == tag) {
            Some(param) => {
                param.value = Some(value);
                updated.push(tag);
            }
            None => failed.push(tag),
        }
    }
    (updated, failed)
}

async fn list_templates(State(db): State<Db>, Query(paging): Query<Paging>) -> Response {
    let store = db.read().await;
    success(page(&store.templates, paging.size, paging.page))
}

async fn list_models(State(db): State<Db>) -> Response {
    let store = db.read().await;
    success(page(&store.models, 0, 0))
}

async fn list_companies(State(db): State<Db>, Query(paging): Query<Paging>) -> Response {
    let store = db.read().await;
    success(page(&store.companies, paging.size, paging.page))
}
