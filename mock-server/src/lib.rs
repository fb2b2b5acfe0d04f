use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Sentinel message for an exhausted time budget.
pub const TIEMPO_AGOTADO: &str = "TIEMPO_AGOTADO";

/// Where the backend sends users whose budget ran out.
pub const RESPONSABILIDAD_URL: &str = "/responsabilidad/";

pub const DASHBOARD_URL: &str = "/dashboard/";

const CSRF_FAILURE_PAGE: &str = "<html><body><h1>Forbidden (403)</h1><p>CSRF verification failed.</p></body></html>";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneStatus {
    EnZona,
    Finalizado,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actividad {
    pub id: Uuid,
    pub titulo: String,
    pub observacion: String,
    pub foto: Option<String>,
}

#[derive(Debug)]
pub struct Zone {
    pub expired: bool,
    pub status: ZoneStatus,
    pub actividades: Vec<Actividad>,
}

impl Default for Zone {
    fn default() -> Self {
        Self {
            expired: false,
            status: ZoneStatus::EnZona,
            actividades: Vec::new(),
        }
    }
}

pub type Db = Arc<RwLock<Zone>>;

pub fn app() -> Router {
    app_with_state(Db::default())
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/api/envelopes/{shape}", get(envelope))
        .route("/api/echo/", post(echo).put(echo).delete(echo))
        .route("/api/html/{status}", get(html_page))
        .route("/api/broken/", get(broken_json))
        .route("/api/test/expire/", post(expire_budget))
        .route("/actividades/api/listar/", get(list_actividades))
        .route("/actividades/api/iniciar/", post(iniciar_actividad))
        .route("/actividades/api/zona/salir/", post(salir_zona))
        .layer(middleware::from_fn(csrf_guard))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// The standard envelope: `{success, message, payload, timestamp}`.
pub fn api_response(payload: Value, success: bool, message: &str, status: StatusCode) -> Response {
    let body = json!({
        "success": success,
        "message": message,
        "payload": payload,
        "timestamp": chrono::Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
    });
    (status, Json(body)).into_response()
}

fn is_ajax(headers: &HeaderMap) -> bool {
    let requested_with = headers
        .get("x-requested-with")
        .and_then(|v| v.to_str().ok())
        == Some("XMLHttpRequest");
    let json_body = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    requested_with || json_body
}

/// State-changing requests need a non-empty anti-forgery header.
async fn csrf_guard(request: Request, next: Next) -> Response {
    let safe = matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS);
    let has_token = request
        .headers()
        .get("x-csrftoken")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.is_empty());
    if !safe && !has_token {
        tracing::warn!(uri = %request.uri(), "rejected request without CSRF token");
        return (StatusCode::FORBIDDEN, Html(CSRF_FAILURE_PAGE)).into_response();
    }
    next.run(request).await
}

/// Closes the zone entry once the budget is gone. AJAX callers get the 403
/// sentinel, page loads a redirect.
async fn time_budget(db: &Db, headers: &HeaderMap) -> Option<Response> {
    let mut zone = db.write().await;
    if !zone.expired {
        return None;
    }
    zone.status = ZoneStatus::Finalizado;
    tracing::info!("time budget exhausted, zone entry closed");
    if is_ajax(headers) {
        Some(api_response(
            json!({ "redirect_url": RESPONSABILIDAD_URL }),
            false,
            TIEMPO_AGOTADO,
            StatusCode::FORBIDDEN,
        ))
    } else {
        Some((StatusCode::FOUND, [(header::LOCATION, RESPONSABILIDAD_URL)]).into_response())
    }
}

#[derive(Deserialize)]
pub struct EnvelopeQuery {
    #[serde(default = "default_ok")]
    pub ok: bool,
}

fn default_ok() -> bool {
    true
}

async fn envelope(Path(shape): Path<String>, Query(query): Query<EnvelopeQuery>) -> Response {
    let item = json!({ "id": 1, "nombre": "Taladro" });
    let status = if query.ok { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    match (shape.as_str(), query.ok) {
        ("standard", true) => api_response(item, true, "Operación exitosa", StatusCode::OK),
        ("standard", false) => api_response(Value::Null, false, "Empresa no encontrada", status),
        ("legacy-status", ok) => {
            let body = if ok {
                json!({ "status": true, "data": item })
            } else {
                json!({ "status": false, "data": null, "mensaje": "Sin permisos" })
            };
            (status, Json(body)).into_response()
        }
        ("legacy-data", ok) => {
            let body = if ok {
                json!({ "success": true, "data": item })
            } else {
                json!({ "success": false, "data": null, "message": "Error al guardar" })
            };
            (status, Json(body)).into_response()
        }
        ("raw", true) => Json(json!([item, { "id": 2, "nombre": "Esmeril" }])).into_response(),
        ("raw", false) => (StatusCode::NOT_FOUND, Json(json!({ "detail": "No encontrado." }))).into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "error": format!("unknown shape {shape}") }))).into_response(),
    }
}

/// Reflects what the backend received: method, policy headers and body.
async fn echo(request: Request) -> Response {
    let method = request.method().to_string();
    let headers = request.headers().clone();
    let header_value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let content_type = header_value("content-type");

    let is_multipart = content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));
    let body = if is_multipart {
        let multipart = match Multipart::from_request(request, &()).await {
            Ok(multipart) => multipart,
            Err(rejection) => return rejection.into_response(),
        };
        match multipart_fields(multipart).await {
            Ok(fields) => Value::Object(fields),
            Err(e) => return bad_multipart(e),
        }
    } else {
        match to_bytes(request.into_body(), usize::MAX).await {
            Ok(bytes) if bytes.is_empty() => Value::Null,
            Ok(bytes) => serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        }
    };

    api_response(
        json!({
            "method": method,
            "content_type": content_type,
            "csrf_token": header_value("x-csrftoken"),
            "requested_with": header_value("x-requested-with"),
            "body": body,
        }),
        true,
        "echo",
        StatusCode::OK,
    )
}

/// Text parts become strings, file parts a `{filename, content_type, size}`
/// summary.
async fn multipart_fields(mut multipart: Multipart) -> Result<Map<String, Value>, MultipartError> {
    let mut fields = Map::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let value = match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let field_type = field.content_type().map(str::to_string);
                let size = field.bytes().await?.len();
                json!({ "filename": file_name, "content_type": field_type, "size": size })
            }
            None => Value::String(field.text().await?),
        };
        fields.insert(name, value);
    }
    Ok(fields)
}

fn bad_multipart(err: MultipartError) -> Response {
    tracing::warn!(error = %err, "malformed multipart body");
    (StatusCode::BAD_REQUEST, err.body_text()).into_response()
}

async fn html_page(Path(status): Path<u16>) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let page = format!("<html><body><h1>{status}</h1></body></html>");
    (status, Html(page)).into_response()
}

async fn broken_json() -> Response {
    ([(header::CONTENT_TYPE, "application/json")], r#"{"success": tru"#).into_response()
}

async fn expire_budget(State(db): State<Db>) -> Response {
    db.write().await.expired = true;
    api_response(Value::Null, true, "Tiempo vencido", StatusCode::OK)
}

async fn list_actividades(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Some(response) = time_budget(&db, &headers).await {
        return response;
    }
    let zone = db.read().await;
    api_response(json!(zone.actividades), true, "Operación exitosa", StatusCode::OK)
}

async fn iniciar_actividad(State(db): State<Db>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    if let Some(response) = time_budget(&db, &headers).await {
        return response;
    }

    let mut titulo = None;
    let mut observacion = String::new();
    let mut foto = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_multipart(e),
        };
        let name = field.name().map(str::to_string);
        let read = match name.as_deref() {
            Some("titulo") => field.text().await.map(|t| titulo = Some(t)),
            Some("observacion") => field.text().await.map(|t| observacion = t),
            Some("foto") => {
                foto = field.file_name().map(str::to_string);
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = read {
            return bad_multipart(e);
        }
    }

    let Some(titulo) = titulo.filter(|t| !t.trim().is_empty()) else {
        return api_response(Value::Null, false, "El título es obligatorio", StatusCode::BAD_REQUEST);
    };
    let actividad = Actividad {
        id: Uuid::new_v4(),
        titulo,
        observacion,
        foto,
    };
    db.write().await.actividades.push(actividad.clone());
    api_response(json!(actividad), true, "Actividad iniciada", StatusCode::CREATED)
}

async fn salir_zona(State(db): State<Db>) -> Response {
    db.write().await.status = ZoneStatus::Finalizado;
    api_response(
        json!({ "redirect_url": DASHBOARD_URL }),
        true,
        "Salida registrada",
        StatusCode::OK,
    )
}
