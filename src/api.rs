// Coffee Bean DMS - HTTP API
// JSON routes over a shared BeanRepository, mounted under /api by inventory-server

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::entities::BeanLot;
use crate::repository::{BeanRepository, ImportReport};
use crate::validation::{FieldError, RawLot};

pub type SharedRepository = Arc<Mutex<Box<dyn BeanRepository + Send>>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    repo: SharedRepository,
}

impl AppState {
    pub fn new(repo: Box<dyn BeanRepository + Send>) -> Self {
        Self {
            repo: Arc::new(Mutex::new(repo)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn BeanRepository + Send>>, Response> {
        self.repo.lock().map_err(|_| {
            tracing::error!("repository lock poisoned");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "repository unavailable")
        })
    }
}

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValueResponse {
    pub total_inventory_value: rust_decimal::Decimal,
    pub lot_count: usize,
}

fn reply<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(ApiResponse::ok(data))).into_response()
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::err(message))).into_response()
}

fn internal(context: &str, e: impl std::fmt::Display) -> Response {
    tracing::error!(error = %e, "{}", context);
    failure(StatusCode::INTERNAL_SERVER_ERROR, format!("{}: {}", context, e))
}

fn invalid(errors: &[FieldError]) -> Response {
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    failure(StatusCode::BAD_REQUEST, message)
}

fn parse_body(body: Result<Json<RawLot>, JsonRejection>) -> Result<BeanLot, Response> {
    let Json(raw) = body.map_err(|e| failure(StatusCode::BAD_REQUEST, e.body_text()))?;
    raw.validate().map_err(|errors| invalid(&errors))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/lots - All lots in insertion order
async fn list_lots(State(state): State<AppState>) -> Response {
    let repo = match state.lock() {
        Ok(repo) => repo,
        Err(response) => return response,
    };

    match repo.find_all() {
        Ok(lots) => reply(StatusCode::OK, lots),
        Err(e) => internal("Error listing lots", e),
    }
}

/// GET /api/lots/:id
async fn get_lot(State(state): State<AppState>, Path(bean_id): Path<String>) -> Response {
    let repo = match state.lock() {
        Ok(repo) => repo,
        Err(response) => return response,
    };

    match repo.find_by_id(&bean_id) {
        Ok(Some(lot)) => reply(StatusCode::OK, lot),
        Ok(None) => failure(StatusCode::NOT_FOUND, format!("no bean with ID {}", bean_id)),
        Err(e) => internal("Error finding lot", e),
    }
}

/// POST /api/lots - Add a lot; 409 when the ID is taken
async fn create_lot(
    State(state): State<AppState>,
    body: Result<Json<RawLot>, JsonRejection>,
) -> Response {
    let lot = match parse_body(body) {
        Ok(lot) => lot,
        Err(response) => return response,
    };
    let mut repo = match state.lock() {
        Ok(repo) => repo,
        Err(response) => return response,
    };

    match repo.add(lot.clone()) {
        Ok(true) => reply(StatusCode::CREATED, lot),
        Ok(false) => failure(
            StatusCode::CONFLICT,
            format!("bean ID {} already exists", lot.bean_id()),
        ),
        Err(e) => internal("Error adding lot", e),
    }
}

/// PUT /api/lots/:id - Replace every field of an existing lot
async fn update_lot(
    State(state): State<AppState>,
    Path(bean_id): Path<String>,
    body: Result<Json<RawLot>, JsonRejection>,
) -> Response {
    let lot = match parse_body(body) {
        Ok(lot) => lot,
        Err(response) => return response,
    };
    if lot.bean_id() != bean_id {
        return failure(
            StatusCode::BAD_REQUEST,
            format!("body bean ID {} does not match path {}", lot.bean_id(), bean_id),
        );
    }
    let mut repo = match state.lock() {
        Ok(repo) => repo,
        Err(response) => return response,
    };

    match repo.update(lot.clone()) {
        Ok(true) => reply(StatusCode::OK, lot),
        Ok(false) => failure(StatusCode::NOT_FOUND, format!("no bean with ID {}", bean_id)),
        Err(e) => internal("Error updating lot", e),
    }
}

/// DELETE /api/lots/:id
async fn delete_lot(State(state): State<AppState>, Path(bean_id): Path<String>) -> Response {
    let mut repo = match state.lock() {
        Ok(repo) => repo,
        Err(response) => return response,
    };

    match repo.remove_by_id(&bean_id) {
        Ok(true) => reply(StatusCode::OK, bean_id),
        Ok(false) => failure(StatusCode::NOT_FOUND, format!("no bean with ID {}", bean_id)),
        Err(e) => internal("Error removing lot", e),
    }
}

/// GET /api/value - Total inventory value
async fn total_value(State(state): State<AppState>) -> Response {
    let repo = match state.lock() {
        Ok(repo) => repo,
        Err(response) => return response,
    };

    let lot_count = match repo.find_all() {
        Ok(lots) => lots.len(),
        Err(e) => return internal("Error listing lots", e),
    };
    match repo.total_inventory_value() {
        Ok(total) => reply(
            StatusCode::OK,
            ValueResponse {
                total_inventory_value: total,
                lot_count,
            },
        ),
        Err(e) => internal("Error computing total value", e),
    }
}

/// POST /api/import - Plain-text body, one lot per line
async fn import_lots(State(state): State<AppState>, body: String) -> Response {
    let mut repo = match state.lock() {
        Ok(repo) => repo,
        Err(response) => return response,
    };

    match repo.import_report(&body) {
        Ok(report) => reply::<ImportReport>(StatusCode::OK, report),
        Err(e) => internal("Error importing lots", e),
    }
}

/// Routes relative to /api
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/lots", get(list_lots).post(create_lot))
        .route("/lots/:id", get(get_lot).put(update_lot).delete(delete_lot))
        .route("/value", get(total_value))
        .route("/import", axum::routing::post(import_lots))
        .with_state(state)
}

/// Full application router
pub fn router(state: AppState) -> Router {
    Router::new().nest("/api", api_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryBeanRepository;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(Box::new(MemoryBeanRepository::new())))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn a1() -> Value {
        json!({
            "bean_id": "A1",
            "origin_country": "Brazil",
            "farm_name": "Fazenda",
            "roast_level": "LIGHT",
            "roast_date": "2024-03-01",
            "quantity_kg": 10.0,
            "cost_per_kg": "5.50",
            "flavor_notes": "fruity",
            "caffeine_mg_per_g": 1.2
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let app = app();

        let (status, body) = send(&app, "POST", "/api/lots", Some(a1())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["roast_level"], "LIGHT");

        let (status, body) = send(&app, "GET", "/api/lots/A1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["origin_country"], "Brazil");
        assert_eq!(body["data"]["roast_date"], "2024-03-01");
        assert_eq!(body["data"]["cost_per_kg"], "5.50");
    }

    #[tokio::test]
    async fn test_duplicate_create_conflicts() {
        let app = app();
        send(&app, "POST", "/api/lots", Some(a1())).await;

        let mut dup = a1();
        dup["origin_country"] = json!("Peru");
        let (status, body) = send(&app, "POST", "/api/lots", Some(dup)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        let (_, body) = send(&app, "GET", "/api/lots/A1", None).await;
        assert_eq!(body["data"]["origin_country"], "Brazil");
    }

    #[tokio::test]
    async fn test_invalid_body_lists_field_errors() {
        let mut bad = a1();
        bad["roast_level"] = json!("BLONDE");
        bad["quantity_kg"] = json!("-1");

        let (status, body) = send(&app(), "POST", "/api/lots", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("BLONDE"));
        assert!(error.contains("must be zero or greater"));
    }

    #[tokio::test]
    async fn test_update_rules() {
        let app = app();

        let (status, _) = send(&app, "PUT", "/api/lots/A1", Some(a1())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, "POST", "/api/lots", Some(a1())).await;
        let (status, _) = send(&app, "PUT", "/api/lots/B2", Some(a1())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut changed = a1();
        changed["quantity_kg"] = json!(2);
        let (status, body) = send(&app, "PUT", "/api/lots/A1", Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["quantity_kg"], 2.0);
    }

    #[tokio::test]
    async fn test_delete_and_value() {
        let app = app();
        send(&app, "POST", "/api/lots", Some(a1())).await;

        let (_, body) = send(&app, "GET", "/api/value", None).await;
        assert_eq!(body["data"]["total_inventory_value"], "55.00");
        assert_eq!(body["data"]["lot_count"], 1);

        let (status, _) = send(&app, "DELETE", "/api/lots/A1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "DELETE", "/api/lots/A1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_import_returns_report() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/import")
            .body(Body::from(
                "A1,Brazil,Fazenda,LIGHT,2024-03-01,10.0,5.50,fruity,1.2\n\
                 B2,Peru,Cajamarca,DARK,2024-13-01,2,7,cocoa,0.9\n\
                 A1,Brazil,Other,DARK,2024-03-01,1,1,x,1\n",
            ))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["data"]["imported"].as_array().unwrap().len(), 1);
        let skipped = body["data"]["skipped"].as_array().unwrap();
        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0]["line_number"], 2);
        assert_eq!(skipped[1]["reason"]["kind"], "duplicate_id");
    }
}
