use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pvseries::installation::NewInstallation;
use pvseries::store::MemoryStore;
use pvseries::value::{Bucket, NewReport};
use pvseries::{QueryEngine, QueryError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

pub type SharedStore = Arc<MemoryStore>;

pub async fn ping() -> &'static str {
    "pong"
}

pub async fn create_installation(
    State(store): State<SharedStore>,
    Json(body): Json<NewInstallation>,
) -> Response {
    if let Err(problem) = validate_installation(&body) {
        return problem.into_response();
    }
    let installation = store
        .create_installation(body, OffsetDateTime::now_utc())
        .await;
    (StatusCode::CREATED, Json(installation)).into_response()
}

pub async fn deactivate_installation(
    State(store): State<SharedStore>,
    Path(id): Path<u64>,
) -> Response {
    match store.deactivate(id, OffsetDateTime::now_utc()).await {
        Some(installation) => Json(installation).into_response(),
        None => ApiError(QueryError::NotFound(id)).into_response(),
    }
}

pub async fn create_report(
    State(store): State<SharedStore>,
    Path(id): Path<u64>,
    Json(body): Json<NewReport>,
) -> Response {
    if let Err(problem) = validate_report(&body) {
        return problem.into_response();
    }
    match store
        .append_report(id, body, OffsetDateTime::now_utc())
        .await
    {
        Some(sample) => (StatusCode::CREATED, Json(sample)).into_response(),
        None => ApiError(QueryError::NotFound(id)).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct SumParams {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub duration: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SumResponse {
    pub total_produced_wattage: f32,
}

pub async fn report_sum(
    State(store): State<SharedStore>,
    Path(id): Path<u64>,
    Query(params): Query<SumParams>,
) -> Result<Json<SumResponse>, ApiError> {
    let engine = QueryEngine::new(Arc::clone(&store));
    let total_produced_wattage = engine
        .produced_sum(id, params.timestamp, params.duration)
        .await?;
    Ok(Json(SumResponse {
        total_produced_wattage,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineParams {
    #[serde(with = "time::serde::rfc3339")]
    pub start_timestamp: OffsetDateTime,
    pub duration: i64,
    pub page: i64,
}

pub async fn timeline(
    State(store): State<SharedStore>,
    Path(id): Path<u64>,
    Query(params): Query<TimelineParams>,
) -> Result<Json<Vec<Bucket>>, ApiError> {
    let engine = QueryEngine::new(Arc::clone(&store));
    let buckets = engine
        .timeline(id, params.start_timestamp, params.duration, params.page)
        .await?;
    Ok(Json(buckets))
}

/// [`QueryError`] with its HTTP rendering.
#[derive(Debug)]
pub struct ApiError(pub QueryError);

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            QueryError::InvalidArgument(_) | QueryError::OutOfRange(_) => StatusCode::BAD_REQUEST,
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "sample store failure");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Per-field validation failures, rendered as a 400 with
/// `{ "errors": { field: [messages] } }`.
#[derive(Debug, Default)]
pub struct ValidationProblem {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationProblem {
    fn check(&mut self, field: &'static str, ok: bool, message: &str) {
        if !ok {
            self.errors.entry(field).or_default().push(message.to_owned());
        }
    }

    fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl IntoResponse for ValidationProblem {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({ "errors": self.errors }))).into_response()
    }
}

fn validate_installation(body: &NewInstallation) -> Result<(), ValidationProblem> {
    let mut problem = ValidationProblem::default();
    problem.check(
        "longitude",
        (-180.0..=180.0).contains(&body.longitude),
        "must be between -180 and 180",
    );
    problem.check(
        "latitude",
        (-90.0..=90.0).contains(&body.latitude),
        "must be between -90 and 90",
    );
    problem.check(
        "address",
        !body.address.is_empty() && body.address.len() <= 1024,
        "must be non-empty and at most 1024 characters",
    );
    problem.check(
        "ownerName",
        !body.owner_name.is_empty() && body.owner_name.len() <= 512,
        "must be non-empty and at most 512 characters",
    );
    problem.check(
        "comments",
        body.comments.as_ref().map_or(true, |c| c.len() <= 1024),
        "must be at most 1024 characters",
    );
    problem.into_result()
}

fn validate_report(body: &NewReport) -> Result<(), ValidationProblem> {
    let mut problem = ValidationProblem::default();
    let fields = [
        ("producedWattage", body.produced_wattage),
        ("householdWattage", body.household_wattage),
        ("batteryWattage", body.battery_wattage),
        ("gridWattage", body.grid_wattage),
    ];
    for (field, value) in fields {
        problem.check(field, value >= 0.0, "must be greater than or equal to 0");
    }
    problem.into_result()
}
