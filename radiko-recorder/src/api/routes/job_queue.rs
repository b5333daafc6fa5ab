//! Job queue routes.
//!
//! | Method | Path         | Description                       |
//! |--------|--------------|-----------------------------------|
//! | POST   | `/job_queue` | Submit a job (201 / 409 / 422)    |
//! | GET    | `/job_queue` | Pending and in-progress counts    |

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::server::AppState;
use crate::domain::Job;
use crate::pipeline::{QueueSnapshot, SubmitOutcome};

/// Create the job queue router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(queue_status).post(put_job))
}

/// Submit a job.
///
/// The body is decoded here rather than through the `Json` extractor so that
/// every malformed submission maps to 422 with the same error shape.
async fn put_job(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Job>)> {
    match state.ingress.submit_json(&body) {
        SubmitOutcome::Accepted(job) => Ok((StatusCode::CREATED, Json(job))),
        SubmitOutcome::Duplicate(job) => Err(ApiError::conflict(format!(
            "Job already queued or in progress: {}",
            job.url()
        ))),
        SubmitOutcome::Invalid(reason) => Err(ApiError::validation(reason)),
    }
}

async fn queue_status(State(state): State<AppState>) -> Json<QueueSnapshot> {
    Json(state.ingress.queue().snapshot())
}
