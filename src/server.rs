use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Limits, ServerConfig};
use crate::data::{CheckOutput, CheckRequest, Timetable, TimetableOutput, TimetableRequest};
use crate::solver;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
    #[error("server stopped: {0}")]
    Serve(#[source] std::io::Error),
}

async fn generate_handler(
    State(limits): State<Arc<Limits>>,
    Json(input): Json<TimetableRequest>,
) -> Result<Json<TimetableOutput>, (StatusCode, String)> {
    match solver::solve(&input, &limits) {
        Ok(output) => Ok(Json(output)),
        Err(e) => {
            warn!("{e}");
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

async fn check_handler(
    Json(input): Json<CheckRequest>,
) -> Result<Json<CheckOutput>, (StatusCode, String)> {
    let periods_per_day = input.grid.first().map_or(0, Vec::len);
    if input.grid.iter().any(|row| row.len() != periods_per_day) {
        return Err((
            StatusCode::BAD_REQUEST,
            "every day must have the same number of periods".to_string(),
        ));
    }
    let days = (1..=input.grid.len()).map(|d| format!("Day {d}")).collect();
    let timetable = Timetable::new(days, periods_per_day, input.grid);
    Ok(Json(CheckOutput {
        valid: solver::is_valid(&timetable),
        adjacent_repeats: timetable.adjacent_repeats(),
    }))
}

pub fn router(limits: Limits) -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/timetable/check", post(check_handler))
        .with_state(Arc::new(limits))
}

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let app = router(config.limits);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr,
            source,
        })?;

    match listener.local_addr() {
        Ok(addr) => info!("Server running at http://{}", addr),
        Err(_) => info!("Server running at http://{}", config.addr),
    }

    axum::serve(listener, app).await.map_err(ServerError::Serve)
}
