use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub gemini_credential: ComponentHealth,
    pub session: SessionHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

#[derive(Serialize)]
pub struct SessionHealth {
    pub active: bool,
    pub processing: bool,
}

/// GET /health — service status, credential presence and session activity.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let credential = ComponentHealth {
        status: if state.credential_configured {
            "ok".to_string()
        } else {
            "missing".to_string()
        },
    };

    let session = match state.studio.active().await {
        Some(run) => SessionHealth {
            active: true,
            processing: run.snapshot().processing,
        },
        None => SessionHealth {
            active: false,
            processing: false,
        },
    };

    let status_code = if state.credential_configured {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if state.credential_configured {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            gemini_credential: credential,
            session,
        },
    };

    (status_code, Json(response))
}
