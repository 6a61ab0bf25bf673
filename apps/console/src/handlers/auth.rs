use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use cantoria_application::{SessionPhase, SessionReader, SignUpInput};
use cantoria_core::AppError;

use crate::dto::{SessionResponse, SignInRequest, SignUpRequest};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Upper bound on how long a request waits for the session to settle.
const RESOLUTION_WAIT: Duration = Duration::from_secs(5);

pub async fn sign_in_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let mut session = state.lifecycle.reader();
    state
        .account_service
        .sign_in(payload.email.as_str(), payload.password.as_str())
        .await?;

    settled_response(&mut session).await
}

pub async fn sign_up_handler(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let mut session = state.lifecycle.reader();
    state
        .account_service
        .sign_up(SignUpInput {
            email: payload.email,
            password: payload.password,
            display_name: payload.display_name,
            locality: payload.locality,
            region: payload.region,
            instrument: payload.instrument,
        })
        .await?;

    settled_response(&mut session).await
}

pub async fn refresh_handler(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let mut session = state.lifecycle.reader();
    state.account_service.refresh_session().await?;

    settled_response(&mut session).await
}

pub async fn sign_out_handler(State(state): State<AppState>) -> ApiResult<StatusCode> {
    let mut session = state.lifecycle.reader();
    state.account_service.sign_out().await?;

    if session.phase() != SessionPhase::Unauthenticated {
        next_settled_phase(&mut session).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(SessionResponse::from_phase(
        &state.authorization_service.phase(),
    ))
}

/// Waits for the first non-resolving phase published after `session` was taken.
async fn next_settled_phase(session: &mut SessionReader) -> SessionPhase {
    let settled = tokio::time::timeout(RESOLUTION_WAIT, async {
        loop {
            match session.changed().await {
                Ok(SessionPhase::Resolving) => {}
                Ok(phase) => return phase,
                Err(_) => return SessionPhase::Unauthenticated,
            }
        }
    })
    .await;

    settled.unwrap_or_else(|_| session.phase())
}

async fn settled_response(
    session: &mut SessionReader,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let phase = next_settled_phase(session).await;

    match phase {
        SessionPhase::Authenticated(_) => {
            Ok((StatusCode::OK, Json(SessionResponse::from_phase(&phase))))
        }
        SessionPhase::ResolutionFailed => Err(ApiError(AppError::Unauthorized(
            "member record could not be loaded".to_owned(),
        ))),
        SessionPhase::Resolving | SessionPhase::Unauthenticated => Ok((
            StatusCode::ACCEPTED,
            Json(SessionResponse::from_phase(&phase)),
        )),
    }
}
