use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cantoria_application::UpdateProfileInput;
use cantoria_domain::{Role, UserId};

use crate::dto::{AssignRoleRequest, ProfileResponse, UpdateProfileRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn update_profile_handler(
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = state
        .account_service
        .update_profile(UpdateProfileInput {
            display_name: payload.display_name,
            locality: payload.locality,
            region: payload.region,
            instrument: payload.instrument,
        })
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::parse(user_id.as_str())?;
    let role = Role::from_transport(payload.role.as_str())?;

    state.account_service.assign_role(user_id, role).await?;

    Ok(StatusCode::NO_CONTENT)
}
