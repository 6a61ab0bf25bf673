use axum::Json;
use axum::extract::{Path, State};

use crate::dto::PermissionCheckResponse;
use crate::state::AppState;

/// Answers whether the live member holds a permission. Unknown tags are not granted.
pub async fn permission_check_handler(
    State(state): State<AppState>,
    Path(permission): Path<String>,
) -> Json<PermissionCheckResponse> {
    let granted = state
        .authorization_service
        .has_permission_tag(permission.as_str());

    Json(PermissionCheckResponse {
        permission,
        granted,
    })
}
