use axum::Json;
use axum::extract::State;
use cantoria_application::InlineGuard;
use cantoria_domain::Resource;

use crate::dto::NavigationItemResponse;
use crate::state::AppState;

/// Lists the sections the live member may open, in navigation order.
pub async fn navigation_handler(
    State(state): State<AppState>,
) -> Json<Vec<NavigationItemResponse>> {
    let items = Resource::all()
        .iter()
        .filter_map(|resource| {
            InlineGuard::resource(*resource).show(
                &state.authorization_service,
                NavigationItemResponse::from(*resource),
            )
        })
        .collect();

    Json(items)
}
