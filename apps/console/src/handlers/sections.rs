use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use cantoria_application::{
    AuthorizationService, InlineGuard, PageDecision, PageGuard, SessionPhase,
};
use cantoria_core::AppError;
use cantoria_domain::{Permission, Resource};

use crate::dto::{PendingResponse, SectionResponse};
use crate::error::ApiError;
use crate::state::AppState;

const LOGIN_PATH: &str = "/login";

/// Actions offered inside each section and the permission each one needs.
fn section_actions(resource: Resource) -> &'static [Permission] {
    match resource {
        Resource::Dashboard => &[Permission::ViewRegionalData, Permission::ViewLocalData],
        Resource::Users => &[
            Permission::CreateUsers,
            Permission::EditUsers,
            Permission::DeleteUsers,
            Permission::ManageRoles,
        ],
        Resource::Events => &[
            Permission::CreateEvents,
            Permission::EditEvents,
            Permission::DeleteEvents,
        ],
        Resource::Attendances => &[
            Permission::RegisterAttendance,
            Permission::ManageAttendances,
        ],
        Resource::Teams => &[
            Permission::CreateTeams,
            Permission::EditTeams,
            Permission::ManageTeams,
        ],
        Resource::Questionnaires => &[
            Permission::AnswerQuestionnaires,
            Permission::CreateQuestionnaires,
            Permission::GradeQuestionnaires,
            Permission::ViewQuestionnaireResults,
        ],
        Resource::Ranking => &[Permission::ViewDetailedRanking, Permission::ManageRanking],
        Resource::Reports => &[
            Permission::GenerateReports,
            Permission::ExportReports,
            Permission::ViewMinistryReports,
        ],
        Resource::Settings => &[Permission::ManageSettings],
    }
}

/// Returns the tags of the section actions the live member may use.
pub fn visible_actions(authorization: &AuthorizationService, resource: Resource) -> Vec<String> {
    section_actions(resource)
        .iter()
        .filter_map(|permission| {
            InlineGuard::permission(*permission)
                .show(authorization, permission.as_str().to_owned())
        })
        .collect()
}

/// Sections nobody may open still log visitors in first.
fn unknown_section_decision(phase: &SessionPhase) -> PageDecision {
    match phase {
        SessionPhase::Authenticated(_) => PageDecision::AccessDenied,
        SessionPhase::Resolving => PageDecision::Loading,
        SessionPhase::Unauthenticated | SessionPhase::ResolutionFailed => {
            PageDecision::RedirectToLogin
        }
    }
}

pub async fn section_handler(State(state): State<AppState>, Path(tag): Path<String>) -> Response {
    let authorization = &state.authorization_service;
    let resource = Resource::from_str(tag.as_str()).ok();
    let decision = match resource {
        Some(resource) => PageGuard::resource(resource).evaluate(authorization),
        None => unknown_section_decision(&authorization.phase()),
    };

    match (decision, resource) {
        (PageDecision::Render, Some(resource)) => Json(SectionResponse {
            resource: resource.as_str().to_owned(),
            title: resource.title().to_owned(),
            actions: visible_actions(authorization, resource),
        })
        .into_response(),
        (PageDecision::Loading, _) => (
            StatusCode::ACCEPTED,
            Json(PendingResponse { status: "resolving" }),
        )
            .into_response(),
        (PageDecision::RedirectToLogin, _) => Redirect::to(LOGIN_PATH).into_response(),
        (PageDecision::AccessDenied, _) | (PageDecision::Render, None) => ApiError(
            AppError::Forbidden(format!("section '{tag}' is not available to this member")),
        )
        .into_response(),
    }
}
