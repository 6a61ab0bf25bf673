//! Identity provider backed by a GoTrue-compatible auth REST API.
//!
//! The provider keeps the live session of this process and publishes a
//! [`SessionEvent`] for every change, including sessions the server
//! invalidates during a refresh.

use async_trait::async_trait;
use cantoria_application::{IdentityProvider, SessionEvent};
use cantoria_core::{AppError, AppResult, SessionIdentity};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};
use url::Url;

const EVENT_CAPACITY: usize = 32;

/// HTTP implementation of the identity provider port.
pub struct HttpIdentityProvider {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: String,
    live: RwLock<Option<SessionIdentity>>,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: AuthUser,
}

/// Sign-up answers with a bare user when confirmation is pending, or with a
/// session wrapping the user otherwise.
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorResponse {
    fn detail(self) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .unwrap_or_else(|| "no detail".to_owned())
    }
}

impl HttpIdentityProvider {
    /// Creates a provider for the auth server at `base_url`.
    #[must_use]
    pub fn new(http_client: reqwest::Client, mut base_url: Url, api_key: impl Into<String>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            http_client,
            base_url,
            api_key: api_key.into(),
            live: RwLock::new(None),
            events,
        }
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("invalid identity endpoint '{path}': {error}"))
        })
    }

    fn token_endpoint(&self, grant_type: &str) -> AppResult<Url> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    fn publish(&self, event: SessionEvent) {
        let kind = event.as_str();
        if self.events.send(event).is_err() {
            debug!(event = kind, "no session event subscribers");
        }
    }

    async fn post_json(
        &self,
        url: Url,
        body: serde_json::Value,
        bearer: Option<&str>,
    ) -> AppResult<reqwest::Response> {
        let mut request = self
            .http_client
            .post(url)
            .header("apikey", self.api_key.as_str())
            .json(&body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("identity request failed: {error}")))
    }

    async fn request_token(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> AppResult<SessionIdentity> {
        let response = self
            .post_json(self.token_endpoint(grant_type)?, body, None)
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = failure_detail(response).await;
            return Err(credential_failure(status, detail));
        }

        let token = response.json::<TokenResponse>().await.map_err(|error| {
            AppError::Internal(format!("failed to decode token response: {error}"))
        })?;

        Ok(session_from_token(token))
    }
}

async fn failure_detail(response: reqwest::Response) -> String {
    response
        .json::<ErrorResponse>()
        .await
        .unwrap_or_default()
        .detail()
}

fn session_from_token(token: TokenResponse) -> SessionIdentity {
    let email = token.user.email.filter(|email| !email.trim().is_empty());
    SessionIdentity::new(
        token.user.id,
        email,
        token.access_token,
        token.refresh_token,
    )
}

fn credential_failure(status: StatusCode, detail: String) -> AppError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::Unauthorized(detail)
        }
        _ => AppError::Internal(format!("identity server answered {status}: {detail}")),
    }
}

fn sign_up_failure(status: StatusCode, detail: String) -> AppError {
    match status {
        StatusCode::CONFLICT => AppError::Conflict(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
            if detail.to_ascii_lowercase().contains("already registered") =>
        {
            AppError::Conflict(detail)
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => AppError::Validation(detail),
        _ => AppError::Internal(format!("identity server answered {status}: {detail}")),
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<String> {
        let response = self
            .post_json(
                self.endpoint("auth/v1/signup")?,
                json!({ "email": email, "password": password }),
                None,
            )
            .await?;
        let status = response.status();
        if !status.is_success() {
            let detail = failure_detail(response).await;
            return Err(sign_up_failure(status, detail));
        }

        let created = response.json::<SignUpResponse>().await.map_err(|error| {
            AppError::Internal(format!("failed to decode sign-up response: {error}"))
        })?;

        created
            .user
            .map(|user| user.id)
            .or(created.id)
            .ok_or_else(|| AppError::Internal("sign-up response carried no user id".to_owned()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionIdentity> {
        let session = self
            .request_token("password", json!({ "email": email, "password": password }))
            .await?;

        *self.live.write().await = Some(session.clone());
        self.publish(SessionEvent::SignedIn(session.clone()));

        Ok(session)
    }

    async fn sign_out(&self) -> AppResult<()> {
        let ended = self.live.write().await.take();
        self.publish(SessionEvent::SignedOut);

        let Some(ended) = ended else {
            return Ok(());
        };
        let result = self
            .post_json(
                self.endpoint("auth/v1/logout")?,
                json!({}),
                Some(ended.access_token()),
            )
            .await;
        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "identity server rejected sign-out");
            }
            Ok(_) => {}
            Err(error) => warn!(error = %error, "identity server sign-out failed"),
        }

        Ok(())
    }

    async fn refresh_session(&self) -> AppResult<SessionIdentity> {
        let refresh_token = self
            .live
            .read()
            .await
            .as_ref()
            .and_then(|session| session.refresh_token().map(str::to_owned))
            .ok_or_else(|| AppError::Unauthorized("no refreshable session".to_owned()))?;

        match self
            .request_token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
        {
            Ok(session) => {
                *self.live.write().await = Some(session.clone());
                self.publish(SessionEvent::TokenRefreshed(session.clone()));
                Ok(session)
            }
            Err(AppError::Unauthorized(detail)) => {
                warn!(detail = %detail, "identity server invalidated the session");
                *self.live.write().await = None;
                self.publish(SessionEvent::SignedOut);
                Err(AppError::Unauthorized(detail))
            }
            Err(error) => Err(error),
        }
    }

    async fn current_session(&self) -> AppResult<Option<SessionIdentity>> {
        let Some(session) = self.live.read().await.clone() else {
            return Ok(None);
        };

        let response = self
            .http_client
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(session.access_token())
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("identity request failed: {error}")))?;

        match response.status() {
            status if status.is_success() => {
                let user = response.json::<AuthUser>().await.map_err(|error| {
                    AppError::Internal(format!("failed to decode user response: {error}"))
                })?;
                Ok(Some(SessionIdentity::new(
                    user.id,
                    user.email.filter(|email| !email.trim().is_empty()),
                    session.access_token(),
                    session.refresh_token().map(str::to_owned),
                )))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                *self.live.write().await = None;
                Ok(None)
            }
            status => {
                let detail = failure_detail(response).await;
                Err(AppError::Internal(format!(
                    "identity server answered {status}: {detail}"
                )))
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use cantoria_application::IdentityProvider;
    use cantoria_core::AppError;
    use reqwest::StatusCode;
    use url::Url;

    use super::{
        AuthUser, HttpIdentityProvider, TokenResponse, credential_failure, session_from_token,
        sign_up_failure,
    };

    fn provider(base: &str) -> HttpIdentityProvider {
        let Ok(url) = Url::parse(base) else {
            panic!("test url '{base}' must parse");
        };
        HttpIdentityProvider::new(reqwest::Client::new(), url, "anon-key")
    }

    #[test]
    fn endpoints_keep_base_path() {
        let nested = provider("https://auth.coral.org/projeto");
        let root = provider("https://auth.coral.org/");

        assert_eq!(
            nested.endpoint("auth/v1/user").ok().map(String::from),
            Some("https://auth.coral.org/projeto/auth/v1/user".to_owned())
        );
        assert_eq!(
            root.token_endpoint("password").ok().map(String::from),
            Some("https://auth.coral.org/auth/v1/token?grant_type=password".to_owned())
        );
    }

    #[test]
    fn token_without_email_yields_session_without_email() {
        let session = session_from_token(TokenResponse {
            access_token: "access".to_owned(),
            refresh_token: Some("refresh".to_owned()),
            user: AuthUser {
                id: "0b7c2a52-4f6c-4c59-9a43-2f1d1f7b8e11".to_owned(),
                email: Some(String::new()),
            },
        });

        assert_eq!(session.email(), None);
        assert_eq!(session.refresh_token(), Some("refresh"));
    }

    #[test]
    fn failures_map_to_application_errors() {
        assert!(matches!(
            credential_failure(StatusCode::BAD_REQUEST, "Invalid login credentials".to_owned()),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            credential_failure(StatusCode::BAD_GATEWAY, "upstream".to_owned()),
            AppError::Internal(_)
        ));
        assert!(matches!(
            sign_up_failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                "User already registered".to_owned()
            ),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            sign_up_failure(StatusCode::UNPROCESSABLE_ENTITY, "weak password".to_owned()),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn without_live_session_nothing_is_requested() {
        let provider = provider("http://127.0.0.1:9/");

        assert_eq!(provider.current_session().await.ok().flatten(), None);
        assert!(matches!(
            provider.refresh_session().await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(provider.sign_out().await.is_ok());
    }
}
