use crate::config::AuthConfig;
use crate::{Result, SorterError};
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

/// An OAuth access token plus what's needed to renew it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scope: String,
}

impl AccessToken {
    /// True if the token expires within the next minute.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now() + ChronoDuration::seconds(60)
    }

    /// Serialize token to JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize token from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
    #[serde(default)]
    scope: String,
}

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

struct CallbackState {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<Result<String>>>>,
}

const LOGIN_COMPLETE_PAGE: &str = "<html><body><h1>Login Completed!</h1>\
    <p>You can close this window now.</p></body></html>";
const LOGIN_FAILED_PAGE: &str = "<html><body><h1>Login Failed</h1>\
    <p>Return to the terminal for details.</p></body></html>";

/// Authorization-code OAuth flow for a command line app.
///
/// The user opens [`auth_url`](Self::auth_url) in a browser; the provider
/// redirects back to a short-lived local listener started by
/// [`authorize`](Self::authorize), which hands the code over for exchange.
pub struct Authenticator {
    config: AuthConfig,
    http: Arc<dyn HttpClient + Send + Sync>,
    state: String,
}

impl Authenticator {
    pub fn new(config: AuthConfig, http: Box<dyn HttpClient + Send + Sync>) -> Self {
        Self {
            config,
            http: Arc::from(http),
            state: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// The URL the user must visit to grant permissions.
    pub fn auth_url(&self) -> String {
        format!(
            "{}/authorize?response_type=code&client_id={}&scope={}&redirect_uri={}&state={}",
            self.config.accounts_url,
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.scopes.join(" ")),
            urlencoding::encode(&self.config.redirect_url),
            urlencoding::encode(&self.state),
        )
    }

    /// Wait for the browser redirect and exchange its code for a token.
    ///
    /// The callback listener only lives for the duration of this call.
    pub async fn authorize(&self, timeout: Duration) -> Result<AccessToken> {
        let (code_tx, code_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = Arc::new(CallbackState {
            expected_state: self.state.clone(),
            sender: Mutex::new(Some(code_tx)),
        });
        let app = Router::new()
            .route("/callback", get(handle_callback))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", self.config.port)).await?;
        log::debug!("Callback listener on {}", listener.local_addr()?);
        let server = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                log::error!("Callback server failed: {e}");
            }
        });

        let outcome = tokio::time::timeout(timeout, code_rx).await;
        let _ = shutdown_tx.send(());
        if let Err(e) = server.await {
            log::warn!("Callback server task ended abnormally: {e}");
        }

        let code = match outcome {
            Ok(Ok(code)) => code?,
            Ok(Err(_)) => return Err(SorterError::Auth("callback listener closed".to_string())),
            Err(_) => return Err(SorterError::DeadlineExceeded),
        };

        self.exchange_code(&code).await
    }

    /// Trade an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        let form = format!(
            "grant_type=authorization_code&code={}&redirect_uri={}",
            urlencoding::encode(code),
            urlencoding::encode(&self.config.redirect_url)
        );
        self.request_token(form, None).await
    }

    /// Obtain a fresh access token. The refresh token is kept if the
    /// provider doesn't rotate it.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken> {
        let form = format!(
            "grant_type=refresh_token&refresh_token={}",
            urlencoding::encode(refresh_token)
        );
        self.request_token(form, Some(refresh_token)).await
    }

    async fn request_token(
        &self,
        form: String,
        previous_refresh: Option<&str>,
    ) -> Result<AccessToken> {
        let token_url = format!("{}/api/token", self.config.accounts_url);
        let url = token_url
            .parse::<Url>()
            .map_err(|e| SorterError::Config(format!("Invalid accounts URL: {e}")))?;
        let credentials = general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));

        let mut request = Request::new(Method::Post, url);
        request.set_body(form);
        request.insert_header("Content-Type", "application/x-www-form-urlencoded");
        request.insert_header("Authorization", &format!("Basic {credentials}"));

        let mut response = self
            .http
            .send(request)
            .await
            .map_err(|e| SorterError::Http(e.to_string()))?;
        let body = response
            .body_string()
            .await
            .map_err(|e| SorterError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SorterError::Auth(format!(
                "token endpoint returned {}: {body}",
                response.status()
            )));
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| SorterError::Parse(e.to_string()))?;
        Ok(AccessToken {
            access_token: token.access_token,
            refresh_token: token
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
            scope: token.scope,
        })
    }
}

async fn handle_callback(
    State(state): State<Arc<CallbackState>>,
    Query(params): Query<CallbackParams>,
) -> Html<&'static str> {
    let result = callback_result(&state.expected_state, params);
    let page = if result.is_ok() {
        LOGIN_COMPLETE_PAGE
    } else {
        LOGIN_FAILED_PAGE
    };

    let sender = state
        .sender
        .lock()
        .ok()
        .and_then(|mut sender| sender.take());
    match sender {
        Some(sender) => {
            let _ = sender.send(result);
        }
        None => log::debug!("Ignoring repeated callback request"),
    }
    Html(page)
}

fn callback_result(expected_state: &str, params: CallbackParams) -> Result<String> {
    if let Some(error) = params.error {
        return Err(SorterError::Auth(format!("authorization denied: {error}")));
    }
    if params.state.as_deref() != Some(expected_state) {
        return Err(SorterError::Auth("state mismatch in callback".to_string()));
    }
    params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| SorterError::Auth("callback carried no code".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(str::to_string),
            state: state.map(str::to_string),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_callback_accepts_matching_state() {
        let code = callback_result("s1", params(Some("abc"), Some("s1"), None)).unwrap();
        assert_eq!(code, "abc");
    }

    #[test]
    fn test_callback_rejects_wrong_state_and_denial() {
        assert!(matches!(
            callback_result("s1", params(Some("abc"), Some("s2"), None)),
            Err(SorterError::Auth(_))
        ));
        assert!(matches!(
            callback_result("s1", params(None, Some("s1"), Some("access_denied"))),
            Err(SorterError::Auth(_))
        ));
        assert!(matches!(
            callback_result("s1", params(Some(""), Some("s1"), None)),
            Err(SorterError::Auth(_))
        ));
    }

    #[test]
    fn test_token_expiry() {
        let fresh = AccessToken {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at: Utc::now() + ChronoDuration::hours(1),
            scope: String::new(),
        };
        assert!(!fresh.is_expired());
        let stale = AccessToken {
            expires_at: Utc::now() + ChronoDuration::seconds(30),
            ..fresh.clone()
        };
        assert!(stale.is_expired());
        assert_eq!(AccessToken::from_json(&fresh.to_json().unwrap()).unwrap(), fresh);
    }
}
