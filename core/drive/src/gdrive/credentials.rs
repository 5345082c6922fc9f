//! Credential provider: persisted token, refresh, and the interactive
//! installed-app authorization flow.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use sharesweep_common::{Error, Result, Secret};

use super::auth::{
    AuthConfig, AuthManager, TokenManager, Tokens, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL,
};

/// How long the callback server may drain open connections once the
/// authorization result arrived.
const CALLBACK_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Page shown in the browser once the callback was received.
const CALLBACK_RESPONSE_BODY: &str =
    "The authentication flow has completed. You may close this window.";

/// OAuth2 client registration, as downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: Secret,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

/// Top-level layout of a client secrets file.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    #[serde(default)]
    installed: Option<ClientSecrets>,
    #[serde(default)]
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse a client secrets document (`installed` or `web` application).
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(json)?;
        file.installed.or(file.web).ok_or_else(|| {
            Error::Config(
                "Client secrets must contain an 'installed' or 'web' section".to_string(),
            )
        })
    }

    /// Load a client secrets file from disk.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Config(format!(
                "Failed to read client secrets {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// Build an OAuth2 configuration for the given redirect URL.
    pub fn auth_config(&self, redirect_url: impl Into<String>) -> AuthConfig {
        AuthConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            auth_url: self.auth_uri.clone(),
            token_url: self.token_uri.clone(),
            redirect_url: redirect_url.into(),
        }
    }
}

/// JSON file holding the persisted [`Tokens`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored tokens.
    ///
    /// A missing or unreadable token file yields `None` so the caller falls
    /// back to the authorization flow.
    pub async fn load(&self) -> Result<Option<Tokens>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&json) {
            Ok(tokens) => Ok(Some(tokens)),
            Err(e) => {
                warn!("Ignoring unreadable token file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    /// Persist tokens, replacing any previous file.
    pub async fn save(&self, tokens: &Tokens) -> Result<()> {
        let json = serde_json::to_string_pretty(tokens)?;
        tokio::fs::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        debug!("Saved token to {}", self.path.display());
        Ok(())
    }
}

/// Query parameters delivered to the loopback redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCallback {
    pub code: String,
    pub state: String,
}

/// Interpret the query of a redirect hit, e.g. `?state=..&code=..&scope=..`.
///
/// Returns `Ok(None)` for hits that carry no authorization result.
///
/// # Errors
/// - The authorization server reported an error (user denied access)
/// - A code arrived without its state
pub fn parse_callback(params: &HashMap<String, String>) -> Result<Option<AuthCallback>> {
    if let Some(error) = params.get("error") {
        return Err(Error::Authentication(format!(
            "Authorization denied: {}",
            error
        )));
    }

    match (params.get("code"), params.get("state")) {
        (Some(code), Some(state)) => Ok(Some(AuthCallback {
            code: code.clone(),
            state: state.clone(),
        })),
        (Some(_), None) => Err(Error::Authentication(
            "Callback is missing the state parameter".to_string(),
        )),
        _ => Ok(None),
    }
}

/// Slot for the first decisive callback outcome.
type CallbackSlot = Arc<Mutex<Option<oneshot::Sender<Result<AuthCallback>>>>>;

async fn handle_callback(
    State(slot): State<CallbackSlot>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    let (status, body, outcome) = match parse_callback(&params) {
        Ok(Some(callback)) => (StatusCode::OK, CALLBACK_RESPONSE_BODY, Ok(callback)),
        Ok(None) => return (StatusCode::NOT_FOUND, "Not found"),
        Err(e) => (StatusCode::BAD_REQUEST, "Authorization failed.", Err(e)),
    };

    let sender = slot.lock().ok().and_then(|mut pending| pending.take());
    match sender {
        Some(sender) => {
            let _ = sender.send(outcome);
        }
        None => debug!("Ignoring repeated OAuth2 callback"),
    }

    (status, body)
}

/// Serve the loopback redirect on `listener` until a hit carries the
/// authorization result, then shut the server down.
async fn wait_for_callback(listener: TcpListener) -> Result<AuthCallback> {
    let (result_tx, result_rx) = oneshot::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let slot: CallbackSlot = Arc::new(Mutex::new(Some(result_tx)));
    let app = Router::new()
        .route("/", get(handle_callback))
        .with_state(slot);

    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });
    let abort = server.abort_handle();

    let outcome = result_rx.await.map_err(|_| {
        Error::Authentication("Callback server stopped before authorization completed".to_string())
    });

    let _ = stop_tx.send(());
    match tokio::time::timeout(CALLBACK_SHUTDOWN_GRACE, server).await {
        Ok(Ok(Ok(()))) => debug!("OAuth2 callback server stopped"),
        Ok(Ok(Err(e))) => warn!("OAuth2 callback server failed: {}", e),
        Ok(Err(e)) => warn!("OAuth2 callback server task failed: {}", e),
        Err(_) => {
            debug!("OAuth2 callback server still has open connections, aborting");
            abort.abort();
        }
    }

    outcome?
}

/// Default [`CredentialProvider`] URL handler: print the URL and try to
/// open it in a browser.
pub fn launch_browser(url: &str) {
    println!(
        "Please visit this URL to authorize this application: {}",
        url
    );
    if let Err(e) = open::that(url) {
        debug!("Could not open browser: {}", e);
    }
}

/// Produces an initialized [`TokenManager`] from persisted state, running
/// the interactive flow when needed.
pub struct CredentialProvider {
    secrets: ClientSecrets,
    store: TokenStore,
    redirect_port: u16,
    open_url: Box<dyn Fn(&str) + Send + Sync>,
}

impl CredentialProvider {
    /// Create a provider. `redirect_port` 0 picks an ephemeral port for the
    /// loopback redirect.
    pub fn new(secrets: ClientSecrets, store: TokenStore, redirect_port: u16) -> Self {
        Self {
            secrets,
            store,
            redirect_port,
            open_url: Box::new(launch_browser),
        }
    }

    /// Replace how the authorization URL is handed to the user.
    pub fn with_url_handler(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.open_url = Box::new(handler);
        self
    }

    /// Load, refresh or obtain tokens and persist them.
    ///
    /// # Postconditions
    /// - The token file holds the tokens the returned manager starts with
    ///
    /// # Errors
    /// - Authorization flow failed or was denied
    /// - Token file could not be written
    pub async fn initialize(&self) -> Result<Arc<TokenManager>> {
        let tokens = match self.store.load().await? {
            Some(tokens) if !tokens.is_expired() => {
                debug!("Using stored token from {}", self.store.path().display());
                tokens
            }
            Some(tokens) => match self.refresh(&tokens).await {
                Ok(refreshed) => {
                    self.store.save(&refreshed).await?;
                    refreshed
                }
                Err(e) => {
                    warn!("Stored token could not be refreshed: {}", e);
                    self.login().await?
                }
            },
            None => self.login().await?,
        };

        let auth_manager = AuthManager::new(self.secrets.auth_config(self.fallback_redirect()))?;
        let manager = TokenManager::new(auth_manager, tokens).with_store(self.store.clone());
        Ok(Arc::new(manager))
    }

    /// Run the interactive authorization flow and persist the result.
    pub async fn login(&self) -> Result<Tokens> {
        let listener = TcpListener::bind(("127.0.0.1", self.redirect_port)).await?;
        let port = listener.local_addr()?.port();
        let redirect_url = format!("http://localhost:{}/", port);

        let auth_manager = AuthManager::new(self.secrets.auth_config(redirect_url))?;
        let (url, csrf_token) = auth_manager.authorization_url();

        (self.open_url)(&url);

        let callback = wait_for_callback(listener).await?;
        if callback.state != csrf_token {
            return Err(Error::Authentication(
                "CSRF state mismatch in authorization callback".to_string(),
            ));
        }

        let tokens = auth_manager.exchange_code(&callback.code).await?;
        self.store.save(&tokens).await?;
        info!("Authorization complete, token saved to {}", self.store.path().display());

        Ok(tokens)
    }

    async fn refresh(&self, tokens: &Tokens) -> Result<Tokens> {
        info!("Refreshing stored access token");
        let auth_manager = AuthManager::new(self.secrets.auth_config(self.fallback_redirect()))?;
        auth_manager.refresh_token(&tokens.refresh_token).await
    }

    /// Redirect URL for clients that never run the authorization flow.
    fn fallback_redirect(&self) -> String {
        self.secrets
            .redirect_uris
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost/".to_string())
    }
}
