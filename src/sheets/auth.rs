use crate::error::{AppError, Result};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, RefreshToken, Scope, StandardRevocableToken,
    TokenResponse, TokenUrl,
    basic::{
        BasicClient, BasicErrorResponse, BasicRevocationErrorResponse,
        BasicTokenIntrospectionResponse, BasicTokenResponse,
    },
};
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use url::Url;
use yup_oauth2::ApplicationSecret;

pub(crate) const GOOGLE_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Delegated access to the Google APIs, persisted between runs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub(crate) struct Grant {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry time as seconds since Unix epoch
    pub expires_at: i64,
}

impl Grant {
    /// Check if the access token is expired or about to expire (within 5 minutes)
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.expires_at < (now + 300)
    }

    fn from_response(
        token_result: &BasicTokenResponse,
        fallback_refresh_token: Option<&str>,
    ) -> Self {
        let refresh_token = token_result
            .refresh_token()
            .map(|token| token.secret().clone())
            .or_else(|| fallback_refresh_token.map(str::to_string));

        let expires_in = token_result
            .expires_in()
            .map(|d| d.as_secs() as i64)
            .unwrap_or(3600);

        Self {
            access_token: token_result.access_token().secret().clone(),
            refresh_token,
            expires_at: chrono::Utc::now().timestamp() + expires_in,
        }
    }
}

/// Source of the one-time authorization code issued after consent.
///
/// Implementations may block indefinitely; there is no timeout.
pub trait AuthCodePrompt {
    fn authorization_code(&self, consent_url: &Url) -> Result<String>;
}

/// Prints the consent URL and reads the code from the controlling terminal.
pub struct TerminalPrompt;

impl AuthCodePrompt for TerminalPrompt {
    fn authorization_code(&self, consent_url: &Url) -> Result<String> {
        println!(
            "Open this URL in your browser, then enter the authorization code:\n{}",
            consent_url
        );
        println!();

        let code: String = dialoguer::Input::new()
            .with_prompt("Authorization code")
            .interact_text()
            .map_err(|e| AppError::Auth(format!("Failed to read authorization code: {}", e)))?;

        Ok(code.trim().to_string())
    }
}

type ConfiguredClient = Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,    // HasAuthUrl
    EndpointNotSet, // HasDeviceAuthUrl
    EndpointNotSet, // HasIntrospectionUrl
    EndpointNotSet, // HasRevocationUrl
    EndpointSet,    // HasTokenUrl
>;

pub(crate) struct GoogleAuth {
    client: ConfiguredClient,
    http_client: reqwest::Client,
    scopes: Vec<String>,
    token_path: PathBuf,
}

impl GoogleAuth {
    pub(crate) fn new(
        secret: &ApplicationSecret,
        scopes: &[String],
        token_path: PathBuf,
    ) -> Result<Self> {
        let auth_url = AuthUrl::new(secret.auth_uri.clone())
            .map_err(|e| AppError::Auth(format!("Invalid auth URL: {}", e)))?;
        let token_url = TokenUrl::new(secret.token_uri.clone())
            .map_err(|e| AppError::Auth(format!("Invalid token URL: {}", e)))?;

        let redirect_url = secret
            .redirect_uris
            .first()
            .cloned()
            .unwrap_or_else(|| GOOGLE_REDIRECT_URI.to_string());

        let client = BasicClient::new(ClientId::new(secret.client_id.clone()))
            .set_client_secret(ClientSecret::new(secret.client_secret.clone()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_auth_type(AuthType::RequestBody)
            .set_redirect_uri(
                RedirectUrl::new(redirect_url)
                    .map_err(|e| AppError::Auth(format!("Invalid redirect URL: {}", e)))?,
            );

        let http_client = reqwest::ClientBuilder::new()
            .redirect(Policy::none())
            .build()
            .map_err(|e| AppError::Auth(format!("Failed to build reqwest client: {}", e)))?;

        Ok(Self {
            client,
            http_client,
            scopes: scopes.to_vec(),
            token_path,
        })
    }

    /// Consent URL requesting every configured scope with offline access.
    pub(crate) fn consent_url(&self) -> Url {
        let scopes = self
            .scopes
            .iter()
            .map(|s| Scope::new(s.to_string()))
            .collect::<Vec<Scope>>();

        let (url, _csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(scopes)
            .add_extra_param("access_type", "offline")
            .url();

        url
    }

    /// Get a usable grant, reusing or refreshing the persisted one when possible
    /// and falling back to the interactive consent flow otherwise.
    #[instrument(name = "Authorizing with Google", skip_all)]
    pub(crate) async fn authorize<P: AuthCodePrompt>(&self, prompt: &P) -> Result<Grant> {
        let Some(grant) = self.load_grant() else {
            debug!("No usable cached grant, starting consent flow");
            return self.authenticate(prompt).await;
        };

        if !grant.is_expired() {
            debug!("Using cached Google grant");
            return Ok(grant);
        }

        let Some(refresh_token) = grant.refresh_token.as_deref() else {
            debug!("Cached grant expired without a refresh token, starting consent flow");
            return self.authenticate(prompt).await;
        };

        debug!("Access token expired, refreshing...");

        // Only a failed exchange falls back to consent; a failed save is fatal.
        match self.refresh(refresh_token).await {
            Ok(token_result) => {
                debug!("Token refresh successful");
                let refreshed = Grant::from_response(&token_result, Some(refresh_token));
                self.save_grant(&refreshed)?;
                Ok(refreshed)
            }
            Err(e) => {
                debug!("Token refresh failed ({}), re-authenticating...", e);
                self.authenticate(prompt).await
            }
        }
    }

    async fn authenticate<P: AuthCodePrompt>(&self, prompt: &P) -> Result<Grant> {
        let consent_url = self.consent_url();
        let code = prompt.authorization_code(&consent_url)?;

        let token_result = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to exchange code: {:?}", e)))?;

        let grant = Grant::from_response(&token_result, None);
        self.save_grant(&grant)?;
        info!(path = ?self.token_path, "Saved credential file");

        Ok(grant)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<BasicTokenResponse> {
        self.client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| AppError::Auth(format!("Failed to refresh token: {:?}", e)))
    }

    /// Read the persisted grant. Unreadable or undecodable files count as absent.
    fn load_grant(&self) -> Option<Grant> {
        let contents = match fs::read_to_string(&self.token_path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = ?self.token_path, "Cannot read credential file: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(grant) => Some(grant),
            Err(e) => {
                warn!(path = ?self.token_path, "Ignoring invalid credential file: {}", e);
                None
            }
        }
    }

    fn save_grant(&self, grant: &Grant) -> Result<()> {
        if let Some(parent) = self.token_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Auth(format!("Failed to create credential directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(grant)?;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.token_path)
            .map_err(|e| AppError::Auth(format!("Failed to create credential file: {}", e)))?;

        file.write_all(contents.as_bytes())
            .map_err(|e| AppError::Auth(format!("Failed to write credential file: {}", e)))?;

        Ok(())
    }
}

/// Read the OAuth client configuration (`installed` or `web` shape).
pub(crate) async fn load_application_secret(path: &Path) -> Result<ApplicationSecret> {
    yup_oauth2::read_application_secret(path)
        .await
        .map_err(|e| {
            AppError::Config(format!("Unable to read client secret file {:?}: {}", path, e))
        })
}

/// Delete the persisted grant so the next run asks for consent again
#[instrument(name = "Clearing Google credentials", skip_all)]
pub fn clear_tokens(token_path: &Path) -> Result<()> {
    if !token_path.exists() {
        debug!("No Google credentials to clear");
        return Ok(());
    }

    fs::remove_file(token_path)
        .map_err(|e| AppError::Auth(format!("Failed to delete credential file: {}", e)))?;
    info!(path = ?token_path, "Cleared Google credentials");

    Ok(())
}
