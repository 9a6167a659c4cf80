//! Identity provider client (Supabase Auth / GoTrue REST API)
//!
//! Every request carries the project's anon key in `apikey`; user-scoped
//! calls add the user's access token as a bearer token.

use chrono::Utc;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::entity::{
    registration::{OtpType, Registration, SignUpOutcome},
    session::Session,
    user::AuthUser,
};
use crate::domain::repository::IdentityProvider;
use crate::domain::value_object::{email::Email, password::NewPassword};
use crate::error::{AuthError, AuthResult};

/// Token endpoint response. Older servers omit `expires_at`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| now + self.expires_in.unwrap_or(3600));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            user: self.user,
        }
    }
}

/// The provider has used three error shapes over time
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error_code: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }

    fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(match self.error_description {
            // `{error, error_description}` puts the code in `error`
            Some(_) => self.error.as_deref(),
            None => None,
        })
    }
}

#[derive(Clone)]
pub struct SupabaseAuthClient {
    http: reqwest::Client,
    auth_url: String,
    anon_key: SecretString,
}

impl SupabaseAuthClient {
    /// `project_url` is the provider base URL, e.g. `https://abc.supabase.co`
    pub fn new(http: reqwest::Client, project_url: &str, anon_key: SecretString) -> Self {
        Self {
            http,
            auth_url: format!("{}/auth/v1", project_url.trim_end_matches('/')),
            anon_key,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.auth_url, path))
            .header("apikey", self.anon_key.expose_secret())
    }

    /// Request authorised as the user owning `access_token`
    fn user_request(&self, method: Method, path: &str, access_token: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(access_token)
    }

    async fn send(request: RequestBuilder) -> AuthResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();
        let message = body
            .message()
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());

        Err(AuthError::provider(status.as_u16(), body.code(), message))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> AuthResult<T> {
        Ok(Self::send(request).await?.json::<T>().await?)
    }

    async fn token(&self, grant_type: &str, body: serde_json::Value) -> AuthResult<Session> {
        let request = self
            .request(Method::POST, "/token")
            .query(&[("grant_type", grant_type)])
            .json(&body);
        let token: TokenResponse = Self::send_json(request).await?;
        Ok(token.into_session(Utc::now().timestamp()))
    }
}

fn captcha_meta(captcha_token: Option<&str>) -> serde_json::Value {
    match captcha_token {
        Some(token) => json!({ "captcha_token": token }),
        None => json!({}),
    }
}

impl IdentityProvider for SupabaseAuthClient {
    async fn sign_up(&self, registration: &Registration) -> AuthResult<SignUpOutcome> {
        let mut data = serde_json::Map::new();
        if let Some(name) = &registration.full_name {
            data.insert("full_name".to_string(), json!(name));
        }

        let request = self
            .request(Method::POST, "/signup")
            .query(&[("redirect_to", registration.email_redirect_to.as_str())])
            .json(&json!({
                "email": registration.email.as_str(),
                "password": registration.password.expose(),
                "data": data,
                "gotrue_meta_security": captcha_meta(registration.captcha_token.as_deref()),
            }));

        // Auto-confirm projects answer with a token response, others with the user
        let body: serde_json::Value = Self::send_json(request).await?;
        if body.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(body)
                .map_err(|e| AuthError::Internal(format!("malformed sign-up session: {e}")))?;
            Ok(SignUpOutcome::SessionCreated(
                token.into_session(Utc::now().timestamp()),
            ))
        } else {
            let user: AuthUser = serde_json::from_value(body)
                .map_err(|e| AuthError::Internal(format!("malformed sign-up user: {e}")))?;
            Ok(SignUpOutcome::ConfirmationSent(user))
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
        captcha_token: Option<&str>,
    ) -> AuthResult<Session> {
        self.token(
            "password",
            json!({
                "email": email.as_str(),
                "password": password,
                "gotrue_meta_security": captcha_meta(captcha_token),
            }),
        )
        .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> AuthResult<Session> {
        self.token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn get_user(&self, access_token: &str) -> AuthResult<AuthUser> {
        Self::send_json(self.user_request(Method::GET, "/user", access_token)).await
    }

    async fn send_password_reset(
        &self,
        email: &Email,
        redirect_to: &str,
        captcha_token: Option<&str>,
    ) -> AuthResult<()> {
        let request = self
            .request(Method::POST, "/recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({
                "email": email.as_str(),
                "gotrue_meta_security": captcha_meta(captcha_token),
            }));
        Self::send(request).await?;
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        password: &NewPassword,
    ) -> AuthResult<AuthUser> {
        let request = self
            .user_request(Method::PUT, "/user", access_token)
            .json(&json!({ "password": password.expose() }));
        Self::send_json(request).await
    }

    async fn verify_otp(&self, token_hash: &str, otp_type: OtpType) -> AuthResult<Session> {
        let request = self.request(Method::POST, "/verify").json(&json!({
            "type": otp_type.as_str(),
            "token_hash": token_hash,
        }));
        let token: TokenResponse = Self::send_json(request).await?;
        Ok(token.into_session(Utc::now().timestamp()))
    }

    async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let request = self
            .user_request(Method::POST, "/logout", access_token)
            .query(&[("scope", "global")]);
        match Self::send(request).await {
            Ok(_) => Ok(()),
            // Already gone
            Err(AuthError::Provider { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::NOT_FOUND.as_u16() =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for SupabaseAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAuthClient")
            .field("auth_url", &self.auth_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_without_expires_at() {
        let json = r#"{
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {"id": "5f0c1b7e-8a57-4c52-9d5b-0e1f2a3b4c5d", "email": "u@example.com"}
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        let session = token.into_session(1_000);
        assert_eq!(session.expires_at, 4_600);
    }

    #[test]
    fn test_error_body_shapes() {
        let oauth: ErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(oauth.message(), Some("Invalid login credentials"));
        assert_eq!(oauth.code(), Some("invalid_grant"));

        let modern: ErrorBody = serde_json::from_str(
            r#"{"code":422,"error_code":"weak_password","msg":"Password should be at least 6 characters."}"#,
        )
        .unwrap();
        assert_eq!(modern.code(), Some("weak_password"));
        assert_eq!(
            modern.message(),
            Some("Password should be at least 6 characters.")
        );

        let legacy: ErrorBody = serde_json::from_str(r#"{"message":"Email not confirmed"}"#).unwrap();
        assert_eq!(legacy.code(), None);
        assert_eq!(legacy.message(), Some("Email not confirmed"));
    }

    #[test]
    fn test_oauth_code_falls_back_to_message() {
        // `invalid_grant` is not a known code, so the text decides
        let err = AuthError::provider(400, Some("invalid_grant"), "Invalid login credentials");
        assert_eq!(
            err.identity_kind(),
            Some(crate::domain::identity_error::IdentityErrorKind::InvalidCredentials)
        );
    }

    #[test]
    fn test_auth_url() {
        let client = SupabaseAuthClient::new(
            reqwest::Client::new(),
            "https://abc.supabase.co/",
            SecretString::new("anon".to_string()),
        );
        assert_eq!(client.auth_url, "https://abc.supabase.co/auth/v1");
        assert!(!format!("{client:?}").contains("anon"));
    }
}
