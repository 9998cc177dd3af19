// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Email/password sign-in.
//!
//! Failures from the backend are never told apart to the user: a wrong
//! password, an unknown account and a network error all read the same.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::presenter::Notice;

const MISSING_FIELDS: &str = "Please enter email and password";
const SIGN_IN_FAILED: &str = "Authentication failed.";

/// Validated sign-in input.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Validate locally. Empty fields never reach the backend.
    pub fn new(email: &str, password: &str) -> Result<Self, Notice> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Notice::short(MISSING_FIELDS));
        }
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub email: String,
    pub user_id: String,
    pub id_token: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("sign-in backend is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rejected by backend: {0}")]
    Rejected(String),
}

/// Hosted authentication boundary.
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserSession, AuthError>;
}

/// Identity Toolkit REST client (email/password provider).
pub struct FirebaseAuth {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
    id_token: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuth {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn sign_in_url(&self) -> String {
        format!(
            "{}/accounts:signInWithPassword?key={}",
            self.endpoint, self.api_key
        )
    }
}

impl Authenticator for FirebaseAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
        if self.api_key.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let response = self
            .client
            .post(self.sign_in_url())
            .json(&SignInRequest {
                email: credentials.email(),
                password: credentials.password(),
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let reason = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => status.to_string(),
            };
            return Err(AuthError::Rejected(reason));
        }

        let body: SignInResponse = response.json().await?;
        Ok(UserSession {
            email: body.email,
            user_id: body.local_id,
            id_token: body.id_token,
        })
    }
}

/// Result of a sign-in attempt as the login screen sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Rejected locally, backend not contacted.
    Invalid(Notice),
    SignedIn(UserSession),
    Failed(Notice),
}

/// Validates input and talks to the authenticator.
pub struct LoginFlow<T> {
    authenticator: T,
}

impl<T: Authenticator> LoginFlow<T> {
    pub fn new(authenticator: T) -> Self {
        Self { authenticator }
    }

    pub async fn submit(&self, email: &str, password: &str) -> LoginOutcome {
        let credentials = match Credentials::new(email, password) {
            Ok(credentials) => credentials,
            Err(notice) => return LoginOutcome::Invalid(notice),
        };

        debug!("Signing in {}", credentials.email());
        match self.authenticator.sign_in(&credentials).await {
            Ok(session) => {
                info!("Signed in as {}", session.email);
                LoginOutcome::SignedIn(session)
            }
            Err(e) => {
                warn!("Sign-in failed: {}", e);
                LoginOutcome::Failed(Notice::short(SIGN_IN_FAILED))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeAuth {
        calls: AtomicUsize,
        accept: bool,
    }

    impl FakeAuth {
        fn new(accept: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                accept,
            }
        }
    }

    impl Authenticator for FakeAuth {
        async fn sign_in(&self, credentials: &Credentials) -> Result<UserSession, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.accept {
                Ok(UserSession {
                    email: credentials.email().to_string(),
                    user_id: "uid-1".to_string(),
                    id_token: "token".to_string(),
                })
            } else {
                Err(AuthError::Rejected("INVALID_PASSWORD".to_string()))
            }
        }
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(Credentials::new("", "secret").is_err());
        assert!(Credentials::new("   ", "secret").is_err());
        assert!(Credentials::new("a@b.c", "").is_err());
        assert_eq!(Credentials::new(" a@b.c ", "x").unwrap().email(), "a@b.c");
    }

    #[test]
    fn test_debug_hides_password() {
        let credentials = Credentials::new("a@b.c", "hunter2").unwrap();
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }

    #[tokio::test]
    async fn test_invalid_input_skips_backend() {
        let flow = LoginFlow::new(FakeAuth::new(true));
        let outcome = flow.submit("", "").await;

        assert_eq!(outcome, LoginOutcome::Invalid(Notice::short(MISSING_FIELDS)));
        assert_eq!(flow.authenticator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_is_opaque() {
        let flow = LoginFlow::new(FakeAuth::new(false));
        let outcome = flow.submit("a@b.c", "wrong").await;

        assert_eq!(outcome, LoginOutcome::Failed(Notice::short(SIGN_IN_FAILED)));
    }

    #[tokio::test]
    async fn test_success_returns_session() {
        let flow = LoginFlow::new(FakeAuth::new(true));
        match flow.submit("a@b.c", "right").await {
            LoginOutcome::SignedIn(session) => assert_eq!(session.email, "a@b.c"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let auth = FirebaseAuth::new(&AuthConfig::default());
        let credentials = Credentials::new("a@b.c", "x").unwrap();
        assert!(matches!(
            auth.sign_in(&credentials).await,
            Err(AuthError::NotConfigured)
        ));
    }
}
