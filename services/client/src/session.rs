//! services/client/src/session.rs
//!
//! The signed-in state of the client. The token lives in the key-value store
//! so it survives restarts; the profile is held in memory once fetched.

use crate::adapters::http::TOKEN_KEY;
use atticus_core::domain::{Credentials, Registration, User};
use atticus_core::ports::{KeyValueStore, PortError, PortResult, WriterApi};
use std::sync::Arc;
use tracing::{info, warn};

const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

/// The message shown for a failed login: the server's own explanation when
/// it gave one, otherwise a generic hint.
pub fn login_failure_message(error: &PortError) -> String {
    match error {
        PortError::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
        _ => LOGIN_FAILED.to_string(),
    }
}

pub struct AuthSession {
    api: Arc<dyn WriterApi>,
    store: Arc<dyn KeyValueStore>,
    user: Option<User>,
}

impl AuthSession {
    pub fn new(api: Arc<dyn WriterApi>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            store,
            user: None,
        }
    }

    /// Validates a persisted token by fetching the profile. Any failure signs
    /// the session out and forgets the token.
    pub async fn restore(&mut self) -> bool {
        let token = match self.store.get(TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => return false,
            Err(e) => {
                warn!("Could not read the stored token: {:?}", e);
                return false;
            }
        };
        if token.trim().is_empty() {
            self.forget_token().await;
            return false;
        }

        match self.api.current_user().await {
            Ok(user) => {
                info!("Restored session for '{}'.", user.username);
                self.user = Some(user);
                true
            }
            Err(e) => {
                warn!("Stored token rejected: {}", e);
                self.forget_token().await;
                self.user = None;
                false
            }
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> PortResult<&User> {
        let credentials = Credentials {
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        let token = self.api.login(&credentials).await?;
        self.store.set(TOKEN_KEY, token.as_str()).await?;
        self.load_profile().await
    }

    /// Returns `None` when the backend created the account without handing
    /// out a token; the user then signs in separately.
    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> PortResult<Option<&User>> {
        let registration = Registration {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        match self.api.register(&registration).await? {
            Some(token) => {
                self.store.set(TOKEN_KEY, token.as_str()).await?;
                self.load_profile().await.map(Some)
            }
            None => {
                info!("Registered '{}'; no token issued.", registration.username);
                Ok(None)
            }
        }
    }

    pub async fn logout(&mut self) -> PortResult<()> {
        self.user = None;
        self.store.remove(TOKEN_KEY).await
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    async fn load_profile(&mut self) -> PortResult<&User> {
        match self.api.current_user().await {
            Ok(user) => {
                info!("Signed in as '{}'.", user.username);
                Ok(&*self.user.insert(user))
            }
            Err(e) => {
                self.forget_token().await;
                self.user = None;
                Err(e)
            }
        }
    }

    async fn forget_token(&self) {
        if let Err(e) = self.store.remove(TOKEN_KEY).await {
            warn!("Failed to clear the stored token: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failure_prefers_the_server_message() {
        let rejected = PortError::Rejected {
            status: 400,
            message: "Unable to log in with provided credentials.".to_string(),
        };
        assert_eq!(
            login_failure_message(&rejected),
            "Unable to log in with provided credentials."
        );
        assert_eq!(login_failure_message(&PortError::Unauthorized), LOGIN_FAILED);
        assert_eq!(
            login_failure_message(&PortError::Network("refused".into())),
            LOGIN_FAILED
        );
    }
}
