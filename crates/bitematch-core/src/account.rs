//! Account lifecycle: guest sessions, sign-up/in, hydration and deletion
//!
//! Every user starts as an anonymous guest so swipes can sync from the
//! first card. Signing up upgrades the guest in place; signing in switches
//! to an existing account and pulls its history into the local store.

use crate::auth::{AuthBackend, AuthSession, AuthUser, SignUpOutcome};
use crate::error::Result;
use crate::models::UserProfile;
use crate::remote::{RemoteStore, UserContext};
use crate::sync::SyncEngine;

/// Shown after a guest account was upgraded
pub const LINKED_MESSAGE: &str = "Account Secured!";
/// Shown after a new account was created
pub const CREATED_MESSAGE: &str = "Welcome to BiteMatch!";
/// Shown after signing out
pub const GUEST_MESSAGE: &str = "Guest mode active.";

impl SignUpOutcome {
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Linked(_) => LINKED_MESSAGE,
            Self::Created(_) => CREATED_MESSAGE,
        }
    }
}

pub struct AccountService<A, R> {
    auth: A,
    sync: SyncEngine<R>,
}

impl<A: AuthBackend, R: RemoteStore> AccountService<A, R> {
    pub const fn new(auth: A, sync: SyncEngine<R>) -> Self {
        Self { auth, sync }
    }

    pub const fn auth(&self) -> &A {
        &self.auth
    }

    pub const fn sync(&self) -> &SyncEngine<R> {
        &self.sync
    }

    /// The stored user, without touching the network
    pub fn current_user(&self) -> Result<Option<AuthUser>> {
        Ok(self.auth.current_session()?.map(|session| session.user))
    }

    /// Credentials for remote calls, refreshing the session when needed
    pub async fn user_context(&self) -> Result<Option<UserContext>> {
        Ok(self
            .auth
            .restore_session()
            .await?
            .map(|session| session.user_context()))
    }

    /// Restore the previous session or start a guest one, then hydrate.
    ///
    /// Auth failures are logged and leave the client usable offline.
    pub async fn start(&self) -> Result<Option<AuthSession>> {
        let restored = match self.auth.restore_session().await {
            Ok(session) => session,
            Err(error) => {
                // The stored session stays put; a new guest would orphan its history
                tracing::warn!("Failed to restore session, continuing offline: {}", error);
                return Ok(None);
            }
        };

        let session = match restored {
            Some(session) => Some(session),
            None => self.enter_guest_mode().await,
        };

        if let Some(session) = &session {
            self.hydrate(&session.user_context()).await?;
        }
        Ok(session)
    }

    /// Merge remote history into the local store.
    ///
    /// Returns whether the remote fetch succeeded; local decisions always win.
    pub async fn hydrate(&self, user: &UserContext) -> Result<bool> {
        let snapshot = match self.sync.remote().fetch_initial_data(user).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!("Failed to fetch remote history: {}", error);
                return Ok(false);
            }
        };

        self.sync
            .database()
            .hydrate(&snapshot.matches, &snapshot.interactions)
            .await?;
        tracing::debug!(
            "Hydrated {} matches and {} interactions",
            snapshot.matches.len(),
            snapshot.interactions.len()
        );
        Ok(true)
    }

    /// Create an email account, keeping guest history when linking
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let outcome = self.auth.sign_up(email, password).await?;
        self.after_sign_in(outcome.session()).await?;
        Ok(outcome)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let session = self.auth.sign_in(email, password).await?;
        self.after_sign_in(&session).await?;
        Ok(session)
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<()> {
        self.auth.send_password_reset(email).await?;
        Ok(())
    }

    /// Clear local data and drop back to a fresh guest session
    pub async fn sign_out(&self) -> Result<Option<AuthSession>> {
        self.sync.database().clear_store().await?;
        self.auth.sign_out()?;
        Ok(self.enter_guest_mode().await)
    }

    /// Purge remote data, delete the user, then clear local data
    pub async fn delete_account(&self) -> Result<()> {
        let Some(user) = self.user_context().await? else {
            return Err(crate::auth::AuthError::NotSignedIn.into());
        };

        self.sync.remote().purge_user_data(&user).await?;
        self.auth.delete_account().await?;
        self.sync.database().clear_store().await?;
        Ok(())
    }

    pub async fn update_profile(&self, profile: UserProfile) -> Result<AuthSession> {
        let profile = profile.normalized()?;
        Ok(self.auth.update_profile(&profile).await?)
    }

    async fn after_sign_in(&self, session: &AuthSession) -> Result<()> {
        let user = session.user_context();
        self.hydrate(&user).await?;
        self.sync.flush(Some(&user)).await?;
        Ok(())
    }

    async fn enter_guest_mode(&self) -> Option<AuthSession> {
        match self.auth.sign_in_anonymously().await {
            Ok(session) => Some(session),
            Err(error) => {
                tracing::warn!("Anonymous sign-in failed; continuing offline: {}", error);
                None
            }
        }
    }
}
