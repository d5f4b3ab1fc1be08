use std::sync::{Arc, Mutex};

use super::{AuthError, AuthResult, AuthSession, SessionPersistence};

/// Process-local session storage, lost on exit
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Arc<Mutex<Option<AuthSession>>>,
}

impl MemorySessionStore {
    fn lock(&self) -> AuthResult<std::sync::MutexGuard<'_, Option<AuthSession>>> {
        self.session
            .lock()
            .map_err(|_| AuthError::SecureStorage("session store lock poisoned".to_string()))
    }
}

impl SessionPersistence for MemorySessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        Ok(self.lock()?.clone())
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        *self.lock()? = Some(session.clone());
        Ok(())
    }

    fn clear_session(&self) -> AuthResult<()> {
        *self.lock()? = None;
        Ok(())
    }
}
