use uuid::Uuid;

use super::protocol::LoginResult;
use crate::error::GatewayError;
use crate::models::{GameCategory, HallId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Upgraded, not logged in.
    Connected,
    /// Logged in and registered. Only transport closure leaves this state.
    Authenticated,
    /// Cleanup has run.
    Closed,
}

/// Server side record of one client connection. Owned by that connection's
/// processing loop; the registry only keeps a snapshot.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    game_category: GameCategory,
    identity: Option<LoginResult>,
    state: SessionState,
}

impl Session {
    pub fn new(game_category: GameCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            game_category,
            identity: None,
            state: SessionState::Connected,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn game_category(&self) -> GameCategory {
        self.game_category
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Zero until login.
    pub fn user_id(&self) -> UserId {
        self.identity.as_ref().map_or(0, |i| i.user_id)
    }

    /// Zero until login.
    pub fn hall_id(&self) -> HallId {
        self.identity.as_ref().map_or(0, |i| i.hall_id)
    }

    /// Empty until login.
    pub fn session_token(&self) -> &str {
        self.identity.as_ref().map_or("", |i| i.session_token.as_str())
    }

    /// Parse a `loginCheck` response and adopt its identity. On failure the
    /// session is left untouched.
    pub fn apply_login_result(&mut self, raw: &[u8]) -> Result<(), GatewayError> {
        let login = LoginResult::parse(raw)?;
        self.identity = Some(login);
        Ok(())
    }

    pub(crate) fn authenticate(&mut self) {
        if self.state == SessionState::Connected {
            self.state = SessionState::Authenticated;
        }
    }

    pub(crate) fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}
