use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use super::session::Session;
use crate::error::GatewayError;
use crate::models::{GameCategory, HallId, UserId};

pub const DEFAULT_MAX_SESSIONS: usize = 100;

/// What the registry remembers about a logged-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredSession {
    pub connection_id: Uuid,
    pub game_category: GameCategory,
    pub user_id: UserId,
    pub hall_id: HallId,
    pub registered_at: DateTime<Utc>,
}

impl From<&Session> for RegisteredSession {
    fn from(session: &Session) -> Self {
        Self {
            connection_id: session.id(),
            game_category: session.game_category(),
            user_id: session.user_id(),
            hall_id: session.hall_id(),
            registered_at: Utc::now(),
        }
    }
}

/// Set of authenticated, connected sessions with a capacity ceiling.
pub struct Registry {
    sessions: DashMap<Uuid, RegisteredSession>,
    /// Occupied slots. Reserved before insert so it never exceeds `capacity`.
    slots: AtomicUsize,
    capacity: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl Registry {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            slots: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Register `session`. Adding a session that is already present refreshes
    /// its snapshot without taking another slot.
    pub fn add(&self, session: &Session) -> Result<(), GatewayError> {
        match self.sessions.entry(session.id()) {
            Entry::Occupied(mut entry) => {
                entry.insert(RegisteredSession::from(session));
                Ok(())
            }
            Entry::Vacant(entry) => {
                self.slots
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        (n < self.capacity).then_some(n + 1)
                    })
                    .map_err(|_| GatewayError::CapacityExceeded {
                        capacity: self.capacity,
                    })?;
                entry.insert(RegisteredSession::from(session));
                Ok(())
            }
        }
    }

    /// Idempotent.
    pub fn remove(&self, session: &Session) {
        if self.sessions.remove(&session.id()).is_some() {
            self.slots.fetch_sub(1, Ordering::AcqRel);
        }
    }

    pub fn count(&self) -> usize {
        self.slots.load(Ordering::Acquire)
    }

    pub fn contains(&self, session: &Session) -> bool {
        self.sessions.contains_key(&session.id())
    }

    /// Point-in-time copy of every entry, in no particular order.
    pub fn sessions(&self) -> Vec<RegisteredSession> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }
}
