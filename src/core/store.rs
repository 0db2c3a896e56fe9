use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::planner::{TripPlanner, Turn};
use super::session::TripSession;
use crate::config::{PlannerConfig, DEFAULT_MAX_CONVERSATIONS};
use crate::services::generator::ItineraryGenerator;

/// Identity of one logical conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

type SessionSlot = Arc<AsyncMutex<TripSession>>;

const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);

struct Entry {
    slot: SessionSlot,
    touched: Instant,
}

impl Entry {
    // A clone outside the map means a turn or snapshot is using the slot.
    fn is_busy(&self) -> bool {
        Arc::strong_count(&self.slot) > 1
    }
}

/// One independent [`TripSession`] per conversation.
///
/// The map lock is only held long enough to look up a slot. Each slot has its
/// own async lock, held for a whole turn, so turns within a conversation run
/// one at a time while separate conversations never wait on each other.
///
/// Conversations untouched for longer than the idle TTL are dropped whenever a
/// new conversation is created. When the store is still full after that, the
/// least recently touched idle conversation is evicted.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<ConversationId, Entry>>>,
    idle_ttl: Duration,
    max_conversations: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self {
            sessions: Arc::default(),
            idle_ttl: DEFAULT_IDLE_TTL,
            max_conversations: DEFAULT_MAX_CONVERSATIONS,
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("conversations", &self.len())
            .field("idle_ttl", &self.idle_ttl)
            .field("max_conversations", &self.max_conversations)
            .finish()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new()
            .with_idle_ttl(config.session_ttl())
            .with_max_conversations(config.max_conversations())
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn with_max_conversations(mut self, max_conversations: usize) -> Self {
        self.max_conversations = max_conversations.max(1);
        self
    }

    // The map is never left half-updated, so poisoning is ignored.
    fn map(&self) -> MutexGuard<'_, HashMap<ConversationId, Entry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn slot(&self, id: &ConversationId) -> SessionSlot {
        let now = Instant::now();
        let mut map = self.map();

        if let Some(entry) = map.get_mut(id) {
            entry.touched = now;
            return Arc::clone(&entry.slot);
        }

        self.evict(&mut map, now);
        debug!(target: "trip_planner::turns", conversation = %id, "creating session");

        let slot: SessionSlot = Arc::new(AsyncMutex::new(TripSession::new()));
        map.insert(
            id.clone(),
            Entry {
                slot: Arc::clone(&slot),
                touched: now,
            },
        );
        slot
    }

    fn evict(&self, map: &mut HashMap<ConversationId, Entry>, now: Instant) {
        let before = map.len();
        map.retain(|_, entry| {
            entry.is_busy() || now.duration_since(entry.touched) < self.idle_ttl
        });

        while map.len() >= self.max_conversations {
            let oldest = map
                .iter()
                .filter(|(_, entry)| !entry.is_busy())
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(id, _)| id.clone());

            match oldest {
                Some(id) => {
                    map.remove(&id);
                }
                None => break,
            }
        }

        let evicted = before - map.len();
        if evicted > 0 {
            debug!(
                target: "trip_planner::turns",
                evicted,
                remaining = map.len(),
                "evicted idle conversations"
            );
        }
    }

    fn holds(&self, id: &ConversationId, slot: &SessionSlot) -> bool {
        self.map()
            .get(id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.slot, slot))
    }

    /// Run one turn for `id`, creating its session on first contact
    pub async fn take_turn<G: ItineraryGenerator>(
        &self,
        planner: &TripPlanner<G>,
        id: &ConversationId,
        input: &str,
    ) -> String {
        self.take_turn_detailed(planner, id, input).await.reply
    }

    /// Like [`SessionStore::take_turn`], returning the full [`Turn`].
    ///
    /// If the conversation is removed while the turn is running, the reply is
    /// still returned but the resulting session is not kept.
    pub async fn take_turn_detailed<G: ItineraryGenerator>(
        &self,
        planner: &TripPlanner<G>,
        id: &ConversationId,
        input: &str,
    ) -> Turn {
        let slot = self.slot(id);
        let mut session = slot.lock().await;

        // Advance a copy so a dropped turn leaves the stored session untouched.
        let turn = planner.advance(session.clone(), input).await;
        *session = turn.session.clone();
        drop(session);

        if self.holds(id, &slot) {
            debug!(
                target: "trip_planner::turns",
                conversation = %id,
                status = ?turn.status,
                "turn stored"
            );
        } else {
            warn!(
                target: "trip_planner::turns",
                conversation = %id,
                status = ?turn.status,
                "conversation removed during turn, session discarded"
            );
        }
        turn
    }

    /// Copy of the current session, if the conversation exists
    pub async fn snapshot(&self, id: &ConversationId) -> Option<TripSession> {
        let slot = self.map().get(id).map(|entry| Arc::clone(&entry.slot))?;
        let session = slot.lock().await;
        Some(session.clone())
    }

    /// Replace the conversation's session with an empty one
    pub async fn reset(&self, id: &ConversationId) {
        let slot = self.slot(id);
        *slot.lock().await = TripSession::new();
    }

    /// Forget a conversation, returning whether it existed.
    ///
    /// A turn already running for `id` finishes, but its session is discarded.
    pub fn remove(&self, id: &ConversationId) -> bool {
        self.map().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}
