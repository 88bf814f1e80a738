//! Single-slot undo.
//!
//! Only the most recent update is recoverable. The slot is an explicit value
//! owned by whoever issues updates (one per session), so callers never
//! clobber each other's undo state.

use chrono::{DateTime, Utc};
use lab_assets_schema::RowImage;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Stored cells of a record as of just before an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoSnapshot {
    pub image: RowImage,
    pub taken_at: DateTime<Utc>,
}

impl UndoSnapshot {
    pub fn new(image: RowImage) -> Self {
        Self {
            image,
            taken_at: Utc::now(),
        }
    }

    pub fn record_id(&self) -> i64 {
        self.image.id
    }
}

/// Holds at most one [`UndoSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct UndoSlot(Option<UndoSnapshot>);

impl UndoSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot, returning the snapshot it held.
    pub fn replace(&mut self, snapshot: UndoSnapshot) -> Option<UndoSnapshot> {
        self.0.replace(snapshot)
    }

    /// Remove and return the snapshot, leaving the slot empty.
    pub fn take(&mut self) -> Option<UndoSnapshot> {
        self.0.take()
    }

    pub fn peek(&self) -> Option<&UndoSnapshot> {
        self.0.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Undo slots keyed by session, for transports that only carry a session id.
///
/// Slots of sessions idle for longer than the configured period are dropped.
#[derive(Clone)]
pub struct UndoSessions {
    slots: Cache<SessionId, UndoSnapshot>,
}

impl UndoSessions {
    const MAX_SESSIONS: u64 = 10_000;

    pub fn new(idle: Duration) -> Self {
        let slots = Cache::builder()
            .max_capacity(Self::MAX_SESSIONS)
            .time_to_idle(idle)
            .build();
        Self { slots }
    }

    /// The session's current slot (empty for unknown or expired sessions).
    pub fn checkout(&self, session: SessionId) -> UndoSlot {
        UndoSlot(self.slots.get(&session))
    }

    /// Store the slot back after an update or revert.
    pub fn checkin(&self, session: SessionId, mut slot: UndoSlot) {
        match slot.take() {
            Some(snapshot) => self.slots.insert(session, snapshot),
            None => self.slots.invalidate(&session),
        }
    }
}

impl fmt::Debug for UndoSessions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoSessions")
            .field("sessions", &self.slots.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_assets_schema::FieldValue;

    fn snapshot(id: i64, zone: &str) -> UndoSnapshot {
        UndoSnapshot::new(RowImage {
            id,
            cells: vec![
                ("zone".to_string(), FieldValue::from(zone)),
                ("notes".to_string(), FieldValue::Null),
            ],
        })
    }

    #[test]
    fn slot_keeps_only_the_latest_snapshot() {
        let mut slot = UndoSlot::new();
        assert!(slot.is_empty());

        assert!(slot.replace(snapshot(1, "A")).is_none());
        let previous = slot.replace(snapshot(2, "B")).expect("previous snapshot");
        assert_eq!(previous.record_id(), 1);
        assert_eq!(slot.peek().map(UndoSnapshot::record_id), Some(2));

        let taken = slot.take().expect("snapshot present");
        assert_eq!(taken.image.get("zone"), Some(&FieldValue::from("B")));
        assert!(slot.is_empty());
        assert!(slot.take().is_none());
    }

    #[test]
    fn sessions_do_not_share_slots() {
        let sessions = UndoSessions::new(Duration::from_secs(60));
        let alice = SessionId::new();
        let bob = SessionId::new();

        let mut slot = sessions.checkout(alice);
        slot.replace(snapshot(1, "A"));
        sessions.checkin(alice, slot);

        let mut slot = sessions.checkout(bob);
        assert!(slot.is_empty());
        slot.replace(snapshot(2, "B"));
        sessions.checkin(bob, slot);

        assert_eq!(
            sessions.checkout(alice).peek().map(UndoSnapshot::record_id),
            Some(1)
        );
        assert_eq!(
            sessions.checkout(bob).peek().map(UndoSnapshot::record_id),
            Some(2)
        );

        sessions.checkin(alice, UndoSlot::new());
        assert!(sessions.checkout(alice).is_empty());
    }

    #[test]
    fn session_id_round_trips_through_text() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().expect("parse session id");
        assert_eq!(parsed, id);
        assert!("not-a-session".parse::<SessionId>().is_err());
    }
}
