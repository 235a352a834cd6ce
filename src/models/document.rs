//! The synchronized document and its record types.
//!
//! A `Document` is the full data payload for one user session. It is
//! replaced wholesale on load and reset wholesale on logout; it is never
//! merged. The remote store speaks camelCase JSON, and every field carries
//! a serde default so a payload missing a field deserializes to the field's
//! empty value instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque record identifier. The remote store stores whatever the client
/// generated, which historically was sometimes a numeric timestamp and
/// sometimes a string, so both shapes must round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl Default for RecordId {
    fn default() -> Self {
        RecordId::Number(0)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}

/// A record that can be looked up by identifier within a collection.
pub trait Identified {
    fn record_id(&self) -> &RecordId;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Flashcard {
    pub id: RecordId,
    pub front: String,
    pub back: String,
    pub deck: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Todo {
    pub id: RecordId,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Note {
    pub id: RecordId,
    pub title: String,
    pub body: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassEntry {
    pub id: RecordId,
    pub name: String,
    pub instructor: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarEvent {
    pub id: RecordId,
    pub title: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub class_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyTask {
    pub id: RecordId,
    pub title: String,
    pub due_date: Option<String>,
    pub completed: bool,
    pub class_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PomodoroStats {
    pub total_sessions: u32,
    pub total_focus_minutes: u32,
    pub streak_days: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PomodoroSession {
    pub started_at: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PomodoroSettings {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityEntry {
    pub timestamp: Option<DateTime<Utc>>,
    pub action: String,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub dark_mode: bool,
}

/// The full synchronized payload for one user session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    pub flashcards: Vec<Flashcard>,
    pub todos: Vec<Todo>,
    pub notes: Vec<Note>,
    pub classes: Vec<ClassEntry>,
    pub events: Vec<CalendarEvent>,
    pub tasks: Vec<StudyTask>,
    pub pomodoro_stats: PomodoroStats,
    pub pomodoro_sessions: Vec<PomodoroSession>,
    pub pomodoro_settings: PomodoroSettings,
    pub activity_log: Vec<ActivityEntry>,
    pub settings: Settings,
    pub last_sync: Option<DateTime<Utc>>,
}

macro_rules! identified {
    ($($ty:ty),+) => {
        $(impl Identified for $ty {
            fn record_id(&self) -> &RecordId {
                &self.id
            }
        })+
    };
}

identified!(Flashcard, Todo, Note, ClassEntry, CalendarEvent, StudyTask);

/// Replace the first record whose id matches `record`'s id.
/// Duplicate ids are not enforced against, so only the first match changes.
/// Returns false (and leaves the collection untouched) when no id matches.
pub(crate) fn update_by_id<T: Identified>(items: &mut [T], record: T) -> bool {
    match items.iter().position(|r| r.record_id() == record.record_id()) {
        Some(idx) => {
            items[idx] = record;
            true
        }
        None => false,
    }
}

/// Remove the first record matching `id`. Returns false when nothing matched.
pub(crate) fn delete_by_id<T: Identified>(items: &mut Vec<T>, id: &RecordId) -> bool {
    match items.iter().position(|r| r.record_id() == id) {
        Some(idx) => {
            items.remove(idx);
            true
        }
        None => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: i64, front: &str) -> Flashcard {
        Flashcard {
            id: id.into(),
            front: front.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn update_replaces_first_match_only() {
        let mut cards = vec![card(1, "a"), card(1, "b"), card(2, "c")];
        assert!(update_by_id(&mut cards, card(1, "z")));
        assert_eq!(cards[0].front, "z");
        assert_eq!(cards[1].front, "b");
    }

    #[test]
    fn update_missing_id_is_noop() {
        let mut cards = vec![card(1, "a")];
        assert!(!update_by_id(&mut cards, card(9, "z")));
        assert_eq!(cards[0].front, "a");
    }

    #[test]
    fn delete_missing_id_removes_nothing() {
        let mut cards = vec![card(1, "a")];
        assert!(!delete_by_id(&mut cards, &RecordId::from(9)));
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn document_defaults_absent_fields() {
        // A payload from an older client may omit whole collections.
        let doc: Document = serde_json::from_str(r#"{"todos":[{"id":3,"text":"read"}]}"#)
            .expect("partial payload should deserialize");
        assert_eq!(doc.todos.len(), 1);
        assert!(doc.flashcards.is_empty());
        assert!(!doc.settings.dark_mode);
        assert_eq!(doc.pomodoro_settings.focus_minutes, 25);
    }

    #[test]
    fn record_id_accepts_number_or_string() {
        let num: RecordId = serde_json::from_str("1700000000000").unwrap();
        let txt: RecordId = serde_json::from_str(r#""card-7""#).unwrap();
        assert_eq!(num, RecordId::Number(1700000000000));
        assert_eq!(txt, RecordId::Text("card-7".to_string()));
    }
}
