//! Data models for StudyDeck sync.
//!
//! This module contains the data structures shared by the sync engine:
//!
//! - `Document`: the full synchronized payload (collections + settings)
//! - Record types: `Flashcard`, `Todo`, `Note`, `ClassEntry`,
//!   `CalendarEvent`, `StudyTask`, pomodoro types, `ActivityEntry`
//! - `RecordId`: opaque string-or-number record identifier
//! - `UserProfile`, `AuthSuccess`: authentication payloads

pub mod document;
pub mod user;

pub use document::{
    ActivityEntry, CalendarEvent, ClassEntry, Document, Flashcard, Identified, Note,
    PomodoroSession, PomodoroSettings, PomodoroStats, RecordId, Settings, StudyTask, Todo,
};
pub use user::{AuthSuccess, UserProfile};
