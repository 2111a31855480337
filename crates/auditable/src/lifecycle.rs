//! Lifecycle Events
//!
//! Named points in a record's persistence lifecycle at which listeners run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    BeforeValidation,
    AfterValidation,
    BeforeSave,
    AfterSave,
    BeforeCreate,
    AfterCreate,
    BeforeUpdate,
    AfterUpdate,
    BeforeDestroy,
    AfterDestroy,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 10] = [
        Self::BeforeValidation,
        Self::AfterValidation,
        Self::BeforeSave,
        Self::AfterSave,
        Self::BeforeCreate,
        Self::AfterCreate,
        Self::BeforeUpdate,
        Self::AfterUpdate,
        Self::BeforeDestroy,
        Self::AfterDestroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeValidation => "before_validation",
            Self::AfterValidation => "after_validation",
            Self::BeforeSave => "before_save",
            Self::AfterSave => "after_save",
            Self::BeforeCreate => "before_create",
            Self::AfterCreate => "after_create",
            Self::BeforeUpdate => "before_update",
            Self::AfterUpdate => "after_update",
            Self::BeforeDestroy => "before_destroy",
            Self::AfterDestroy => "after_destroy",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = AuditError;

    /// Accepts symbol spellings, with or without a leading colon.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches(':');
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == name)
            .ok_or_else(|| {
                AuditError::invalid_configuration(format!("unknown lifecycle event `{s}`"))
            })
    }
}

/// Whether a save creates a new record or updates an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    Create,
    Update,
}

impl Persistence {
    /// Events fired once validation has started, in firing order
    pub fn save_sequence(&self) -> [LifecycleEvent; 5] {
        match self {
            Self::Create => [
                LifecycleEvent::AfterValidation,
                LifecycleEvent::BeforeSave,
                LifecycleEvent::BeforeCreate,
                LifecycleEvent::AfterCreate,
                LifecycleEvent::AfterSave,
            ],
            Self::Update => [
                LifecycleEvent::AfterValidation,
                LifecycleEvent::BeforeSave,
                LifecycleEvent::BeforeUpdate,
                LifecycleEvent::AfterUpdate,
                LifecycleEvent::AfterSave,
            ],
        }
    }

    /// True when `event` has yet to fire at validation time of this save
    pub fn is_upcoming(&self, event: LifecycleEvent) -> bool {
        self.save_sequence().contains(&event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol_names() {
        assert_eq!("before_save".parse::<LifecycleEvent>().unwrap(), LifecycleEvent::BeforeSave);
        assert_eq!(":after_create".parse::<LifecycleEvent>().unwrap(), LifecycleEvent::AfterCreate);
        assert!("after_lunch".parse::<LifecycleEvent>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for event in LifecycleEvent::ALL {
            assert_eq!(event.to_string().parse::<LifecycleEvent>().unwrap(), event);
        }
    }

    #[test]
    fn test_upcoming_events() {
        assert!(Persistence::Update.is_upcoming(LifecycleEvent::BeforeUpdate));
        assert!(!Persistence::Update.is_upcoming(LifecycleEvent::AfterCreate));
        assert!(Persistence::Create.is_upcoming(LifecycleEvent::AfterSave));
        assert!(!Persistence::Create.is_upcoming(LifecycleEvent::BeforeValidation));
        assert!(!Persistence::Create.is_upcoming(LifecycleEvent::BeforeDestroy));
    }
}
