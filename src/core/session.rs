use crate::types::TripDetails;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Oldest turns are dropped once a transcript holds this many
pub const MAX_TRANSCRIPT_TURNS: usize = 64;

/// The question a session is currently waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    StartingLocation,
    City,
    Duration,
    Budget,
    Interests,
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::StartingLocation => "starting_location",
            Stage::City => "city",
            Stage::Duration => "duration",
            Stage::Budget => "budget",
            Stage::Interests => "interests",
            Stage::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// One user input and the reply it produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub input: String,
    pub reply: String,
}

/// One conversation's questionnaire answers and the itinerary derived from them.
///
/// Fields fill strictly in declaration order and are never overwritten. Once
/// `itinerary` is set the session is terminal and must be replaced by a fresh
/// one rather than resumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripSession {
    starting_location: Option<String>,
    city: Option<String>,
    trip_duration_days: Option<u32>,
    budget: Option<String>,
    interests: Vec<String>,
    itinerary: Option<String>,
    #[serde(default)]
    transcript: Vec<TurnRecord>,
}

impl TripSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the pending question from which fields are set
    pub fn stage(&self) -> Stage {
        if self.starting_location.is_none() {
            Stage::StartingLocation
        } else if self.city.is_none() {
            Stage::City
        } else if self.trip_duration_days.is_none() {
            Stage::Duration
        } else if self.budget.is_none() {
            Stage::Budget
        } else if self.interests.is_empty() || self.itinerary.is_none() {
            Stage::Interests
        } else {
            Stage::Complete
        }
    }

    pub fn is_complete(&self) -> bool {
        self.stage() == Stage::Complete
    }

    pub fn starting_location(&self) -> Option<&str> {
        self.starting_location.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn trip_duration_days(&self) -> Option<u32> {
        self.trip_duration_days
    }

    pub fn budget(&self) -> Option<&str> {
        self.budget.as_deref()
    }

    pub fn interests(&self) -> &[String] {
        &self.interests
    }

    pub fn itinerary(&self) -> Option<&str> {
        self.itinerary.as_deref()
    }

    pub fn transcript(&self) -> &[TurnRecord] {
        &self.transcript
    }

    /// Snapshot of the answers with `interests` supplied by the caller.
    ///
    /// Returns `None` while any of the first four answers is missing.
    pub fn details_with(&self, interests: Vec<String>) -> Option<TripDetails> {
        Some(TripDetails {
            starting_location: self.starting_location.clone()?,
            city: self.city.clone()?,
            trip_duration_days: self.trip_duration_days?,
            budget: self.budget.clone()?,
            interests,
        })
    }

    /// Snapshot of all five answers, once they have been collected
    pub fn details(&self) -> Option<TripDetails> {
        if self.interests.is_empty() {
            return None;
        }
        self.details_with(self.interests.clone())
    }

    pub(crate) fn set_starting_location(&mut self, value: String) {
        debug_assert!(self.starting_location.is_none());
        self.starting_location = Some(value);
    }

    pub(crate) fn set_city(&mut self, value: String) {
        debug_assert!(self.city.is_none());
        self.city = Some(value);
    }

    pub(crate) fn set_trip_duration_days(&mut self, days: u32) {
        debug_assert!(self.trip_duration_days.is_none());
        self.trip_duration_days = Some(days);
    }

    pub(crate) fn set_budget(&mut self, value: String) {
        debug_assert!(self.budget.is_none());
        self.budget = Some(value);
    }

    /// Commit interests and itinerary together after a successful generation
    pub(crate) fn complete(&mut self, interests: Vec<String>, itinerary: String) {
        debug_assert!(self.itinerary.is_none());
        self.interests = interests;
        self.itinerary = Some(itinerary);
    }

    pub(crate) fn record_turn(&mut self, input: &str, reply: &str) {
        debug!(
            target: "trip_planner::turns",
            stage = %self.stage(),
            turns = self.transcript.len() + 1,
            "recorded turn"
        );
        if self.transcript.len() >= MAX_TRANSCRIPT_TURNS {
            let excess = self.transcript.len() + 1 - MAX_TRANSCRIPT_TURNS;
            self.transcript.drain(..excess);
        }
        self.transcript.push(TurnRecord {
            input: input.to_string(),
            reply: reply.to_string(),
        });
    }
}
