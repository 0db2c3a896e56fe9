use serde::{Deserialize, Serialize};

/// Every answer the questionnaire collects, ready to fill the itinerary prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDetails {
    /// Where the traveller departs from (free text)
    pub starting_location: String,
    /// Destination city (free text)
    pub city: String,
    /// Length of the stay in whole days, always at least 1
    pub trip_duration_days: u32,
    /// Budget description such as "low", "mid-range" or "luxury"
    pub budget: String,
    /// Trimmed, non-empty interests in the order the user listed them
    pub interests: Vec<String>,
}

impl TripDetails {
    /// Interests rendered the way they appear in the prompt
    pub fn interests_joined(&self) -> String {
        self.interests.join(", ")
    }
}

/// What happened during a single turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// An answer was stored and the next question asked
    Accepted,
    /// The answer was rejected and the same question asked again
    Reprompted,
    /// The itinerary was generated and the session is now complete
    Completed,
    /// The generation call failed; the session can retry the last step
    GenerationFailed,
    /// The session was already complete and has been replaced with a fresh one
    AlreadyComplete,
}

/// Split a comma-separated interests answer into trimmed entries.
///
/// Empty segments are dropped, so `"beaches,,museums"` yields two entries and
/// a blank answer yields none.
pub fn parse_interests(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|interest| !interest.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a trip length as a positive number of days
pub fn parse_duration_days(input: &str) -> Option<u32> {
    input.trim().parse::<u32>().ok().filter(|days| *days > 0)
}
