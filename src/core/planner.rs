use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

use super::session::{Stage, TripSession};
use crate::{
    config::PlannerConfig,
    error::{PlannerError, Result},
    services::{
        generator::{ChatGenerator, ItineraryGenerator},
        prompts::{self, render_itinerary_prompt},
    },
    types::{parse_duration_days, parse_interests, TurnStatus},
};

/// Outcome of one turn: the session to keep for the next turn and the reply to show
#[derive(Debug, Clone)]
pub struct Turn {
    pub session: TripSession,
    pub reply: String,
    pub status: TurnStatus,
}

/// Drives the questionnaire.
///
/// The planner holds no per-conversation state. Each call to [`TripPlanner::advance`]
/// takes the caller's session by value and hands back the successor, so concurrent
/// conversations only share the generator.
#[derive(Debug)]
pub struct TripPlanner<G> {
    generator: G,
    timeout: Duration,
}

impl TripPlanner<ChatGenerator> {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(ChatGenerator::from_config(config)).with_timeout(config.timeout())
    }
}

impl<G: ItineraryGenerator> TripPlanner<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            timeout: Duration::from_secs(120),
        }
    }

    /// Upper bound on the itinerary generation call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Opening message for a new conversation
    pub fn greeting(&self) -> &'static str {
        prompts::ASK_STARTING_LOCATION
    }

    /// Apply one user input to `session`.
    ///
    /// Never fails: rejected answers and generation errors become reply text
    /// with the session left as it was.
    pub async fn advance(&self, mut session: TripSession, input: &str) -> Turn {
        let stage = session.stage();
        let answer = input.trim();

        let (reply, status) = match stage {
            Stage::Complete => {
                info!(target: "trip_planner::turns", "session already complete, starting over");
                return Turn {
                    session: TripSession::new(),
                    reply: prompts::ALREADY_COMPLETE.to_string(),
                    status: TurnStatus::AlreadyComplete,
                };
            }
            Stage::StartingLocation if answer.is_empty() => {
                (prompts::ASK_STARTING_LOCATION.to_string(), TurnStatus::Reprompted)
            }
            Stage::StartingLocation => {
                session.set_starting_location(input.to_string());
                (prompts::ASK_CITY.to_string(), TurnStatus::Accepted)
            }
            Stage::City if answer.is_empty() => {
                (prompts::ASK_CITY.to_string(), TurnStatus::Reprompted)
            }
            Stage::City => {
                session.set_city(input.to_string());
                (prompts::ASK_DURATION.to_string(), TurnStatus::Accepted)
            }
            Stage::Duration => match parse_duration_days(input) {
                Some(days) => {
                    session.set_trip_duration_days(days);
                    (prompts::ASK_BUDGET.to_string(), TurnStatus::Accepted)
                }
                None => {
                    let error = PlannerError::InvalidDuration(input.to_string());
                    info!(target: "trip_planner::turns", code = error.error_code(), "{}", error);
                    (prompts::REASK_DURATION.to_string(), TurnStatus::Reprompted)
                }
            },
            Stage::Budget if answer.is_empty() => {
                (prompts::ASK_BUDGET.to_string(), TurnStatus::Reprompted)
            }
            Stage::Budget => {
                session.set_budget(input.to_string());
                (prompts::ASK_INTERESTS.to_string(), TurnStatus::Accepted)
            }
            Stage::Interests => self.finish(&mut session, input).await,
        };

        info!(
            target: "trip_planner::turns",
            from = %stage,
            to = %session.stage(),
            status = ?status,
            "turn processed"
        );

        session.record_turn(input, &reply);
        Turn {
            session,
            reply,
            status,
        }
    }

    async fn finish(&self, session: &mut TripSession, input: &str) -> (String, TurnStatus) {
        let interests = parse_interests(input);
        if interests.is_empty() {
            let error = PlannerError::InvalidInterests;
            info!(target: "trip_planner::turns", code = error.error_code(), "{}", error);
            return (prompts::REASK_INTERESTS.to_string(), TurnStatus::Reprompted);
        }

        match self.generate(session, &interests).await {
            Ok(itinerary) => {
                let reply = prompts::itinerary_reply(&itinerary);
                session.complete(interests, itinerary);
                (reply, TurnStatus::Completed)
            }
            Err(error) => {
                warn!(
                    target: "trip_planner::turns",
                    code = error.error_code(),
                    retryable = error.is_retryable(),
                    "itinerary generation failed: {}",
                    error
                );
                (prompts::generation_failure_reply(), TurnStatus::GenerationFailed)
            }
        }
    }

    // Interests are passed separately so nothing is committed until the call succeeds.
    async fn generate(&self, session: &TripSession, interests: &[String]) -> Result<String> {
        let details = session.details_with(interests.to_vec()).ok_or_else(|| {
            PlannerError::Generation("session is missing earlier answers".to_string())
        })?;
        let prompt = render_itinerary_prompt(&details);

        let itinerary = timeout(
            self.timeout,
            self.generator.generate(&prompt.system, &prompt.user),
        )
        .await
        .map_err(|_| PlannerError::Timeout(self.timeout))??;

        if itinerary.trim().is_empty() {
            return Err(PlannerError::EmptyGeneration);
        }

        Ok(itinerary)
    }
}
