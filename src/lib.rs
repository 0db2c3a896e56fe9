//! trip-planner-rs: a conversational travel itinerary planner
//!
//! The planner asks five questions in order (starting location, destination,
//! trip length, budget, interests) and then makes a single call to an
//! OpenAI-compatible chat-completions API to write a day-by-day itinerary.
//!
//! Conversation state lives in a [`TripSession`] owned by the caller. Each turn
//! passes the session in and receives its successor back, so concurrent
//! conversations never share mutable state.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use trip_planner_rs::{PlannerConfig, TripPlanner, TripSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlannerConfig::from_env()?;
//!     let planner = TripPlanner::from_config(&config);
//!
//!     let mut session = TripSession::new();
//!     for answer in ["Boston", "Lisbon", "4", "mid-range", "food, history"] {
//!         let turn = planner.advance(session, answer).await;
//!         println!("{}", turn.reply);
//!         session = turn.session;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod types;

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::core::{
    ConversationId, SessionStore, Stage, TripPlanner, TripSession, Turn, TurnRecord,
};
pub use config::PlannerConfig;
pub use error::{PlannerError, Result};
pub use services::{ChatGenerator, ItineraryGenerator, ItineraryPrompt};
pub use types::{TripDetails, TurnStatus};
