pub mod planner;
pub mod session;
pub mod store;

pub use planner::{TripPlanner, Turn};
pub use session::{Stage, TripSession, TurnRecord};
pub use store::{ConversationId, SessionStore};
