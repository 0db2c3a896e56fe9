pub mod trip;

pub use trip::{parse_duration_days, parse_interests, TripDetails, TurnStatus};
