pub mod generator;
pub mod openai_client;
pub mod prompts;

pub use generator::{ChatGenerator, ItineraryGenerator};
pub use prompts::{render_itinerary_prompt, ItineraryPrompt};
