use crate::types::TripDetails;

pub const ASK_STARTING_LOCATION: &str = "Where will you be starting your trip from? 📍";
pub const ASK_CITY: &str = "Got it! Now, enter your **destination city** 🏙️.";
pub const ASK_DURATION: &str = "Nice! How many days are you planning to stay? 📅";
pub const REASK_DURATION: &str =
    "Please enter the trip length as a whole number of days (for example: 5) 📅.";
pub const ASK_BUDGET: &str = "Great! What's your **budget**? (low, mid-range, luxury) 💰";
pub const ASK_INTERESTS: &str =
    "Understood! Finally, list your **interests** (e.g., beaches, museums, nightlife) 🎭.";
pub const REASK_INTERESTS: &str =
    "Please list at least one interest, separated by commas (e.g., food, hiking, art) 🎭.";
pub const ITINERARY_BANNER: &str = "✅ **Here's your travel itinerary:**";
pub const GENERATION_APOLOGY: &str = "Sorry, I couldn't generate your itinerary just now.";
pub const ALREADY_COMPLETE: &str =
    "Your itinerary is ready! ✈️ To plan another trip, tell me where you'll be starting from.";

/// The fixed user message sent alongside the itinerary system prompt
pub const ITINERARY_REQUEST: &str = "Create a detailed, time-based itinerary for my trip.";

const ITINERARY_TEMPLATE: &str = r#"You are a travel assistant.
Generate a **{trip_duration}-day itinerary** for {city}, considering:
- **Starting Location**: {starting_location}
- **Interests**: {interests}
- **Budget**: {budget}

**Include realistic travel plans** from {starting_location} to {city} (e.g., flight, train, road trip).
**Ensure travel time is factored into the schedule.**
**Format the response with specific time slots**, like this:

**Day 1**
- 06:00 AM - Depart from {starting_location} via [Flight/Train/Car] ✈️
- 09:00 AM - Arrive in {city} and check in to your accommodation 🏨
- 10:30 AM - Breakfast at [Affordable/Luxury] restaurant ☕
- 12:00 PM - Visit [Main Attraction] 🏛️
- 02:30 PM - Lunch at [Budget-friendly/Luxury] spot 🍽️
- 04:00 PM - Explore [Another Activity] 🎭
- 07:30 PM - Dinner at [Affordable/Luxury] restaurant 🍷
- 09:00 PM - Evening entertainment 🎶
"#;

/// System and user messages for one itinerary generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryPrompt {
    pub system: String,
    pub user: String,
}

/// Fill the itinerary template with the collected answers
pub fn render_itinerary_prompt(details: &TripDetails) -> ItineraryPrompt {
    let slots = [
        ("trip_duration", details.trip_duration_days.to_string()),
        ("city", details.city.clone()),
        ("starting_location", details.starting_location.clone()),
        ("interests", details.interests_joined()),
        ("budget", details.budget.clone()),
    ];

    ItineraryPrompt {
        system: fill_slots(ITINERARY_TEMPLATE, &slots),
        user: ITINERARY_REQUEST.to_string(),
    }
}

// Single pass, so user answers containing `{city}` and the like are left alone.
fn fill_slots(template: &str, slots: &[(&str, String)]) -> String {
    let mut rendered = String::with_capacity(template.len() + 128);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let filled = after.find('}').and_then(|close| {
            let name = &after[..close];
            slots
                .iter()
                .find(|(slot, _)| *slot == name)
                .map(|(_, value)| (value, close))
        });

        match filled {
            Some((value, close)) => {
                rendered.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                rendered.push('{');
                rest = after;
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

/// Reply shown once the itinerary has been generated
pub fn itinerary_reply(itinerary: &str) -> String {
    format!("{}\n\n{}", ITINERARY_BANNER, itinerary)
}

/// Reply shown when the generation call fails; the user can resend interests
pub fn generation_failure_reply() -> String {
    format!(
        "{} Please send your interests again to retry; your other answers are saved.",
        GENERATION_APOLOGY
    )
}
