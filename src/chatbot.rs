/// Canned keyword replies, scanned in order; the first keyword contained
/// in the message wins.
const RESPONSES: [(&str, &str); 4] = [
    ("hello", "Hello! Welcome to TravelViz. How can I help you today?"),
    (
        "what is travelviz",
        "TravelViz is your travel insights dashboard — track destinations, explore data, and plan trips!",
    ),
    (
        "features",
        "We have login/signup, insights, trip planner, interactive map, profile management, and an admin panel.",
    ),
    ("bye", "Safe travels!"),
];

const FALLBACK: &str = "I'm not sure about that, but I can tell you more about TravelViz!";

pub fn reply_to(message: &str) -> &'static str {
    let needle = message.to_lowercase();
    RESPONSES
        .iter()
        .find(|(key, _)| needle.contains(key))
        .map(|(_, reply)| *reply)
        .unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_matches_anywhere_in_message() {
        assert!(reply_to("well hello there").starts_with("Hello!"));
    }

    #[test]
    fn unknown_message_gets_fallback() {
        assert_eq!(reply_to("weather in oslo?"), FALLBACK);
    }
}
