//! Domain Services
//!
//! Pure domain logic for thought generation: template filling, topic
//! fallback, prompt wording and content shaping.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::entities::Thought;
use super::value_objects::Mood;

/// Maximum length of thought content, in characters
pub const MAX_CONTENT_CHARS: usize = 280;
pub const ELLIPSIS: &str = "...";
pub const TOPIC_PLACEHOLDER: &str = "{topic}";

/// Topics substituted when the caller does not supply one
pub const TOPICS: [&str; 24] = [
    "time",
    "dreams",
    "coffee",
    "gravity",
    "memory",
    "music",
    "language",
    "cats",
    "the ocean",
    "silence",
    "mirrors",
    "sleep",
    "money",
    "the internet",
    "childhood",
    "stars",
    "rain",
    "maps",
    "socks",
    "clocks",
    "bread",
    "elevators",
    "shadows",
    "birthdays",
];

const PHILOSOPHICAL_TEMPLATES: &[&str] = &[
    "If {topic} only exists when we notice it, what is {topic} doing when nobody is looking?",
    "Maybe {topic} isn't a thing at all, just a story we keep agreeing to tell each other.",
    "Every time you think about {topic}, a slightly different person is doing the thinking.",
    "What if {topic} remembers us as much as we remember {topic}?",
    "We never experience {topic} directly, only our brain's best guess about it: {topic}.",
    "Somewhere, the last person who will ever think about {topic} has already been born.",
];

const HUMOROUS_TEMPLATES: &[&str] = &[
    "Honestly, {topic} is just the universe checking whether anyone reads the terms and conditions.",
    "If {topic} had a customer service line, the hold music would be incredible.",
    "Somewhere out there, {topic} is telling its friends a hilarious story about us.",
    "Nobody has ever been in a hurry to talk about {topic}, and yet here we are.",
    "The existence of {topic} suggests the simulation's designers got bored around Tuesday.",
    "Say {topic} enough times and it stops being a word and starts being a lifestyle.",
];

const SCIENTIFIC_TEMPLATES: &[&str] = &[
    "Every atom involved in {topic} is older than the Sun.",
    "Relative to the speed of light, {topic} is basically standing still.",
    "At the quantum level, nothing in {topic} ever quite touches anything else.",
    "Statistically, some of the water molecules near {topic} once passed through a dinosaur.",
    "The light that lets you see {topic} is already a few nanoseconds out of date.",
    "Entropy guarantees that {topic} will eventually become something else entirely.",
];

/// Templates available for a mood; every entry contains the topic placeholder
pub fn templates_for(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Philosophical => PHILOSOPHICAL_TEMPLATES,
        Mood::Humorous => HUMOROUS_TEMPLATES,
        Mood::Scientific => SCIENTIFIC_TEMPLATES,
    }
}

/// Trimmed topic, or `None` when absent or blank
pub fn normalize_topic(topic: Option<&str>) -> Option<String> {
    topic
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Substitute every placeholder occurrence
pub fn fill_template(template: &str, topic: &str) -> String {
    template.replace(TOPIC_PLACEHOLDER, topic)
}

/// Tail-truncate to the display limit, ending with an ellipsis when cut
pub fn truncate_content(text: &str) -> String {
    if text.chars().count() <= MAX_CONTENT_CHARS {
        return text.to_string();
    }
    let keep = MAX_CONTENT_CHARS - ELLIPSIS.chars().count();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Remove one layer of matching quote characters around a completion
pub fn strip_wrapping_quotes(text: &str) -> &str {
    const PAIRS: [(char, char); 4] = [('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’')];

    let trimmed = text.trim();
    for (open, close) in PAIRS {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    trimmed
}

/// Generate a template thought using the given random source
pub fn generate_local_with<R: Rng + ?Sized>(rng: &mut R, topic: Option<&str>, mood: Mood) -> Thought {
    let topic = match normalize_topic(topic) {
        Some(topic) => topic,
        None => TOPICS.choose(rng).copied().unwrap_or(TOPICS[0]).to_string(),
    };
    let template = templates_for(mood)
        .choose(rng)
        .copied()
        .unwrap_or(TOPIC_PLACEHOLDER);

    Thought::from_template(&fill_template(template, &topic), topic, mood)
}

/// Generate a template thought using the thread-local random source
pub fn generate_local(topic: Option<&str>, mood: Mood) -> Thought {
    generate_local_with(&mut rand::rng(), topic, mood)
}

/// System prompt steering the completion toward the requested mood
pub fn system_prompt(mood: Mood) -> String {
    let tone = match mood {
        Mood::Philosophical => "thoughtful and philosophical, leaving the reader with something to ponder",
        Mood::Humorous => "playful and funny, with an absurd but recognisable observation",
        Mood::Scientific => "grounded in a real scientific fact, phrased to spark wonder",
    };
    format!(
        "You write original shower thoughts: short, surprising observations about everyday things. \
         Keep it to one or two sentences and under {MAX_CONTENT_CHARS} characters. \
         Your tone is {tone}. Reply with the thought only, without quotes or hashtags."
    )
}

/// User prompt naming the topic, or asking for any topic
pub fn user_prompt(topic: Option<&str>) -> String {
    match topic {
        Some(topic) => format!("Give me a shower thought about {topic}."),
        None => "Give me a shower thought about anything at all.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_every_template_has_placeholder() {
        for mood in Mood::ALL {
            assert!(!templates_for(mood).is_empty());
            for template in templates_for(mood) {
                assert!(template.contains(TOPIC_PLACEHOLDER), "{template}");
            }
        }
    }

    #[test]
    fn test_fill_template_replaces_all_occurrences() {
        let filled = fill_template("{topic} and {topic}", "rain");
        assert_eq!(filled, "rain and rain");
    }

    #[test]
    fn test_truncate_content() {
        let short = "a".repeat(MAX_CONTENT_CHARS);
        assert_eq!(truncate_content(&short), short);

        let long = "b".repeat(MAX_CONTENT_CHARS + 1);
        let truncated = truncate_content(&long);
        assert_eq!(truncated.chars().count(), MAX_CONTENT_CHARS);
        assert!(truncated.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "é".repeat(MAX_CONTENT_CHARS);
        assert_eq!(truncate_content(&text), text);
    }

    #[test]
    fn test_normalize_topic() {
        assert_eq!(normalize_topic(None), None);
        assert_eq!(normalize_topic(Some("   ")), None);
        assert_eq!(normalize_topic(Some(" rain ")).as_deref(), Some("rain"));
    }

    #[test]
    fn test_strip_wrapping_quotes() {
        assert_eq!(strip_wrapping_quotes("\"Hello\""), "Hello");
        assert_eq!(strip_wrapping_quotes("  “Curly”  "), "Curly");
        assert_eq!(strip_wrapping_quotes("'single'"), "single");
        assert_eq!(strip_wrapping_quotes("no \"quotes\" here"), "no \"quotes\" here");
        assert_eq!(strip_wrapping_quotes("\"unbalanced"), "\"unbalanced");
    }

    #[test]
    fn test_generate_local_with_seeded_rng() {
        let mut rng = StdRng::seed_from_u64(7);
        let thought = generate_local_with(&mut rng, None, Mood::Humorous);
        let topic = thought.topic.clone().unwrap();

        assert!(TOPICS.contains(&topic.as_str()));
        assert!(thought.content.contains(&topic));
        assert_eq!(thought.mood, Mood::Humorous);
    }

    #[test]
    fn test_prompts_mention_topic_and_limit() {
        assert!(user_prompt(Some("socks")).contains("socks"));
        assert!(system_prompt(Mood::Scientific).contains("280"));
    }
}
