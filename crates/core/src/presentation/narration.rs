use crate::config::NarrationConfig;
use std::time::Duration;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated speaking time, never below the configured floor.
pub fn reading_time(words: usize, config: &NarrationConfig) -> Duration {
    let estimate = Duration::from_secs_f64(words as f64 * config.seconds_per_word);
    estimate.max(config.minimum)
}

/// Time from the start of a narration until the deck may advance.
pub fn advance_delay(text: &str, config: &NarrationConfig) -> Duration {
    reading_time(word_count(text), config) + config.settle + config.advance_pause
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_uses_the_floor() {
        let config = NarrationConfig::default();
        assert_eq!(reading_time(3, &config), Duration::from_secs(10));
        assert_eq!(advance_delay("Intro. Hello world", &config), Duration::from_secs(15));
    }

    #[test]
    fn long_text_scales_with_words() {
        let config = NarrationConfig::default();
        let text = vec!["word"; 50].join(" ");
        assert_eq!(word_count(&text), 50);
        assert_eq!(reading_time(50, &config), Duration::from_secs(20));
        assert_eq!(advance_delay(&text, &config), Duration::from_secs(25));
    }

    #[test]
    fn extra_spaces_are_not_words() {
        assert_eq!(word_count("  Title.   Body  text "), 3);
    }
}
