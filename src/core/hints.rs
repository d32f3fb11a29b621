//! Per-function prompt hints
//!
//! Two static tables keyed by function name: a subject description and the
//! extra instructions that steer the model toward varied, well-typed arguments.
//! Names missing from either table (or from the registry) get empty hints.

use crate::core::tools::ToolRegistry;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static SUBJECTS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("calculate_bmi", "queries for the calculate_bmi function that calculates BMI and returns the BMI category and health recommendations"),
        ("get_weather_info", "queries for the get_weather_info function that returns the current time in PST, along with weather and temperature for a given city"),
        ("calculate_area", "queries for function that calculates an area of a square or rectangle"),
        ("get_timezone", "queries for function that returns the timezone of a given city in the world"),
        ("calculate_trip_cost", "queries for the calculate_trip_cost function that calculates the total cost of a trip based on distance, fuel efficiency, and fuel cost"),
        ("zodiac_sign", "queries for the zodiac_sign function that returns the zodiac sign for a given birthdate"),
        ("power", "queries for the power function that calculates the power of a base raised to an exponent and returns the result"),
        ("get_capital", "queries for function that returns the capital of a given country"),
        ("count_letter", "queries for function that counts specific given letter in a word"),
        ("sentiment_analysis", "queries asking for the sentiment of a sentence using the sentiment_analysis function that analyzes the sentiment of the given text"),
        ("difference_of_squares", "queries for the difference_of_squares function that calculates the difference between the squares of two numbers"),
        ("simple_interest", "queries for the simple_interest function that calculates simple interest"),
        ("password_generator", "queries for the password_generator function that generates a random password with options to include numbers, special characters, and capital letters"),
        ("date_difference", "queries for the date_difference function that calculates the number of days between two dates"),
        ("calculate_tip", "queries for the calculate_tip function that calculates the tip amount based on the total expenditure, country, and service quality"),
        ("playlist_duration_calculator", "queries for the playlist_duration_calculator function that calculates the total duration of a playlist"),
    ])
});

static EXTRAS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("calculate_bmi", "make the queries very unique and interesting. all four arguments MUST be in the query. the arguments must be chosen at random. Include a mix of valid numbers, with various ages and genders."),
        ("get_weather_info", "the arguments must be chosen at random. Choose cities that you wouldn't normally choose. The queries must be interesting."),
        ("calculate_area", "the arguments must be chosen at random. Make all the lengths be floats to the thousandths decimal."),
        ("get_timezone", "the arguments must be chosen at random. The four arguments must be in the query. Add some variance to the queries. Choose cities from Japan."),
        ("calculate_trip_cost", "the arguments must be chosen at random and they MUST be the correct type. Include a mix of numbers."),
        ("zodiac_sign", "the arguments must be chosen at random. Choose birthdays you wouldn't normally choose."),
        ("power", "the arguments must be chosen at random, including both positive and negative floats with 3 decimal places or greater for the base and exponent."),
        ("get_capital", "the arguments must be chosen at random. Choose European countries you wouldn't normally choose."),
        ("count_letter", "the arguments must be chosen at random. Make it a made up word. Don't use the same argument twice."),
        ("sentiment_analysis", "the arguments must be chosen at random. Use a mix of positive, negative, and neutral sentences."),
        ("difference_of_squares", "the arguments must be chosen at random. Include both positive and negative floats."),
        ("simple_interest", "the arguments must be chosen at random. Include a mix of valid numbers for principal, rate, and time."),
        ("password_generator", "the arguments must be chosen at random. Include a mix of lengths, and combinations of use_numbers, use_special_chars, and use_caps. Bools must in double quotes."),
        ("date_difference", "the arguments must be chosen at random. Include a mix of valid dates and boolean values for include_end."),
        ("calculate_tip", "the arguments must be chosen at random. Include a mix of valid numbers for total_spend, various countries, and service qualities."),
        ("playlist_duration_calculator", "the arguments must be chosen at random. Include a mix of valid numbers for number_of_songs, average_song_length, and break_duration, with various boolean values for include_breaks."),
    ])
});

/// Subject / extra-instruction pair for one function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hints {
    pub subject: String,
    pub extra: String,
}

/// Resolves hint strings from the static tables and the tool registry
pub struct HintBook {
    registry: Arc<ToolRegistry>,
}

impl HintBook {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        HintBook { registry }
    }

    pub fn hints(&self, function: &str, num_examples: usize) -> Hints {
        let (Some(subject), Some(extra), Some(signature)) = (
            SUBJECTS.get(function),
            EXTRAS.get(function),
            self.registry.signature_phrase(function),
        ) else {
            debug!("[HintBook] No hints for '{}', using empty strings", function);
            return Hints::default();
        };

        Hints {
            subject: format!("{}; {}", subject, signature),
            extra: format!(
                "{} Don't make chit-chat and don't have an introduction. Generate {} examples",
                extra, num_examples
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> HintBook {
        HintBook::new(Arc::new(ToolRegistry::builtin()))
    }

    #[test]
    fn known_function_gets_signature_and_count() {
        let hints = book().hints("power", 7);
        assert!(hints.subject.starts_with("queries for the power function"));
        assert!(hints
            .subject
            .ends_with("; it takes two arguments base: float, exponent: float"));
        assert!(hints.extra.ends_with("Generate 7 examples"));
    }

    #[test]
    fn unknown_function_maps_to_empty_hints() {
        assert_eq!(book().hints("launch_rockets", 3), Hints::default());
    }

    #[test]
    fn registered_tool_without_table_entry_is_empty() {
        // translate is in the catalog but has no hint entry
        assert_eq!(book().hints("translate", 3), Hints::default());
    }

    #[test]
    fn every_table_entry_is_registered() {
        let registry = ToolRegistry::builtin();
        for name in SUBJECTS.keys().chain(EXTRAS.keys()) {
            assert!(registry.contains(name), "{} missing from registry", name);
        }
    }
}
