//! Natural-language instruction construction for the recommendation model.
//!
//! The instruction is assembled from a fixed sequence of optional clause
//! builders so the output is deterministic and each clause is testable on
//! its own. Criteria lists are rendered in their original order.

use crate::models::PlaylistCriteria;

/// Domain-expert framing with an accuracy emphasis. The response contract is
/// restated here so the model sees it in both the system and user turns.
pub const SYSTEM_PROMPT: &str = "You are a music curator with encyclopedic knowledge of \
artists, discographies and regional scenes. You only recommend songs that actually exist \
and you get artist and title spellings right, because your answers are matched against a \
streaming catalog. Respond with a single JSON object and no other text.";

/// Builds the user instruction for the given criteria.
///
/// Same criteria in, byte-identical string out.
pub fn build_instruction(criteria: &PlaylistCriteria) -> String {
    let builders: [fn(&PlaylistCriteria) -> Option<String>; 6] = [
        subgenre_clause,
        region_clause,
        language_clause,
        mood_clause,
        era_clause,
        user_prompt_clause,
    ];

    let mut parts = vec![opening_clause(criteria)];
    parts.extend(builders.iter().filter_map(|build| build(criteria)));
    parts.push(obscurity_directive(criteria.uniqueness).to_string());
    parts.push(OUTPUT_FORMAT.to_string());
    parts.join(" ")
}

const OUTPUT_FORMAT: &str = "Return a JSON object with a \"tracks\" array. Every item must \
have \"artist\" and \"title\" fields and may include optional \"year\", \"album\" and \
\"reason\" fields.";

fn opening_clause(criteria: &PlaylistCriteria) -> String {
    match criteria.genres.as_slice() {
        [only] => format!(
            "Create a playlist of {} songs in the {} genre.",
            criteria.song_count, only
        ),
        many => format!(
            "Create a playlist of {} songs in these genres: {}.",
            criteria.song_count,
            many.join(", ")
        ),
    }
}

fn subgenre_clause(criteria: &PlaylistCriteria) -> Option<String> {
    match criteria.subgenres.as_slice() {
        [] => None,
        [only] => Some(format!("Lean into the {} subgenre.", only)),
        many => Some(format!("Lean into these subgenres: {}.", many.join(", "))),
    }
}

fn region_clause(criteria: &PlaylistCriteria) -> Option<String> {
    match criteria.regions.as_slice() {
        [] => None,
        [only] => Some(format!("The songs should come from {}.", only)),
        many => Some(format!(
            "The songs should come from these regions: {}.",
            many.join(", ")
        )),
    }
}

fn language_clause(criteria: &PlaylistCriteria) -> Option<String> {
    match criteria.languages.as_slice() {
        [] => None,
        [only] => Some(format!("The lyrics should be in {}.", only)),
        many => Some(format!(
            "The lyrics should be in these languages: {}.",
            many.join(", ")
        )),
    }
}

fn mood_clause(criteria: &PlaylistCriteria) -> Option<String> {
    match criteria.moods.as_slice() {
        [] => None,
        [only] => Some(format!("The playlist should come with a {} mood.", only)),
        many => Some(format!(
            "The playlist should come with these moods: {}.",
            many.join(", ")
        )),
    }
}

fn era_clause(criteria: &PlaylistCriteria) -> Option<String> {
    match criteria.eras.as_slice() {
        [] => None,
        [only] => Some(format!("The songs should be from the {}.", only)),
        many => Some(format!(
            "The songs should be from these eras: {}.",
            many.join(", ")
        )),
    }
}

fn user_prompt_clause(criteria: &PlaylistCriteria) -> Option<String> {
    criteria.user_prompt.as_ref().map(|p| {
        format!(
            "Additional request from the listener, honor it as long as it does not \
conflict with the constraints above: {}",
            p
        )
    })
}

/// Obscurity directive selected by `uniqueness`. Boundaries are inclusive:
/// 8 and up is obscure, 5 through 7 is mixed, below 5 is popular.
pub fn obscurity_directive(uniqueness: u8) -> &'static str {
    if uniqueness >= 8 {
        "Focus on very obscure hidden gems."
    } else if uniqueness >= 5 {
        "Pick a mix of well-known tracks and deeper cuts."
    } else {
        "Focus on popular, well-known tracks."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> PlaylistCriteria {
        PlaylistCriteria {
            genres: vec!["rock".to_string()],
            subgenres: vec![],
            regions: vec![],
            languages: vec![],
            moods: vec![],
            eras: vec![],
            uniqueness: 5,
            song_count: 10,
            user_prompt: None,
        }
    }

    #[test]
    fn test_instruction_is_deterministic() {
        let mut c = criteria();
        c.genres = vec!["rock".to_string(), "jazz".to_string()];
        c.moods = vec!["dark".to_string()];
        c.user_prompt = Some("no ballads".to_string());
        assert_eq!(build_instruction(&c), build_instruction(&c));
    }

    #[test]
    fn test_single_genre_is_singular_after_the_list() {
        let prompt = build_instruction(&criteria());
        assert!(prompt.contains("in the rock genre"));
        assert!(!prompt.contains("genres"));
    }

    #[test]
    fn test_multiple_genres_pluralize() {
        let mut c = criteria();
        c.genres = vec!["rock".to_string(), "jazz".to_string()];
        let prompt = build_instruction(&c);
        assert!(prompt.contains("these genres: rock, jazz"));
    }

    #[test]
    fn test_empty_lists_omit_their_clauses() {
        let prompt = build_instruction(&criteria());
        assert!(!prompt.contains("subgenre"));
        assert!(!prompt.contains("from these regions"));
        assert!(!prompt.contains("languages"));
        assert!(!prompt.contains("mood"));
        assert!(!prompt.contains("eras"));
    }

    #[test]
    fn test_singular_and_plural_phrasing() {
        let mut c = criteria();
        c.regions = vec!["Japan".to_string()];
        c.languages = vec!["Spanish".to_string(), "Portuguese".to_string()];
        c.moods = vec!["melancholic".to_string()];
        c.eras = vec!["90s".to_string(), "2000s".to_string()];
        let prompt = build_instruction(&c);
        assert!(prompt.contains("come from Japan."));
        assert!(!prompt.contains("these regions"));
        assert!(prompt.contains("in these languages: Spanish, Portuguese."));
        assert!(prompt.contains("with a melancholic mood."));
        assert!(prompt.contains("from these eras: 90s, 2000s."));
    }

    #[test]
    fn test_obscurity_boundaries() {
        assert_eq!(obscurity_directive(8), "Focus on very obscure hidden gems.");
        assert_eq!(obscurity_directive(10), "Focus on very obscure hidden gems.");
        assert_eq!(
            obscurity_directive(5),
            "Pick a mix of well-known tracks and deeper cuts."
        );
        assert_eq!(
            obscurity_directive(7),
            "Pick a mix of well-known tracks and deeper cuts."
        );
        assert_eq!(obscurity_directive(4), "Focus on popular, well-known tracks.");
        assert_eq!(obscurity_directive(1), "Focus on popular, well-known tracks.");
    }

    #[test]
    fn test_user_prompt_appended_verbatim() {
        let mut c = criteria();
        c.user_prompt = Some("only songs under four minutes".to_string());
        let prompt = build_instruction(&c);
        assert!(prompt.contains("only songs under four minutes"));
        assert!(prompt.contains("does not conflict with the constraints above"));
    }

    #[test]
    fn test_clause_order_is_fixed() {
        let mut c = criteria();
        c.subgenres = vec!["grunge".to_string()];
        c.eras = vec!["90s".to_string()];
        let prompt = build_instruction(&c);
        let subgenre_at = prompt.find("subgenre").unwrap();
        let era_at = prompt.find("from the 90s").unwrap();
        let format_at = prompt.find("JSON object").unwrap();
        assert!(subgenre_at < era_at);
        assert!(era_at < format_at);
    }
}
