//! Built-in configuration: the default style quiz and the choice lists the
//! room form offers.

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::prompt::RoomEditRequest;
use crate::quiz::QuizCatalog;

const BUILTIN_QUIZ_JSON: &str = include_str!("../data/style_quiz.json");

pub const ROOM_TYPES: &[&str] = &[
    "Bedroom",
    "Living Room",
    "Playroom",
    "Office",
    "Bathroom",
    "Kitchen",
    "Dining Room",
];

pub const DESIGN_STYLES: &[&str] = &[
    "Modern",
    "Classic",
    "Cottage Core",
    "Luxurious",
    "Mid-Century Modern",
    "Retro-Futuristic",
    "Vintage",
    "Minimalist",
    "Industrial",
    "Scandinavian",
];

pub const CHANGE_OPTIONS: &[&str] = &["Colors", "Furniture", "Lighting", "Decor"];

pub const WOOD_FINISHES: &[&str] = &[
    "Dark Oak",
    "Light Oak",
    "Walnut",
    "Mahogany",
    "Pine",
    "Maple",
    "Cherry",
];

impl QuizCatalog {
    /// The default quiz shipped with the crate
    pub fn builtin() -> EngineResult<Self> {
        Self::from_json(BUILTIN_QUIZ_JSON)
    }
}

/// A list of choices plus the preselected value(s)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice<T> {
    pub choices: Vec<String>,
    pub default: T,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Options for each field of the room form. Advisory only: the prompt
/// builder accepts any string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormChoices {
    pub room_types: Choice<String>,
    pub design_styles: Choice<String>,
    pub change_options: Choice<Vec<String>>,
    pub wood_finishes: Choice<String>,
}

impl Default for FormChoices {
    fn default() -> Self {
        Self {
            room_types: Choice {
                choices: owned(ROOM_TYPES),
                default: "Living Room".to_string(),
            },
            design_styles: Choice {
                choices: owned(DESIGN_STYLES),
                default: "Modern".to_string(),
            },
            change_options: Choice {
                choices: owned(CHANGE_OPTIONS),
                default: owned(&["Colors", "Furniture"]),
            },
            wood_finishes: Choice {
                choices: owned(WOOD_FINISHES),
                default: "Dark Oak".to_string(),
            },
        }
    }
}

impl FormChoices {
    /// A request prefilled with every default, no color picked
    pub fn default_request(&self) -> RoomEditRequest {
        RoomEditRequest {
            room_type: self.room_types.default.clone(),
            change_options: self.change_options.default.clone(),
            aesthetic: self.design_styles.default.clone(),
            color: String::new(),
            wood_type: self.wood_finishes.default.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{QuizOutcome, QuizSubmission};

    #[test]
    fn test_builtin_quiz_loads() {
        let quiz = QuizCatalog::builtin().unwrap();

        assert_eq!(quiz.len(), 22);
        for question in quiz.questions() {
            assert_eq!(question.options.len(), 3);
            for option in &question.options {
                assert!(question.style_for(option).is_some());
            }
        }
    }

    #[test]
    fn test_builtin_quiz_first_options() {
        let quiz = QuizCatalog::builtin().unwrap();
        let submission: QuizSubmission = quiz
            .questions()
            .iter()
            .map(|q| q.options[0].clone())
            .collect();

        let QuizOutcome::Recommendation(rec) = quiz.evaluate(&submission).unwrap() else {
            panic!("expected a recommendation");
        };

        assert_eq!(rec.style, "Cottage Core");
        assert_eq!(
            rec.breakdown,
            "• Cottage Core: 5 matches\n\
             • Modern: 4 matches\n\
             • Classic: 3 matches\n\
             • Mid-Century Modern: 3 matches\n\
             • Minimalist: 3 matches\n\
             • Industrial: 2 matches\n\
             • Scandinavian: 2 matches"
        );
    }

    #[test]
    fn test_builtin_quiz_styles_are_known() {
        let quiz = QuizCatalog::builtin().unwrap();
        for question in quiz.questions() {
            for style in question.styles.values() {
                assert!(DESIGN_STYLES.contains(&style.as_str()), "unknown style {}", style);
            }
        }
    }

    #[test]
    fn test_default_request() {
        let request = FormChoices::default().default_request();

        assert_eq!(request.room_type, "Living Room");
        assert_eq!(request.aesthetic, "Modern");
        assert_eq!(request.change_options, vec!["Colors", "Furniture"]);
        assert_eq!(request.wood_type, "Dark Oak");
        assert!(request.color.is_empty());
    }
}
