//! Reference anchor and character bible models.
//!
//! The master anchor is the first visual reference of a run: an uploaded
//! image plus the character bible derived from it. Both are set once and
//! stay immutable for the whole run so every shot is generated against the
//! same identity.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured character description used to keep identity stable across
/// shots.
///
/// Every field is always populated: anything the vision service omits is
/// synthesized from the subject name, so downstream consumers never branch
/// on a missing bible field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CharacterBible {
    /// Name the bible was built for
    pub subject_name: String,
    /// Front-view appearance description
    pub front_view: String,
    /// Side-view appearance description
    pub side_view: String,
    /// Back-view appearance description
    pub back_view: String,
    /// Hair description
    pub hair: String,
    /// Clothing description
    pub clothing: String,
    /// Distinguishing features (scars, accessories, posture)
    pub distinguishing_features: String,
    /// Things that must NOT appear, to prevent identity drift
    pub negative_prompts: Vec<String>,
}

impl CharacterBible {
    /// Build a complete bible from possibly-partial service output.
    ///
    /// Omitted fields fall back to fixed templates keyed on the subject
    /// name, and the negative-prompt list always carries the baseline
    /// drift guards.
    pub fn from_partial(
        subject_name: impl Into<String>,
        front_view: Option<String>,
        side_view: Option<String>,
        back_view: Option<String>,
        hair: Option<String>,
        clothing: Option<String>,
        distinguishing_features: Option<String>,
        negative_prompts: Vec<String>,
    ) -> Self {
        let subject_name = subject_name.into();
        let filled = |value: Option<String>, template: String| {
            value.filter(|v| !v.trim().is_empty()).unwrap_or(template)
        };

        let mut negatives = negative_prompts;
        if negatives.is_empty() {
            negatives = Self::default_negative_prompts(&subject_name);
        }

        Self {
            front_view: filled(
                front_view,
                format!("{} seen from the front, consistent facial features", subject_name),
            ),
            side_view: filled(
                side_view,
                format!("{} in profile, same face and build as the front view", subject_name),
            ),
            back_view: filled(
                back_view,
                format!("{} from behind, same hair and clothing silhouette", subject_name),
            ),
            hair: filled(hair, format!("{}'s hair unchanged between shots", subject_name)),
            clothing: filled(
                clothing,
                format!("{} wearing the same outfit throughout", subject_name),
            ),
            distinguishing_features: filled(
                distinguishing_features,
                format!("no new marks or accessories on {}", subject_name),
            ),
            negative_prompts: negatives,
            subject_name,
        }
    }

    /// Baseline negative prompts guarding against identity drift.
    pub fn default_negative_prompts(subject_name: &str) -> Vec<String> {
        vec![
            format!("a different person than {}", subject_name),
            "changed hairstyle or hair color".to_string(),
            "different clothing or costume change".to_string(),
            "extra characters not in the scene description".to_string(),
        ]
    }

    /// Render the bible as prompt text attached to every generation call.
    pub fn to_prompt_block(&self) -> String {
        format!(
            "CHARACTER: {}\nFront: {}\nSide: {}\nBack: {}\nHair: {}\nClothing: {}\nFeatures: {}\nNever show: {}",
            self.subject_name,
            self.front_view,
            self.side_view,
            self.back_view,
            self.hair,
            self.clothing,
            self.distinguishing_features,
            self.negative_prompts.join("; "),
        )
    }
}

/// The first visual reference that seeds the entire run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MasterAnchor {
    /// Uploaded reference image
    pub image_url: String,
    /// Character bible derived from the image
    pub character_bible: CharacterBible,
}

impl MasterAnchor {
    pub fn new(image_url: impl Into<String>, character_bible: CharacterBible) -> Self {
        Self {
            image_url: image_url.into(),
            character_bible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_bible_is_fully_synthesized() {
        let bible = CharacterBible::from_partial(
            "Mara",
            Some("Mara, mid-30s, sharp jawline".to_string()),
            None,
            None,
            Some("short black hair".to_string()),
            None,
            None,
            vec![],
        );

        assert_eq!(bible.front_view, "Mara, mid-30s, sharp jawline");
        assert!(bible.side_view.contains("Mara"));
        assert!(bible.back_view.contains("Mara"));
        assert_eq!(bible.hair, "short black hair");
        assert!(!bible.clothing.is_empty());
        assert!(!bible.distinguishing_features.is_empty());
        assert!(!bible.negative_prompts.is_empty());
    }

    #[test]
    fn test_blank_fields_fall_back_to_templates() {
        let bible = CharacterBible::from_partial(
            "Mara",
            Some("   ".to_string()),
            None,
            None,
            None,
            None,
            None,
            vec!["duplicate characters".to_string()],
        );

        assert!(bible.front_view.contains("Mara"));
        assert_eq!(bible.negative_prompts, vec!["duplicate characters".to_string()]);
    }

    #[test]
    fn test_prompt_block_carries_negatives() {
        let bible = CharacterBible::from_partial("Mara", None, None, None, None, None, None, vec![]);
        let block = bible.to_prompt_block();
        assert!(block.contains("CHARACTER: Mara"));
        assert!(block.contains("Never show:"));
    }
}
