//! Frozen scoring policy.
//!
//! Weights and thresholds are fixed constants. A strong textual cue alone
//! reaches `High`; a visual hit lifts a secondary textual cue (2 + 3) to
//! `High` as well.

use grievance_complaint_models::ComplaintPriority;

use crate::keywords::KeywordTables;
use crate::vision::Prediction;

/// Points for any emergency keyword.
pub const EMERGENCY_TEXT_POINTS: u32 = 5;
/// Points for a secondary keyword when no emergency keyword matched.
pub const SECONDARY_TEXT_POINTS: u32 = 2;
/// Points for visual hazard evidence. Applied at most once.
pub const VISUAL_POINTS: u32 = 3;
/// Minimum total for `High`.
pub const HIGH_THRESHOLD: u32 = 5;
/// Minimum total for `Medium`.
pub const MEDIUM_THRESHOLD: u32 = 2;
/// A prediction must be strictly above this probability to be trusted.
pub const CONFIDENCE_THRESHOLD: f32 = 0.15;
/// Number of predictions requested from the image model.
pub const TOP_K: usize = 5;

/// Builds the lowercase text context from a description and category.
#[must_use]
pub fn text_context(description: &str, category: &str) -> String {
    format!("{description} {category}").to_lowercase()
}

/// Scores the text context against the keyword tables.
#[must_use]
pub fn text_score(tables: &KeywordTables, context: &str) -> u32 {
    if tables.emergency.iter().any(|k| context.contains(k.as_str())) {
        EMERGENCY_TEXT_POINTS
    } else if tables.secondary.iter().any(|k| context.contains(k.as_str())) {
        SECONDARY_TEXT_POINTS
    } else {
        0
    }
}

/// Whether any confident prediction shows a hazard.
#[must_use]
pub fn has_visual_evidence(
    tables: &KeywordTables,
    predictions: &[Prediction],
    context: &str,
) -> bool {
    predictions
        .iter()
        .filter(|p| p.probability > CONFIDENCE_THRESHOLD)
        .any(|p| {
            let label = p.label.to_lowercase();
            tables
                .visual_classes
                .iter()
                .any(|c| label.contains(c.as_str()))
                || tables.visual_gates.iter().any(|g| {
                    label.contains(g.label.as_str()) && context.contains(g.requires.as_str())
                })
        })
}

/// Maps a total score to a priority.
#[must_use]
pub const fn decide(score: u32) -> ComplaintPriority {
    if score >= HIGH_THRESHOLD {
        ComplaintPriority::High
    } else if score >= MEDIUM_THRESHOLD {
        ComplaintPriority::Medium
    } else {
        ComplaintPriority::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> KeywordTables {
        KeywordTables::default()
    }

    #[test]
    fn context_is_lowercase_and_joined() {
        assert_eq!(
            text_context("Pipe BURST", "water_supply"),
            "pipe burst water_supply"
        );
    }

    #[test]
    fn emergency_keyword_wins_over_secondary() {
        let ctx = text_context("broken electric pole sparking", "streetlight");
        assert_eq!(text_score(&tables(), &ctx), EMERGENCY_TEXT_POINTS);
    }

    #[test]
    fn secondary_keyword_only() {
        let ctx = text_context("big pothole near the market", "road_potholes");
        assert_eq!(text_score(&tables(), &ctx), SECONDARY_TEXT_POINTS);
    }

    #[test]
    fn no_keyword() {
        let ctx = text_context("paint is fading", "sanitation");
        assert_eq!(text_score(&tables(), &ctx), 0);
    }

    #[test]
    fn thresholds() {
        assert_eq!(decide(0), ComplaintPriority::Low);
        assert_eq!(decide(1), ComplaintPriority::Low);
        assert_eq!(decide(2), ComplaintPriority::Medium);
        assert_eq!(decide(4), ComplaintPriority::Medium);
        assert_eq!(decide(5), ComplaintPriority::High);
        assert_eq!(decide(8), ComplaintPriority::High);
    }

    #[test]
    fn confidence_is_strictly_greater() {
        let ctx = text_context("garbage", "waste_management");
        assert!(!has_visual_evidence(
            &tables(),
            &[Prediction::new("fire engine", 0.15)],
            &ctx
        ));
        assert!(has_visual_evidence(
            &tables(),
            &[Prediction::new("fire engine", 0.151)],
            &ctx
        ));
    }

    #[test]
    fn water_needs_leak_in_text() {
        let preds = [Prediction::new("water bottle", 0.9)];
        let without = text_context("broken tap", "sanitation");
        let with = text_context("small leak at the tap", "sanitation");
        assert!(!has_visual_evidence(&tables(), &preds, &without));
        assert!(has_visual_evidence(&tables(), &preds, &with));
    }

    #[test]
    fn pole_needs_electric_in_text() {
        let preds = [Prediction::new("pole", 0.6)];
        let without = text_context("stuck gate", "sanitation");
        let with = text_context("electric line hanging", "streetlight");
        assert!(!has_visual_evidence(&tables(), &preds, &without));
        assert!(has_visual_evidence(&tables(), &preds, &with));
    }

    #[test]
    fn labels_match_case_insensitively() {
        let ctx = text_context("garbage", "waste_management");
        assert!(has_visual_evidence(
            &tables(),
            &[Prediction::new("Tow Truck, wrecker", 0.4)],
            &ctx
        ));
    }
}
