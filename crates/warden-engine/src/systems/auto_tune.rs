//! Auto-tuning pass — reconciles live classifications with the
//! persisted pattern book.
//!
//! Runs on a slow timer: syncs classifier output into patterns and
//! applies danger suggestions for types we are confident about.

use tracing::debug;

use warden_brain::classifier::BehaviorClassifier;
use warden_brain::patterns::PatternBook;

/// Classification confidence required before a danger suggestion is
/// applied automatically.
const AUTO_APPLY_CONFIDENCE: f64 = 0.6;

/// Run one auto-tune pass. Returns the number of danger adjustments
/// applied.
pub fn run(classifier: &BehaviorClassifier, patterns: &mut PatternBook, now: u64) -> u32 {
    let mut applied = 0;
    let classes: Vec<_> = classifier.table().cloned().collect();
    for class in classes {
        if class.confidence <= 0.0 {
            continue;
        }
        patterns.apply_class(&class, now);
        if class.confidence < AUTO_APPLY_CONFIDENCE {
            continue;
        }
        if let Some(suggestion) = patterns.suggest_danger(&class.name, class.danger) {
            if patterns.apply_suggestion(&suggestion, false, now) {
                applied += 1;
                debug!(
                    name = %suggestion.name,
                    from = suggestion.current,
                    toward = suggestion.suggested,
                    "auto-tuned danger"
                );
            }
        }
    }
    applied
}
