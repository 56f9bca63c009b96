//! Trigger-word safety checker.
//!
//! Scans a prompt for a fixed, ordered table of trigger words and rolls the
//! matches up into a risk level and a 20-100 score. This is a display
//! heuristic, not a classifier: matching is plain case-insensitive substring
//! containment, so "attackable" matches "attack".

use serde::{Deserialize, Serialize};

/// Lowest score a prompt can get, no matter how many triggers match.
pub const SCORE_FLOOR: u8 = 20;

/// Points deducted per matched trigger.
pub const PENALTY_PER_TRIGGER: u8 = 25;

/// Risk attached to a single trigger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerRisk {
    Medium,
    High,
}

/// Aggregate risk of a checked prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// One entry of the trigger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub word: String,
    pub risk: TriggerRisk,
    pub suggestion: String,
}

/// Result of [`check_prompt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyCheckResult {
    pub risk_level: RiskLevel,
    pub triggers: Vec<Trigger>,
    pub score: u8,
    pub is_likely_safe: bool,
}

const DEFAULT_TABLE: [(&str, TriggerRisk, &str); 5] = [
    (
        "hack",
        TriggerRisk::High,
        "Try \"work around\" or \"troubleshoot\" instead",
    ),
    (
        "manipulate",
        TriggerRisk::Medium,
        "Try \"adjust\" or \"transform\" instead",
    ),
    (
        "attack",
        TriggerRisk::High,
        "Try \"approach\" or \"address\" instead",
    ),
    (
        "defeat",
        TriggerRisk::Medium,
        "Try \"overcome\" or \"solve\" instead",
    ),
    (
        "trick",
        TriggerRisk::Medium,
        "Try \"technique\" or \"method\" instead",
    ),
];

/// The built-in trigger table, in match order.
pub fn default_triggers() -> Vec<Trigger> {
    DEFAULT_TABLE
        .iter()
        .map(|(word, risk, suggestion)| Trigger {
            word: word.to_string(),
            risk: *risk,
            suggestion: suggestion.to_string(),
        })
        .collect()
}

/// Check `text` against `table`.
///
/// Matches are reported in table order, each entry at most once. Entries
/// with an empty word never match.
pub fn check_prompt(text: &str, table: &[Trigger]) -> SafetyCheckResult {
    let haystack = text.to_lowercase();

    let triggers: Vec<Trigger> = table
        .iter()
        .filter(|t| !t.word.is_empty() && haystack.contains(&t.word.to_lowercase()))
        .cloned()
        .collect();

    let risk_level = if triggers.iter().any(|t| t.risk == TriggerRisk::High) {
        RiskLevel::High
    } else if triggers.iter().any(|t| t.risk == TriggerRisk::Medium) {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let penalty = triggers.len().saturating_mul(PENALTY_PER_TRIGGER as usize);
    let score = 100usize.saturating_sub(penalty).max(SCORE_FLOOR as usize) as u8;

    SafetyCheckResult {
        risk_level,
        triggers,
        score,
        is_likely_safe: risk_level == RiskLevel::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(result: &SafetyCheckResult) -> Vec<&str> {
        result.triggers.iter().map(|t| t.word.as_str()).collect()
    }

    #[test]
    fn test_empty_prompt_is_safe() {
        let result = check_prompt("", &default_triggers());
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.triggers.is_empty());
        assert_eq!(result.score, 100);
        assert!(result.is_likely_safe);
    }

    #[test]
    fn test_single_high_trigger() {
        let result = check_prompt("How can I hack this?", &default_triggers());
        assert_eq!(words(&result), vec!["hack"]);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.score, 75);
        assert!(!result.is_likely_safe);
    }

    #[test]
    fn test_three_triggers() {
        let result = check_prompt("hack and manipulate and attack", &default_triggers());
        assert_eq!(result.triggers.len(), 3);
        assert_eq!(result.score, 25);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_score_floor() {
        let result = check_prompt(
            "hack, manipulate, attack, defeat, trick",
            &default_triggers(),
        );
        assert_eq!(result.triggers.len(), 5);
        assert_eq!(result.score, SCORE_FLOOR);
    }

    #[test]
    fn test_medium_only() {
        let result = check_prompt("a neat trick to defeat procrastination", &default_triggers());
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.score, 50);
        assert!(!result.is_likely_safe);
    }

    #[test]
    fn test_matches_in_table_order_not_input_order() {
        let result = check_prompt("Trick them, then ATTACK, then hack", &default_triggers());
        assert_eq!(words(&result), vec!["hack", "attack", "trick"]);
    }

    #[test]
    fn test_repeated_word_counts_once() {
        let result = check_prompt("hack hack hack", &default_triggers());
        assert_eq!(result.triggers.len(), 1);
        assert_eq!(result.score, 75);
    }

    #[test]
    fn test_substring_matches_inside_longer_words() {
        let result = check_prompt("is this attackable? see hacker-news", &default_triggers());
        assert_eq!(words(&result), vec!["hack", "attack"]);
    }

    #[test]
    fn test_custom_table_is_used() {
        let table = vec![Trigger {
            word: "Exploit".to_string(),
            risk: TriggerRisk::Medium,
            suggestion: "Try \"use\"".to_string(),
        }];
        let result = check_prompt("exploit the cache", &table);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        // Default words are not in the custom table
        assert!(check_prompt("hack", &table).is_likely_safe);
    }

    #[test]
    fn test_empty_trigger_word_never_matches() {
        let table = vec![Trigger {
            word: String::new(),
            risk: TriggerRisk::High,
            suggestion: String::new(),
        }];
        assert!(check_prompt("anything", &table).is_likely_safe);
    }

    #[test]
    fn test_idempotent() {
        let table = default_triggers();
        let text = "Manipulate the data to defeat the benchmark";
        assert_eq!(check_prompt(text, &table), check_prompt(text, &table));
    }

    #[test]
    fn test_serializes_camel_case() {
        let result = check_prompt("hack", &default_triggers());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["riskLevel"], "high");
        assert_eq!(json["isLikelySafe"], false);
        assert_eq!(json["triggers"][0]["risk"], "high");
    }
}
