//! Prompt quality scorer.
//!
//! Five fixed-weight presence checks, 20 points each, plus a list of
//! independent issue rules. Pure and total over any input.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const POINTS_PER_SIGNAL: u8 = 20;
const MIN_SCORE: u8 = 20;
const MAX_SCORE: u8 = 100;
const MAX_SUGGESTIONS: usize = 3;

static CONTEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)context|background|situation|scenario").unwrap());

static CONSTRAINTS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)format|length|style|don't|avoid|must|should").unwrap());

// "e.g." is matched literally. With bare dots it would also fire on words
// such as "edge" or "eggs".
static EXAMPLES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)example|like|such as|e\.g\.|for instance").unwrap());

static SPECIFICS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)specific|exactly|precisely|detailed|comprehensive").unwrap());

static IMPERATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)do |create |write |analyze ").unwrap());

/// A problem detected in a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Issue {
    /// Fewer than 10 words.
    Vague,
    /// More than 200 words.
    Overloading,
    MissingContext,
    /// Long prompt without any example.
    NoExamples,
    /// No imperative verb telling the model what to do.
    OnlyNegative,
}

impl Issue {
    pub fn label(&self) -> &'static str {
        match self {
            Issue::Vague => "vague",
            Issue::Overloading => "overloading",
            Issue::MissingContext => "missing-context",
            Issue::NoExamples => "no-examples",
            Issue::OnlyNegative => "only-negative",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Issue::Vague => "Too short to tell the model what you want",
            Issue::Overloading => "Too many asks packed into one prompt",
            Issue::MissingContext => "No background or situation given",
            Issue::NoExamples => "Long prompt with no example of the expected output",
            Issue::OnlyNegative => "Says what to avoid but never what to do",
        }
    }
}

/// Result of [`analyze_prompt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptQuality {
    pub score: u8,
    pub word_count: usize,
    pub issues: Vec<Issue>,
    pub suggestions: Vec<String>,
}

/// Presence checks, kept separate so suggestions can reuse them.
#[derive(Debug, Clone, Copy)]
struct Signals {
    long_enough: bool,
    has_context: bool,
    has_constraints: bool,
    has_examples: bool,
    has_specifics: bool,
}

impl Signals {
    fn detect(prompt: &str, word_count: usize) -> Self {
        Self {
            long_enough: word_count > 10,
            has_context: CONTEXT_RE.is_match(prompt),
            has_constraints: CONSTRAINTS_RE.is_match(prompt),
            has_examples: EXAMPLES_RE.is_match(prompt),
            has_specifics: SPECIFICS_RE.is_match(prompt),
        }
    }

    fn score(&self) -> u8 {
        let hits = [
            self.long_enough,
            self.has_context,
            self.has_constraints,
            self.has_examples,
            self.has_specifics,
        ]
        .iter()
        .filter(|&&b| b)
        .count() as u8;
        (hits * POINTS_PER_SIGNAL).clamp(MIN_SCORE, MAX_SCORE)
    }
}

/// Count whitespace-separated words. Blank input has zero words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Score a prompt and list its issues and up to three suggestions.
pub fn analyze_prompt(prompt: &str) -> PromptQuality {
    let wc = word_count(prompt);
    let signals = Signals::detect(prompt, wc);
    let score = signals.score();

    let mut issues = Vec::new();
    if wc < 10 {
        issues.push(Issue::Vague);
    }
    if wc > 200 {
        issues.push(Issue::Overloading);
    }
    if !signals.has_context {
        issues.push(Issue::MissingContext);
    }
    if !signals.has_examples && wc > 50 {
        issues.push(Issue::NoExamples);
    }
    if !IMPERATIVE_RE.is_match(prompt) {
        issues.push(Issue::OnlyNegative);
    }

    PromptQuality {
        score,
        word_count: wc,
        issues,
        suggestions: suggestions_for(&signals, score),
    }
}

fn suggestions_for(signals: &Signals, score: u8) -> Vec<String> {
    let candidates = [
        (
            !signals.has_context,
            "Add background: who is asking, and what situation is this for?",
        ),
        (
            !signals.has_examples,
            "Include an example of the output you want, e.g. a sample answer",
        ),
        (
            !signals.has_constraints,
            "State the format, length, or style the answer must follow",
        ),
        (
            !signals.has_specifics,
            "Be specific: name exact quantities, audiences, or criteria",
        ),
        (
            score < 60,
            "Give more detail so the model has less to guess",
        ),
    ];

    candidates
        .iter()
        .filter(|(applies, _)| *applies)
        .take(MAX_SUGGESTIONS)
        .map(|(_, text)| text.to_string())
        .collect()
}
