//! Tutor reply adapter
//!
//! The tutor answers in free text or JSON and flags the learner's answer
//! with a marker. This module is the only place those replies are
//! scanned; everything downstream works with [`TutorSignal`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;

/// Bracketed markers the tutor embeds in free text
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[\s*(correct|incorrect|next)\s*\]").unwrap());

/// How to treat a reply that carries no verdict marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMarkerPolicy {
    /// Surface the reply as an error
    #[default]
    Reject,
    AssumeCorrect,
    AssumeIncorrect,
}

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("tutor reply carries no verdict marker")]
    MissingMarker,

    #[error("tutor reply marks the answer both correct and incorrect")]
    ConflictingMarkers,

    #[error("tutor reply is not valid JSON: {0}")]
    MalformedReply(#[from] serde_json::Error),

    #[error("unknown verdict '{0}' in tutor reply")]
    UnknownVerdict(String),
}

/// Verdict on the learner's last answer, with the text it concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorOutcome {
    pub incorrect: bool,
    pub text: String,
    /// The tutor also asked for the next exercise
    pub request_next: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TutorSignal {
    Outcome(TutorOutcome),
    /// No verdict, the tutor only asked for the next exercise
    NextExercise,
}

/// Structured reply shape
#[derive(Debug, Deserialize)]
struct JsonReply {
    verdict: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    next_exercise: bool,
}

/// Parse a raw tutor reply into a signal
pub fn parse_reply(reply: &str, policy: MissingMarkerPolicy) -> Result<TutorSignal, TutorError> {
    let reply = reply.trim();
    if reply.starts_with('{') {
        parse_json_reply(reply, policy)
    } else {
        parse_text_reply(reply, policy)
    }
}

fn parse_json_reply(reply: &str, policy: MissingMarkerPolicy) -> Result<TutorSignal, TutorError> {
    let parsed: JsonReply = serde_json::from_str(reply)?;

    let verdict = match parsed.verdict.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(v) if v.eq_ignore_ascii_case("correct") => Some(false),
        Some(v) if v.eq_ignore_ascii_case("incorrect") => Some(true),
        Some(other) => return Err(TutorError::UnknownVerdict(other.to_string())),
    };

    resolve(verdict, parsed.text.trim().to_string(), parsed.next_exercise, policy)
}

fn parse_text_reply(reply: &str, policy: MissingMarkerPolicy) -> Result<TutorSignal, TutorError> {
    let mut saw_correct = false;
    let mut saw_incorrect = false;
    let mut request_next = false;

    for caps in MARKER.captures_iter(reply) {
        match caps[1].to_ascii_lowercase().as_str() {
            "correct" => saw_correct = true,
            "incorrect" => saw_incorrect = true,
            _ => request_next = true,
        }
    }

    let verdict = match (saw_correct, saw_incorrect) {
        (true, true) => return Err(TutorError::ConflictingMarkers),
        (true, false) => Some(false),
        (false, true) => Some(true),
        (false, false) => None,
    };

    let text = MARKER.replace_all(reply, "").trim().to_string();
    resolve(verdict, text, request_next, policy)
}

fn resolve(
    verdict: Option<bool>,
    text: String,
    request_next: bool,
    policy: MissingMarkerPolicy,
) -> Result<TutorSignal, TutorError> {
    let incorrect = match verdict {
        Some(incorrect) => incorrect,
        None if request_next && text.is_empty() => return Ok(TutorSignal::NextExercise),
        None => match policy {
            MissingMarkerPolicy::Reject => return Err(TutorError::MissingMarker),
            MissingMarkerPolicy::AssumeCorrect => false,
            MissingMarkerPolicy::AssumeIncorrect => true,
        },
    };

    Ok(TutorSignal::Outcome(TutorOutcome {
        incorrect,
        text,
        request_next,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(signal: TutorSignal) -> TutorOutcome {
        match signal {
            TutorSignal::Outcome(o) => o,
            other => panic!("expected outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_text_marker_incorrect() {
        let o = outcome(parse_reply("[INCORRECT] ねこ is read neko", MissingMarkerPolicy::Reject).unwrap());
        assert!(o.incorrect);
        assert_eq!(o.text, "ねこ is read neko");
        assert!(!o.request_next);
    }

    #[test]
    fn test_text_marker_case_and_spacing() {
        let o = outcome(parse_reply("いぬ [ correct ] [next]", MissingMarkerPolicy::Reject).unwrap());
        assert!(!o.incorrect);
        assert!(o.request_next);
        assert_eq!(o.text, "いぬ");
    }

    #[test]
    fn test_next_only() {
        let signal = parse_reply("[NEXT]", MissingMarkerPolicy::Reject).unwrap();
        assert_eq!(signal, TutorSignal::NextExercise);
    }

    #[test]
    fn test_conflicting_markers_always_surface() {
        for policy in [
            MissingMarkerPolicy::Reject,
            MissingMarkerPolicy::AssumeCorrect,
            MissingMarkerPolicy::AssumeIncorrect,
        ] {
            let err = parse_reply("[CORRECT] あ [INCORRECT]", policy).unwrap_err();
            assert!(matches!(err, TutorError::ConflictingMarkers));
        }
    }

    #[test]
    fn test_missing_marker_follows_policy() {
        let err = parse_reply("すし", MissingMarkerPolicy::Reject).unwrap_err();
        assert!(matches!(err, TutorError::MissingMarker));

        let o = outcome(parse_reply("すし", MissingMarkerPolicy::AssumeCorrect).unwrap());
        assert!(!o.incorrect);

        let o = outcome(parse_reply("すし", MissingMarkerPolicy::AssumeIncorrect).unwrap());
        assert!(o.incorrect);
    }

    #[test]
    fn test_json_reply() {
        let o = outcome(
            parse_reply(
                r#"{"verdict": "Incorrect", "text": "日本", "next_exercise": true}"#,
                MissingMarkerPolicy::Reject,
            )
            .unwrap(),
        );
        assert!(o.incorrect);
        assert_eq!(o.text, "日本");
        assert!(o.request_next);
    }

    #[test]
    fn test_json_reply_without_verdict() {
        let err = parse_reply(r#"{"text": "日本"}"#, MissingMarkerPolicy::Reject).unwrap_err();
        assert!(matches!(err, TutorError::MissingMarker));

        let signal = parse_reply(r#"{"next_exercise": true}"#, MissingMarkerPolicy::Reject).unwrap();
        assert_eq!(signal, TutorSignal::NextExercise);
    }

    #[test]
    fn test_json_reply_errors() {
        assert!(matches!(
            parse_reply("{not json", MissingMarkerPolicy::AssumeCorrect).unwrap_err(),
            TutorError::MalformedReply(_)
        ));
        assert!(matches!(
            parse_reply(r#"{"verdict": "maybe"}"#, MissingMarkerPolicy::AssumeCorrect).unwrap_err(),
            TutorError::UnknownVerdict(_)
        ));
    }
}
