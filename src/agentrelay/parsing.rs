//! Decoding of the categorizer's free-text replies.
//!
//! The categorizer is asked to answer in a fixed labelled layout:
//!
//! ```text
//! Category: <AgentId>
//! Collaboration: <Yes|No>
//! Reason: <text>
//! InitialCollaborators: [<AgentId>, <AgentId>, ...]
//! ```
//!
//! and, for satisfaction checks:
//!
//! ```text
//! Satisfied: <Yes|No>
//! NextSteps: <text>
//! ```
//!
//! For every label the first line containing it is used and the value is whatever follows
//! the label on that line. Models like to bold labels (`**Category:** Coding`), so stray `*`
//! around values is ignored. Any missing label turns the whole reply into
//! [`ParseError::Malformed`], which keeps the raw text for display.
//!
//! ```rust
//! use agentrelay::parsing::parse_categorization;
//! use agentrelay::{AgentId, AgentRef};
//!
//! let parsed = parse_categorization(
//!     "Category: Solution\nCollaboration: Yes\nReason: needs code\nInitialCollaborators: [Solution, Coding]",
//! )
//! .unwrap();
//! assert_eq!(parsed.category, AgentRef::Known(AgentId::Solution));
//! assert_eq!(parsed.initial_collaborators.len(), 2);
//! ```

use crate::agentrelay::agent_id::AgentRef;
use std::error::Error;
use std::fmt;

pub const CATEGORY_LABEL: &str = "Category:";
pub const COLLABORATION_LABEL: &str = "Collaboration:";
pub const REASON_LABEL: &str = "Reason:";
pub const COLLABORATORS_LABEL: &str = "InitialCollaborators:";
pub const SATISFIED_LABEL: &str = "Satisfied:";
pub const NEXT_STEPS_LABEL: &str = "NextSteps:";

/// Routing decision decoded from a categorization reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizationResult {
    pub category: AgentRef,
    pub collaboration_required: bool,
    pub reason: String,
    /// Non-empty whenever `collaboration_required` is true.
    pub initial_collaborators: Vec<AgentRef>,
}

impl fmt::Display for CategorizationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", CATEGORY_LABEL, self.category)?;
        writeln!(f, "{} {}", COLLABORATION_LABEL, yes_no(self.collaboration_required))?;
        writeln!(f, "{} {}", REASON_LABEL, self.reason)?;
        write!(
            f,
            "{} [{}]",
            COLLABORATORS_LABEL,
            join_refs(&self.initial_collaborators)
        )
    }
}

/// Verdict decoded from a satisfaction-check reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SatisfactionResult {
    pub satisfied: bool,
    pub next_steps: String,
}

impl fmt::Display for SatisfactionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", SATISFIED_LABEL, yes_no(self.satisfied))?;
        write!(f, "{} {}", NEXT_STEPS_LABEL, self.next_steps)
    }
}

/// Which reply failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Categorization,
    SatisfactionCheck,
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseKind::Categorization => f.write_str("categorization"),
            ResponseKind::SatisfactionCheck => f.write_str("satisfaction check"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    /// No line contains this label.
    MissingLabel(&'static str),
    /// Collaboration was requested but the collaborators line has no `[...]` list.
    MissingBrackets,
    /// Collaboration was requested but the list names nobody.
    EmptyCollaborators,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedReason::MissingLabel(label) => write!(f, "missing '{}' line", label),
            MalformedReason::MissingBrackets => {
                write!(f, "'{}' has no bracketed list", COLLABORATORS_LABEL)
            }
            MalformedReason::EmptyCollaborators => {
                write!(f, "collaboration required but no collaborators listed")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Malformed {
        kind: ResponseKind,
        /// The reply exactly as the model produced it.
        raw_text: String,
        reason: MalformedReason,
    },
}

impl ParseError {
    pub fn kind(&self) -> ResponseKind {
        match self {
            ParseError::Malformed { kind, .. } => *kind,
        }
    }

    pub fn raw_text(&self) -> &str {
        match self {
            ParseError::Malformed { raw_text, .. } => raw_text,
        }
    }

    pub fn reason(&self) -> &MalformedReason {
        match self {
            ParseError::Malformed { reason, .. } => reason,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Malformed {
                kind,
                raw_text,
                reason,
            } => write!(
                f,
                "Failed to parse {} output: {}. Error: {}",
                kind, raw_text, reason
            ),
        }
    }
}

impl Error for ParseError {}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn join_refs(refs: &[AgentRef]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Drops markdown emphasis around a keyword value (`**Yes**`, `*Coding*`).
fn unemphasized(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c == '*')
}

/// Text after `label` on the first line containing it. Only the `*` run closing a bold
/// label (`**Reason:**`) is removed; free text keeps its own asterisks.
fn labelled<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    text.lines().find_map(|line| {
        line.find(label)
            .map(|pos| line[pos + label.len()..].trim_start_matches('*').trim())
    })
}

fn require<'a>(
    text: &'a str,
    label: &'static str,
    kind: ResponseKind,
) -> Result<&'a str, ParseError> {
    labelled(text, label).ok_or_else(|| malformed(kind, text, MalformedReason::MissingLabel(label)))
}

fn malformed(kind: ResponseKind, text: &str, reason: MalformedReason) -> ParseError {
    ParseError::Malformed {
        kind,
        raw_text: text.to_string(),
        reason,
    }
}

fn is_yes(value: &str) -> bool {
    value.eq_ignore_ascii_case("yes")
}

/// Collaborator names inside the first `[...]` after the label, or `None` if there is no
/// bracket pair.
fn bracketed_list(value: &str) -> Option<Vec<AgentRef>> {
    let open = value.find('[')?;
    let close = open + value[open..].find(']')?;
    let names = value[open + 1..close]
        .split(',')
        .map(|name| name.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '"' | '\'')))
        .filter(|name| !name.is_empty())
        .map(AgentRef::parse)
        .collect();
    Some(names)
}

/// Decode a categorization reply.
pub fn parse_categorization(text: &str) -> Result<CategorizationResult, ParseError> {
    let kind = ResponseKind::Categorization;
    let category = require(text, CATEGORY_LABEL, kind)?;
    let collaboration = require(text, COLLABORATION_LABEL, kind)?;
    let reason = require(text, REASON_LABEL, kind)?;
    let collaborators = require(text, COLLABORATORS_LABEL, kind)?;

    let collaboration_required = is_yes(unemphasized(collaboration));
    let initial_collaborators = match bracketed_list(collaborators) {
        Some(list) => list,
        None if collaboration_required => {
            return Err(malformed(kind, text, MalformedReason::MissingBrackets))
        }
        None => Vec::new(),
    };
    if collaboration_required && initial_collaborators.is_empty() {
        return Err(malformed(kind, text, MalformedReason::EmptyCollaborators));
    }

    Ok(CategorizationResult {
        category: AgentRef::parse(unemphasized(category)),
        collaboration_required,
        reason: reason.to_string(),
        initial_collaborators,
    })
}

/// Decode a satisfaction-check reply.
pub fn parse_satisfaction(text: &str) -> Result<SatisfactionResult, ParseError> {
    let kind = ResponseKind::SatisfactionCheck;
    let satisfied = require(text, SATISFIED_LABEL, kind)?;
    let next_steps = require(text, NEXT_STEPS_LABEL, kind)?;
    Ok(SatisfactionResult {
        satisfied: is_yes(unemphasized(satisfied)),
        next_steps: next_steps.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agentrelay::agent_id::AgentId;

    const COLLAB: &str = "Category: Solution\n\
                          Collaboration: Yes\n\
                          Reason: Needs a plan and code\n\
                          InitialCollaborators: [Solution, Coding]";

    #[test]
    fn test_parse_collaboration_reply() {
        let parsed = parse_categorization(COLLAB).unwrap();
        assert_eq!(parsed.category, AgentRef::Known(AgentId::Solution));
        assert!(parsed.collaboration_required);
        assert_eq!(parsed.reason, "Needs a plan and code");
        assert_eq!(
            parsed.initial_collaborators,
            vec![AgentRef::Known(AgentId::Solution), AgentRef::Known(AgentId::Coding)]
        );
    }

    #[test]
    fn test_display_parses_back_to_same_result() {
        let parsed = parse_categorization(COLLAB).unwrap();
        assert_eq!(parse_categorization(&parsed.to_string()).unwrap(), parsed);

        let verdict = parse_satisfaction("NextSteps: none\nSatisfied: yes").unwrap();
        assert_eq!(verdict.to_string(), "Satisfied: Yes\nNextSteps: none");
        assert_eq!(parse_satisfaction(&verdict.to_string()).unwrap(), verdict);
    }

    #[test]
    fn test_preamble_bold_labels_and_loose_spacing() {
        let text = "Sure, here you go.\n\
                    **Category:** coding\n\
                    **Collaboration:** YES\n\
                    **Reason:** two steps\n\
                    **InitialCollaborators:** [Reasoning,Coding , ]";
        let parsed = parse_categorization(text).unwrap();
        assert_eq!(parsed.category, AgentRef::Known(AgentId::Coding));
        assert!(parsed.collaboration_required);
        assert_eq!(
            parsed.initial_collaborators,
            vec![AgentRef::Known(AgentId::Reasoning), AgentRef::Known(AgentId::Coding)]
        );
    }

    #[test]
    fn test_free_text_keeps_its_asterisks() {
        let text = "Category: Coding\n\
                    Collaboration: No\n\
                    Reason: needs *args and ptr*\n\
                    InitialCollaborators: []";
        let parsed = parse_categorization(text).unwrap();
        assert_eq!(parsed.reason, "needs *args and ptr*");
        assert_eq!(parse_categorization(&parsed.to_string()).unwrap(), parsed);

        let verdict = parse_satisfaction("Satisfied: **No**\nNextSteps: *emphasis* on tests").unwrap();
        assert!(!verdict.satisfied);
        assert_eq!(verdict.next_steps, "*emphasis* on tests");

        let bold = parse_satisfaction("**Satisfied:** Yes\n**NextSteps:** ship it*").unwrap();
        assert!(bold.satisfied);
        assert_eq!(bold.next_steps, "ship it*");
    }

    #[test]
    fn test_anything_but_yes_is_false() {
        let text = "Category: Guidance\nCollaboration: Maybe\nReason: r\nInitialCollaborators: []";
        let parsed = parse_categorization(text).unwrap();
        assert!(!parsed.collaboration_required);
        assert!(parsed.initial_collaborators.is_empty());
    }

    #[test]
    fn test_missing_label_embeds_raw_text() {
        let text = "Category: Guidance\nCollaboration: No\nInitialCollaborators: []";
        let err = parse_categorization(text).unwrap_err();
        assert_eq!(err.reason(), &MalformedReason::MissingLabel(REASON_LABEL));
        assert_eq!(err.raw_text(), text);
        assert!(err.to_string().contains(text));
        assert!(err.to_string().starts_with("Failed to parse categorization output: "));
    }

    #[test]
    fn test_brackets_only_required_when_collaborating() {
        let no = "Category: Guidance\nCollaboration: No\nReason: r\nInitialCollaborators: None";
        assert!(parse_categorization(no).unwrap().initial_collaborators.is_empty());

        let yes = "Category: Guidance\nCollaboration: Yes\nReason: r\nInitialCollaborators: Coding";
        assert_eq!(
            parse_categorization(yes).unwrap_err().reason(),
            &MalformedReason::MissingBrackets
        );

        let empty = "Category: Guidance\nCollaboration: Yes\nReason: r\nInitialCollaborators: [ ]";
        assert_eq!(
            parse_categorization(empty).unwrap_err().reason(),
            &MalformedReason::EmptyCollaborators
        );
    }

    #[test]
    fn test_unknown_names_are_kept() {
        let text = "Category: Foo\nCollaboration: No\nReason: r\nInitialCollaborators: []";
        assert_eq!(
            parse_categorization(text).unwrap().category,
            AgentRef::Unknown("Foo".to_string())
        );
    }

    #[test]
    fn test_satisfaction_missing_next_steps() {
        let err = parse_satisfaction("Satisfied: No").unwrap_err();
        assert_eq!(err.reason(), &MalformedReason::MissingLabel(NEXT_STEPS_LABEL));
        assert!(err.to_string().starts_with("Failed to parse satisfaction check output: "));
    }
}
