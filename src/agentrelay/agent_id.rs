//! Agent identifiers.
//!
//! [`AgentId`] is the closed set of personas a query can be routed to. Names coming back from
//! the categorizer are resolved into an [`AgentRef`] at the parser boundary: a name that does
//! not match any persona is kept as [`AgentRef::Unknown`] so that dispatching to it produces
//! the registry's soft routing error instead of failing the whole run.

use std::fmt;
use std::str::FromStr;

/// The personas known to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentId {
    Reflection,
    Solution,
    Inquiry,
    Guidance,
    Visual,
    Coding,
    Analytics,
    Reasoning,
}

impl AgentId {
    /// Every persona, in the order they are presented to the categorizer.
    pub const ALL: [AgentId; 8] = [
        AgentId::Reflection,
        AgentId::Solution,
        AgentId::Inquiry,
        AgentId::Guidance,
        AgentId::Visual,
        AgentId::Coding,
        AgentId::Analytics,
        AgentId::Reasoning,
    ];

    /// Bare name used on the categorizer wire format (e.g. `"Coding"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Reflection => "Reflection",
            AgentId::Solution => "Solution",
            AgentId::Inquiry => "Inquiry",
            AgentId::Guidance => "Guidance",
            AgentId::Visual => "Visual",
            AgentId::Coding => "Coding",
            AgentId::Analytics => "Analytics",
            AgentId::Reasoning => "Reasoning",
        }
    }

    /// Display name used in transcripts (e.g. `"Coding Agent"`).
    pub fn display_name(&self) -> String {
        format!("{} Agent", self.as_str())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name does not match any [`AgentId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAgentId(pub String);

impl fmt::Display for UnknownAgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown agent id: {}", self.0)
    }
}

impl std::error::Error for UnknownAgentId {}

impl FromStr for AgentId {
    type Err = UnknownAgentId;

    /// Case-insensitive; accepts an optional `Agent` suffix (`"coding"`, `"CodingAgent"`,
    /// `"Coding Agent"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let base = lowered
            .strip_suffix("agent")
            .map(str::trim_end)
            .filter(|b| !b.is_empty())
            .unwrap_or(lowered.as_str());

        AgentId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(base))
            .ok_or_else(|| UnknownAgentId(trimmed.to_string()))
    }
}

/// An agent name as produced by the categorizer, resolved or not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgentRef {
    Known(AgentId),
    Unknown(String),
}

impl AgentRef {
    /// Resolve a raw name. Never fails.
    pub fn parse(name: &str) -> Self {
        match name.parse::<AgentId>() {
            Ok(id) => AgentRef::Known(id),
            Err(UnknownAgentId(raw)) => AgentRef::Unknown(raw),
        }
    }

    pub fn known(&self) -> Option<AgentId> {
        match self {
            AgentRef::Known(id) => Some(*id),
            AgentRef::Unknown(_) => None,
        }
    }
}

impl From<AgentId> for AgentRef {
    fn from(id: AgentId) -> Self {
        AgentRef::Known(id)
    }
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentRef::Known(id) => write!(f, "{}", id),
            AgentRef::Unknown(raw) => f.write_str(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive_and_accepts_suffix() {
        assert_eq!("Coding".parse::<AgentId>(), Ok(AgentId::Coding));
        assert_eq!("coding".parse::<AgentId>(), Ok(AgentId::Coding));
        assert_eq!("CodingAgent".parse::<AgentId>(), Ok(AgentId::Coding));
        assert_eq!(" Guidance Agent ".parse::<AgentId>(), Ok(AgentId::Guidance));
    }

    #[test]
    fn test_unknown_names_are_kept_verbatim() {
        assert_eq!(AgentRef::parse(" Foo "), AgentRef::Unknown("Foo".to_string()));
        assert_eq!(AgentRef::parse("Agent"), AgentRef::Unknown("Agent".to_string()));
        assert_eq!(AgentRef::parse(""), AgentRef::Unknown(String::new()));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for id in AgentId::ALL {
            assert_eq!(id.to_string().parse::<AgentId>(), Ok(id));
        }
        assert_eq!(AgentId::Visual.display_name(), "Visual Agent");
    }
}
