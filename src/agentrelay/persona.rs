//! Persona configuration.
//!
//! Every agent is the same [`Agent`](crate::Agent) type; what makes the Coding agent differ
//! from the Guidance agent is the [`PersonaConfig`] it is built with: the instruction
//! template wrapped around the input, whether an attached image is forwarded, and whether
//! the input is first run through the document retriever.
//!
//! Templates use two placeholders: `{input}` (always substituted) and `{documents}`
//! (substituted with hybrid search results for personas that use retrieval).

use crate::agentrelay::agent_id::AgentId;

/// Placeholder replaced by the agent's input.
pub const INPUT_PLACEHOLDER: &str = "{input}";
/// Placeholder replaced by retrieved documents.
pub const DOCUMENTS_PLACEHOLDER: &str = "{documents}";

/// Static description of one persona.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaConfig {
    pub id: AgentId,
    /// Human-readable name (e.g. `"Coding Agent"`).
    pub name: String,
    pub template: String,
    /// Forward the query's image to the model.
    pub accepts_image: bool,
    /// Run a hybrid search on the input and inject the results.
    pub uses_retrieval: bool,
}

impl PersonaConfig {
    pub fn new(id: AgentId, template: impl Into<String>) -> Self {
        Self {
            id,
            name: id.display_name(),
            template: template.into(),
            accepts_image: false,
            uses_retrieval: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn accepting_images(mut self) -> Self {
        self.accepts_image = true;
        self
    }

    pub fn using_retrieval(mut self) -> Self {
        self.uses_retrieval = true;
        self
    }

    /// Render the prompt for `input`. `documents` is only used when the template has a
    /// `{documents}` slot.
    pub fn render(&self, input: &str, documents: Option<&str>) -> String {
        // Documents first: the input is user text and may itself contain "{documents}".
        let with_docs = match documents {
            Some(docs) => self.template.replace(DOCUMENTS_PLACEHOLDER, docs),
            None => self.template.clone(),
        };
        with_docs.replace(INPUT_PLACEHOLDER, input)
    }

    /// The built-in persona for `id`.
    pub fn default_for(id: AgentId) -> Self {
        match id {
            AgentId::Reflection => PersonaConfig::new(
                id,
                "You are a self-reflective agent. Reflect on the following input and provide feedback:\n\
                 Input: {input}\n\
                 Include strengths, areas for improvement, and suggestions for growth.",
            ),
            AgentId::Solution => PersonaConfig::new(
                id,
                "You are a problem-solving agent. Solve the following problem step by step:\n\
                 Problem: {input}\n\
                 Provide a structured solution.",
            ),
            AgentId::Inquiry => PersonaConfig::new(
                id,
                "You are an answering agent. You have access to perform Hybrid search on a document database.\n\
                 The response from the Hybrid search is: {documents} for the user query.\n\
                 Answer the following question:\n\
                 Question: {input}\n\
                 Provide a clear and concise response. Use if necessary the information retrieved from the Hybrid search.",
            )
            .using_retrieval(),
            AgentId::Guidance => PersonaConfig::new(
                id,
                "You are a mentorship expert. Provide advice and guidance for the following:\n\
                 Query: {input}\n\
                 Offer actionable steps for personal or professional growth.",
            ),
            AgentId::Visual => PersonaConfig::new(
                id,
                "You are a highly capable AI assistant with perfect vision and exceptional attention to detail, \
                 specialized in analyzing images and extracting comprehensive information. \
                 Analyze and interpret the following visual data description:\n\
                 Description: {input}\n\
                 Provide insights or suggestions based on the visual data.",
            )
            .accepting_images(),
            AgentId::Coding => PersonaConfig::new(
                id,
                "You are a coding expert. Review or generate code for the following task:\n\
                 Task: {input}\n\
                 Provide optimized and well-documented code.",
            ),
            AgentId::Analytics => PersonaConfig::new(
                id,
                "You are a data analytics expert. Analyze the following data and provide insights:\n\
                 Data: {input}\n\
                 Include key findings, trends, and recommendations.",
            ),
            AgentId::Reasoning => PersonaConfig::new(
                id,
                "You are a reasoning expert. Apply logical reasoning to the following scenario:\n\
                 Scenario: {input}\n\
                 Provide clear inferences and conclusions based on the scenario.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_visual_accepts_images_and_only_inquiry_retrieves() {
        for id in AgentId::ALL {
            let persona = PersonaConfig::default_for(id);
            assert_eq!(persona.accepts_image, id == AgentId::Visual, "{}", id);
            assert_eq!(persona.uses_retrieval, id == AgentId::Inquiry, "{}", id);
            assert!(persona.template.contains(INPUT_PLACEHOLDER), "{}", id);
        }
    }

    #[test]
    fn test_render_substitutes_input() {
        let persona = PersonaConfig::default_for(AgentId::Coding);
        let prompt = persona.render("write fizzbuzz", None);
        assert!(prompt.contains("Task: write fizzbuzz\n"));
        assert!(!prompt.contains(INPUT_PLACEHOLDER));
    }

    #[test]
    fn test_input_containing_placeholder_is_not_reexpanded() {
        let persona = PersonaConfig::default_for(AgentId::Inquiry);
        let prompt = persona.render("what is {documents}?", Some("[doc]"));
        assert!(prompt.contains("Question: what is {documents}?"));
        assert!(prompt.contains("search is: [doc] for"));
    }
}
