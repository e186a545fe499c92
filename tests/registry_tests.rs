use agentrelay::client_wrapper::{ClientWrapper, ImageRef, Message, TokenUsage};
use agentrelay::registry::RegistryError;
use agentrelay::retrieval::BlockingRetriever;
use agentrelay::worker_pool::WorkerPool;
use agentrelay::{
    Agent, AgentId, AgentRef, AgentRegistry, DocumentRetriever, PersonaConfig, UNKNOWN_AGENT_MESSAGE,
};
use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::Mutex;

struct MockClient {
    response: String,
    calls: Mutex<Vec<(String, Option<ImageRef>)>>,
    usage: Mutex<Option<TokenUsage>>,
}

impl MockClient {
    fn new(response: &str) -> Arc<Self> {
        Arc::new(MockClient {
            response: response.to_string(),
            calls: Mutex::new(Vec::new()),
            usage: Mutex::new(None),
        })
    }
}

#[async_trait]
impl ClientWrapper for MockClient {
    async fn send_message(
        &self,
        messages: &[Message],
        image: Option<&ImageRef>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        self.calls
            .lock()
            .await
            .push((messages[0].content.to_string(), image.cloned()));
        *self.usage.lock().await = Some(TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            total_tokens: 15,
        });
        Ok(Message::assistant(&self.response))
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    fn supports_images(&self) -> bool {
        true
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.usage)
    }
}

struct StaticRetriever {
    documents: Vec<String>,
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentRetriever for StaticRetriever {
    async fn hybrid_search(&self, query: &str) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        self.queries.lock().await.push(query.to_string());
        Ok(self.documents.clone())
    }
}

#[tokio::test]
async fn test_unknown_agent_returns_sentinel() {
    let client = MockClient::new("hello");
    let registry = AgentRegistry::with_default_personas(client.clone(), None);

    let reply = registry
        .interact(&AgentRef::parse("Astrology"), "What is my sign?", None)
        .await;

    assert_eq!(reply, UNKNOWN_AGENT_MESSAGE);
    assert!(client.calls.lock().await.is_empty());
}

#[tokio::test]
async fn test_interact_renders_persona_template() {
    let client = MockClient::new("42");
    let registry = AgentRegistry::with_default_personas(client.clone(), None);

    let reply = registry
        .interact(&AgentRef::Known(AgentId::Analytics), "1, 2, 3", None)
        .await;

    assert_eq!(reply, "42");
    let calls = client.calls.lock().await;
    assert_eq!(
        calls[0].0,
        "You are a data analytics expert. Analyze the following data and provide insights:\n\
         Data: 1, 2, 3\n\
         Include key findings, trends, and recommendations."
    );
}

#[tokio::test]
async fn test_image_reaches_visual_agent_only() {
    let client = MockClient::new("a cat");
    let registry = AgentRegistry::with_default_personas(client.clone(), None);
    let image = ImageRef::new("/tmp/cat.png").with_media_type("image/png");

    registry
        .interact(&AgentRef::Known(AgentId::Visual), "what is this?", Some(&image))
        .await;
    registry
        .interact(&AgentRef::Known(AgentId::Reasoning), "why?", Some(&image))
        .await;

    let calls = client.calls.lock().await;
    assert_eq!(calls[0].1.as_ref(), Some(&image));
    assert_eq!(calls[1].1, None);
}

#[tokio::test]
async fn test_inquiry_agent_injects_search_results() {
    let client = MockClient::new("Lisbon");
    let retriever = Arc::new(StaticRetriever {
        documents: vec!["Lisbon is sunny".to_string(), "Porto has wine".to_string()],
        queries: Mutex::new(Vec::new()),
    });
    let registry = AgentRegistry::with_default_personas(
        client.clone(),
        Some(retriever.clone() as Arc<dyn DocumentRetriever>),
    );

    registry
        .interact(&AgentRef::Known(AgentId::Inquiry), "Where should I go?", None)
        .await;
    registry
        .interact(&AgentRef::Known(AgentId::Solution), "Not a search", None)
        .await;

    assert_eq!(*retriever.queries.lock().await, vec!["Where should I go?".to_string()]);
    let calls = client.calls.lock().await;
    assert!(calls[0]
        .0
        .contains("The response from the Hybrid search is: ['Lisbon is sunny', 'Porto has wine'] for the user query."));
}

#[tokio::test]
async fn test_failing_search_still_answers() {
    let client = MockClient::new("best guess");
    let retriever = Arc::new(BlockingRetriever::new(
        |_q: &str| -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
            Err("index offline".into())
        },
        WorkerPool::new(1),
    ));
    let inquiry = Agent::new(PersonaConfig::default_for(AgentId::Inquiry), client.clone())
        .with_retriever(retriever);

    let response = inquiry.respond("Any docs?", None).await.unwrap();

    assert_eq!(response.content, "best guess");
    assert_eq!(response.tokens_used.map(|u| u.total_tokens), Some(15));
    assert!(client.calls.lock().await[0].0.contains("(no documents retrieved)"));
}

#[tokio::test]
async fn test_per_persona_clients() {
    let fast = MockClient::new("fast");
    let deep = MockClient::new("deep");
    let registry = AgentRegistry::builder()
        .with_agent(Agent::new(PersonaConfig::default_for(AgentId::Guidance), fast.clone()))
        .with_agent(Agent::new(
            PersonaConfig::default_for(AgentId::Reasoning).with_name("Deep Thinker"),
            deep.clone(),
        ))
        .build()
        .unwrap();

    assert_eq!(registry.ids(), vec![AgentId::Guidance, AgentId::Reasoning]);
    assert_eq!(
        registry.get(AgentId::Reasoning).map(|a| a.name.clone()),
        Some("Deep Thinker".to_string())
    );
    assert!(registry.get(AgentId::Coding).is_none());

    let reply = registry
        .interact(&AgentRef::Known(AgentId::Reasoning), "p implies q", None)
        .await;
    assert_eq!(reply, "deep");
    assert!(fast.calls.lock().await.is_empty());
}

#[test]
fn test_duplicate_registration_is_an_error() {
    let client = MockClient::new("x");
    let err = AgentRegistry::builder()
        .with_agent(Agent::new(PersonaConfig::default_for(AgentId::Visual), client.clone()))
        .with_agent(Agent::new(PersonaConfig::default_for(AgentId::Visual), client))
        .build()
        .err()
        .unwrap();

    assert_eq!(err, RegistryError::DuplicateAgent(AgentId::Visual));
    assert_eq!(err.to_string(), "Agent 'Visual' is already registered");
}
