// src/agentrelay/mod.rs

pub mod agent;
pub mod agent_id;
pub mod categorizer;
pub mod chunk;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod event;
pub mod orchestration;
pub mod parsing;
pub mod persona;
pub mod registry;
pub mod retrieval;
pub mod worker_pool;

// Let's explicitly export the orchestrator so it can be reached as agentrelay::CollaborationOrchestrator
pub use orchestration::CollaborationOrchestrator;
