//! Provider specific [`ClientWrapper`](crate::client_wrapper::ClientWrapper) implementations.
//!
//! Each submodule offers a concrete client that speaks a particular vendor's API while
//! conforming to the uniform agentrelay contract.

pub mod common;
pub mod http_pool;

pub mod blocking;
pub mod claude;
pub mod openai;
