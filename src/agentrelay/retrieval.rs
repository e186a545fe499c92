//! Document retrieval collaborator.
//!
//! The Inquiry persona grounds its answers in a hybrid (full-text + vector) search over a
//! document store. The store itself lives outside this crate; agents only see the
//! [`DocumentRetriever`] trait. [`BlockingRetriever`] adapts a synchronous search client
//! through the shared [`WorkerPool`].

use crate::agentrelay::worker_pool::WorkerPool;
use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;

/// Hybrid search over the document store.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Return document texts for `query`, most relevant first.
    async fn hybrid_search(&self, query: &str) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;
}

/// A synchronous search function run on a [`WorkerPool`].
pub struct BlockingRetriever<F>
where
    F: Fn(&str) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
{
    search: Arc<F>,
    pool: WorkerPool,
}

impl<F> BlockingRetriever<F>
where
    F: Fn(&str) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
{
    pub fn new(search: F, pool: WorkerPool) -> Self {
        Self {
            search: Arc::new(search),
            pool,
        }
    }
}

#[async_trait]
impl<F> DocumentRetriever for BlockingRetriever<F>
where
    F: Fn(&str) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
{
    async fn hybrid_search(&self, query: &str) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
        let search = Arc::clone(&self.search);
        let query = query.to_string();
        let documents = self.pool.run(move || search(&query)).await??;
        Ok(documents)
    }
}

/// Render search results into the `{documents}` slot of a persona template.
pub fn format_documents(documents: &[String]) -> String {
    if documents.is_empty() {
        return "[]".to_string();
    }
    let quoted: Vec<String> = documents
        .iter()
        .map(|d| format!("'{}'", d.replace('\'', "\\'")))
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_documents_lists_in_order() {
        let docs = vec!["Paris in spring".to_string(), "Rome's ruins".to_string()];
        assert_eq!(format_documents(&docs), "['Paris in spring', 'Rome\\'s ruins']");
        assert_eq!(format_documents(&[]), "[]");
    }

    #[tokio::test]
    async fn test_blocking_retriever_runs_search() {
        let retriever = BlockingRetriever::new(
            |q: &str| -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
                Ok(vec![format!("doc about {}", q)])
            },
            WorkerPool::new(1),
        );
        let docs = retriever.hybrid_search("lisbon").await.unwrap();
        assert_eq!(docs, vec!["doc about lisbon".to_string()]);
    }
}
