//! Backend module for PDF Chatter
//!
//! This module contains the indexing, retrieval and response generation
//! abstractions and their implementations: an external process bridge for
//! the retrieval library and an Ollama responder.

pub mod base;
pub mod ollama;
pub mod process;

pub use base::{
    DocumentIndexer, DocumentRetriever, GeneratedResponse, IndexHandle, ResponseGenerator,
    ResponseMetadata, RetrievedPage,
};
pub use ollama::OllamaResponder;
pub use process::ProcessBridge;

#[cfg(test)]
pub use base::{MockDocumentRetriever, MockResponseGenerator};

use crate::config::Config;
use crate::error::{ChatterError, Result};
use std::sync::Arc;

/// The three backend seams, ready to hand to the interaction handler
#[derive(Clone)]
pub struct Backends {
    pub indexer: Arc<dyn DocumentIndexer>,
    pub retriever: Arc<dyn DocumentRetriever>,
    pub responder: Arc<dyn ResponseGenerator>,
}

/// Create the backends described by configuration
///
/// # Errors
///
/// Returns error if the responder type is unknown or its client cannot be
/// created
pub fn create_backends(config: &Config) -> Result<Backends> {
    let bridge = Arc::new(ProcessBridge::new(&config.indexer, config.retrieval.top_k));

    let responder: Arc<dyn ResponseGenerator> = match config.responder.responder_type.as_str() {
        "ollama" => Arc::new(OllamaResponder::new(
            config.responder.ollama.clone(),
            config.responder.max_images,
        )?),
        other => {
            return Err(
                ChatterError::Config(format!("Unknown responder type: {}", other)).into(),
            )
        }
    };

    Ok(Backends {
        indexer: bridge.clone(),
        retriever: bridge,
        responder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_backends_default_config() {
        assert!(create_backends(&Config::default()).is_ok());
    }

    #[test]
    fn test_create_backends_unknown_responder() {
        let mut config = Config::default();
        config.responder.responder_type = "openai".to_string();
        assert!(create_backends(&config).is_err());
    }
}
