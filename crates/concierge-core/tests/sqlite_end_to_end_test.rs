//! End-to-end turn against an on-disk SQLite knowledge base and contact inbox

use async_trait::async_trait;
use concierge_core::{
    ChatModel, ChatOrchestrator, ChatRequest, Completion, ConciergeError, Database, Embedder,
    EmbeddingClient, InMemoryRateLimiter, Message, Result, Role, SemanticSearchService, ToolCall,
    ToolChoice, ToolDefinition, ToolRegistry,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Embeds by keyword so ranking is predictable
struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        Ok(vec![
            if text.contains("price") || text.contains("pricing") { 1.0 } else { 0.0 },
            if text.contains("support") { 1.0 } else { 0.0 },
            0.1,
        ])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "keyword"
    }
}

/// Requests a contact submission, then answers from the tool result
struct ContactingModel {
    seen: Mutex<Vec<Vec<Message>>>,
}

#[async_trait]
impl ChatModel for ContactingModel {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
        tool_choice: ToolChoice,
    ) -> Result<Completion> {
        self.seen.lock().unwrap().push(messages.to_vec());
        match tool_choice {
            ToolChoice::Auto => Ok(Completion::with_tool_calls(vec![ToolCall::new(
                "call_1",
                "submit_contact_form",
                r#"{"name":"Grace","email":"grace@example.com","company":"Navy","inquiryType":"sales","message":"Need pricing for 50 seats"}"#,
            )])),
            ToolChoice::None => {
                let result = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::Tool)
                    .ok_or_else(|| ConciergeError::Llm("no tool result".to_string()))?;
                Ok(Completion::text(format!("Thanks! {}", result.content)))
            }
        }
    }

    fn model_name(&self) -> &str {
        "contacting"
    }
}

#[tokio::test]
async fn test_turn_grounds_and_stores_contact() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("concierge.sqlite");

    let db = Database::open(&db_path).unwrap();
    db.initialize().unwrap();
    db.add_knowledge_entry(
        "Pricing",
        "Plans start at $10 per seat per month.",
        "pricing",
        Some((&[1.0f32, 0.0, 0.1][..], "keyword")),
    )
    .unwrap();
    db.add_knowledge_entry(
        "Support hours",
        "Support is available 24/7.",
        "support",
        Some((&[0.0f32, 1.0, 0.1][..], "keyword")),
    )
    .unwrap();
    db.add_knowledge_entry("Draft", "Not embedded yet.", "misc", None)
        .unwrap();
    let db = Arc::new(db);

    let search = SemanticSearchService::new(EmbeddingClient::new(Arc::new(KeywordEmbedder)), db.clone());
    let model = Arc::new(ContactingModel {
        seen: Mutex::new(Vec::new()),
    });
    let orchestrator = ChatOrchestrator::new(model.clone(), Arc::new(InMemoryRateLimiter::new()))
        .with_search(search.clone())
        .with_tools(ToolRegistry::standard(search, 3, db.clone()));

    let reply = orchestrator
        .handle("198.51.100.4", ChatRequest::new("What is your pricing?"))
        .await
        .unwrap();

    assert!(reply.message.starts_with("Thanks! Contact form submitted successfully."));
    assert_eq!(reply.tool_calls, vec!["submit_contact_form"]);

    let seen = model.seen.lock().unwrap();
    let first_system = &seen[0][0];
    let pricing_at = first_system.content.find("**Pricing**").unwrap();
    let support_at = first_system.content.find("**Support hours**").unwrap();
    assert!(pricing_at < support_at);
    assert!(!first_system.content.contains("**Draft**"));

    let contacts = db.list_contacts().unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].submission.name, "Grace");
    assert_eq!(contacts[0].submission.source.as_deref(), Some("chat"));
    assert!(reply.message.contains(&contacts[0].id[..8]));
}
