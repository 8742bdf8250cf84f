//! submit_contact_form tool

use super::{optional_str, ToolHandler};
use crate::error::Result;
use crate::knowledge::{ContactRepository, ContactSubmission};
use crate::llm::ToolDefinition;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid");
}

/// Characters of the record id shown to the visitor
const REFERENCE_LEN: usize = 8;

pub struct SubmitContactFormTool {
    contacts: Arc<dyn ContactRepository>,
}

impl SubmitContactFormTool {
    pub fn new(contacts: Arc<dyn ContactRepository>) -> Self {
        Self { contacts }
    }
}

/// Missing or malformed required fields, in form order
fn validate(args: &Value) -> Vec<&'static str> {
    let mut problems = Vec::new();
    if optional_str(args, "name").is_none() {
        problems.push("name is required");
    }
    match optional_str(args, "email") {
        None => problems.push("email is required"),
        Some(email) if !EMAIL_RE.is_match(&email) => {
            problems.push("email must be a valid email address")
        }
        Some(_) => {}
    }
    if optional_str(args, "message").is_none() {
        problems.push("message is required");
    }
    problems
}

#[async_trait]
impl ToolHandler for SubmitContactFormTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "submit_contact_form".to_string(),
            description: "Submit a contact request on behalf of the visitor so the sales or \
                          support team can follow up. Only call this once the visitor has \
                          provided at least their name, email address and message."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Visitor's full name" },
                    "email": { "type": "string", "description": "Visitor's email address" },
                    "company": { "type": "string", "description": "Company name" },
                    "phone": { "type": "string", "description": "Phone number" },
                    "product": { "type": "string", "description": "Product of interest" },
                    "inquiryType": {
                        "type": "string",
                        "enum": ["general", "sales", "support", "partnership"],
                        "description": "Kind of inquiry"
                    },
                    "message": { "type": "string", "description": "What the visitor needs" }
                },
                "required": ["name", "email", "message"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<String> {
        let problems = validate(&arguments);
        if !problems.is_empty() {
            return Ok(format!(
                "Could not submit the contact form: {}. Ask the visitor for the missing details.",
                problems.join(", ")
            ));
        }

        let submission = ContactSubmission {
            name: optional_str(&arguments, "name").unwrap_or_default(),
            email: optional_str(&arguments, "email").unwrap_or_default(),
            company: optional_str(&arguments, "company"),
            phone: optional_str(&arguments, "phone"),
            product: optional_str(&arguments, "product"),
            inquiry_type: optional_str(&arguments, "inquiryType"),
            message: optional_str(&arguments, "message").unwrap_or_default(),
            source: Some("chat".to_string()),
        };

        let id = self.contacts.create(submission).await?;
        let reference: String = id.chars().take(REFERENCE_LEN).collect();
        tracing::info!("Contact submission {} created from chat", reference);

        Ok(format!(
            "Contact form submitted successfully. Reference ID: {}. The team will get back to the visitor shortly.",
            reference
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConciergeError;
    use crate::knowledge::MemoryContactRepository;
    use crate::tools::ToolRegistry;

    struct RejectingContacts;

    #[async_trait]
    impl ContactRepository for RejectingContacts {
        async fn create(&self, _submission: ContactSubmission) -> Result<String> {
            Err(ConciergeError::Repository("disk full".to_string()))
        }
    }

    fn registry(contacts: Arc<dyn ContactRepository>) -> ToolRegistry {
        ToolRegistry::new().with_tool(Arc::new(SubmitContactFormTool::new(contacts)))
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let contacts = Arc::new(MemoryContactRepository::new());
        let out = registry(contacts.clone())
            .dispatch(
                "submit_contact_form",
                r#"{"name":"Ada","email":"ada@example.com","inquiryType":"sales","message":"Quote please"}"#,
            )
            .await
            .unwrap();

        let stored = contacts.submissions();
        assert_eq!(stored.len(), 1);
        let (id, submission) = &stored[0];
        assert!(out.contains(&format!("Reference ID: {}.", &id[..8])));
        assert_eq!(submission.inquiry_type.as_deref(), Some("sales"));
        assert_eq!(submission.source.as_deref(), Some("chat"));
    }

    #[tokio::test]
    async fn test_validation_failure_is_reported_not_raised() {
        let contacts = Arc::new(MemoryContactRepository::new());
        let out = registry(contacts.clone())
            .dispatch("submit_contact_form", r#"{"name":" ","email":"not-an-email"}"#)
            .await
            .unwrap();

        assert!(out.contains("name is required"));
        assert!(out.contains("email must be a valid email address"));
        assert!(out.contains("message is required"));
        assert!(contacts.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_repository_failure_is_textual() {
        let out = registry(Arc::new(RejectingContacts))
            .dispatch(
                "submit_contact_form",
                r#"{"name":"Ada","email":"ada@example.com","message":"Hi"}"#,
            )
            .await
            .unwrap();
        assert!(out.starts_with("Error executing submit_contact_form:"));
        assert!(out.contains("disk full"));
    }
}
