//! System prompt and conversation assembly

use crate::config::AssistantConfig;
use crate::knowledge::KnowledgeEntry;
use crate::llm::Message;
use crate::search::format_grounding_context;

const CONTEXT_HEADER: &str = "\n\nRelevant information from the knowledge base:\n\n";

fn default_instructions(company: &str) -> String {
    format!(
        "You are the virtual assistant for {company}. You help website visitors learn about \
         products and services, answer their questions, and get in touch with the team.\n\n\
         Guidelines:\n\
         - Be concise, friendly and professional.\n\
         - Use the search_knowledge_base tool when you need information you do not have.\n\
         - When a visitor wants to be contacted or asks for a quote, collect their name, email \
         and message, then use the submit_contact_form tool.\n\
         - Never invent prices, policies or product details. Say so when you do not know."
    )
}

/// Instruction text followed by any grounding context
pub fn build_system_prompt(config: &AssistantConfig, grounding: &[KnowledgeEntry]) -> String {
    let mut prompt = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| default_instructions(&config.company_name));

    if !grounding.is_empty() {
        prompt.push_str(CONTEXT_HEADER);
        prompt.push_str(&format_grounding_context(grounding));
    }

    prompt
}

/// `[system] + history + [user]`
pub fn assemble_conversation(system: String, history: Vec<Message>, message: &str) -> Vec<Message> {
    let mut conversation = Vec::with_capacity(history.len() + 2);
    conversation.push(Message::system(system));
    conversation.extend(history);
    conversation.push(Message::user(message));
    conversation
}
