//! Prompt templates for each generation request kind.

use crate::domain::models::GenerationRequest;

/// A system instruction plus the user-turn text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System message.
    pub system: String,
    /// User message.
    pub user: String,
}

const PERSONA_SYSTEM: &str = "You generate realistic fictional personas for privacy research. \
Respond ONLY with valid JSON matching this schema: \
{\"name\": str, \"age\": int, \"location\": str, \"occupation\": str, \
\"interests\": [str], \"personality_notes\": str, \"search_topics\": [str], \
\"favorite_sites\": [str], \"shopping_interests\": [str]}";

const SEARCH_SYSTEM: &str = "You generate realistic search engine queries that a specific person \
would type. Respond ONLY with a JSON array of strings. Make them natural: include typos, \
abbreviations and varying specificity like real searches.";

const BROWSING_SYSTEM: &str = "You generate realistic web browsing plans for privacy research. \
Respond ONLY with valid JSON: {\"urls_to_visit\": [str], \"products_to_browse\": [str]}. \
URLs should be real, popular websites. Products should be specific items with brand names \
someone would search for in an online store.";

const FORM_SYSTEM: &str = "Generate realistic fake form data for a persona. Respond ONLY with JSON: \
{\"first_name\": str, \"last_name\": str, \"email\": str, \"phone\": str, \"address\": str, \
\"city\": str, \"state\": str, \"zip\": str, \"company\": str, \"job_title\": str}";

/// Build the prompt for `request`.
pub fn render(request: &GenerationRequest) -> Prompt {
    match request {
        GenerationRequest::Persona { hint } => {
            let mut user = String::from(
                "Generate a realistic, diverse persona for an American adult. \
                 Make the interests specific and varied, not generic. \
                 The persona should feel like a real person with quirky, non-obvious interest combinations.",
            );
            if let Some(hint) = hint.as_deref().filter(|h| !h.trim().is_empty()) {
                user.push_str("\nAdditional guidance: ");
                user.push_str(hint.trim());
            }
            Prompt {
                system: PERSONA_SYSTEM.to_string(),
                user,
            }
        }
        GenerationRequest::SearchQueries { persona_summary, count } => Prompt {
            system: SEARCH_SYSTEM.to_string(),
            user: format!(
                "Generate {count} search engine queries that this person would make:\n{persona_summary}\n\n\
                 Mix mundane daily searches with interest-specific ones."
            ),
        },
        GenerationRequest::BrowsingPlan {
            persona_summary,
            pages,
            products,
        } => Prompt {
            system: BROWSING_SYSTEM.to_string(),
            user: format!(
                "Generate a browsing plan for this person:\n{persona_summary}\n\n\
                 Include {pages} URLs they'd visit and {products} specific products they'd look at online."
            ),
        },
        GenerationRequest::FormData { persona_summary } => Prompt {
            system: FORM_SYSTEM.to_string(),
            user: format!("Generate plausible (but fake) form fill data for:\n{persona_summary}"),
        },
    }
}
