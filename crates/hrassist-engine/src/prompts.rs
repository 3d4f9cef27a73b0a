//! Prompt templates and canned replies.

use hrassist_core::CompanyProfile;
use hrassist_store::QaPair;

pub const EMPTY_INPUT_REPLY: &str = "I didn't receive a message. Please try again.";

pub fn invalid_choice_reply(catalogue_len: usize) -> String {
    format!("Please select a valid document number (1-{}).", catalogue_len)
}

/// Answer the user's question using the closest dataset pair as context.
pub fn contextual_prompt(query: &str, similar: &QaPair, company: &CompanyProfile) -> String {
    format!(
        "You are an HR assistant for {company}. A user asked: \"{query}\"\n\n\
         The most similar question in our database is: \"{question}\"\n\
         With answer: \"{answer}\"\n\n\
         Generate a helpful, accurate answer to the user's question. If the similar \
         question is relevant, use it as context. If not, give a general but helpful \
         response about {company} policies.\n\n\
         Keep the answer professional and concise, and mention {email} for anything \
         that needs HR follow-up.\n\nAnswer:",
        company = company.name,
        query = query,
        question = similar.question,
        answer = similar.answer,
        email = company.hr_email,
    )
}

/// Used when semantic search is disabled and there is no dataset context.
pub fn open_prompt(query: &str, company: &CompanyProfile) -> String {
    format!(
        "You are an HR assistant for {company}. A user asked: \"{query}\"\n\n\
         Give a brief, professional answer about typical HR or IT policy. If the \
         question depends on company-specific rules you do not know, say so and \
         direct the user to {email}.\n\nAnswer:",
        company = company.name,
        query = query,
        email = company.hr_email,
    )
}

/// Ask for Question/Answer pairs grounded in one chunk of policy text.
pub fn harvest_prompt(chunk: &str, policy_name: &str) -> String {
    format!(
        "Based on the following text from the {policy} policy, generate 3-5 natural \
         questions that employees might ask. Focus on practical, common questions about \
         policies, procedures and benefits.\n\n\
         Text:\n{chunk}\n\n\
         Use exactly this format for each pair:\n\
         Question: [natural question]\n\
         Answer: [complete answer]\n",
        policy = policy_name,
        chunk = chunk,
    )
}

/// Condense a document, or a section of one, into plain prose.
pub fn summary_prompt(text: &str, max_words: usize) -> String {
    format!(
        "Summarize the following document text in at most {max_words} words. Keep the \
         key facts, obligations, dates and figures. Write plain prose without headings \
         or lists.\n\n\
         Text:\n{text}\n\nSummary:",
        max_words = max_words,
        text = text,
    )
}

pub fn static_fallback(company: &CompanyProfile) -> String {
    format!(
        "I'm not finding a specific match for that in our knowledge base.\n\n\
         **Here's how I can help:**\n\
         - **HR policies**: attendance, leave, benefits, conduct\n\
         - **IT policies**: acceptable use, passwords, devices, software\n\
         - **Document requests**: type 'document' to request an official document\n\
         - **Help**: type 'help' to see everything I can do\n\n\
         For anything else, please contact HR at {}.",
        company.hr_email
    )
}
