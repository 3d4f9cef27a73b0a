//! Keyword and regex intent detection.
//!
//! These checks run before semantic lookup and short-circuit it.

use once_cell::sync::Lazy;
use regex::Regex;

use hrassist_core::CompanyProfile;

static TYPO_POLICY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bpollicy\b").expect("valid regex"));
static WFH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwfh\b").expect("valid regex"));
static HEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bheyy+\b").expect("valid regex"));
static HELLO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bhelloo+\b").expect("valid regex"));
static HI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bhii+\b").expect("valid regex"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

static DOCUMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdocuments?\b").expect("valid regex"));

static GREETING: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(hi|hello|hey|good morning|good afternoon|good evening)\b",
        r"\bhow are you\b",
        r"\bwhat'?s up\b",
        r"\bgreetings\b",
    ])
});
static FAREWELL: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(bye|goodbye|see you|farewell)\b",
        r"\b(thank you|thanks|thx)\b",
    ])
});
static HELP: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(help|what can you do|capabilities|features)\b",
        r"\b(how does this work|how to use)\b",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

/// Substrings that mark a message as filled-in document details.
pub const DETAIL_INDICATORS: &[&str] = &[
    "name:",
    "employee",
    "id:",
    "purpose:",
    "joining",
    "leaving",
    "salary",
    "period:",
    "financial",
    "year:",
    "destination",
    "travel",
    "dates:",
    "visa",
    "noc",
    "reason:",
    "damaged",
    "lost",
    "replacement",
    "insurance",
    "medical",
];

/// Lowercase, fix common typos and stretched greetings, collapse whitespace.
///
/// Only used for intent checks; embeddings see the original text.
pub fn normalize_query(query: &str) -> String {
    let text = query.trim().to_lowercase();
    let text = TYPO_POLICY.replace_all(&text, "policy");
    let text = WFH.replace_all(&text, "work from home");
    let text = HEY.replace_all(&text, "hey");
    let text = HELLO.replace_all(&text, "hello");
    let text = HI.replace_all(&text, "hi");
    SPACES.replace_all(&text, " ").into_owned()
}

pub fn is_document_intent(normalized: &str) -> bool {
    DOCUMENT.is_match(normalized)
}

/// What a bare number means as a document choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentChoice {
    Valid(u8),
    OutOfRange,
}

/// Parse a message consisting only of digits. Anything else is not a choice.
pub fn parse_document_choice(query: &str, catalogue_len: usize) -> Option<DocumentChoice> {
    let trimmed = query.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match trimmed.parse::<usize>() {
        Ok(n) if (1..=catalogue_len).contains(&n) => {
            u8::try_from(n).ok().map(DocumentChoice::Valid)
        }
        _ => Some(DocumentChoice::OutOfRange),
    }
}

pub fn has_detail_indicator(query: &str) -> bool {
    let lower = query.to_lowercase();
    DETAIL_INDICATORS.iter().any(|needle| lower.contains(needle))
}

/// Small-talk categories answered with canned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversational {
    Greeting,
    Thanks,
    Farewell,
    Help,
}

/// Greeting wins over farewell, which wins over help.
pub fn detect_conversational(normalized: &str) -> Option<Conversational> {
    let any = |patterns: &[Regex]| patterns.iter().any(|re| re.is_match(normalized));
    if any(&GREETING) {
        Some(Conversational::Greeting)
    } else if any(&FAREWELL) {
        if normalized.contains("thank") || normalized.contains("thx") {
            Some(Conversational::Thanks)
        } else {
            Some(Conversational::Farewell)
        }
    } else if any(&HELP) {
        Some(Conversational::Help)
    } else {
        None
    }
}

/// Canned reply for a conversational intent. `hour` is the local hour (0-23).
pub fn conversational_reply(kind: Conversational, hour: u32, company: &CompanyProfile) -> String {
    match kind {
        Conversational::Greeting => {
            let (salutation, tail) = match hour {
                5..=11 => ("Good morning!", "How can I assist you today?"),
                12..=16 => ("Good afternoon!", "What do you need help with?"),
                _ => ("Good evening!", "What can I assist you with?"),
            };
            format!(
                "{} Welcome to {}. I'm your HR assistant, ready to help with policy \
                 questions and official document requests. {}",
                salutation, company.name, tail
            )
        }
        Conversational::Thanks => format!(
            "You're very welcome! If you need anything else, whether it's an HR question \
             or a document request, just let me know. Have a great day at {}!",
            company.name
        ),
        Conversational::Farewell => format!(
            "Goodbye! Thank you for using the {} HR assistant. Come back any time you \
             need help.",
            company.name
        ),
        Conversational::Help => format!(
            "Here's how I can help at {}:\n\n\
             **HR and IT questions**: ask about leave, attendance, benefits, conduct, \
             passwords, devices or software.\n\
             **Document requests**: type 'document' to see the sixteen official documents \
             you can request, then reply with its number.\n\n\
             For anything I can't answer, contact HR at {}.",
            company.name, company.hr_email
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_query("  Heyyy   there "), "hey there");
        assert_eq!(normalize_query("WFH pollicy?"), "work from home policy?");
        assert_eq!(normalize_query("hiii"), "hi");
    }

    #[test]
    fn test_document_intent_is_word_based() {
        assert!(is_document_intent("i need a document"));
        assert!(is_document_intent("which documents can i get"));
        assert!(!is_document_intent("how is documentation reviewed"));
    }

    #[test]
    fn test_document_choice() {
        assert_eq!(parse_document_choice(" 7 ", 16), Some(DocumentChoice::Valid(7)));
        assert_eq!(parse_document_choice("16", 16), Some(DocumentChoice::Valid(16)));
        assert_eq!(parse_document_choice("0", 16), Some(DocumentChoice::OutOfRange));
        assert_eq!(parse_document_choice("17", 16), Some(DocumentChoice::OutOfRange));
        assert_eq!(
            parse_document_choice("99999999999999999999999", 16),
            Some(DocumentChoice::OutOfRange)
        );
        assert_eq!(parse_document_choice("7 days", 16), None);
        assert_eq!(parse_document_choice("-3", 16), None);
    }

    #[test]
    fn test_conversational() {
        let n = |s: &str| detect_conversational(&normalize_query(s));
        assert_eq!(n("hello"), Some(Conversational::Greeting));
        assert_eq!(n("Heyyy!"), Some(Conversational::Greeting));
        assert_eq!(n("what's up"), Some(Conversational::Greeting));
        assert_eq!(n("thanks a lot"), Some(Conversational::Thanks));
        assert_eq!(n("ok bye"), Some(Conversational::Farewell));
        assert_eq!(n("what can you do"), Some(Conversational::Help));
        assert_eq!(n("how many sick leaves do i get"), None);
        assert_eq!(n("this is highly unusual"), None);
    }

    #[test]
    fn test_greeting_depends_on_hour() {
        let company = CompanyProfile::default();
        let reply = |h| conversational_reply(Conversational::Greeting, h, &company);
        assert!(reply(5).starts_with("Good morning"));
        assert!(reply(11).starts_with("Good morning"));
        assert!(reply(12).starts_with("Good afternoon"));
        assert!(reply(17).starts_with("Good evening"));
        assert!(reply(2).starts_with("Good evening"));
        assert!(reply(9).contains("TechCorp Solutions"));
    }

    #[test]
    fn test_detail_indicators() {
        assert!(has_detail_indicator("Name: Asha, Employee ID: E102"));
        assert!(has_detail_indicator("lost my card"));
        assert!(!has_detail_indicator("what is the leave policy"));
    }
}
