//! Official document catalogue, detail validation and the request log.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use hrassist_core::{CompanyProfile, Error, Result};

/// One requestable document and the details HR needs to issue it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DocumentKind {
    /// Catalogue number, also the `doc_type` key ("1".."16").
    pub number: u8,
    pub name: &'static str,
    /// Detail fields beyond name and employee id.
    pub extra_fields: &'static [&'static str],
}

impl DocumentKind {
    pub fn doc_type(&self) -> String {
        self.number.to_string()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> {
        BASE_FIELDS.iter().chain(self.extra_fields.iter()).copied()
    }
}

const BASE_FIELDS: &[&str] = &["name", "employee_id"];

#[rustfmt::skip]
pub const CATALOGUE: &[DocumentKind] = &[
    DocumentKind { number: 1, name: "Bonafide / Employment Verification Letter", extra_fields: &["purpose"] },
    DocumentKind { number: 2, name: "Experience Certificate", extra_fields: &["joining_date"] },
    DocumentKind { number: 3, name: "Offer Letter Copy", extra_fields: &[] },
    DocumentKind { number: 4, name: "Appointment Letter Copy", extra_fields: &[] },
    DocumentKind { number: 5, name: "Promotion Letter", extra_fields: &[] },
    DocumentKind { number: 6, name: "Relieving Letter", extra_fields: &["relieving_date"] },
    DocumentKind { number: 7, name: "Salary Slips", extra_fields: &["period"] },
    DocumentKind { number: 8, name: "Form 16 / Tax Documents", extra_fields: &["financial_year"] },
    DocumentKind { number: 9, name: "Salary Certificate", extra_fields: &["purpose"] },
    DocumentKind { number: 10, name: "PF Statement / UAN details", extra_fields: &[] },
    DocumentKind { number: 11, name: "No Objection Certificate (NOC)", extra_fields: &["purpose"] },
    DocumentKind { number: 12, name: "Non-Disclosure Agreement Copy", extra_fields: &[] },
    DocumentKind { number: 13, name: "ID Card Replacement", extra_fields: &["reason"] },
    DocumentKind { number: 14, name: "Medical Insurance Card Copy", extra_fields: &[] },
    DocumentKind { number: 15, name: "Business Travel Authorization Letter", extra_fields: &["destination", "travel_dates"] },
    DocumentKind { number: 16, name: "Visa Support Letter", extra_fields: &["destination", "travel_dates"] },
];

/// Look up by catalogue number given as text ("7") or integer.
pub fn find_kind(doc_type: &str) -> Option<&'static DocumentKind> {
    let n: u8 = doc_type.trim().parse().ok()?;
    CATALOGUE.iter().find(|k| k.number == n)
}

/// Numbered list shown when a user asks for documents.
pub fn catalogue_text(company: &CompanyProfile) -> String {
    let mut text = String::from(
        "**Document Requests**\n\nI can help you request official documents. \
         Reply with the number of the document you need:\n\n",
    );
    for kind in CATALOGUE {
        text.push_str(&format!("{}. {}\n", kind.number, kind.name));
    }
    text.push_str(&format!(
        "\nAfter choosing, send your details (for example `Name: ..., Employee ID: ...`). \
         Questions? Contact HR at {}.",
        company.hr_email
    ));
    text
}

/// Chat sentinel telling the front end to open the request form.
pub fn form_sentinel(kind: &DocumentKind) -> String {
    format!("SHOW_FORM:{}:{}", kind.number, kind.name)
}

static FREE_TEXT_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z][A-Za-z _]*?)\s*:\s*([^,;\n]+)").expect("valid regex"));

/// Collapse `Employee ID`, `employeeId` and `employee_id` to one key, then
/// fold aliases onto the canonical field names.
fn canonical_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for c in raw.trim().chars() {
        if c.is_ascii_uppercase() && prev_lower {
            key.push('_');
        }
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
        } else if !key.ends_with('_') {
            key.push('_');
        }
        prev_lower = c.is_ascii_lowercase();
    }
    let key = key.trim_matches('_');
    match key {
        "full_name" | "employee_name" | "emp_name" => "name",
        "emp_id" | "id" | "employee_code" | "emp_code" => "employee_id",
        "dates" | "travel_date" => "travel_dates",
        "year" | "fy" => "financial_year",
        "salary_period" | "month" | "months" => "period",
        "leaving_date" | "last_working_day" => "relieving_date",
        "date_of_joining" | "joining" => "joining_date",
        other => other,
    }
    .to_string()
}

/// Parse submitted details: a JSON object from the form, or `Key: value`
/// pairs typed in chat.
pub fn parse_details(details: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(details) {
        for (key, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            fields.insert(canonical_key(&key), value.trim().to_string());
        }
        return fields;
    }
    for caps in FREE_TEXT_FIELD.captures_iter(details) {
        fields.insert(canonical_key(&caps[1]), caps[2].trim().to_string());
    }
    fields
}

/// Check that every required field for `kind` is present and non-blank.
pub fn validate_details(kind: &DocumentKind, details: &str) -> Result<()> {
    if details.trim().is_empty() {
        return Err(Error::Validation("No details provided".into()));
    }
    let fields = parse_details(details);
    let missing: Vec<&str> = kind
        .required_fields()
        .filter(|f| fields.get(*f).map_or(true, |v| v.is_empty()))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Missing required details for {}: {}",
            kind.name,
            missing.join(", ")
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Completed,
}

/// A submitted document request awaiting HR.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRequest {
    pub request_id: String,
    pub document_type: String,
    pub document_name: String,
    pub details: String,
    pub user_id: String,
    pub status: RequestStatus,
    pub submitted_at: String,
    pub hr_notified: bool,
}

/// In-memory log of submitted requests, keyed by request id.
pub struct DocumentRequestLog {
    requests: RwLock<HashMap<String, DocumentRequest>>,
}

impl DocumentRequestLog {
    pub fn new() -> Self {
        Self {
            requests: RwLock::new(HashMap::new()),
        }
    }

    /// Validate and record a request. Fails on unknown type or missing details.
    pub fn submit(&self, doc_type: &str, details: &str, user_id: &str) -> Result<DocumentRequest> {
        let kind = find_kind(doc_type)
            .ok_or_else(|| Error::Validation(format!("Invalid document type: {}", doc_type)))?;
        validate_details(kind, details)?;

        let short = uuid::Uuid::new_v4().simple().to_string();
        let request = DocumentRequest {
            request_id: format!("DOC-{}", short[..8].to_uppercase()),
            document_type: kind.doc_type(),
            document_name: kind.name.to_string(),
            details: details.trim().to_string(),
            user_id: if user_id.trim().is_empty() {
                "anonymous".into()
            } else {
                user_id.trim().to_string()
            },
            status: RequestStatus::Pending,
            submitted_at: chrono::Utc::now().to_rfc3339(),
            hr_notified: false,
        };

        self.requests
            .write()
            .insert(request.request_id.clone(), request.clone());
        info!(
            request_id = %request.request_id,
            document = %request.document_name,
            user = %request.user_id,
            "Document request submitted"
        );
        Ok(request)
    }

    pub fn get(&self, request_id: &str) -> Option<DocumentRequest> {
        self.requests.read().get(request_id).cloned()
    }

    /// Requests for a user, oldest first.
    pub fn for_user(&self, user_id: &str) -> Vec<DocumentRequest> {
        let mut found: Vec<DocumentRequest> = self
            .requests
            .read()
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        found
    }

    pub fn pending_count(&self) -> usize {
        self.requests
            .read()
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .count()
    }

    pub fn total(&self) -> usize {
        self.requests.read().len()
    }
}

impl Default for DocumentRequestLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Chat reply confirming a submitted request.
pub fn confirmation_text(request: &DocumentRequest, company: &CompanyProfile) -> String {
    format!(
        "Your request for **{}** has been submitted.\n\nRequest ID: {}\nStatus: pending\n\n\
         HR will process it and get back to you. For questions, contact {}.",
        request.document_name, request.request_id, company.hr_email
    )
}
