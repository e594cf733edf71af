//! Field normalizers: pure functions turning one raw field into its canonical
//! form, or `None` when the field cannot be normalized.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::domain::RecordId;

/// Honorifics removed from display names before splitting
pub const HONORIFICS: [&str; 5] = ["Mr.", "Mrs.", "Ms.", "Dr.", "Prof."];

pub const UNKNOWN_FIRST_NAME: &str = "Unknown";
pub const UNKNOWN_LAST_NAME: &str = "User";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern is valid")
});

/// A display name split into first and last parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameParts {
    pub first: String,
    pub last: String,
}

/// Split a display name into first and last name.
///
/// Honorifics are stripped wherever they appear. A comma takes precedence over
/// a space as the separator; the parts after the first comma are rejoined with
/// single spaces. Names with no separator become `Unknown User`.
pub fn split_name(name: &str) -> NameParts {
    let mut cleaned = name.to_string();
    for honorific in HONORIFICS {
        cleaned = cleaned.replace(honorific, "").trim().to_string();
    }

    if let Some((first, rest)) = cleaned.split_once(',') {
        return NameParts {
            first: first.to_string(),
            last: rest.split(',').collect::<Vec<_>>().join(" "),
        };
    }

    match cleaned.split_once(' ') {
        Some((first, rest)) => NameParts {
            first: first.to_string(),
            last: rest.to_string(),
        },
        None => NameParts {
            first: UNKNOWN_FIRST_NAME.to_string(),
            last: UNKNOWN_LAST_NAME.to_string(),
        },
    }
}

/// Validate an email address and return it lower-cased.
pub fn normalize_email(email: &str) -> Option<String> {
    if EMAIL_RE.is_match(email) {
        Some(email.to_lowercase())
    } else {
        None
    }
}

/// Canonicalize a North American phone number to E.164.
///
/// Anything after the first space (extensions such as ` x56442`) is discarded.
pub fn normalize_phone(phone: &str) -> Option<String> {
    let main_part = phone.split(' ').next().unwrap_or_default();
    let digits: String = main_part.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.len() {
        10 => Some(format!("+1{}", digits)),
        11 if digits.starts_with('1') => Some(format!("+{}", digits)),
        _ => None,
    }
}

/// Join street, suite, city and zipcode into one line.
///
/// Returns `None` when all four parts are empty or missing.
pub fn compose_address(address: &Value) -> Option<String> {
    let parts = ["street", "suite", "city", "zipcode"].map(|key| field_str(address, key));
    if parts.iter().all(|p| p.is_empty()) {
        return None;
    }
    Some(parts.join(", "))
}

/// Company name, or `None` when absent or empty.
pub fn extract_company(company: &Value) -> Option<String> {
    let name = field_str(company, "name");
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// String field of a raw record, empty when missing or not a string
pub fn field_str<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Identifier field of a raw record, unchanged from the source
pub fn field_id(record: &Value, key: &str) -> Option<RecordId> {
    record.get(key).and_then(RecordId::from_value)
}

/// Truthiness of a loosely typed flag: missing, `null`, `false`, zero and
/// empty strings or collections are false; everything else is true.
pub fn field_flag(record: &Value, key: &str) -> bool {
    match record.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
