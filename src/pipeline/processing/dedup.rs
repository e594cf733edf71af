use std::collections::HashSet;

use super::normalize::NameParts;

/// Identity keys of the records accepted so far in one stage invocation.
///
/// A fresh tracker is created for every processor run; nothing is carried
/// across stages or pipeline runs. Only accepted records are registered, so the
/// first record of a colliding group wins and later ones are flagged.
#[derive(Debug, Default)]
pub struct DedupTracker {
    emails: HashSet<String>,
    phones: HashSet<String>,
    names: HashSet<NameParts>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when any identity key of the candidate matches an accepted record.
    ///
    /// Checked in priority order email, phone, name pair. A missing phone never collides.
    pub fn is_duplicate(&self, email: &str, phone: Option<&str>, name: &NameParts) -> bool {
        self.emails.contains(email)
            || phone.is_some_and(|p| self.phones.contains(p))
            || self.names.contains(name)
    }

    /// Register the identity keys of an accepted record
    pub fn register(&mut self, email: &str, phone: Option<&str>, name: &NameParts) {
        self.emails.insert(email.to_string());
        if let Some(phone) = phone {
            self.phones.insert(phone.to_string());
        }
        self.names.insert(name.clone());
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
