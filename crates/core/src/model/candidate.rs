use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::CandidateId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("missing profile fields: {}", format_fields(.0))]
    Missing(BTreeSet<ProfileField>),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
}

fn format_fields(fields: &BTreeSet<ProfileField>) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//
// ─── PROFILE FIELDS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProfileField {
    Name,
    Email,
    Phone,
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProfileField::Name => "name",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone",
        })
    }
}

/// Best-effort output of resume parsing. Any contact field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResume {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub text: String,
}

/// Manually entered values for the "complete profile" step.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

//
// ─── DRAFT ────────────────────────────────────────────────────────────────────
//

/// An applicant whose identity is not yet complete enough to start a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDraft {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    resume_text: String,
}

impl CandidateDraft {
    #[must_use]
    pub fn from_resume(parsed: ParsedResume) -> Self {
        Self {
            name: normalize_optional(parsed.name),
            email: normalize_optional(parsed.email),
            phone: normalize_optional(parsed.phone),
            resume_text: parsed.text,
        }
    }

    /// Fields that must be entered manually before the session can start.
    #[must_use]
    pub fn missing_fields(&self) -> BTreeSet<ProfileField> {
        let mut missing = BTreeSet::new();
        if self.name.is_none() {
            missing.insert(ProfileField::Name);
        }
        if self.email.is_none() {
            missing.insert(ProfileField::Email);
        }
        if self.phone.is_none() {
            missing.insert(ProfileField::Phone);
        }
        missing
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    #[must_use]
    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    /// Apply manual entries over parsed values; blank entries are ignored.
    #[must_use]
    pub fn apply(mut self, update: ProfileUpdate) -> Self {
        if let Some(name) = normalize_optional(update.name) {
            self.name = Some(name);
        }
        if let Some(email) = normalize_optional(update.email) {
            self.email = Some(email);
        }
        if let Some(phone) = normalize_optional(update.phone) {
            self.phone = Some(phone);
        }
        self
    }

    /// Validate and promote the draft into a `Candidate`.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::Missing` while any field is absent, or
    /// `InvalidEmail`/`InvalidPhone` for malformed values.
    pub fn finalize(
        self,
        id: CandidateId,
        created_at: DateTime<Utc>,
    ) -> Result<Candidate, ProfileError> {
        let missing = self.missing_fields();
        let (Some(name), Some(email), Some(phone)) = (self.name, self.email, self.phone) else {
            return Err(ProfileError::Missing(missing));
        };

        if !is_plausible_email(&email) {
            return Err(ProfileError::InvalidEmail(email));
        }
        if !is_plausible_phone(&phone) {
            return Err(ProfileError::InvalidPhone(phone));
        }

        Ok(Candidate {
            id,
            name,
            email,
            phone,
            resume_text: self.resume_text,
            created_at,
        })
    }
}

//
// ─── CANDIDATE ────────────────────────────────────────────────────────────────
//

/// A fully identified applicant; the only thing a session can be started for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    id: CandidateId,
    name: String,
    email: String,
    phone: String,
    resume_text: String,
    created_at: DateTime<Utc>,
}

impl Candidate {
    /// Rehydrate a candidate from storage, re-running validation.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if the persisted values no longer validate.
    pub fn from_persisted(
        id: CandidateId,
        name: String,
        email: String,
        phone: String,
        resume_text: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProfileError> {
        CandidateDraft {
            name: normalize_optional(Some(name)),
            email: normalize_optional(Some(email)),
            phone: normalize_optional(Some(phone)),
            resume_text,
        }
        .finalize(id, created_at)
    }

    #[must_use]
    pub fn id(&self) -> CandidateId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    #[must_use]
    pub fn resume_text(&self) -> &str {
        &self.resume_text
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

fn is_plausible_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | ' ' | '(' | ')'));
    digits >= 7 && allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn parsed(name: Option<&str>, email: Option<&str>, phone: Option<&str>) -> ParsedResume {
        ParsedResume {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            text: "resume".into(),
        }
    }

    #[test]
    fn reports_missing_fields_and_blank_values() {
        let draft = CandidateDraft::from_resume(parsed(Some("  "), Some("a@b.io"), None));
        let missing = draft.missing_fields();
        assert!(missing.contains(&ProfileField::Name));
        assert!(missing.contains(&ProfileField::Phone));
        assert!(!missing.contains(&ProfileField::Email));
    }

    #[test]
    fn finalize_requires_every_field() {
        let draft = CandidateDraft::from_resume(parsed(Some("Ada Lovelace"), None, None));
        let err = draft.finalize(CandidateId::generate(), fixed_now()).unwrap_err();
        assert!(matches!(err, ProfileError::Missing(fields) if fields.len() == 2));
    }

    #[test]
    fn manual_entries_complete_the_profile() {
        let draft = CandidateDraft::from_resume(parsed(Some("Ada Lovelace"), None, None)).apply(
            ProfileUpdate {
                name: None,
                email: Some("ada@example.com".into()),
                phone: Some("+1 555 123 4567".into()),
            },
        );
        assert!(draft.is_complete());
        let candidate = draft.finalize(CandidateId::generate(), fixed_now()).unwrap();
        assert_eq!(candidate.name(), "Ada Lovelace");
        assert_eq!(candidate.email(), "ada@example.com");
    }

    #[test]
    fn rejects_malformed_contact_details() {
        let bad_email =
            CandidateDraft::from_resume(parsed(Some("A B"), Some("nope"), Some("5551234567")));
        assert!(matches!(
            bad_email.finalize(CandidateId::generate(), fixed_now()),
            Err(ProfileError::InvalidEmail(_))
        ));

        let bad_phone =
            CandidateDraft::from_resume(parsed(Some("A B"), Some("a@b.io"), Some("12ab")));
        assert!(matches!(
            bad_phone.finalize(CandidateId::generate(), fixed_now()),
            Err(ProfileError::InvalidPhone(_))
        ));
    }
}
