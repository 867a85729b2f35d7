use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::identity::Identity;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub String);

impl QuoteId {
    pub fn generate() -> Self {
        Self(format!("Q-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    Approved,
    Rejected,
    Archived,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 4] =
        [QuoteStatus::Pending, QuoteStatus::Approved, QuoteStatus::Rejected, QuoteStatus::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// The fixed catalogue a request is filed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteCategory {
    LockersSafes,
    VideoSurveillance,
    AlarmsDetection,
    BiometricAccess,
    ConnectedLocks,
    CompleteSolution,
    Other,
}

impl QuoteCategory {
    pub const ALL: [QuoteCategory; 7] = [
        QuoteCategory::LockersSafes,
        QuoteCategory::VideoSurveillance,
        QuoteCategory::AlarmsDetection,
        QuoteCategory::BiometricAccess,
        QuoteCategory::ConnectedLocks,
        QuoteCategory::CompleteSolution,
        QuoteCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LockersSafes => "lockers_safes",
            Self::VideoSurveillance => "video_surveillance",
            Self::AlarmsDetection => "alarms_detection",
            Self::BiometricAccess => "biometric_access",
            Self::ConnectedLocks => "connected_locks",
            Self::CompleteSolution => "complete_solution",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LockersSafes => "Casiers & Coffres Sécurisés",
            Self::VideoSurveillance => "Systèmes de Vidéosurveillance",
            Self::AlarmsDetection => "Alarmes & Détection",
            Self::BiometricAccess => "Contrôle d'Accès Biométrique",
            Self::ConnectedLocks => "Cadenas & Serrures Connectés",
            Self::CompleteSolution => "Solution de Sécurité Complète",
            Self::Other => "Autre (à préciser)",
        }
    }

    fn short_name(&self) -> &'static str {
        match self {
            Self::LockersSafes => "casiers",
            Self::VideoSurveillance => "videosurveillance",
            Self::AlarmsDetection => "alarmes",
            Self::BiometricAccess => "biometrie",
            Self::ConnectedLocks => "cadenas",
            Self::CompleteSolution => "solution complete",
            Self::Other => "autre",
        }
    }

    /// Accepts the slug (`-` or `_` separated), the catalogue label or its short French name.
    pub fn parse(value: &str) -> Option<Self> {
        let needle = value.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let slug = needle.replace('-', "_");
        Self::ALL.into_iter().find(|category| {
            slug == category.as_str()
                || needle == category.label().to_lowercase()
                || needle == category.short_name()
        })
    }
}

impl fmt::Display for QuoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the creation form collects before a record exists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequestForm {
    pub category: Option<QuoteCategory>,
    pub company_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub description: String,
}

impl QuoteRequestForm {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.category.is_none() {
            missing.push("category");
        }
        if self.company_name.trim().is_empty() {
            missing.push("company_name");
        }
        if self.contact_email.trim().is_empty() {
            missing.push("contact_email");
        }
        if self.contact_phone.trim().is_empty() {
            missing.push("contact_phone");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        missing
    }

    /// Validation run before submission. The contact email may still be blank
    /// here because it can be taken from the identity that finalizes the request.
    pub fn validate_for_submission(&self) -> Result<(), DomainError> {
        let missing: Vec<String> = self
            .missing_fields()
            .into_iter()
            .filter(|field| *field != "contact_email")
            .map(str::to_owned)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::MissingRequiredFields { fields: missing })
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::MissingRequiredFields {
                fields: missing.into_iter().map(str::to_owned).collect(),
            })
        }
    }

    pub fn with_contact_email_fallback(mut self, identity: &Identity) -> Self {
        if self.contact_email.trim().is_empty() {
            self.contact_email = identity.email.clone();
        }
        self
    }
}

/// One customer request. Only `status` changes after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    id: QuoteId,
    created_at: DateTime<Utc>,
    status: QuoteStatus,
    category: QuoteCategory,
    company_name: String,
    contact_email: String,
    contact_phone: String,
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_email: Option<String>,
}

impl QuoteRecord {
    /// Builds a fresh `Pending` record with a newly generated id.
    pub fn create(
        form: QuoteRequestForm,
        owner: Option<&Identity>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        Self::with_id(QuoteId::generate(), form, owner, created_at)
    }

    pub fn with_id(
        id: QuoteId,
        form: QuoteRequestForm,
        owner: Option<&Identity>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if id.0.trim().is_empty() {
            return Err(DomainError::InvariantViolation("quote id must not be blank".to_owned()));
        }
        form.validate()?;
        let category = form.category.ok_or_else(|| DomainError::MissingRequiredFields {
            fields: vec!["category".to_owned()],
        })?;

        Ok(Self {
            id,
            created_at,
            status: QuoteStatus::Pending,
            category,
            company_name: form.company_name.trim().to_owned(),
            contact_email: form.contact_email.trim().to_owned(),
            contact_phone: form.contact_phone.trim().to_owned(),
            description: form.description.trim().to_owned(),
            owner_email: owner.map(|identity| identity.email.trim().to_owned()),
        })
    }

    pub fn id(&self) -> &QuoteId {
        &self.id
    }

    pub fn status(&self) -> QuoteStatus {
        self.status
    }

    pub fn category(&self) -> QuoteCategory {
        self.category
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    pub fn contact_phone(&self) -> &str {
        &self.contact_phone
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn owner_email(&self) -> Option<&str> {
        self.owner_email.as_deref()
    }

    /// Re-checks the creation invariants on a record that did not come from
    /// [`QuoteRecord::with_id`], such as one read from an import file.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.0.trim().is_empty() {
            return Err(DomainError::InvariantViolation("quote id must not be blank".to_owned()));
        }

        let missing: Vec<String> = [
            ("company_name", &self.company_name),
            ("contact_email", &self.contact_email),
            ("contact_phone", &self.contact_phone),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field.to_owned())
        .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::MissingRequiredFields { fields: missing })
        }
    }

    /// Records created before ownership was tracked fall back to the contact email.
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        match &self.owner_email {
            Some(owner) => identity.matches_email(owner),
            None => identity.matches_email(&self.contact_email),
        }
    }

    pub(crate) fn set_status(&mut self, status: QuoteStatus) {
        self.status = status;
    }
}
