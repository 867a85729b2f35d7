//! Read-side projections shared by the admin and profile views.

pub mod admin;
pub mod profile;

use serde::Serialize;

use crate::domain::identity::Identity;
use crate::domain::quote::{QuoteCategory, QuoteRecord, QuoteStatus};

pub use admin::AdminView;
pub use profile::ProfileView;

/// Explicit answer to "really delete this request?".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    pub fn from_flag(confirmed: bool) -> Self {
        if confirmed {
            Self::Confirmed
        } else {
            Self::Declined
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(QuoteRecord),
    NotFound,
    NotConfirmed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub search: String,
}

impl QuoteFilter {
    /// Search matches company name, contact email or category label, ignoring case.
    pub fn matches(&self, record: &QuoteRecord) -> bool {
        if self.status.is_some_and(|status| status != record.status()) {
            return false;
        }

        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        record.company_name().to_lowercase().contains(&needle)
            || record.contact_email().to_lowercase().contains(&needle)
            || record.category().label().to_lowercase().contains(&needle)
    }

    pub fn apply<'a>(&self, records: &'a [QuoteRecord]) -> Vec<&'a QuoteRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: QuoteCategory,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct QuoteMetrics {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub archived: usize,
    /// Approved share of all records, rounded to a whole percent.
    pub approval_rate_pct: u32,
    /// Categories in order of first appearance.
    pub by_category: Vec<CategoryCount>,
}

impl QuoteMetrics {
    pub fn from_records(records: &[QuoteRecord]) -> Self {
        let mut metrics = Self { total: records.len(), ..Self::default() };

        for record in records {
            match record.status() {
                QuoteStatus::Pending => metrics.pending += 1,
                QuoteStatus::Approved => metrics.approved += 1,
                QuoteStatus::Rejected => metrics.rejected += 1,
                QuoteStatus::Archived => metrics.archived += 1,
            }

            let category = record.category();
            match metrics.by_category.iter_mut().find(|entry| entry.category == category) {
                Some(entry) => entry.count += 1,
                None => metrics.by_category.push(CategoryCount {
                    category,
                    label: category.label(),
                    count: 1,
                }),
            }
        }

        if metrics.total > 0 {
            let rate = (metrics.approved as f64 / metrics.total as f64) * 100.0;
            metrics.approval_rate_pct = rate.round() as u32;
        }

        metrics
    }

    pub fn count(&self, status: QuoteStatus) -> usize {
        match status {
            QuoteStatus::Pending => self.pending,
            QuoteStatus::Approved => self.approved,
            QuoteStatus::Rejected => self.rejected,
            QuoteStatus::Archived => self.archived,
        }
    }
}

/// What a signed-in customer sees on their profile page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileProjection {
    pub current: Vec<QuoteRecord>,
    pub archived: Vec<QuoteRecord>,
}

impl ProfileProjection {
    /// Ownership is a view-level convention; the store itself is not partitioned.
    pub fn for_identity(records: &[QuoteRecord], identity: &Identity) -> Self {
        let mut projection = Self::default();
        for record in records.iter().filter(|record| record.is_owned_by(identity)) {
            match record.status() {
                QuoteStatus::Pending => projection.current.push(record.clone()),
                QuoteStatus::Archived => projection.archived.push(record.clone()),
                QuoteStatus::Approved | QuoteStatus::Rejected => {}
            }
        }
        projection
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::domain::identity::Identity;
    use crate::domain::quote::{QuoteCategory, QuoteRecord, QuoteRequestForm};

    pub fn record(company: &str, email: &str, category: QuoteCategory) -> QuoteRecord {
        let owner = Identity::new(email, "Test", "");
        QuoteRecord::create(
            QuoteRequestForm {
                category: Some(category),
                company_name: company.to_owned(),
                contact_email: email.to_owned(),
                contact_phone: "0100000000".to_owned(),
                description: "test".to_owned(),
            },
            Some(&owner),
            Utc::now(),
        )
        .expect("valid form")
    }
}
