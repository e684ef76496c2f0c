// 🏢 Vendor Entity - Organization profiles
//
// Tenders reference organizations by id; the list view needs a display name.
// Only validated profiles show up on the vendors screen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const UNNAMED_ORGANIZATION: &str = "Unnamed Organization";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: String,
    pub organization_name: String,
    pub is_validated: bool,
    pub created_at: DateTime<Utc>,
}

impl Vendor {
    pub fn new(organization_name: &str) -> Self {
        Vendor {
            id: uuid::Uuid::new_v4().to_string(),
            organization_name: organization_name.trim().to_string(),
            is_validated: false,
            created_at: Utc::now(),
        }
    }

    pub fn validated(mut self) -> Self {
        self.is_validated = true;
        self
    }

    pub fn display_name(&self) -> &str {
        if self.organization_name.trim().is_empty() {
            UNNAMED_ORGANIZATION
        } else {
            &self.organization_name
        }
    }

    /// Short date for the vendors table
    pub fn created_display(&self) -> String {
        self.created_at.format("%-m/%-d/%Y").to_string()
    }
}

/// id → display name, used to resolve `organization_id` on tenders
pub fn organization_names(vendors: &[Vendor]) -> HashMap<String, String> {
    vendors
        .iter()
        .map(|v| (v.id.clone(), v.display_name().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_creation() {
        let vendor = Vendor::new("  Acme Works ");

        assert_eq!(vendor.organization_name, "Acme Works");
        assert!(!vendor.is_validated);
        assert_eq!(vendor.id.len(), 36);
        assert!(vendor.validated().is_validated);
    }

    #[test]
    fn test_blank_name_falls_back() {
        let vendor = Vendor::new("   ");
        assert_eq!(vendor.display_name(), UNNAMED_ORGANIZATION);
    }

    #[test]
    fn test_organization_names() {
        let a = Vendor::new("Acme Works");
        let b = Vendor::new("");
        let names = organization_names(&[a.clone(), b.clone()]);

        assert_eq!(names.get(&a.id).map(String::as_str), Some("Acme Works"));
        assert_eq!(names.get(&b.id).map(String::as_str), Some(UNNAMED_ORGANIZATION));
    }
}
