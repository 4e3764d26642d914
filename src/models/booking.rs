use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ServiceDescriptor;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl ContactDetails {
    /// Presence check only; email and phone formats are not inspected.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.email.is_empty() && !self.phone.is_empty()
    }
}

/// The in-progress booking, accumulated across the wizard steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub service: ServiceDescriptor,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<String>,
    pub contact: ContactDetails,
    pub notes: String,
}

impl BookingDraft {
    pub fn new(service: ServiceDescriptor) -> Self {
        Self {
            service,
            selected_date: None,
            selected_time: None,
            contact: ContactDetails::default(),
            notes: String::new(),
        }
    }
}

/// The record handed to the hosting application once the flow is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedBooking {
    pub service: String,
    pub date: String,
    pub time: String,
    pub notes: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// A completed booking plus the machine-readable slot it occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingSubmission {
    pub booking_id: Uuid,
    pub date: NaiveDate,
    pub record: CompletedBooking,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_requires_all_fields() {
        let mut contact = ContactDetails::default();
        assert!(!contact.is_complete());

        contact.name = "Jane Doe".to_string();
        contact.email = "jane@example.com".to_string();
        assert!(!contact.is_complete());

        contact.phone = "555-0100".to_string();
        assert!(contact.is_complete());
    }

    #[test]
    fn test_contact_has_no_format_validation() {
        let contact = ContactDetails {
            name: "x".to_string(),
            email: "not-an-email".to_string(),
            phone: "call me".to_string(),
        };
        assert!(contact.is_complete());
    }

    #[test]
    fn test_new_draft_is_empty() {
        let draft = BookingDraft::new(ServiceDescriptor::default());
        assert!(draft.selected_date.is_none());
        assert!(draft.selected_time.is_none());
        assert_eq!(draft.contact, ContactDetails::default());
        assert!(draft.notes.is_empty());
    }
}
