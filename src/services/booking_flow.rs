use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    BookingDraft, CompletedBooking, ContactDetails, ServiceDescriptor, TimeSlot,
};
use crate::services::calendar::{self, CalendarSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Calendar,
    Contact,
    Confirmation,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Calendar => "calendar",
            Step::Contact => "contact",
            Step::Confirmation => "confirmation",
        }
    }
}

/// Which controls are enabled in the current state. Disabled actions are
/// no-ops when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableActions {
    pub can_continue: bool,
    pub can_submit_contact: bool,
    pub can_submit: bool,
    pub can_go_back: bool,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SubmitError {
    #[error("booking can only be submitted from the confirmation step (currently {0:?})")]
    WrongStep(Step),
    #[error("a submission is already in progress")]
    InProgress,
}

/// Owns the wizard step and the booking draft for one booking session.
///
/// Steps never touch the draft themselves: every mutation goes through one of
/// the methods below, which check the step guards and fold the new values in.
#[derive(Debug, Clone)]
pub struct FlowController {
    step: Step,
    draft: BookingDraft,
    bookable_dates: Vec<NaiveDate>,
    visible_month: NaiveDate,
    time_slots: Vec<TimeSlot>,
    submitting: bool,
    last_error: Option<String>,
}

impl FlowController {
    pub fn new(service: ServiceDescriptor, today: NaiveDate, settings: &CalendarSettings) -> Self {
        Self {
            step: Step::Calendar,
            draft: BookingDraft::new(service),
            bookable_dates: calendar::bookable_dates(today, settings),
            visible_month: calendar::first_of_month(today),
            time_slots: Vec::new(),
            submitting: false,
            last_error: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn bookable_dates(&self) -> &[NaiveDate] {
        &self.bookable_dates
    }

    pub fn time_slots(&self) -> &[TimeSlot] {
        &self.time_slots
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_bookable(&self, date: NaiveDate) -> bool {
        self.bookable_dates.contains(&date)
    }

    // ── Calendar step ──

    pub fn visible_month(&self) -> NaiveDate {
        self.visible_month
    }

    pub fn month_label(&self) -> String {
        calendar::month_label(self.visible_month)
    }

    /// Bookable dates that fall inside the month currently on screen.
    pub fn visible_dates(&self) -> Vec<NaiveDate> {
        self.bookable_dates
            .iter()
            .copied()
            .filter(|d| calendar::same_month(*d, self.visible_month))
            .collect()
    }

    pub fn navigate_month(&mut self, offset: i32) -> bool {
        if self.step != Step::Calendar {
            return false;
        }
        match calendar::shift_month(self.visible_month, offset) {
            Some(month) => {
                self.visible_month = month;
                true
            }
            None => false,
        }
    }

    /// Picks a day and replaces the time grid with `slots`. Any previously
    /// chosen time is cleared, even when the same day is picked again.
    pub fn select_date(&mut self, date: NaiveDate, slots: Vec<TimeSlot>) -> bool {
        if self.step != Step::Calendar || !self.is_bookable(date) {
            return false;
        }
        self.draft.selected_date = Some(date);
        self.draft.selected_time = None;
        self.time_slots = slots;
        self.visible_month = calendar::first_of_month(date);
        true
    }

    pub fn select_time(&mut self, time: &str) -> bool {
        if self.step != Step::Calendar || self.draft.selected_date.is_none() {
            return false;
        }
        let open = self
            .time_slots
            .iter()
            .any(|slot| slot.time == time && slot.available);
        if !open {
            return false;
        }
        self.draft.selected_time = Some(time.to_string());
        true
    }

    pub fn can_continue(&self) -> bool {
        self.step == Step::Calendar
            && self.draft.selected_date.is_some()
            && self.draft.selected_time.is_some()
    }

    pub fn continue_to_contact(&mut self) -> bool {
        if !self.can_continue() {
            return false;
        }
        self.step = Step::Contact;
        true
    }

    // ── Contact step ──

    /// Initial values for the contact form: whatever was entered last time.
    pub fn contact_form(&self) -> ContactDetails {
        self.draft.contact.clone()
    }

    pub fn submit_contact(&mut self, details: ContactDetails) -> bool {
        if self.step != Step::Contact || !details.is_complete() {
            return false;
        }
        self.draft.contact = details;
        self.step = Step::Confirmation;
        true
    }

    // ── Navigation ──

    pub fn can_go_back(&self) -> bool {
        match self.step {
            Step::Calendar => false,
            Step::Contact => true,
            Step::Confirmation => !self.submitting,
        }
    }

    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.step = match self.step {
            Step::Contact => Step::Calendar,
            Step::Confirmation => Step::Contact,
            Step::Calendar => Step::Calendar,
        };
        true
    }

    // ── Confirmation step ──

    /// Preview of the outgoing record; `None` until date and time are chosen.
    pub fn summary(&self) -> Option<CompletedBooking> {
        let date = self.draft.selected_date?;
        let time = self.draft.selected_time.clone()?;
        let contact = &self.draft.contact;
        Some(CompletedBooking {
            service: self.draft.service.display_name().to_string(),
            date: calendar::format_long_date(date),
            time,
            notes: self.draft.notes.clone(),
            name: contact.name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        })
    }

    /// Folds the notes into the draft and locks the flow until the submission
    /// settles via [`FlowController::fail_submission`] or the flow is dropped.
    pub fn begin_submission(
        &mut self,
        notes: String,
    ) -> Result<(NaiveDate, CompletedBooking), SubmitError> {
        if self.step != Step::Confirmation {
            return Err(SubmitError::WrongStep(self.step));
        }
        if self.submitting {
            return Err(SubmitError::InProgress);
        }
        // Date and time are always set once the flow reaches confirmation.
        let Some(date) = self.draft.selected_date else {
            return Err(SubmitError::WrongStep(self.step));
        };
        self.draft.notes = notes;
        let Some(record) = self.summary() else {
            return Err(SubmitError::WrongStep(self.step));
        };

        self.submitting = true;
        self.last_error = None;
        Ok((date, record))
    }

    pub fn fail_submission(&mut self, message: String) {
        self.submitting = false;
        self.last_error = Some(message);
    }

    pub fn actions(&self) -> AvailableActions {
        AvailableActions {
            can_continue: self.can_continue(),
            can_submit_contact: self.step == Step::Contact && self.draft.contact.is_complete(),
            can_submit: self.step == Step::Confirmation && !self.submitting,
            can_go_back: self.can_go_back(),
        }
    }

    pub fn snapshot(&self, id: Uuid) -> FlowSnapshot {
        FlowSnapshot {
            id,
            step: self.step,
            service_name: self.draft.service.display_name().to_string(),
            draft: self.draft.clone(),
            formatted_date: self.draft.selected_date.map(calendar::format_long_date),
            month_label: self.month_label(),
            visible_dates: self.visible_dates(),
            time_slots: self.time_slots.clone(),
            summary: match self.step {
                Step::Confirmation => self.summary(),
                _ => None,
            },
            actions: self.actions(),
            submitting: self.submitting,
            error: self.last_error.clone(),
        }
    }
}

/// Everything a front end needs to render the current step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSnapshot {
    pub id: Uuid,
    pub step: Step,
    pub service_name: String,
    pub draft: BookingDraft,
    pub formatted_date: Option<String>,
    pub month_label: String,
    pub visible_dates: Vec<NaiveDate>,
    pub time_slots: Vec<TimeSlot>,
    pub summary: Option<CompletedBooking>,
    pub actions: AvailableActions,
    pub submitting: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn service() -> ServiceDescriptor {
        ServiceDescriptor {
            name: Some("Sports Massage".to_string()),
            ..ServiceDescriptor::default()
        }
    }

    fn open_slots() -> Vec<TimeSlot> {
        calendar::time_slots(date("2024-06-10"), &CalendarSettings::default(), None, &[])
    }

    fn jane() -> ContactDetails {
        ContactDetails {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            phone: "555-0100".to_string(),
        }
    }

    fn flow() -> FlowController {
        FlowController::new(service(), date("2024-06-10"), &CalendarSettings::default())
    }

    fn flow_at_confirmation() -> FlowController {
        let mut flow = flow();
        assert!(flow.select_date(date("2024-06-10"), open_slots()));
        assert!(flow.select_time("10:00"));
        assert!(flow.continue_to_contact());
        assert!(flow.submit_contact(jane()));
        flow
    }

    #[test]
    fn test_starts_on_calendar() {
        let flow = flow();
        assert_eq!(flow.step(), Step::Calendar);
        assert!(!flow.can_continue());
        assert!(!flow.can_go_back());
        assert_eq!(flow.month_label(), "June 2024");
    }

    #[test]
    fn test_select_date_clears_time() {
        let mut flow = flow();
        flow.select_date(date("2024-06-10"), open_slots());
        flow.select_time("10:00");
        assert_eq!(flow.draft().selected_time.as_deref(), Some("10:00"));

        assert!(flow.select_date(date("2024-06-11"), open_slots()));
        assert_eq!(flow.draft().selected_date, Some(date("2024-06-11")));
        assert!(flow.draft().selected_time.is_none());

        flow.select_time("11:30");
        assert!(flow.select_date(date("2024-06-11"), open_slots()));
        assert!(flow.draft().selected_time.is_none());
    }

    #[test]
    fn test_select_excluded_or_out_of_window_date_is_noop() {
        let mut flow = flow();
        // Sunday
        assert!(!flow.select_date(date("2024-06-16"), open_slots()));
        // Past the 30-day window
        assert!(!flow.select_date(date("2024-07-10"), open_slots()));
        assert!(flow.draft().selected_date.is_none());
    }

    #[test]
    fn test_time_requires_date() {
        let mut flow = flow();
        assert!(!flow.select_time("10:00"));
        assert!(flow.draft().selected_time.is_none());
    }

    #[test]
    fn test_unavailable_or_unknown_time_is_noop() {
        let mut flow = flow();
        let slots = calendar::time_slots(
            date("2024-06-10"),
            &CalendarSettings::default(),
            None,
            &["10:00".to_string()],
        );
        flow.select_date(date("2024-06-10"), slots);
        assert!(!flow.select_time("10:00"));
        assert!(!flow.select_time("18:00"));
        assert!(flow.select_time("10:30"));
    }

    #[test]
    fn test_continue_needs_date_and_time() {
        let mut flow = flow();
        assert!(!flow.continue_to_contact());

        flow.select_date(date("2024-06-10"), open_slots());
        assert!(!flow.can_continue());
        assert!(!flow.continue_to_contact());
        assert_eq!(flow.step(), Step::Calendar);

        flow.select_time("10:00");
        assert!(flow.can_continue());
        assert!(flow.continue_to_contact());
        assert_eq!(flow.step(), Step::Contact);
    }

    #[test]
    fn test_contact_submit_needs_all_fields() {
        let mut flow = flow();
        flow.select_date(date("2024-06-10"), open_slots());
        flow.select_time("10:00");
        flow.continue_to_contact();

        for missing in 0..3 {
            let mut details = jane();
            match missing {
                0 => details.name.clear(),
                1 => details.email.clear(),
                _ => details.phone.clear(),
            }
            assert!(!flow.submit_contact(details));
            assert_eq!(flow.step(), Step::Contact);
        }

        assert!(flow.submit_contact(jane()));
        assert_eq!(flow.step(), Step::Confirmation);
    }

    #[test]
    fn test_back_preserves_fields() {
        let mut flow = flow_at_confirmation();

        assert!(flow.back());
        assert_eq!(flow.step(), Step::Contact);
        assert_eq!(flow.contact_form(), jane());

        assert!(flow.back());
        assert_eq!(flow.step(), Step::Calendar);
        assert_eq!(flow.draft().selected_date, Some(date("2024-06-10")));
        assert_eq!(flow.draft().selected_time.as_deref(), Some("10:00"));
        assert!(!flow.back());
    }

    #[test]
    fn test_back_and_forward_reproduces_draft() {
        let mut flow = flow_at_confirmation();
        let before = flow.draft().clone();

        flow.back();
        let form = flow.contact_form();
        assert!(flow.submit_contact(form));

        assert_eq!(flow.step(), Step::Confirmation);
        assert_eq!(flow.draft(), &before);
    }

    #[test]
    fn test_end_to_end_record() {
        let mut flow = flow_at_confirmation();
        let (booked_date, record) = flow.begin_submission(String::new()).unwrap();

        assert_eq!(booked_date, date("2024-06-10"));
        assert_eq!(
            record,
            CompletedBooking {
                service: "Sports Massage".to_string(),
                date: "Monday, June 10, 2024".to_string(),
                time: "10:00".to_string(),
                notes: String::new(),
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone: "555-0100".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_submission_rejected() {
        let mut flow = flow_at_confirmation();
        flow.begin_submission("first".to_string()).unwrap();

        assert_eq!(
            flow.begin_submission("second".to_string()),
            Err(SubmitError::InProgress)
        );
        assert!(!flow.actions().can_submit);
        assert!(!flow.back());
        assert_eq!(flow.draft().notes, "first");
    }

    #[test]
    fn test_failed_submission_is_retryable() {
        let mut flow = flow_at_confirmation();
        flow.begin_submission("knee pain".to_string()).unwrap();
        flow.fail_submission("upstream returned 503".to_string());

        assert_eq!(flow.step(), Step::Confirmation);
        assert_eq!(flow.last_error(), Some("upstream returned 503"));
        assert!(flow.actions().can_submit);

        let (_, record) = flow.begin_submission("knee pain".to_string()).unwrap();
        assert_eq!(record.notes, "knee pain");
        assert!(flow.last_error().is_none());
    }

    #[test]
    fn test_submit_outside_confirmation() {
        let mut flow = flow();
        assert_eq!(
            flow.begin_submission(String::new()),
            Err(SubmitError::WrongStep(Step::Calendar))
        );
    }

    #[test]
    fn test_month_navigation() {
        let mut flow = flow();
        assert_eq!(flow.visible_dates().first(), Some(&date("2024-06-10")));

        assert!(flow.navigate_month(1));
        assert_eq!(flow.month_label(), "July 2024");
        assert_eq!(flow.visible_dates().last(), Some(&date("2024-07-09")));

        assert!(flow.navigate_month(1));
        assert!(flow.visible_dates().is_empty());
    }

    #[test]
    fn test_snapshot_actions() {
        let mut flow = flow();
        flow.select_date(date("2024-06-10"), open_slots());
        flow.select_time("10:00");
        flow.continue_to_contact();

        let snap = flow.snapshot(Uuid::nil());
        assert_eq!(snap.step, Step::Contact);
        assert!(!snap.actions.can_submit_contact);
        assert!(snap.actions.can_go_back);
        assert!(snap.summary.is_none());

        flow.submit_contact(jane());
        let snap = flow.snapshot(Uuid::nil());
        assert!(snap.actions.can_submit);
        assert_eq!(snap.formatted_date.as_deref(), Some("Monday, June 10, 2024"));
        assert_eq!(snap.summary.unwrap().name, "Jane Doe");

        // Returning to the contact step pre-fills a form that can be resubmitted
        flow.back();
        assert!(flow.snapshot(Uuid::nil()).actions.can_submit_contact);
    }
}
