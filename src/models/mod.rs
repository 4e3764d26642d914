pub mod action;
pub mod availability;
pub mod booking;
pub mod profile;
pub mod service;
pub mod session;

pub use action::{ActionEvent, ActionKind};
pub use availability::{Availability, OpeningHours, TimeSlot};
pub use booking::{BookingDraft, BookingSubmission, CompletedBooking, ContactDetails};
pub use profile::{ActionStep, FocusArea, Insights, Memory, Needs, NextSteps, Priority, ProfileData, UserProfile};
pub use service::{ServiceDescriptor, ServiceMetadata};
pub use session::UserContext;
