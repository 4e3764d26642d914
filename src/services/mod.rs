pub mod actions;
pub mod booking_flow;
pub mod calendar;
pub mod flows;
pub mod insights;
pub mod profile_provider;
pub mod profile_views;
pub mod schedule;
pub mod submission;

#[cfg(test)]
pub(crate) mod test_server;
