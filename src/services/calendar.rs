use chrono::{Datelike, Duration, Months, NaiveDate, NaiveTime, Weekday};

use crate::models::{Availability, TimeSlot};

#[derive(Debug, Clone)]
pub struct CalendarSettings {
    /// Number of days, starting today, offered for booking.
    pub window_days: u32,
    pub excluded_weekday: Option<Weekday>,
    pub day_start: NaiveTime,
    /// Exclusive: no slot starts at or after this time.
    pub day_end: NaiveTime,
    pub slot_minutes: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            window_days: 30,
            excluded_weekday: Some(Weekday::Sun),
            day_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            day_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            slot_minutes: 30,
        }
    }
}

/// Dates from `today` through the end of the booking window, in order,
/// minus the excluded weekday.
pub fn bookable_dates(today: NaiveDate, settings: &CalendarSettings) -> Vec<NaiveDate> {
    today
        .iter_days()
        .take(settings.window_days as usize)
        .filter(|d| Some(d.weekday()) != settings.excluded_weekday)
        .collect()
}

/// Slot start times across the daily window.
pub fn slot_times(settings: &CalendarSettings) -> Vec<NaiveTime> {
    let mut times = Vec::new();
    if settings.slot_minutes == 0 {
        return times;
    }

    let step = Duration::minutes(i64::from(settings.slot_minutes));
    let mut current = settings.day_start;
    while current < settings.day_end {
        times.push(current);
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        current = next;
    }
    times
}

/// Builds the time grid for `date`. A slot is open when it fits the business
/// hours (if any are configured) and nobody has booked it yet.
pub fn time_slots(
    date: NaiveDate,
    settings: &CalendarSettings,
    business_hours: Option<&Availability>,
    booked: &[String],
) -> Vec<TimeSlot> {
    slot_times(settings)
        .into_iter()
        .map(|start| {
            let time = format_slot_time(start);
            let within_hours = business_hours
                .filter(|hours| !hours.is_empty())
                .map_or(true, |hours| hours.covers(date, start, settings.slot_minutes));
            let available = within_hours && !booked.iter().any(|b| *b == time);
            TimeSlot { time, available }
        })
        .collect()
}

pub fn format_slot_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Long form used on the confirmation screen and in the outgoing record,
/// e.g. "Monday, June 10, 2024".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

pub fn month_label(month: NaiveDate) -> String {
    month.format("%B %Y").to_string()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn shift_month(month: NaiveDate, offset: i32) -> Option<NaiveDate> {
    let start = first_of_month(month);
    let months = Months::new(offset.unsigned_abs());
    if offset >= 0 {
        start.checked_add_months(months)
    } else {
        start.checked_sub_months(months)
    }
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}
