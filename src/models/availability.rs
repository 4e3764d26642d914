use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// One bookable slot on a selected day, as shown in the time grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: String,
    pub available: bool,
}

/// A weekly opening window, e.g. `{"day":"mon","start":"09:00","end":"17:00"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningHours {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// Weekly business hours. An empty list places no restriction on slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Availability {
    pub slots: Vec<OpeningHours>,
}

impl Availability {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let availability: Availability = serde_json::from_str(s)?;
        for slot in &availability.slots {
            parse_weekday(&slot.day)?;
            parse_time(&slot.start)?;
            parse_time(&slot.end)?;
        }
        Ok(availability)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True if an appointment of `duration_minutes` starting at `start` on
    /// `date` fits entirely inside one opening window.
    pub fn covers(&self, date: NaiveDate, start: NaiveTime, duration_minutes: u32) -> bool {
        let (end, wrapped) =
            start.overflowing_add_signed(Duration::minutes(i64::from(duration_minutes)));
        if wrapped != 0 {
            return false;
        }

        self.slots.iter().any(|slot| {
            let (Ok(day), Ok(open), Ok(close)) = (
                parse_weekday(&slot.day),
                parse_time(&slot.start),
                parse_time(&slot.end),
            ) else {
                return false;
            };
            day == date.weekday() && start >= open && end <= close
        })
    }

    pub fn to_human_readable(&self) -> String {
        if self.slots.is_empty() {
            return String::new();
        }

        let mut sorted_slots = self.slots.clone();
        sorted_slots.sort_by_key(|s| {
            parse_weekday(&s.day)
                .map(|d| d.num_days_from_monday())
                .unwrap_or(7)
        });

        sorted_slots
            .iter()
            .map(|s| {
                let day = capitalize(&s.day);
                format!("{day}: {}-{}", s.start, s.end)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + &c.as_str().to_lowercase(),
    }
}

pub fn parse_weekday(s: &str) -> anyhow::Result<Weekday> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| anyhow::anyhow!("invalid weekday: {s}"))
}

pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        parse_time(s).unwrap()
    }

    fn weekdays() -> Availability {
        Availability::from_json(
            r#"{"slots":[{"day":"mon","start":"09:00","end":"17:00"},{"day":"sat","start":"10:00","end":"13:00"}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(Availability::from_json("not json").is_err());
    }

    #[test]
    fn test_parse_invalid_day() {
        let json = r#"{"slots":[{"day":"xyz","start":"09:00","end":"17:00"}]}"#;
        assert!(Availability::from_json(json).is_err());
    }

    #[test]
    fn test_parse_invalid_time() {
        let json = r#"{"slots":[{"day":"mon","start":"25:00","end":"17:00"}]}"#;
        assert!(Availability::from_json(json).is_err());
    }

    #[test]
    fn test_covers_within_hours() {
        let avail = weekdays();
        // 2024-06-10 is a Monday
        assert!(avail.covers(date("2024-06-10"), time("09:00"), 30));
        assert!(avail.covers(date("2024-06-10"), time("16:30"), 30));
    }

    #[test]
    fn test_covers_rejects_overrun_and_wrong_day() {
        let avail = weekdays();
        assert!(!avail.covers(date("2024-06-10"), time("16:45"), 30));
        assert!(!avail.covers(date("2024-06-10"), time("08:30"), 30));
        // 2024-06-11 is a Tuesday
        assert!(!avail.covers(date("2024-06-11"), time("10:00"), 30));
        // 2024-06-15 is a Saturday
        assert!(avail.covers(date("2024-06-15"), time("12:30"), 30));
        assert!(!avail.covers(date("2024-06-15"), time("13:00"), 30));
    }

    #[test]
    fn test_to_human_readable() {
        let json = r#"{"slots":[{"day":"fri","start":"10:00","end":"16:00"},{"day":"mon","start":"09:00","end":"17:00"}]}"#;
        let avail = Availability::from_json(json).unwrap();
        assert_eq!(avail.to_human_readable(), "Mon: 09:00-17:00, Fri: 10:00-16:00");
        assert_eq!(Availability::default().to_human_readable(), "");
    }
}
