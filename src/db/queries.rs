use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::models::{BookingSubmission, CompletedBooking};

// ── Bookings ──

pub fn insert_booking(conn: &Connection, submission: &BookingSubmission) -> anyhow::Result<()> {
    let record = &submission.record;
    conn.execute(
        "INSERT INTO bookings (id, service, date, time, display_date, name, email, phone, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            submission.booking_id.to_string(),
            record.service,
            submission.date.format("%Y-%m-%d").to_string(),
            record.time,
            record.date,
            record.name,
            record.email,
            record.phone,
            record.notes,
        ],
    )?;
    Ok(())
}

/// Slot labels ("HH:MM") already taken on `date`.
pub fn get_booked_times(conn: &Connection, date: NaiveDate) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT time FROM bookings WHERE date = ?1 ORDER BY time ASC")?;
    let rows = stmt.query_map(params![date.format("%Y-%m-%d").to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut times = vec![];
    for row in rows {
        times.push(row?);
    }
    Ok(times)
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<CompletedBooking>> {
    let result = conn.query_row(
        "SELECT service, display_date, time, notes, name, email, phone FROM bookings WHERE id = ?1",
        params![id],
        |row| {
            Ok(CompletedBooking {
                service: row.get(0)?,
                date: row.get(1)?,
                time: row.get(2)?,
                notes: row.get(3)?,
                name: row.get(4)?,
                email: row.get(5)?,
                phone: row.get(6)?,
            })
        },
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use uuid::Uuid;

    fn submission(date: &str, time: &str) -> BookingSubmission {
        BookingSubmission {
            booking_id: Uuid::new_v4(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            record: CompletedBooking {
                service: "Sports Massage".to_string(),
                date: "Monday, June 10, 2024".to_string(),
                time: time.to_string(),
                notes: String::new(),
                name: "Jane Doe".to_string(),
                email: "jane@example.com".to_string(),
                phone: "555-0100".to_string(),
            },
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let conn = db::init_db(":memory:").unwrap();
        let sub = submission("2024-06-10", "10:00");
        insert_booking(&conn, &sub).unwrap();

        let stored = get_booking_by_id(&conn, &sub.booking_id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(stored, sub.record);
        assert!(get_booking_by_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_booked_times_per_day() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, &submission("2024-06-10", "14:00")).unwrap();
        insert_booking(&conn, &submission("2024-06-10", "09:30")).unwrap();
        insert_booking(&conn, &submission("2024-06-11", "10:00")).unwrap();

        let day = NaiveDate::parse_from_str("2024-06-10", "%Y-%m-%d").unwrap();
        assert_eq!(get_booked_times(&conn, day).unwrap(), vec!["09:30", "14:00"]);
    }

    #[test]
    fn test_double_booking_rejected() {
        let conn = db::init_db(":memory:").unwrap();
        insert_booking(&conn, &submission("2024-06-10", "10:00")).unwrap();
        assert!(insert_booking(&conn, &submission("2024-06-10", "10:00")).is_err());
    }
}
