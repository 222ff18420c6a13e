//! Plain-text tables for the CLI.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use roombook_client::SlotView;
use roombook_core::models::{
    booking::{Booking, BookingDetail},
    room::Room,
    user::{UserAccount, UserInfo},
};

/// Renders rows under a header, each column padded to its widest cell.
pub fn table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut lines = vec![render(&header), render(&rule)];
    lines.extend(rows.iter().map(|row| render(row)));
    lines.join("\n")
}

pub fn local_time(time: DateTime<Utc>, tz: Tz) -> String {
    time.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
}

pub fn rooms(rooms: &[Room]) -> String {
    let rows: Vec<_> = rooms
        .iter()
        .map(|r| vec![r.id.to_string(), r.name.clone(), r.capacity.to_string()])
        .collect();
    table(&["ID", "NAME", "CAPACITY"], &rows)
}

pub fn slots(views: &[SlotView]) -> String {
    let rows: Vec<_> = views
        .iter()
        .map(|v| {
            let status = match (v.booked, v.selected) {
                (true, _) => "booked",
                (false, true) => "selected",
                (false, false) => "free",
            };
            vec![v.slot.label.clone(), status.to_string()]
        })
        .collect();
    table(&["SLOT", "STATUS"], &rows)
}

pub fn bookings(bookings: &[Booking], tz: Tz, now: DateTime<Utc>) -> String {
    let rows: Vec<_> = bookings
        .iter()
        .map(|b| {
            let status = if b.is_cancellable(now) { "upcoming" } else { "started" };
            vec![
                b.id.to_string(),
                b.room_id.to_string(),
                local_time(b.start_time, tz),
                local_time(b.end_time, tz),
                status.to_string(),
            ]
        })
        .collect();
    table(&["ID", "ROOM", "START", "END", "STATUS"], &rows)
}

pub fn booking_details(bookings: &[BookingDetail], tz: Tz) -> String {
    let rows: Vec<_> = bookings
        .iter()
        .map(|b| {
            vec![
                b.id.to_string(),
                b.room_name.clone(),
                b.username.clone(),
                local_time(b.start_time, tz),
                local_time(b.end_time, tz),
            ]
        })
        .collect();
    table(&["ID", "ROOM", "USER", "START", "END"], &rows)
}

pub fn users(users: &[UserAccount]) -> String {
    let rows: Vec<_> = users
        .iter()
        .map(|u| {
            vec![
                u.id.to_string(),
                u.username.clone(),
                u.nickname.clone(),
                u.role.to_string(),
            ]
        })
        .collect();
    table(&["ID", "USERNAME", "NICKNAME", "ROLE"], &rows)
}

pub fn user(user: &UserInfo) -> String {
    let mut lines = vec![
        format!("{} ({})", user.display_name(), user.username),
        format!("id: {}", user.user_id),
        format!("role: {}", user.role),
    ];
    if let Some(settings) = &user.system_settings {
        lines.push(format!(
            "password changes allowed: {}",
            settings.allow_user_change_password
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_pads_columns() {
        let rows = vec![
            vec!["1".to_string(), "Aurora".to_string(), "8".to_string()],
            vec!["12".to_string(), "Boardroom".to_string(), "20".to_string()],
        ];

        let rendered = table(&["ID", "NAME", "CAPACITY"], &rows);

        assert_eq!(
            rendered,
            "ID  NAME       CAPACITY\n\
             --  ---------  --------\n\
             1   Aurora     8\n\
             12  Boardroom  20"
        );
    }

    #[test]
    fn test_local_time_uses_zone() {
        let time = "2026-03-02T01:00:00Z".parse().unwrap();

        assert_eq!(local_time(time, Tz::Asia__Shanghai), "2026-03-02 09:00");
    }
}
