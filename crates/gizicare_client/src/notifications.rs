//! Local bookkeeping for the notification list.

use crate::{Notification, NotificationList};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Notifications fetched per request.
pub const DEFAULT_LIMIT: u32 = 20;

impl NotificationList {
    /// Apply a confirmed mark-read locally. Returns false if the id is
    /// unknown or already read.
    pub fn mark_read(&mut self, id: &str) -> bool {
        let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        if n.is_read {
            return false;
        }
        n.is_read = true;
        self.unread_count = self.unread_count.saturating_sub(1);
        true
    }

    pub fn unread_ids(&self) -> Vec<String> {
        self.notifications
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id.clone())
            .collect()
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|ndt| ndt.and_utc())
}

/// Relative age of a timestamp: `Just now`, `5 min ago`, `3 hr ago`,
/// `1 day ago`, `4 days ago`. Unparseable input yields `None`.
pub fn time_ago(created_at: &str, now: DateTime<Utc>) -> Option<String> {
    let then = parse_timestamp(created_at)?;
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        return Some("Just now".to_string());
    }
    if minutes < 60 {
        return Some(format!("{minutes} min ago"));
    }
    let hours = minutes / 60;
    if hours < 24 {
        return Some(format!("{hours} hr ago"));
    }
    let days = hours / 24;
    let plural = if days > 1 { "s" } else { "" };
    Some(format!("{days} day{plural} ago"))
}

pub fn notification_age(n: &Notification, now: DateTime<Utc>) -> String {
    n.created_at
        .as_deref()
        .and_then(|ts| time_ago(ts, now))
        .unwrap_or_default()
}

/// Meal window open at `hour` (local, 0-23), if any.
pub fn meal_reminder(hour: u32) -> Option<&'static str> {
    const WINDOWS: [(&str, u32, u32); 3] = [
        ("Sarapan", 6, 9),
        ("Makan Siang", 12, 14),
        ("Makan Malam", 17, 19),
    ];
    WINDOWS
        .iter()
        .find(|(_, start, end)| (*start..=*end).contains(&hour))
        .map(|(name, _, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    fn note(id: &str, read: bool) -> Notification {
        Notification {
            id: id.into(),
            kind: "meal_reminder".into(),
            title: "Waktunya makan".into(),
            message: String::new(),
            is_read: read,
            created_at: Some("2025-06-10T11:00:00Z".into()),
            data: None,
        }
    }

    #[test]
    fn time_ago_buckets() {
        assert_eq!(time_ago("2025-06-10T11:59:30Z", now()).unwrap(), "Just now");
        assert_eq!(time_ago("2025-06-10T11:55:00Z", now()).unwrap(), "5 min ago");
        assert_eq!(time_ago("2025-06-10 09:00:00", now()).unwrap(), "3 hr ago");
        assert_eq!(time_ago("2025-06-09T12:00:00Z", now()).unwrap(), "1 day ago");
        assert_eq!(
            time_ago("2025-06-06T10:00:00.000000Z", now()).unwrap(),
            "4 days ago"
        );
        assert!(time_ago("yesterday", now()).is_none());
    }

    #[test]
    fn mark_read_never_goes_negative() {
        let mut list = NotificationList {
            notifications: vec![note("1", false), note("2", true)],
            unread_count: 0,
        };
        assert!(list.mark_read("1"));
        assert_eq!(list.unread_count, 0);
        assert!(!list.mark_read("1"));
        assert!(!list.mark_read("404"));
        assert!(list.notifications[0].is_read);
    }

    #[test]
    fn unread_ids_and_age() {
        let list = NotificationList {
            notifications: vec![note("a", false), note("b", true), note("c", false)],
            unread_count: 2,
        };
        assert_eq!(list.unread_ids(), ["a", "c"]);
        assert_eq!(notification_age(&list.notifications[0], now()), "1 hr ago");
    }

    #[test]
    fn meal_windows() {
        assert_eq!(meal_reminder(7), Some("Sarapan"));
        assert_eq!(meal_reminder(14), Some("Makan Siang"));
        assert_eq!(meal_reminder(15), None);
        assert_eq!(meal_reminder(19), Some("Makan Malam"));
    }
}
