//! Human-readable age labels.

use chrono::{DateTime, Utc};

fn whole_minutes(stamp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - stamp).num_minutes().max(0)
}

/// Age of an alert, e.g. `Há 5 min` or `Há 2 h 10 min`.
#[must_use]
pub fn alert_age_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = whole_minutes(created_at, now);
    if mins < 60 {
        format!("Há {mins} min")
    } else {
        format!("Há {} h {} min", mins / 60, mins % 60)
    }
}

/// Time since a courier went online, e.g. `Agora mesmo` or `3h atrás`.
#[must_use]
pub fn courier_age_label(last_updated: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match whole_minutes(last_updated, now) {
        0 => "Agora mesmo".to_string(),
        mins @ 1..=59 => format!("{mins} min atrás"),
        mins => format!("{}h atrás", mins / 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_alert_age_label() {
        let now = Utc::now();
        assert_eq!(alert_age_label(now, now), "Há 0 min");
        assert_eq!(alert_age_label(now - Duration::seconds(119), now), "Há 1 min");
        assert_eq!(alert_age_label(now - Duration::minutes(59), now), "Há 59 min");
        assert_eq!(alert_age_label(now - Duration::minutes(60), now), "Há 1 h 0 min");
        assert_eq!(alert_age_label(now - Duration::minutes(130), now), "Há 2 h 10 min");
    }

    #[test]
    fn test_courier_age_label() {
        let now = Utc::now();
        assert_eq!(courier_age_label(now - Duration::seconds(30), now), "Agora mesmo");
        assert_eq!(courier_age_label(now - Duration::minutes(5), now), "5 min atrás");
        assert_eq!(courier_age_label(now - Duration::minutes(185), now), "3h atrás");
    }

    #[test]
    fn test_future_stamps_clamp_to_zero() {
        let now = Utc::now();
        let later = now + Duration::minutes(10);
        assert_eq!(alert_age_label(later, now), "Há 0 min");
        assert_eq!(courier_age_label(later, now), "Agora mesmo");
    }
}
