/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Generate a reservation number such as `RES-K3XQ7F2A`.
///
/// Layout: `RES-` + last 4 base36 digits of the millisecond clock + 4 random
/// base36 digits. Short enough to type into a bank transfer reference; the
/// database primary key catches the rare collision.
pub fn generate_reservation_id(now_ms: i64) -> String {
    use rand::Rng;

    let time = to_base36(now_ms.max(0) as u64);
    let time_part = &time[time.len().saturating_sub(4)..];
    let mut rng = rand::thread_rng();
    let random_part: String = (0..4)
        .map(|_| BASE36[rng.gen_range(0..36)] as char)
        .collect();
    format!("RES-{time_part:0>4}{random_part}")
}

/// Format cents as German euro amount, e.g. `1.234,50 €`
pub fn format_euro(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let euros = (abs / 100).to_string();
    let rest = abs % 100;

    let mut grouped = String::with_capacity(euros.len() + euros.len() / 3);
    for (i, ch) in euros.chars().enumerate() {
        if i > 0 && (euros.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped},{rest:02} €")
}

/// Millisecond timestamp as RFC 3339 (UTC, millisecond precision)
pub fn millis_to_rfc3339(ms: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Millisecond timestamp as German local date and time, e.g. `19.10.2026, 14:05 Uhr`
pub fn format_date_de(ms: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms)
        .map(|dt| {
            dt.with_timezone(&chrono_tz::Europe::Berlin)
                .format("%d.%m.%Y, %H:%M Uhr")
                .to_string()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_id_format() {
        let id = generate_reservation_id(now_millis());
        assert!(id.starts_with("RES-"));
        assert_eq!(id.len(), 12);
        assert!(
            id[4..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_reservation_id_time_part() {
        // 36^4 - 1 = "ZZZZ"
        let id = generate_reservation_id(1_679_615);
        assert_eq!(&id[4..8], "ZZZZ");
        // Small clocks are left-padded
        let id = generate_reservation_id(35);
        assert_eq!(&id[4..8], "000Z");
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_format_euro() {
        assert_eq!(format_euro(0), "0,00 €");
        assert_eq!(format_euro(5_000), "50,00 €");
        assert_eq!(format_euro(123_450), "1.234,50 €");
        assert_eq!(format_euro(100_000_005), "1.000.000,05 €");
        assert_eq!(format_euro(-250), "-2,50 €");
    }

    #[test]
    fn test_millis_to_rfc3339() {
        assert_eq!(millis_to_rfc3339(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(
            millis_to_rfc3339(1_736_935_200_000),
            "2025-01-15T10:00:00.000Z"
        );
    }

    #[test]
    fn test_format_date_de() {
        // Winter: CET, UTC+1
        assert_eq!(format_date_de(1_736_935_200_000), "15.01.2025, 11:00 Uhr");
        // Summer: CEST, UTC+2; 2025-07-01T22:30:00Z is already the next day
        assert_eq!(format_date_de(1_751_409_000_000), "02.07.2025, 00:30 Uhr");
    }
}
