//! Display formatting helpers.

/// Format a duration in seconds as `MmSSs` or `Ns`.
#[must_use]
pub fn format_duration_secs(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let minutes = total / 60;
    let seconds = total % 60;
    if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

/// Format a credit amount with its unit.
#[must_use]
pub fn format_credits(credits: u64) -> String {
    if credits == 1 {
        "1 credit".to_string()
    } else {
        format!("{credits} credits")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_format_with_minutes() {
        assert_eq!(format_duration_secs(25.0), "25s");
        assert_eq!(format_duration_secs(83.4), "1m23s");
        assert_eq!(format_duration_secs(-5.0), "0s");
    }

    #[test]
    fn credits_pluralize() {
        assert_eq!(format_credits(1), "1 credit");
        assert_eq!(format_credits(83), "83 credits");
    }
}
