//! Display formatting for remaining time

/// Format whole seconds as `MM:SS`; minutes keep growing past 99 instead of wrapping
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(1500), "25:00");
        assert_eq!(format_clock(6001), "100:01");
    }
}
