pub const PERIOD_SECS: u32 = 1200;
pub const REGULATION_PERIODS: u32 = 3;
pub const REGULATION_SECS: u32 = PERIOD_SECS * REGULATION_PERIODS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    Regulation,
    Overtime,
    Shootout,
}

impl PeriodKind {
    pub fn classify(period: u32, label: Option<&str>) -> Self {
        // The feed's label wins over the period number.
        if let Some(label) = label {
            let l = label.trim().to_ascii_lowercase();
            if l.starts_with("shoot") || l == "so" {
                return PeriodKind::Shootout;
            }
            if l.starts_with("over") || l == "ot" {
                return PeriodKind::Overtime;
            }
            if l.starts_with("reg") {
                return PeriodKind::Regulation;
            }
        }
        if period <= REGULATION_PERIODS {
            PeriodKind::Regulation
        } else {
            PeriodKind::Overtime
        }
    }
}

/// Period-relative offset to cumulative seconds; overtime continues past 3600.
pub fn cumulative_seconds(period: u32, offset_sec: u32) -> Option<u32> {
    let elapsed = period.checked_sub(1)?.checked_mul(PERIOD_SECS)?;
    elapsed.checked_add(offset_sec)
}

/// Parses "754" or "12:34" into seconds.
pub fn parse_clock(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.split_once(':') {
        Some((mins, secs)) => {
            let mins = mins.trim().parse::<u32>().ok()?;
            let secs = secs.trim().parse::<u32>().ok()?;
            if secs >= 60 {
                return None;
            }
            mins.checked_mul(60)?.checked_add(secs)
        }
        None => trimmed.parse::<u32>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_seconds_across_periods() {
        assert_eq!(cumulative_seconds(1, 30), Some(30));
        assert_eq!(cumulative_seconds(3, 1199), Some(3599));
        assert_eq!(cumulative_seconds(4, 15), Some(3615));
        assert_eq!(cumulative_seconds(5, 0), Some(4800));
        assert_eq!(cumulative_seconds(0, 10), None);
    }

    #[test]
    fn parse_clock_forms() {
        assert_eq!(parse_clock("754"), Some(754));
        assert_eq!(parse_clock("12:34"), Some(754));
        assert_eq!(parse_clock(" 0:05 "), Some(5));
        assert_eq!(parse_clock("12:75"), None);
        assert_eq!(parse_clock("abc"), None);
        assert_eq!(parse_clock(""), None);
    }

    #[test]
    fn classify_prefers_label() {
        assert_eq!(PeriodKind::classify(5, Some("SHOOTOUT")), PeriodKind::Shootout);
        assert_eq!(PeriodKind::classify(4, Some("OVERTIME")), PeriodKind::Overtime);
        assert_eq!(PeriodKind::classify(4, None), PeriodKind::Overtime);
        assert_eq!(PeriodKind::classify(2, None), PeriodKind::Regulation);
    }
}
