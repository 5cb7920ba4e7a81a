use chrono::{Datelike, NaiveDate, Weekday};

/// One stored archive, keyed `YEAR/MONTH/DAY/<name>_<date>_<time>.zip`.
///
/// A snapshot of the object store at retention-evaluation time; never cached
/// across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub key: String,
    pub date: Option<NaiveDate>,
}

impl ArchiveEntry {
    /// Parse the `YEAR/MONTH/DAY` prefix of an object key. Keys without a
    /// parseable date prefix get `date: None` and are never selected for
    /// deletion.
    pub fn parse(key: impl Into<String>) -> Self {
        let key = key.into();
        let date = parse_key_date(&key);

        if date.is_none() {
            tracing::warn!("archive key {} has no parseable date prefix, keeping it", key);
        }

        Self { key, date }
    }
}

fn parse_key_date(key: &str) -> Option<NaiveDate> {
    let mut segments = key.splitn(4, '/');
    let year = segments.next()?.parse().ok()?;
    let month = segments.next()?.parse().ok()?;
    let day = segments.next()?.parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Tiered retention, evaluated per entry against its embedded date:
///
/// - age <= 7 days: keep
/// - age <= 28 days: keep only Mondays
/// - age <= 365 days: keep only the 1st of the month
/// - older: delete
///
/// Undated entries are always kept.
pub fn should_delete(entry: &ArchiveEntry, today: NaiveDate) -> bool {
    let Some(date) = entry.date else {
        return false;
    };

    let age_days = (today - date).num_days();

    if age_days <= 7 {
        false
    } else if age_days <= 28 && date.weekday() == Weekday::Mon {
        false
    } else if age_days <= 365 && date.day() == 1 {
        false
    } else {
        true
    }
}

/// Entries eligible for deletion. Pure and order-independent; deleting one
/// entry never affects the decision for another.
pub fn select_for_deletion(entries: &[ArchiveEntry], today: NaiveDate) -> Vec<&ArchiveEntry> {
    entries
        .iter()
        .filter(|entry| should_delete(entry, today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> ArchiveEntry {
        ArchiveEntry::parse(key)
    }

    // 2024-11-20 is a Wednesday
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 20).unwrap()
    }

    #[test]
    fn test_kept_within_daily_window() {
        // exactly 7 days old
        assert!(!should_delete(&entry("2024/11/13/api_2024-11-13_02-00-00.zip"), today()));
        assert!(!should_delete(&entry("2024/11/20/api_2024-11-20_02-00-00.zip"), today()));
    }

    #[test]
    fn test_deleted_past_daily_window_unless_monday() {
        // 8 days old, a Tuesday
        assert!(should_delete(&entry("2024/11/12/api.zip"), today()));
        // 16 days old, a Monday
        assert!(!should_delete(&entry("2024/11/04/api.zip"), today()));
    }

    #[test]
    fn test_monthly_window_keeps_first_of_month() {
        // 29 days old, the 1st (2024-01-30 as reference)
        let reference = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        assert!(!should_delete(&entry("2024/01/01/api.zip"), reference));

        // 50 days old, not the 1st
        assert!(should_delete(&entry("2024/10/01/api.zip"), today()));
        assert!(should_delete(&entry("2024/10/15/api.zip"), today()));
    }

    #[test]
    fn test_deleted_past_a_year_unconditionally() {
        // ~400 days old
        assert!(should_delete(&entry("2023/10/17/api.zip"), today()));
        // even a 1st-of-month archive
        assert!(should_delete(&entry("2023/01/01/api.zip"), today()));
        // even a Monday (2023-10-16)
        assert!(should_delete(&entry("2023/10/16/api.zip"), today()));
    }

    #[test]
    fn test_unparseable_keys_are_kept() {
        assert!(!should_delete(&entry("stray-file.zip"), today()));
        assert!(!should_delete(&entry("not/a/date/file.zip"), today()));
        assert!(!should_delete(&entry("2024/13/40/file.zip"), today()));
    }

    #[test]
    fn test_selection_is_order_independent() {
        let mut entries = vec![
            entry("2024/11/13/a.zip"),
            entry("2024/11/12/b.zip"),
            entry("2024/11/04/c.zip"),
            entry("2023/10/17/d.zip"),
            entry("garbage.zip"),
        ];

        let forward: Vec<String> = select_for_deletion(&entries, today())
            .iter()
            .map(|e| e.key.clone())
            .collect();

        entries.reverse();
        let mut reversed: Vec<String> = select_for_deletion(&entries, today())
            .iter()
            .map(|e| e.key.clone())
            .collect();
        reversed.reverse();

        assert_eq!(forward, reversed);
        assert_eq!(forward, vec!["2024/11/12/b.zip", "2023/10/17/d.zip"]);
    }
}
