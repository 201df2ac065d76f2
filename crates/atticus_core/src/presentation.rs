//! crates/atticus_core/src/presentation.rs
//!
//! Rules the list screens apply to fetched data: empty states, chapter
//! position input, relative timestamps and word-count tiers.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};

//=========================================================================================
// Listings
//=========================================================================================

/// A fetched collection as a list screen sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<T> {
    Empty,
    Populated(Vec<T>),
}

impl<T> From<Vec<T>> for Listing<T> {
    fn from(items: Vec<T>) -> Self {
        if items.is_empty() {
            Listing::Empty
        } else {
            Listing::Populated(items)
        }
    }
}

impl<T> Listing<T> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Listing::Empty)
    }

    pub fn items(&self) -> &[T] {
        match self {
            Listing::Empty => &[],
            Listing::Populated(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }
}

//=========================================================================================
// Chapter Reordering
//=========================================================================================

/// What a chapter-number entry asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reorder {
    /// Same position; nothing to send.
    Unchanged,
    /// Move to this 0-based order.
    MoveTo(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Please enter a number between 1 and {chapter_count}")]
pub struct InvalidPosition {
    pub chapter_count: usize,
}

/// Parses a 1-based chapter number typed by the user.
pub fn parse_chapter_position(
    input: &str,
    current_order: i64,
    chapter_count: usize,
) -> Result<Reorder, InvalidPosition> {
    let invalid = InvalidPosition { chapter_count };
    let position: i64 = input.trim().parse().map_err(|_| invalid.clone())?;
    if position < 1 || position > chapter_count as i64 {
        return Err(invalid);
    }
    let order = position - 1;
    if order == current_order {
        Ok(Reorder::Unchanged)
    } else {
        Ok(Reorder::MoveTo(order))
    }
}

//=========================================================================================
// Relative Time
//=========================================================================================

/// Parses the backend's timestamps: RFC 3339, or naive ISO 8601 read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn plural(n: i64, unit: &str) -> String {
    if n > 1 {
        format!("{} {}s ago", n, unit)
    } else {
        format!("{} {} ago", n, unit)
    }
}

/// Human-friendly age of an `updated_at` value relative to `now`.
pub fn relative_time(updated_at: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = updated_at.filter(|s| !s.trim().is_empty()) else {
        return "Never".to_string();
    };
    let Some(date) = parse_timestamp(raw.trim()) else {
        return "Recently".to_string();
    };

    let secs = (now - date).num_seconds();
    let mins = secs / 60;
    let hours = mins / 60;
    let days = hours / 24;

    if secs < 60 {
        "Just now".to_string()
    } else if mins < 60 {
        plural(mins, "min")
    } else if hours < 24 {
        plural(hours, "hour")
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{} days ago", days)
    } else if days < 30 {
        plural(days / 7, "week")
    } else if date.year() != now.year() {
        date.format("%b %-d, %Y").to_string()
    } else {
        date.format("%b %-d").to_string()
    }
}

//=========================================================================================
// Word Count Tiers
//=========================================================================================

/// Progress bands used to colour a chapter's word count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCountTier {
    Empty,
    Starting,
    Developing,
    Substantial,
    Complete,
}

impl WordCountTier {
    pub fn for_count(words: u64) -> Self {
        match words {
            0 => WordCountTier::Empty,
            1..=499 => WordCountTier::Starting,
            500..=1499 => WordCountTier::Developing,
            1500..=2999 => WordCountTier::Substantial,
            _ => WordCountTier::Complete,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WordCountTier::Empty => "empty",
            WordCountTier::Starting => "starting",
            WordCountTier::Developing => "developing",
            WordCountTier::Substantial => "substantial",
            WordCountTier::Complete => "complete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn empty_collections_render_the_empty_state() {
        let listing: Listing<u8> = Vec::new().into();
        assert!(listing.is_empty());
        assert_eq!(listing.len(), 0);

        let listing: Listing<u8> = vec![1, 2].into();
        assert_eq!(listing, Listing::Populated(vec![1, 2]));
        assert_eq!(listing.items(), &[1, 2]);
    }

    #[test]
    fn chapter_position_is_one_based_and_bounded() {
        assert_eq!(parse_chapter_position("2", 0, 3), Ok(Reorder::MoveTo(1)));
        assert_eq!(parse_chapter_position(" 1 ", 0, 3), Ok(Reorder::Unchanged));
        assert_eq!(
            parse_chapter_position("4", 0, 3),
            Err(InvalidPosition { chapter_count: 3 })
        );
        assert!(parse_chapter_position("0", 0, 3).is_err());
        assert!(parse_chapter_position("two", 0, 3).is_err());
    }

    #[test]
    fn relative_time_buckets() {
        let now = now();
        assert_eq!(relative_time(None, now), "Never");
        assert_eq!(relative_time(Some("not a date"), now), "Recently");
        assert_eq!(relative_time(Some("2025-08-30T11:59:30Z"), now), "Just now");
        assert_eq!(relative_time(Some("2025-08-30T11:59:00Z"), now), "1 min ago");
        assert_eq!(relative_time(Some("2025-08-30T11:15:00+00:00"), now), "45 mins ago");
        assert_eq!(relative_time(Some("2025-08-30T09:00:00Z"), now), "3 hours ago");
        assert_eq!(relative_time(Some("2025-08-29T10:00:00Z"), now), "Yesterday");
        assert_eq!(relative_time(Some("2025-08-26T12:00:00Z"), now), "4 days ago");
        assert_eq!(relative_time(Some("2025-08-16T12:00:00Z"), now), "2 weeks ago");
        assert_eq!(relative_time(Some("2025-03-05T12:00:00Z"), now), "Mar 5");
        assert_eq!(relative_time(Some("2023-03-05T12:00:00Z"), now), "Mar 5, 2023");
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        assert_eq!(
            relative_time(Some("2025-08-30T09:59:59.500000"), now()),
            "2 hours ago"
        );
    }

    #[test]
    fn word_count_tiers() {
        assert_eq!(WordCountTier::for_count(0), WordCountTier::Empty);
        assert_eq!(WordCountTier::for_count(499), WordCountTier::Starting);
        assert_eq!(WordCountTier::for_count(500), WordCountTier::Developing);
        assert_eq!(WordCountTier::for_count(2999), WordCountTier::Substantial);
        assert_eq!(WordCountTier::for_count(3000), WordCountTier::Complete);
    }
}
