//! Timezone-aware normalization between the organization's wall clock and
//! absolute instants, plus Norwegian (Bokmål) display formatting.
//!
//! Form fields carry naive local dates and times; the backend stores UTC
//! instants. The UTC offset is looked up per instant in the tz database, so
//! the same wall-clock time maps to `+01:00` in winter and `+02:00` in
//! summer for `Europe/Oslo`. Nothing here caches an offset.
//!
//! # Functions
//!
//! - [`TemporalNormalizer::to_absolute`]: local wall-clock time → UTC instant
//! - [`TemporalNormalizer::to_local_display`]: UTC instant → local wall-clock time
//! - [`TemporalNormalizer::format_range`]: `"20. desember 2024, 18:00 - 23:00"`
//! - [`TemporalNormalizer::format_deadline`]: single instant, or `None`
//! - [`TemporalNormalizer::format_duration`]: `"2 timer, 30 minutter"`
//! - [`parse_instant`]: RFC 3339 string → UTC instant

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDateTime, Offset, TimeZone,
    Timelike, Utc,
};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{Result, TemporalError};

/// IANA name of the organization's timezone.
pub const DEFAULT_TIMEZONE: &str = "Europe/Oslo";

const MONTHS_NB: [&str; 12] = [
    "januar",
    "februar",
    "mars",
    "april",
    "mai",
    "juni",
    "juli",
    "august",
    "september",
    "oktober",
    "november",
    "desember",
];

// ── TemporalNormalizer ──────────────────────────────────────────────────────

/// Converts between one fixed named timezone and UTC, and renders instants
/// the way the event pages show them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalNormalizer {
    tz: Tz,
}

impl Default for TemporalNormalizer {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::Oslo)
    }
}

impl TemporalNormalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build a normalizer from an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns [`TemporalError::InvalidTimezone`] if the name is not in the tz database.
    pub fn from_name(name: &str) -> Result<Self> {
        parse_timezone(name).map(Self::new)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Convert a local wall-clock time to the instant it denotes.
    ///
    /// During the autumn overlap the earlier of the two instants is chosen.
    /// A time inside the spring-forward gap does not exist; it is shifted
    /// forward by the length of the gap.
    ///
    /// # Examples
    ///
    /// ```
    /// use arrangement_engine::temporal::TemporalNormalizer;
    /// use chrono::NaiveDate;
    ///
    /// let oslo = TemporalNormalizer::default();
    /// let local = NaiveDate::from_ymd_opt(2024, 12, 20)
    ///     .unwrap()
    ///     .and_hms_opt(18, 0, 0)
    ///     .unwrap();
    /// // December is CET (UTC+1)
    /// assert_eq!(oslo.to_absolute(local).to_rfc3339(), "2024-12-20T17:00:00+00:00");
    /// ```
    pub fn to_absolute(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&local).earliest() {
            Some(dt) => dt.with_timezone(&Utc),
            None => {
                // Offset in force a day earlier is the pre-transition one.
                let before = self
                    .tz
                    .offset_from_utc_datetime(&(local - Duration::days(1)))
                    .fix();
                Utc.from_utc_datetime(&(local - Duration::seconds(before.local_minus_utc() as i64)))
            }
        }
    }

    /// Convert an instant to the local wall-clock time shown in forms.
    pub fn to_local_display(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.tz).naive_local()
    }

    /// The UTC offset in force at `instant`.
    pub fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        instant.with_timezone(&self.tz).offset().fix()
    }

    /// The UTC offset at `instant` as text (e.g., `"+02:00"`).
    pub fn utc_offset(&self, instant: DateTime<Utc>) -> String {
        format_utc_offset(&instant.with_timezone(&self.tz))
    }

    /// Whether two instants fall on the same local calendar day.
    pub fn is_same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.to_local_display(a).date() == self.to_local_display(b).date()
    }

    /// Format a single instant as `"d. MMMM yyyy, HH:mm"` in Bokmål.
    pub fn format_instant(&self, instant: DateTime<Utc>) -> String {
        let local = self.to_local_display(instant);
        format!(
            "{}. {} {}, {:02}:{:02}",
            local.day(),
            MONTHS_NB[local.month0() as usize],
            local.year(),
            local.hour(),
            local.minute()
        )
    }

    /// Format an event's time span. The end is reduced to `HH:mm` when both
    /// ends fall on the same local day.
    ///
    /// # Examples
    ///
    /// ```
    /// use arrangement_engine::temporal::{parse_instant, TemporalNormalizer};
    ///
    /// let oslo = TemporalNormalizer::default();
    /// let start = parse_instant("2024-12-20T17:00:00Z").unwrap();
    /// let end = parse_instant("2024-12-20T22:00:00Z").unwrap();
    /// assert_eq!(oslo.format_range(start, end), "20. desember 2024, 18:00 - 23:00");
    /// ```
    pub fn format_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        if self.is_same_day(start, end) {
            let end_local = self.to_local_display(end);
            format!(
                "{} - {:02}:{:02}",
                self.format_instant(start),
                end_local.hour(),
                end_local.minute()
            )
        } else {
            format!("{} - {}", self.format_instant(start), self.format_instant(end))
        }
    }

    pub fn format_deadline(&self, deadline: Option<DateTime<Utc>>) -> Option<String> {
        deadline.map(|d| self.format_instant(d))
    }

    /// Human-readable Bokmål duration between two instants (e.g., `"2 timer, 30 minutter"`).
    pub fn format_duration(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        self.duration_between(start, end).human_readable
    }

    /// Decompose the span between two instants into calendar units.
    ///
    /// Years and months are counted on the local calendar; the remainder is
    /// measured in elapsed time. If `end` is before `start` the absolute span
    /// is decomposed.
    pub fn duration_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DurationParts {
        let (from, to) = if end < start { (end, start) } else { (start, end) };
        let from_local = self.to_local_display(from);
        let to_local = self.to_local_display(to);

        let mut months = (to_local.year() - from_local.year()) * 12
            + (to_local.month() as i32 - from_local.month() as i32);
        let mut anchor = from;
        let mut anchor_local = from_local;
        while months > 0 {
            match from_local.checked_add_months(Months::new(months as u32)) {
                Some(shifted) if self.to_absolute(shifted) <= to => {
                    anchor = self.to_absolute(shifted);
                    anchor_local = shifted;
                    break;
                }
                _ => months -= 1,
            }
        }
        let months = months.max(0) as i64;

        // Whole local days, so a day across a DST change is still one day.
        let mut days = (to_local.date() - anchor_local.date()).num_days();
        while days > 0 {
            match anchor_local.checked_add_days(Days::new(days as u64)) {
                Some(shifted) if self.to_absolute(shifted) <= to => {
                    anchor = self.to_absolute(shifted);
                    break;
                }
                _ => days -= 1,
            }
        }
        let days = days.max(0);

        let remainder = (to - anchor).num_seconds().max(0);
        let hours = remainder / 3600;
        let minutes = (remainder % 3600) / 60;
        let seconds = remainder % 60;

        let mut parts = DurationParts {
            years: months / 12,
            months: months % 12,
            days,
            hours,
            minutes,
            seconds,
            human_readable: String::new(),
        };
        parts.human_readable = format_human_duration(&parts);
        parts
    }
}

// ── DurationParts ───────────────────────────────────────────────────────────

/// A span decomposed into calendar units, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationParts {
    pub years: i64,
    pub months: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    /// Non-zero units joined with `", "`; empty for a zero span.
    pub human_readable: String,
}

// ── Parsing ─────────────────────────────────────────────────────────────────

/// Parse an RFC 3339 datetime string into `DateTime<Utc>`.
///
/// # Errors
///
/// Returns [`TemporalError::InvalidDatetime`] if the string is not RFC 3339.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TemporalError::InvalidDatetime(format!("'{}': {}", s, e)))
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// Parse an IANA timezone string into `Tz`.
fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| TemporalError::InvalidTimezone(format!("'{}'", s)))
}

/// Format the UTC offset as a string (e.g., "+01:00", "-05:00").
fn format_utc_offset<T: TimeZone>(dt: &DateTime<T>) -> String {
    let offset_secs = dt.offset().fix().local_minus_utc();
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}

fn format_human_duration(d: &DurationParts) -> String {
    let units = [
        (d.years, "år", "år"),
        (d.months, "måned", "måneder"),
        (d.days, "dag", "dager"),
        (d.hours, "time", "timer"),
        (d.minutes, "minutt", "minutter"),
        (d.seconds, "sekund", "sekunder"),
    ];
    units
        .iter()
        .filter(|(n, _, _)| *n > 0)
        .map(|(n, one, many)| format!("{} {}", n, if *n == 1 { one } else { many }))
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        parse_instant(s).unwrap()
    }

    // ── to_absolute / to_local_display ──────────────────────────────────

    #[test]
    fn test_winter_offset_is_cet() {
        let oslo = TemporalNormalizer::default();
        let instant = oslo.to_absolute(local(2024, 12, 20, 18, 0));
        assert_eq!(instant, utc("2024-12-20T17:00:00Z"));
        assert_eq!(oslo.utc_offset(instant), "+01:00");
    }

    #[test]
    fn test_summer_offset_is_cest() {
        let oslo = TemporalNormalizer::default();
        let instant = oslo.to_absolute(local(2024, 6, 15, 12, 0));
        assert_eq!(instant, utc("2024-06-15T10:00:00Z"));
        assert_eq!(oslo.utc_offset(instant), "+02:00");
    }

    #[test]
    fn test_offset_recomputed_across_spring_transition() {
        // Oslo springs forward on 2024-03-31 at 02:00 local
        let oslo = TemporalNormalizer::default();
        let before = oslo.to_absolute(local(2024, 3, 30, 12, 0));
        let after = oslo.to_absolute(local(2024, 4, 1, 12, 0));
        assert_eq!(oslo.offset_at(before).local_minus_utc(), 3600);
        assert_eq!(oslo.offset_at(after).local_minus_utc(), 7200);
    }

    #[test]
    fn test_round_trip_either_side_of_dst() {
        let oslo = TemporalNormalizer::default();
        for x in [
            local(2024, 3, 30, 23, 59),
            local(2024, 3, 31, 3, 0),
            local(2024, 10, 26, 18, 0),
            local(2024, 10, 27, 4, 0),
        ] {
            assert_eq!(oslo.to_local_display(oslo.to_absolute(x)), x, "{x}");
        }
    }

    #[test]
    fn test_autumn_overlap_picks_earlier_instant() {
        // 02:30 occurs twice on 2024-10-27; first as CEST
        let oslo = TemporalNormalizer::default();
        let instant = oslo.to_absolute(local(2024, 10, 27, 2, 30));
        assert_eq!(instant, utc("2024-10-27T00:30:00Z"));
    }

    #[test]
    fn test_spring_gap_shifts_forward() {
        // 02:30 does not exist on 2024-03-31
        let oslo = TemporalNormalizer::default();
        let instant = oslo.to_absolute(local(2024, 3, 31, 2, 30));
        assert_eq!(instant, utc("2024-03-31T01:30:00Z"));
        assert_eq!(oslo.to_local_display(instant), local(2024, 3, 31, 3, 30));
    }

    #[test]
    fn test_other_zone_is_configurable() {
        let tokyo = TemporalNormalizer::from_name("Asia/Tokyo").unwrap();
        let instant = tokyo.to_absolute(local(2024, 12, 20, 18, 0));
        assert_eq!(instant, utc("2024-12-20T09:00:00Z"));
    }

    #[test]
    fn test_invalid_timezone_returns_error() {
        let err = TemporalNormalizer::from_name("Invalid/Zone").unwrap_err();
        assert!(err.to_string().contains("Invalid timezone"), "got: {err}");
    }

    #[test]
    fn test_invalid_datetime_returns_error() {
        let err = parse_instant("20.12.2024 18:00").unwrap_err();
        assert!(err.to_string().contains("Invalid datetime"), "got: {err}");
    }

    // ── formatting ──────────────────────────────────────────────────────

    #[test]
    fn test_format_instant_uses_norwegian_months() {
        let oslo = TemporalNormalizer::default();
        assert_eq!(
            oslo.format_instant(utc("2024-12-20T17:00:00Z")),
            "20. desember 2024, 18:00"
        );
        assert_eq!(
            oslo.format_instant(utc("2024-05-01T06:05:00Z")),
            "1. mai 2024, 08:05"
        );
    }

    #[test]
    fn test_format_range_same_day() {
        let oslo = TemporalNormalizer::default();
        let range = oslo.format_range(utc("2024-12-20T17:00:00Z"), utc("2024-12-20T22:00:00Z"));
        assert_eq!(range, "20. desember 2024, 18:00 - 23:00");
    }

    #[test]
    fn test_format_range_uses_local_day_not_utc_day() {
        // 23:30Z is already the next day in Oslo
        let oslo = TemporalNormalizer::default();
        let range = oslo.format_range(utc("2024-12-20T17:00:00Z"), utc("2024-12-20T23:30:00Z"));
        assert_eq!(
            range,
            "20. desember 2024, 18:00 - 21. desember 2024, 00:30"
        );
    }

    #[test]
    fn test_format_deadline() {
        let oslo = TemporalNormalizer::default();
        assert_eq!(oslo.format_deadline(None), None);
        assert_eq!(
            oslo.format_deadline(Some(utc("2024-12-18T11:00:00Z"))).as_deref(),
            Some("18. desember 2024, 12:00")
        );
    }

    // ── duration ────────────────────────────────────────────────────────

    #[test]
    fn test_duration_hours_and_minutes() {
        let oslo = TemporalNormalizer::default();
        let d = oslo.format_duration(utc("2024-12-20T17:00:00Z"), utc("2024-12-20T19:30:00Z"));
        assert_eq!(d, "2 timer, 30 minutter");
    }

    #[test]
    fn test_duration_singular_units() {
        let oslo = TemporalNormalizer::default();
        let d = oslo.format_duration(utc("2024-12-20T17:00:00Z"), utc("2024-12-21T18:01:01Z"));
        assert_eq!(d, "1 dag, 1 time, 1 minutt, 1 sekund");
    }

    #[test]
    fn test_duration_counts_calendar_months_and_years() {
        let oslo = TemporalNormalizer::default();
        let start = oslo.to_absolute(local(2024, 1, 15, 10, 0));
        let end = oslo.to_absolute(local(2024, 3, 15, 12, 0));
        assert_eq!(oslo.format_duration(start, end), "2 måneder, 2 timer");

        let start = oslo.to_absolute(local(2023, 12, 20, 18, 0));
        let end = oslo.to_absolute(local(2024, 12, 21, 18, 0));
        let parts = oslo.duration_between(start, end);
        assert_eq!((parts.years, parts.months, parts.days), (1, 0, 1));
        assert_eq!(parts.human_readable, "1 år, 1 dag");
    }

    #[test]
    fn test_duration_short_month_does_not_overcount() {
        let oslo = TemporalNormalizer::default();
        let start = oslo.to_absolute(local(2024, 1, 31, 12, 0));
        let end = oslo.to_absolute(local(2024, 2, 1, 12, 0));
        assert_eq!(oslo.format_duration(start, end), "1 dag");
    }

    #[test]
    fn test_duration_counts_local_days_across_spring_forward() {
        let oslo = TemporalNormalizer::default();
        let start = oslo.to_absolute(local(2024, 3, 30, 12, 0));
        let end = oslo.to_absolute(local(2024, 3, 31, 12, 0));
        assert_eq!((end - start).num_hours(), 23);
        assert_eq!(oslo.format_duration(start, end), "1 dag");
    }

    #[test]
    fn test_duration_counts_local_days_across_fall_back() {
        let oslo = TemporalNormalizer::default();
        let start = oslo.to_absolute(local(2024, 10, 26, 12, 0));
        let end = oslo.to_absolute(local(2024, 10, 27, 12, 0));
        assert_eq!((end - start).num_hours(), 25);
        assert_eq!(oslo.format_duration(start, end), "1 dag");
    }

    #[test]
    fn test_duration_partial_day_across_spring_forward_is_elapsed_time() {
        let oslo = TemporalNormalizer::default();
        let start = oslo.to_absolute(local(2024, 3, 30, 22, 0));
        let end = oslo.to_absolute(local(2024, 3, 31, 12, 0));
        let parts = oslo.duration_between(start, end);
        assert_eq!((parts.days, parts.hours), (0, 13));
    }

    #[test]
    fn test_duration_zero_is_empty() {
        let oslo = TemporalNormalizer::default();
        let t = utc("2024-12-20T17:00:00Z");
        assert_eq!(oslo.format_duration(t, t), "");
    }

    #[test]
    fn test_duration_reversed_uses_absolute_span() {
        let oslo = TemporalNormalizer::default();
        let d = oslo.format_duration(utc("2024-12-20T19:30:00Z"), utc("2024-12-20T17:00:00Z"));
        assert_eq!(d, "2 timer, 30 minutter");
    }
}
