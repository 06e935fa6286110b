//! Validation of user-entered event drafts.
//!
//! [`validate`] runs every rule against the draft and reports all failing
//! fields at once, so a form can show each error next to its field. The
//! rules are an ordered list of predicate/message pairs: per-field rules
//! first, then cross-field rules. When two rules fail on the same field the
//! earlier message is kept.
//!
//! Error messages are Norwegian and are part of the contract.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{EventPayload, PersistedEvent};
use crate::temporal::TemporalNormalizer;

pub mod messages {
    pub const TITLE_REQUIRED: &str = "Du må fylle inn en tittel";
    pub const LOCATION_REQUIRED: &str = "Du må fylle inn et sted";
    pub const DESCRIPTION_REQUIRED: &str = "Du må fylle inn en beskrivelse";
    pub const START_DATE_REQUIRED: &str = "Du må velge en startdato";
    pub const END_DATE_REQUIRED: &str = "Du må velge en sluttdato";
    pub const INVALID_TIME: &str = "Verdien må være et gyldig tidspunkt";
    pub const END_DATE_BEFORE_START: &str = "Sluttdato må være etter startdato";
    pub const END_TIME_NOT_AFTER_START: &str = "Slutttid må være etter starttid";
    pub const DEADLINE_AFTER_START_DATE: &str = "Påmeldingsfrist kan ikke være etter startdato";
    pub const DEADLINE_AFTER_START_TIME: &str = "Tidspunktet kan ikke være etter starttiden";
    pub const PARTICIPANT_LIMIT_RANGE: &str = "Må være mellom 1 og 9999";
}

use messages::*;

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("time pattern is valid"));

const TIME_FORMAT: &str = "%H:%M";

/// Largest accepted participant limit.
pub const MAX_PARTICIPANT_LIMIT: u16 = 9999;

// ── Field ───────────────────────────────────────────────────────────────────

/// A validated form field; keys of [`ValidationErrors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Location,
    Description,
    StartDate,
    StartTime,
    EndDate,
    EndTime,
    ParticipantLimit,
    SignupDeadlineDate,
    SignupDeadlineTime,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Location => "location",
            Field::Description => "description",
            Field::StartDate => "startDate",
            Field::StartTime => "startTime",
            Field::EndDate => "endDate",
            Field::EndTime => "endTime",
            Field::ParticipantLimit => "participantLimit",
            Field::SignupDeadlineDate => "signupDeadlineDate",
            Field::SignupDeadlineTime => "signupDeadlineTime",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ValidationErrors ────────────────────────────────────────────────────────

/// Every failing field with its message. Serializes as a plain
/// `{"field": "message"}` object.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[error("event failed validation on {} field(s)", .errors.len())]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, &'static str>,
}

impl ValidationErrors {
    fn single(field: Field, message: &'static str) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }

    /// Keep the first message recorded for a field.
    fn insert(&mut self, field: Field, message: &'static str) {
        self.errors.entry(field).or_insert(message);
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn fields(&self) -> Vec<Field> {
        self.errors.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.errors.iter().map(|(f, m)| (*f, *m))
    }
}

// ── EventDraft ──────────────────────────────────────────────────────────────

/// Unvalidated form input for creating or editing an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDraft {
    pub title: String,
    pub location: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    /// `HH:mm`
    pub start_time: String,
    pub end_date: Option<NaiveDate>,
    /// `HH:mm`
    pub end_time: String,
    #[serde(alias = "public")]
    pub is_public: bool,
    pub has_participant_limit: bool,
    pub participant_limit: Option<String>,
    pub has_signup_deadline: bool,
    pub signup_deadline_date: Option<NaiveDate>,
    /// `HH:mm`, or empty.
    pub signup_deadline_time: String,
}

impl EventDraft {
    /// Pre-populate a draft from a stored event for editing.
    pub fn from_persisted(event: &PersistedEvent, normalizer: &TemporalNormalizer) -> Self {
        let start = normalizer.to_local_display(event.start_time);
        let end = normalizer.to_local_display(event.end_time);
        let deadline = event
            .signup_deadline
            .map(|d| normalizer.to_local_display(d));

        Self {
            title: event.title.clone(),
            location: event.location.clone(),
            description: event.description.clone(),
            start_date: Some(start.date()),
            start_time: start.format(TIME_FORMAT).to_string(),
            end_date: Some(end.date()),
            end_time: end.format(TIME_FORMAT).to_string(),
            is_public: event.public,
            has_participant_limit: event.has_participant_limit(),
            participant_limit: event
                .participant_limit
                .filter(|n| *n > 0)
                .map(|n| n.to_string()),
            has_signup_deadline: deadline.is_some(),
            signup_deadline_date: deadline.map(|d| d.date()),
            signup_deadline_time: deadline
                .map(|d| d.format(TIME_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    /// Flip the participant-limit checkbox. Switching it off discards a
    /// limit that would not validate.
    pub fn toggle_participant_limit(&mut self) {
        if self.has_participant_limit
            && self
                .participant_limit
                .as_deref()
                .and_then(parse_participant_limit)
                .is_none()
        {
            self.participant_limit = None;
        }
        self.has_participant_limit = !self.has_participant_limit;
    }

    pub fn toggle_signup_deadline(&mut self) {
        self.has_signup_deadline = !self.has_signup_deadline;
    }
}

// ── ValidatedEvent ──────────────────────────────────────────────────────────

/// Participant cap of a validated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "limit", rename_all = "camelCase")]
pub enum ParticipantPolicy {
    Unlimited,
    LimitedTo(u16),
}

impl ParticipantPolicy {
    pub fn limit(&self) -> Option<u32> {
        match self {
            ParticipantPolicy::Unlimited => None,
            ParticipantPolicy::LimitedTo(n) => Some(u32::from(*n)),
        }
    }
}

/// An [`EventDraft`] that passed every rule. Only [`validate`] builds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedEvent {
    title: String,
    location: String,
    description: String,
    start: NaiveDateTime,
    end: NaiveDateTime,
    is_public: bool,
    participants: ParticipantPolicy,
    signup_deadline: Option<NaiveDateTime>,
}

impl ValidatedEvent {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Local wall-clock start.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Local wall-clock end; never before [`start`](Self::start).
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn participants(&self) -> ParticipantPolicy {
        self.participants
    }

    /// Local wall-clock signup deadline; never after the start date.
    pub fn signup_deadline(&self) -> Option<NaiveDateTime> {
        self.signup_deadline
    }

    /// The request body for the backend, with local times made absolute.
    pub fn to_payload(&self, normalizer: &TemporalNormalizer) -> EventPayload {
        EventPayload {
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            start_time: normalizer.to_absolute(self.start),
            end_time: normalizer.to_absolute(self.end),
            public: self.is_public,
            participant_limit: self.participants.limit(),
            signup_deadline: self.signup_deadline.map(|d| normalizer.to_absolute(d)),
        }
    }
}

// ── Rules ───────────────────────────────────────────────────────────────────

struct Rule {
    field: Field,
    message: &'static str,
    holds: fn(&EventDraft) -> bool,
}

const fn rule(field: Field, message: &'static str, holds: fn(&EventDraft) -> bool) -> Rule {
    Rule {
        field,
        message,
        holds,
    }
}

/// Evaluated in order. A cross-field rule whose inputs are missing or
/// malformed holds vacuously; the per-field rule reports the input.
static RULES: [Rule; 13] = [
    rule(Field::Title, TITLE_REQUIRED, |d| !d.title.is_empty()),
    rule(Field::Location, LOCATION_REQUIRED, |d| !d.location.is_empty()),
    rule(Field::Description, DESCRIPTION_REQUIRED, |d| {
        !d.description.is_empty()
    }),
    rule(Field::StartDate, START_DATE_REQUIRED, |d| d.start_date.is_some()),
    rule(Field::StartTime, INVALID_TIME, |d| is_clock_time(&d.start_time)),
    rule(Field::EndDate, END_DATE_REQUIRED, |d| d.end_date.is_some()),
    rule(Field::EndTime, INVALID_TIME, |d| is_clock_time(&d.end_time)),
    rule(Field::SignupDeadlineTime, INVALID_TIME, |d| {
        d.signup_deadline_time.is_empty() || is_clock_time(&d.signup_deadline_time)
    }),
    rule(Field::EndDate, END_DATE_BEFORE_START, end_date_not_before_start),
    rule(Field::EndTime, END_TIME_NOT_AFTER_START, end_time_after_start_on_same_day),
    rule(Field::SignupDeadlineDate, DEADLINE_AFTER_START_DATE, deadline_date_not_after_start),
    rule(Field::SignupDeadlineTime, DEADLINE_AFTER_START_TIME, deadline_time_not_after_start),
    rule(Field::ParticipantLimit, PARTICIPANT_LIMIT_RANGE, participant_limit_in_range),
];

fn end_date_not_before_start(d: &EventDraft) -> bool {
    match (d.start_date, d.end_date) {
        (Some(start), Some(end)) => end >= start,
        _ => true,
    }
}

/// Zero-padded `HH:mm` strings order the same as the times they denote, so
/// the comparison is on the text once both are known to be well-formed.
fn end_time_after_start_on_same_day(d: &EventDraft) -> bool {
    match (d.start_date, d.end_date) {
        (Some(start), Some(end))
            if start == end && is_clock_time(&d.start_time) && is_clock_time(&d.end_time) =>
        {
            d.end_time > d.start_time
        }
        _ => true,
    }
}

fn deadline_date_not_after_start(d: &EventDraft) -> bool {
    if !d.has_signup_deadline {
        return true;
    }
    match (d.signup_deadline_date, d.start_date) {
        (None, _) => false,
        (Some(deadline), Some(start)) => deadline <= start,
        (Some(_), None) => true,
    }
}

fn deadline_time_not_after_start(d: &EventDraft) -> bool {
    if !d.has_signup_deadline {
        return true;
    }
    match (d.signup_deadline_date, d.start_date) {
        (Some(deadline), Some(start))
            if deadline == start
                && is_clock_time(&d.start_time)
                && (d.signup_deadline_time.is_empty()
                    || is_clock_time(&d.signup_deadline_time)) =>
        {
            d.signup_deadline_time <= d.start_time
        }
        _ => true,
    }
}

fn participant_limit_in_range(d: &EventDraft) -> bool {
    !d.has_participant_limit
        || d
            .participant_limit
            .as_deref()
            .and_then(parse_participant_limit)
            .is_some()
}

/// `HH:mm` that also names a real time of day (`24:00` does not).
fn is_clock_time(s: &str) -> bool {
    TIME_PATTERN.is_match(s) && parse_clock_time(s).is_some()
}

fn parse_clock_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).ok()
}

/// A limit in `1..=9999` written as plain decimal digits, or `None`.
///
/// Signs, surrounding whitespace and leading zeros are rejected.
pub fn parse_participant_limit(s: &str) -> Option<u16> {
    if s.starts_with('0') || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u16>()
        .ok()
        .filter(|n| (1..=MAX_PARTICIPANT_LIMIT).contains(n))
}

// ── validate ────────────────────────────────────────────────────────────────

/// Validate a draft, reporting every failing field.
///
/// Pure: the same draft always yields the same result.
///
/// # Examples
///
/// ```
/// use arrangement_engine::validation::{validate, EventDraft, Field};
///
/// let errors = validate(&EventDraft::default()).unwrap_err();
/// assert_eq!(errors.get(Field::Title), Some("Du må fylle inn en tittel"));
/// assert!(errors.contains(Field::StartDate));
/// ```
pub fn validate(draft: &EventDraft) -> Result<ValidatedEvent, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    for rule in &RULES {
        if !(rule.holds)(draft) {
            errors.insert(rule.field, rule.message);
        }
    }

    if !errors.is_empty() {
        debug!(fields = ?errors.fields(), "event draft rejected");
        return Err(errors);
    }

    let event = assemble(draft)?;
    debug!(title = %event.title, start = %event.start, "event draft accepted");
    Ok(event)
}

/// Build the typed event from a draft that passed every rule.
fn assemble(draft: &EventDraft) -> Result<ValidatedEvent, ValidationErrors> {
    let start_date = draft
        .start_date
        .ok_or_else(|| ValidationErrors::single(Field::StartDate, START_DATE_REQUIRED))?;
    let end_date = draft
        .end_date
        .ok_or_else(|| ValidationErrors::single(Field::EndDate, END_DATE_REQUIRED))?;
    let start_time = parse_clock_time(&draft.start_time)
        .ok_or_else(|| ValidationErrors::single(Field::StartTime, INVALID_TIME))?;
    let end_time = parse_clock_time(&draft.end_time)
        .ok_or_else(|| ValidationErrors::single(Field::EndTime, INVALID_TIME))?;

    let participants = if draft.has_participant_limit {
        draft
            .participant_limit
            .as_deref()
            .and_then(parse_participant_limit)
            .map(ParticipantPolicy::LimitedTo)
            .ok_or_else(|| {
                ValidationErrors::single(Field::ParticipantLimit, PARTICIPANT_LIMIT_RANGE)
            })?
    } else {
        ParticipantPolicy::Unlimited
    };

    let signup_deadline = if draft.has_signup_deadline {
        let date = draft.signup_deadline_date.ok_or_else(|| {
            ValidationErrors::single(Field::SignupDeadlineDate, DEADLINE_AFTER_START_DATE)
        })?;
        // An empty time means the deadline is the start of that day.
        let deadline = if draft.signup_deadline_time.is_empty() {
            date.and_hms_opt(0, 0, 0)
        } else {
            parse_clock_time(&draft.signup_deadline_time).map(|t| date.and_time(t))
        };
        Some(deadline.ok_or_else(|| {
            ValidationErrors::single(Field::SignupDeadlineTime, INVALID_TIME)
        })?)
    } else {
        None
    };

    Ok(ValidatedEvent {
        title: draft.title.clone(),
        location: draft.location.clone(),
        description: draft.description.clone(),
        start: start_date.and_time(start_time),
        end: end_date.and_time(end_time),
        is_public: draft.is_public,
        participants,
        signup_deadline,
    })
}
