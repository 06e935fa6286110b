//! Plain-text rendering of events for the terminal.

use arrangement_engine::{
    CurrentUser, EventWithParticipants, PersistedEvent, TemporalNormalizer,
};

pub const NOT_FOUND_MESSAGE: &str = "Fant ikke arrangementet";

/// One line per event: title, time span, location.
pub fn event_line(event: &PersistedEvent, normalizer: &TemporalNormalizer) -> String {
    format!(
        "{}  {}  ({}) [{}]",
        event.title,
        normalizer.format_range(event.start_time, event.end_time),
        event.location,
        event.id
    )
}

pub fn signed_in_line(user: &CurrentUser) -> String {
    format!("Innlogget som {} <{}>", user.name, user.email)
}

/// Detail page text. With a `viewer`, also says whether they are signed up.
pub fn event_details(
    found: &EventWithParticipants,
    normalizer: &TemporalNormalizer,
    viewer: Option<&CurrentUser>,
) -> String {
    let event = &found.event;
    let mut lines = vec![
        event.title.clone(),
        format!(
            "Tid: {}",
            normalizer.format_range(event.start_time, event.end_time)
        ),
        format!(
            "Tidssone: {} (UTC{})",
            normalizer.timezone().name(),
            normalizer.utc_offset(event.start_time)
        ),
        format!(
            "Varighet: {}",
            normalizer.format_duration(event.start_time, event.end_time)
        ),
        format!("Sted: {}", event.location),
    ];
    if let Some(deadline) = normalizer.format_deadline(event.signup_deadline) {
        lines.push(format!("Påmeldingsfrist: {deadline}"));
    }
    if let Some(limit) = event.participant_limit.filter(|_| event.has_participant_limit()) {
        lines.push(format!("Plasser: {}/{}", found.participants.len(), limit));
    }
    if !found.categories.is_empty() {
        let names: Vec<&str> = found.categories.iter().map(|c| c.name.as_str()).collect();
        lines.push(format!("Kategorier: {}", names.join(", ")));
    }
    if let Some(viewer) = viewer {
        let joined = found.participants.iter().any(|p| p.email == viewer.email);
        lines.push(signed_in_line(viewer));
        lines.push(if joined { "Du er påmeldt" } else { "Du er ikke påmeldt" }.to_string());
    }
    lines.push(String::new());
    lines.push(event.description.clone());
    lines.push(String::new());
    lines.push(format!("Påmeldte ({}):", found.participants.len()));
    lines.extend(
        found
            .participants
            .iter()
            .map(|p| format!("  - {} <{}>", p.full_name(), p.email)),
    );

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
