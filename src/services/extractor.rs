//! Song-list extraction from free-text LLM replies.
//!
//! The bard answers in unpredictable prose, so extraction is a prioritized
//! list of matcher strategies tried in order; the first one that yields any
//! accepted candidate wins and later patterns are never combined with it.
//! Rejection is deliberately conservative: fewer wrong songs beats catching
//! every possible one.

use crate::models::SongEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Hard cap on extracted entries, however long the reply.
pub const MAX_SONGS: usize = 50;

/// Ordered matcher strategies, most specific format first.
static MATCHERS: Lazy<[(&'static str, Regex); 3]> = Lazy::new(|| {
    [
        // "Artist - Song", optionally numbered
        ("dash", Regex::new(r"(?:\d+\.\s*)?([^-\n]+)\s*-\s*([^\n]+)").unwrap()),
        // "**Artist - Song**" markdown bold
        ("bold", Regex::new(r"\*\*([^-\n]+)\s*-\s*([^\n]+)\*\*").unwrap()),
        // "Artist: Song", optionally numbered
        ("colon", Regex::new(r"(?:\d+\.\s*)?([^:\n]+):\s*([^\n]+)").unwrap()),
    ]
});

static ORDINAL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\s*").unwrap());

/// Label prefixes that mark a metadata line rather than a song.
static METADATA_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(Playlist|Track|Song|Music|Genre|Style|Theme|Mood|Energy|Tempo|BPM|Duration|Time|Minutes|Hours|Seconds)",
    )
    .unwrap()
});

static NUMERIC_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9\s\-\.]+$").unwrap());

/// Sentence-shaped lines ("The algorithm is...") are prose, not titles.
static PROSE_SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:The|A|An)\s+[a-z]{2,}\s+(?:is|are|will|can|should|would|could|might|may)\b")
        .unwrap()
});

/// Extracts an ordered, deduplicated, capped list of `"Artist - Title"`
/// strings from a raw bard reply. Never fails; unparseable text yields an
/// empty list.
pub fn extract_songs(text: &str) -> Vec<String> {
    for (_name, pattern) in MATCHERS.iter() {
        let accepted = collect_candidates(pattern, text);
        if !accepted.is_empty() {
            return dedup_and_cap(accepted);
        }
    }
    Vec::new()
}

fn collect_candidates(pattern: &Regex, text: &str) -> Vec<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let entry = clean_candidate(caps.get(1)?.as_str(), caps.get(2)?.as_str());
            let rendered = entry.render();
            (is_acceptable(&entry, &rendered)).then_some(rendered)
        })
        .collect()
}

/// Strips the leading ordinal and the bold markers the match may have
/// swallowed into its capture groups.
fn clean_candidate(artist_raw: &str, title_raw: &str) -> SongEntry {
    let mut artist = artist_raw.trim();
    artist = match ORDINAL_PREFIX.find(artist) {
        Some(m) => &artist[m.end()..],
        None => artist,
    };
    if let Some(stripped) = artist.strip_prefix("**") {
        artist = stripped;
    }

    let mut title = title_raw.trim();
    if let Some(stripped) = title.strip_suffix("**") {
        title = stripped;
    }

    SongEntry::new(artist, title)
}

fn is_acceptable(entry: &SongEntry, rendered: &str) -> bool {
    !entry.artist.is_empty()
        && !entry.title.is_empty()
        && rendered.len() > 3
        && !METADATA_PREFIX.is_match(rendered)
        && !NUMERIC_ONLY.is_match(rendered)
        && !PROSE_SENTENCE.is_match(rendered)
}

fn dedup_and_cap(songs: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    songs
        .into_iter()
        .filter(|song| seen.insert(song.clone()))
        .take(MAX_SONGS)
        .collect()
}
