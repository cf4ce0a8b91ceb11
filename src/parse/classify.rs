//! Structural classification of raw text files.
//!
//! Files land in an event directory with arbitrary names, so classification
//! works purely off the text's structure, never the file name or extension.

/// The five basic land names, excluded from decklist card counts entirely
pub(crate) const BASIC_LANDS: [&str; 5] = ["Plains", "Island", "Swamp", "Mountain", "Forest"];

/// Maximum non-basic card rows a single drafted deck can hold
const MAX_DECK_ROWS: usize = 45;

/// Stray non-card lines tolerated in a decklist body (footers, labels)
const MAX_JUNK_LINES: usize = 2;

/// Extract the name from a selection-marker line (`--> <name>`), if present.
///
/// Draft logs use this marker twice over: once in the seating header to mark
/// the drafter's own seat, and once per pick block to mark the chosen card.
pub(crate) fn marker_name(line: &str) -> Option<&str> {
    line.split_once("--> ").map(|(_, rest)| rest.trim())
}

/// Extract the card name from a decklist card row (`<count> <name>`).
///
/// Returns `None` unless the line starts with digits followed by whitespace.
pub(crate) fn card_row_name(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    if !rest.starts_with(|c: char| c.is_whitespace()) {
        return None;
    }
    Some(rest.trim())
}

pub(crate) fn is_basic_land(name: &str) -> bool {
    BASIC_LANDS.contains(&name)
}

/// True iff the text is an MTGO draft log export.
///
/// A draft log carries exactly 46 selection-marker lines: one in the seating
/// header plus one per pick (3 packs of 15). The count is exact, not a
/// lower bound.
pub fn is_draft_log(text: &str) -> bool {
    text.lines().filter(|l| marker_name(l).is_some()).count() == 46
}

/// True iff the text is a decklist export.
///
/// The body (everything after the last `=\n` sentinel; any name header before
/// it is ignored here) must hold at most 45 non-basic card rows and at most
/// 2 other non-blank lines. Basic-land rows count toward neither bound.
pub fn is_decklist(text: &str) -> bool {
    let text = text.replace('\r', "");
    let body = match text.rfind("=\n") {
        Some(idx) => &text[idx + 2..],
        None => text.as_str(),
    };

    let mut card_rows = 0;
    let mut junk_lines = 0;
    for line in body.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match card_row_name(line) {
            Some(name) if is_basic_land(name) => {}
            Some(_) => card_rows += 1,
            None => junk_lines += 1,
        }
    }

    card_rows <= MAX_DECK_ROWS && junk_lines <= MAX_JUNK_LINES
}
