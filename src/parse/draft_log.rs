//! Draft log parsing
//!
//! An MTGO draft log is 46 blank-line-delimited segments: a seating header
//! (8 players, the drafter's own seat marked with `-->`) followed by one
//! segment per pick, 3 packs of 15. The parser is pure: text in, value out.

use super::classify::marker_name;
use crate::error::{LeagueError, Result};

/// Picks in a full draft: 3 packs of 15
pub const PICKS_PER_DRAFT: usize = 45;
const PICKS_PER_PACK: u32 = 15;
/// Players in a draft pod
pub const POD_SIZE: usize = 8;
const SEGMENT_COUNT: usize = 46;

/// One drafted pick in sequence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPick {
    /// 1..=45, strictly increasing
    pub pick_id: u32,
    /// 1..=3
    pub pack_num: u32,
    /// 1..=15 within the pack
    pub pick_num: u32,
    pub card_name: String,
    /// Newline-joined names of the other cards visible in the pack at this
    /// pick, order-preserving; empty when the pack held only the pick
    pub other_card_names: String,
}

/// A fully parsed draft log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLog {
    /// 1..=8, from the marker's position in the seating header
    pub seat_num: u32,
    /// The drafter's self-reported account name
    pub player_tag: String,
    /// Exactly 45 picks
    pub picks: Vec<ParsedPick>,
}

/// Header lines are player tags unless they are decoration: blank lines,
/// labels carrying a `:`, or separators with no alphabetic content.
fn is_player_line(line: &str) -> bool {
    !line.trim().is_empty() && !line.contains(':') && line.chars().any(|c| c.is_alphabetic())
}

/// Some exports carry an `Event #: <name>@<tag>` header line; when present,
/// the name half is preferred over the seating-marker capture. A bare
/// numeric event id (no `@`) never overrides.
fn event_header_name(header: &str) -> Option<String> {
    for line in header.lines() {
        let rest = match line.trim().strip_prefix("Event #:") {
            Some(rest) => rest,
            None => continue,
        };
        if let Some((name, _tag)) = rest.split_once('@') {
            let name = name.trim();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Parse a draft log into seat, player tag, and 45 ordered picks.
///
/// Returns `MalformedLog` on any structural violation: segment count other
/// than 46, header player count other than 8, or a pick segment without a
/// selection marker.
pub fn parse_log(text: &str) -> Result<ParsedLog> {
    let text = text.replace('\r', "");

    let blocks: Vec<&str> = text
        .split("\n\n")
        .filter(|block| block.lines().any(|l| marker_name(l).is_some()))
        .collect();
    if blocks.len() != SEGMENT_COUNT {
        return Err(LeagueError::MalformedLog(format!(
            "expected {} marked segments, found {}",
            SEGMENT_COUNT,
            blocks.len()
        )));
    }

    let header = blocks[0];
    let player_lines: Vec<&str> = header.lines().filter(|l| is_player_line(l)).collect();
    if player_lines.len() != POD_SIZE {
        return Err(LeagueError::MalformedLog(format!(
            "expected {} player lines in header, found {}",
            POD_SIZE,
            player_lines.len()
        )));
    }

    let seat_idx = player_lines
        .iter()
        .position(|l| marker_name(l).is_some())
        .ok_or_else(|| {
            LeagueError::MalformedLog("no seat marker among header player lines".to_string())
        })?;
    let marker_tag = marker_name(player_lines[seat_idx])
        .unwrap_or_default()
        .to_string();
    let player_tag = event_header_name(header).unwrap_or(marker_tag);

    let mut picks = Vec::with_capacity(PICKS_PER_DRAFT);
    for (idx, block) in blocks[1..].iter().enumerate() {
        // First line is the "Pack N pick M:" banner
        let mut lines = block.lines();
        lines.next();

        let mut card_name: Option<String> = None;
        let mut others: Vec<&str> = Vec::new();
        for line in lines {
            match marker_name(line) {
                Some(name) if card_name.is_none() => card_name = Some(name.to_string()),
                // A stray extra marker still names a card in the pack; keep
                // the name, never the marker prefix
                Some(name) => {
                    if !name.is_empty() {
                        others.push(name);
                    }
                }
                None => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        others.push(trimmed);
                    }
                }
            }
        }
        let card_name = card_name.ok_or_else(|| {
            LeagueError::MalformedLog(format!("pick segment {} has no selection marker", idx + 1))
        })?;

        let idx = idx as u32;
        picks.push(ParsedPick {
            pick_id: idx + 1,
            pack_num: idx / PICKS_PER_PACK + 1,
            pick_num: idx % PICKS_PER_PACK + 1,
            card_name,
            other_card_names: others.join("\n"),
        });
    }

    Ok(ParsedLog {
        seat_num: (seat_idx + 1) as u32,
        player_tag,
        picks,
    })
}
