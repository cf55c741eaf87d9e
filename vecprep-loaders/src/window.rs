use async_trait::async_trait;

use crate::engine::ChunkEngine;
use crate::params::{ChunkBy, ChunkLimits, Normalize, SplitBoundary, SplitterParams};
use crate::IngestionError;

/// Boundary rules tried in order by [`SplitBoundary::Recursively`].
const RECURSIVE_ORDER: [Rule; 4] = [Rule::Blankline, Rule::Newline, Rule::Sentence, Rule::Space];

/// In-process chunking engine.
///
/// Packs as many units (words or chars) as fit under `max`, ending each
/// chunk on the last allowed boundary inside the window and falling back to
/// a hard cut when there is none. The next chunk restarts `overlap` units
/// before the previous end. Chunks are trimmed and whitespace-only chunks
/// are dropped.
#[derive(Clone, Debug, Default)]
pub struct WindowChunkEngine {
    limits: ChunkLimits,
}

impl WindowChunkEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ChunkLimits) -> Self {
        Self { limits }
    }

    pub fn split(&self, text: &str, params: &SplitterParams) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let normalized = normalize(text, params.normalize);
        let units = unit_offsets(&normalized, params.by);
        let rules = rules_for(&params.split);
        let max = params.max.max(1) as usize;
        let overlap = params.overlap as usize;

        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < units.len() {
            let window_end = usize::min(start + max, units.len());
            let end = if window_end == units.len() {
                window_end
            } else {
                last_boundary(&normalized, &units, &rules, start, window_end)
                    .unwrap_or(window_end)
            };

            let slice = &normalized[units[start]..offset_at(&normalized, &units, end)];
            let trimmed = slice.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if end == units.len() {
                break;
            }
            let restart = end.saturating_sub(overlap);
            start = if restart > start { restart } else { end };
        }

        if chunks.is_empty() {
            chunks.push(text.to_string());
        }
        chunks
    }
}

#[async_trait]
impl ChunkEngine for WindowChunkEngine {
    fn limits(&self) -> ChunkLimits {
        self.limits
    }

    async fn chunk(
        &self,
        text: &str,
        params: &SplitterParams,
    ) -> Result<Vec<String>, IngestionError> {
        Ok(self.split(text, params))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Rule {
    Newline,
    Blankline,
    Space,
    Sentence,
}

enum Rules<'a> {
    Hard,
    Ordered(Vec<Rule>),
    Custom(&'a [String]),
}

fn rules_for(split: &SplitBoundary) -> Rules<'_> {
    match split {
        SplitBoundary::None => Rules::Hard,
        SplitBoundary::Newline => Rules::Ordered(vec![Rule::Newline]),
        SplitBoundary::Blankline => Rules::Ordered(vec![Rule::Blankline]),
        SplitBoundary::Space => Rules::Ordered(vec![Rule::Space]),
        SplitBoundary::Sentence => Rules::Ordered(vec![Rule::Sentence]),
        SplitBoundary::Recursively => Rules::Ordered(RECURSIVE_ORDER.to_vec()),
        SplitBoundary::Custom(delimiters) => Rules::Custom(delimiters),
    }
}

/// Largest unit index in `(start, window_end]` where a chunk may end.
fn last_boundary(
    text: &str,
    units: &[usize],
    rules: &Rules<'_>,
    start: usize,
    window_end: usize,
) -> Option<usize> {
    let candidates = (start + 1..=window_end).rev();
    match rules {
        Rules::Hard => None,
        Rules::Custom(delimiters) => candidates
            .into_iter()
            .find(|&idx| ends_with_delimiter(text, offset_at(text, units, idx), delimiters)),
        Rules::Ordered(rules) => rules.iter().find_map(|rule| {
            candidates
                .clone()
                .find(|&idx| is_boundary(text, offset_at(text, units, idx), *rule))
        }),
    }
}

fn offset_at(text: &str, units: &[usize], idx: usize) -> usize {
    units.get(idx).copied().unwrap_or(text.len())
}

fn is_boundary(text: &str, offset: usize, rule: Rule) -> bool {
    let prefix = &text[..offset];
    let horizontal = |c: char| c == ' ' || c == '\t' || c == '\r';
    match rule {
        Rule::Space => prefix.ends_with(char::is_whitespace),
        Rule::Newline => prefix.trim_end_matches(horizontal).ends_with('\n'),
        Rule::Blankline => prefix
            .trim_end_matches(horizontal)
            .strip_suffix('\n')
            .map(|rest| rest.trim_end_matches(horizontal).ends_with('\n'))
            .unwrap_or(false),
        Rule::Sentence => {
            let trimmed = prefix.trim_end();
            trimmed.ends_with(['.', '!', '?'])
                && (trimmed.len() < prefix.len() || text[offset..].starts_with(char::is_whitespace))
        }
    }
}

fn ends_with_delimiter(text: &str, offset: usize, delimiters: &[String]) -> bool {
    let prefix = &text[..offset];
    let trimmed = prefix.trim_end();
    delimiters
        .iter()
        .any(|delimiter| prefix.ends_with(delimiter.as_str()) || trimmed.ends_with(delimiter.as_str()))
}

/// Byte offset where each unit starts. Words carry their trailing whitespace;
/// leading whitespace belongs to the first word.
fn unit_offsets(text: &str, by: ChunkBy) -> Vec<usize> {
    match by {
        ChunkBy::Chars => text.char_indices().map(|(idx, _)| idx).collect(),
        ChunkBy::Words => {
            let mut offsets = Vec::new();
            let mut previous_was_space = true;
            for (idx, c) in text.char_indices() {
                let is_space = c.is_whitespace();
                if !is_space && previous_was_space {
                    offsets.push(if offsets.is_empty() { 0 } else { idx });
                }
                previous_was_space = is_space;
            }
            offsets
        }
    }
}

pub(crate) fn normalize(text: &str, mode: Normalize) -> String {
    match mode {
        Normalize::None => text.to_string(),
        Normalize::Punctuation => normalize_punctuation(text),
        Normalize::Whitespace => normalize_whitespace(text),
        Normalize::Widechar => normalize_widechar(text),
        Normalize::All => normalize_whitespace(&normalize_punctuation(&normalize_widechar(text))),
    }
}

fn normalize_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            _ => out.push(c),
        }
    }
    out
}

fn normalize_widechar(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Collapses runs of spaces and tabs, strips them around line breaks, and
/// keeps at most one blank line in a row.
fn normalize_whitespace(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();

    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;
    for line in lines.iter().skip_while(|line| line.is_empty()) {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 0 { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank_run = 0;
    }
    out
}
