//! Chart page parsing.
//!
//! The chart is a table whose song rows carry the `lst50` / `lst100` class. Each
//! row holds the rank in `span.rank`, the title in `div.rank01` and the artist in
//! `div.rank02`. Rows are emitted in document order.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{ChartEntry, MISSING_FIELD};

const ROW_PATTERN: &str =
    r#"(?is)<tr\b[^>]*\bclass\s*=\s*["'][^"']*\blst(?:50|100)\b[^"']*["'][^>]*>(.*?)</tr>"#;
const RANK_PATTERN: &str =
    r#"(?is)<span\b[^>]*\bclass\s*=\s*["'][^"']*\brank\b[^"']*["'][^>]*>(.*?)</span>"#;
const TITLE_PATTERN: &str =
    r#"(?is)<div\b[^>]*\bclass\s*=\s*["'][^"']*\brank01\b[^"']*["'][^>]*>(.*?)</div>"#;
const ARTIST_PATTERN: &str =
    r#"(?is)<div\b[^>]*\bclass\s*=\s*["'][^"']*\brank02\b[^"']*["'][^>]*>(.*?)</div>"#;
const LINK_PATTERN: &str = r#"(?is)<a\b[^>]*>(.*?)</a>"#;
const TAG_PATTERN: &str = r#"<[^>]*>"#;

struct FieldPatterns {
    rank: Regex,
    title: Regex,
    artist: Regex,
    link: Regex,
}

impl FieldPatterns {
    fn compile() -> Result<Self> {
        Ok(Self {
            rank: compile(RANK_PATTERN)?,
            title: compile(TITLE_PATTERN)?,
            artist: compile(ARTIST_PATTERN)?,
            link: compile(LINK_PATTERN)?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AppError::Parse(format!("bad pattern: {}", e)))
}

/// A chart page with its song rows located but not yet read.
pub struct ChartDocument {
    markup: String,
    rows: Vec<Range<usize>>,
    fields: FieldPatterns,
}

impl ChartDocument {
    /// Locate the song rows. A page without any is not a chart page.
    pub fn parse(markup: impl Into<String>) -> Result<Self> {
        let markup = markup.into();
        let row_re = compile(ROW_PATTERN)?;

        let rows: Vec<Range<usize>> = row_re
            .captures_iter(&markup)
            .filter_map(|cap| cap.get(1).map(|m| m.range()))
            .collect();

        if rows.is_empty() {
            return Err(AppError::Parse("no chart rows found in page".to_string()));
        }

        Ok(Self {
            markup,
            rows,
            fields: FieldPatterns::compile()?,
        })
    }

    /// Number of song rows found, including ones `entries` will skip.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Entries in document order. Each call starts over from the first row.
    ///
    /// Rows whose rank is not a non-negative integer, or is above `u32::MAX`,
    /// are skipped.
    pub fn entries(&self) -> impl Iterator<Item = ChartEntry> + '_ {
        self.rows
            .iter()
            .filter_map(move |span| self.read_row(&self.markup[span.clone()]))
    }

    fn read_row(&self, row: &str) -> Option<ChartEntry> {
        let rank_text = self
            .fields
            .rank
            .captures(row)
            .and_then(|cap| cap.get(1))
            .map(|m| plain_text(m.as_str()))?;

        let rank = match rank_text.parse::<u64>() {
            Ok(rank) => match u32::try_from(rank) {
                Ok(rank) => rank,
                Err(_) => {
                    tracing::debug!("Skipping chart row with out-of-range rank {}", rank);
                    return None;
                }
            },
            Err(_) => {
                tracing::debug!("Skipping chart row with rank {:?}", rank_text);
                return None;
            }
        };

        let title = self.read_field(&self.fields.title, row);
        let artist = self.read_field(&self.fields.artist, row);

        Some(ChartEntry { rank, title, artist })
    }

    /// First link text inside the matching block, or the block's own text.
    fn read_field(&self, block: &Regex, row: &str) -> String {
        let inner = match block.captures(row).and_then(|cap| cap.get(1)) {
            Some(m) => m.as_str(),
            None => return MISSING_FIELD.to_string(),
        };

        let text = match self.fields.link.captures(inner).and_then(|cap| cap.get(1)) {
            Some(link) => plain_text(link.as_str()),
            None => plain_text(inner),
        };

        if text.is_empty() {
            MISSING_FIELD.to_string()
        } else {
            text
        }
    }
}

/// Strip tags, decode entities and collapse whitespace.
pub fn plain_text(fragment: &str) -> String {
    let stripped = match tag_pattern() {
        Some(tag) => tag.replace_all(fragment, "").into_owned(),
        None => fragment.to_string(),
    };
    if stripped.trim().is_empty() {
        return String::new();
    }

    // Wide enough that html2text never wraps; whitespace is collapsed below anyway.
    let decoded = html2text::from_read(stripped.as_bytes(), 4096).unwrap_or(stripped);

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tag_pattern() -> Option<&'static Regex> {
    static TAG: OnceLock<Option<Regex>> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(TAG_PATTERN).ok()).as_ref()
}
