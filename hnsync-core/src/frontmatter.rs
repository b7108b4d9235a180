//! YAML front matter parsing and body extraction.
//!
//! A document optionally begins with a block delimited by `---` lines. The
//! block is parsed as YAML into [`FrontMatter`]; unknown fields are tolerated
//! and ignored, only syntactically invalid YAML is rejected. The body is
//! everything after the closing delimiter, minus a single blank-line
//! separator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Recognized front matter fields and their effects on remote mutations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    /// URL slug; when present the publish settings mark the slug overridden.
    pub slug: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Canonical URL of the original article.
    pub canonical: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub cover_image_url: Option<String>,
    pub banner_image_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_image: Option<String>,
    /// Series *name*, resolved against the ledger series table.
    pub series: Option<String>,
    pub toc: Option<bool>,
    pub newsletter: Option<bool>,
    pub delisted: Option<bool>,
    pub scheduled: Option<bool>,
    pub slug_overridden: Option<bool>,
    pub pin_to_blog: Option<bool>,
    pub disable_comments: Option<bool>,
    #[serde(default)]
    pub co_authors: Vec<String>,
}

/// A markdown document split into front matter and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub front_matter: Option<FrontMatter>,
    pub body: String,
}

impl ParsedDocument {
    pub fn title(&self) -> Option<&str> {
        self.front_matter
            .as_ref()
            .and_then(|fm| fm.title.as_deref())
    }
}

/// Split `content` into front matter and body.
///
/// The opening delimiter must be the first line; the block ends at the first
/// subsequent line that is exactly `---`. A document without a front matter
/// block parses to `front_matter: None` with the full content as body.
pub fn parse_document(content: &str) -> Result<ParsedDocument, CoreError> {
    let mut lines = content.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Ok(ParsedDocument::default());
    };
    if trim_line(first) != "---" {
        return Ok(ParsedDocument {
            front_matter: None,
            body: content.to_owned(),
        });
    }

    let mut yaml = String::new();
    let mut body = String::new();
    let mut closed = false;
    for line in lines {
        if !closed && trim_line(line) == "---" {
            closed = true;
            continue;
        }
        if closed {
            body.push_str(line);
        } else {
            yaml.push_str(line);
        }
    }

    if !closed {
        // No closing delimiter: the leading `---` was not front matter.
        return Ok(ParsedDocument {
            front_matter: None,
            body: content.to_owned(),
        });
    }

    let front_matter: FrontMatter =
        serde_yaml::from_str(&yaml).map_err(|source| CoreError::FrontMatter { source })?;

    // Drop the single blank separator line conventionally left after `---`.
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(&body)
        .to_owned();

    Ok(ParsedDocument {
        front_matter: Some(front_matter),
        body,
    })
}

/// Extract just the title, for callers that need nothing else.
pub fn parse_title(content: &str) -> Result<Option<String>, CoreError> {
    Ok(parse_document(content)?
        .front_matter
        .and_then(|fm| fm.title))
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches('\n').trim_end_matches('\r')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
