use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `<N>. <text> [<id>, <id>...]`, anchored on both ends.
pub(super) const CLAIM_LINE_PATTERN: &str = r"^([0-9]+)\.\s(.+?)\s\[([0-9]+(?:,\s*[0-9]+)*)\]$";

static CLAIM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CLAIM_LINE_PATTERN).expect("valid claim line regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub index: u64,
    pub text: String,
    pub citation_ids: Vec<i64>,
}

pub fn parse_claims_from_markdown(markdown: &str) -> Vec<Claim> {
    markdown
        .split('\n')
        .map(str::trim)
        .filter_map(parse_claim_line)
        .collect()
}

fn parse_claim_line(line: &str) -> Option<Claim> {
    let captures = CLAIM_LINE.captures(line)?;

    let index = captures.get(1)?.as_str().parse::<u64>().ok()?;
    let text = captures.get(2)?.as_str().trim();
    if text.is_empty() {
        return None;
    }

    let citation_ids = parse_citation_ids(captures.get(3)?.as_str());
    if citation_ids.is_empty() {
        return None;
    }

    Some(Claim {
        index,
        text: text.to_string(),
        citation_ids,
    })
}

fn parse_citation_ids(list: &str) -> Vec<i64> {
    list.split(',')
        .filter_map(|item| item.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .collect()
}
