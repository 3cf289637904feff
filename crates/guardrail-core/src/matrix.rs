//! Compliance-matrix extraction from requirements documents.
//!
//! A requirements document may embed a markdown table with one row per
//! guardrail it addresses:
//!
//! ```markdown
//! | Guardrail             | Scope | Evidence | Owner | Notes | Status                 |
//! |-----------------------|-------|----------|-------|-------|------------------------|
//! | 1. Testing Coverage   | api   | ci.yml   | jo    |       | DONE                   |
//! | 9. Tenant Isolation   |       |          |       |       | N/A - not multi-tenant |
//! ```
//!
//! Only the leading `<id>. <name>` cell and the final status cell matter; the
//! four cells in between are ignored. Lines of any other shape (headers,
//! separators, prose) are skipped.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::rule::RuleId;

/// Number of cells in a compliance-matrix row
const ROW_CELLS: usize = 6;

/// Declared status of one rule in one specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecStatus {
    Done,
    Todo,
    Partial,
    NotApplicable,
}

impl SpecStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecStatus::Done => "done",
            SpecStatus::Todo => "todo",
            SpecStatus::Partial => "partial",
            SpecStatus::NotApplicable => "not-applicable",
        }
    }
}

impl Display for SpecStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed compliance-matrix row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub rule_id: RuleId,
    /// Rule name as written in the document (display only)
    pub rule_name: String,
    pub status: SpecStatus,
    /// Free-form text after the hyphen of an `N/A - ...` status
    pub justification: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
}

/// Extract compliance rows from a requirements document.
///
/// Rows are returned in document order. If a rule appears more than once,
/// only its first row is kept.
pub fn extract_rows(document: &str) -> Vec<MatrixRow> {
    let mut rows = Vec::new();
    let mut seen: HashSet<RuleId> = HashSet::new();

    for (index, line) in document.lines().enumerate() {
        let Some((rule_id, rule_name, raw_status)) = parse_row(line) else {
            continue;
        };
        if !seen.insert(rule_id) {
            continue;
        }
        let (status, justification) = parse_status(raw_status);
        rows.push(MatrixRow {
            rule_id,
            rule_name: rule_name.to_string(),
            status,
            justification,
            line: index + 1,
        });
    }

    rows
}

/// Split a table line into `(id, name, status cell)` if it has the
/// compliance-row shape.
fn parse_row(line: &str) -> Option<(RuleId, &str, &str)> {
    let trimmed = line.trim();
    if !trimmed.contains('|') {
        return None;
    }
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let cells: Vec<&str> = inner.split('|').map(str::trim).collect();
    if cells.len() != ROW_CELLS {
        return None;
    }

    let (rule_id, rule_name) = parse_rule_cell(cells[0])?;
    Some((rule_id, rule_name, cells[ROW_CELLS - 1]))
}

/// Parse `1. Testing Coverage` (optionally wrapped in emphasis).
fn parse_rule_cell(cell: &str) -> Option<(RuleId, &str)> {
    let cell = strip_emphasis(cell);
    let digits_end = cell
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(cell.len());
    if digits_end == 0 {
        return None;
    }
    let rule_id = cell[..digits_end].parse::<RuleId>().ok()?;

    let rest = cell[digits_end..].strip_prefix('.')?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let name = rest.trim();
    if name.is_empty() {
        return None;
    }
    Some((rule_id, name))
}

fn strip_emphasis(text: &str) -> &str {
    text.trim()
        .trim_matches(|c: char| c == '*' || c == '_' || c == '`')
        .trim()
}

/// Hyphen, en dash and em dash all separate a status from its note
const SEPARATORS: [char; 3] = ['-', '\u{2013}', '\u{2014}'];

/// Normalize a raw status cell.
///
/// The leading token (text before the first dash) decides the status:
/// `DONE`; `PARTIAL` or `IN PROGRESS`; `N/A`, `NA` or `NOT APPLICABLE` (or
/// anything starting with `N/A`). Everything else, including an empty cell,
/// is `todo`. For not-applicable statuses the text after the dash that
/// follows the token becomes the justification.
pub fn parse_status(raw: &str) -> (SpecStatus, Option<String>) {
    let text = strip_emphasis(raw);
    let token = text
        .split(SEPARATORS)
        .next()
        .unwrap_or_default()
        .trim()
        .to_uppercase();

    let not_applicable = if text.to_uppercase().starts_with("N/A") {
        Some("N/A".len())
    } else if matches!(token.as_str(), "NA" | "NOT APPLICABLE") {
        Some(token.len())
    } else {
        None
    };

    if let Some(token_len) = not_applicable {
        let justification = text
            .get(token_len..)
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix(SEPARATORS))
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .map(str::to_string);
        return (SpecStatus::NotApplicable, justification);
    }

    let status = match token.as_str() {
        "DONE" => SpecStatus::Done,
        "PARTIAL" | "IN PROGRESS" => SpecStatus::Partial,
        _ => SpecStatus::Todo,
    };
    (status, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tokens() {
        assert_eq!(parse_status("DONE"), (SpecStatus::Done, None));
        assert_eq!(parse_status("done"), (SpecStatus::Done, None));
        assert_eq!(parse_status("**Done**"), (SpecStatus::Done, None));
        assert_eq!(parse_status("Partial"), (SpecStatus::Partial, None));
        assert_eq!(parse_status("in progress"), (SpecStatus::Partial, None));
        assert_eq!(parse_status("TODO"), (SpecStatus::Todo, None));
        assert_eq!(parse_status(""), (SpecStatus::Todo, None));
        assert_eq!(parse_status("blocked"), (SpecStatus::Todo, None));
    }

    #[test]
    fn not_applicable_variants() {
        for raw in ["N/A", "n/a", "NA", "Not Applicable", "N/A (legacy)"] {
            assert_eq!(
                parse_status(raw),
                (SpecStatus::NotApplicable, None),
                "{raw}"
            );
        }
    }

    #[test]
    fn not_applicable_justification_after_hyphen() {
        assert_eq!(
            parse_status("N/A - not multi-tenant"),
            (
                SpecStatus::NotApplicable,
                Some("not multi-tenant".to_string())
            )
        );
        assert_eq!(
            parse_status("Not applicable - internal tool"),
            (SpecStatus::NotApplicable, Some("internal tool".to_string()))
        );
        assert_eq!(parse_status("N/A -  "), (SpecStatus::NotApplicable, None));
    }

    #[test]
    fn justification_keeps_hyphenated_words() {
        assert_eq!(
            parse_status("N/A \u{2013} not multi-tenant"),
            (
                SpecStatus::NotApplicable,
                Some("not multi-tenant".to_string())
            )
        );
        assert_eq!(
            parse_status("NA\u{2014}read-only service"),
            (SpecStatus::NotApplicable, Some("read-only service".to_string()))
        );
        assert_eq!(
            parse_status("N/A for multi-tenant setups"),
            (SpecStatus::NotApplicable, None)
        );
        assert_eq!(parse_status("DONE \u{2013} shipped"), (SpecStatus::Done, None));
    }

    #[test]
    fn extracts_rows_and_skips_other_lines() {
        let doc = "\
# Requirements

| Guardrail | a | b | c | d | Status |
|-----------|---|---|---|---|--------|
| 1. Testing Coverage | x | x | x | x | DONE |
| 3. Error Handling |  |  |  |  | partial |
| 4. Documentation | too | few | cells | TODO |
| Not a rule | | | | | DONE |
Some prose mentioning 2. Security Review | DONE
";
        let rows = extract_rows(doc);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].rule_id, 1);
        assert_eq!(rows[0].rule_name, "Testing Coverage");
        assert_eq!(rows[0].status, SpecStatus::Done);
        assert_eq!(rows[0].line, 5);
        assert_eq!(rows[1].rule_id, 3);
        assert_eq!(rows[1].status, SpecStatus::Partial);
    }

    #[test]
    fn rows_without_outer_pipes_are_accepted() {
        let rows = extract_rows("2. Security Review | a | b | c | d | DONE");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].rule_id, 2);
    }

    #[test]
    fn first_row_per_rule_wins() {
        let doc = "\
| 5. Performance Budget | | | | | TODO |
| 5. Performance Budget | | | | | DONE |
";
        let rows = extract_rows(doc);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, SpecStatus::Todo);
    }

    #[test]
    fn rule_cell_shape() {
        assert_eq!(parse_rule_cell("12. Data Residency"), Some((12, "Data Residency")));
        assert_eq!(parse_rule_cell("**7. Observability**"), Some((7, "Observability")));
        assert_eq!(parse_rule_cell("7.Observability"), None);
        assert_eq!(parse_rule_cell("7. "), None);
        assert_eq!(parse_rule_cell("x7. Observability"), None);
        assert_eq!(parse_rule_cell("99999999999. Overflow"), None);
    }
}
