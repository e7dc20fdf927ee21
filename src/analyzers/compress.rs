//! Token-budget compression for repetitive tool findings.
//!
//! Tools often emit the same message hundreds of times (one per call site).
//! Messages repeated more than [`DEDUP_THRESHOLD`] times collapse into a
//! `[Nx] message` line with a few example locations; everything at or below
//! the threshold keeps its individual `file:line` entries. Output is ordered
//! by descending count, first-seen order breaking ties.

use indexmap::IndexMap;

use crate::constants::{DEDUP_EXAMPLE_LOCATIONS, DEDUP_THRESHOLD};

/// Separator between location and message in a finding line.
const SEPARATOR: &str = " — ";

#[derive(Default)]
struct MessageGroup {
    count: usize,
    examples: Vec<String>,
    lines: Vec<String>,
}

/// Compress finding lines of the form `  file:line — message`.
///
/// Lines without the separator are treated as their own message and kept
/// verbatim when infrequent.
pub fn compress_findings(lines: &[String]) -> Vec<String> {
    let mut groups: IndexMap<String, MessageGroup> = IndexMap::new();

    for line in lines {
        let (location, message) = match line.split_once(SEPARATOR) {
            Some((loc, msg)) => (loc.trim().to_string(), msg.to_string()),
            None => (String::new(), line.trim().to_string()),
        };
        let group = groups.entry(message).or_default();
        group.count += 1;
        if group.examples.len() < DEDUP_EXAMPLE_LOCATIONS && !location.is_empty() {
            group.examples.push(location);
        }
        group.lines.push(line.clone());
    }

    let mut ordered: Vec<(&String, &MessageGroup)> = groups.iter().collect();
    // Stable sort keeps first-seen order among equal counts.
    ordered.sort_by(|a, b| b.1.count.cmp(&a.1.count));

    let mut out = Vec::new();
    for (message, group) in ordered {
        if group.count > DEDUP_THRESHOLD {
            out.push(format!("  [{}x] {message}", group.count));
            if !group.examples.is_empty() {
                out.push(format!("         e.g. {}", group.examples.join(", ")));
            }
        } else {
            out.extend(group.lines.iter().cloned());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn finding(loc: &str, msg: &str) -> String {
        format!("  {loc} — {msg}")
    }

    #[test]
    fn infrequent_messages_stay_verbatim() {
        let lines: Vec<String> = (0..DEDUP_THRESHOLD)
            .map(|i| finding(&format!("a.php:{i}"), "Undefined variable $x"))
            .collect();
        assert_eq!(compress_findings(&lines), lines);
    }

    #[test]
    fn frequent_messages_collapse_with_examples() {
        let lines: Vec<String> = (0..DEDUP_THRESHOLD + 1)
            .map(|i| finding(&format!("a.php:{i}"), "Undefined variable $x"))
            .collect();
        let out = compress_findings(&lines);
        assert_eq!(
            out,
            vec![
                format!("  [{}x] Undefined variable $x", DEDUP_THRESHOLD + 1),
                "         e.g. a.php:0, a.php:1, a.php:2".to_string(),
            ]
        );
    }

    #[test]
    fn ordered_by_count_descending() {
        let mut lines = Vec::new();
        for i in 0..3 {
            lines.push(finding(&format!("b.php:{i}"), "rare issue"));
        }
        for i in 0..15 {
            lines.push(finding(&format!("a.php:{i}"), "common issue"));
        }
        let out = compress_findings(&lines);
        assert!(out[0].contains("[15x] common issue"));
        assert!(out[2].contains("rare issue"));
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let lines = vec![
            finding("a.php:1", "first message"),
            finding("b.php:1", "second message"),
        ];
        let out = compress_findings(&lines);
        assert!(out[0].contains("first message"));
        assert!(out[1].contains("second message"));
    }

    #[test]
    fn lines_without_separator_are_grouped_by_full_text() {
        let lines = vec!["  [General] config parse warning".to_string()];
        let out = compress_findings(&lines);
        assert_eq!(out, lines);
    }

    #[test]
    fn compression_is_idempotent_on_compressed_output() {
        let lines: Vec<String> = (0..20)
            .map(|i| finding(&format!("a.php:{i}"), "noisy"))
            .collect();
        let once = compress_findings(&lines);
        let twice = compress_findings(&once);
        assert_eq!(once, twice);
    }
}
