//! Structural document parser
//!
//! Parses the plain-text corpus format into an ordered list of sections.
//! Recognized markers: `Page <N>` lines, `=== TITLE ===` and
//! `=== CHAPTER <label> ===` headers, `--- <entry> ---` sub-entries and
//! `D.D[.D] Title` numeric subsection headers.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Section;

static PAGE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Page\s+(\d+)").expect("valid page marker regex"));

static SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^===\s*(.+?)\s*===$").expect("valid section header regex"));

static SUB_ENTRY_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^---\s*(.+?)\s*---$").expect("valid sub-entry header regex"));

static NUMERIC_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+\.\d+(?:\.\d+)?)\s+(.+)").expect("valid numeric header regex"));

/// Buffered state for the single currently open section.
#[derive(Debug)]
struct OpenSection {
    title: String,
    page: u32,
    lines: Vec<String>,
}

impl OpenSection {
    fn new(title: String, page: u32) -> Self {
        Self {
            title,
            page,
            lines: Vec::new(),
        }
    }

    fn has_content(&self) -> bool {
        !self.lines.is_empty()
    }
}

/// Single-pass parser that turns marked-up corpus text into sections.
///
/// The parser is a two-state machine: either no section is open, or exactly
/// one section buffer is accumulating content lines. Any header transitions
/// to the open state, flushing the previous buffer when it holds content.
/// Headers never emit empty sections; lines before the first header are
/// discarded.
#[derive(Debug, Clone, Default)]
pub struct StructuralParser;

impl StructuralParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse `text` into the ordered sections of `filename`.
    ///
    /// Emitted sections get sequential node ids (`N0001`, `N0002`, ...)
    /// scoped to the file. Well-formed input cannot fail; text with no
    /// header markers yields an empty list.
    pub fn parse(&self, filename: &str, text: &str) -> Vec<Section> {
        let mut sections: Vec<Section> = Vec::new();
        let mut open: Option<OpenSection> = None;
        let mut current_page: u32 = 1;

        for raw_line in text.split('\n') {
            let line = raw_line.trim();

            if let Some(caps) = PAGE_MARKER.captures(line) {
                // Updates the page counter only; the open buffer keeps
                // accumulating under its original page.
                if let Some(page) = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
                    current_page = page.max(1);
                }
                continue;
            }

            if let Some(caps) = SECTION_HEADER.captures(line) {
                // Covers both `=== CHAPTER <label> ===` and plain
                // `=== TITLE ===`; the title is the full inner label.
                let title = caps[1].trim().to_string();
                Self::flush(&mut sections, filename, open.take());
                open = Some(OpenSection::new(title, current_page));
                continue;
            }

            if let Some(caps) = SUB_ENTRY_HEADER.captures(line) {
                let parent_title = open
                    .as_ref()
                    .map(|s| s.title.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                let title = format!("{} > {}", parent_title, caps[1].trim());
                Self::flush(&mut sections, filename, open.take());
                open = Some(OpenSection::new(title, current_page));
                continue;
            }

            if let Some(caps) = NUMERIC_HEADER.captures(line) {
                let title = format!("{} {}", &caps[1], caps[2].trim());
                Self::flush(&mut sections, filename, open.take());
                open = Some(OpenSection::new(title, current_page));
                continue;
            }

            if let Some(section) = open.as_mut() {
                section.lines.push(raw_line.to_string());
            }
        }

        Self::flush(&mut sections, filename, open.take());
        sections
    }

    /// Emit the open section if it buffered any content lines.
    fn flush(sections: &mut Vec<Section>, filename: &str, open: Option<OpenSection>) {
        let Some(section) = open else {
            return;
        };
        if !section.has_content() {
            return;
        }

        let node_id = format!("N{:04}", sections.len() + 1);
        sections.push(Section::new(
            filename,
            section.title,
            section.page,
            section.lines.join("\n").trim().to_string(),
            node_id,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<Section> {
        StructuralParser::new().parse("doc.txt", text)
    }

    #[test]
    fn test_no_headers_yields_no_sections() {
        let sections = parse("just some text\nacross two lines");
        assert!(sections.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_single_section() {
        let sections = parse("=== OVERVIEW ===\nline one\nline two");

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "OVERVIEW");
        assert_eq!(sections[0].content, "line one\nline two");
        assert_eq!(sections[0].node_id, "N0001");
        assert_eq!(sections[0].page, 1);
        assert_eq!(sections[0].qualified_id(), "doc.txt:N0001");
    }

    #[test]
    fn test_page_marker_updates_counter_without_flushing() {
        let text = "Page 3\n=== LOADS ===\nalpha\nPage 4\nbeta\n=== NEXT ===\ngamma";
        let sections = parse(text);

        assert_eq!(sections.len(), 2);
        // Section keeps the page that was current when it opened.
        assert_eq!(sections[0].page, 3);
        assert_eq!(sections[0].content, "alpha\nbeta");
        assert_eq!(sections[1].page, 4);
    }

    #[test]
    fn test_chapter_header_keeps_full_label_as_title() {
        let sections = parse("=== CHAPTER 2: DESIGN ===\nbody");

        assert_eq!(sections[0].title, "CHAPTER 2: DESIGN");
    }

    #[test]
    fn test_sub_entry_title_concatenates_parent() {
        let text = "=== SDN LIST ===\nintro\n--- Entry #0001 ---\nentry body";
        let sections = parse(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "SDN LIST");
        assert_eq!(sections[1].title, "SDN LIST > Entry #0001");
    }

    #[test]
    fn test_sub_entry_without_parent_uses_unknown() {
        let sections = parse("--- Entry #0001 ---\nbody");

        assert_eq!(sections[0].title, "Unknown > Entry #0001");
    }

    #[test]
    fn test_numeric_subsection_header() {
        let text = "=== TOP ===\nt\n3.1.4 Allowable Stress\ndetails here";
        let sections = parse(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title, "3.1.4 Allowable Stress");
        assert_eq!(sections[1].content, "details here");
    }

    #[test]
    fn test_preamble_lines_are_discarded() {
        let text = "stray preamble\nmore preamble\n=== REAL ===\ncontent";
        let sections = parse(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "content");
    }

    #[test]
    fn test_empty_sections_are_dropped() {
        let text = "=== EMPTY ===\n=== FULL ===\ncontent";
        let sections = parse(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "FULL");
        assert_eq!(sections[0].node_id, "N0001");
    }

    #[test]
    fn test_node_ids_are_sequential() {
        let text = "=== A ===\na\n=== B ===\nb\n=== C ===\nc";
        let sections = parse(text);

        let ids: Vec<&str> = sections.iter().map(|s| s.node_id.as_str()).collect();
        assert_eq!(ids, vec!["N0001", "N0002", "N0003"]);
    }

    #[test]
    fn test_content_is_trimmed() {
        let text = "=== A ===\n\n  padded  \n\n=== B ===\nb";
        let sections = parse(text);

        assert_eq!(sections[0].content, "padded");
    }

    #[test]
    fn test_line_order_is_preserved() {
        // Concatenating emitted contents reproduces the post-header text
        // with only header and page lines removed.
        let text = "=== A ===\none\ntwo\n=== B ===\nthree\nPage 2\nfour";
        let sections = parse(text);

        let joined: Vec<String> = sections.iter().map(|s| s.content.clone()).collect();
        assert_eq!(joined.join("\n"), "one\ntwo\nthree\nfour");
    }

    #[test]
    fn test_final_section_flushes_at_end_of_input() {
        let sections = parse("=== LAST ===\ntail content");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].content, "tail content");
    }
}
