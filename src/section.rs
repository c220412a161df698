// 📑 Section Extractor - Locate the ticket block between sentinel markers
//
// The markers are optional hints, not a requirement. When they are absent
// or malformed the whole input is treated as candidate data and identifier
// discovery is deferred to whichever downstream parser succeeds.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Start marker, matched byte-for-byte.
pub const START_DELIMITER: &str = "<<START OF JIRA TICKETS>>";

/// End marker, matched byte-for-byte.
pub const END_DELIMITER: &str = "<<END OF JIRA TICKETS>>";

// ============================================================================
// EXTRACTED SECTION
// ============================================================================

/// ExtractedSection - Output of extract_ticket_section()
///
/// `region` is None when there is no data to work with: empty input, or
/// markers present but out of order, or an empty region between them.
/// `bounded` records whether the region was carved out by the markers
/// (true) or is the whole-input fallback (false).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub region: Option<String>,
    pub bounded: bool,
}

impl ExtractedSection {
    fn no_data() -> Self {
        ExtractedSection {
            region: None,
            bounded: false,
        }
    }

    pub fn has_data(&self) -> bool {
        self.region.is_some()
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Search `text` for the sentinel markers and carve out the region
/// strictly between them.
///
/// Behavior matrix:
/// - both markers found, start before end: region between them, trimmed,
///   bounded = true
/// - both markers found, start at or after end: no data
/// - markers absent or only one found: whole text trimmed, bounded = false
/// - empty or whitespace-only candidate region: no data
pub fn extract_ticket_section(text: &str) -> ExtractedSection {
    if text.is_empty() {
        return ExtractedSection::no_data();
    }

    match (text.find(START_DELIMITER), text.find(END_DELIMITER)) {
        (Some(start), Some(end)) => {
            let start = start + START_DELIMITER.len();

            if start >= end {
                debug!("sentinel markers out of order, treating as no data");
                return ExtractedSection::no_data();
            }

            let region = text[start..end].trim();
            if region.is_empty() {
                debug!("empty region between sentinel markers, treating as no data");
                return ExtractedSection::no_data();
            }

            debug!(region_len = region.len(), "sentinel markers found");
            ExtractedSection {
                region: Some(region.to_string()),
                bounded: true,
            }
        }
        _ => {
            // Markers absent (or only one present): fall back to the
            // entire input as candidate data.
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return ExtractedSection::no_data();
            }

            debug!("sentinel markers absent, falling back to whole input");
            ExtractedSection {
                region: Some(trimmed.to_string()),
                bounded: false,
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_markers_present() {
        let text = format!(
            "intro text\n{}\n  <rss><channel></channel></rss>  \n{}\ntrailing",
            START_DELIMITER, END_DELIMITER
        );

        let section = extract_ticket_section(&text);

        assert!(section.bounded);
        assert_eq!(
            section.region.as_deref(),
            Some("<rss><channel></channel></rss>")
        );
    }

    #[test]
    fn test_region_excludes_markers() {
        let text = format!("{}CSMVP-643{}", START_DELIMITER, END_DELIMITER);

        let section = extract_ticket_section(&text);

        let region = section.region.unwrap();
        assert_eq!(region, "CSMVP-643");
        assert!(!region.contains(START_DELIMITER));
        assert!(!region.contains(END_DELIMITER));
    }

    #[test]
    fn test_no_markers_falls_back_to_whole_text() {
        let section = extract_ticket_section("  BUG-123: login broken  ");

        assert!(!section.bounded);
        assert_eq!(section.region.as_deref(), Some("BUG-123: login broken"));
    }

    #[test]
    fn test_only_start_marker_falls_back() {
        let text = format!("{} BUG-123 and no end in sight", START_DELIMITER);

        let section = extract_ticket_section(&text);

        assert!(!section.bounded);
        assert_eq!(section.region.as_deref(), Some(text.trim()));
    }

    #[test]
    fn test_markers_out_of_order() {
        let text = format!("{} BUG-123 {}", END_DELIMITER, START_DELIMITER);

        let section = extract_ticket_section(&text);

        assert!(!section.bounded);
        assert!(section.region.is_none());
    }

    #[test]
    fn test_empty_region_between_markers() {
        let text = format!("{}   \n  {}", START_DELIMITER, END_DELIMITER);

        let section = extract_ticket_section(&text);

        assert!(!section.bounded);
        assert!(section.region.is_none());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_ticket_section(""), ExtractedSection::no_data());
        assert_eq!(extract_ticket_section("   \n  "), ExtractedSection::no_data());
    }
}
