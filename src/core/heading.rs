use crate::Paragraph;
use log::warn;

/// Style-name marker that makes a paragraph a section heading.
pub const HEADING_STYLE_MARKER: &str = "Heading";

/// Heading level of a paragraph, taken from its resolved style name.
/// Returns `None` for anything that should stay body content.
pub fn classify(paragraph: &Paragraph) -> Option<usize> {
    heading_level(&paragraph.style)
}

/// Parses the level out of a heading style name ("Heading 2" -> 2).
/// Names that carry the marker but no clean integer suffix are logged and
/// rejected; the caller keeps the paragraph as body text.
pub fn heading_level(style_name: &str) -> Option<usize> {
    let name = style_name.trim();
    let marker_len = HEADING_STYLE_MARKER.len();
    let has_marker = name
        .get(..marker_len)
        .map_or(false, |head| head.eq_ignore_ascii_case(HEADING_STYLE_MARKER));
    if !has_marker {
        return None;
    }

    match name[marker_len..].trim().parse::<usize>() {
        Ok(level) => Some(level),
        Err(_) => {
            warn!("Invalid heading style: {}", style_name);
            None
        }
    }
}
