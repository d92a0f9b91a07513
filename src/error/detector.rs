//! Deadlock detection and deadlock-graph extraction.
//!
//! A deadlock is identified purely by error number. The graph extraction is
//! best effort: drivers and servers do not reliably embed the
//! `<deadlock-list>` XML in the message text, and when they do it may be cut
//! short. Anything that does not parse as a well-formed fragment is treated as
//! absent rather than surfaced as an error.

use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

/// Error number raised for the transaction chosen as deadlock victim.
pub const DEADLOCK_VICTIM: i32 = 1205;

/// Opening tag with optional attributes, lazily up to the first closing tag.
static DEADLOCK_GRAPH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<deadlock-list(?:\s[^>]*)?>.*?</deadlock-list>")
        .expect("Invalid deadlock graph pattern")
});

/// Returns true only for the deadlock-victim error number.
pub fn is_deadlock(code: i32) -> bool {
    code == DEADLOCK_VICTIM
}

/// Extracts the first `<deadlock-list>` fragment from an error message.
///
/// The fragment is returned only if it is well-formed XML on its own; the
/// rest of the message is never parsed.
///
/// ```
/// use sqlerror_enricher::error::detector::try_extract_graph;
///
/// let msg = r#"Transaction was deadlocked. <deadlock-list id="1"><deadlock/></deadlock-list>"#;
/// assert_eq!(
///     try_extract_graph(msg),
///     Some(r#"<deadlock-list id="1"><deadlock/></deadlock-list>"#)
/// );
/// assert_eq!(try_extract_graph("<deadlock-list><deadlock></deadlock-list>"), None);
/// ```
pub fn try_extract_graph(message: &str) -> Option<&str> {
    if message.trim().is_empty() {
        return None;
    }

    let fragment = DEADLOCK_GRAPH.find(message)?.as_str();
    if is_well_formed(fragment) {
        Some(fragment)
    } else {
        tracing::trace!(len = fragment.len(), "discarding malformed deadlock graph");
        None
    }
}

/// Streams a fragment-mode parse over `fragment`, requiring balanced tags,
/// valid attributes and character data. Declarations and DOCTYPEs are not
/// allowed inside a fragment.
fn is_well_formed(fragment: &str) -> bool {
    let mut reader = Reader::from_str(fragment);
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if !has_valid_attributes(&start) {
                    return false;
                }
                depth += 1;
            }
            Ok(Event::Empty(empty)) => {
                if !has_valid_attributes(&empty) {
                    return false;
                }
            }
            Ok(Event::End(_)) => match depth.checked_sub(1) {
                Some(remaining) => depth = remaining,
                None => return false,
            },
            Ok(Event::Text(text)) => match text.unescape() {
                Ok(value) if is_char_data(&value) => {}
                _ => return false,
            },
            Ok(Event::CData(cdata)) => {
                if !cdata.iter().all(|&b| is_allowed_byte(b)) {
                    return false;
                }
            }
            Ok(Event::DocType(_)) | Ok(Event::Decl(_)) => return false,
            Ok(Event::Eof) => return depth == 0,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}

fn has_valid_attributes(tag: &BytesStart<'_>) -> bool {
    tag.attributes().all(|attr| {
        let Ok(attr) = attr else {
            return false;
        };
        if attr.value.contains(&b'<') {
            return false;
        }
        matches!(attr.unescape_value(), Ok(value) if is_char_data(&value))
    })
}

/// C0 controls other than tab, LF and CR are not XML characters.
fn is_char_data(value: &str) -> bool {
    value.chars().all(|c| c >= '\u{20}' || matches!(c, '\t' | '\n' | '\r'))
}

fn is_allowed_byte(b: u8) -> bool {
    b >= 0x20 || matches!(b, b'\t' | b'\n' | b'\r')
}
