//! Canonicalization pass run on every payload before decoding.
//!
//! The service declares a single abstract `values` element and tells the
//! concrete shape apart only through an `xsi:type` attribute:
//!
//! ```text
//! <values xsi:type="process.restDTO:ReleaseDTO">...</values>
//! ```
//!
//! Static decoding needs a concrete element name, so each such element is
//! renamed after its concrete type (`<ReleaseDTO>...</ReleaseDTO>`) and the
//! `xsi:type` attribute is dropped. Namespace prefixes are removed from all
//! element names, and newlines are stripped first because some markers span
//! them.
//!
//! The rewrite works on tokens, not text, so nested `values` elements close
//! against the right tag. It is idempotent: already-canonical XML comes out
//! unchanged.

use crate::error::RtcError;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

const POLYMORPHIC_ELEMENT: &str = "values";
const TYPE_ATTRIBUTE: &str = "xsi:type";

/// Rewrite polymorphic `values` elements to their concrete type names.
///
/// # Errors
///
/// Returns [`RtcError::Decode`] when the payload is not well-formed XML or
/// when a polymorphic marker carries no usable concrete type name.
pub fn normalize(raw: &str) -> Result<String, RtcError> {
    let flattened: String = raw.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();

    let mut reader = Reader::from_str(&flattened);
    let mut writer = Writer::new(Vec::with_capacity(flattened.len()));
    let mut open: Vec<String> = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            RtcError::decode(
                format!("xml token at byte {}: {e}", reader.buffer_position()),
                &flattened,
            )
        })?;

        let written = match event {
            Event::Start(start) => {
                let (name, canonical) = canonical_start(&start, &flattened)?;
                open.push(name);
                writer.write_event(Event::Start(canonical))
            }
            Event::Empty(start) => {
                let (_, canonical) = canonical_start(&start, &flattened)?;
                writer.write_event(Event::Empty(canonical))
            }
            Event::End(_) => {
                let name = open
                    .pop()
                    .ok_or_else(|| RtcError::decode("unbalanced closing tag", &flattened))?;
                writer.write_event(Event::End(BytesEnd::new(name)))
            }
            Event::Eof => break,
            other => writer.write_event(other),
        };
        written.map_err(|e| RtcError::decode(format!("rewrite: {e}"), &flattened))?;
    }

    if let Some(unclosed) = open.last() {
        return Err(RtcError::decode(
            format!("unclosed element <{unclosed}>"),
            &flattened,
        ));
    }

    String::from_utf8(writer.into_inner())
        .map_err(|_| RtcError::decode("rewritten payload is not UTF-8", &flattened))
}

/// Canonical element name and rebuilt start tag for `start`.
fn canonical_start(
    start: &BytesStart<'_>,
    payload: &str,
) -> Result<(String, BytesStart<'static>), RtcError> {
    let qname = start.name();
    let local = std::str::from_utf8(qname.local_name().into_inner())
        .map_err(|_| RtcError::decode("element name is not UTF-8", payload))?
        .to_string();

    let concrete = if local == POLYMORPHIC_ELEMENT {
        concrete_type(start, payload)?
    } else {
        None
    };
    let rewritten = concrete.is_some();
    let name = concrete.unwrap_or(local);

    let mut canonical = BytesStart::new(name.clone());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            RtcError::decode(format!("attribute of <{name}>: {e}"), payload)
        })?;
        if rewritten && attr.key.as_ref() == TYPE_ATTRIBUTE.as_bytes() {
            continue;
        }
        canonical.push_attribute(attr);
    }

    Ok((name, canonical))
}

/// Concrete type named by `xsi:type`, if the element carries one.
fn concrete_type(start: &BytesStart<'_>, payload: &str) -> Result<Option<String>, RtcError> {
    let attr = start
        .try_get_attribute(TYPE_ATTRIBUTE)
        .map_err(|e| RtcError::decode(format!("polymorphic marker: {e}"), payload))?;
    let Some(attr) = attr else {
        return Ok(None);
    };

    let declared = attr
        .unescape_value()
        .map_err(|e| RtcError::decode(format!("polymorphic marker: {e}"), payload))?;
    let concrete = declared.rsplit(':').next().unwrap_or_default().trim();

    if !is_element_name(concrete) {
        return Err(RtcError::decode(
            format!("polymorphic element <values xsi:type=\"{declared}\"> has no concrete type"),
            payload,
        ));
    }

    Ok(Some(concrete.to_string()))
}

fn is_element_name(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
