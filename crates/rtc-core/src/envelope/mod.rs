//! Response envelope decoding: normalize, then deserialize.

mod model;
mod normalize;

pub use model::{
    Attribute, AttributeValue, AttributeValuesDto, Body, Envelope, Header, IterationDto, Link,
    LinkTarget, LinkType, ReleaseDto, Response, ReturnValue, Row, Value, WorkItemDto,
    WorkItemSummaryDto,
};
pub use normalize::normalize;

use crate::error::RtcError;

/// Decode a raw response body into an [`Envelope`].
///
/// # Errors
///
/// Returns [`RtcError::Decode`] when the body is not UTF-8, when the
/// polymorphic rewrite fails, or when the canonical XML does not fit the
/// envelope shape.
pub fn decode(raw: &[u8]) -> Result<Envelope, RtcError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| RtcError::decode(format!("response body ({e})"), &String::from_utf8_lossy(raw)))?;
    let canonical = normalize(text)?;
    quick_xml::de::from_str::<Envelope>(&canonical)
        .map_err(|e| RtcError::decode(format!("envelope: {e}"), &canonical))
}
