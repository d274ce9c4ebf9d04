//! # Request Segments
//!
//! Defines the `Segment` enum: the six independently validated parts of
//! an incoming request. This is the one definition shared by the bundle,
//! the validation pass, the normalized error and the HTTP adapter. Every
//! `match` on `Segment` is exhaustive, so adding a segment forces every
//! consumer to handle it.
//!
//! ## Ordering Invariant
//!
//! Declared segments are always validated in [`Segment::ORDER`]. When more
//! than one segment would fail, the one that comes first in this order is
//! the one reported.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// A named part of an incoming request.
///
/// | # | Segment | Request source |
/// |---|---------|----------------|
/// | 1 | Params | Route path parameters |
/// | 2 | Headers | Header map, lower-case names |
/// | 3 | Query | Decoded query string |
/// | 4 | Cookies | Unsigned cookies |
/// | 5 | SignedCookies | Cookies whose signature verifies |
/// | 6 | Body | Parsed request body |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Route path parameters.
    Params,
    /// Request headers.
    Headers,
    /// Query string parameters.
    Query,
    /// Plain cookies.
    Cookies,
    /// Signed cookies, present only when the signature verifies.
    #[serde(alias = "signedCookies")]
    SignedCookies,
    /// Request body.
    Body,
}

/// Total number of request segments.
pub const SEGMENT_COUNT: usize = 6;

impl Segment {
    /// All segments in validation order.
    pub const ORDER: [Segment; SEGMENT_COUNT] = [
        Self::Params,
        Self::Headers,
        Self::Query,
        Self::Cookies,
        Self::SignedCookies,
        Self::Body,
    ];

    /// Returns the snake_case identifier for this segment.
    ///
    /// Matches the serde representation and the key used for this segment
    /// in the validation context.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Params => "params",
            Self::Headers => "headers",
            Self::Query => "query",
            Self::Cookies => "cookies",
            Self::SignedCookies => "signed_cookies",
            Self::Body => "body",
        }
    }

    /// Position of this segment in [`Segment::ORDER`].
    pub fn position(&self) -> usize {
        match self {
            Self::Params => 0,
            Self::Headers => 1,
            Self::Query => 2,
            Self::Cookies => 3,
            Self::SignedCookies => 4,
            Self::Body => 5,
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = CoreError;

    /// Parse a segment from its identifier.
    ///
    /// Accepts the identifiers produced by [`Segment::as_str()`] plus the
    /// `signedCookies` and `signed-cookies` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "params" => Ok(Self::Params),
            "headers" => Ok(Self::Headers),
            "query" => Ok(Self::Query),
            "cookies" => Ok(Self::Cookies),
            "signed_cookies" | "signedCookies" | "signed-cookies" => Ok(Self::SignedCookies),
            "body" => Ok(Self::Body),
            other => Err(CoreError::UnknownSegment(other.to_string())),
        }
    }
}
