//! # Schema Bundle
//!
//! The per-route mapping from segments to schemas. Every field is
//! optional and absent segments are never validated.

use crate::segment::Segment;

/// Schemas for one route, one optional slot per segment.
///
/// Generic over the engine's compiled schema type.
#[derive(Debug, Clone)]
pub struct SchemaBundle<S> {
    /// Schema for route path parameters.
    pub params: Option<S>,
    /// Schema for request headers.
    pub headers: Option<S>,
    /// Schema for query parameters.
    pub query: Option<S>,
    /// Schema for plain cookies.
    pub cookies: Option<S>,
    /// Schema for signed cookies.
    pub signed_cookies: Option<S>,
    /// Schema for the request body.
    pub body: Option<S>,
}

impl<S> Default for SchemaBundle<S> {
    fn default() -> Self {
        Self {
            params: None,
            headers: None,
            query: None,
            cookies: None,
            signed_cookies: None,
            body: None,
        }
    }
}

impl<S> SchemaBundle<S> {
    /// An empty bundle: every request passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a schema for `segment`, replacing any previous one.
    pub fn with(mut self, segment: Segment, schema: S) -> Self {
        self.set(segment, schema);
        self
    }

    /// Declare a schema for `segment`, returning the previous one.
    pub fn set(&mut self, segment: Segment, schema: S) -> Option<S> {
        self.slot_mut(segment).replace(schema)
    }

    /// The schema declared for `segment`.
    pub fn get(&self, segment: Segment) -> Option<&S> {
        match segment {
            Segment::Params => self.params.as_ref(),
            Segment::Headers => self.headers.as_ref(),
            Segment::Query => self.query.as_ref(),
            Segment::Cookies => self.cookies.as_ref(),
            Segment::SignedCookies => self.signed_cookies.as_ref(),
            Segment::Body => self.body.as_ref(),
        }
    }

    /// Declared segments with their schemas, in validation order.
    pub fn declared(&self) -> impl Iterator<Item = (Segment, &S)> + '_ {
        Segment::ORDER
            .into_iter()
            .filter_map(move |segment| self.get(segment).map(|schema| (segment, schema)))
    }

    /// True if `segment` has a schema.
    pub fn declares(&self, segment: Segment) -> bool {
        self.get(segment).is_some()
    }

    /// True if no segment has a schema.
    pub fn is_empty(&self) -> bool {
        self.declared().next().is_none()
    }

    /// Apply `f` to every declared schema.
    pub fn try_map<T, E>(
        self,
        mut f: impl FnMut(Segment, S) -> Result<T, E>,
    ) -> Result<SchemaBundle<T>, E> {
        let mut out = SchemaBundle::new();
        for (segment, slot) in self.into_slots() {
            if let Some(schema) = slot {
                out.set(segment, f(segment, schema)?);
            }
        }
        Ok(out)
    }

    fn slot_mut(&mut self, segment: Segment) -> &mut Option<S> {
        match segment {
            Segment::Params => &mut self.params,
            Segment::Headers => &mut self.headers,
            Segment::Query => &mut self.query,
            Segment::Cookies => &mut self.cookies,
            Segment::SignedCookies => &mut self.signed_cookies,
            Segment::Body => &mut self.body,
        }
    }

    fn into_slots(self) -> [(Segment, Option<S>); 6] {
        [
            (Segment::Params, self.params),
            (Segment::Headers, self.headers),
            (Segment::Query, self.query),
            (Segment::Cookies, self.cookies),
            (Segment::SignedCookies, self.signed_cookies),
            (Segment::Body, self.body),
        ]
    }
}
