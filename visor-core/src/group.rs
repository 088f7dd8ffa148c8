//! Suggestions for one document, bucketed by position.

use crate::error::{Error, Result};
use crate::offset::Offset;
use crate::suggestion::{Suggestion, SuggestionId};
use std::collections::BTreeMap;

/// All suggestions proposed for one document, organized by position.
///
/// Buckets are ordered by offset, so [`SuggestionGroup::overlapping`] only
/// visits buckets that begin before the end of the query. Order inside a
/// bucket carries no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionGroup {
    document: String,
    buckets: BTreeMap<Offset, Vec<Suggestion>>,
    len: usize,
}

impl SuggestionGroup {
    /// Empty group for `document`.
    #[must_use]
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    /// Group built from `suggestions`, all of which must belong to `document`.
    pub fn from_suggestions(
        document: impl Into<String>,
        suggestions: impl IntoIterator<Item = Suggestion>,
    ) -> Result<Self> {
        let mut group = Self::new(document);
        for suggestion in suggestions {
            group.push(suggestion)?;
        }
        Ok(group)
    }

    /// Document the group belongs to.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Add a suggestion.
    ///
    /// # Errors
    ///
    /// [`Error::DocumentMismatch`] if the suggestion targets another document.
    pub fn push(&mut self, suggestion: Suggestion) -> Result<()> {
        if suggestion.document_name() != self.document {
            return Err(Error::document_mismatch(
                &self.document,
                suggestion.document_name(),
            ));
        }
        self.buckets
            .entry(suggestion.position())
            .or_default()
            .push(suggestion);
        self.len += 1;
        Ok(())
    }

    /// Number of suggestions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if there are no suggestions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All suggestions, by position.
    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.buckets.values().flatten()
    }

    /// All suggestions, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Suggestion> {
        self.buckets.values_mut().flatten()
    }

    /// Distinct positions, ascending.
    pub fn positions(&self) -> impl Iterator<Item = Offset> + '_ {
        self.buckets.keys().copied()
    }

    /// Suggestions at exactly `offset`.
    #[must_use]
    pub fn at(&self, offset: Offset) -> &[Suggestion] {
        self.buckets.get(&offset).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Suggestions whose position overlaps `range`.
    pub fn overlapping(&self, range: Offset) -> impl Iterator<Item = &Suggestion> {
        self.buckets
            .range(..Self::upper_bound(range))
            .filter(move |(position, _)| position.overlaps(&range))
            .flat_map(|(_, bucket)| bucket.iter())
    }

    /// Suggestions whose position overlaps `range`, mutably.
    pub fn overlapping_mut(&mut self, range: Offset) -> impl Iterator<Item = &mut Suggestion> {
        self.buckets
            .range_mut(..Self::upper_bound(range))
            .filter(move |(position, _)| position.overlaps(&range))
            .flat_map(|(_, bucket)| bucket.iter_mut())
    }

    // Every position overlapping `range` begins before `range.end()`; the
    // point offset at `range.end()` sorts before all positions starting there.
    fn upper_bound(range: Offset) -> Offset {
        Offset::point(range.end())
    }

    /// Currently visible suggestions.
    pub fn visible(&self) -> impl Iterator<Item = &Suggestion> {
        self.iter().filter(|s| s.is_visible())
    }

    /// Currently hidden suggestions.
    pub fn hidden(&self) -> impl Iterator<Item = &Suggestion> {
        self.iter().filter(|s| !s.is_visible())
    }

    /// Look up by id.
    #[must_use]
    pub fn get(&self, id: SuggestionId) -> Option<&Suggestion> {
        self.iter().find(|s| s.id() == id)
    }

    /// Look up by id, mutably.
    pub fn get_mut(&mut self, id: SuggestionId) -> Option<&mut Suggestion> {
        self.iter_mut().find(|s| s.id() == id)
    }

    /// Keep only suggestions matching `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Suggestion) -> bool) {
        for bucket in self.buckets.values_mut() {
            bucket.retain(|s| keep(s));
        }
        self.buckets.retain(|_, bucket| !bucket.is_empty());
        self.len = self.buckets.values().map(Vec::len).sum();
    }
}

impl<'a> IntoIterator for &'a SuggestionGroup {
    type Item = &'a Suggestion;
    type IntoIter = Box<dyn Iterator<Item = &'a Suggestion> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
