//! Filter tree and its fluent builder.
//!
//! A filter tree is an ordered list of entries. Each entry is a group of
//! attribute conditions (AND-ed together), a nested tree, or an `OR` marker.
//! Adjacent entries without a marker between them are AND-ed; AND binds
//! tighter than OR, matching the store's expression language.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UsageError;

use super::condition::Condition;

/// Maximum number of segments in a nested attribute path.
pub const MAX_PATH_SEGMENTS: usize = 4;

/// Separator between nested attribute path segments.
pub const PATH_SEPARATOR: char = '.';

/// A validated attribute path of 1 to 4 segments (`address.city`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    pub fn parse(path: &str) -> Result<Self, UsageError> {
        let segments: Vec<String> = path.split(PATH_SEPARATOR).map(str::to_string).collect();
        if segments.len() > MAX_PATH_SEGMENTS || segments.iter().any(String::is_empty) {
            return Err(UsageError::InvalidPath(path.to_string()));
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The top-level attribute the path starts from.
    pub fn root(&self) -> &str {
        &self.0[0]
    }

    /// Whether the path names a top-level attribute (the only kind that can
    /// be a key attribute).
    pub fn is_top_level(&self) -> bool {
        self.0.len() == 1
    }
}

impl TryFrom<String> for AttributePath {
    type Error = UsageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AttributePath::parse(&value)
    }
}

impl From<AttributePath> for String {
    fn from(path: AttributePath) -> Self {
        path.to_string()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Attribute conditions that are implicitly AND-ed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub conditions: Vec<(AttributePath, Condition)>,
}

/// One entry of a filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entry {
    Group(Group),
    Nested(FilterTree),
    Or,
}

/// Position of a condition inside a root-level group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermId {
    pub entry: usize,
    pub condition: usize,
}

/// A condition that every matching item must satisfy.
#[derive(Debug, Clone, Copy)]
pub struct Term<'a> {
    pub id: TermId,
    pub path: &'a AttributePath,
    pub condition: &'a Condition,
}

/// A finished filter tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterTree {
    entries: Vec<Entry>,
}

impl FilterTree {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the root level contains an `OR` marker.
    pub fn has_or(&self) -> bool {
        self.entries.iter().any(|e| matches!(e, Entry::Or))
    }

    /// Root-level conditions that are unconditional AND terms.
    ///
    /// With any `OR` at the root, every root entry sits in a disjunct and
    /// none is unconditional. Conditions inside nested trees never qualify.
    pub fn unconditional_terms(&self) -> Vec<Term<'_>> {
        if self.has_or() {
            return Vec::new();
        }
        let mut terms = Vec::new();
        for (entry_idx, entry) in self.entries.iter().enumerate() {
            if let Entry::Group(group) = entry {
                for (cond_idx, (path, condition)) in group.conditions.iter().enumerate() {
                    terms.push(Term {
                        id: TermId {
                            entry: entry_idx,
                            condition: cond_idx,
                        },
                        path,
                        condition,
                    });
                }
            }
        }
        terms
    }

    /// Visit every condition in the tree, depth first.
    pub fn for_each_condition<E>(
        &self,
        f: &mut impl FnMut(&AttributePath, &Condition) -> Result<(), E>,
    ) -> Result<(), E> {
        for entry in &self.entries {
            match entry {
                Entry::Group(group) => {
                    for (path, condition) in &group.conditions {
                        f(path, condition)?;
                    }
                }
                Entry::Nested(tree) => tree.for_each_condition(f)?,
                Entry::Or => {}
            }
        }
        Ok(())
    }
}

/// Fluent builder for a [`FilterTree`].
///
/// Builder methods never fail; the first invalid path is remembered and
/// reported by [`FilterBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    entries: Vec<Entry>,
    error: Option<UsageError>,
}

impl FilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single-attribute condition. A bare value means equality.
    pub fn filter(self, path: &str, condition: impl Into<Condition>) -> Self {
        self.filter_all([(path, condition.into())])
    }

    /// Add several attribute conditions as one AND-ed group.
    pub fn filter_all<'p>(mut self, conditions: impl IntoIterator<Item = (&'p str, Condition)>) -> Self {
        let mut group = Vec::new();
        for (path, condition) in conditions {
            match AttributePath::parse(path) {
                Ok(path) => group.push((path, condition)),
                Err(e) => {
                    self.error.get_or_insert(e);
                }
            }
        }
        if !group.is_empty() {
            self.entries.push(Entry::Group(Group { conditions: group }));
        }
        self
    }

    /// Start a new OR boundary. Ignored at the start of the tree and after
    /// another marker.
    pub fn or(mut self) -> Self {
        if matches!(self.entries.last(), Some(entry) if !matches!(entry, Entry::Or)) {
            self.entries.push(Entry::Or);
        }
        self
    }

    /// No-op; adjacent entries are AND-ed already.
    pub fn and(self) -> Self {
        self
    }

    /// Build a nested group with an isolated child builder and splice its
    /// tree in as one entry.
    pub fn group(mut self, build: impl FnOnce(FilterBuilder) -> FilterBuilder) -> Self {
        let child = build(FilterBuilder::new());
        match child.build() {
            Ok(tree) if !tree.is_empty() => self.entries.push(Entry::Nested(tree)),
            Ok(_) => {}
            Err(e) => {
                self.error.get_or_insert(e);
            }
        }
        self
    }

    pub fn build(mut self) -> Result<FilterTree, UsageError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if matches!(self.entries.last(), Some(Entry::Or)) {
            self.entries.pop();
        }
        Ok(FilterTree {
            entries: self.entries,
        })
    }
}
