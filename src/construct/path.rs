//! Path-qualified construct identifiers

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{Result, invalid_construct_name};
use crate::hash::short_hash;

/// Separator between path components
pub const PATH_SEPARATOR: char = '/';

/// Root-to-node sequence of construct names
///
/// The root of the tree has an empty path. Every other node's path is its
/// parent's path plus its own name, so a path is unique within a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstructPath(Vec<String>);

impl ConstructPath {
    /// The empty path of the tree root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a `/`-separated path
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim_matches(PATH_SEPARATOR);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut parts = Vec::new();
        for part in trimmed.split(PATH_SEPARATOR) {
            validate_name(part)?;
            parts.push(part.to_string());
        }
        Ok(Self(parts))
    }

    /// Path of a child named `name`
    pub fn child(&self, name: &str) -> Result<Self> {
        validate_name(name)?;
        let mut parts = self.0.clone();
        parts.push(name.to_string());
        Ok(Self(parts))
    }

    pub fn join(&self, relative: &ConstructPath) -> Self {
        let mut parts = self.0.clone();
        parts.extend(relative.0.iter().cloned());
        Self(parts)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Last component, empty for the root
    pub fn name(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn starts_with(&self, prefix: &ConstructPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Components after `prefix`, if `prefix` is an ancestor
    pub fn strip_prefix(&self, prefix: &ConstructPath) -> Option<Self> {
        self.0
            .strip_prefix(prefix.0.as_slice())
            .map(|rest| Self(rest.to_vec()))
    }

    /// Logical id: alphanumeric path components followed by a short hash of the full path
    ///
    /// ```text
    /// Website/Site-Bucket/Resource → WebsiteSiteBucketResource1A2B3C4D
    /// ```
    pub fn logical_id(&self) -> String {
        let human: String = self
            .0
            .iter()
            .flat_map(|part| part.chars())
            .filter(char::is_ascii_alphanumeric)
            .collect();
        format!("{}{}", human, short_hash(&self.0))
    }

    /// Components joined with `-`, suitable for artifact file names
    pub fn dashed(&self) -> String {
        self.0.join("-")
    }
}

impl fmt::Display for ConstructPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("/"))
        }
    }
}

impl Serialize for ConstructPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.join("/"))
    }
}

/// Validate a single construct name
///
/// Names must be non-empty and must not contain the path separator.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid_construct_name(name, "name cannot be empty"));
    }
    if name.contains(PATH_SEPARATOR) {
        return Err(invalid_construct_name(
            name,
            format!("name cannot contain '{PATH_SEPARATOR}'"),
        ));
    }
    if name.trim() != name {
        return Err(invalid_construct_name(
            name,
            "name cannot start or end with whitespace",
        ));
    }
    Ok(())
}
