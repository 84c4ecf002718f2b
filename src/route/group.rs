//! Nested path prefixes used while walking the route tree.

use crate::naming::join_paths;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterGroup {
    prefix: String,
}

impl RouterGroup {
    pub fn root() -> Self {
        Self::default()
    }

    /// Child group; an empty segment adds no prefix.
    pub fn group(&self, segment: &str) -> Self {
        if segment.trim_matches('/').is_empty() {
            return self.clone();
        }
        Self {
            prefix: join_paths(&self.prefix, segment),
        }
    }

    pub fn prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    /// Absolute path of `relative` inside this group.
    pub fn absolute(&self, relative: &str) -> String {
        join_paths(&self.prefix, relative)
    }
}
