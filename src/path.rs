//! Path normalization for slash-delimited collection paths.

/// An ordered sequence of non-empty names derived from a slash-delimited path.
///
/// Leading, trailing, and repeated separators are discarded, so
/// `"///a//b/"` and `"a/b"` normalize to the same key. A `PathKey` may be
/// empty; mutation operations reject empty keys, read operations treat them
/// as addressing the collection root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathKey {
    segments: Vec<String>,
}

impl PathKey {
    /// Split a raw path string into segments. Never fails.
    pub fn normalize(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Rejoin the segments with `/`. Normalizing the result yields the same key.
    pub fn join(&self) -> String {
        self.segments.join("/")
    }
}

impl std::fmt::Display for PathKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.join())
    }
}
