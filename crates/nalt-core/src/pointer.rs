use std::fmt;

use serde_json::Value;

/// One step of a [`Pointer`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// JSON-pointer style locator (`/entries/2/moods/0/intensity`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    segments: Vec<Segment>,
}

impl Pointer {
    /// The document root (renders as the empty string).
    pub fn root() -> Self {
        Self::default()
    }

    /// A child pointer one object key deeper.
    pub fn key(&self, key: &str) -> Self {
        let mut child = self.clone();
        child.segments.push(Segment::Key(key.to_string()));
        child
    }

    /// A child pointer one array index deeper.
    pub fn index(&self, index: usize) -> Self {
        let mut child = self.clone();
        child.segments.push(Segment::Index(index));
        child
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Position of this pointer in document order.
    ///
    /// Array indices map to themselves and object keys to their position in
    /// the parent object. Segments that do not resolve sort after every
    /// present sibling. Comparing two keys gives document order, with a
    /// parent ordered before its children.
    pub fn order_key(&self, document: &Value) -> Vec<usize> {
        let mut key = Vec::with_capacity(self.segments.len());
        let mut current = Some(document);

        for segment in &self.segments {
            let (position, next) = match (segment, current) {
                (Segment::Key(name), Some(Value::Object(map))) => {
                    match map.keys().position(|candidate| candidate == name) {
                        Some(position) => (position, map.get(name)),
                        None => (usize::MAX, None),
                    }
                }
                (Segment::Index(index), Some(Value::Array(items))) => (*index, items.get(*index)),
                (Segment::Index(index), _) => (*index, None),
                (Segment::Key(_), _) => (usize::MAX, None),
            };
            key.push(position);
            current = next;
        }

        key
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Key(key) => write!(f, "/{}", key.replace('~', "~0").replace('/', "~1"))?,
                Segment::Index(index) => write!(f, "/{index}")?,
            }
        }
        Ok(())
    }
}
