//! Documents and batches.
//!
//! A document is one line of input, kept as an opaque string. Its JSON is
//! never parsed; it is spliced verbatim into the request body.

/// Returns true when the document holds nothing but whitespace.
pub fn is_blank(doc: &str) -> bool {
    doc.trim().is_empty()
}

/// Strip the line terminator and trailing whitespace from an input line.
///
/// Returns `None` for blank lines, which are never indexed.
pub fn normalize_line(line: &str) -> Option<&str> {
    let trimmed = line.trim_end();
    if is_blank(trimmed) {
        None
    } else {
        Some(trimmed)
    }
}

/// An ordered group of documents owned by a single worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    docs: Vec<String>,
}

impl Batch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty batch with room for `capacity` documents.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            docs: Vec::with_capacity(capacity),
        }
    }

    /// Append a document, keeping arrival order.
    pub fn push(&mut self, doc: impl Into<String>) {
        self.docs.push(doc.into());
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Borrow the documents in order.
    pub fn docs(&self) -> &[String] {
        &self.docs
    }

    /// Consume the batch, returning its documents.
    pub fn into_docs(self) -> Vec<String> {
        self.docs
    }

    /// Drop whitespace-only documents. Applying it twice is a no-op.
    pub fn retain_non_blank(&mut self) {
        self.docs.retain(|doc| !is_blank(doc));
    }

    /// Render the request body: a JSON array of the documents, newline terminated.
    ///
    /// Documents are inserted as-is, so `["{\"a\":1}", "{\"b\":2}"]` becomes
    /// `[{"a":1},{"b":2}]\n`.
    pub fn to_payload(&self) -> String {
        let size: usize = self.docs.iter().map(|d| d.len() + 1).sum::<usize>() + 2;
        let mut payload = String::with_capacity(size);
        payload.push('[');
        for (i, doc) in self.docs.iter().enumerate() {
            if i > 0 {
                payload.push(',');
            }
            payload.push_str(doc);
        }
        payload.push_str("]\n");
        payload
    }
}

impl From<Vec<String>> for Batch {
    fn from(docs: Vec<String>) -> Self {
        Self { docs }
    }
}

impl FromIterator<String> for Batch {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            docs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(docs: &[&str]) -> Batch {
        docs.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("  \t "));
        assert!(!is_blank(r#"{"id":"1"}"#));
    }

    #[test]
    fn test_normalize_line() {
        assert_eq!(normalize_line("{\"id\":1}\r\n"), Some("{\"id\":1}"));
        assert_eq!(normalize_line("  {\"id\":1}  "), Some("  {\"id\":1}"));
        assert_eq!(normalize_line("   \n"), None);
        assert_eq!(normalize_line(""), None);
    }

    #[test]
    fn test_payload_format() {
        let b = batch(&[r#"{"id":"1"}"#, r#"{"id":"2"}"#]);
        assert_eq!(b.to_payload(), "[{\"id\":\"1\"},{\"id\":\"2\"}]\n");
    }

    #[test]
    fn test_payload_is_verbatim() {
        // Documents are not re-encoded, even if the whitespace is unusual.
        let b = batch(&[r#"{ "id" : "1" }"#]);
        assert_eq!(b.to_payload(), "[{ \"id\" : \"1\" }]\n");
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(Batch::new().to_payload(), "[]\n");
    }

    #[test]
    fn test_retain_non_blank_keeps_order() {
        let mut b = batch(&[r#"{"id":"1"}"#, "", "  ", r#"{"id":"2"}"#]);
        b.retain_non_blank();
        assert_eq!(b.docs(), &[r#"{"id":"1"}"#, r#"{"id":"2"}"#]);

        let before = b.clone();
        b.retain_non_blank();
        assert_eq!(b, before);
    }

    #[test]
    fn test_payload_parses_as_json_array() {
        let b = batch(&[r#"{"id":"1","title":"a, b"}"#, r#"{"id":"2"}"#]);
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&b.to_payload()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["title"], "a, b");
    }
}
