//! Record stream decoding.
//!
//! One marshalled invocation produces a stream of self-delimiting JSON
//! dictionaries on stdout, one per logical server response unit. The
//! decoder walks that stream in a single forward pass: each dictionary
//! becomes a flat string-to-string [`Record`], a literal `null` marks a
//! clean logical end, and anything that fails to decode terminates the
//! stream with [`Error::Decode`] carrying whatever was captured first.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::Error;

/// One decoded key-value unit from the tool's structured output stream.
///
/// Field order is irrelevant; values may contain embedded newlines
/// (multi-line spec fields). Immutable once decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Record(HashMap<String, String>);

impl Record {
    /// Look up a field value.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(field, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

impl From<HashMap<String, String>> for Record {
    fn from(fields: HashMap<String, String>) -> Self {
        Record(fields)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Decode a captured stdout buffer into its record sequence.
///
/// Terminates on clean end-of-stream or on an explicit `null` sentinel,
/// whichever comes first. Malformed data past M good records yields
/// [`Error::Decode`] with those M records in its `partial` field, never
/// silently fewer.
pub fn decode_records(input: &[u8]) -> Result<Vec<Record>, Error> {
    let mut records = Vec::new();
    let mut stream = serde_json::Deserializer::from_slice(input).into_iter::<Option<Record>>();
    loop {
        match stream.next() {
            None => break,
            Some(Ok(Some(record))) => records.push(record),
            // Explicit nil object: clean logical end of the stream.
            Some(Ok(None)) => break,
            Some(Err(err)) => {
                let offset = stream.byte_offset();
                return Err(Error::Decode {
                    detail: err.to_string(),
                    offset,
                    snippet: snippet_at(input, offset),
                    partial: records,
                });
            }
        }
    }
    Ok(records)
}

const SNIPPET_LEN: usize = 32;

fn snippet_at(input: &[u8], offset: usize) -> String {
    let tail = &input[offset.min(input.len())..];
    let end = tail.len().min(SNIPPET_LEN);
    String::from_utf8_lossy(&tail[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(records: &[Record]) -> Vec<u8> {
        let mut out = Vec::new();
        for r in records {
            serde_json::to_writer(&mut out, &r.0).unwrap();
            out.push(b'\n');
        }
        out
    }

    fn sample(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                [
                    ("code".to_string(), "stat".to_string()),
                    ("change".to_string(), (1000 + i).to_string()),
                    ("desc".to_string(), format!("change {i}\nsecond line")),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    #[test]
    fn test_decode_round_trip_preserves_order() {
        let original = sample(5);
        let decoded = decode_records(&encode(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_empty_input() {
        assert_eq!(decode_records(b"").unwrap(), Vec::<Record>::new());
        assert_eq!(decode_records(b"  \n").unwrap(), Vec::<Record>::new());
    }

    #[test]
    fn test_null_sentinel_ends_stream() {
        let mut input = encode(&sample(2));
        input.extend_from_slice(b"null\n");
        input.extend_from_slice(br#"{"code":"stat","change":"9999"}"#);
        let decoded = decode_records(&input).unwrap();
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn test_truncated_stream_keeps_partial_records() {
        let mut input = encode(&sample(3));
        input.extend_from_slice(br#"{"code":"stat","chan"#);
        match decode_records(&input) {
            Err(Error::Decode {
                partial, snippet, ..
            }) => {
                assert_eq!(partial.len(), 3);
                assert!(snippet.contains(r#"{"code":"stat","chan"#), "snippet: {snippet}");
            }
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_interleaved_after_records() {
        // Human-readable text dumped mid-stream, the expired-credential shape.
        let mut input = encode(&sample(1));
        input.extend_from_slice(b"Your session has expired, please login again.\n");
        match decode_records(&input) {
            Err(Error::Decode {
                partial, snippet, ..
            }) => {
                assert_eq!(partial.len(), 1);
                assert_eq!(partial[0].get("change"), Some("1000"));
                assert!(snippet.contains("Your session"), "snippet: {snippet}");
            }
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_value_is_a_decode_error() {
        let input = br#"{"code":"stat","change":42}"#;
        assert!(matches!(
            decode_records(input),
            Err(Error::Decode { partial, .. }) if partial.is_empty()
        ));
    }
}
