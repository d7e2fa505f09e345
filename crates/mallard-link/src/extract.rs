//! Incremental extraction of structured values from a chunked byte stream.
//!
//! The console emits JSON values on its output channel, but chunk
//! boundaries fall wherever the pipe buffers happen to cut. This scanner
//! carries its state across chunks and yields each top-level object or
//! array as soon as its closing delimiter is seen. Bytes between values
//! (newlines, prompts, stray noise) are discarded.

use bytes::Bytes;

/// Resumable scanner over output-channel bytes.
///
/// Feed arbitrary chunks through [`ValueExtractor::push_chunk`]; complete
/// top-level values come back in order, independent of how the bytes were
/// chunked. An unterminated value at end of stream is simply never
/// emitted; deciding that no more data is coming is the driver's job, not
/// this scanner's.
#[derive(Debug, Default)]
pub struct ValueExtractor {
    span: Vec<u8>,
    depth: usize,
    in_string: bool,
    escape_pending: bool,
}

impl ValueExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan one chunk, returning every value completed within it.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        let mut completed = Vec::new();

        for &byte in chunk {
            if self.depth == 0 {
                // Only an opening delimiter starts a span; everything else
                // at top level is inter-value noise.
                if byte == b'{' || byte == b'[' {
                    self.span.clear();
                    self.span.push(byte);
                    self.depth = 1;
                }
                continue;
            }

            self.span.push(byte);

            if self.in_string {
                if self.escape_pending {
                    self.escape_pending = false;
                } else if byte == b'\\' {
                    self.escape_pending = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        completed.push(Bytes::from(std::mem::take(&mut self.span)));
                    }
                },
                _ => {},
            }
        }

        completed
    }

    /// Whether a value has been opened but not yet closed.
    pub fn has_partial(&self) -> bool {
        self.depth > 0
    }

    /// Drop any partial span and return to the initial state.
    pub fn reset(&mut self) {
        self.span.clear();
        self.depth = 0;
        self.in_string = false;
        self.escape_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::ValueExtractor;

    fn collect_all(chunks: &[&[u8]]) -> Vec<Vec<u8>> {
        let mut extractor = ValueExtractor::new();
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(extractor.push_chunk(chunk).into_iter().map(|b| b.to_vec()));
        }
        out
    }

    #[test]
    fn extracts_whole_value_from_one_chunk() {
        let values = collect_all(&[br#"[{"a":1}]"#]);
        assert_eq!(values, vec![br#"[{"a":1}]"#.to_vec()]);
    }

    #[test]
    fn discards_inter_value_noise() {
        let values = collect_all(&[b"\n\n[1,2]\nnoise here\n{\"k\":3}\n"]);
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], b"[1,2]");
        assert_eq!(values[1], b"{\"k\":3}");
    }

    #[test]
    fn chunk_boundary_invariant_at_every_split_point() {
        let payload = br#"[{"name":"a\"b","n":[1,{"x":2}]},{"name":null}]"#;
        let whole = collect_all(&[payload]);
        assert_eq!(whole.len(), 1);

        for split in 1..payload.len() {
            let (left, right) = payload.split_at(split);
            let parts = collect_all(&[left, right]);
            assert_eq!(parts, whole, "split at {split}");
        }
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let values = collect_all(&[br#"[{"s":"}]\"}]"}]"#]);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn brackets_inside_strings_are_ignored() {
        let values = collect_all(&[br#"{"s":"[{]}"}"#]);
        assert_eq!(values, vec![br#"{"s":"[{]}"}"#.to_vec()]);
    }

    #[test]
    fn unterminated_value_is_never_emitted() {
        let mut extractor = ValueExtractor::new();
        assert!(extractor.push_chunk(b"[{\"a\":").is_empty());
        assert!(extractor.has_partial());
    }

    #[test]
    fn reset_drops_partial_span() {
        let mut extractor = ValueExtractor::new();
        extractor.push_chunk(b"[1, 2");
        extractor.reset();
        let values = extractor.push_chunk(b"[3]");
        assert_eq!(values.len(), 1);
        assert_eq!(&values[0][..], b"[3]");
    }

    #[test]
    fn round_trips_concatenated_values() {
        let first = collect_all(&[b"[1]", b"{\"a\":[2,3]}", b"[{\"b\":4}]"]);
        let concatenated: Vec<u8> = first.concat();

        // Re-feed the concatenated bytes in awkward 3-byte chunks.
        let rechunked: Vec<&[u8]> = concatenated.chunks(3).collect();
        let second = collect_all(&rechunked);
        assert_eq!(first, second);
    }
}
