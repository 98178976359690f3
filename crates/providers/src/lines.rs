//! Shared line-draining for streaming response bodies.
//!
//! Ollama streams newline-delimited JSON. Chunk boundaries do not respect
//! line boundaries, so the reader buffers raw bytes and drains complete
//! lines, leaving any trailing partial line for the next chunk.

/// Pull complete lines out of `buffer`, draining consumed bytes in place.
/// Blank lines are skipped; a trailing partial line stays buffered.
pub(crate) fn drain_complete_lines(buffer: &mut String) -> Vec<String> {
    let mut lines = Vec::new();

    while let Some(pos) = buffer.find('\n') {
        let line: String = buffer.drain(..pos).collect();
        buffer.drain(..1); // the newline itself
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_single_complete_line() {
        let mut buf = String::from("{\"a\":1}\n");
        assert_eq!(drain_complete_lines(&mut buf), vec!["{\"a\":1}"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_line_stays_in_buffer() {
        let mut buf = String::from("{\"a\":1}\n{\"b\":");
        assert_eq!(drain_complete_lines(&mut buf), vec!["{\"a\":1}"]);
        assert_eq!(buf, "{\"b\":");
    }

    #[test]
    fn incremental_buffering() {
        let mut buf = String::from("{\"b\":");
        assert!(drain_complete_lines(&mut buf).is_empty());
        buf.push_str("2}\n");
        assert_eq!(drain_complete_lines(&mut buf), vec!["{\"b\":2}"]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut buf = String::from("\n\n{\"a\":1}\n  \n");
        assert_eq!(drain_complete_lines(&mut buf), vec!["{\"a\":1}"]);
    }
}
