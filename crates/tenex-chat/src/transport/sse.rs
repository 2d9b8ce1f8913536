//! Server-sent event frame decoding.
//!
//! The chat stream is a sequence of newline separated lines. Only lines that
//! start with `data: ` carry a payload; everything else (blank separators,
//! `event:` or comment lines) is ignored. A payload is either the literal
//! `[DONE]` sentinel or a JSON encoded [`StreamingChunk`].

use tenex_shared::StreamingChunk;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// A meaningful frame decoded from one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    Chunk(StreamingChunk),
    /// The `[DONE]` sentinel; no further frames should be read.
    Done,
}

impl SseFrame {
    /// Whether this frame ends the stream.
    pub fn is_terminal(&self) -> bool {
        match self {
            SseFrame::Chunk(chunk) => chunk.is_complete,
            SseFrame::Done => true,
        }
    }

    /// The chunk delivered to consumers for this frame.
    pub fn into_chunk(self) -> StreamingChunk {
        match self {
            SseFrame::Chunk(chunk) => chunk,
            SseFrame::Done => StreamingChunk::completion(),
        }
    }
}

/// Parse a single line. Returns `None` for lines that carry no frame and for
/// payloads that are not valid chunk JSON.
pub fn parse_frame(line: &str) -> Option<SseFrame> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?;

    if payload.trim() == DONE_SENTINEL {
        return Some(SseFrame::Done);
    }
    if payload.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<StreamingChunk>(payload) {
        Ok(chunk) => Some(SseFrame::Chunk(chunk)),
        Err(error) => {
            tracing::warn!(%error, payload, "Dropping malformed stream frame");
            None
        }
    }
}

/// Incremental line splitter over raw body bytes.
///
/// Bytes are buffered until a newline arrives so that a line (and any
/// multi-byte character in it) split across reads is decoded whole.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Leading bytes of `buffer` already known to hold no newline.
    scanned: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read from the body and return the frames of every line it
    /// completed, in order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;
        while let Some(offset) = self.buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            let line = String::from_utf8_lossy(&self.buffer[start..end]);
            if let Some(frame) = parse_frame(&line) {
                frames.push(frame);
            }
            start = end + 1;
            search_from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        frames
    }

    /// Decode whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        parse_frame(&String::from_utf8_lossy(&rest))
    }

    /// Bytes of an incomplete line still waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str) -> SseFrame {
        SseFrame::Chunk(StreamingChunk::content(content))
    }

    #[test]
    fn parses_data_line() {
        let frame = parse_frame(r#"data: {"id":"c1","content":"Hi","isComplete":false}"#);
        assert_eq!(
            frame,
            Some(SseFrame::Chunk(StreamingChunk::content("Hi").with_id("c1")))
        );
    }

    #[test]
    fn done_sentinel_is_terminal() {
        let frame = parse_frame("data: [DONE]").unwrap();
        assert!(frame.is_terminal());
        assert_eq!(frame.into_chunk(), StreamingChunk::completion());
    }

    #[test]
    fn ignores_lines_without_data_prefix() {
        assert_eq!(parse_frame(""), None);
        assert_eq!(parse_frame(": keep-alive"), None);
        assert_eq!(parse_frame("event: message"), None);
        assert_eq!(parse_frame(r#"data:{"isComplete":true}"#), None);
    }

    #[test]
    fn drops_malformed_json() {
        assert_eq!(parse_frame("data: {not json"), None);
        assert_eq!(parse_frame("data: "), None);
    }

    #[test]
    fn strips_carriage_return() {
        let frame = parse_frame("data: {\"content\":\"a\",\"isComplete\":false}\r");
        assert_eq!(frame, Some(chunk("a")));
    }

    #[test]
    fn decoder_joins_lines_split_across_reads() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"content\":\"He").is_empty());
        assert!(decoder.pending() > 0);

        let frames = decoder.push(b"llo\",\"isComplete\":false}\n\ndata: [DONE]\n");
        assert_eq!(frames, vec![chunk("Hello"), SseFrame::Done]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn decoder_keeps_multibyte_characters_intact() {
        let line = "data: {\"content\":\"héllo\",\"isComplete\":false}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&line[..split]).is_empty());
        assert_eq!(decoder.push(&line[split..]), vec![chunk("héllo")]);
    }

    #[test]
    fn malformed_frame_does_not_hide_later_frames() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(
            b"data: {\"content\":\"a\",\"isComplete\":false}\n\
              data: {oops}\n\
              data: {\"content\":\"b\",\"isComplete\":false}\n",
        );
        assert_eq!(frames, vec![chunk("a"), chunk("b")]);
    }

    #[test]
    fn long_line_in_small_reads_is_scanned_once() {
        let content = "x".repeat(100_000);
        let line = format!("data: {{\"content\":\"{content}\",\"isComplete\":false}}\n");

        let mut decoder = SseDecoder::new();
        let mut frames = Vec::new();
        for piece in line.as_bytes().chunks(16) {
            frames.extend(decoder.push(piece));
            // Everything buffered so far has been searched already.
            assert_eq!(decoder.scanned, decoder.pending());
        }

        assert_eq!(frames, vec![chunk(&content)]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn finish_decodes_unterminated_last_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"content\":\"tail\",\"isComplete\":true}").is_empty());
        let frame = decoder.finish().unwrap();
        assert!(frame.is_terminal());
        assert_eq!(decoder.finish(), None);
    }
}
