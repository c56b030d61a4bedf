use tracing::trace;

use crate::llm::models::StreamFrame;
use crate::stream::decoder::Utf8Decoder;

const DONE: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A text fragment to append to the open assistant message.
    Delta(String),
    /// The `data: [DONE]` sentinel. Carries no content.
    Done,
}

/// Turns SSE bytes into [`StreamEvent`]s regardless of where chunk
/// boundaries fall. Only complete lines are parsed; the text after the last
/// newline is carried into the next `feed`.
#[derive(Debug, Default)]
pub struct SseAssembler {
    decoder: Utf8Decoder,
    buffer: String,
}

impl SseAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let text = self.decoder.decode(chunk);
        self.buffer.push_str(&text);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=end).collect();
            events.extend(parse_line(&line));
        }
        events
    }

    /// Parses the unterminated carry, if any. Covers a final `[DONE]` or frame
    /// that was not followed by a newline.
    pub fn finish(mut self) -> Vec<StreamEvent> {
        let rest = self.decoder.finish();
        self.buffer.push_str(&rest);

        let mut events = Vec::new();
        for line in self.buffer.lines() {
            events.extend(parse_line(line));
        }
        events
    }

    /// Bytes received but not yet parsed as a full line.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

fn parse_line(line: &str) -> Option<StreamEvent> {
    let line = line.trim_end_matches(['\n', '\r']);
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);

    if data.trim() == DONE {
        return Some(StreamEvent::Done);
    }

    match serde_json::from_str::<StreamFrame>(data) {
        Ok(frame) => frame.content().map(|c| StreamEvent::Delta(c.to_string())),
        Err(e) => {
            trace!(error = %e, "skipping unparseable stream frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(s: &str) -> StreamEvent {
        StreamEvent::Delta(s.to_string())
    }

    #[test]
    fn single_chunk_with_two_frames() {
        let mut asm = SseAssembler::new();
        let events = asm.feed(
            b"data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n\
              data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\n\
              data: [DONE]\n\n",
        );
        assert_eq!(events, vec![delta("He"), delta("llo"), StreamEvent::Done]);
        assert!(asm.pending().is_empty());
    }

    #[test]
    fn json_split_across_reads() {
        let mut asm = SseAssembler::new();
        assert!(asm
            .feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hel")
            .is_empty());
        let events = asm.feed(b"lo\"}}]}\n\ndata: [DONE]\n\n");
        assert_eq!(events, vec![delta("Hello"), StreamEvent::Done]);
    }

    #[test]
    fn done_without_trailing_newline() {
        let mut asm = SseAssembler::new();
        let events = asm.feed(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\ndata: [DONE]");
        assert_eq!(events, vec![delta("x")]);
        assert_eq!(asm.finish(), vec![StreamEvent::Done]);
    }

    #[test]
    fn crlf_and_non_data_lines() {
        let mut asm = SseAssembler::new();
        let events = asm.feed(
            b": keep-alive\r\nevent: message\r\ndata:{\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\r\n\r\n",
        );
        assert_eq!(events, vec![delta("a")]);
    }

    #[test]
    fn malformed_complete_line_is_not_fatal() {
        let mut asm = SseAssembler::new();
        let events = asm.feed(
            b"data: {not json}\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\n",
        );
        assert_eq!(events, vec![delta("ok")]);
    }

    #[test]
    fn role_only_and_finish_frames_carry_nothing() {
        let mut asm = SseAssembler::new();
        let events = asm.feed(
            b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n\
              data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        );
        assert!(events.is_empty());
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let asm = SseAssembler::new();
        assert!(asm.finish().is_empty());
    }
}
