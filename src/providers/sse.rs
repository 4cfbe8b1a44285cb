//! Server-sent event framing for streamed Messages API replies.
//!
//! Bytes are buffered until a blank line closes a frame; only complete
//! frames are decoded, so multi-byte characters split across network
//! chunks survive intact.

/// One `event:`/`data:` pair of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns the events of every frame it
    /// completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some((end, gap)) = frame_end(&self.pending) {
            let frame: Vec<u8> = self.pending.drain(..end + gap).collect();
            events.extend(parse_frame(&String::from_utf8_lossy(&frame[..end])));
        }
        events
    }

    /// Events of a final frame the stream ended without terminating.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let rest = std::mem::take(&mut self.pending);
        parse_frame(&String::from_utf8_lossy(&rest))
    }
}

/// Offset and length of the first blank-line separator.
fn frame_end(bytes: &[u8]) -> Option<(usize, usize)> {
    let lf = bytes.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Pair each `event:` line with the `data:` line that follows it. Data
/// without a preceding event name is ignored.
fn parse_frame(frame: &str) -> Vec<SseEvent> {
    let mut events = Vec::new();
    let mut event = None;
    for line in frame.lines().map(|l| l.trim_end_matches('\r')) {
        if let Some(name) = line.strip_prefix("event:") {
            event = Some(name.trim().to_string());
        } else if let Some(data) = line.strip_prefix("data:")
            && let Some(name) = event.take()
        {
            events.push(SseEvent {
                event: name,
                data: data.trim().to_string(),
            });
        }
    }
    events
}
