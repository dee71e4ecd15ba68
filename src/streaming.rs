use std::collections::VecDeque;

/// Incremental Server-Sent Events decoder.
///
/// Network chunks are pushed as raw bytes; each event's `data:` lines are
/// joined with `\n` and queued in arrival order once a blank line ends the
/// event. Bytes are only decoded once a full line is available, so multi-byte
/// characters split across chunks survive.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of the line currently being built
    pending: Vec<u8>,
    /// `data:` lines of the event currently being built
    event_data: Vec<String>,
    /// Payloads ready to be consumed
    queued: VecDeque<String>,
    /// Whether the terminating `[DONE]` marker was seen
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a chunk of the response body
    pub fn push_bytes(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        while let Some(newline_pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline_pos).collect();
            self.handle_line(&line);
        }
    }

    /// Get all queued payloads
    pub fn drain_payloads(&mut self) -> Vec<String> {
        self.queued.drain(..).collect()
    }

    /// Flush a trailing line and event that arrived without their terminators
    pub fn finish(&mut self) -> Vec<String> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            self.handle_line(&line);
        }
        self.dispatch_event();
        self.drain_payloads()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn handle_line(&mut self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let line = text.trim_end_matches(['\r', '\n']);

        if line.is_empty() {
            self.dispatch_event();
            return;
        }

        // Comments and other fields carry no payload
        let Some(data) = line.strip_prefix("data:") else {
            return;
        };
        let data = data.strip_prefix(' ').unwrap_or(data);
        self.event_data.push(data.to_string());
    }

    fn dispatch_event(&mut self) {
        if self.event_data.is_empty() {
            return;
        }
        let payload = self.event_data.join("\n");
        self.event_data.clear();

        if payload.trim() == "[DONE]" {
            self.done = true;
        } else if !payload.trim().is_empty() {
            self.queued.push_back(payload);
        }
    }
}
