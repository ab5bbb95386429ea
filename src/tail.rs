use std::collections::VecDeque;

/// Notice rendered in place of live output once the stream has dropped.
pub const DISCONNECT_NOTICE: &str =
    "unable to communicate with logger backend. try using the raw link (see above).";

/// One message from the build's tail stream, in the backend's wire shape
/// (`{"t": "Text", "c": "..."}` and friends).
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "t", content = "c")]
pub enum TailEvent {
    /// Raw output to append to the current unterminated line. May contain
    /// zero or more newlines.
    Text(String),
    /// Full replacement of the visible window with complete lines.
    Lines(Vec<String>),
    /// Out-of-band diagnostic from the logger backend. Never touches the
    /// buffer; callers forward it to the log sink.
    Error(String),
    /// The upstream log was rotated; drop everything.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailStatus {
    /// No event has arrived yet.
    Loading,
    Streaming,
    /// The transport failed; the buffer keeps whatever it had.
    Disconnected,
}

/// Bounded window over the most recent output of one build log.
///
/// Holds at most `capacity` complete lines (oldest evicted first) plus the
/// unterminated suffix of the stream. Mutated only through [`apply`] and
/// [`disconnect`], both synchronous and free of I/O, so the transition
/// logic is testable without any transport.
///
/// [`apply`]: TailBuffer::apply
/// [`disconnect`]: TailBuffer::disconnect
#[derive(Debug, Clone)]
pub struct TailBuffer {
    capacity: usize,
    completed: VecDeque<String>,
    partial: String,
    status: TailStatus,
}

impl TailBuffer {
    /// `capacity` is the maximum number of complete lines retained; zero is
    /// bumped to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            completed: VecDeque::new(),
            partial: String::new(),
            status: TailStatus::Loading,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn status(&self) -> TailStatus {
        self.status
    }

    pub fn completed_lines(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn partial_line(&self) -> &str {
        &self.partial
    }

    /// Apply one stream event, in arrival order.
    pub fn apply(&mut self, event: TailEvent) {
        match event {
            TailEvent::Text(chunk) => {
                self.append_text(&chunk);
                self.status = TailStatus::Streaming;
            }
            TailEvent::Lines(lines) => {
                self.completed.clear();
                let skip = lines.len().saturating_sub(self.capacity);
                self.completed.extend(lines.into_iter().skip(skip));
                self.partial.clear();
                self.status = TailStatus::Streaming;
            }
            TailEvent::Reset => {
                self.completed.clear();
                self.partial.clear();
            }
            // Diagnostic only; the caller logs it.
            TailEvent::Error(_) => {}
        }
    }

    /// Transport-level failure. Buffer content is left intact; the render
    /// projection substitutes the fallback notice.
    pub fn disconnect(&mut self) {
        self.status = TailStatus::Disconnected;
    }

    fn append_text(&mut self, chunk: &str) {
        if !chunk.contains('\n') {
            self.partial.push_str(chunk);
            return;
        }
        let mut segments = chunk.split('\n');
        // First segment terminates the pending partial line.
        if let Some(first) = segments.next() {
            self.partial.push_str(first);
            let line = std::mem::take(&mut self.partial);
            self.push_line(line);
        }
        let mut rest: Vec<&str> = segments.collect();
        // Last segment (possibly empty) is the new partial.
        if let Some(tail) = rest.pop() {
            self.partial.push_str(tail);
        }
        for seg in rest {
            self.push_line(seg.to_string());
        }
    }

    fn push_line(&mut self, line: String) {
        self.completed.push_back(line);
        if self.completed.len() > self.capacity {
            self.completed.pop_front();
        }
    }

    /// Displayed text: every completed line newline-terminated, then the
    /// partial line.
    pub fn contents(&self) -> String {
        let mut out = String::new();
        for line in &self.completed {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&self.partial);
        out
    }
}
