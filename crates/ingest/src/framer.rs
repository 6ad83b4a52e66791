use crate::schema::FrameLayout;

/// Records starting with this marker are headers, not data.
const HEADER_MARKER: &str = "ts,";

/// Receives completed frames. The framer stays ignorant of scoring; whoever
/// owns the engine implements this.
pub trait FrameSink {
    /// One completed frame: timestamp plus the zero-padded slot block, guard
    /// bits in the final slot.
    fn dispatch_frame(&mut self, ts: f64, slots: &[f64]);
}

/// Dispatch and rejection counts from one framer call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerOutcome {
    pub dispatched: u64,
    pub rejected: u64,
}

impl FramerOutcome {
    fn tally(&mut self, dispatched: bool) {
        if dispatched {
            self.dispatched += 1;
        } else {
            self.rejected += 1;
        }
    }
}

/// Splits a byte stream into newline-delimited records and turns each into
/// a fixed-width numeric frame.
///
/// Bytes may arrive in arbitrary chunks: a record split across reads is
/// held in the carry buffer until its delimiter shows up, so chunking never
/// changes what gets dispatched. The slot buffer is reused across records.
#[derive(Debug)]
pub struct RecordFramer {
    layout: FrameLayout,
    carry: Vec<u8>,
    slots: Vec<f64>,
}

impl RecordFramer {
    pub fn new(layout: FrameLayout) -> Self {
        Self {
            layout,
            carry: Vec::new(),
            slots: Vec::with_capacity(layout.frame_slots()),
        }
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Appends a chunk and dispatches every record completed by it.
    pub fn push_bytes(&mut self, bytes: &[u8], sink: &mut dyn FrameSink) -> FramerOutcome {
        self.carry.extend_from_slice(bytes);

        // The carry is moved out so records can borrow it while the slot
        // buffer is mutated.
        let buffered = std::mem::take(&mut self.carry);
        let mut outcome = FramerOutcome::default();
        let mut start = 0usize;
        while let Some(pos) = buffered[start..].iter().position(|&b| b == b'\n') {
            let end = start + pos;
            let record = String::from_utf8_lossy(&buffered[start..end]);
            outcome.tally(self.push_record(&record, sink));
            start = end + 1;
        }
        self.carry = buffered;
        self.carry.drain(..start);

        outcome
    }

    /// Flushes a non-empty carry as a final record. Used when a source ends
    /// without a trailing delimiter.
    pub fn drain(&mut self, sink: &mut dyn FrameSink) -> FramerOutcome {
        let mut outcome = FramerOutcome::default();
        if self.carry.is_empty() {
            return outcome;
        }
        let buffered = std::mem::take(&mut self.carry);
        let record = String::from_utf8_lossy(&buffered);
        outcome.tally(self.push_record(&record, sink));
        outcome
    }

    /// Frames one raw record. Returns false when the record is rejected:
    /// empty, a repeated header, a single token, or too short to carry the
    /// guard column.
    ///
    /// Accepted records parse permissively: unparsable feature tokens read
    /// as 0.0, the guard token as unsigned 0, and absent feature columns
    /// stay zero-padded.
    pub fn push_record(&mut self, record: &str, sink: &mut dyn FrameSink) -> bool {
        if record.is_empty() || record.starts_with(HEADER_MARKER) {
            return false;
        }
        let token_count = record.split(',').count();
        if token_count <= 1 || token_count <= self.layout.guard_index {
            return false;
        }

        let slot_count = self.layout.frame_slots();
        self.slots.clear();
        self.slots.resize(slot_count, 0.0);

        let mut ts = 0.0f64;
        for (column, token) in record.split(',').enumerate() {
            if column == 0 {
                ts = parse_f64(token);
                continue;
            }
            let feature = column - 1;
            if feature < self.layout.feature_tokens {
                self.slots[feature] = parse_f64(token);
            }
            if column == self.layout.guard_index {
                self.slots[slot_count - 1] = f64::from(parse_u32(token));
            }
        }

        sink.dispatch_frame(ts, &self.slots);
        true
    }
}

fn parse_f64(token: &str) -> f64 {
    token.trim().parse().unwrap_or(0.0)
}

fn parse_u32(token: &str) -> u32 {
    token.trim().parse().unwrap_or(0)
}
