use std::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
}

/// The result of the single attempt made for one recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    /// Position of the recipient in the job's list
    pub index: usize,
    pub recipient: String,
    pub outcome: Outcome,
    /// Position of the relay identity in the pool
    pub relay_index: usize,
    /// `username (display name)` of that identity
    pub relay: String,
    /// The status line on success, the transport's reason on failure
    pub detail: String,
}

impl AttemptOutcome {
    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub total_attempted: usize,
    /// True if the run stopped on a cancel request before the last recipient
    pub cancelled: bool,
}

impl RunSummary {
    pub(crate) fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success_count += 1,
            Outcome::Failure => self.failure_count += 1,
        }
        self.total_attempted += 1;
    }
}

/// Everything the worker reports while a job runs
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Percent of recipients processed, 0..=100
    Progress(u8),
    /// A human-readable status line
    Status(String),
    Attempt(AttemptOutcome),
    /// Always the last event of a run
    Complete(RunSummary),
}

/// A consumer of dispatch events
pub trait EventSink {
    fn on_progress(&mut self, percent: u8);
    fn on_status(&mut self, line: &str);
    fn on_attempt(&mut self, outcome: &AttemptOutcome);
    fn on_complete(&mut self, summary: &RunSummary);
}

impl Event {
    pub fn deliver_to<S: EventSink + ?Sized>(&self, sink: &mut S) {
        match *self {
            Event::Progress(percent) => sink.on_progress(percent),
            Event::Status(ref line) => sink.on_status(line),
            Event::Attempt(ref outcome) => sink.on_attempt(outcome),
            Event::Complete(ref summary) => sink.on_complete(summary),
        }
    }
}

/// Feed every event of a run to `sink` until the worker closes the channel.
/// Returns the summary if the run reported one.
pub fn drain<S: EventSink + ?Sized>(events: &mpsc::Receiver<Event>, sink: &mut S) -> Option<RunSummary> {
    let mut summary = None;
    for event in events.iter() {
        event.deliver_to(sink);
        if let Event::Complete(s) = event {
            summary = Some(s);
        }
    }
    summary
}

/// Writes events to the `log` facade
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_progress(&mut self, percent: u8) {
        debug!("(dispatch) progress {}%", percent);
    }

    fn on_status(&mut self, line: &str) {
        info!("(dispatch) {}", line);
    }

    fn on_attempt(&mut self, outcome: &AttemptOutcome) {
        match outcome.outcome {
            Outcome::Success => trace!("(dispatch) {} ok via {}", outcome.recipient, outcome.relay),
            Outcome::Failure => warn!(
                "(dispatch) {} failed via {}: {}",
                outcome.recipient, outcome.relay, outcome.detail
            ),
        }
    }

    fn on_complete(&mut self, summary: &RunSummary) {
        info!(
            "(dispatch) Completed: {} sent, {} failed",
            summary.success_count, summary.failure_count
        );
    }
}
