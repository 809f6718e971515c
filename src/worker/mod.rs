mod pacing;

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Error;
use crate::job::DispatchJob;
use crate::outcome::{AttemptOutcome, Event, Outcome, RunSummary};
use crate::relay::select;
use crate::run_state::RunState;
use crate::transport::Transport;

/// The only state shared between a `Dispatcher` and its worker thread
pub struct Control {
    state: AtomicU8,
    cancelled: AtomicBool,
}

impl Control {
    pub fn new() -> Control {
        Control {
            state: AtomicU8::new(RunState::Idle as u8),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Move from `from` to `to`, failing if the state is not `from`
    pub fn transition(&self, from: RunState, to: RunState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Paused is a run state, not a separate flag, so it cannot disagree with `state()`
    pub fn is_paused(&self) -> bool {
        self.state() == RunState::Paused
    }

    /// Also true in the gap between the Cancelling transition and the flag store
    pub fn cancel_requested(&self) -> bool {
        self.state() == RunState::Cancelling || self.cancelled.load(Ordering::SeqCst)
    }

    pub fn pause(&self) -> Result<(), Error> {
        if !self.transition(RunState::Running, RunState::Paused) {
            return Err(self.invalid("pause"));
        }
        Ok(())
    }

    pub fn resume(&self) -> Result<(), Error> {
        if !self.transition(RunState::Paused, RunState::Running) {
            return Err(self.invalid("resume"));
        }
        Ok(())
    }

    pub fn request_cancel(&self) -> Result<(), Error> {
        if !self.transition(RunState::Running, RunState::Cancelling)
            && !self.transition(RunState::Paused, RunState::Cancelling)
        {
            return Err(self.invalid("cancel"));
        }
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }

    pub fn finish(&self) {
        self.state.store(RunState::Completed as u8, Ordering::SeqCst);
    }

    fn invalid(&self, op: &'static str) -> Error {
        Error::InvalidState {
            op,
            state: self.state(),
        }
    }
}

/// Runs one job to completion on its own thread
pub struct Worker<T: Transport> {
    job: DispatchJob,
    transport: T,
    control: Arc<Control>,
    events: mpsc::Sender<Event>,
    config: Config,
}

impl<T: Transport> Worker<T> {
    pub fn new(
        job: DispatchJob,
        transport: T,
        control: Arc<Control>,
        events: mpsc::Sender<Event>,
        config: Config,
    ) -> Worker<T> {
        Worker {
            job,
            transport,
            control,
            events,
            config,
        }
    }

    pub fn run(mut self) -> RunSummary {
        let total = self.job.recipients.len();
        let quantity = self.job.rate_limit.quantity;
        let poll = self.config.poll_interval();
        let mut summary = RunSummary::default();

        info!(
            "(worker) starting: {} recipients, {} relays, rotate every {}, {} per {}",
            total,
            self.job.relays.len(),
            self.job.rotation_count,
            quantity,
            self.job.rate_limit.unit
        );

        for index in 0..total {
            if self.control.cancel_requested() {
                debug!("(worker) cancel observed before attempt {}", index);
                break;
            }
            if !pacing::wait_while_paused(&self.control, poll) {
                debug!("(worker) cancel observed while paused before attempt {}", index);
                break;
            }

            let (relay_index, relay) = select(index, self.job.rotation_count, &self.job.relays);
            let recipient = &self.job.recipients[index];
            let message = self.job.message_for(recipient, relay);

            let (outcome, status, detail) = match self.transport.send(relay, &message) {
                Ok(()) => {
                    let status = format!("Sent to {}: Success with {}", recipient, relay.label());
                    (Outcome::Success, status.clone(), status)
                }
                Err(e) => {
                    let status = format!("Failed to send to {}: {} with {}", recipient, e, relay.label());
                    (Outcome::Failure, status, e.reason)
                }
            };

            summary.record(outcome);
            self.emit(Event::Status(status));
            self.emit(Event::Attempt(AttemptOutcome {
                index,
                recipient: recipient.clone(),
                outcome,
                relay_index,
                relay: relay.label(),
                detail,
            }));

            let processed = index + 1;
            self.emit(Event::Progress(percent(processed, total)));

            if processed % quantity == 0 && processed < total {
                self.emit(Event::Status(format!(
                    "Reached send limit of {}. Waiting for the next time slot...",
                    quantity
                )));
                let period = self.job.rate_limit.unit.period(&self.config);
                trace!("(worker) throttling for {:?}", period);
                if !pacing::sleep_unless_cancelled(&self.control, period, poll) {
                    debug!("(worker) throttle interrupted by cancel");
                }
            }
        }

        summary.cancelled = summary.total_attempted < total;
        self.control.finish();

        info!(
            "(worker) finished: {} sent, {} failed{}",
            summary.success_count,
            summary.failure_count,
            if summary.cancelled { " (cancelled)" } else { "" }
        );

        self.emit(Event::Status(format!(
            "Completed: {} sent, {} failed",
            summary.success_count, summary.failure_count
        )));
        self.emit(Event::Complete(summary));

        summary
    }

    fn emit(&self, event: Event) {
        // The caller may have dropped the receiver; the run continues regardless
        if self.events.send(event).is_err() {
            trace!("(worker) event receiver gone");
        }
    }
}

/// `round(100 * done / total)`, halves rounded up
fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 200 + total) / (2 * total)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(7, 7), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_control_transitions() {
        let control = Control::new();
        assert!(control.pause().is_err());
        assert!(control.request_cancel().is_err());
        assert!(control.transition(RunState::Idle, RunState::Running));

        control.pause().unwrap();
        assert_eq!(control.state(), RunState::Paused);
        assert!(control.is_paused());
        assert!(control.pause().is_err());

        control.resume().unwrap();
        assert_eq!(control.state(), RunState::Running);
        assert!(!control.is_paused());
        assert!(control.resume().is_err());

        control.pause().unwrap();
        control.request_cancel().unwrap();
        assert_eq!(control.state(), RunState::Cancelling);
        assert!(control.cancel_requested());
        assert!(control.resume().is_err());

        control.finish();
        assert_eq!(control.state(), RunState::Completed);
        assert!(control.request_cancel().is_err());
    }

    #[test]
    fn test_paused_always_matches_state() {
        let control = Arc::new(Control::new());
        assert!(control.transition(RunState::Idle, RunState::Running));

        for _ in 0..200 {
            let pauser = {
                let control = control.clone();
                thread::spawn(move || {
                    let _ = control.pause();
                })
            };
            let resumer = {
                let control = control.clone();
                thread::spawn(move || {
                    let _ = control.resume();
                })
            };
            pauser.join().unwrap();
            resumer.join().unwrap();

            let state = control.state();
            assert_eq!(control.is_paused(), state == RunState::Paused);
            // the call matching the state is always accepted
            if state == RunState::Paused {
                control.resume().unwrap();
            } else {
                assert_eq!(state, RunState::Running);
                control.pause().unwrap();
                control.resume().unwrap();
            }
        }
    }

    #[test]
    fn test_cancel_from_pause_is_seen_immediately() {
        let control = Control::new();
        assert!(control.transition(RunState::Idle, RunState::Running));
        control.pause().unwrap();
        assert!(control.transition(RunState::Paused, RunState::Cancelling));
        assert!(!control.is_paused());
        assert!(control.cancel_requested());
    }
}
