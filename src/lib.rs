//! Mailcast sends one templated message to every recipient on a list,
//! rotating through a pool of relay identities and holding to a rate limit.
//!
//! A `Dispatcher` owns one job. `start` validates it, spawns a worker thread
//! and hands back the receiving end of the event channel; the dispatcher then
//! acts as the control handle for pause, resume and cancel.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate failure;


pub mod address;
pub mod config;
pub mod content_policy;
pub mod error;
pub mod job;
pub mod message;
pub mod outcome;
mod prepared_email;
pub mod relay;
pub mod run_state;
pub mod transport;
mod worker;

use std::ops::Drop;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::job::{DispatchJob, RateLimit, RateUnit};
pub use crate::message::{Attachment, OutboundMessage};
pub use crate::outcome::{AttemptOutcome, Event, EventSink, LogSink, Outcome, RunSummary};
pub use crate::relay::{RelayIdentity, RelayPool};
pub use crate::run_state::RunState;
pub use crate::transport::{SmtpTransport, Transport, TransportError, TransportErrorKind};

use crate::worker::{Control, Worker};

pub struct Dispatcher<T: Transport + 'static> {
    config: Config,
    // Moved into the worker thread on start
    transport: Option<T>,
    control: Arc<Control>,
    worker: Option<thread::JoinHandle<RunSummary>>,
}

impl Dispatcher<SmtpTransport> {
    /// A dispatcher delivering through SMTP relays
    pub fn smtp(config: Config) -> Dispatcher<SmtpTransport> {
        let transport = SmtpTransport::new(config.clone());
        Dispatcher::new(config, transport)
    }
}

impl<T: Transport + 'static> Dispatcher<T> {
    /// Create an idle dispatcher. Nothing is sent until `start`.
    pub fn new(config: Config, transport: T) -> Dispatcher<T> {
        Dispatcher {
            config,
            transport: Some(transport),
            control: Arc::new(Control::new()),
            worker: None,
        }
    }

    /// Validate `job` and begin sending it on a background thread.
    ///
    /// On error the dispatcher stays idle. Events for the run arrive on the
    /// returned receiver, ending with `Event::Complete`, after which the
    /// channel closes.
    pub fn start(&mut self, job: DispatchJob) -> Result<mpsc::Receiver<Event>, Error> {
        let state = self.control.state();
        if state != RunState::Idle {
            return Err(Error::InvalidState { op: "start", state });
        }

        if !self.config.is_valid() {
            return Err(Error::Validation("Invalid configuration".to_owned()));
        }

        if let Err(e) = job.validate() {
            info!("(dispatch) refusing to start: {}", e);
            return Err(e);
        }

        let transport = match self.transport.take() {
            Some(transport) => transport,
            None => return Err(Error::InvalidState { op: "start", state }),
        };

        if !self.control.transition(RunState::Idle, RunState::Running) {
            self.transport = Some(transport);
            return Err(Error::InvalidState {
                op: "start",
                state: self.control.state(),
            });
        }

        let (sender, receiver) = mpsc::channel();
        let worker = Worker::new(job, transport, self.control.clone(), sender, self.config.clone());

        self.worker = Some(thread::spawn(move || worker.run()));

        Ok(receiver)
    }

    /// Stop before the next recipient until `resume`. An attempt already in
    /// progress completes.
    pub fn pause(&self) -> Result<(), Error> {
        self.control.pause()
    }

    /// Continue with the next unprocessed recipient
    pub fn resume(&self) -> Result<(), Error> {
        self.control.resume()
    }

    /// Ask the worker to stop. No new attempt starts once it notices; an
    /// attempt already in progress is not interrupted.
    pub fn request_cancel(&self) -> Result<(), Error> {
        self.control.request_cancel()
    }

    pub fn run_state(&self) -> RunState {
        self.control.state()
    }

    /// Block until the worker finishes and return its summary
    pub fn wait(&mut self) -> Result<RunSummary, Error> {
        let handle = match self.worker.take() {
            Some(handle) => handle,
            None => {
                return Err(Error::InvalidState {
                    op: "wait",
                    state: self.control.state(),
                })
            }
        };

        handle.join().map_err(|_| {
            error!("(dispatch) worker panicked");
            self.control.finish();
            Error::WorkerPanicked
        })
    }
}

impl<T: Transport + 'static> Drop for Dispatcher<T> {
    fn drop(&mut self) {
        match self.control.state() {
            RunState::Running | RunState::Paused => {
                let _ = self.control.request_cancel();
            }
            _ => {}
        }
    }
}
