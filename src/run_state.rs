use std::fmt;

/// Lifecycle of a dispatch job.
///
/// Stored in an `AtomicU8` shared between the `Dispatcher` handle and its
/// worker thread, hence the explicit discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Running = 1,
    Paused = 2,
    Cancelling = 3,
    Completed = 4,
}

impl RunState {
    pub fn from_u8(value: u8) -> RunState {
        match value {
            0 => RunState::Idle,
            1 => RunState::Running,
            2 => RunState::Paused,
            3 => RunState::Cancelling,
            _ => RunState::Completed,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Cancelling => "cancelling",
            RunState::Completed => "completed",
        };
        write!(f, "{}", name)
    }
}
