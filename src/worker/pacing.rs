use std::cmp;
use std::thread;
use std::time::{Duration, Instant};

use super::Control;

/// Block while the job is paused. Returns false if a cancel arrives first.
pub fn wait_while_paused(control: &Control, poll: Duration) -> bool {
    if control.is_paused() {
        debug!("(worker) paused");
        while control.is_paused() {
            if control.cancel_requested() {
                return false;
            }
            thread::sleep(poll);
        }
        debug!("(worker) resumed");
    }
    !control.cancel_requested()
}

/// Sleep for `period` in slices of at most `poll`, giving up early on cancel.
/// Returns false if cancelled.
pub fn sleep_unless_cancelled(control: &Control, period: Duration, poll: Duration) -> bool {
    let deadline = Instant::now() + period;
    loop {
        if control.cancel_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(cmp::min(poll, deadline - now));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_state::RunState;
    use std::sync::Arc;

    #[test]
    fn test_sleep_runs_to_deadline() {
        let control = Control::new();
        let start = Instant::now();
        assert!(sleep_unless_cancelled(&control, Duration::from_millis(30), Duration::from_millis(5)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_cancel_cuts_sleep_short() {
        let control = Arc::new(Control::new());
        assert!(control.transition(RunState::Idle, RunState::Running));
        let c = control.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            c.request_cancel().unwrap();
        });

        let start = Instant::now();
        assert!(!sleep_unless_cancelled(&control, Duration::from_secs(3600), Duration::from_millis(5)));
        assert!(start.elapsed() < Duration::from_secs(5));
        canceller.join().unwrap();
    }
}
