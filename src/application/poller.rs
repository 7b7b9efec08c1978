use crate::domain::{AppError, PollPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTransition {
    /// Job still running, keep the timer going.
    Waiting,
    /// First `done` answer. Polling has already stopped.
    Completed,
    /// Answer arrived outside of `Polling` and must not touch the UI.
    Ignored,
}

/// Drives the remote summarization job: `Idle -> JobRequested -> Polling -> Done`.
#[derive(Debug, Default)]
pub struct CompletionPoller {
    phase: PollPhase,
    polls: u32,
}

impl CompletionPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// A job has been requested and has not reported done yet.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, PollPhase::JobRequested | PollPhase::Polling)
    }

    /// The timer exists exactly as long as this holds.
    pub fn is_polling(&self) -> bool {
        self.phase == PollPhase::Polling
    }

    pub fn request_job(&mut self) -> Result<(), AppError> {
        if self.is_active() {
            return Err(AppError::RunInProgress);
        }
        self.phase = PollPhase::JobRequested;
        self.polls = 0;
        Ok(())
    }

    pub fn start_polling(&mut self) {
        if self.phase == PollPhase::JobRequested {
            self.phase = PollPhase::Polling;
        }
    }

    /// Feed one status answer. Leaves `Polling` before reporting `Completed`.
    pub fn on_status(&mut self, done: bool) -> PollTransition {
        if self.phase != PollPhase::Polling {
            return PollTransition::Ignored;
        }
        self.polls += 1;
        if done {
            self.phase = PollPhase::Done;
            PollTransition::Completed
        } else {
            PollTransition::Waiting
        }
    }
}
