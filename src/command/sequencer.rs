//! Stepping through a show, one effect per call.

use std::fmt;

use crate::errors::{CommandError, SequencerError};
use crate::log::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SequencerState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SequencerState::Stopped => "stopped",
            SequencerState::Running => "running",
            SequencerState::Paused => "paused",
        })
    }
}

/// What one call to [`Sequencer::next_sequence`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum SequenceStep<E> {
    /// The effect at the cursor played
    Played(E),
    /// The effect at the cursor drew a partial frame and stays current
    Frame(E),
    /// The effect at the cursor failed; the show goes on
    Failed(E, CommandError),
    Paused,
    /// The cursor ran off the end; the show is now stopped
    Finished,
    /// Nothing is running
    Idle,
}

/// Ordered effect list with a cursor.
#[derive(Clone, Debug)]
pub struct Sequencer<E> {
    state: SequencerState,
    effects: Vec<E>,
    cursor: usize,
    /// Labels shown while the show runs
    labels: Vec<String>,
    failures: Vec<(E, CommandError)>,
}

impl<E> Default for Sequencer<E> {
    fn default() -> Self {
        Self {
            state: SequencerState::Stopped,
            effects: Vec::new(),
            cursor: 0,
            labels: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<E: Clone + fmt::Debug> Sequencer<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn effects(&self) -> &[E] {
        &self.effects
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The effect the next step will play, while the show runs.
    pub fn current(&self) -> Option<&E> {
        match self.state {
            SequencerState::Running => self.effects.get(self.cursor),
            SequencerState::Stopped | SequencerState::Paused => None,
        }
    }

    /// Effects that failed during the current show.
    pub fn failures(&self) -> &[(E, CommandError)] {
        &self.failures
    }

    fn transition(&mut self, to: SequencerState) {
        debug!(from = %self.state, to = %to, "sequencer transition");
        self.state = to;
    }

    /// Load `effects` and start running from the first one.
    pub fn start_show(&mut self, effects: Vec<E>) -> Result<(), SequencerError> {
        if self.state != SequencerState::Stopped {
            return Err(SequencerError {
                action: "start",
                state: self.state,
            });
        }
        self.effects = effects;
        self.cursor = 0;
        self.labels.clear();
        self.failures.clear();
        self.transition(SequencerState::Running);
        Ok(())
    }

    /// Advance by one effect. `play` runs the effect and returns the label
    /// to show for it, if any.
    pub fn next_sequence<F>(&mut self, mut play: F) -> SequenceStep<E>
    where
        F: FnMut(&E) -> Result<Option<String>, CommandError>,
    {
        match self.state {
            SequencerState::Stopped => return SequenceStep::Idle,
            SequencerState::Paused => return SequenceStep::Paused,
            SequencerState::Running => {}
        }
        let Some(effect) = self.effects.get(self.cursor).cloned() else {
            self.transition(SequencerState::Stopped);
            return SequenceStep::Finished;
        };
        self.cursor += 1;
        match play(&effect) {
            Ok(label) => {
                self.labels.extend(label);
                SequenceStep::Played(effect)
            }
            Err(err) => {
                warn!(?effect, error = %err, "effect failed, continuing");
                self.failures.push((effect.clone(), err.clone()));
                SequenceStep::Failed(effect, err)
            }
        }
    }

    pub fn pause_show(&mut self) -> Result<(), SequencerError> {
        if self.state != SequencerState::Running {
            return Err(SequencerError {
                action: "pause",
                state: self.state,
            });
        }
        self.transition(SequencerState::Paused);
        Ok(())
    }

    pub fn resume_show(&mut self) -> Result<(), SequencerError> {
        if self.state != SequencerState::Paused {
            return Err(SequencerError {
                action: "resume",
                state: self.state,
            });
        }
        self.transition(SequencerState::Running);
        Ok(())
    }

    /// Stop the show and clear its labels. Committed geometry stays.
    pub fn stop_show(&mut self) -> Result<(), SequencerError> {
        if self.state == SequencerState::Stopped {
            return Err(SequencerError {
                action: "stop",
                state: self.state,
            });
        }
        self.labels.clear();
        self.cursor = 0;
        self.transition(SequencerState::Stopped);
        Ok(())
    }
}
