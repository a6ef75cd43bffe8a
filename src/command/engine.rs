//! Top-level driver: resolve a program, keep its commands current, and play
//! them.

use super::{Command, CommandState, CommandSummary, SequenceStep, Sequencer, SequencerState};
use crate::backend::{ExportSurface, Renderer, RendererHandle};
use crate::defaults::EngineConfig;
use crate::errors::{CommandError, ExpressionError, SequencerError};
use crate::expr::{ExpressionContext, Program, resolve_statement};
use crate::log::debug;
use crate::types::{ExprId, Ratio};

#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    context: ExpressionContext,
    summary: CommandSummary,
    sequencer: Sequencer<ExprId>,
    /// Commands rebuilt by the last pass and not yet played
    pending: Vec<ExprId>,
    /// Committed objects of replaced commands, removed on the next play
    retired: Vec<RendererHandle>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            context: ExpressionContext::new(),
            summary: CommandSummary::new(config.equality_tolerance),
            sequencer: Sequencer::new(),
            pending: Vec::new(),
            retired: Vec::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn context(&self) -> &ExpressionContext {
        &self.context
    }

    pub fn summary(&self) -> &CommandSummary {
        &self.summary
    }

    pub fn summary_mut(&mut self) -> &mut CommandSummary {
        &mut self.summary
    }

    pub fn sequencer(&self) -> &Sequencer<ExprId> {
        &self.sequencer
    }

    pub fn command(&self, id: ExprId) -> Option<&Command> {
        self.summary.command(id)
    }

    /// Commands waiting to be played
    pub fn pending(&self) -> &[ExprId] {
        &self.pending
    }

    /// Resolve `program` and rebuild the commands whose value changed.
    ///
    /// Returns the dirty expression ids in statement order.
    pub fn evaluate(&mut self, program: &Program) -> miette::Result<Vec<ExprId>> {
        Ok(self.try_evaluate(program, None)?)
    }

    /// Like [`evaluate`](Self::evaluate) with a typed error. `edited` is the
    /// statement being edited; dirty filtering starts there.
    pub fn try_evaluate(&mut self, program: &Program, edited: Option<ExprId>) -> Result<Vec<ExprId>, ExpressionError> {
        debug!(statements = program.statements.len(), "resolution pass");
        self.context.reset();
        // a failed pass leaves the recorded values untouched
        let resolved = program
            .statements
            .iter()
            .map(|statement| {
                resolve_statement(&mut self.context, &self.config, statement).map(|value| (statement.id, value))
            })
            .collect::<Result<Vec<_>, ExpressionError>>()?;
        self.summary.begin_pass();
        for (id, value) in resolved {
            self.summary.record(id, value);
        }

        let dirty = self.summary.filter_dirty_commands(edited, None);
        let missing: Vec<ExprId> = self
            .summary
            .ids()
            .iter()
            .copied()
            .filter(|id| !self.summary.has_command(*id) && !dirty.contains(id))
            .collect();
        for id in dirty.iter().chain(&missing).copied() {
            let Some(value) = self.summary.current(id).cloned() else {
                continue;
            };
            if let Some(old) = self.summary.insert_command(Command::new(id, value, &self.config)) {
                self.retired.extend(old.into_committed());
            }
            if !self.pending.contains(&id) {
                self.pending.push(id);
            }
        }
        for stale in self.summary.prune() {
            self.pending.retain(|id| *id != stale.id());
            self.retired.extend(stale.into_committed());
        }
        debug!(dirty = dirty.len(), pending = self.pending.len(), "resolution pass done");
        Ok(dirty)
    }

    fn flush_retired(&mut self, renderer: &mut dyn Renderer) {
        for handle in self.retired.drain(..) {
            renderer.remove_handle(handle);
        }
    }

    /// Commit every pending command at once. Failures are returned per
    /// command; the others still play.
    pub fn play_all(&mut self, renderer: &mut dyn Renderer) -> Vec<(ExprId, CommandError)> {
        self.flush_retired(renderer);
        let mut failures = Vec::new();
        for id in std::mem::take(&mut self.pending) {
            let result = match self.summary.command_mut(id) {
                Some(command) => command.direct_play(renderer),
                None => Err(CommandError::UnknownExpression(id)),
            };
            if let Err(err) = result {
                failures.push((id, err));
            }
        }
        failures
    }

    /// Start a step-by-step show over the pending commands.
    pub fn start_show(&mut self) -> Result<(), SequencerError> {
        self.sequencer.start_show(std::mem::take(&mut self.pending))
    }

    /// Play the next command of the show.
    pub fn next_sequence(&mut self, renderer: &mut dyn Renderer) -> SequenceStep<ExprId> {
        if self.sequencer.state() == SequencerState::Running {
            self.flush_retired(renderer);
        }
        let summary = &mut self.summary;
        self.sequencer.next_sequence(|id| {
            let command = summary
                .command_mut(*id)
                .ok_or(CommandError::UnknownExpression(*id))?;
            command.play_through(renderer)?;
            Ok(command.resolved().label.clone())
        })
    }

    /// Draw one frame of the show's current command without advancing,
    /// unless `ratio` is complete: then the command commits and the show
    /// moves on as with [`next_sequence`](Self::next_sequence).
    pub fn play_frame(&mut self, renderer: &mut dyn Renderer, ratio: Ratio) -> SequenceStep<ExprId> {
        let current = self.sequencer.current().copied();
        let Some(current) = current.filter(|_| !ratio.is_complete()) else {
            return self.next_sequence(renderer);
        };
        self.flush_retired(renderer);
        let result = match self.summary.command_mut(current) {
            Some(command) => {
                let prepared = if command.state() == CommandState::Idle {
                    command.pre_play(renderer)
                } else {
                    Ok(())
                };
                prepared.and_then(|()| command.play(renderer, ratio))
            }
            None => Err(CommandError::UnknownExpression(current)),
        };
        match result {
            Ok(()) => SequenceStep::Frame(current),
            // the full step records the failure and advances
            Err(_) => self.next_sequence(renderer),
        }
    }

    pub fn pause_show(&mut self) -> Result<(), SequencerError> {
        self.sequencer.pause_show()
    }

    pub fn resume_show(&mut self) -> Result<(), SequencerError> {
        self.sequencer.resume_show()
    }

    /// Stop the show, discarding any preview still on the sheet.
    pub fn stop_show(&mut self, renderer: &mut dyn Renderer) -> Result<(), SequencerError> {
        self.sequencer.stop_show()?;
        for id in self.sequencer.effects() {
            if let Some(command) = self.summary.command_mut(*id) {
                command.post_play(renderer);
            }
        }
        Ok(())
    }

    /// Draw every command's final geometry onto `surface`.
    pub fn export_2d(&self, surface: &mut dyn ExportSurface) -> Vec<(ExprId, CommandError)> {
        self.summary
            .commands()
            .filter_map(|command| command.draw_on_2d(surface).err().map(|err| (command.id(), err)))
            .collect()
    }
}
