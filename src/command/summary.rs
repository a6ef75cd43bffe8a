//! Commands by expression id, plus the last two evaluation passes.

use std::collections::{HashMap, HashSet};

use super::Command;
use crate::defaults::EQUALITY_TOLERANCE;
use crate::expr::Resolved;
use crate::log::debug;
use crate::types::ExprId;

#[derive(Debug)]
pub struct CommandSummary {
    /// Statement order of the current pass
    order: Vec<ExprId>,
    commands: HashMap<ExprId, Command>,
    previous: HashMap<ExprId, Resolved>,
    current: HashMap<ExprId, Resolved>,
    /// Ids forced to replay every pass
    forced: HashSet<ExprId>,
    tolerance: f64,
}

impl Default for CommandSummary {
    fn default() -> Self {
        Self::new(EQUALITY_TOLERANCE)
    }
}

impl CommandSummary {
    pub fn new(tolerance: f64) -> Self {
        Self {
            order: Vec::new(),
            commands: HashMap::new(),
            previous: HashMap::new(),
            current: HashMap::new(),
            forced: HashSet::new(),
            tolerance,
        }
    }

    /// Start a new evaluation pass: the current values become the previous
    /// ones.
    pub fn begin_pass(&mut self) {
        self.previous = std::mem::take(&mut self.current);
        self.order.clear();
    }

    /// Record the value resolved for `id` in this pass.
    pub fn record(&mut self, id: ExprId, value: Resolved) {
        if self.current.insert(id, value).is_none() {
            self.order.push(id);
        }
    }

    pub fn ids(&self) -> &[ExprId] {
        &self.order
    }

    pub fn previous(&self, id: ExprId) -> Option<&Resolved> {
        self.previous.get(&id)
    }

    pub fn current(&self, id: ExprId) -> Option<&Resolved> {
        self.current.get(&id)
    }

    /// Replay `id` on every pass regardless of its value.
    pub fn set_always_execute(&mut self, id: ExprId, always: bool) {
        if always {
            self.forced.insert(id);
        } else {
            self.forced.remove(&id);
        }
    }

    pub fn always_execute(&self, id: ExprId) -> bool {
        self.forced.contains(&id) || self.current.get(&id).is_some_and(Resolved::always_execute)
    }

    /// Whether `id` has to be redrawn after this pass.
    pub fn is_dirty(&self, id: ExprId) -> bool {
        let Some(current) = self.current.get(&id) else {
            return false;
        };
        match self.previous.get(&id) {
            None => true,
            Some(previous) => !current.equals(previous, self.tolerance) || self.always_execute(id),
        }
    }

    /// Dirty ids in statement order, starting at `from` (or the nearest
    /// later statement when `from` is gone) and stopping before index `to`.
    pub fn filter_dirty_commands(&self, from: Option<ExprId>, to: Option<usize>) -> Vec<ExprId> {
        let start = match from {
            None => 0,
            Some(from) => self
                .order
                .iter()
                .position(|id| *id == from)
                .or_else(|| self.order.iter().position(|id| *id > from))
                .unwrap_or(self.order.len()),
        };
        let end = to.map_or(self.order.len(), |to| to.min(self.order.len()));

        let mut seen = HashSet::new();
        let dirty: Vec<ExprId> = self
            .order
            .get(start..end)
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(|id| self.is_dirty(*id) && seen.insert(*id))
            .collect();
        debug!(start, end, dirty = dirty.len(), "filtered dirty commands");
        dirty
    }

    /// Install `command`, returning the one it replaces.
    pub fn insert_command(&mut self, command: Command) -> Option<Command> {
        self.commands.insert(command.id(), command)
    }

    pub fn command(&self, id: ExprId) -> Option<&Command> {
        self.commands.get(&id)
    }

    pub fn command_mut(&mut self, id: ExprId) -> Option<&mut Command> {
        self.commands.get_mut(&id)
    }

    pub fn has_command(&self, id: ExprId) -> bool {
        self.commands.contains_key(&id)
    }

    /// Commands in statement order
    pub fn commands(&self) -> impl Iterator<Item = &Command> + '_ {
        self.order.iter().filter_map(|id| self.commands.get(id))
    }

    /// Drop commands whose statement is gone from the current pass.
    pub fn prune(&mut self) -> Vec<Command> {
        let stale: Vec<ExprId> = self
            .commands
            .keys()
            .filter(|id| !self.current.contains_key(id))
            .copied()
            .collect();
        stale.iter().filter_map(|id| self.commands.remove(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Drawable;

    fn values(v: &[f64]) -> Resolved {
        Resolved::with_drawable("values", v.to_vec(), Drawable::Nothing)
    }

    fn pass(summary: &mut CommandSummary, entries: &[(u32, Vec<f64>)]) {
        summary.begin_pass();
        for (id, v) in entries {
            summary.record(ExprId(*id), values(v));
        }
    }

    #[test]
    fn first_pass_is_all_dirty() {
        let mut summary = CommandSummary::default();
        pass(&mut summary, &[(1, vec![0.0]), (2, vec![1.0])]);
        assert_eq!(summary.filter_dirty_commands(None, None), vec![ExprId(1), ExprId(2)]);
    }

    #[test]
    fn only_changed_values_are_dirty() {
        let mut summary = CommandSummary::default();
        pass(&mut summary, &[(1, vec![0.0, 0.0, 1.0, 1.0]), (2, vec![5.0])]);
        pass(&mut summary, &[(1, vec![0.0, 0.0, 1.0, 1.0]), (2, vec![6.0])]);
        assert_eq!(summary.filter_dirty_commands(None, None), vec![ExprId(2)]);

        summary.set_always_execute(ExprId(1), true);
        assert_eq!(summary.filter_dirty_commands(None, None), vec![ExprId(1), ExprId(2)]);
    }

    #[test]
    fn changes_within_tolerance_are_clean() {
        let mut summary = CommandSummary::default();
        pass(&mut summary, &[(1, vec![1.0])]);
        pass(&mut summary, &[(1, vec![1.01])]);
        assert!(summary.filter_dirty_commands(None, None).is_empty());
    }

    #[test]
    fn range_starts_at_nearest_later_statement() {
        let mut summary = CommandSummary::default();
        pass(&mut summary, &[(1, vec![0.0]), (3, vec![0.0]), (5, vec![0.0])]);
        assert_eq!(summary.filter_dirty_commands(Some(ExprId(3)), None), vec![ExprId(3), ExprId(5)]);
        assert_eq!(summary.filter_dirty_commands(Some(ExprId(4)), None), vec![ExprId(5)]);
        assert!(summary.filter_dirty_commands(Some(ExprId(9)), None).is_empty());
        assert_eq!(summary.filter_dirty_commands(None, Some(2)), vec![ExprId(1), ExprId(3)]);
        assert!(summary.filter_dirty_commands(Some(ExprId(5)), Some(1)).is_empty());
    }

    #[test]
    fn recording_twice_keeps_one_entry() {
        let mut summary = CommandSummary::default();
        summary.begin_pass();
        summary.record(ExprId(1), values(&[0.0]));
        summary.record(ExprId(1), values(&[1.0]));
        summary.set_always_execute(ExprId(1), true);
        assert_eq!(summary.filter_dirty_commands(None, None), vec![ExprId(1)]);
        assert_eq!(summary.len(), 1);
    }
}
