// SPDX-License-Identifier: MIT OR Apache-2.0
//! Hierarchical completion tracker (spec §4.3): `steps`/`current`/`child`,
//! mapping discrete sub-task completion into a monotonic overall percentage.
//!
//! The reference implementation (PackageKit's `PkBackendJob`/zif completion
//! objects, and the repository-metadata progress helper it drives) links a
//! child back to its parent by reference count, which risks a cycle between
//! a transaction, its progress, and its children. Here a [`Completion`] owns
//! its child outright and the child never holds a pointer back; propagation
//! from child to parent happens through [`Completion::child_mut`]'s guard,
//! whose `Drop` recomputes the parent the moment the caller is done mutating
//! the child (spec.md §9, "reference-cycle risk" redesign note).

use std::ops::{Deref, DerefMut};

/// Errors returned when a [`Completion`] method's precondition is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// `set_steps` was called with `n == 0`.
    #[error("steps must be greater than zero")]
    StepsMustBePositive,
    /// `set_steps` was called a second time without an intervening `reset`.
    #[error("steps already set; call reset() first")]
    StepsAlreadySet,
    /// `done()` was called before `set_steps`.
    #[error("done() called before set_steps()")]
    StepsNotSet,
    /// `done()` was called after every step was already consumed.
    #[error("all {steps} steps already completed")]
    AllStepsConsumed {
        /// The configured step count.
        steps: u32,
    },
}

/// A node in the hierarchical completion tree.
///
/// Percentages reported to any subscriber are monotonic (non-decreasing),
/// terminate at 100 when all sub-tasks complete, and the child never needs
/// to know about its parent.
#[derive(Default)]
pub struct Completion {
    steps: u32,
    current: u32,
    last_percentage: u8,
    child: Option<Box<Completion>>,
    on_percentage_changed: Vec<Box<dyn FnMut(u8) + Send>>,
    on_sub_percentage_changed: Vec<Box<dyn FnMut(u8) + Send>>,
}

impl Completion {
    /// Create a fresh, unconfigured node (`steps == 0`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The configured step count, or `0` if unset.
    #[must_use]
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Number of steps completed so far via [`Self::done`].
    #[must_use]
    pub fn current(&self) -> u32 {
        self.current
    }

    /// The last percentage value reported (`0..=100`).
    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.last_percentage
    }

    /// Register a callback invoked whenever this node's percentage changes.
    pub fn on_percentage_changed(&mut self, cb: impl FnMut(u8) + Send + 'static) {
        self.on_percentage_changed.push(Box::new(cb));
    }

    /// Register a callback invoked whenever this node's sub-percentage
    /// (i.e. its child's raw percentage) changes.
    pub fn on_sub_percentage_changed(&mut self, cb: impl FnMut(u8) + Send + 'static) {
        self.on_sub_percentage_changed.push(Box::new(cb));
    }

    /// Declare the number of sub-tasks this node tracks.
    ///
    /// Requires `n > 0` and that steps have not already been set (call
    /// [`Self::reset`] first to reconfigure). Resets `current` and
    /// `last_percentage`, and detaches any prior child.
    pub fn set_steps(&mut self, n: u32) -> Result<(), CompletionError> {
        if n == 0 {
            return Err(CompletionError::StepsMustBePositive);
        }
        if self.steps != 0 {
            return Err(CompletionError::StepsAlreadySet);
        }
        self.steps = n;
        self.current = 0;
        self.last_percentage = 0;
        self.child = None;
        Ok(())
    }

    /// Mark one sub-task complete, advancing the discrete→percentage map.
    ///
    /// Recomputes percentage as `floor(current * 100 / steps)` and resets
    /// any child so it can be reused for the next sub-task.
    pub fn done(&mut self) -> Result<u8, CompletionError> {
        if self.steps == 0 {
            return Err(CompletionError::StepsNotSet);
        }
        if self.current >= self.steps {
            return Err(CompletionError::AllStepsConsumed { steps: self.steps });
        }
        self.current += 1;
        let pct = (self.current * 100 / self.steps) as u8;
        self.apply_percentage(pct);
        if let Some(child) = self.child.as_mut() {
            child.reset();
        }
        Ok(pct)
    }

    /// Set this node's own percentage directly (for leaf nodes with no
    /// `steps`/`child` structure).
    ///
    /// Accepted only if `p >=` the last reported value; duplicates are
    /// silent no-ops and regressions are rejected with no state change.
    /// Returns `true` if the value was applied.
    pub fn set_percentage(&mut self, p: u8) -> bool {
        if p < self.last_percentage {
            return false;
        }
        if p == self.last_percentage {
            return true;
        }
        self.apply_percentage(p);
        true
    }

    fn apply_percentage(&mut self, p: u8) {
        self.last_percentage = p;
        for cb in &mut self.on_percentage_changed {
            cb(p);
        }
    }

    fn notify_sub_percentage(&mut self, p: u8) {
        for cb in &mut self.on_sub_percentage_changed {
            cb(p);
        }
    }

    /// Returns a mutable guard onto the persistent child node, allocating it
    /// on first call. Dropping the guard recomputes this node's percentage
    /// (and sub-percentage) from the child's current state.
    pub fn child_mut(&mut self) -> ChildGuard<'_> {
        if self.child.is_none() {
            self.child = Some(Box::new(Completion::new()));
        }
        ChildGuard { parent: self }
    }

    /// Read-only view of the persistent child, if one has been created.
    #[must_use]
    pub fn child(&self) -> Option<&Completion> {
        self.child.as_deref()
    }

    /// Bring the node back to its initial state: `steps = 0`, `current = 0`,
    /// `last_percentage = 0`, no child. Subscribers are retained.
    pub fn reset(&mut self) {
        self.steps = 0;
        self.current = 0;
        self.last_percentage = 0;
        self.child = None;
    }

    /// Recompute this node's percentage from its child's current value,
    /// applying the §4.3 discrete→percentage mapping.
    fn propagate_from_child(&mut self) {
        let child_pct = match &self.child {
            Some(c) => c.percentage(),
            None => return,
        };
        self.notify_sub_percentage(child_pct);

        let mapped = if self.steps <= 1 {
            // Unset or single-step: the parent's progress IS the child's.
            child_pct
        } else {
            (u32::from(child_pct) + self.current * 100).checked_div(self.steps).unwrap() as u8
        };
        // propagate_from_child never regresses the parent (the mapping is
        // monotonic by construction as long as `done()` precedes further
        // child updates), but route through the same guarded setter anyway.
        self.set_percentage(mapped);
    }
}

/// RAII guard returned by [`Completion::child_mut`].
///
/// Derefs to the child node; on drop, propagates the child's percentage up
/// into the parent per spec §4.3. This is the mechanism by which the parent
/// "subscribes" to its child without the child ever holding a pointer back.
pub struct ChildGuard<'a> {
    parent: &'a mut Completion,
}

impl Deref for ChildGuard<'_> {
    type Target = Completion;
    fn deref(&self) -> &Completion {
        self.parent.child.as_deref().expect("child allocated by child_mut")
    }
}

impl DerefMut for ChildGuard<'_> {
    fn deref_mut(&mut self) -> &mut Completion {
        self.parent.child.as_deref_mut().expect("child allocated by child_mut")
    }
}

impl Drop for ChildGuard<'_> {
    fn drop(&mut self) {
        self.parent.propagate_from_child();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_steps_rejects_zero() {
        let mut c = Completion::new();
        assert_eq!(c.set_steps(0), Err(CompletionError::StepsMustBePositive));
    }

    #[test]
    fn set_steps_rejects_double_set() {
        let mut c = Completion::new();
        c.set_steps(3).unwrap();
        assert_eq!(c.set_steps(2), Err(CompletionError::StepsAlreadySet));
    }

    #[test]
    fn done_requires_steps_and_progresses_monotonically() {
        let mut c = Completion::new();
        assert_eq!(c.done(), Err(CompletionError::StepsNotSet));
        c.set_steps(4).unwrap();
        assert_eq!(c.done(), Ok(25));
        assert_eq!(c.done(), Ok(50));
        assert_eq!(c.done(), Ok(75));
        assert_eq!(c.done(), Ok(100));
        assert_eq!(c.done(), Err(CompletionError::AllStepsConsumed { steps: 4 }));
    }

    #[test]
    fn set_percentage_rejects_regression_silently() {
        let mut c = Completion::new();
        assert!(c.set_percentage(40));
        assert!(c.set_percentage(40)); // duplicate: no-op, still "applied"
        assert!(!c.set_percentage(30)); // regression: rejected
        assert_eq!(c.percentage(), 40);
    }

    #[test]
    fn single_step_child_propagates_verbatim() {
        let mut c = Completion::new();
        c.set_steps(1).unwrap();
        {
            let mut child = c.child_mut();
            child.set_percentage(33);
        }
        assert_eq!(c.percentage(), 33);
        {
            let mut child = c.child_mut();
            child.set_percentage(100);
        }
        assert_eq!(c.percentage(), 100);
    }

    #[test]
    fn s6_hierarchical_progress_scenario() {
        // spec.md §8 scenario S6.
        let mut parent = Completion::new();
        parent.set_steps(2).unwrap();

        {
            let mut child = parent.child_mut();
            child.set_percentage(33);
        }
        assert_eq!(parent.percentage(), 16); // floor((0*100+33)/2) = 16
        assert_eq!(parent.child().unwrap().percentage(), 33);

        {
            let mut child = parent.child_mut();
            child.set_percentage(100);
        }
        assert_eq!(parent.percentage(), 50); // floor((0*100+100)/2) = 50

        parent.done().unwrap(); // current = 1, resets child, parent = 50

        {
            let mut child = parent.child_mut();
            child.set_percentage(25);
        }
        assert_eq!(parent.percentage(), 62); // floor((1*100+25)/2) = 62

        {
            let mut child = parent.child_mut();
            child.set_percentage(50);
        }
        assert_eq!(parent.percentage(), 75); // floor((1*100+50)/2) = 75

        {
            let mut child = parent.child_mut();
            child.set_percentage(100);
        }
        assert_eq!(parent.percentage(), 100); // floor((1*100+100)/2) = 100
    }

    #[test]
    fn percentage_monotonic_subscriber_sees_non_decreasing_sequence() {
        use std::sync::{Arc, Mutex};
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let mut c = Completion::new();
        c.on_percentage_changed(move |p| seen2.lock().unwrap().push(p));
        for p in [10, 10, 40, 30, 90, 100] {
            c.set_percentage(p);
        }
        let values = seen.lock().unwrap().clone();
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "{values:?}");
        assert_eq!(values, vec![10, 40, 90, 100]);
    }

    #[test]
    fn reset_clears_state_but_keeps_subscribers() {
        use std::sync::{Arc, Mutex};
        let count = Arc::new(Mutex::new(0));
        let count2 = count.clone();
        let mut c = Completion::new();
        c.on_percentage_changed(move |_| *count2.lock().unwrap() += 1);
        c.set_percentage(50);
        c.reset();
        assert_eq!(c.percentage(), 0);
        assert_eq!(c.steps(), 0);
        c.set_percentage(10);
        assert_eq!(*count.lock().unwrap(), 2);
    }

    proptest::proptest! {
        #[test]
        fn done_sequence_matches_floor_formula(steps in 1u32..20) {
            let mut c = Completion::new();
            c.set_steps(steps).unwrap();
            for k in 1..=steps {
                let pct = c.done().unwrap();
                prop_assert_eq!(pct, ((k * 100) / steps) as u8);
            }
            prop_assert_eq!(c.percentage(), 100);
        }
    }
}
