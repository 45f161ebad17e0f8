//! Nerve state machines.
//!
//! A [`Spine`] only stores the current nerve and how many logical frames
//! have elapsed since it was entered. Transition logic belongs to each
//! actor class, typically as a [`NerveTable`] of per-nerve handlers that
//! inspect the step counter and call `set_nerve`.

use std::collections::HashMap;
use std::hash::Hash;

/// Current nerve plus dwell time.
///
/// Constructed with an initial nerve so the state can always be read.
#[derive(Debug, Clone, PartialEq)]
pub struct Spine<N> {
    current_nerve: N,
    nerve_step: f32,
}

impl<N: Copy + PartialEq> Spine<N> {
    pub fn new(initial: N) -> Self {
        Self {
            current_nerve: initial,
            nerve_step: 0.0,
        }
    }

    /// Enters `nerve` and resets the step counter. Setting the nerve that
    /// is already current also restarts the counter.
    pub fn set_nerve(&mut self, nerve: N) {
        self.current_nerve = nerve;
        self.nerve_step = 0.0;
    }

    /// Advances the step counter. `delta_frames` must be finite and
    /// non-negative; it is not clamped.
    pub fn update(&mut self, delta_frames: f32) {
        self.nerve_step += delta_frames;
    }

    pub fn current_nerve(&self) -> N {
        self.current_nerve
    }

    pub fn nerve_step(&self) -> f32 {
        self.nerve_step
    }

    pub fn is_nerve(&self, nerve: N) -> bool {
        self.current_nerve == nerve
    }

    /// True on the first tick spent in the current nerve.
    pub fn is_first_step(&self) -> bool {
        self.nerve_step == 0.0
    }

    /// True once at least `frames` have elapsed in the current nerve.
    pub fn is_greater_step(&self, frames: f32) -> bool {
        self.nerve_step >= frames
    }
}

pub type NerveHandler<T> = fn(&mut T);

/// Maps nerve tags to the handler run while that nerve is current.
pub struct NerveTable<N, T> {
    handlers: HashMap<N, NerveHandler<T>>,
}

impl<N, T> Default for NerveTable<N, T> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<N, T> std::fmt::Debug for NerveTable<N, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NerveTable")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<N: Copy + Eq + Hash, T> NerveTable<N, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, nerve: N, handler: NerveHandler<T>) -> Self {
        self.register(nerve, handler);
        self
    }

    /// Registers `handler` for `nerve`, replacing any previous one.
    pub fn register(&mut self, nerve: N, handler: NerveHandler<T>) {
        self.handlers.insert(nerve, handler);
    }

    pub fn contains(&self, nerve: N) -> bool {
        self.handlers.contains_key(&nerve)
    }

    /// Runs the handler for `nerve` on `target`. Returns `false` when no
    /// handler is registered.
    pub fn execute(&self, nerve: N, target: &mut T) -> bool {
        match self.handlers.get(&nerve) {
            Some(handler) => {
                handler(target);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Door {
        Closed,
        Opening,
        Open,
    }

    #[test]
    fn set_nerve_resets_step() {
        let mut spine = Spine::new(Door::Closed);
        spine.update(12.0);
        for nerve in [Door::Closed, Door::Opening, Door::Open] {
            spine.update(3.0);
            spine.set_nerve(nerve);
            assert_eq!(spine.nerve_step(), 0.0);
            assert_eq!(spine.current_nerve(), nerve);
        }
    }

    #[test]
    fn updates_are_additive() {
        let mut spine = Spine::new(Door::Closed);
        spine.update(1.5);
        spine.update(2.25);
        assert_eq!(spine.nerve_step(), 3.75);
        assert!(spine.is_greater_step(3.5));
        assert!(!spine.is_first_step());
    }

    struct Counter {
        spine: Spine<Door>,
        ticks: u32,
    }

    fn closed(counter: &mut Counter) {
        counter.ticks += 1;
        if counter.spine.is_greater_step(2.0) {
            counter.spine.set_nerve(Door::Opening);
        }
    }

    #[test]
    fn table_dispatches_on_current_nerve() {
        let table = NerveTable::new().with(Door::Closed, closed as NerveHandler<Counter>);
        let mut counter = Counter {
            spine: Spine::new(Door::Closed),
            ticks: 0,
        };

        for _ in 0..3 {
            let nerve = counter.spine.current_nerve();
            table.execute(nerve, &mut counter);
            counter.spine.update(1.0);
        }
        assert_eq!(counter.ticks, 3);
        assert!(counter.spine.is_nerve(Door::Opening));
        assert!(!table.execute(Door::Opening, &mut counter));
    }
}
