// Possible worlds: the tonality currently governing interpretation.
//
// The analysis always starts in a `Primary` world (the candidate tonality).
// A tonicization pushes a `Secondary` world whose parent is the world below
// it; resolving back to the parent pops it. `WorldStack` enforces the depth
// bound (2 by default, i.e. the two-worlds model) and never pops the
// primary world.
//
// Each frame also remembers the functional state that was current in the
// parent world when the frame was pushed, so that a return to the parent
// can resume from it when the chord before the return has no diatonic
// meaning there.
//
// Stacks are compared and ordered structurally; the search engine keys its
// memo of failed states on them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::function::FunctionalState;
use crate::tonality::Tonality;

/// An active tonality context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum World {
    Primary(Tonality),
    Secondary { parent: Tonality, target: Tonality },
}

impl World {
    /// The tonality interpreting chords while this world is on top.
    pub fn tonality(&self) -> Tonality {
        match *self {
            World::Primary(tonality) => tonality,
            World::Secondary { target, .. } => target,
        }
    }

    pub fn parent(&self) -> Option<Tonality> {
        match *self {
            World::Primary(_) => None,
            World::Secondary { parent, .. } => Some(parent),
        }
    }

    pub fn is_secondary(&self) -> bool {
        matches!(self, World::Secondary { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Frame {
    world: World,
    /// Parent-world state at the moment this frame was pushed.
    entry_state: FunctionalState,
}

/// Bounded stack of worlds with the primary world at the bottom.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorldStack {
    frames: SmallVec<[Frame; 2]>,
    max_depth: usize,
}

impl WorldStack {
    /// A stack holding only `Primary(primary)`. `max_depth` counts the
    /// primary world, so 1 disables tonicization entirely.
    pub fn new(primary: Tonality, max_depth: usize) -> Self {
        let mut frames = SmallVec::new();
        frames.push(Frame {
            world: World::Primary(primary),
            entry_state: FunctionalState::Tonic,
        });
        WorldStack {
            frames,
            max_depth: max_depth.max(1),
        }
    }

    pub fn top(&self) -> &World {
        // `new` pushes the primary frame and `pop` never removes it.
        &self.frames[self.frames.len() - 1].world
    }

    pub fn primary(&self) -> Tonality {
        self.frames[0].world.tonality()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn can_push(&self) -> bool {
        self.frames.len() < self.max_depth
    }

    pub fn is_primary_only(&self) -> bool {
        self.frames.len() == 1
    }

    /// Push a secondary world on `target`. Returns the new top world, or
    /// `None` when the depth bound is reached.
    pub fn push_secondary(&mut self, target: Tonality, entry_state: FunctionalState) -> Option<World> {
        if !self.can_push() {
            return None;
        }
        let world = World::Secondary {
            parent: self.top().tonality(),
            target,
        };
        self.frames.push(Frame { world, entry_state });
        Some(world)
    }

    /// Pop the top secondary world, returning it with its entry state.
    /// The primary world is never popped.
    pub fn pop_secondary(&mut self) -> Option<(World, FunctionalState)> {
        if self.is_primary_only() {
            return None;
        }
        self.frames.pop().map(|frame| (frame.world, frame.entry_state))
    }

    /// Worlds from bottom (primary) to top.
    pub fn worlds(&self) -> impl Iterator<Item = &World> {
        self.frames.iter().map(|frame| &frame.world)
    }
}
