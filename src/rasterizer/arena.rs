//! Fragment arena backing the per-pixel transparency lists
//!
//! Fragments are handed out from pre-allocated generations. A full generation
//! is never reallocated: a new one with twice the capacity takes over as the
//! head and the old one stays alive until the next frame's reset, so fragment
//! handles stay valid for the whole frame.

use super::types::Rgba;

/// Handle to a fragment stored in a [`FragmentArena`]
///
/// Only valid until the arena is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRef {
    generation: u32,
    slot: u32,
}

/// One translucent sample at a pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub color: Rgba,
    pub depth: f32,
    /// Next fragment in the same pixel's list
    pub next: Option<FragmentRef>,
}

impl Fragment {
    pub fn new(color: Rgba, depth: f32) -> Self {
        Self { color, depth, next: None }
    }
}

/// A fixed block of fragment storage
#[derive(Debug)]
struct Generation {
    nodes: Vec<Fragment>,
    size: usize,
}

impl Generation {
    fn with_capacity(size: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(size),
            size,
        }
    }

    fn is_full(&self) -> bool {
        self.nodes.len() >= self.size
    }
}

/// Growable pool of [`Fragment`]s
///
/// Generations are kept oldest first; the last one is the head that serves
/// new allocations.
#[derive(Debug)]
pub struct FragmentArena {
    generations: Vec<Generation>,
    epoch: u64,
}

impl FragmentArena {
    /// Create an arena with a single generation of `initial_capacity` slots
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            generations: vec![Generation::with_capacity(initial_capacity.max(1))],
            epoch: 0,
        }
    }

    fn head(&self) -> &Generation {
        // never empty: `new` pushes one generation and `reset` keeps one
        &self.generations[self.generations.len() - 1]
    }

    /// Store a fragment and return its handle, growing the chain when the
    /// head generation is exhausted
    pub fn allocate(&mut self, fragment: Fragment) -> FragmentRef {
        if self.head().is_full() {
            let size = self.head().size * 2;
            tracing::debug!(
                generation = self.generations.len(),
                capacity = size,
                "fragment arena exhausted, adding generation"
            );
            self.generations.push(Generation::with_capacity(size));
        }

        let generation = self.generations.len() - 1;
        let head = &mut self.generations[generation];
        let slot = head.nodes.len();
        head.nodes.push(fragment);

        FragmentRef {
            generation: generation as u32,
            slot: slot as u32,
        }
    }

    pub fn get(&self, r: FragmentRef) -> &Fragment {
        &self.generations[r.generation as usize].nodes[r.slot as usize]
    }

    pub fn get_mut(&mut self, r: FragmentRef) -> &mut Fragment {
        &mut self.generations[r.generation as usize].nodes[r.slot as usize]
    }

    /// Release every older generation and rewind the head
    ///
    /// The head's storage is kept, so a frame that needed a big pool leaves a
    /// big enough pool behind for the next one. Invalidates all handles.
    pub fn reset(&mut self) {
        let keep_from = self.generations.len() - 1;
        self.generations.drain(..keep_from);
        self.generations[0].nodes.clear();
        self.epoch += 1;
    }

    /// Number of generations in the chain
    pub fn generations(&self) -> usize {
        self.generations.len()
    }

    /// Capacity of the head generation
    pub fn head_capacity(&self) -> usize {
        self.head().size
    }

    /// Slots used in the head generation
    pub fn head_used(&self) -> usize {
        self.head().nodes.len()
    }

    /// Live fragments across all generations
    pub fn len(&self) -> usize {
        self.generations.iter().map(|g| g.nodes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of resets so far
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}
