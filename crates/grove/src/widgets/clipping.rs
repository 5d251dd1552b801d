//! Offscreen child virtualization.
//!
//! A container that asks for clipped subviews keeps one bit per child: set
//! when the child's native subtree is detached because its frame lies outside
//! the visible scroll window. Children stay in the owned-children list either
//! way; only their native attachment changes.

use bitvec::vec::BitVec;

use crate::geom::Rect;

/// A native attachment change for one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// Detach the child at `child`.
    Detach {
        /// Position in the owned-children list.
        child: usize,
    },
    /// Attach the child at `child` at native position `native_index`.
    Attach {
        /// Position in the owned-children list.
        child: usize,
        /// Native sibling index: the number of attached preceding siblings.
        native_index: usize,
    },
}

/// Per-child clipped flags for one container.
#[derive(Debug, Clone, Default)]
pub struct ClippedSubviews {
    /// Set bits are detached children.
    clipped: BitVec,
    /// The next update rebuilds every child instead of diffing.
    needs_rebuild: bool,
}

impl ClippedSubviews {
    /// Track `len` attached children.
    pub fn new(len: usize) -> Self {
        Self {
            clipped: BitVec::repeat(false, len),
            needs_rebuild: true,
        }
    }

    /// Number of tracked children.
    pub fn len(&self) -> usize {
        self.clipped.len()
    }

    /// Return true if no children are tracked.
    pub fn is_empty(&self) -> bool {
        self.clipped.is_empty()
    }

    /// Is the child at `index` detached?
    pub fn is_clipped(&self, index: usize) -> bool {
        self.clipped.get(index).is_some_and(|b| *b)
    }

    /// Number of attached children before `index`.
    pub fn native_index(&self, index: usize) -> usize {
        let end = index.min(self.clipped.len());
        self.clipped[..end].count_zeros()
    }

    /// Record an attached child inserted at `index`.
    pub fn insert(&mut self, index: usize) {
        let index = index.min(self.clipped.len());
        self.clipped.insert(index, false);
        self.needs_rebuild = true;
    }

    /// Forget the child at `index`, returning whether it was detached.
    pub fn remove(&mut self, index: usize) -> bool {
        self.needs_rebuild = true;
        if index < self.clipped.len() {
            self.clipped.remove(index)
        } else {
            false
        }
    }

    /// Move the flag for a reordered child.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.clipped.len() {
            return;
        }
        let flag = self.clipped.remove(from);
        let to = to.min(self.clipped.len());
        self.clipped.insert(to, flag);
        self.needs_rebuild = true;
    }

    /// Will the next update rebuild every child?
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    /// Compare each child frame against `window` and return the attachment
    /// changes, detaches first. After a children change every attached child
    /// is detached and the visible ones attached again in order; otherwise
    /// only children whose visibility flipped are touched.
    pub fn update(&mut self, frames: &[Rect], window: Rect) -> Vec<Toggle> {
        if frames.len() != self.clipped.len() {
            self.clipped.resize(frames.len(), false);
            self.needs_rebuild = true;
        }
        let visible: Vec<bool> = frames.iter().map(|f| f.overlaps(&window)).collect();
        let mut out = Vec::new();
        if self.needs_rebuild {
            self.needs_rebuild = false;
            for i in (0..self.clipped.len()).rev() {
                if !self.clipped[i] {
                    self.clipped.set(i, true);
                    out.push(Toggle::Detach { child: i });
                }
            }
        } else {
            for (i, vis) in visible.iter().enumerate() {
                if !vis && !self.clipped[i] {
                    self.clipped.set(i, true);
                    out.push(Toggle::Detach { child: i });
                }
            }
        }
        for (i, vis) in visible.iter().enumerate() {
            if *vis && self.clipped[i] {
                let native_index = self.native_index(i);
                self.clipped.set(i, false);
                out.push(Toggle::Attach {
                    child: i,
                    native_index,
                });
            }
        }
        out
    }

    /// Attach every detached child. Used when virtualization is switched off.
    pub fn release(mut self) -> Vec<Toggle> {
        let mut out = Vec::new();
        for i in 0..self.clipped.len() {
            if self.clipped[i] {
                let native_index = self.native_index(i);
                self.clipped.set(i, false);
                out.push(Toggle::Attach {
                    child: i,
                    native_index,
                });
            }
        }
        out
    }
}
