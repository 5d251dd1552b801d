//! Pointer hover and click routing.
//!
//! [`PointerRouter`] remembers the hover path from the last hit test and the
//! target a press started on. Each input produces a list of
//! [`PointerDispatch`]es for the tree to deliver through the owners'
//! emitters.

use serde::Serialize;

use crate::{
    core::{event::names, id::Tag, touch::{HitTestResult, TargetRef}},
    geom::Point,
};

/// Kind of pointer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Pointer moved.
    Move,
    /// Button or finger down.
    Down,
    /// Button or finger up.
    Up,
    /// The gesture was taken away.
    Cancel,
}

/// One pointer input in root coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    /// Input kind.
    pub kind: PointerKind,
    /// Position in root coordinates.
    pub position: Point,
}

impl PointerInput {
    /// Construct an input.
    pub fn new(kind: PointerKind, position: Point) -> Self {
        Self { kind, position }
    }
}

/// An event to deliver to one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDispatch {
    /// Receiving target.
    pub target: TargetRef,
    /// Event name.
    pub name: &'static str,
    /// Position in the target's local coordinates, when known.
    pub local: Option<Point>,
}

/// Payload of pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerPayload {
    /// Local x.
    pub x: f32,
    /// Local y.
    pub y: f32,
    /// Root x.
    pub page_x: f32,
    /// Root y.
    pub page_y: f32,
    /// Receiving tag.
    pub target: Tag,
}

impl PointerPayload {
    /// Build a payload. Without a local position the root position is used.
    pub fn new(target: Tag, local: Option<Point>, page: Point) -> Self {
        let l = local.unwrap_or(page);
        Self {
            x: l.x,
            y: l.y,
            page_x: page.x,
            page_y: page.y,
            target,
        }
    }
}

/// Hover and press tracking.
#[derive(Debug, Clone, Default)]
pub struct PointerRouter {
    /// Root-to-leaf hover path.
    hover: Vec<TargetRef>,
    /// Target the current press started on.
    pressed: Option<TargetRef>,
}

impl PointerRouter {
    /// Construct an idle router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current hover path.
    pub fn hover_path(&self) -> &[TargetRef] {
        &self.hover
    }

    /// Target of the press in progress.
    pub fn pressed(&self) -> Option<TargetRef> {
        self.pressed
    }

    /// Forget a target that left the tree.
    pub fn forget(&mut self, pred: impl Fn(&TargetRef) -> bool) {
        if let Some(i) = self.hover.iter().position(&pred) {
            self.hover.truncate(i);
        }
        if self.pressed.as_ref().is_some_and(&pred) {
            self.pressed = None;
        }
    }

    /// Route one input given the hit test at its position.
    pub fn route(&mut self, kind: PointerKind, hit: Option<&HitTestResult>) -> Vec<PointerDispatch> {
        if kind == PointerKind::Cancel {
            self.pressed = None;
            return self.retarget(&[], None);
        }
        let (path, target, local) = match hit {
            Some(h) => (h.path.as_slice(), Some(h.target), Some(h.local_point)),
            None => (&[][..], None, None),
        };
        let mut out = self.retarget(path, target.zip(local));
        match kind {
            PointerKind::Down => self.pressed = target,
            PointerKind::Up => {
                if let (Some(t), Some(p)) = (target, self.pressed.take())
                    && t == p
                {
                    out.push(PointerDispatch {
                        target: t,
                        name: names::CLICK,
                        local,
                    });
                }
            }
            PointerKind::Move | PointerKind::Cancel => {}
        }
        out
    }

    /// Replace the hover path, emitting leaves deepest-first and enters
    /// root-first for the part that changed.
    fn retarget(
        &mut self,
        path: &[TargetRef],
        hit: Option<(TargetRef, Point)>,
    ) -> Vec<PointerDispatch> {
        let common = self
            .hover
            .iter()
            .zip(path)
            .take_while(|(a, b)| a == b)
            .count();
        let mut out = Vec::new();
        for t in self.hover[common..].iter().rev() {
            out.push(PointerDispatch {
                target: *t,
                name: names::POINTER_LEAVE,
                local: None,
            });
        }
        for t in &path[common..] {
            let local = hit.filter(|(h, _)| h == t).map(|(_, p)| p);
            out.push(PointerDispatch {
                target: *t,
                name: names::POINTER_ENTER,
                local,
            });
        }
        self.hover = path.to_vec();
        out
    }
}
