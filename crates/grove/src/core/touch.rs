//! Touch targets and hit testing.
//!
//! Hit testing walks the instance tree from the root, pruning with cached
//! bounding boxes and visiting children topmost-first. Text blocks expose
//! their fragments as extra targets interleaved with attachment children.

use crate::{
    core::{
        id::{InstanceId, Tag},
        instance::Instance,
        tree::InstanceTree,
    },
    geom::{Matrix4, Point, Rect},
    widgets::text::{FragmentSlot, TextFragmentTarget},
};

/// Something a pointer can land on.
pub trait TouchTarget {
    /// Tag events are addressed to.
    fn tag(&self) -> Tag;

    /// Is `p`, in local coordinates, inside the hit area?
    fn contains_point(&self, p: Point) -> bool;

    /// Local bounds of this target and everything under it.
    fn bounding_box(&self) -> Rect;

    /// Is `p` inside the bounding box? Used to prune whole subtrees.
    fn contains_point_in_bounding_box(&self, p: Point) -> bool {
        self.bounding_box().contains_point(p)
    }

    /// Can this target itself receive touches?
    fn can_handle_touch(&self) -> bool;

    /// Can targets under this one receive touches?
    fn can_children_handle_touch(&self) -> bool;

    /// Transform applied around the frame centre.
    fn transform(&self) -> Matrix4;

    /// Are children clipped to the hit area?
    fn is_clipping_content(&self) -> bool;

    /// Frame in the parent's content coordinates.
    fn frame(&self) -> Rect;
}

/// A borrowed view of one arena node.
#[derive(Debug, Clone, Copy)]
pub struct InstanceTarget<'a> {
    /// Owning tree, for bounding box computation.
    tree: &'a InstanceTree,
    /// Node id.
    id: InstanceId,
    /// The node.
    inst: &'a Instance,
}

impl<'a> InstanceTarget<'a> {
    /// View `id`, if it exists.
    pub fn new(tree: &'a InstanceTree, id: InstanceId) -> Option<Self> {
        let inst = tree.instance(id)?;
        Some(Self { tree, id, inst })
    }

    /// Node id.
    pub fn id(&self) -> InstanceId {
        self.id
    }
}

impl TouchTarget for InstanceTarget<'_> {
    fn tag(&self) -> Tag {
        self.inst.tag()
    }

    fn contains_point(&self, p: Point) -> bool {
        self.inst.contains_point(p)
    }

    fn bounding_box(&self) -> Rect {
        self.tree
            .bounding_box(self.id)
            .unwrap_or_else(|| self.inst.hit_rect())
    }

    fn can_handle_touch(&self) -> bool {
        self.inst.can_handle_touch()
    }

    fn can_children_handle_touch(&self) -> bool {
        self.inst.can_children_handle_touch()
    }

    fn transform(&self) -> Matrix4 {
        *self.inst.transform()
    }

    fn is_clipping_content(&self) -> bool {
        self.inst.is_clipping_content()
    }

    fn frame(&self) -> Rect {
        self.inst.layout().frame
    }
}

/// Names a touch target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRef {
    /// An arena node.
    Instance(InstanceId),
    /// A fragment of a text block.
    Fragment {
        /// The text block.
        owner: InstanceId,
        /// Fragment tag.
        tag: Tag,
    },
}

impl TargetRef {
    /// The arena node that owns this target.
    pub fn owner(&self) -> InstanceId {
        match self {
            Self::Instance(id) | Self::Fragment { owner: id, .. } => *id,
        }
    }
}

/// A resolved touch target.
#[derive(Debug)]
pub enum Target<'a> {
    /// An arena node.
    Instance(InstanceTarget<'a>),
    /// A text fragment.
    Fragment(&'a TextFragmentTarget),
}

impl Target<'_> {
    /// The target as a trait object.
    pub fn as_dyn(&self) -> &dyn TouchTarget {
        match self {
            Self::Instance(t) => t,
            Self::Fragment(f) => *f,
        }
    }
}

/// The outcome of a hit test.
#[derive(Debug, Clone, PartialEq)]
pub struct HitTestResult {
    /// Deepest accepting target.
    pub target: TargetRef,
    /// Its tag.
    pub tag: Tag,
    /// The point in the target's local coordinates.
    pub local_point: Point,
    /// Targets from the root down to `target`.
    pub path: Vec<TargetRef>,
}

/// Resolve a target reference.
pub fn resolve(tree: &InstanceTree, r: TargetRef) -> Option<Target<'_>> {
    match r {
        TargetRef::Instance(id) => InstanceTarget::new(tree, id).map(Target::Instance),
        TargetRef::Fragment { owner, tag } => tree
            .instance(owner)?
            .text_engine()?
            .fragment(tag)
            .map(|f| Target::Fragment(f.as_ref())),
    }
}

/// Touch-target children of `r`, in declared order. Text blocks list their
/// fragments and attachment children in fragment order, followed by children
/// no fragment refers to.
pub fn touch_children(tree: &InstanceTree, r: TargetRef) -> Vec<TargetRef> {
    let TargetRef::Instance(id) = r else {
        return Vec::new();
    };
    let Some(inst) = tree.instance(id) else {
        return Vec::new();
    };
    let Some(engine) = inst.text_engine() else {
        return inst
            .children()
            .iter()
            .map(|c| TargetRef::Instance(*c))
            .collect();
    };
    let mut out = Vec::with_capacity(engine.slots().len() + inst.children().len());
    let mut referenced = Vec::new();
    for slot in engine.slots() {
        match slot {
            FragmentSlot::Text(tag) => out.push(TargetRef::Fragment {
                owner: id,
                tag: *tag,
            }),
            FragmentSlot::Attachment(tag) => match tree.id_of(*tag) {
                Some(child) if inst.children().contains(&child) => {
                    referenced.push(child);
                    out.push(TargetRef::Instance(child));
                }
                _ => tracing::debug!("{}: attachment {tag} is not a child", inst.tag()),
            },
        }
    }
    out.extend(
        inst.children()
            .iter()
            .filter(|c| !referenced.contains(c))
            .map(|c| TargetRef::Instance(*c)),
    );
    out
}

/// Map a point in the parent's local coordinates into the local coordinates
/// of a child with the given frame and transform. Returns `None` when the
/// transform cannot be inverted.
fn to_child_local(p: Point, content_offset: Point, frame: Rect, transform: &Matrix4) -> Option<Point> {
    let q = p + content_offset;
    let q = if transform.is_identity() {
        q
    } else {
        transform
            .inverse_affine()
            .ok()?
            .transform_point_around(q, frame.center())
    };
    Some(q - frame.origin)
}

/// Find the deepest target under `p`, a point in the root's local
/// coordinates.
pub fn hit_test(tree: &InstanceTree, p: Point) -> Option<HitTestResult> {
    let root = tree.root()?;
    let mut path = Vec::new();
    let (target, local_point) = visit(tree, TargetRef::Instance(root), p, &mut path)?;
    let tag = resolve(tree, target)?.as_dyn().tag();
    Some(HitTestResult {
        target,
        tag,
        local_point,
        path,
    })
}

/// Recursive step of [`hit_test`].
fn visit(
    tree: &InstanceTree,
    r: TargetRef,
    p: Point,
    path: &mut Vec<TargetRef>,
) -> Option<(TargetRef, Point)> {
    let resolved = resolve(tree, r)?;
    let target = resolved.as_dyn();
    if !target.contains_point_in_bounding_box(p) {
        return None;
    }
    path.push(r);
    let descend = target.can_children_handle_touch()
        && (!target.is_clipping_content() || target.contains_point(p));
    if descend {
        let offset = tree
            .instance(r.owner())
            .filter(|_| matches!(r, TargetRef::Instance(_)))
            .map_or(Point::zero(), Instance::scroll_offset);
        for child in touch_children(tree, r).into_iter().rev() {
            let Some(c) = resolve(tree, child) else {
                continue;
            };
            let c = c.as_dyn();
            let Some(local) = to_child_local(p, offset, c.frame(), &c.transform()) else {
                tracing::debug!("{}: singular transform, skipped", c.tag());
                continue;
            };
            if let Some(hit) = visit(tree, child, local, path) {
                return Some(hit);
            }
        }
    }
    if target.can_handle_touch() && target.contains_point(p) {
        return Some((r, p));
    }
    path.pop();
    None
}
