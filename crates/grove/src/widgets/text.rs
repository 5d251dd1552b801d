//! Text blocks split into per-fragment touch targets.
//!
//! Every text fragment of a block gets a lightweight touch target holding its
//! glyph-run rectangles. Targets are keyed by fragment tag and reused across
//! layout updates so that a pointer interaction in flight keeps pointing at
//! the same object after a reflow.

use std::{cell::RefCell, collections::HashMap, mem, rc::Rc};

use crate::{
    core::{
        id::Tag,
        layout::LayoutDirection,
        native::{NativeHandle, ObjectHandle},
        state::{FragmentKind, TextState},
        touch::TouchTarget,
    },
    geom::{Matrix4, Point, Rect},
};

/// Touch target for one text fragment.
#[derive(Debug)]
pub struct TextFragmentTarget {
    /// Fragment tag.
    tag: Tag,
    /// Glyph-run rectangles in the block's local coordinates.
    rects: RefCell<Vec<Rect>>,
}

impl TextFragmentTarget {
    /// Construct a target with no rectangles.
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            rects: RefCell::new(Vec::new()),
        }
    }

    /// Copy of the glyph-run rectangles.
    pub fn rects(&self) -> Vec<Rect> {
        self.rects.borrow().clone()
    }

    /// Drop every rectangle, keeping identity.
    pub fn clear_rects(&self) {
        self.rects.borrow_mut().clear();
    }

    /// Append glyph-run rectangles.
    pub fn extend_rects(&self, rects: &[Rect]) {
        self.rects.borrow_mut().extend_from_slice(rects);
    }

    /// Is `p` inside any glyph run?
    pub fn hits(&self, p: Point) -> bool {
        self.rects.borrow().iter().any(|r| r.contains_point(p))
    }

    /// Union of the glyph runs.
    pub fn rects_bounds(&self) -> Option<Rect> {
        let rects = self.rects.borrow();
        let mut it = rects.iter();
        let first = *it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }
}

impl TouchTarget for TextFragmentTarget {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn contains_point(&self, p: Point) -> bool {
        self.hits(p)
    }

    fn bounding_box(&self) -> Rect {
        self.rects_bounds().unwrap_or_else(Rect::zero)
    }

    fn can_handle_touch(&self) -> bool {
        true
    }

    fn can_children_handle_touch(&self) -> bool {
        false
    }

    fn transform(&self) -> Matrix4 {
        Matrix4::IDENTITY
    }

    fn is_clipping_content(&self) -> bool {
        false
    }

    /// Glyph runs are already in block coordinates.
    fn frame(&self) -> Rect {
        Rect::zero()
    }
}

/// A touch-target child of a text block, in fragment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentSlot {
    /// A text fragment target.
    Text(Tag),
    /// The attachment child instance with this tag.
    Attachment(Tag),
}

/// Fragment targets and native structure of one text block.
#[derive(Debug)]
pub struct TextEngine {
    /// The native text primitive.
    text_node: NativeHandle,
    /// Wrapper container, present when the block needs one.
    wrapper: Option<NativeHandle>,
    /// Fragment targets by tag.
    targets: HashMap<Tag, Rc<TextFragmentTarget>>,
    /// Slots in fragment order.
    slots: Vec<FragmentSlot>,
    /// Paragraph last given to the text node.
    paragraph: Option<ObjectHandle>,
}

impl TextEngine {
    /// Construct an engine rendering through `text_node`.
    pub fn new(text_node: NativeHandle) -> Self {
        Self {
            text_node,
            wrapper: None,
            targets: HashMap::new(),
            slots: Vec::new(),
            paragraph: None,
        }
    }

    /// Does this layout need a wrapping container? The single-node text
    /// primitive can neither host inline children nor compose right-to-left
    /// content.
    pub fn requires_wrapper(state: &TextState) -> bool {
        state.direction == LayoutDirection::Rtl || state.fragments.iter().any(|f| f.is_attachment())
    }

    /// The native text primitive.
    pub fn text_node(&self) -> NativeHandle {
        self.text_node
    }

    /// The wrapper container, if any.
    pub fn wrapper(&self) -> Option<NativeHandle> {
        self.wrapper
    }

    /// Replace the wrapper, returning the previous one.
    pub fn set_wrapper(&mut self, wrapper: Option<NativeHandle>) -> Option<NativeHandle> {
        mem::replace(&mut self.wrapper, wrapper)
    }

    /// The node attached to the parent: the wrapper if present.
    pub fn outer(&self) -> NativeHandle {
        self.wrapper.unwrap_or(self.text_node)
    }

    /// Record the paragraph, returning true if it changed.
    pub fn set_paragraph(&mut self, paragraph: Option<ObjectHandle>) -> bool {
        if self.paragraph == paragraph {
            return false;
        }
        self.paragraph = paragraph;
        true
    }

    /// Rebuild fragment targets from a layout. Targets whose tag survives are
    /// reused with fresh rectangles; the rest are dropped. Fragments sharing a
    /// tag, such as the halves of a span split by a nested span, feed one
    /// target that holds all of their rectangles and occupies the slot of the
    /// first.
    pub fn rebuild(&mut self, state: &TextState) {
        let mut targets: HashMap<Tag, Rc<TextFragmentTarget>> =
            HashMap::with_capacity(state.fragments.len());
        let mut slots = Vec::with_capacity(state.fragments.len());
        for fragment in &state.fragments {
            match fragment.kind {
                FragmentKind::Attachment => slots.push(FragmentSlot::Attachment(fragment.tag)),
                FragmentKind::Text(_) => {
                    if let Some(target) = targets.get(&fragment.tag) {
                        target.extend_rects(&fragment.rects);
                        continue;
                    }
                    let target = self
                        .targets
                        .remove(&fragment.tag)
                        .unwrap_or_else(|| Rc::new(TextFragmentTarget::new(fragment.tag)));
                    target.clear_rects();
                    target.extend_rects(&fragment.rects);
                    targets.insert(fragment.tag, target);
                    slots.push(FragmentSlot::Text(fragment.tag));
                }
            }
        }
        tracing::trace!(
            "text fragments rebuilt: {} kept or created, {} dropped",
            targets.len(),
            self.targets.len()
        );
        self.targets = targets;
        self.slots = slots;
    }

    /// Fragment target for `tag`.
    pub fn fragment(&self, tag: Tag) -> Option<&Rc<TextFragmentTarget>> {
        self.targets.get(&tag)
    }

    /// Fragment targets in fragment order.
    pub fn fragments(&self) -> impl Iterator<Item = &Rc<TextFragmentTarget>> {
        self.slots.iter().filter_map(|s| match s {
            FragmentSlot::Text(tag) => self.targets.get(tag),
            FragmentSlot::Attachment(_) => None,
        })
    }

    /// Touch-target slots in fragment order.
    pub fn slots(&self) -> &[FragmentSlot] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Fragment;

    fn state(fragments: Vec<Fragment>) -> TextState {
        TextState {
            fragments,
            ..Default::default()
        }
    }

    #[test]
    fn identity_is_preserved_by_tag() {
        let mut engine = TextEngine::new(NativeHandle(1));
        engine.rebuild(&state(vec![
            Fragment::text(1, "a", vec![Rect::new(0.0, 0.0, 10.0, 10.0)]),
            Fragment::text(2, "b", vec![Rect::new(10.0, 0.0, 10.0, 10.0)]),
        ]));
        let a = Rc::clone(engine.fragment(Tag(1)).unwrap());
        let b = Rc::clone(engine.fragment(Tag(2)).unwrap());

        engine.rebuild(&state(vec![
            Fragment::text(2, "b", vec![Rect::new(0.0, 0.0, 10.0, 10.0)]),
            Fragment::text(3, "c", vec![Rect::new(10.0, 0.0, 10.0, 10.0)]),
        ]));
        assert!(Rc::ptr_eq(&b, engine.fragment(Tag(2)).unwrap()));
        assert_eq!(b.rects(), vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
        assert!(engine.fragment(Tag(1)).is_none());
        assert!(engine.fragment(Tag(3)).is_some());
        // Only the test still holds the dropped target.
        assert_eq!(Rc::strong_count(&a), 1);
    }

    #[test]
    fn wrapped_fragment_keeps_every_rect() {
        let mut engine = TextEngine::new(NativeHandle(1));
        engine.rebuild(&state(vec![Fragment::text(
            1,
            "long",
            vec![
                Rect::new(50.0, 0.0, 50.0, 10.0),
                Rect::new(0.0, 10.0, 30.0, 10.0),
            ],
        )]));
        let f = engine.fragment(Tag(1)).unwrap();
        assert!(f.contains_point(Point::new(10.0, 15.0)));
        assert!(!f.contains_point(Point::new(10.0, 5.0)));
        assert_eq!(f.rects_bounds(), Some(Rect::new(0.0, 0.0, 100.0, 20.0)));
        assert_eq!(f.tag(), Tag(1));
    }

    #[test]
    fn split_span_collects_every_rect() {
        let mut engine = TextEngine::new(NativeHandle(1));
        let split = state(vec![
            Fragment::text(5, "b", vec![Rect::new(0.0, 0.0, 40.0, 20.0)]),
            Fragment::text(6, "c", vec![Rect::new(50.0, 0.0, 40.0, 20.0)]),
            Fragment::text(5, "d", vec![Rect::new(100.0, 0.0, 40.0, 20.0)]),
        ]);
        engine.rebuild(&split);
        let outer = Rc::clone(engine.fragment(Tag(5)).unwrap());
        assert_eq!(
            outer.rects(),
            vec![
                Rect::new(0.0, 0.0, 40.0, 20.0),
                Rect::new(100.0, 0.0, 40.0, 20.0)
            ]
        );
        assert_eq!(
            engine.slots(),
            &[FragmentSlot::Text(Tag(5)), FragmentSlot::Text(Tag(6))]
        );

        // A relayout replaces the rectangles rather than piling them up.
        engine.rebuild(&split);
        assert!(Rc::ptr_eq(&outer, engine.fragment(Tag(5)).unwrap()));
        assert_eq!(outer.rects().len(), 2);
    }

    #[test]
    fn wrapper_requirement() {
        let plain = state(vec![Fragment::text(1, "a", vec![])]);
        assert!(!TextEngine::requires_wrapper(&plain));
        let rtl = TextState {
            direction: LayoutDirection::Rtl,
            ..plain.clone()
        };
        assert!(TextEngine::requires_wrapper(&rtl));
        let attached = state(vec![
            Fragment::text(1, "a", vec![]),
            Fragment::attachment(9, Rect::new(0.0, 0.0, 5.0, 5.0)),
        ]);
        assert!(TextEngine::requires_wrapper(&attached));
    }

    #[test]
    fn slots_follow_fragment_order() {
        let mut engine = TextEngine::new(NativeHandle(1));
        engine.rebuild(&state(vec![
            Fragment::text(1, "a", vec![]),
            Fragment::attachment(9, Rect::zero()),
            Fragment::text(2, "b", vec![]),
        ]));
        assert_eq!(
            engine.slots(),
            &[
                FragmentSlot::Text(Tag(1)),
                FragmentSlot::Attachment(Tag(9)),
                FragmentSlot::Text(Tag(2))
            ]
        );
        assert_eq!(engine.fragments().count(), 2);
    }
}
