//! Tests for text fragment targets and text wrapper management.

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use grove::{
        Tag,
        error::Result,
        geom::{Point, Rect},
        layout::LayoutDirection,
        native::NodeType,
        props::{TextProps, ViewProps},
        state::{Fragment, State, TextState},
        testing::harness::Harness,
        touch::{self, TargetRef},
    };

    fn text_state(fragments: Vec<Fragment>) -> State {
        State::Text(TextState {
            fragments,
            ..Default::default()
        })
    }

    fn hello_world(world_x: f32) -> State {
        text_state(vec![
            Fragment::text(10, "hello ", vec![Rect::new(0.0, 0.0, 50.0, 20.0)]),
            Fragment::text(11, "world", vec![Rect::new(world_x, 0.0, 50.0, 20.0)]),
        ])
    }

    #[test]
    fn fragment_targets_survive_relayout() -> Result<()> {
        let mut h = Harness::new();
        let id = h.create_with_frame(1, TextProps::default(), Rect::new(0.0, 0.0, 200.0, 40.0))?;
        h.state(1, hello_world(50.0))?;
        let fragment = |h: &Harness, tag: i32| {
            h.tree
                .instance(id)
                .and_then(|i| i.text_engine())
                .and_then(|e| e.fragment(Tag(tag)))
                .cloned()
        };
        let world = fragment(&h, 11).expect("fragment");

        h.state(1, hello_world(120.0))?;
        let again = fragment(&h, 11).expect("fragment");
        assert!(Rc::ptr_eq(&world, &again));
        assert_eq!(world.rects(), vec![Rect::new(120.0, 0.0, 50.0, 20.0)]);

        h.state(1, text_state(vec![Fragment::text(10, "hello", vec![])]))?;
        assert!(fragment(&h, 11).is_none());
        Ok(())
    }

    #[test]
    fn hit_test_lands_on_the_fragment() -> Result<()> {
        let mut h = Harness::new();
        let id = h.create_with_frame(1, TextProps::default(), Rect::new(0.0, 0.0, 200.0, 40.0))?;
        h.state(1, hello_world(50.0))?;

        let hit = h.tree.hit_test(Point::new(60.0, 10.0)).expect("hit");
        assert_eq!(hit.tag, Tag(11));
        assert_eq!(
            hit.target,
            TargetRef::Fragment {
                owner: id,
                tag: Tag(11)
            }
        );

        // Between fragments the block itself is the target.
        let hit = h.tree.hit_test(Point::new(150.0, 30.0)).expect("hit");
        assert_eq!(hit.target, TargetRef::Instance(id));
        Ok(())
    }

    #[test]
    fn split_span_is_hit_on_both_halves() -> Result<()> {
        let mut h = Harness::new();
        let id = h.create_with_frame(1, TextProps::default(), Rect::new(0.0, 0.0, 200.0, 40.0))?;
        h.state(
            1,
            text_state(vec![
                Fragment::text(5, "b", vec![Rect::new(0.0, 0.0, 40.0, 20.0)]),
                Fragment::text(6, "c", vec![Rect::new(50.0, 0.0, 40.0, 20.0)]),
                Fragment::text(5, "d", vec![Rect::new(100.0, 0.0, 40.0, 20.0)]),
            ]),
        )?;
        for x in [10.0, 110.0] {
            let hit = h.tree.hit_test(Point::new(x, 10.0)).expect("hit");
            assert_eq!(hit.tag, Tag(5), "x = {x}");
        }
        assert_eq!(h.tree.hit_test(Point::new(60.0, 10.0)).map(|r| r.tag), Some(Tag(6)));
        assert_eq!(
            touch::touch_children(&h.tree, TargetRef::Instance(id)),
            vec![
                TargetRef::Fragment { owner: id, tag: Tag(5) },
                TargetRef::Fragment { owner: id, tag: Tag(6) },
            ]
        );
        Ok(())
    }

    #[test]
    fn fragment_rects_extend_the_bounding_box() -> Result<()> {
        let mut h = Harness::new();
        let id = h.create_with_frame(1, TextProps::default(), Rect::new(0.0, 0.0, 100.0, 20.0))?;
        h.state(1, hello_world(90.0))?;
        assert_eq!(
            h.tree.bounding_box(id),
            Some(Rect::new(0.0, 0.0, 140.0, 20.0))
        );
        Ok(())
    }

    #[test]
    fn attachments_need_a_wrapper() -> Result<()> {
        let mut h = Harness::new();
        h.create_with_frame(1, ViewProps::default(), Rect::new(0.0, 0.0, 300.0, 100.0))?;
        h.create_with_frame(2, TextProps::default(), Rect::new(0.0, 0.0, 200.0, 40.0))?;
        h.create_with_frame(3, ViewProps::default(), Rect::new(100.0, 0.0, 20.0, 20.0))?;
        h.insert(1, 2, 0)?;
        h.insert(2, 3, 0)?;
        let text_node = h.outer(2)?;
        assert_eq!(h.facade.native_children(h.outer(1)?), vec![text_node]);
        assert!(h.facade.native_children(text_node).is_empty());

        h.state(
            2,
            text_state(vec![
                Fragment::text(10, "a", vec![Rect::new(0.0, 0.0, 100.0, 20.0)]),
                Fragment::attachment(3, Rect::new(100.0, 0.0, 20.0, 20.0)),
            ]),
        )?;
        let wrapper = h.outer(2)?;
        assert_ne!(wrapper, text_node);
        assert_eq!(h.facade.node_type(wrapper), Some(NodeType::Stack));
        assert_eq!(h.facade.native_children(h.outer(1)?), vec![wrapper]);
        assert_eq!(
            h.facade.native_children(wrapper),
            vec![text_node, h.outer(3)?]
        );

        h.state(2, hello_world(50.0))?;
        assert_eq!(h.outer(2)?, text_node);
        assert_eq!(h.facade.native_children(h.outer(1)?), vec![text_node]);
        assert_eq!(h.facade.node_type(wrapper), None);
        assert!(h.tree.get(3).is_some_and(|i| !i.is_mounted()));
        Ok(())
    }

    #[test]
    fn right_to_left_text_is_wrapped() -> Result<()> {
        let mut h = Harness::new();
        h.create_with_frame(1, TextProps::default(), Rect::new(0.0, 0.0, 200.0, 40.0))?;
        let text_node = h.outer(1)?;
        h.state(
            1,
            State::Text(TextState {
                direction: LayoutDirection::Rtl,
                ..Default::default()
            }),
        )?;
        assert_ne!(h.outer(1)?, text_node);
        assert_eq!(h.facade.native_children(h.outer(1)?), vec![text_node]);
        Ok(())
    }

    #[test]
    fn attachment_children_are_hit_in_fragment_order() -> Result<()> {
        let mut h = Harness::new();
        h.create_with_frame(1, TextProps::default(), Rect::new(0.0, 0.0, 200.0, 40.0))?;
        h.create_with_frame(3, ViewProps::default(), Rect::new(100.0, 0.0, 20.0, 20.0))?;
        h.insert(1, 3, 0)?;
        h.state(
            1,
            text_state(vec![
                Fragment::text(10, "a", vec![Rect::new(0.0, 0.0, 100.0, 20.0)]),
                Fragment::attachment(3, Rect::new(100.0, 0.0, 20.0, 20.0)),
            ]),
        )?;
        let hit = h.tree.hit_test(Point::new(110.0, 10.0)).expect("hit");
        assert_eq!(hit.tag, Tag(3));
        assert_eq!(hit.local_point, Point::new(10.0, 10.0));
        Ok(())
    }
}
