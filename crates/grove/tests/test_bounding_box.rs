//! Tests for cached bounding boxes and dirty propagation.

#[cfg(test)]
mod tests {
    use grove::{
        InstanceId,
        error::Result,
        geom::{EdgeInsets, Matrix4, Point, Rect},
        props::{Overflow, ViewProps},
        testing::harness::Harness,
    };
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn view() -> ViewProps {
        ViewProps::default()
    }

    /// Build a random tree of unclipped views and return each node with its
    /// frame in root coordinates.
    fn random_tree(h: &mut Harness, rng: &mut StdRng, n: i32) -> Result<Vec<(InstanceId, Rect)>> {
        let root = h.create_with_frame(1, view(), Rect::new(0.0, 0.0, 50.0, 50.0))?;
        let mut placed = vec![(1, root, Rect::new(0.0, 0.0, 50.0, 50.0))];
        for tag in 2..=n {
            let (ptag, _, pabs) = placed[rng.random_range(0..placed.len())];
            let frame = Rect::new(
                rng.random_range(-40.0..80.0),
                rng.random_range(-40.0..80.0),
                rng.random_range(1.0..60.0),
                rng.random_range(1.0..60.0),
            );
            let id = h.create_with_frame(tag, view(), frame)?;
            let index = h.tree.children(h.id(ptag)?).len();
            h.insert(ptag, tag, index)?;
            placed.push((tag, id, frame.offset_by(pabs.origin)));
        }
        Ok(placed.into_iter().map(|(_, id, r)| (id, r)).collect())
    }

    fn contains(outer: Rect, inner: Rect) -> bool {
        let eps = 1e-3;
        outer.min_x() <= inner.min_x() + eps
            && outer.min_y() <= inner.min_y() + eps
            && outer.max_x() + eps >= inner.max_x()
            && outer.max_y() + eps >= inner.max_y()
    }

    #[test]
    fn root_box_covers_every_descendant() -> Result<()> {
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut h = Harness::new();
            let nodes = random_tree(&mut h, &mut rng, 24)?;
            let root = nodes[0].0;
            let bb = h.tree.bounding_box(root).expect("root box");
            for (_, abs) in &nodes {
                assert!(contains(bb, *abs), "seed {seed}: {bb:?} misses {abs:?}");
            }
        }
        Ok(())
    }

    #[test]
    fn recomputation_is_idempotent() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut h = Harness::new();
        let nodes = random_tree(&mut h, &mut rng, 16)?;
        let first: Vec<Option<Rect>> = nodes.iter().map(|(id, _)| h.tree.bounding_box(*id)).collect();
        let cached: Vec<Option<Rect>> = nodes.iter().map(|(id, _)| h.tree.bounding_box(*id)).collect();
        assert_eq!(first, cached);
        for (id, _) in &nodes {
            h.tree.mark_bounding_box_dirty(*id);
        }
        let again: Vec<Option<Rect>> = nodes.iter().map(|(id, _)| h.tree.bounding_box(*id)).collect();
        assert_eq!(first, again);
        Ok(())
    }

    #[test]
    fn clipping_nodes_still_count_their_children() -> Result<()> {
        let mut h = Harness::new();
        let clip = h.create_with_frame(
            1,
            ViewProps {
                overflow: Overflow::Hidden,
                hit_slop: EdgeInsets::uniform(5.0),
                ..view()
            },
            Rect::new(0.0, 0.0, 100.0, 100.0),
        )?;
        h.create_with_frame(2, view(), Rect::new(80.0, 80.0, 100.0, 100.0))?;
        h.insert(1, 2, 0)?;
        assert_eq!(
            h.tree.bounding_box(clip),
            Some(Rect::new(-5.0, -5.0, 185.0, 185.0))
        );

        // The clip still bounds hit testing.
        assert_eq!(h.tree.hit_test(Point::new(90.0, 90.0)).map(|r| r.tag), Some(grove::Tag(2)));
        assert!(h.tree.hit_test(Point::new(150.0, 150.0)).is_none());
        Ok(())
    }

    #[test]
    fn child_transform_is_applied_around_its_centre() -> Result<()> {
        let mut h = Harness::new();
        let root = h.create_with_frame(1, view(), Rect::new(0.0, 0.0, 10.0, 10.0))?;
        h.create_with_frame(
            2,
            ViewProps {
                transform: Matrix4::scale(2.0, 2.0),
                ..view()
            },
            Rect::new(20.0, 20.0, 10.0, 10.0),
        )?;
        h.insert(1, 2, 0)?;
        let bb = h.tree.bounding_box(root).expect("root box");
        assert!(bb.approx_eq(&Rect::new(0.0, 0.0, 35.0, 35.0), 1e-4), "{bb:?}");
        Ok(())
    }

    #[test]
    fn layout_change_reaches_unclipped_ancestors() -> Result<()> {
        let mut h = Harness::new();
        let root = h.create_with_frame(1, view(), Rect::new(0.0, 0.0, 10.0, 10.0))?;
        h.create_with_frame(2, view(), Rect::new(0.0, 0.0, 10.0, 10.0))?;
        h.insert(1, 2, 0)?;
        assert_eq!(h.tree.bounding_box(root), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        h.layout(2, Rect::new(50.0, 0.0, 10.0, 10.0))?;
        assert_eq!(h.tree.bounding_box(root), Some(Rect::new(0.0, 0.0, 60.0, 10.0)));
        Ok(())
    }

    #[test]
    fn hit_test_finds_the_topmost_deepest_target() -> Result<()> {
        let mut h = Harness::new();
        h.create_with_frame(1, view(), Rect::new(0.0, 0.0, 200.0, 200.0))?;
        h.create_with_frame(2, view(), Rect::new(10.0, 10.0, 100.0, 100.0))?;
        h.create_with_frame(3, view(), Rect::new(50.0, 50.0, 100.0, 100.0))?;
        h.create_with_frame(4, view(), Rect::new(150.0, 150.0, 20.0, 20.0))?;
        h.insert(1, 2, 0)?;
        h.insert(1, 3, 1)?;
        h.insert(2, 4, 0)?;

        let hit = h.tree.hit_test(Point::new(60.0, 60.0)).expect("hit");
        assert_eq!(hit.tag, grove::Tag(3));
        assert_eq!(hit.local_point, Point::new(10.0, 10.0));

        // Outside its parent's frame but inside the parent's bounding box.
        let hit = h.tree.hit_test(Point::new(165.0, 165.0)).expect("hit");
        assert_eq!(hit.tag, grove::Tag(4));
        assert_eq!(hit.path.len(), 3);

        assert!(h.tree.hit_test(Point::new(500.0, 500.0)).is_none());
        Ok(())
    }
}
