//! Tests for offscreen child virtualization under a scroll view.

#[cfg(test)]
mod tests {
    use grove::{
        error::Result,
        event::NativeEvent,
        geom::{Point, Rect},
        native::NativeHandle,
        props::{ScrollProps, ViewProps},
        testing::harness::Harness,
    };

    fn clipped() -> ViewProps {
        ViewProps {
            remove_clipped_subviews: true,
            ..Default::default()
        }
    }

    /// A 100x200 scroll view (1) over a virtualizing container (2) holding
    /// rows 3, 4 and 5 at y = 0, 150 and 400.
    fn list() -> Result<Harness> {
        let mut h = Harness::new();
        h.create_with_frame(1, ScrollProps::default(), Rect::new(0.0, 0.0, 100.0, 200.0))?;
        h.create_with_frame(2, clipped(), Rect::new(0.0, 0.0, 100.0, 500.0))?;
        h.insert(1, 2, 0)?;
        for (i, y) in [0.0, 150.0, 400.0].into_iter().enumerate() {
            let tag = 3 + i as i32;
            h.create_with_frame(tag, ViewProps::default(), Rect::new(0.0, y, 100.0, 100.0))?;
            h.insert(2, tag, i)?;
        }
        h.tree.finalize_updates()?;
        Ok(h)
    }

    fn attached(h: &Harness) -> Result<Vec<NativeHandle>> {
        Ok(h.facade.native_children(h.outer(2)?))
    }

    fn rows(h: &Harness, tags: &[i32]) -> Result<Vec<NativeHandle>> {
        tags.iter().map(|t| h.outer(*t)).collect()
    }

    fn scroll_to(h: &mut Harness, y: f32) -> Result<()> {
        h.native_event(
            1,
            NativeEvent::Scroll {
                offset: Point::new(0.0, y),
            },
        )
    }

    #[test]
    fn only_rows_in_the_window_stay_attached() -> Result<()> {
        let mut h = list()?;
        assert_eq!(attached(&h)?, rows(&h, &[3, 4])?);

        scroll_to(&mut h, 100.0)?;
        assert_eq!(attached(&h)?, rows(&h, &[3, 4])?);

        scroll_to(&mut h, 350.0)?;
        assert_eq!(attached(&h)?, rows(&h, &[5])?);
        let children = h.tree.children(h.id(2)?);
        assert_eq!(children.len(), 3, "owned children are kept");

        scroll_to(&mut h, 120.0)?;
        assert_eq!(attached(&h)?, rows(&h, &[4])?);
        Ok(())
    }

    #[test]
    fn rows_are_reattached_in_order() -> Result<()> {
        let mut h = list()?;
        scroll_to(&mut h, 300.0)?;
        assert_eq!(attached(&h)?, rows(&h, &[5])?);
        scroll_to(&mut h, 0.0)?;
        assert_eq!(attached(&h)?, rows(&h, &[3, 4])?);
        scroll_to(&mut h, 140.0)?;
        assert_eq!(attached(&h)?, rows(&h, &[4])?);
        scroll_to(&mut h, 250.0)?;
        assert_eq!(attached(&h)?, rows(&h, &[4, 5])?);
        Ok(())
    }

    #[test]
    fn switching_off_attaches_everything() -> Result<()> {
        let mut h = list()?;
        scroll_to(&mut h, 350.0)?;
        h.props(2, ViewProps::default())?;
        assert_eq!(attached(&h)?, rows(&h, &[3, 4, 5])?);
        assert!(h.tree.get(3).is_some_and(|i| i.is_mounted()));
        Ok(())
    }

    #[test]
    fn config_can_disable_virtualization() -> Result<()> {
        let mut h = Harness::with_config(grove::config::Config {
            clipped_subviews: false,
            ..Default::default()
        });
        h.create_with_frame(1, ScrollProps::default(), Rect::new(0.0, 0.0, 100.0, 200.0))?;
        h.create_with_frame(2, clipped(), Rect::new(0.0, 0.0, 100.0, 500.0))?;
        h.create_with_frame(3, ViewProps::default(), Rect::new(0.0, 400.0, 100.0, 100.0))?;
        h.insert(1, 2, 0)?;
        h.insert(2, 3, 0)?;
        h.tree.finalize_updates()?;
        assert_eq!(attached(&h)?, rows(&h, &[3])?);
        Ok(())
    }

    #[test]
    fn detached_rows_do_not_count_towards_the_bounding_box() -> Result<()> {
        let mut h = list()?;
        let container = h.id(2)?;
        assert_eq!(
            h.tree.bounding_box(container),
            Some(Rect::new(0.0, 0.0, 100.0, 500.0))
        );
        h.layout(5, Rect::new(0.0, 900.0, 100.0, 100.0))?;
        assert_eq!(
            h.tree.bounding_box(container),
            Some(Rect::new(0.0, 0.0, 100.0, 500.0))
        );
        Ok(())
    }
}
