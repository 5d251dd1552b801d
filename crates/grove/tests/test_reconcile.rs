//! Tests for props reconciliation, the commit protocol and instance lifetime.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use grove::{
        Commit, Mutation, Tag,
        error::{Error, Result},
        event::{NativeEvent, names},
        geom::{Matrix4, Rect},
        layout::LayoutMetrics,
        native::{AttributeId, AttributeValue, NativeEventKind},
        props::{Accessibility, ImageProps, Props, ScrollProps, TextInputProps, ViewProps},
        testing::{facade::NativeCall, harness::Harness},
    };

    fn labelled(label: Option<&str>, native_id: Option<&str>, by: Option<&str>) -> ViewProps {
        ViewProps {
            native_id: native_id.map(String::from),
            accessibility: Accessibility {
                label: label.map(String::from),
                labelled_by: by.map(String::from),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn reapplying_identical_props_makes_no_native_calls() -> Result<()> {
        let mut h = Harness::new();
        let props = ScrollProps {
            base: ViewProps {
                opacity: 0.5,
                transform: Matrix4::translation(3.0, 4.0),
                ..labelled(Some("list"), Some("list"), None)
            },
            horizontal: true,
            ..Default::default()
        };
        h.create_with_frame(1, props.clone(), Rect::new(0.0, 0.0, 10.0, 10.0))?;
        h.facade.clear();
        h.props(1, props)?;
        h.layout(1, Rect::new(0.0, 0.0, 10.0, 10.0))?;
        assert!(h.facade.calls().is_empty());
        Ok(())
    }

    #[test]
    fn common_facets_are_written_before_widget_facets() -> Result<()> {
        let mut h = Harness::new();
        h.create(1, ScrollProps::default())?;
        h.facade.clear();
        h.props(
            1,
            ScrollProps {
                base: ViewProps {
                    opacity: 0.25,
                    ..ScrollProps::default().base
                },
                scroll_enabled: false,
                ..Default::default()
            },
        )?;
        assert_eq!(
            h.facade.set_ids(h.outer(1)?),
            vec![AttributeId::Opacity, AttributeId::ScrollEnabled]
        );
        Ok(())
    }

    #[test]
    fn props_for_another_kind_are_ignored() -> Result<()> {
        let mut h = Harness::new();
        let id = h.create(1, ViewProps::default())?;
        h.facade.clear();
        h.props(1, ScrollProps::default())?;
        assert!(h.facade.calls().is_empty());
        let inst = h.tree.instance(id).expect("instance");
        assert!(matches!(**inst.props(), Props::View(_)));
        Ok(())
    }

    #[test]
    fn labelled_by_appends_the_referenced_label() -> Result<()> {
        let mut h = Harness::new();
        h.create(1, labelled(Some("Name"), Some("nameLabel"), None))?;
        h.create(2, labelled(Some("field"), None, Some("nameLabel")))?;
        h.create(3, labelled(None, None, Some("nameLabel")))?;
        h.create(4, labelled(Some("field"), None, Some("missing")))?;
        h.tree.finalize_updates()?;
        let label = |tag| -> Result<Option<AttributeValue>> {
            Ok(h.facade.attribute(h.outer(tag)?, AttributeId::AccessibilityLabel))
        };
        assert_eq!(label(2)?, Some(AttributeValue::text("field, Name")));
        assert_eq!(label(3)?, Some(AttributeValue::text("Name")));
        assert_eq!(label(4)?, Some(AttributeValue::text("field")));

        // Resolution is stable across finalize passes.
        h.facade.clear();
        h.tree.finalize_updates()?;
        assert!(h.facade.calls().is_empty());
        Ok(())
    }

    #[test]
    fn commits_build_and_tear_down_trees() -> Result<()> {
        let mut h = Harness::new();
        let image = Mutation::Create {
            tag: Tag(2),
            props: Arc::new(
                ImageProps {
                    source: Some("a.png".into()),
                    ..Default::default()
                }
                .into(),
            ),
            state: None,
            emitter: Some(h.emitter(2)),
            layout: LayoutMetrics::new(Rect::new(0.0, 0.0, 20.0, 20.0)),
        };
        h.commit(
            Commit::new()
                .push(Mutation::create(1, ViewProps::default()))
                .push(image)
                .insert(1, 2, 0),
        )?;
        let root = h.tree.root().expect("root");
        assert_eq!(h.tree.id_of(1), Some(root));
        assert_eq!(h.facade.native_children(h.outer(1)?), vec![h.outer(2)?]);
        assert_eq!(h.bridge.event_names(), vec![names::LOAD_START]);
        assert_eq!(h.facade.registrations(), 3);

        let image_handle = h.outer(2)?;
        h.facade.clear();
        h.commit(Commit::new().remove(1, 2, 0).delete(2))?;
        assert_eq!(h.tree.len(), 1);
        assert_eq!(h.facade.registrations(), 0);
        let calls = h.facade.calls();
        let last_unregister = calls
            .iter()
            .rposition(|c| matches!(c, NativeCall::Unregister { .. }))
            .expect("unregister");
        let dispose = calls
            .iter()
            .position(|c| *c == NativeCall::Dispose(image_handle))
            .expect("dispose");
        assert!(last_unregister < dispose);

        // Callbacks for the released handle go nowhere.
        h.tree.handle_native_event(
            image_handle,
            &NativeEvent::ImageError {
                message: "late".into(),
            },
        )?;
        assert_eq!(h.bridge.events_named(names::ERROR).len(), 0);
        assert!(!h.facade.is_registered(image_handle, NativeEventKind::ImageError));
        Ok(())
    }

    #[test]
    fn commit_updates_apply_every_snapshot() -> Result<()> {
        let mut h = Harness::new();
        h.create(1, TextInputProps::default())?;
        h.commit(Commit::new().push(Mutation::Update {
            tag: Tag(1),
            props: Some(Arc::new(
                TextInputProps {
                    placeholder: Some("name".into()),
                    ..Default::default()
                }
                .into(),
            )),
            state: None,
            emitter: None,
            layout: Some(LayoutMetrics::new(Rect::new(5.0, 5.0, 100.0, 30.0))),
        }))?;
        let inst = h.tree.get(1).expect("instance");
        assert_eq!(inst.layout().frame, Rect::new(5.0, 5.0, 100.0, 30.0));
        assert_eq!(
            h.facade.attribute(h.outer(1)?, AttributeId::TextInputPlaceholder),
            Some(AttributeValue::text("name"))
        );
        Ok(())
    }

    #[test]
    fn commit_errors_name_the_problem() -> Result<()> {
        let mut h = Harness::new();
        h.create(1, ViewProps::default())?;
        assert!(matches!(
            h.commit(Commit::new().insert(1, 99, 0)),
            Err(Error::InstanceNotFound(Tag(99)))
        ));
        assert!(matches!(
            h.commit(Commit::new().push(Mutation::create(1, ViewProps::default()))),
            Err(Error::DuplicateTag(Tag(1)))
        ));
        Ok(())
    }

    #[test]
    fn native_failures_propagate() -> Result<()> {
        let mut h = Harness::new();
        h.facade.fail_on("create_node", -3);
        let err = h.create(1, ViewProps::default()).expect_err("create fails");
        assert!(matches!(err, Error::Native { status: -3, .. }));
        assert!(h.tree.is_empty());
        Ok(())
    }

    #[test]
    fn deleting_a_parent_detaches_its_children() -> Result<()> {
        let mut h = Harness::new();
        h.create(1, ViewProps::default())?;
        h.create(2, ViewProps::default())?;
        h.insert(1, 2, 0)?;
        h.tree.delete(h.id(1)?)?;
        let child = h.tree.get(2).expect("child survives");
        assert_eq!(child.parent(), None);
        assert!(!child.is_mounted());
        assert_eq!(h.tree.root(), None);
        assert_eq!(h.facade.live_nodes(), 1);
        Ok(())
    }
}
