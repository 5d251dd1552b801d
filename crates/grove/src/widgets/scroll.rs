//! The scroll view state machine.
//!
//! [`ScrollEngine`] consumes native scroll callbacks and programmatic
//! commands and answers with a list of [`ScrollEffect`]s for the tree to
//! carry out. It never touches the toolkit itself, which keeps the phase
//! transitions, throttling and snap decisions testable on their own.

use std::time::{Duration, Instant};

use crate::{
    config::Config,
    core::{
        event::{ScrollPayload, ScrollPhase, names},
        props::ScrollProps,
    },
    geom::{Axis, Point, Rect, Size},
    widgets::snap::SnapPolicy,
};

/// Something the tree must do on behalf of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrollEffect {
    /// Emit a scroll event.
    Emit {
        /// Event name.
        name: &'static str,
        /// Metrics at the time of the event.
        payload: ScrollPayload,
    },
    /// Persist the offset as new scroll state.
    PersistOffset(Point),
    /// Ask the native scroller to move.
    ScrollTo {
        /// Target offset.
        offset: Point,
        /// Animate the move.
        animated: bool,
    },
    /// Engage or release self-only nested scrolling.
    SetNestedMode(bool),
    /// Flash the scroll indicators.
    FlashIndicators,
}

/// Scroll state for one scroll view.
#[derive(Debug, Clone)]
pub struct ScrollEngine {
    /// Gesture phase.
    phase: ScrollPhase,
    /// Scroll axis.
    axis: Axis,
    /// Content size.
    content_size: Size,
    /// Viewport size.
    container_size: Size,
    /// Current offset.
    offset: Point,
    /// Offset last handed to the renderer for persistence.
    persisted: Option<Point>,
    /// Target of an outstanding programmatic scroll.
    pending_target: Option<Point>,
    /// Snap points.
    snap: SnapPolicy,
    /// Delta of the most recent frame.
    last_delta: Point,
    /// Time of the last scroll notification.
    last_notify_at: Option<Instant>,
    /// Offset at the last scroll notification.
    last_notify_offset: Point,
    /// Minimum interval between notifications.
    throttle: Duration,
    /// Self-only nested scrolling is engaged.
    nested_self_only: bool,
    /// A scroll ancestor on the same axis exists.
    has_scroll_ancestor: bool,
    /// Boundary and target tolerance.
    boundary_epsilon: f32,
    /// Minimum movement for a throttled notification.
    min_offset_delta: f32,
    /// Throttle used when props do not specify one.
    default_throttle: Duration,
}

impl ScrollEngine {
    /// Construct an idle engine at offset zero.
    pub fn new(config: &Config) -> Self {
        Self {
            phase: ScrollPhase::Idle,
            axis: Axis::Vertical,
            content_size: Size::zero(),
            container_size: Size::zero(),
            offset: Point::zero(),
            persisted: None,
            pending_target: None,
            snap: SnapPolicy::default(),
            last_delta: Point::zero(),
            last_notify_at: None,
            last_notify_offset: Point::zero(),
            throttle: config.default_scroll_throttle(),
            nested_self_only: false,
            has_scroll_ancestor: false,
            boundary_epsilon: config.boundary_epsilon,
            min_offset_delta: config.min_offset_delta,
            default_throttle: config.default_scroll_throttle(),
        }
    }

    /// Take axis, snapping and throttle from props.
    pub fn configure(&mut self, props: &ScrollProps) {
        self.axis = if props.horizontal {
            Axis::Horizontal
        } else {
            Axis::Vertical
        };
        self.snap = SnapPolicy::from_props(props);
        self.throttle = props.scroll_event_throttle.unwrap_or(self.default_throttle);
    }

    /// Update viewport and content sizes.
    pub fn set_metrics(&mut self, container: Size, content: Size) {
        self.container_size = container;
        self.content_size = content;
    }

    /// Record whether a same-axis scroll ancestor exists.
    pub fn set_has_scroll_ancestor(&mut self, v: bool) {
        self.has_scroll_ancestor = v;
    }

    /// Current phase.
    pub fn phase(&self) -> ScrollPhase {
        self.phase
    }

    /// Scroll axis.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Current offset.
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Outstanding programmatic target.
    pub fn pending_target(&self) -> Option<Point> {
        self.pending_target
    }

    /// Is self-only nested scrolling engaged?
    pub fn nested_self_only(&self) -> bool {
        self.nested_self_only
    }

    /// The largest reachable offset.
    pub fn max_offset(&self) -> Point {
        Point::new(
            (self.content_size.width - self.container_size.width).max(0.0),
            (self.content_size.height - self.container_size.height).max(0.0),
        )
    }

    /// The visible window in content coordinates.
    pub fn visible_window(&self) -> Rect {
        Rect::from_origin_size(self.offset, self.container_size)
    }

    /// Is the offset within epsilon of either end of the scroll axis?
    pub fn at_boundary(&self) -> bool {
        let pos = self.axis.of_point(self.offset);
        let max = self.axis.of_point(self.max_offset());
        pos <= self.boundary_epsilon || pos >= max - self.boundary_epsilon
    }

    /// Does the content overflow the container along the scroll axis?
    fn content_exceeds_container(&self) -> bool {
        self.axis.of_size(self.content_size) > self.axis.of_size(self.container_size)
    }

    /// Current event payload.
    pub fn payload(&self) -> ScrollPayload {
        ScrollPayload {
            content_offset: self.offset.into(),
            content_size: self.content_size.into(),
            layout_measurement: self.container_size.into(),
            zoom_scale: 1.0,
        }
    }

    /// An emit effect for `name` with the current payload.
    fn emit(&self, name: &'static str) -> ScrollEffect {
        ScrollEffect::Emit {
            name,
            payload: self.payload(),
        }
    }

    /// Handle a frame-begin callback.
    pub fn frame_begin(&mut self, delta: Point, phase: ScrollPhase) -> Vec<ScrollEffect> {
        self.last_delta = delta;
        self.transition(phase)
    }

    /// Move to `next`, emitting end and begin notifications on a change.
    fn transition(&mut self, next: ScrollPhase) -> Vec<ScrollEffect> {
        if next == self.phase {
            return Vec::new();
        }
        tracing::debug!("scroll phase {:?} -> {next:?}", self.phase);
        let mut out = Vec::new();
        match self.phase {
            ScrollPhase::Dragging => out.push(self.emit(names::SCROLL_END_DRAG)),
            ScrollPhase::Flinging => out.push(self.emit(names::MOMENTUM_SCROLL_END)),
            ScrollPhase::Idle => {}
        }
        if self.phase != ScrollPhase::Idle {
            self.persisted = Some(self.offset);
            out.push(ScrollEffect::PersistOffset(self.offset));
        }
        self.phase = next;
        match next {
            ScrollPhase::Dragging => out.push(self.emit(names::SCROLL_BEGIN_DRAG)),
            ScrollPhase::Flinging => {
                out.push(self.emit(names::MOMENTUM_SCROLL_BEGIN));
                out.extend(self.snap_on_release());
            }
            ScrollPhase::Idle => {}
        }
        out
    }

    /// Animate to the snap target for the current fling, if any.
    fn snap_on_release(&mut self) -> Option<ScrollEffect> {
        if !self.snap.is_enabled() {
            return None;
        }
        let current = self.axis.of_point(self.offset);
        let forward = self.axis.of_point(self.last_delta) > 0.0;
        let target = self.snap.select(
            current,
            forward,
            self.axis.of_point(self.max_offset()),
            self.axis.of_size(self.container_size),
        )?;
        let offset = match self.axis {
            Axis::Horizontal => Point::new(target, self.offset.y),
            Axis::Vertical => Point::new(self.offset.x, target),
        };
        tracing::debug!("snapping from {current} to {target}");
        self.pending_target = Some(offset);
        Some(ScrollEffect::ScrollTo {
            offset,
            animated: true,
        })
    }

    /// Handle an offset change.
    pub fn on_scroll(&mut self, offset: Point, now: Instant) -> Vec<ScrollEffect> {
        self.offset = offset;
        let mut out = Vec::new();
        let reached_target = self
            .pending_target
            .is_some_and(|t| t.approx_eq(offset, self.boundary_epsilon));
        let notify = if reached_target {
            self.pending_target = None;
            true
        } else {
            let elapsed = self
                .last_notify_at
                .is_none_or(|at| now.saturating_duration_since(at) >= self.throttle);
            let moved = (offset.x - self.last_notify_offset.x).abs() >= self.min_offset_delta
                || (offset.y - self.last_notify_offset.y).abs() >= self.min_offset_delta;
            elapsed && moved
        };
        if notify {
            out.push(self.notify(now));
        }
        if self.has_scroll_ancestor
            && self.content_exceeds_container()
            && !self.nested_self_only
            && !self.at_boundary()
        {
            self.nested_self_only = true;
            out.push(ScrollEffect::SetNestedMode(true));
        }
        out
    }

    /// Emit a scroll notification and record it.
    fn notify(&mut self, now: Instant) -> ScrollEffect {
        self.last_notify_at = Some(now);
        self.last_notify_offset = self.offset;
        self.emit(names::SCROLL)
    }

    /// Handle the scroll coming to rest.
    pub fn on_stop(&mut self, now: Instant) -> Vec<ScrollEffect> {
        let mut out = self.transition(ScrollPhase::Idle);
        if self.at_boundary() {
            out.push(self.notify(now));
            if self.nested_self_only {
                self.nested_self_only = false;
                out.push(ScrollEffect::SetNestedMode(false));
            }
        }
        out
    }

    /// Scroll to `target`, superseding any outstanding target.
    pub fn scroll_to(&mut self, target: Point, animated: bool) -> Vec<ScrollEffect> {
        let max = self.max_offset();
        let offset = Point::new(target.x.clamp(0.0, max.x), target.y.clamp(0.0, max.y));
        self.pending_target = Some(offset);
        vec![ScrollEffect::ScrollTo { offset, animated }]
    }

    /// Offset last handed to the renderer for persistence.
    pub fn persisted(&self) -> Option<Point> {
        self.persisted
    }

    /// Return to a persisted offset. Not clamped: content may not be
    /// measured yet when state is restored.
    ///
    /// Only state that predates the first gesture is restored. Once the
    /// engine has persisted an offset itself, incoming scroll state is an
    /// echo of its own, possibly from an earlier phase, and is ignored, as
    /// is state arriving mid-gesture or matching the current offset.
    pub fn restore(&mut self, offset: Point) -> Vec<ScrollEffect> {
        if self.phase != ScrollPhase::Idle
            || self.persisted.is_some()
            || self.offset.approx_eq(offset, self.boundary_epsilon)
        {
            tracing::trace!("scroll state {offset:?} not restored");
            return Vec::new();
        }
        tracing::debug!("restoring offset {offset:?}");
        self.pending_target = Some(offset);
        vec![ScrollEffect::ScrollTo {
            offset,
            animated: false,
        }]
    }

    /// Scroll to the end of content along the scroll axis.
    pub fn scroll_to_end(&mut self, animated: bool) -> Vec<ScrollEffect> {
        let max = self.max_offset();
        let target = match self.axis {
            Axis::Horizontal => Point::new(max.x, self.offset.y),
            Axis::Vertical => Point::new(self.offset.x, max.y),
        };
        self.scroll_to(target, animated)
    }

    /// Flash the indicators.
    pub fn flash_indicators(&self) -> Vec<ScrollEffect> {
        vec![ScrollEffect::FlashIndicators]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScrollEngine {
        let mut e = ScrollEngine::new(&Config::default());
        e.set_metrics(Size::new(100.0, 200.0), Size::new(100.0, 1000.0));
        e
    }

    fn names_of(effects: &[ScrollEffect]) -> Vec<&'static str> {
        effects
            .iter()
            .filter_map(|e| match e {
                ScrollEffect::Emit { name, .. } => Some(*name),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn repeated_begins_emit_once() {
        let mut e = engine();
        let d = Point::new(0.0, 1.0);
        let mut all = Vec::new();
        all.extend(e.frame_begin(d, ScrollPhase::Dragging));
        all.extend(e.frame_begin(d, ScrollPhase::Dragging));
        all.extend(e.frame_begin(d, ScrollPhase::Flinging));
        all.extend(e.frame_begin(d, ScrollPhase::Flinging));
        all.extend(e.frame_begin(d, ScrollPhase::Dragging));
        all.extend(e.on_stop(Instant::now()));
        let names = names_of(&all);
        let count = |n| names.iter().filter(|x| **x == n).count();
        assert_eq!(count(names::SCROLL_BEGIN_DRAG), 2);
        assert_eq!(count(names::SCROLL_END_DRAG), 2);
        assert_eq!(count(names::MOMENTUM_SCROLL_BEGIN), 1);
        assert_eq!(count(names::MOMENTUM_SCROLL_END), 1);
        let persisted = all
            .iter()
            .filter(|e| matches!(e, ScrollEffect::PersistOffset(_)))
            .count();
        assert_eq!(persisted, 3);
    }

    #[test]
    fn fling_snaps_in_delta_direction() {
        let mut e = engine();
        e.configure(&ScrollProps {
            snap_to_offsets: vec![50.0, 150.0],
            ..Default::default()
        });
        e.on_scroll(Point::new(0.0, 80.0), Instant::now());
        let fx = e.frame_begin(Point::new(0.0, 4.0), ScrollPhase::Flinging);
        assert!(fx.contains(&ScrollEffect::ScrollTo {
            offset: Point::new(0.0, 150.0),
            animated: true
        }));
        assert_eq!(e.pending_target(), Some(Point::new(0.0, 150.0)));

        let mut e = engine();
        e.configure(&ScrollProps {
            snap_to_offsets: vec![50.0, 150.0],
            ..Default::default()
        });
        e.on_scroll(Point::new(0.0, 80.0), Instant::now());
        let fx = e.frame_begin(Point::new(0.0, -4.0), ScrollPhase::Flinging);
        assert!(fx.contains(&ScrollEffect::ScrollTo {
            offset: Point::new(0.0, 50.0),
            animated: true
        }));
    }

    #[test]
    fn throttle_policy() {
        let mut e = engine();
        e.configure(&ScrollProps {
            scroll_event_throttle: Some(Duration::from_millis(16)),
            ..Default::default()
        });
        let t0 = Instant::now();
        assert_eq!(names_of(&e.on_scroll(Point::new(0.0, 10.0), t0)), vec![names::SCROLL]);
        // Too soon.
        assert!(names_of(&e.on_scroll(Point::new(0.0, 20.0), t0 + Duration::from_millis(5))).is_empty());
        // Enough time, too little movement.
        assert!(names_of(&e.on_scroll(Point::new(0.0, 10.005), t0 + Duration::from_millis(40))).is_empty());
        // Enough of both.
        assert_eq!(
            names_of(&e.on_scroll(Point::new(0.0, 30.0), t0 + Duration::from_millis(40))),
            vec![names::SCROLL]
        );
    }

    #[test]
    fn reaching_target_notifies_immediately() {
        let mut e = engine();
        e.configure(&ScrollProps {
            scroll_event_throttle: Some(Duration::from_secs(10)),
            ..Default::default()
        });
        let t0 = Instant::now();
        e.on_scroll(Point::new(0.0, 1.0), t0);
        e.scroll_to(Point::new(0.0, 300.0), true);
        assert!(names_of(&e.on_scroll(Point::new(0.0, 200.0), t0)).is_empty());
        assert_eq!(
            names_of(&e.on_scroll(Point::new(0.0, 300.0005), t0)),
            vec![names::SCROLL]
        );
        assert_eq!(e.pending_target(), None);
    }

    #[test]
    fn later_scroll_to_supersedes() {
        let mut e = engine();
        e.scroll_to(Point::new(0.0, 100.0), true);
        e.scroll_to(Point::new(0.0, 400.0), false);
        assert_eq!(e.pending_target(), Some(Point::new(0.0, 400.0)));
        e.scroll_to_end(true);
        assert_eq!(e.pending_target(), Some(Point::new(0.0, 800.0)));
    }

    #[test]
    fn stop_at_boundary_always_notifies() {
        let mut e = engine();
        e.configure(&ScrollProps {
            scroll_event_throttle: Some(Duration::from_secs(10)),
            ..Default::default()
        });
        let t0 = Instant::now();
        e.on_scroll(Point::new(0.0, 500.0), t0);
        e.on_scroll(Point::new(0.0, 800.0), t0);
        assert_eq!(names_of(&e.on_stop(t0)), vec![names::SCROLL]);
        e.on_scroll(Point::new(0.0, 400.0), t0);
        assert!(names_of(&e.on_stop(t0)).is_empty());
    }

    #[test]
    fn nested_mode_engages_off_boundary_and_releases_at_rest() {
        let mut e = engine();
        e.set_has_scroll_ancestor(true);
        let t0 = Instant::now();
        assert!(e.on_scroll(Point::new(0.0, 0.0), t0).is_empty());
        let fx = e.on_scroll(Point::new(0.0, 50.0), t0);
        assert!(fx.contains(&ScrollEffect::SetNestedMode(true)));
        assert!(e.nested_self_only());
        let fx = e.on_scroll(Point::new(0.0, 0.0), t0);
        assert!(!fx.contains(&ScrollEffect::SetNestedMode(false)));
        let fx = e.on_stop(t0);
        assert!(fx.contains(&ScrollEffect::SetNestedMode(false)));
        assert!(!e.nested_self_only());
    }

    #[test]
    fn nested_mode_needs_overflowing_content() {
        let mut e = ScrollEngine::new(&Config::default());
        e.set_metrics(Size::new(100.0, 200.0), Size::new(100.0, 150.0));
        e.set_has_scroll_ancestor(true);
        assert!(e.on_scroll(Point::new(0.0, 20.0), Instant::now())
            .iter()
            .all(|fx| !matches!(fx, ScrollEffect::SetNestedMode(_))));
    }
}
