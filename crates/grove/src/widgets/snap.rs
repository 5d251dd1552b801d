//! Snap target selection for released scroll gestures.

use crate::core::props::{ScrollProps, SnapAlignment};

/// Where snap points come from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SnapConfig {
    /// No snapping.
    #[default]
    None,
    /// Explicit offsets, sorted ascending, NaN-free, ending in `+∞`.
    Offsets(Vec<f32>),
    /// Regularly spaced snap points.
    Interval {
        /// Distance between snap points.
        interval: f32,
        /// Viewport alignment of each snap point.
        alignment: SnapAlignment,
    },
}

/// Snap configuration plus the edge behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapPolicy {
    /// Snap points.
    config: SnapConfig,
    /// Fall back to the start when no lower point remains.
    snap_to_start: bool,
    /// Resolve the `+∞` sentinel to the end of content.
    snap_to_end: bool,
}

impl Default for SnapPolicy {
    fn default() -> Self {
        Self {
            config: SnapConfig::None,
            snap_to_start: true,
            snap_to_end: true,
        }
    }
}

impl SnapPolicy {
    /// Snap to explicit offsets. NaNs are discarded and the list is padded
    /// with `+∞` as an upper sentinel.
    pub fn offsets(raw: &[f32], snap_to_start: bool, snap_to_end: bool) -> Self {
        let mut offsets: Vec<f32> = raw.iter().copied().filter(|o| !o.is_nan()).collect();
        let config = if offsets.is_empty() {
            SnapConfig::None
        } else {
            offsets.sort_by(f32::total_cmp);
            offsets.push(f32::INFINITY);
            SnapConfig::Offsets(offsets)
        };
        Self {
            config,
            snap_to_start,
            snap_to_end,
        }
    }

    /// Snap to a fixed interval.
    pub fn interval(interval: f32, alignment: SnapAlignment) -> Self {
        let config = if interval > 0.0 && interval.is_finite() {
            SnapConfig::Interval {
                interval,
                alignment,
            }
        } else {
            SnapConfig::None
        };
        Self {
            config,
            ..Default::default()
        }
    }

    /// Derive the policy from scroll props. Offsets take precedence over an
    /// interval.
    pub fn from_props(props: &ScrollProps) -> Self {
        let policy = if !props.snap_to_offsets.is_empty() {
            Self::offsets(&props.snap_to_offsets, true, true)
        } else if let Some(interval) = props.snap_to_interval {
            Self::interval(interval, props.snap_to_alignment)
        } else {
            Self::default()
        };
        Self {
            snap_to_start: props.snap_to_start,
            snap_to_end: props.snap_to_end,
            ..policy
        }
    }

    /// The configured snap points.
    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Is any snapping configured?
    pub fn is_enabled(&self) -> bool {
        self.config != SnapConfig::None
    }

    /// Choose the snap target for a gesture released at `current`.
    ///
    /// Moving forward picks the first point strictly above `current`, moving
    /// backward the last point strictly below it. `max_offset` is the end of
    /// the scrollable range and `viewport` the container extent along the
    /// scroll axis. Returns `None` when the gesture should not snap.
    pub fn select(&self, current: f32, forward: bool, max_offset: f32, viewport: f32) -> Option<f32> {
        match &self.config {
            SnapConfig::None => None,
            SnapConfig::Offsets(offsets) => {
                if forward {
                    let next = offsets.iter().copied().find(|o| *o > current)?;
                    if next.is_infinite() {
                        self.snap_to_end.then_some(max_offset)
                    } else {
                        Some(next)
                    }
                } else {
                    match offsets.iter().copied().rev().find(|o| *o < current) {
                        Some(prev) => Some(prev),
                        None => self.snap_to_start.then_some(0.0),
                    }
                }
            }
            SnapConfig::Interval {
                interval,
                alignment,
            } => {
                let shift = match alignment {
                    SnapAlignment::Start => 0.0,
                    SnapAlignment::Center => (viewport - interval) / 2.0,
                    SnapAlignment::End => viewport - interval,
                };
                let slot = (current + shift) / interval;
                let k = if forward {
                    slot.floor() + 1.0
                } else {
                    slot.ceil() - 1.0
                };
                let target = k * interval - shift;
                Some(target.clamp(0.0, max_offset.max(0.0)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn offsets_are_sorted_and_padded() {
        let p = SnapPolicy::offsets(&[150.0, f32::NAN, 50.0], true, true);
        assert_eq!(
            p.config(),
            &SnapConfig::Offsets(vec![50.0, 150.0, f32::INFINITY])
        );
        assert_eq!(
            SnapPolicy::offsets(&[f32::NAN], true, true).config(),
            &SnapConfig::None
        );
    }

    #[test]
    fn offset_selection() {
        let p = SnapPolicy::offsets(&[50.0, 150.0], true, true);
        assert_eq!(p.select(80.0, true, 1000.0, 100.0), Some(150.0));
        assert_eq!(p.select(80.0, false, 1000.0, 100.0), Some(50.0));
        assert_eq!(p.select(50.0, false, 1000.0, 100.0), Some(0.0));
    }

    #[test]
    fn infinity_resolves_to_end() {
        let p = SnapPolicy::offsets(&[50.0, 150.0], true, true);
        assert_eq!(p.select(200.0, true, 900.0, 100.0), Some(900.0));
        let p = SnapPolicy::offsets(&[50.0, 150.0], false, false);
        assert_eq!(p.select(200.0, true, 900.0, 100.0), None);
        assert_eq!(p.select(20.0, false, 900.0, 100.0), None);
    }

    #[test]
    fn interval_alignment() {
        let start = SnapPolicy::interval(100.0, SnapAlignment::Start);
        assert_eq!(start.select(130.0, true, 1000.0, 300.0), Some(200.0));
        assert_eq!(start.select(130.0, false, 1000.0, 300.0), Some(100.0));
        assert_eq!(start.select(100.0, false, 1000.0, 300.0), Some(0.0));

        let center = SnapPolicy::interval(100.0, SnapAlignment::Center);
        // Snap points sit at k * 100 - 100.
        assert_eq!(center.select(130.0, true, 1000.0, 300.0), Some(200.0));
        assert_eq!(center.select(130.0, false, 1000.0, 300.0), Some(100.0));

        let end = SnapPolicy::interval(100.0, SnapAlignment::End);
        assert_eq!(end.select(990.0, true, 1000.0, 250.0), Some(1000.0));
    }

    #[test]
    fn props_precedence() {
        let props = ScrollProps {
            snap_to_offsets: vec![10.0],
            snap_to_interval: Some(50.0),
            snap_to_end: false,
            ..Default::default()
        };
        let p = SnapPolicy::from_props(&props);
        assert_eq!(p.config(), &SnapConfig::Offsets(vec![10.0, f32::INFINITY]));
        assert_eq!(p.select(20.0, true, 500.0, 100.0), None);
    }

    proptest! {
        #[test]
        fn direction_is_respected(
            mut raw in prop::collection::vec(0.0f32..1000.0, 1..8),
            current in 0.0f32..1000.0,
        ) {
            raw.sort_by(f32::total_cmp);
            let p = SnapPolicy::offsets(&raw, true, true);
            if let Some(t) = p.select(current, true, 2000.0, 100.0) {
                prop_assert!(t > current);
            }
            if let Some(t) = p.select(current, false, 2000.0, 100.0) {
                prop_assert!(t < current || t == 0.0);
            }
        }
    }
}
