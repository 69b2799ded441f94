//! Display-aware window geometry resolution.
//!
//! Maps a persisted window frame, and the display it was on, onto the
//! displays attached right now. Pure functions; no state.
//!
//! Resolution order:
//! 1. Reject non-finite or undersized frames (`None`; caller uses a default).
//! 2. No displays attached: keep the frame.
//! 3. Same display id with an unchanged work area: keep the frame exactly.
//! 4. Pick a target display: id match, or, when the persisted display carried
//!    no id, the display overlapping its work area most, else the nearest one.
//! 5. Target found: clamp when the frame still touches its work area,
//!    otherwise remap proportionally and clamp.
//! 6. No target: clamp into any display the frame touches, else remap (or
//!    center) onto the fallback display.

use crate::types::geometry::{DisplayDescriptor, Rect};
use crate::types::settings::GeometrySettings;

/// Size floor and match tolerance used by [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryPolicy {
    pub min_width: f64,
    pub min_height: f64,
    pub match_tolerance: f64,
}

impl Default for GeometryPolicy {
    fn default() -> Self {
        Self::from(&GeometrySettings::default())
    }
}

impl From<&GeometrySettings> for GeometryPolicy {
    fn from(settings: &GeometrySettings) -> Self {
        Self {
            min_width: settings.min_width,
            min_height: settings.min_height,
            match_tolerance: settings.match_tolerance,
        }
    }
}

/// Resolves `frame` against the currently attached displays.
///
/// `fallback` is used when nothing else matches; when absent the first
/// available display stands in.
pub fn resolve(
    frame: Rect,
    persisted_display: Option<&DisplayDescriptor>,
    available: &[DisplayDescriptor],
    fallback: Option<&DisplayDescriptor>,
    policy: &GeometryPolicy,
) -> Option<Rect> {
    if !frame.is_finite() || frame.width < policy.min_width || frame.height < policy.min_height {
        return None;
    }
    if available.is_empty() {
        return Some(frame);
    }

    if let Some(persisted) = persisted_display {
        if is_unchanged(persisted, available, policy.match_tolerance) {
            return Some(frame);
        }
    }

    let reference = persisted_display
        .map(|d| d.work_area())
        .filter(|r| r.is_finite());

    if let Some(target) = persisted_display.and_then(|d| target_display(d, available)) {
        let bounds = target.work_area();
        let resolved = if frame.intersects(&bounds) {
            clamp(frame, bounds, policy)
        } else {
            match reference {
                Some(source) => remap(frame, source, bounds, policy),
                None => clamp(bounds.centered(frame.width, frame.height), bounds, policy),
            }
        };
        return Some(resolved);
    }

    if let Some(touching) = available.iter().find(|d| frame.intersects(&d.work_area())) {
        return Some(clamp(frame, touching.work_area(), policy));
    }

    let fallback = fallback.unwrap_or(&available[0]);
    let bounds = fallback.work_area();
    let resolved = match reference {
        Some(source) => remap(frame, source, bounds, policy),
        None => clamp(bounds.centered(frame.width, frame.height), bounds, policy),
    };
    Some(resolved)
}

/// Default-size frame centered on `display`, used when [`resolve`] rejects
/// the persisted frame or nothing was persisted.
pub fn default_frame(display: Option<&DisplayDescriptor>, settings: &GeometrySettings) -> Rect {
    let policy = GeometryPolicy::from(settings);
    match display {
        Some(display) => {
            let bounds = display.work_area();
            clamp(
                bounds.centered(settings.default_width, settings.default_height),
                bounds,
                &policy,
            )
        }
        None => Rect::new(0.0, 0.0, settings.default_width, settings.default_height),
    }
}

/// The persisted display is still attached under the same id with the same
/// work area (within `tolerance` per edge).
fn is_unchanged(persisted: &DisplayDescriptor, available: &[DisplayDescriptor], tolerance: f64) -> bool {
    let Some(id) = persisted.display_id else {
        return false;
    };
    available
        .iter()
        .filter(|d| d.display_id == Some(id))
        .any(|d| match persisted.visible_frame {
            Some(visible) => d.work_area().approx_eq(&visible, tolerance),
            None => d.frame.approx_eq(&persisted.frame, tolerance),
        })
}

/// Display the persisted one most plausibly became.
///
/// A persisted id that is no longer attached resolves to nothing: that
/// display is gone and geometric guessing would pick an arbitrary neighbor.
fn target_display<'a>(
    persisted: &DisplayDescriptor,
    available: &'a [DisplayDescriptor],
) -> Option<&'a DisplayDescriptor> {
    if let Some(id) = persisted.display_id {
        return available.iter().find(|d| d.display_id == Some(id));
    }
    let reference = persisted.work_area();
    if !reference.is_finite() {
        return None;
    }
    let overlapping = available
        .iter()
        .map(|d| (d.work_area().intersection_area(&reference), d))
        .filter(|(area, _)| *area > 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, d)| d);
    overlapping.or_else(|| {
        available.iter().min_by(|a, b| {
            a.work_area()
                .center_distance_sq(&reference)
                .total_cmp(&b.work_area().center_distance_sq(&reference))
        })
    })
}

/// Shrinks `frame` to fit `bounds`, never below the floor unless `bounds`
/// itself is smaller, then translates it fully inside.
pub fn clamp(frame: Rect, bounds: Rect, policy: &GeometryPolicy) -> Rect {
    let width = fit_extent(frame.width, bounds.width, policy.min_width);
    let height = fit_extent(frame.height, bounds.height, policy.min_height);
    let x = frame.x.min(bounds.max_x() - width).max(bounds.min_x());
    let y = frame.y.min(bounds.max_y() - height).max(bounds.min_y());
    Rect::new(x, y, width, height)
}

fn fit_extent(extent: f64, available: f64, floor: f64) -> f64 {
    let available = available.max(0.0);
    let extent = if extent.is_finite() { extent } else { floor };
    extent.max(floor).min(available)
}

/// Carries `frame`'s relative offset and size ratio from `source` onto
/// `destination`, then clamps.
pub fn remap(frame: Rect, source: Rect, destination: Rect, policy: &GeometryPolicy) -> Rect {
    if source.width <= 0.0 || source.height <= 0.0 {
        return clamp(
            destination.centered(frame.width, frame.height),
            destination,
            policy,
        );
    }
    let rel_x = (frame.x - source.x) / source.width;
    let rel_y = (frame.y - source.y) / source.height;
    let rel_w = frame.width / source.width;
    let rel_h = frame.height / source.height;
    let mapped = Rect::new(
        destination.x + rel_x * destination.width,
        destination.y + rel_y * destination.height,
        rel_w * destination.width,
        rel_h * destination.height,
    );
    clamp(mapped, destination, policy)
}
