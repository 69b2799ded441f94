//! Unit tests for display-aware frame resolution.

use rstest::rstest;

use termdeck::services::display_geometry::{default_frame, resolve, GeometryPolicy};
use termdeck::types::geometry::{DisplayDescriptor, Rect};
use termdeck::types::settings::GeometrySettings;

fn left() -> DisplayDescriptor {
    DisplayDescriptor::new(
        Some(1),
        Rect::new(0.0, 0.0, 1440.0, 900.0),
        Rect::new(0.0, 0.0, 1440.0, 875.0),
    )
}

fn right() -> DisplayDescriptor {
    DisplayDescriptor::new(
        Some(2),
        Rect::new(1440.0, 0.0, 1920.0, 1080.0),
        Rect::new(1440.0, 0.0, 1920.0, 1055.0),
    )
}

fn policy() -> GeometryPolicy {
    GeometryPolicy::default()
}

#[test]
fn unchanged_display_keeps_frame_exactly() {
    let frame = Rect::new(1600.0, 100.0, 900.0, 600.0);
    let displays = [left(), right()];
    let out = resolve(frame, Some(&right()), &displays, Some(&left()), &policy());
    assert_eq!(out, Some(frame));
}

#[test]
fn unchanged_display_keeps_partially_offscreen_frame() {
    let frame = Rect::new(3000.0, 100.0, 900.0, 600.0);
    let displays = [left(), right()];
    let out = resolve(frame, Some(&right()), &displays, Some(&left()), &policy());
    assert_eq!(out, Some(frame));
}

#[test]
fn visible_frame_within_tolerance_counts_as_unchanged() {
    let frame = Rect::new(1600.0, 100.0, 900.0, 600.0);
    let shifted = DisplayDescriptor::new(
        Some(2),
        Rect::new(1440.0, 0.0, 1920.0, 1080.0),
        Rect::new(1440.5, 0.0, 1920.0, 1055.5),
    );
    let out = resolve(frame, Some(&right()), &[left(), shifted], Some(&left()), &policy());
    assert_eq!(out, Some(frame));
}

#[test]
fn disconnected_display_remaps_into_remaining_one() {
    let frame = Rect::new(1600.0, 100.0, 900.0, 600.0);
    let only_left = [left()];
    let out = resolve(frame, Some(&right()), &only_left, Some(&left()), &policy())
        .expect("a frame is always produced for a valid input");

    let bounds = left().work_area();
    assert!(bounds.contains_rect(&out, 0.0));
    assert!(out.width >= 300.0 && out.height >= 200.0);
    // Relative position carries over: 160 of 1920 points in.
    assert!((out.x - 120.0).abs() < 1e-6);
    assert!((out.width - 675.0).abs() < 1e-6);
}

#[test]
fn resized_display_with_same_id_clamps() {
    let frame = Rect::new(2000.0, 100.0, 900.0, 600.0);
    let smaller = DisplayDescriptor::new(
        Some(2),
        Rect::new(1440.0, 0.0, 1280.0, 800.0),
        Rect::new(1440.0, 0.0, 1280.0, 775.0),
    );
    let out = resolve(frame, Some(&right()), &[left(), smaller.clone()], Some(&left()), &policy())
        .expect("resolved");
    assert!(smaller.work_area().contains_rect(&out, 0.0));
    assert_eq!(out, Rect::new(1820.0, 100.0, 900.0, 600.0));
}

#[test]
fn persisted_display_without_id_matches_by_overlap() {
    let frame = Rect::new(1600.0, 100.0, 900.0, 600.0);
    let anonymous = DisplayDescriptor::new(
        None,
        Rect::new(1440.0, 0.0, 1920.0, 1080.0),
        Rect::new(1440.0, 0.0, 1920.0, 1055.0),
    );
    let renamed = DisplayDescriptor::new(
        Some(7),
        Rect::new(1440.0, 0.0, 1920.0, 1080.0),
        Rect::new(1440.0, 0.0, 1920.0, 1055.0),
    );
    let out = resolve(frame, Some(&anonymous), &[left(), renamed], Some(&left()), &policy());
    assert_eq!(out, Some(frame));
}

#[test]
fn unknown_display_and_offscreen_frame_centers_on_fallback() {
    let frame = Rect::new(9000.0, 9000.0, 800.0, 600.0);
    let out = resolve(frame, None, &[left(), right()], Some(&left()), &policy());
    assert_eq!(out, Some(Rect::new(320.0, 137.5, 800.0, 600.0)));
}

#[test]
fn frame_touching_a_display_is_clamped_into_it() {
    let frame = Rect::new(1300.0, 500.0, 800.0, 600.0);
    let out = resolve(frame, None, &[left()], Some(&left()), &policy()).expect("resolved");
    assert_eq!(out, Rect::new(640.0, 275.0, 800.0, 600.0));
}

#[test]
fn no_displays_keeps_frame() {
    let frame = Rect::new(-5000.0, 12.0, 800.0, 600.0);
    assert_eq!(resolve(frame, Some(&left()), &[], None, &policy()), Some(frame));
}

#[rstest]
#[case(Rect::new(f64::NAN, 0.0, 800.0, 600.0))]
#[case(Rect::new(0.0, f64::INFINITY, 800.0, 600.0))]
#[case(Rect::new(0.0, 0.0, 299.0, 600.0))]
#[case(Rect::new(0.0, 0.0, 800.0, 199.0))]
#[case(Rect::new(0.0, 0.0, -800.0, 600.0))]
fn invalid_frames_are_rejected(#[case] frame: Rect) {
    assert_eq!(resolve(frame, Some(&left()), &[left()], Some(&left()), &policy()), None);
}

#[test]
fn default_frame_without_display_uses_origin() {
    let settings = GeometrySettings::default();
    assert_eq!(default_frame(None, &settings), Rect::new(0.0, 0.0, 1000.0, 700.0));
}

#[test]
fn default_frame_is_centered_in_work_area() {
    let settings = GeometrySettings::default();
    let frame = default_frame(Some(&left()), &settings);
    assert_eq!(frame, Rect::new(220.0, 87.5, 1000.0, 700.0));
}
