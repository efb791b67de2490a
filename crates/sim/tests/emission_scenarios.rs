//! Scenario tests for the emission pass: trimming, spiral z lift,
//! small-move coalescing, fan overrides, extruder switching, and the
//! overlap-merge toggle.

use geom::{Point2, Point3};
use sim::{FakeWriter, WriteEvent};
use toolpath::config::{BRIDGE, WALL_INNER, WALL_OUTER};
use toolpath::{LayerPlanner, PathConfig};

fn move_to(to: Point3, speed_mm_s: i64, line_width_um: i64) -> WriteEvent {
    WriteEvent::Move {
        to,
        speed_mm_s,
        line_width_um,
    }
}

#[test]
fn outer_wall_tail_is_trimmed_back() {
    let config = PathConfig::new(WALL_OUTER, 50, 500).with_closed_loop(false);
    let mut writer = FakeWriter::new();
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    let polyline = vec![
        Point2::new(0, 0),
        Point2::new(1_000, 0),
        Point2::new(2_000, 0),
    ];
    planner.queue_polygon(&polyline, 0, &config);
    planner.write_queued(200, -1, -1);

    // 450 um (90% of the line width) comes off the tail.
    assert_eq!(
        writer.move_targets(),
        vec![Point3::new(1_000, 0, 0), Point3::new(1_550, 0, 0)]
    );
    assert!(writer.events.contains(&WriteEvent::Comment {
        text: "TYPE:WALL-OUTER".to_string()
    }));
}

#[test]
fn spiral_path_rises_linearly_with_arc_length() {
    let config = PathConfig::new(WALL_OUTER, 50, 500).with_spiralize(true);
    let mut writer = FakeWriter::new();
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    planner.queue_extrusion(Point2::new(0, 0), &config);
    planner.queue_extrusion(Point2::new(1_000, 0), &config);
    planner.queue_extrusion(Point2::new(2_000, 0), &config);
    planner.write_queued(200, -1, -1);

    let z_values: Vec<i64> = writer.move_targets().iter().map(|point| point.z).collect();
    assert_eq!(z_values, vec![0, 100, 200]);
}

#[test]
fn only_the_last_spiral_path_gets_the_lift() {
    let first = PathConfig::new("SKIRT", 50, 500).with_spiralize(true);
    let second = PathConfig::new("SKIRT", 50, 500).with_spiralize(true);
    let mut writer = FakeWriter::new();
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    planner.queue_extrusion(Point2::new(1_000, 0), &first);
    planner.queue_extrusion(Point2::new(2_000, 0), &second);
    planner.write_queued(200, -1, -1);

    let z_values: Vec<i64> = writer.move_targets().iter().map(|point| point.z).collect();
    assert_eq!(z_values, vec![0, 200]);
}

fn queue_single_point_paths<'c>(
    planner: &mut LayerPlanner<'_, 'c, FakeWriter>,
    config: &'c PathConfig,
) {
    // One-point paths as tiny fill fragments produce them.
    for x in [0, 200, 400, 600] {
        planner.queue_extrusion(Point2::new(x, 0), config);
        planner.force_new_path_start();
    }
}

#[test]
fn runs_of_small_moves_coalesce_into_fewer_lines() {
    let config = PathConfig::new("FILL", 50, 500);
    let mut writer = FakeWriter::at(Point3::new(-100, 0, 0));
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    queue_single_point_paths(&mut planner, &config);
    planner.queue_extrusion(Point2::new(800, 0), &config);
    planner.write_queued(200, -1, -1);

    // Five one-point paths collapse to two midpoint moves plus the final
    // point at nominal width. The first merged move covers 300 um of the
    // original path in a 200 um line, so its width grows to 750.
    assert_eq!(
        writer.moves(),
        vec![
            &move_to(Point3::new(100, 0, 0), 50, 750),
            &move_to(Point3::new(500, 0, 0), 50, 500),
            &move_to(Point3::new(800, 0, 0), 50, 500),
        ]
    );
}

#[test]
fn a_travel_ending_the_run_is_written_normally() {
    let config = PathConfig::new("FILL", 50, 500);
    let mut writer = FakeWriter::at(Point3::new(-100, 0, 0));
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    queue_single_point_paths(&mut planner, &config);
    planner.queue_travel(Point2::new(800, 0));
    planner.write_queued(200, -1, -1);

    assert_eq!(
        writer.moves(),
        vec![
            &move_to(Point3::new(100, 0, 0), 50, 750),
            &move_to(Point3::new(500, 0, 0), 50, 500),
            &move_to(Point3::new(600, 0, 0), 50, 500),
            &move_to(Point3::new(800, 0, 0), 150, 0),
        ]
    );
}

#[test]
fn two_small_paths_are_not_worth_coalescing() {
    let config = PathConfig::new("FILL", 50, 500);
    let mut writer = FakeWriter::at(Point3::new(-100, 0, 0));
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    planner.queue_extrusion(Point2::new(0, 0), &config);
    planner.force_new_path_start();
    planner.queue_extrusion(Point2::new(200, 0), &config);
    planner.write_queued(200, -1, -1);

    assert_eq!(
        writer.moves(),
        vec![
            &move_to(Point3::new(0, 0, 0), 50, 500),
            &move_to(Point3::new(200, 0, 0), 50, 500),
        ]
    );
}

#[test]
fn bridges_keep_nominal_speed_and_override_the_fan() {
    let wall = PathConfig::new(WALL_INNER, 60, 400);
    let bridge = PathConfig::new(BRIDGE, 30, 400);
    let mut writer = FakeWriter::new();
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    planner.set_extrude_speed_factor(50);
    planner.queue_extrusion(Point2::new(1_000, 0), &wall);
    planner.queue_extrusion(Point2::new(2_000, 0), &bridge);
    planner.queue_extrusion(Point2::new(3_000, 0), &wall);
    planner.write_queued(200, 80, 100);

    assert_eq!(
        writer.events,
        vec![
            WriteEvent::Comment {
                text: "TYPE:WALL-INNER".to_string()
            },
            move_to(Point3::new(1_000, 0, 0), 30, 400),
            WriteEvent::FanSpeed { percent: 100 },
            WriteEvent::Comment {
                text: "TYPE:BRIDGE".to_string()
            },
            // the bridge ignores the 50% cooling factor
            move_to(Point3::new(2_000, 0, 0), 30, 400),
            WriteEvent::FanSpeed { percent: 80 },
            WriteEvent::Comment {
                text: "TYPE:WALL-INNER".to_string()
            },
            move_to(Point3::new(3_000, 0, 0), 30, 400),
            WriteEvent::TotalPrintTimeUpdated,
        ]
    );
}

#[test]
fn negative_bridge_fan_means_no_override() {
    let wall = PathConfig::new(WALL_INNER, 60, 400);
    let bridge = PathConfig::new(BRIDGE, 30, 400);
    let mut writer = FakeWriter::new();
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    planner.queue_extrusion(Point2::new(1_000, 0), &wall);
    planner.queue_extrusion(Point2::new(2_000, 0), &bridge);
    planner.write_queued(200, 80, -1);

    assert!(!writer
        .events
        .iter()
        .any(|event| matches!(event, WriteEvent::FanSpeed { .. })));
}

#[test]
fn extruder_switch_supersedes_retraction() {
    let config = PathConfig::new("FILL", 50, 400);
    let mut writer = FakeWriter::new();
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    planner.queue_extrusion(Point2::new(1_000, 0), &config);
    planner.set_extruder(1);
    planner.force_retract();
    planner.queue_travel(Point2::new(5_000, 0));
    planner.write_queued(200, -1, -1);

    assert!(writer
        .events
        .contains(&WriteEvent::SwitchExtruder { extruder_index: 1 }));
    assert!(!writer.events.contains(&WriteEvent::Retract));
}

fn queue_thin_slot<'c>(planner: &mut LayerPlanner<'_, 'c, FakeWriter>, config: &'c PathConfig) {
    let slot = vec![
        Point2::new(0, 0),
        Point2::new(10_000, 0),
        Point2::new(10_000, 10),
        Point2::new(0, 10),
    ];
    planner.queue_polygon(&slot, 0, config);
}

#[test]
fn overlap_merge_toggle_rewrites_a_self_overlapping_loop() {
    let config = PathConfig::new("FILL", 50, 400);
    let mut writer = FakeWriter::new();
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    planner.set_merge_overlapping_lines(true);
    queue_thin_slot(&mut planner, &config);
    planner.write_queued(200, -1, -1);

    // The two long antiparallel runs collapse into one widened midline,
    // reached over width-0 hops.
    let midline = writer.events.iter().find(|event| {
        matches!(event, WriteEvent::Move { line_width_um, .. } if *line_width_um == 410)
    });
    assert!(midline.is_some());
    assert!(writer.events.iter().any(|event| {
        matches!(event, WriteEvent::Move { line_width_um, .. } if *line_width_um == 0)
    }));
    assert_eq!(writer.moves().len(), 6);
}

#[test]
fn overlap_merge_defaults_off() {
    let config = PathConfig::new("FILL", 50, 400);
    let mut writer = FakeWriter::new();
    let mut planner = LayerPlanner::new(&mut writer, 150, 1_500);
    queue_thin_slot(&mut planner, &config);
    planner.write_queued(200, -1, -1);

    assert_eq!(
        writer.move_targets(),
        vec![
            Point3::new(10_000, 0, 0),
            Point3::new(10_000, 10, 0),
            Point3::new(0, 10, 0),
            Point3::new(0, 0, 0),
        ]
    );
}
