//! Plans one layer of two square islands against the recording writer and
//! prints the resulting motion stream.
//!
//! Run with `cargo run -p sim --example plan_square`.

use anyhow::Result;
use geom::Point2;
use sim::harness::{dump_trace, square, RectBoundary};
use sim::FakeWriter;
use toolpath::config::{WALL_INNER, WALL_OUTER};
use toolpath::{LayerPlanner, NearestIslandOrder, PathConfig, PlannerSettings};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = PlannerSettings::default();
    let outer_wall = PathConfig::new(WALL_OUTER, 40, 400);
    let inner_wall = PathConfig::new(WALL_INNER, 60, 400);
    let boundary = RectBoundary::new(Point2::new(0, 0), Point2::new(30_000, 30_000));

    let mut writer = FakeWriter::new();
    writer.set_z(200);

    let mut planner = LayerPlanner::from_settings(&mut writer, &settings);
    planner.set_outer_perimeters_to_avoid(Some(&boundary));

    let islands = vec![
        square(Point2::new(16_000, 2_000), 8_000),
        square(Point2::new(2_000, 2_000), 8_000),
    ];
    planner.queue_polygons_by_optimizer(&islands, &inner_wall, &NearestIslandOrder);
    planner.queue_polygon(&square(Point2::new(1_600, 1_600), 8_800), 0, &outer_wall);

    planner.force_minimum_layer_time(settings.minimum_layer_time_s, settings.minimum_printing_speed_mm_s);
    info!(
        extrude_speed_factor = planner.extrude_speed_factor(),
        total_print_time = planner.total_print_time(),
        "layer planned"
    );

    planner.write_queued(
        200,
        settings.fan_speed_percent,
        settings.bridge_fan_speed_percent,
    );

    for event in &writer.events {
        println!("{event:?}");
    }

    let trace_path = std::env::temp_dir().join("plan_square_trace.json");
    dump_trace(&writer.events, &trace_path)?;
    info!(path = %trace_path.display(), "trace written");
    Ok(())
}
