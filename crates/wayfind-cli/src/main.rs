use std::time::Duration;

use nalgebra::Point2;
use wayfind_core::path::{parse_waypoints, PathDefinition, PathRecord};
use wayfind_core::session::{Mode, NavigationStatus};
use wayfind_engine::NavigationEngine;
use wayfind_providers::{MockSensorPlatform, MotionSampler, RawSensorEvent, RecordingSpeech};

fn main() {
    env_logger::init();

    let definition = build_auditorium_path();
    let platform = MockSensorPlatform::new(true, true);
    let speech = RecordingSpeech::new();
    let mut engine = NavigationEngine::new(platform.clone(), speech.clone());
    let mut sampler = MotionSampler::new();

    println!("Booting wayfind scripted-walk demo...");
    engine
        .start(&definition, None)
        .expect("fixture path starts");

    // Replay a walk to the stage: a footfall every half second, with the
    // compass swinging as the walker corrects course.
    let mut clock_ms: u64 = 0;
    loop {
        clock_ms += 500;

        let accel = sampler.ingest_accelerometer(RawSensorEvent::new(
            Duration::from_millis(clock_ms),
            0.4,
            2.9,
            0.6,
        ));
        engine.ingest_accelerometer(accel);

        let swing = (clock_ms as f64 / 1_000.0).sin() * 10.0;
        let mag = sampler.ingest_magnetometer(RawSensorEvent::new(
            Duration::from_millis(clock_ms),
            swing.to_radians().sin() * 30.0,
            swing.to_radians().cos() * 30.0,
            -12.0,
        ));
        engine.ingest_magnetometer(mag);

        // Halfway down the hall the walker stops for a moment, then
        // finishes the route by hand.
        if engine.step_count() == engine.max_steps() / 2 && engine.mode() == Mode::Auto {
            engine.pause().expect("pause while navigating");
            engine.resume().expect("resume while paused");
            engine.switch_mode(Mode::Manual).expect("switch mid-session");
        }
        if engine.mode() == Mode::Manual && engine.status() == NavigationStatus::Navigating {
            engine.advance_step().expect("manual step in manual mode");
        }

        let snapshot = engine.snapshot();
        println!(
            "t={:>6} ms step {:>2}/{} pos=({:>5.1}, {:>5.1}) heading={:>5.1}° {:>5.1}% remaining={:>4.1} m",
            clock_ms,
            snapshot.step_count,
            snapshot.max_steps,
            snapshot.current_position.map(|p| p[0]).unwrap_or(f64::NAN),
            snapshot.current_position.map(|p| p[1]).unwrap_or(f64::NAN),
            snapshot.heading_degrees,
            snapshot.progress_percentage,
            snapshot.remaining_distance_meters,
        );

        if snapshot.status == NavigationStatus::Arrived {
            break;
        }
    }

    let final_snapshot =
        serde_json::to_string_pretty(&engine.snapshot()).expect("snapshot serializes");
    println!("\nFinal session snapshot:\n{final_snapshot}");

    println!("\nSpoken guidance transcript:");
    for phrase in speech.transcript() {
        println!("  \"{phrase}\"");
    }
    println!(
        "\nDemo complete — {} sensor listeners still registered.",
        platform.active_subscriptions()
    );
}

fn build_auditorium_path() -> PathDefinition {
    PathDefinition::Simple(PathRecord {
        id: "auditorium-stage".to_string(),
        title: "Auditorium Stage".to_string(),
        waypoints: parse_waypoints("50,95 50,3.2").expect("fixture waypoints"),
        max_steps: 42,
        total_distance_meters: 32.0,
        start_point: Point2::new(50.0, 95.0),
        target_point: Point2::new(50.0, 3.2),
        voice_guidance: "Walk 32 meters straight to reach the stage.".to_string(),
        initial_bearing_deg: Some(0.0),
    })
}
