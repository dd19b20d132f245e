use crate::scene;
use anyhow::Result;
use raysync::math::{Mat4, Quat, Vec3};
use raysync::{
    PointCloud, RaySyncDesc, RaySyncEngine, RaySyncEvent, RaySyncWorld, Sensor, SensorParams,
    SoftwareEngine, TrackedTransform,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Spins a sensor rig in the middle of a ring of cubes while one cube drifts in and
/// out of the culling radius.
pub fn run_continuous(seconds: f32) -> Result<()> {
    let demo = scene::build(12, 10.0);
    let origin = Arc::new(TrackedTransform::default());

    let desc = RaySyncDesc::default()
        .target_rate(30.0)
        .origin(origin.clone(), 20.0);
    let mut world = RaySyncWorld::new(desc, SoftwareEngine::new())?;
    let registered = world.register_objects(&demo.collection)?;
    log::info!("Registered {} objects", registered);

    let params = SensorParams::new(25.0, 10.0, 60.0, 0.5);
    let front = Sensor::new("front", Mat4::IDENTITY, params)?.into_shared();
    let back = Sensor::new(
        "back",
        Mat4::from_rotation_y(std::f32::consts::PI),
        params,
    )?
    .into_shared();
    log::info!(
        "Two sensors with {} samples each",
        params.total_samples()
    );

    let cloud = Arc::new(Mutex::new(PointCloud::new()));
    let consumer_cloud = cloud.clone();

    let mut engine = RaySyncEngine::new(world);
    engine.start_continuous(vec![front.clone(), back.clone()], move |points: &[Vec3]| {
        if let Ok(mut cloud) = consumer_cloud.lock() {
            cloud.update(points);
        }
    })?;

    let started = Instant::now();
    let mut delivered = 0usize;
    let mut failures = 0usize;
    while started.elapsed().as_secs_f32() < seconds {
        let t = started.elapsed().as_secs_f32();

        let yaw = Quat::from_rotation_y(t * 0.8);
        front.transform().set_matrix(Mat4::from_quat(yaw));
        back
            .transform()
            .set_matrix(Mat4::from_quat(yaw * Quat::from_rotation_y(std::f32::consts::PI)));
        demo.mover
            .transform()
            .set_position(Vec3::new(0.0, 0.0, 6.0 + 20.0 * (t * 0.5).sin().abs()));
        engine.advance_time(t)?;

        for event in engine.poll_events() {
            match event {
                RaySyncEvent::HitPointsDelivered {
                    count,
                    tick_duration,
                    ..
                } => {
                    delivered += 1;
                    log::debug!("{} hit points in {:?}", count, tick_duration);
                }
                RaySyncEvent::TickFailed { error, .. } => {
                    failures += 1;
                    log::warn!("Tick failed: {}", error);
                }
                RaySyncEvent::SessionStateChanged { old, new, .. } => {
                    log::info!("Session {:?} -> {:?}", old, new);
                }
            }
        }

        std::thread::sleep(Duration::from_millis(16));
    }

    engine.stop();
    for event in engine.poll_events() {
        if let RaySyncEvent::SessionStateChanged { old, new, .. } = event {
            log::info!("Session {:?} -> {:?}", old, new);
        }
    }

    if let Ok(cloud) = cloud.lock() {
        log::info!(
            "{} deliveries, {} failures; point cloud holds {} points (indirect args {:?})",
            delivered,
            failures,
            cloud.len(),
            cloud.indirect_args()
        );
    }
    Ok(())
}

/// Single-shot queries against a static scene, then against a moved one.
pub fn run_queries() -> Result<()> {
    let demo = scene::build(8, 6.0);
    let mut world = RaySyncWorld::new(RaySyncDesc::default(), SoftwareEngine::new())?;
    world.register_objects(&demo.collection)?;

    let ray_origin = Vec3::new(0.1, 0.2, 0.0);
    log::info!(
        "Ray +Z hits: {}",
        world.cast_ray(ray_origin, Vec3::Z, 50.0)?
    );
    match world.cast_ray_hit_point(ray_origin, Vec3::Z, 50.0)? {
        Some(point) => log::info!("Closest hit at {}", point),
        None => log::info!("No hit"),
    }

    demo.mover.transform().set_position(Vec3::new(0.0, 0.0, 3.0));
    match world.cast_ray_hit_point(ray_origin, Vec3::Z, 50.0)? {
        Some(point) => log::info!("After moving the cube, closest hit at {}", point),
        None => log::info!("No hit after move"),
    }

    let sensor = Sensor::new("survey", Mat4::IDENTITY, SensorParams::default())?.into_shared();
    let count = world.fire_sensors_count(vec![sensor])?;
    log::info!("Survey sensor: {} of {} rays hit", count, SensorParams::default().total_samples());

    let points = world.fire_sensors_positions()?.to_vec();
    if let Some(nearest) = points
        .iter()
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
    {
        log::info!("Nearest sensor hit at {}", nearest);
    }

    world.shutdown();
    Ok(())
}
