use raysync::SceneCollection;
use raysync::SceneObject;
use raysync::math::{Mat4, Vec3};
use std::sync::Arc;

/// Triangle list for an axis-aligned cube with edge length `size`, centred on the
/// origin.
pub fn cube_vertices(size: f32) -> Arc<[Vec3]> {
    let h = size * 0.5;
    let corners = [
        Vec3::new(-h, -h, -h),
        Vec3::new(h, -h, -h),
        Vec3::new(h, h, -h),
        Vec3::new(-h, h, -h),
        Vec3::new(-h, -h, h),
        Vec3::new(h, -h, h),
        Vec3::new(h, h, h),
        Vec3::new(-h, h, h),
    ];
    const FACES: [[usize; 4]; 6] = [
        [0, 1, 2, 3],
        [5, 4, 7, 6],
        [4, 0, 3, 7],
        [1, 5, 6, 2],
        [3, 2, 6, 7],
        [4, 5, 1, 0],
    ];

    FACES
        .iter()
        .flat_map(|[a, b, c, d]| {
            [
                corners[*a], corners[*b], corners[*c], corners[*a], corners[*c], corners[*d],
            ]
        })
        .collect::<Vec<_>>()
        .into()
}

/// A ring of cubes around the origin plus one cube that the demo moves around.
pub struct DemoScene {
    pub collection: SceneCollection,
    pub mover: Arc<SceneObject>,
}

pub fn build(ring_count: usize, ring_radius: f32) -> DemoScene {
    let cube = cube_vertices(1.5);
    let mut collection = SceneCollection::new();

    for i in 0..ring_count {
        let angle = i as f32 / ring_count as f32 * std::f32::consts::TAU;
        let position = Vec3::new(angle.sin() * ring_radius, 0.0, angle.cos() * ring_radius);
        collection.add(
            SceneObject::new(format!("ring-{}", i), cube.clone(), Mat4::from_translation(position))
                .with_layer(1),
        );
    }

    let mover = collection.add(
        SceneObject::new(
            "mover",
            cube,
            Mat4::from_translation(Vec3::new(0.0, 0.0, 6.0)),
        )
        .with_layer(2)
        .with_tag("dynamic"),
    );

    DemoScene { collection, mover }
}
