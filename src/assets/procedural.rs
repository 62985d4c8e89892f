//! Procedural meshes used when no asset file is configured.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use super::mesh::{MeshData, MeshVertex};

/// Scale applied to the head ellipsoid before cutting the scalp cap, so hair
/// roots sit just outside the head collider.
pub const SCALP_INFLATION: f32 = 1.03;

/// Polar angle (from local +Y) covered by the scalp cap.
pub const SCALP_CAP_ANGLE: f32 = 1.2;

/// Unit sphere centred at the origin.
pub fn uv_sphere(stacks: u32, slices: u32) -> MeshData {
    sphere_band(stacks, slices, PI)
}

/// Part of the unit sphere with polar angle in `[0, max_theta]`, measured from +Y.
///
/// Triangles are wound counter-clockwise seen from outside. Triangles that
/// would collapse onto a pole are left out so every emitted triangle has area.
pub fn sphere_band(stacks: u32, slices: u32, max_theta: f32) -> MeshData {
    let stacks = stacks.max(1);
    let slices = slices.max(3);
    let max_theta = max_theta.clamp(0.0, PI);
    let closes_bottom = (max_theta - PI).abs() < 1e-6;

    let mut mesh = MeshData::default();
    for i in 0..=stacks {
        let v = i as f32 / stacks as f32;
        let theta = v * max_theta;
        for j in 0..=slices {
            let u = j as f32 / slices as f32;
            let phi = u * 2.0 * PI;
            let p = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            mesh.vertices.push(MeshVertex::new(p, p, [u, v]));
        }
    }

    let row = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = (i + 1) * row + j;
            let c = (i + 1) * row + j + 1;
            let d = i * row + j + 1;
            if !(closes_bottom && i + 1 == stacks) {
                mesh.indices.extend_from_slice(&[a, c, b]);
            }
            if i != 0 {
                mesh.indices.extend_from_slice(&[a, d, c]);
            }
        }
    }
    mesh
}

/// Axis-aligned cube spanning `[-0.5, 0.5]` on every axis, flat-shaded.
pub fn unit_cube() -> MeshData {
    // (normal, u, v) with u x v == normal, so corners come out CCW from outside.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut mesh = MeshData::default();
    for (normal, u, v) in FACES {
        let base = mesh.vertices.len() as u32;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let p = normal * 0.5 + u * su + v * sv;
            mesh.vertices.push(MeshVertex::new(p, normal, [su + 0.5, 0.5 - sv]));
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Stand-in head model: one ellipsoid per body collider transform.
pub fn mannequin(body_transforms: &[Mat4]) -> MeshData {
    let sphere = uv_sphere(24, 32);
    let mut mesh = MeshData::default();
    for transform in body_transforms {
        mesh.append(&sphere.transformed(*transform));
    }
    mesh
}

/// Upper cap of the head ellipsoid, used as the default hair growth surface.
pub fn scalp(head_transform: Mat4) -> MeshData {
    sphere_band(12, 32, SCALP_CAP_ANGLE)
        .transformed(head_transform * Mat4::from_scale(Vec3::splat(SCALP_INFLATION)))
}
