//! Analytic collision volumes.
//!
//! Every collider is the unit sphere under an affine transform, which makes
//! it an arbitrary ellipsoid. The inverse and inverse-transpose are computed
//! once here so the kernel can test points in collider-local space and take
//! contact normals from the inverse-transpose.
//!
//! ## GPU layout (group 5, binding 0)
//! | Offset | Field |
//! |--------|-------|
//! | 0 | `count: u32` + 12 bytes padding |
//! | 16 | `items: array<GpuCollider>`, 192 bytes each |

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use wgpu::util::DeviceExt;

use crate::context::{GpuError, GraphicsContext};

/// Byte offset of the first collider record in the storage buffer.
pub const COLLIDER_HEADER_SIZE: wgpu::BufferAddress = 16;

/// Placement of one collider, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderDesc {
    pub name: String,
    pub translation: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    pub rotation_degrees: Vec3,
    pub scale: Vec3,
    /// Part of the mannequin body (meshed for the stand-in head model).
    #[serde(default)]
    pub body: bool,
}

impl ColliderDesc {
    pub fn new(name: &str, translation: Vec3, rotation_degrees: Vec3, scale: Vec3, body: bool) -> Self {
        Self {
            name: name.to_string(),
            translation,
            rotation_degrees,
            scale,
            body,
        }
    }

    /// `T * Rz * Ry * Rx * S`.
    pub fn transform(&self) -> Mat4 {
        let r = self.rotation_degrees;
        let rotation = Quat::from_rotation_z(r.z.to_radians())
            * Quat::from_rotation_y(r.y.to_radians())
            * Quat::from_rotation_x(r.x.to_radians());
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }

    /// Mannequin colliders of the demo scene.
    pub fn demo_set() -> Vec<ColliderDesc> {
        vec![
            ColliderDesc::new("sphere", Vec3::new(2.0, 0.0, 1.0), Vec3::ZERO, Vec3::ONE, false),
            ColliderDesc::new("face", Vec3::new(0.0, 2.511, 0.915), Vec3::ZERO, Vec3::new(0.561, 0.749, 0.615), true),
            ColliderDesc::new("head", Vec3::new(0.0, 2.7, -0.02), Vec3::new(-38.27, 0.0, 0.0), Vec3::new(0.84, 1.158, 1.2), true),
            ColliderDesc::new("neck", Vec3::new(0.0, 1.35, -0.288), Vec3::new(18.301, 0.0, 0.0), Vec3::new(0.457, 1.0, 0.538), true),
            ColliderDesc::new("bust", Vec3::new(0.0, -0.38, -0.116), Vec3::new(-17.26, 0.0, 0.0), Vec3::new(1.078, 1.683, 0.974), true),
            ColliderDesc::new("shoulderR", Vec3::new(-0.698, 0.087, -0.36), Vec3::new(-20.254, 13.144, 34.5), Vec3::new(0.721, 1.0, 0.724), true),
            ColliderDesc::new("shoulderL", Vec3::new(0.698, 0.087, -0.36), Vec3::new(-20.254, 13.144, -34.5), Vec3::new(0.721, 1.0, 0.724), true),
        ]
    }
}

const MIN_DETERMINANT: f32 = 1e-8;

/// Result of pushing a point out of one collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub position: Vec3,
    pub normal: Vec3,
}

/// Previous position carried into the next Verlet step after a contact.
///
/// The implied velocity `resolved - carried` keeps the normal part of
/// `resolved - position` and scales the tangential part by `1 - friction`.
/// Mirrors the integrate kernel.
pub fn friction_carry(position: Vec3, resolved: Vec3, normal: Vec3, friction: f32) -> Vec3 {
    let displacement = resolved - position;
    let tangential = displacement - normal * displacement.dot(normal);
    position + tangential * friction
}

/// Precomputed matrices of one ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub transform: Mat4,
    pub inverse: Mat4,
    pub inverse_transpose: Mat4,
}

impl Collider {
    pub fn from_transform(transform: Mat4) -> Self {
        let inverse = transform.inverse();
        Self {
            transform,
            inverse,
            inverse_transpose: inverse.transpose(),
        }
    }

    /// A transform with a (near) zero determinant has no usable inverse.
    pub fn is_invertible(transform: &Mat4) -> bool {
        let det = transform.determinant();
        det.is_finite() && det.abs() > MIN_DETERMINANT
    }

    /// Whether `point` lies inside the ellipsoid.
    pub fn contains(&self, point: Vec3) -> bool {
        self.inverse.transform_point3(point).length_squared() < 1.0
    }

    /// Nearest point on the surface, inflated by `margin` in local units.
    ///
    /// Mirrors the kernel's push-out. Points exactly at the centre have no
    /// direction and are returned unchanged.
    pub fn push_out(&self, point: Vec3, margin: f32) -> Vec3 {
        self.resolve(point, margin).map_or(point, |contact| contact.position)
    }

    /// Push-out plus the world-space surface normal at the contact, or `None`
    /// when `point` is outside the inflated surface.
    pub fn resolve(&self, point: Vec3, margin: f32) -> Option<Contact> {
        let local = self.inverse.transform_point3(point);
        let distance = local.length();
        let radius = 1.0 + margin;
        if distance >= radius || distance <= 1e-6 {
            return None;
        }
        Some(Contact {
            position: self.transform.transform_point3(local * (radius / distance)),
            normal: self.inverse_transpose.transform_vector3(local).normalize(),
        })
    }

    pub fn to_gpu(&self) -> GpuCollider {
        GpuCollider {
            transform: self.transform.to_cols_array_2d(),
            inverse: self.inverse.to_cols_array_2d(),
            inverse_transpose: self.inverse_transpose.to_cols_array_2d(),
        }
    }
}

/// GPU record, 192 bytes, column-major.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuCollider {
    pub transform: [[f32; 4]; 4],
    pub inverse: [[f32; 4]; 4],
    pub inverse_transpose: [[f32; 4]; 4],
}

impl GpuCollider {
    const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    /// Per-instance layout exposing the transform columns at locations 3..=6.
    pub fn instance_desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuCollider>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::INSTANCE_ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct ColliderHeader {
    count: u32,
    _pad: [u32; 3],
}

/// Immutable set of colliders, uploaded once.
pub struct ColliderPool {
    pub name: String,
    colliders: Vec<Collider>,
    descs: Vec<ColliderDesc>,
    buffer: Option<wgpu::Buffer>,
}

impl ColliderPool {
    /// Colliders whose transform cannot be inverted (a zero scale axis) are
    /// dropped with a warning.
    pub fn new(name: impl Into<String>, descs: Vec<ColliderDesc>) -> Self {
        let name = name.into();
        let descs: Vec<ColliderDesc> = descs
            .into_iter()
            .filter(|d| {
                let invertible = Collider::is_invertible(&d.transform());
                if !invertible {
                    log::warn!("Collider '{}' in pool '{}' is degenerate (scale {}), dropped", d.name, name, d.scale);
                }
                invertible
            })
            .collect();
        let colliders = descs.iter().map(|d| Collider::from_transform(d.transform())).collect();
        Self {
            name,
            colliders,
            descs,
            buffer: None,
        }
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    pub fn descs(&self) -> &[ColliderDesc] {
        &self.descs
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Collider with the given name, if any.
    pub fn find(&self, name: &str) -> Option<&Collider> {
        self.descs.iter().position(|d| d.name == name).map(|i| &self.colliders[i])
    }

    /// Transforms of the colliders flagged as body parts.
    pub fn body_transforms(&self) -> Vec<Mat4> {
        self.descs
            .iter()
            .zip(&self.colliders)
            .filter(|(d, _)| d.body)
            .map(|(_, c)| c.transform)
            .collect()
    }

    /// Header plus records. An empty pool still carries one zeroed record so
    /// the storage binding is never empty.
    pub fn gpu_bytes(&self) -> Vec<u8> {
        let header = ColliderHeader {
            count: self.colliders.len() as u32,
            _pad: [0; 3],
        };
        let mut records: Vec<GpuCollider> = self.colliders.iter().map(Collider::to_gpu).collect();
        if records.is_empty() {
            records.push(GpuCollider::zeroed());
        }

        let mut bytes = bytemuck::bytes_of(&header).to_vec();
        bytes.extend_from_slice(bytemuck::cast_slice(&records));
        bytes
    }

    /// Create the storage buffer. Also usable as an instance vertex buffer
    /// starting at [`COLLIDER_HEADER_SIZE`].
    pub fn upload(&mut self, ctx: &GraphicsContext) -> Result<(), GpuError> {
        let bytes = self.gpu_bytes();
        let buffer = ctx.checked("collider upload", |ctx| {
            ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Collider Storage"),
                contents: &bytes,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX,
            })
        })?;
        self.buffer = Some(buffer);
        log::info!("Collider pool '{}' uploaded ({} colliders)", self.name, self.len());
        Ok(())
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Mat4, b: Mat4) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn test_gpu_record_size() {
        assert_eq!(std::mem::size_of::<GpuCollider>(), 192);
        assert_eq!(std::mem::size_of::<ColliderHeader>() as u64, COLLIDER_HEADER_SIZE);
    }

    #[test]
    fn test_transform_order_is_t_rz_ry_rx_s() {
        let desc = ColliderDesc::new("t", Vec3::new(1.0, 2.0, 3.0), Vec3::new(10.0, 20.0, 30.0), Vec3::new(2.0, 3.0, 4.0), false);
        let expected = Mat4::from_translation(desc.translation)
            * Mat4::from_rotation_z(30f32.to_radians())
            * Mat4::from_rotation_y(20f32.to_radians())
            * Mat4::from_rotation_x(10f32.to_radians())
            * Mat4::from_scale(desc.scale);
        assert!(approx(desc.transform(), expected));
    }

    #[test]
    fn test_inverse_and_inverse_transpose() {
        let desc = &ColliderDesc::demo_set()[2];
        let c = Collider::from_transform(desc.transform());
        assert!(approx(c.transform * c.inverse, Mat4::IDENTITY));
        assert!(approx(c.inverse_transpose, c.transform.inverse().transpose()));
    }

    #[test]
    fn test_contains_respects_scale() {
        let c = Collider::from_transform(Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)));
        assert!(c.contains(Vec3::new(1.5, 0.0, 0.0)));
        assert!(!c.contains(Vec3::new(0.0, 1.5, 0.0)));
    }

    #[test]
    fn test_push_out_lands_on_inflated_surface() {
        let c = Collider::from_transform(Mat4::from_translation(Vec3::Y));
        let moved = c.push_out(Vec3::new(0.5, 1.0, 0.0), 0.1);
        assert!((moved - Vec3::new(1.1, 1.0, 0.0)).length() < 1e-5);
        // Outside points are untouched.
        assert_eq!(c.push_out(Vec3::new(3.0, 0.0, 0.0), 0.1), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_contact_normal_follows_ellipsoid_gradient() {
        let c = Collider::from_transform(Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)));
        let contact = c.resolve(Vec3::new(1.0, 0.5, 0.0), 0.0).unwrap();
        // Gradient of x^2/4 + y^2 at (1, 0.5) is proportional to (0.25, 0.5).
        let expected = Vec3::new(0.25, 0.5, 0.0).normalize();
        assert!((contact.normal - expected).length() < 1e-5);
        assert!((contact.position - c.push_out(Vec3::new(1.0, 0.5, 0.0), 0.0)).length() < 1e-6);
        assert!(c.resolve(Vec3::new(3.0, 0.0, 0.0), 0.0).is_none());
    }

    #[test]
    fn test_full_friction_keeps_normal_motion_only() {
        let position = Vec3::ZERO;
        let resolved = Vec3::new(1.0, 2.0, 0.0);
        let carried = friction_carry(position, resolved, Vec3::Y, 1.0);
        assert!((resolved - carried - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);

        let frictionless = friction_carry(position, resolved, Vec3::Y, 0.0);
        assert_eq!(resolved - frictionless, resolved - position);

        let half = friction_carry(position, resolved, Vec3::Y, 0.5);
        assert!((resolved - half - Vec3::new(0.5, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_collider_is_dropped() {
        let mut descs = ColliderDesc::demo_set();
        descs.push(ColliderDesc::new("flat", Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0), false));
        let pool = ColliderPool::new("demo", descs);
        assert_eq!(pool.len(), 7);
        assert!(pool.find("flat").is_none());
        assert!(pool
            .colliders()
            .iter()
            .all(|c| c.inverse.is_finite() && c.inverse_transpose.is_finite()));
    }

    #[test]
    fn test_pool_bytes_have_header() {
        let pool = ColliderPool::new("demo", ColliderDesc::demo_set());
        let bytes = pool.gpu_bytes();
        assert_eq!(bytes.len(), 16 + 7 * 192);
        assert_eq!(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 7);

        let empty = ColliderPool::new("none", Vec::new());
        assert_eq!(empty.gpu_bytes().len(), 16 + 192);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_body_parts_and_lookup() {
        let pool = ColliderPool::new("demo", ColliderDesc::demo_set());
        assert_eq!(pool.body_transforms().len(), 6);
        assert!(pool.find("head").is_some());
        assert!(pool.find("tail").is_none());
    }
}
