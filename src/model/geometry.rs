use std::f32::consts::{PI, TAU};

use bytemuck::NoUninit;
use glam::Vec3;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    fn new(pos: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self { pos: pos.to_array(), normal: normal.to_array(), uv }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangle corners in mesh-local space
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                Vec3::from(self.vertices[tri[0] as usize].pos),
                Vec3::from(self.vertices[tri[1] as usize].pos),
                Vec3::from(self.vertices[tri[2] as usize].pos),
            ]
        })
    }

    /// Axis-aligned bounding box of all vertices, in mesh-local space
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from(v.pos)))
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An empty set of points yields a zero-sized box at the origin.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut any = false;
        for p in points {
            min = min.min(p);
            max = max.max(p);
            any = true;
        }
        if !any {
            return Self { min: Vec3::ZERO, max: Vec3::ZERO };
        }
        Self { min, max }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// UV sphere, rings from the north pole down, counter-clockwise seen from outside
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let w = width_segments.max(3);
    let h = height_segments.max(2);
    let mut vertices = Vec::with_capacity(((w + 1) * (h + 1)) as usize);
    let mut indices = Vec::new();

    for iy in 0..=h {
        let v = iy as f32 / h as f32;
        for ix in 0..=w {
            let u = ix as f32 / w as f32;
            let pos = Vec3::new(
                -radius * (u * TAU).cos() * (v * PI).sin(),
                radius * (v * PI).cos(),
                radius * (u * TAU).sin() * (v * PI).sin(),
            );
            vertices.push(Vertex::new(pos, pos.normalize_or_zero(), [u, 1.0 - v]));
        }
    }

    let row = w + 1;
    for iy in 0..h {
        for ix in 0..w {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != h - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    Mesh { vertices, indices }
}

/// Torus lying in the local XY plane, tube swept around +Z
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Mesh {
    let radial = radial_segments.max(3);
    let tubular = tubular_segments.max(3);
    let mut vertices = Vec::with_capacity(((radial + 1) * (tubular + 1)) as usize);
    let mut indices = Vec::new();

    for j in 0..=radial {
        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * TAU;
            let v = j as f32 / radial as f32 * TAU;
            let pos = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            vertices.push(Vertex::new(
                pos,
                (pos - center).normalize_or_zero(),
                [i as f32 / tubular as f32, j as f32 / radial as f32],
            ));
        }
    }

    let row = tubular + 1;
    for j in 1..=radial {
        for i in 1..=tubular {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    Mesh { vertices, indices }
}

/// Closed cylinder centred on the origin, axis along +Y
pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Mesh {
    let radial = radial_segments.max(3);
    let half = height / 2.0;
    let slope = (radius_bottom - radius_top) / height;
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    // torso, one height segment
    for y in 0..=1u32 {
        let v = y as f32;
        let r = v * (radius_bottom - radius_top) + radius_top;
        for x in 0..=radial {
            let u = x as f32 / radial as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let pos = Vec3::new(r * sin, -v * height + half, r * cos);
            let normal = Vec3::new(sin, slope, cos).normalize_or_zero();
            vertices.push(Vertex::new(pos, normal, [u, 1.0 - v]));
        }
    }
    let row = radial + 1;
    for x in 0..radial {
        let a = x;
        let b = row + x;
        let c = row + x + 1;
        let d = x + 1;
        indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    for top in [true, false] {
        let r = if top { radius_top } else { radius_bottom };
        let sign = if top { 1.0 } else { -1.0 };
        let normal = Vec3::new(0.0, sign, 0.0);

        let center_start = vertices.len() as u32;
        for _ in 1..=radial {
            vertices.push(Vertex::new(Vec3::new(0.0, half * sign, 0.0), normal, [0.5, 0.5]));
        }
        let center_end = vertices.len() as u32;
        for x in 0..=radial {
            let u = x as f32 / radial as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            vertices.push(Vertex::new(
                Vec3::new(r * sin, half * sign, r * cos),
                normal,
                [cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5],
            ));
        }
        for x in 0..radial {
            let c = center_start + x;
            let i = center_end + x;
            if top {
                indices.extend_from_slice(&[i, i + 1, c]);
            } else {
                indices.extend_from_slice(&[i + 1, i, c]);
            }
        }
    }

    Mesh { vertices, indices }
}

/// Single-quad plane in the local XY plane facing +Z
pub fn plane(width: f32, height: f32) -> Mesh {
    let mut vertices = Vec::with_capacity(4);
    for iy in 0..=1 {
        for ix in 0..=1 {
            let pos = Vec3::new(
                ix as f32 * width - width / 2.0,
                -(iy as f32 * height - height / 2.0),
                0.0,
            );
            vertices.push(Vertex::new(pos, Vec3::Z, [ix as f32, 1.0 - iy as f32]));
        }
    }
    // a = 0, b = 2, c = 3, d = 1
    Mesh { vertices, indices: vec![0, 2, 1, 2, 3, 1] }
}

/// Unit cube edges centred at the origin, drawn as a line list
pub fn wire_box() -> Mesh {
    let mut vertices = Vec::with_capacity(8);
    for z in [-0.5, 0.5] {
        for (x, y) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let pos = Vec3::new(x, y, z);
            vertices.push(Vertex::new(pos, pos.normalize_or_zero(), [0.0, 0.0]));
        }
    }
    let indices = vec![
        0, 1, 1, 2, 2, 3, 3, 0, // back
        4, 5, 5, 6, 6, 7, 7, 4, // front
        0, 4, 1, 5, 2, 6, 3, 7, // sides
    ];

    Mesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vec3, b: Vec3) {
        assert!((a - b).abs().max_element() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn sphere_bounds_match_radius() {
        let bbox = sphere(1.2, 32, 32).bounding_box();
        assert_vec_close(bbox.size(), Vec3::splat(2.4));
        assert_vec_close(bbox.center(), Vec3::ZERO);
    }

    #[test]
    fn torus_bounds_cover_ring_and_tube() {
        let bbox = torus(1.2, 0.4, 24, 64).bounding_box();
        assert_vec_close(bbox.size(), Vec3::new(3.2, 3.2, 0.8));
    }

    #[test]
    fn cylinder_bounds_and_caps() {
        let mesh = cylinder(1.0, 1.0, 2.5, 32);
        let bbox = mesh.bounding_box();
        assert_vec_close(bbox.size(), Vec3::new(2.0, 2.5, 2.0));
        assert_vec_close(bbox.center(), Vec3::ZERO);
        // side quads + two cap fans
        assert_eq!(mesh.triangle_count(), 32 * 2 + 32 * 2);
    }

    #[test]
    fn plane_faces_positive_z() {
        let mesh = plane(100.0, 100.0);
        let [a, b, c] = mesh.triangles().next().unwrap();
        let n = (b - a).cross(c - a).normalize();
        assert_vec_close(n, Vec3::Z);
    }

    #[test]
    fn indices_stay_in_range() {
        for mesh in [sphere(1.0, 8, 6), torus(1.0, 0.2, 6, 12), cylinder(0.5, 1.0, 2.0, 9), wire_box()] {
            let n = mesh.vertices.len() as u32;
            assert!(mesh.indices.iter().all(|&i| i < n));
        }
    }

    #[test]
    fn empty_mesh_has_degenerate_box() {
        let bbox = Mesh::empty().bounding_box();
        assert_eq!(bbox.size(), Vec3::ZERO);
    }
}
