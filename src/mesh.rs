//! Mesh geometry: CPU-side [`MeshData`] and GPU-resident [`Mesh`].
//!
//! Vertices are `position`, `normal`, `uv` at shader locations 0, 1 and 2,
//! matching `VertexInput` in `shaders/toon.wgsl`.

use std::f32::consts::{PI, TAU};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use glam::Vec3;

use crate::error::{Result, ToonError};
use crate::gpu::GpuContext;

/// A vertex with position, normal, and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &Self::ATTRIBUTES,
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle geometry in CPU memory.
///
/// All primitives use counter-clockwise winding for front faces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// A unit cube centered at the origin, with per-face normals.
    pub fn cube() -> Self {
        let mut mesh = Self::default();
        for normal in [Vec3::Z, Vec3::NEG_Z, Vec3::Y, Vec3::NEG_Y, Vec3::X, Vec3::NEG_X] {
            // (u, v, normal) is right-handed, so quads wind counter-clockwise.
            let up = if normal.y == 0.0 { Vec3::Y } else { Vec3::NEG_Z * normal.y };
            let u = up.cross(normal);
            let v = normal.cross(u);
            let base = mesh.vertices.len() as u32;
            for (s, t) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                let position = (normal + u * (s * 2.0 - 1.0) + v * (t * 2.0 - 1.0)) * 0.5;
                mesh.vertices
                    .push(Vertex3d::new(position.into(), normal.into(), [s, t]));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        mesh
    }

    /// A UV sphere of radius 0.5.
    pub fn sphere(segments: u32, rings: u32) -> Self {
        Self::parametric(segments, rings, |s, t| {
            let (sin_theta, cos_theta) = (TAU * s).sin_cos();
            let (sin_phi, cos_phi) = (PI * t).sin_cos();
            let normal = Vec3::new(sin_phi * cos_theta, cos_phi, sin_phi * sin_theta);
            (normal * 0.5, normal)
        })
    }

    /// A torus around the Y axis.
    pub fn torus(major_radius: f32, minor_radius: f32, segments: u32, sides: u32) -> Self {
        Self::parametric(sides, segments, |s, t| {
            let (sin_u, cos_u) = (TAU * t).sin_cos();
            let (sin_v, cos_v) = (TAU * s).sin_cos();
            let normal = Vec3::new(cos_u * cos_v, sin_v, sin_u * cos_v);
            let center = Vec3::new(cos_u, 0.0, sin_u) * major_radius;
            (center + normal * minor_radius, normal)
        })
    }

    /// Samples `surface` on a `(columns + 1) x (rows + 1)` grid over the unit
    /// square and stitches it into quads. The seam column and row are
    /// duplicated so UVs stay continuous.
    fn parametric(columns: u32, rows: u32, surface: impl Fn(f32, f32) -> (Vec3, Vec3)) -> Self {
        let stride = columns + 1;
        let mut mesh = Self::default();

        for row in 0..=rows {
            let t = row as f32 / rows as f32;
            for column in 0..=columns {
                let s = column as f32 / columns as f32;
                let (position, normal) = surface(s, t);
                mesh.vertices
                    .push(Vertex3d::new(position.into(), normal.into(), [s, t]));
            }
        }

        for row in 0..rows {
            for column in 0..columns {
                let here = row * stride + column;
                let below = here + stride;
                mesh.indices
                    .extend_from_slice(&[here, here + 1, below, here + 1, below + 1, below]);
            }
        }

        mesh
    }

    /// Loads an STL file (binary or ASCII). STL carries no UVs.
    pub fn from_stl(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::parse_stl(&mut reader)
    }

    pub fn parse_stl<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let stl = stl_io::read_stl(reader)
            .map_err(|e| ToonError::Geometry(format!("STL parse error: {e}")))?;

        let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
        let mut indices = Vec::with_capacity(stl.faces.len() * 3);

        for face in &stl.faces {
            let corners = face.vertices.map(|i| Vec3::from(<[f32; 3]>::from(stl.vertices[i])));
            // Many exporters write zero normals; derive them from the winding.
            let stored = Vec3::from(<[f32; 3]>::from(face.normal));
            let normal = if stored.length_squared() > 0.0 {
                stored.normalize()
            } else {
                (corners[1] - corners[0])
                    .cross(corners[2] - corners[0])
                    .normalize_or_zero()
            };
            let base = vertices.len() as u32;
            for corner in corners {
                vertices.push(Vertex3d::new(corner.into(), normal.into(), [0.0, 0.0]));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }

        Ok(Self::new(vertices, indices))
    }

    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| {
                let p = Vec3::from(v.position);
                (min.min(p), max.max(p))
            },
        )
    }

    /// Centers the geometry at the origin and scales it to fit a unit cube.
    pub fn normalize(&mut self) {
        if self.vertices.is_empty() {
            return;
        }
        let (min, max) = self.bounds();
        let center = (min + max) * 0.5;
        let extent = (max - min).max_element();
        let scale = if extent > 0.0 { 1.0 / extent } else { 1.0 };
        for v in &mut self.vertices {
            v.position = ((Vec3::from(v.position) - center) * scale).into();
        }
    }
}

/// GPU-resident mesh geometry.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads `data` into immutable vertex and index buffers.
    pub fn new(gpu: &GpuContext, data: &MeshData) -> Self {
        use wgpu::util::{BufferInitDescriptor, DeviceExt};

        let upload = |label, contents, usage| {
            gpu.device.create_buffer_init(&BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
        };

        Self {
            vertex_buffer: upload(
                "Toon Mesh Vertices",
                bytemuck::cast_slice(&data.vertices),
                wgpu::BufferUsages::VERTEX,
            ),
            index_buffer: upload(
                "Toon Mesh Indices",
                bytemuck::cast_slice(&data.indices),
                wgpu::BufferUsages::INDEX,
            ),
            index_count: data.indices.len() as u32,
        }
    }
}
