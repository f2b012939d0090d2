//! Procedural UV-sphere generation.
//!
//! The sphere is sampled on a regular latitude/longitude grid and stitched
//! into triangles one latitude band at a time. The result is fully expanded:
//! every index of the triangulation becomes its own [`Vertex`] record, so the
//! mesh can be drawn as a plain triangle list without an index buffer.
//!
//! # Example
//!
//! ```
//! use spinsphere::{SphereParams, generate_sphere};
//!
//! let params = SphereParams::new(1.0, 4, 2).unwrap();
//! let mesh = generate_sphere(&params).unwrap();
//!
//! assert_eq!(mesh.vertex_count(), 24);
//! assert_eq!(mesh.triangle_count(), 8);
//! assert_eq!(mesh.as_floats().len(), 144);
//! ```
//!
//! # Vertex Layout
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | color     | Float32x3 | 12     | 1               |

use std::f32::consts::PI;

/// Color shared by every vertex of the sphere.
pub const SPHERE_COLOR: [f32; 3] = [0.3, 0.5, 0.8];

/// Number of floats in one [`Vertex`] record.
pub const FLOATS_PER_VERTEX: usize = 6;

/// Largest expanded vertex buffer a sphere may need, matching wgpu's default
/// `max_buffer_size` of 256 MiB.
pub const MAX_VERTEX_BUFFER_BYTES: u64 = 256 << 20;

/// A sphere vertex: object-space position and a flat color.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    /// The wgpu vertex buffer layout for [`Vertex`]: position at location 0,
    /// color at location 1, 24 bytes per vertex.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // color
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    };

    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self { position, color }
    }

    /// Distance of this vertex from the origin.
    pub fn length(&self) -> f32 {
        glam::Vec3::from(self.position).length()
    }
}

/// Errors produced when sphere parameters cannot describe a closed surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SphereError {
    /// Radius was zero, negative, or not a finite number.
    InvalidRadius(f32),
    /// Fewer than three longitude divisions.
    TooFewSectors(u32),
    /// Fewer than two latitude divisions.
    TooFewStacks(u32),
    /// The grid or the expanded mesh has more vertices than a `u32` can count.
    TooManyVertices { sectors: u32, stacks: u32 },
    /// The expanded vertex buffer exceeds [`MAX_VERTEX_BUFFER_BYTES`].
    BufferTooLarge { sectors: u32, stacks: u32, bytes: u64 },
}

impl std::fmt::Display for SphereError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SphereError::InvalidRadius(r) => {
                write!(f, "sphere radius must be positive and finite, got {}", r)
            }
            SphereError::TooFewSectors(n) => {
                write!(f, "sphere needs at least 3 sectors, got {}", n)
            }
            SphereError::TooFewStacks(n) => {
                write!(f, "sphere needs at least 2 stacks, got {}", n)
            }
            SphereError::TooManyVertices { sectors, stacks } => write!(
                f,
                "a {}x{} sphere has too many vertices for 32-bit counts",
                sectors, stacks
            ),
            SphereError::BufferTooLarge {
                sectors,
                stacks,
                bytes,
            } => write!(
                f,
                "a {}x{} sphere needs a {} byte vertex buffer, limit is {}",
                sectors, stacks, bytes, MAX_VERTEX_BUFFER_BYTES
            ),
        }
    }
}

impl std::error::Error for SphereError {}

/// Radius and tessellation of a UV-sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereParams {
    /// Distance of every vertex from the center.
    pub radius: f32,
    /// Longitude divisions (around the equator).
    pub sectors: u32,
    /// Latitude divisions (pole to pole).
    pub stacks: u32,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            radius: 0.5,
            sectors: 80,
            stacks: 80,
        }
    }
}

impl SphereParams {
    pub const MIN_SECTORS: u32 = 3;
    pub const MIN_STACKS: u32 = 2;

    /// Creates validated sphere parameters.
    pub fn new(radius: f32, sectors: u32, stacks: u32) -> Result<Self, SphereError> {
        let params = Self {
            radius,
            sectors,
            stacks,
        };
        params.validate()?;
        Ok(params)
    }

    /// Checks that the parameters describe a non-degenerate sphere.
    pub fn validate(&self) -> Result<(), SphereError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(SphereError::InvalidRadius(self.radius));
        }
        if self.sectors < Self::MIN_SECTORS {
            return Err(SphereError::TooFewSectors(self.sectors));
        }
        if self.stacks < Self::MIN_STACKS {
            return Err(SphereError::TooFewStacks(self.stacks));
        }
        let too_many = SphereError::TooManyVertices {
            sectors: self.sectors,
            stacks: self.stacks,
        };
        let grid = (self.sectors as u64 + 1) * (self.stacks as u64 + 1);
        if grid > u32::MAX as u64 {
            return Err(too_many);
        }
        let expanded = self.expanded_len();
        if expanded > u32::MAX as u64 {
            return Err(too_many);
        }
        let bytes = expanded * std::mem::size_of::<Vertex>() as u64;
        if bytes > MAX_VERTEX_BUFFER_BYTES {
            return Err(SphereError::BufferTooLarge {
                sectors: self.sectors,
                stacks: self.stacks,
                bytes,
            });
        }
        Ok(())
    }

    /// Number of expanded vertices, computed without overflowing `usize`.
    fn expanded_len(&self) -> u64 {
        let sectors = self.sectors as u64;
        let stacks = self.stacks as u64;
        3 * (2 * sectors * stacks).saturating_sub(2 * sectors)
    }

    /// Number of unique samples in the latitude/longitude grid.
    pub fn grid_len(&self) -> usize {
        (self.stacks as usize + 1) * (self.sectors as usize + 1)
    }

    /// Number of triangles in the stitched surface.
    ///
    /// Every band contributes two triangles per sector except the two polar
    /// bands, which contribute one.
    pub fn triangle_count(&self) -> usize {
        let sectors = self.sectors as usize;
        let stacks = self.stacks as usize;
        (2 * sectors * stacks).saturating_sub(2 * sectors)
    }

    /// Number of entries in the index list.
    pub fn index_count(&self) -> usize {
        self.triangle_count() * 3
    }
}

/// Samples the unique vertex grid, stack by stack from the `+Z` pole.
///
/// Produces `(stacks + 1) * (sectors + 1)` vertices. The seam column is
/// duplicated (`j == 0` and `j == sectors` coincide) and every vertex of the
/// first and last rows sits on a pole.
pub fn grid_vertices(params: &SphereParams) -> Vec<Vertex> {
    let SphereParams {
        radius,
        sectors,
        stacks,
    } = *params;
    let mut vertices = Vec::with_capacity(params.grid_len());

    for i in 0..=stacks {
        let alpha = PI * i as f32 / stacks as f32;
        let (sin_alpha, cos_alpha) = alpha.sin_cos();

        for j in 0..=sectors {
            let beta = 2.0 * PI * j as f32 / sectors as f32;
            let (sin_beta, cos_beta) = beta.sin_cos();

            let position = [
                radius * sin_alpha * cos_beta,
                radius * sin_alpha * sin_beta,
                radius * cos_alpha,
            ];
            vertices.push(Vertex::new(position, SPHERE_COLOR));
        }
    }

    vertices
}

/// Stitches adjacent grid rows into triangles.
///
/// For stack `i` and sector `j`, with `k1` on row `i` and `k2` directly below
/// it on row `i + 1`, the quad is split into `(k1, k2, k1 + 1)` and
/// `(k1 + 1, k2, k2 + 1)`. The first triangle is skipped on the top band and
/// the second on the bottom band, since those collapse onto a pole.
pub fn triangle_indices(params: &SphereParams) -> Vec<u32> {
    let SphereParams {
        sectors, stacks, ..
    } = *params;
    let mut indices = Vec::with_capacity(params.index_count());

    for i in 0..stacks {
        let mut k1 = i * (sectors + 1);
        let mut k2 = k1 + sectors + 1;

        for _ in 0..sectors {
            if i != 0 {
                indices.extend_from_slice(&[k1, k2, k1 + 1]);
            }
            if i != stacks - 1 {
                indices.extend_from_slice(&[k1 + 1, k2, k2 + 1]);
            }
            k1 += 1;
            k2 += 1;
        }
    }

    indices
}

/// Copies the referenced grid vertex for every index, in index order.
///
/// # Panics
///
/// Panics if an index is out of bounds for `grid`.
pub fn expand(grid: &[Vertex], indices: &[u32]) -> Vec<Vertex> {
    indices.iter().map(|&idx| grid[idx as usize]).collect()
}

/// A fully expanded, non-indexed sphere mesh ready for GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct SphereMesh {
    params: SphereParams,
    vertices: Vec<Vertex>,
}

impl SphereMesh {
    pub fn params(&self) -> &SphereParams {
        &self.params
    }

    /// Expanded vertices, three per triangle.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The vertex records viewed as a flat `[x, y, z, r, g, b, ...]` buffer.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

/// Generates the expanded triangle list for a UV-sphere.
pub fn generate_sphere(params: &SphereParams) -> Result<SphereMesh, SphereError> {
    params.validate()?;

    let grid = grid_vertices(params);
    let indices = triangle_indices(params);
    let vertices = expand(&grid, &indices);

    log::debug!(
        "generated sphere r={} {}x{}: {} grid vertices, {} indices, {} triangles",
        params.radius,
        params.sectors,
        params.stacks,
        grid.len(),
        indices.len(),
        vertices.len() / 3
    );

    Ok(SphereMesh {
        params: *params,
        vertices,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn small_sphere_counts() {
        let params = SphereParams::new(1.0, 4, 2).unwrap();

        assert_eq!(grid_vertices(&params).len(), 15);
        assert_eq!(triangle_indices(&params).len(), 24);

        let mesh = generate_sphere(&params).unwrap();
        assert_eq!(mesh.as_floats().len(), 144);
        assert_eq!(mesh.triangle_count(), 8);
    }

    #[rstest]
    #[case(1.0, 3, 2)]
    #[case(0.5, 4, 2)]
    #[case(2.0, 8, 5)]
    #[case(0.5, 80, 80)]
    #[case(10.0, 17, 9)]
    fn buffer_sizes_agree(#[case] radius: f32, #[case] sectors: u32, #[case] stacks: u32) {
        let params = SphereParams::new(radius, sectors, stacks).unwrap();
        let indices = triangle_indices(&params);
        let mesh = generate_sphere(&params).unwrap();

        assert_eq!(
            grid_vertices(&params).len(),
            (stacks as usize + 1) * (sectors as usize + 1)
        );
        assert_eq!(indices.len() % 3, 0);
        assert_eq!(indices.len(), params.index_count());
        assert_eq!(mesh.as_floats().len(), indices.len() * FLOATS_PER_VERTEX);
        assert_eq!(mesh.triangle_count(), params.triangle_count());
    }

    #[rstest]
    #[case(1.0, 4, 2)]
    #[case(0.5, 80, 80)]
    #[case(3.5, 7, 13)]
    fn vertices_lie_on_sphere(#[case] radius: f32, #[case] sectors: u32, #[case] stacks: u32) {
        let params = SphereParams::new(radius, sectors, stacks).unwrap();

        for vertex in grid_vertices(&params) {
            assert_abs_diff_eq!(vertex.length(), radius, epsilon = 1e-5 * radius);
        }
    }

    #[test]
    fn indices_stay_inside_grid() {
        let params = SphereParams::new(1.0, 12, 7).unwrap();
        let grid_len = params.grid_len() as u32;

        assert!(triangle_indices(&params).iter().all(|&i| i < grid_len));
    }

    #[rstest]
    #[case(4, 2)]
    #[case(6, 3)]
    #[case(32, 16)]
    fn polar_bands_emit_one_fan(#[case] sectors: u32, #[case] stacks: u32) {
        let params = SphereParams::new(1.0, sectors, stacks).unwrap();
        let indices = triangle_indices(&params);
        let row = sectors + 1;

        let band_of = |tri: &[u32]| tri.iter().min().unwrap() / row;
        let triangles_in_band = |band: u32| {
            indices
                .chunks_exact(3)
                .filter(|tri| band_of(tri) == band)
                .count()
        };

        assert_eq!(triangles_in_band(0), sectors as usize);
        assert_eq!(triangles_in_band(stacks - 1), sectors as usize);
        for band in 1..stacks - 1 {
            assert_eq!(triangles_in_band(band), 2 * sectors as usize);
        }
    }

    #[test]
    fn no_triangle_collapses_onto_a_pole() {
        let params = SphereParams::new(1.0, 8, 4).unwrap();
        let grid = grid_vertices(&params);
        let indices = triangle_indices(&params);

        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|n| glam::Vec3::from(grid[tri[n] as usize].position));
            let area = (b - a).cross(c - a).length() * 0.5;
            assert!(area > 1e-6, "degenerate triangle {:?}", tri);
        }
    }

    #[test]
    fn winding_follows_strip_order() {
        let params = SphereParams::new(1.0, 4, 3).unwrap();
        let indices = triangle_indices(&params);

        // top band: only the (k1 + 1, k2, k2 + 1) half
        assert_eq!(&indices[0..3], &[1, 5, 6]);
        // middle band starts at k1 = 5: both halves
        assert_eq!(&indices[12..18], &[5, 10, 6, 6, 10, 11]);
        // bottom band: only the (k1, k2, k1 + 1) half
        let last = indices.len();
        assert_eq!(&indices[last - 3..], &[13, 18, 14]);
    }

    #[test]
    fn triangles_wind_counter_clockwise_from_outside() {
        let params = SphereParams::new(1.0, 16, 8).unwrap();
        let mesh = generate_sphere(&params).unwrap();

        for tri in mesh.vertices().chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|n| glam::Vec3::from(tri[n].position));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn expansion_copies_grid_records_in_order() {
        let params = SphereParams::new(2.0, 5, 3).unwrap();
        let grid = grid_vertices(&params);
        let indices = triangle_indices(&params);
        let expanded = expand(&grid, &indices);

        for (vertex, &idx) in expanded.iter().zip(&indices) {
            assert_eq!(*vertex, grid[idx as usize]);
        }
    }

    #[test]
    fn every_vertex_has_the_sphere_color() {
        let mesh = generate_sphere(&SphereParams::default()).unwrap();

        assert!(mesh.vertices().iter().all(|v| v.color == SPHERE_COLOR));
        for record in mesh.as_floats().chunks_exact(FLOATS_PER_VERTEX) {
            assert_eq!(&record[3..], &SPHERE_COLOR);
        }
    }

    #[test]
    fn poles_sit_on_z_axis() {
        let params = SphereParams::new(2.0, 6, 4).unwrap();
        let grid = grid_vertices(&params);

        let north = grid[0].position;
        let south = grid[grid.len() - 1].position;
        assert_abs_diff_eq!(north[2], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(south[2], -2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(north[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(south[1], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn generation_is_deterministic() {
        let params = SphereParams::new(0.75, 24, 12).unwrap();
        let a = generate_sphere(&params).unwrap();
        let b = generate_sphere(&params).unwrap();

        let bits = |mesh: &SphereMesh| {
            mesh.as_floats()
                .iter()
                .map(|f| f.to_bits())
                .collect::<Vec<_>>()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[rstest]
    #[case(0.0, 8, 4, SphereError::InvalidRadius(0.0))]
    #[case(-1.0, 8, 4, SphereError::InvalidRadius(-1.0))]
    #[case(1.0, 2, 4, SphereError::TooFewSectors(2))]
    #[case(1.0, 0, 4, SphereError::TooFewSectors(0))]
    #[case(1.0, 8, 1, SphereError::TooFewStacks(1))]
    #[case(1.0, 8, 0, SphereError::TooFewStacks(0))]
    fn rejects_degenerate_parameters(
        #[case] radius: f32,
        #[case] sectors: u32,
        #[case] stacks: u32,
        #[case] expected: SphereError,
    ) {
        assert_eq!(SphereParams::new(radius, sectors, stacks), Err(expected));
    }

    #[test]
    fn rejects_non_finite_radius() {
        assert!(matches!(
            SphereParams::new(f32::NAN, 8, 4),
            Err(SphereError::InvalidRadius(_))
        ));
        assert!(SphereParams::new(f32::INFINITY, 8, 4).is_err());
    }

    #[test]
    fn generate_validates_public_fields() {
        let params = SphereParams {
            radius: 1.0,
            sectors: 8,
            stacks: 1,
        };
        assert_eq!(generate_sphere(&params), Err(SphereError::TooFewStacks(1)));
    }

    #[test]
    fn rejects_grids_beyond_u32_indices() {
        assert!(matches!(
            SphereParams::new(1.0, u32::MAX - 1, 4),
            Err(SphereError::TooManyVertices { .. })
        ));
    }

    #[test]
    fn rejects_expanded_meshes_beyond_u32_counts() {
        // The grid still fits in u32, the expanded triangle list does not.
        let params = SphereParams {
            radius: 1.0,
            sectors: 70_000,
            stacks: 60_000,
        };
        assert!(params.grid_len() <= u32::MAX as usize);
        assert_eq!(
            params.validate(),
            Err(SphereError::TooManyVertices {
                sectors: 70_000,
                stacks: 60_000
            })
        );
    }

    #[test]
    fn rejects_vertex_buffers_over_the_size_limit() {
        let result = SphereParams::new(1.0, 2000, 2000);
        assert!(matches!(
            result,
            Err(SphereError::BufferTooLarge { bytes, .. }) if bytes == 23_988_000 * 24
        ));
    }

    #[test]
    fn accepts_large_meshes_under_the_size_limit() {
        let params = SphereParams::new(1.0, 1000, 1000).unwrap();
        let bytes = params.index_count() * std::mem::size_of::<Vertex>();
        assert!(bytes as u64 <= MAX_VERTEX_BUFFER_BYTES);
    }

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), FLOATS_PER_VERTEX * 4);
        assert_eq!(Vertex::LAYOUT.array_stride, 24);
        assert_eq!(Vertex::LAYOUT.attributes[1].offset, 12);
    }
}
