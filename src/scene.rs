//! Demo scene: built-in mesh, camera and the vertex stage feeding the rasterizer
//!
//! World space is right-handed with +Y up. Camera space is x right, y down,
//! z forward, so projected coordinates map straight onto framebuffer pixels.

use softpipe::rasterizer::{rasterize, signed_area, Framebuffer, Rgba, Triangle, Vec3};

/// A triangle of a [`Mesh`]
#[derive(Debug, Clone, Copy)]
pub struct MeshFace {
    pub indices: [usize; 3],
    /// Skip backface culling (thin panels)
    pub double_sided: bool,
}

/// Indexed triangle mesh with one color per vertex
///
/// Faces are wound counter-clockwise when seen from their front side.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Rgba>,
    pub faces: Vec<MeshFace>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a quad as two triangles; corners in counter-clockwise order
    pub fn push_quad(&mut self, corners: [Vec3; 4], colors: [Rgba; 4], double_sided: bool) {
        let base = self.positions.len();
        self.positions.extend(corners);
        self.colors.extend(colors);
        for indices in [[base, base + 1, base + 2], [base, base + 2, base + 3]] {
            self.faces.push(MeshFace { indices, double_sided });
        }
    }

    /// Axis-aligned cube centered on the origin, colored by corner position
    pub fn cube(half: f32) -> Self {
        // (normal, u, v) with u x v = normal, so corners walk counter-clockwise
        let sides = [
            (Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
            (Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 1.0, 0.0)),
            (Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0)),
            (Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0)),
            (Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),
            (Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.0, 0.0, 0.0)),
        ];

        let mut mesh = Self::new();
        for (normal, u, v) in sides {
            let c = normal * half;
            let (u, v) = (u * half, v * half);
            let corners = [c - u - v, c + u - v, c + u + v, c - u + v];
            let colors = corners.map(|p| {
                Rgba::new(0.5 + p.x / (2.0 * half), 0.5 + p.y / (2.0 * half), 0.5 + p.z / (2.0 * half))
            });
            mesh.push_quad(corners, colors, false);
        }
        mesh
    }

    /// Cube with glass front and back, crossed by a translucent panel
    pub fn demo(glass_alpha: f32) -> Self {
        let mut mesh = Self::cube(0.8);

        // the +z and -z sides, four vertices and two faces each
        for side in [4, 5] {
            for color in &mut mesh.colors[side * 4..side * 4 + 4] {
                *color = color.alpha(glass_alpha);
            }
            for face in &mut mesh.faces[side * 2..side * 2 + 2] {
                face.double_sided = true;
            }
        }

        let s = 1.3;
        let cyan = Rgba::new(0.2, 0.9, 1.0).alpha(glass_alpha);
        mesh.push_quad(
            [
                Vec3::new(0.0, -s, -s),
                Vec3::new(0.0, s, -s),
                Vec3::new(0.0, s, s),
                Vec3::new(0.0, -s, s),
            ],
            [cyan, cyan, cyan.alpha(glass_alpha * 0.5), cyan.alpha(glass_alpha * 0.5)],
            true,
        );
        mesh
    }
}

/// Camera state
pub struct Camera {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,

    // Computed basis vectors
    pub basis_x: Vec3,
    pub basis_y: Vec3,
    pub basis_z: Vec3,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut cam = Self {
            position,
            pitch: 0.0,
            yaw: 0.0,
            basis_x: Vec3::new(-1.0, 0.0, 0.0),
            basis_y: Vec3::new(0.0, -1.0, 0.0),
            basis_z: Vec3::new(0.0, 0.0, 1.0),
        };
        cam.update_basis();
        cam
    }

    pub fn update_basis(&mut self) {
        let up = Vec3::new(0.0, 1.0, 0.0);

        // Forward vector based on rotation
        self.basis_z = Vec3 {
            x: self.pitch.cos() * self.yaw.sin(),
            y: -self.pitch.sin(),
            z: self.pitch.cos() * self.yaw.cos(),
        };

        // Right, then down
        self.basis_x = self.basis_z.cross(up).normalize();
        self.basis_y = self.basis_z.cross(self.basis_x);
    }

    /// Mouse look; pitch stops just short of straight up or down
    pub fn rotate(&mut self, dpitch: f32, dyaw: f32) {
        self.yaw = (self.yaw + dyaw) % std::f32::consts::TAU;
        self.pitch = (self.pitch + dpitch).clamp(
            -std::f32::consts::FRAC_PI_2 + 0.01,
            std::f32::consts::FRAC_PI_2 - 0.01,
        );
        self.update_basis();
    }

    /// Walk in the yaw frame: `forward` along the view direction projected
    /// onto the ground, `right` sideways, `rise` along world +Y
    pub fn walk(&mut self, forward: f32, right: f32, rise: f32) {
        let (s, c) = self.yaw.sin_cos();
        let ahead = Vec3::new(s, 0.0, c);
        let side = Vec3::new(-c, 0.0, s);
        self.position = self.position + ahead * forward + side * right + Vec3::new(0.0, rise, 0.0);
    }

    /// World position to camera space
    pub fn to_view(&self, p: Vec3) -> Vec3 {
        let rel = p - self.position;
        Vec3::new(rel.dot(self.basis_x), rel.dot(self.basis_y), rel.dot(self.basis_z))
    }
}

/// Perspective and viewport parameters
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    pub width: usize,
    pub height: usize,
}

impl Projection {
    /// Camera space to pixel coordinates
    ///
    /// Depth is `1/z` remapped so `near` is 0.0 and `far` is 1.0; it varies
    /// linearly across the screen, which is what the rasterizer interpolates.
    pub fn to_screen(&self, v: Vec3) -> Vec3 {
        let f = 1.0 / (self.fov_y * 0.5).tan();
        let aspect = self.width as f32 / self.height as f32;
        let ndc_x = v.x * f / (aspect * v.z);
        let ndc_y = v.y * f / v.z;

        let inv_near = 1.0 / self.near;
        let depth = (inv_near - 1.0 / v.z) / (inv_near - 1.0 / self.far);

        Vec3::new(
            (ndc_x + 1.0) * 0.5 * (self.width as f32 - 1.0),
            (ndc_y + 1.0) * 0.5 * (self.height as f32 - 1.0),
            depth,
        )
    }
}

/// Object rotation applied before the camera transform
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelTransform {
    pub yaw: f32,
    pub tilt: f32,
}

impl ModelTransform {
    pub fn apply(&self, p: Vec3) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let p = Vec3::new(p.x * cy + p.z * sy, p.y, -p.x * sy + p.z * cy);
        let (st, ct) = self.tilt.sin_cos();
        Vec3::new(p.x, p.y * ct - p.z * st, p.y * st + p.z * ct)
    }
}

/// What happened to a mesh's faces in the vertex stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    /// Sent to the rasterizer
    pub submitted: usize,
    /// Dropped by backface culling
    pub culled: usize,
    /// Dropped for crossing the near or far plane
    pub clipped: usize,
}

/// Transform, cull and rasterize every face of a mesh
pub fn render_mesh(
    fb: &mut Framebuffer,
    mesh: &Mesh,
    model: &ModelTransform,
    camera: &Camera,
    projection: &Projection,
) -> MeshStats {
    let view: Vec<Vec3> = mesh
        .positions
        .iter()
        .map(|&p| camera.to_view(model.apply(p)))
        .collect();

    let mut stats = MeshStats::default();

    for face in &mesh.faces {
        let [a, b, c] = face.indices;
        let cam = [view[a], view[b], view[c]];

        if cam.iter().any(|v| v.z < projection.near || v.z > projection.far) {
            stats.clipped += 1;
            continue;
        }

        let screen = cam.map(|v| projection.to_screen(v));

        // Front faces are counter-clockwise, which is negative area with y down
        if !face.double_sided && signed_area(screen[0], screen[1], screen[2]) >= 0.0 {
            stats.culled += 1;
            continue;
        }

        let tri = Triangle::new(screen, [mesh.colors[a], mesh.colors[b], mesh.colors[c]]);
        rasterize(fb, &tri);
        stats.submitted += 1;
    }

    stats
}
