use glam::{Mat4, Vec3, Vec4};

/// Logical frame rate all frame counts are expressed in.
pub const FPS: f32 = 60.0;

/// Milliseconds per logical frame.
pub const FPS_RATE: f32 = 1000.0 / FPS;

/// Converts host-side elapsed milliseconds to logical frames.
pub fn delta_time_frames(delta_time_ms: f32) -> f32 {
    delta_time_ms / FPS_RATE
}

/// View frustum as six inward-facing planes (`xyz` normal, `w` distance).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts planes from an OpenGL-style (`-1..1` depth) view-projection
    /// matrix.
    pub fn from_view_proj(view_proj: Mat4) -> Self {
        let r0 = view_proj.row(0);
        let r1 = view_proj.row(1);
        let r2 = view_proj.row(2);
        let r3 = view_proj.row(3);
        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2].map(|plane| {
            let length = plane.truncate().length();
            if length > f32::EPSILON {
                plane / length
            } else {
                plane
            }
        });
        Self { planes }
    }

    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}

/// Per-frame state handed to the render-prepare pass by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerInput {
    pub view_proj: Mat4,
    pub frustum: Frustum,
    /// Absolute scene time.
    pub time_ms: f32,
    /// Time elapsed since the previous frame.
    pub delta_time_ms: f32,
}

impl ViewerInput {
    pub fn new(view_proj: Mat4, time_ms: f32, delta_time_ms: f32) -> Self {
        Self {
            view_proj,
            frustum: Frustum::from_view_proj(view_proj),
            time_ms,
            delta_time_ms,
        }
    }

    /// Perspective camera at `position` looking at `target`.
    pub fn looking_at(position: Vec3, target: Vec3, fov_degrees: f32, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(position, target, Vec3::Y);
        let projection =
            Mat4::perspective_rh_gl(fov_degrees.to_radians(), aspect.max(0.01), 0.1, 10_000.0);
        projection * view
    }

    pub fn delta_time_frames(&self) -> f32 {
        delta_time_frames(self.delta_time_ms)
    }
}
