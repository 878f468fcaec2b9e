//! Orbit camera around a target point.
//!
//! The camera is parameterized in polar coordinates (azimuth, elevation,
//! radius) around a target, plus a screen-space pan offset. Polar angles keep
//! the "turntable" feel users expect when inspecting a mesh and cannot gimbal
//! flip, because elevation never reaches the poles.
//!
//! ```
//! use micromesh_control::camera::{OrbitCamera, Viewport};
//!
//! let mut camera = OrbitCamera::default();
//! camera.update_polar_angles(120.0, -40.0);
//! camera.update_polar_radius(2.0);
//!
//! let viewport = Viewport::new(800, 600).unwrap();
//! let view = camera.derive_view_matrix();
//! assert!(view.iter().all(|v| v.is_finite()));
//! assert!(camera.azimuth() >= 0.0 && camera.azimuth() < std::f32::consts::TAU);
//! # let _ = viewport;
//! ```

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::{Isometry3, Matrix4, Perspective3, Point2, Point3, Translation3, Vector2, Vector3};

use crate::error::{InteractError, Result};
use crate::picking::Ray;

/// Smallest aspect ratio the camera accepts.
const MIN_ASPECT: f32 = 1e-3;
/// Largest aspect ratio the camera accepts.
const MAX_ASPECT: f32 = 1e3;

/// Tunable camera parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraOptions {
    /// Radians of rotation per pixel of cursor motion.
    pub rotate_sensitivity: f32,
    /// Radius is divided by this factor per unit of scroll-in.
    pub zoom_factor: f32,
    /// Closest allowed distance to the target.
    pub min_radius: f32,
    /// Farthest allowed distance to the target.
    pub max_radius: f32,
    /// Elevation is clamped to `[-max_elevation, max_elevation]`.
    pub max_elevation: f32,
    /// Vertical field of view in radians.
    pub fov: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 0.005,
            zoom_factor: 1.1,
            min_radius: 0.1,
            max_radius: 100.0,
            max_elevation: 89.0_f32.to_radians(),
            fov: PI / 4.0, // 45 degrees
            near: 0.01,
            far: 1000.0,
        }
    }
}

impl CameraOptions {
    /// Set the rotation sensitivity (radians per pixel).
    pub fn with_rotate_sensitivity(mut self, sensitivity: f32) -> Self {
        self.rotate_sensitivity = sensitivity;
        self
    }

    /// Set the per-scroll-unit zoom factor.
    pub fn with_zoom_factor(mut self, factor: f32) -> Self {
        self.zoom_factor = factor;
        self
    }

    /// Set the allowed radius range.
    pub fn with_radius_range(mut self, min: f32, max: f32) -> Self {
        self.min_radius = min;
        self.max_radius = max;
        self
    }

    /// Set the elevation limit in radians.
    pub fn with_max_elevation(mut self, max_elevation: f32) -> Self {
        self.max_elevation = max_elevation;
        self
    }

    /// Set the vertical field of view in radians.
    pub fn with_fov(mut self, fov: f32) -> Self {
        self.fov = fov;
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.rotate_sensitivity.is_finite() && self.rotate_sensitivity > 0.0) {
            return Err(InteractError::invalid_param(
                "rotate_sensitivity",
                self.rotate_sensitivity,
                "must be positive",
            ));
        }
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 1.0) {
            return Err(InteractError::invalid_param(
                "zoom_factor",
                self.zoom_factor,
                "must be greater than 1",
            ));
        }
        if !(self.min_radius.is_finite() && self.min_radius > 0.0) {
            return Err(InteractError::invalid_param(
                "min_radius",
                self.min_radius,
                "must be positive",
            ));
        }
        if !(self.max_radius.is_finite() && self.max_radius >= self.min_radius) {
            return Err(InteractError::invalid_param(
                "max_radius",
                self.max_radius,
                "must be at least min_radius",
            ));
        }
        if !(self.max_elevation > 0.0 && self.max_elevation < FRAC_PI_2) {
            return Err(InteractError::invalid_param(
                "max_elevation",
                self.max_elevation,
                "must be in (0, pi/2)",
            ));
        }
        if !(self.fov > 0.0 && self.fov < PI) {
            return Err(InteractError::invalid_param("fov", self.fov, "must be in (0, pi)"));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(InteractError::invalid_param(
                "far",
                self.far,
                "must exceed a positive near plane",
            ));
        }
        Ok(())
    }
}

/// Framebuffer dimensions in physical pixels. Never zero-area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

impl Viewport {
    /// Create a viewport, rejecting zero-area sizes (e.g. a minimized window).
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(InteractError::DegenerateGeometry {
                what: "zero-area viewport",
            });
        }
        Ok(Self { width, height })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Convert a pixel delta into viewport-relative units.
    pub fn normalize_delta(&self, dx: f32, dy: f32) -> Vector2<f32> {
        Vector2::new(dx / self.width as f32, dy / self.height as f32)
    }
}

/// Orbit camera that rotates around a target point.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Point3<f32>,
    azimuth: f32,
    elevation: f32,
    radius: f32,
    pan_offset: Vector2<f32>,
    aspect: f32,
    options: CameraOptions,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_valid_options(CameraOptions::default())
    }
}

impl OrbitCamera {
    /// Create a camera with validated options.
    pub fn new(options: CameraOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::from_valid_options(options))
    }

    fn from_valid_options(options: CameraOptions) -> Self {
        let radius = 3.0_f32.clamp(options.min_radius, options.max_radius);
        let elevation = 0.3_f32.clamp(-options.max_elevation, options.max_elevation);
        Self {
            target: Point3::origin(),
            azimuth: 0.0,
            elevation,
            radius,
            pan_offset: Vector2::zeros(),
            aspect: Viewport::default().aspect(),
            options,
        }
    }

    /// The options this camera was built with.
    pub fn options(&self) -> &CameraOptions {
        &self.options
    }

    /// Point the camera orbits around.
    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    /// Horizontal angle in `[0, 2π)`.
    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    /// Vertical angle, clamped away from the poles.
    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    /// Distance from the target.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Screen-space pan in viewport-relative units.
    pub fn pan_offset(&self) -> Vector2<f32> {
        self.pan_offset
    }

    /// Width over height of the image plane.
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Rotate by cursor deltas expressed in pixels.
    pub fn update_polar_angles(&mut self, d_azimuth_pixels: f32, d_elevation_pixels: f32) {
        let s = self.options.rotate_sensitivity;
        let (d_azimuth, d_elevation) = (d_azimuth_pixels * s, d_elevation_pixels * s);
        // Huge deltas or sensitivities overflow to inf, which would wrap to NaN
        if !(d_azimuth.is_finite() && d_elevation.is_finite()) {
            return;
        }
        self.azimuth = wrap_angle(self.azimuth - d_azimuth);

        let limit = self.options.max_elevation;
        self.elevation = (self.elevation + d_elevation).clamp(-limit, limit);
    }

    /// Zoom by scroll units; positive scrolls in.
    pub fn update_polar_radius(&mut self, scroll_delta: f32) {
        if !scroll_delta.is_finite() || scroll_delta == 0.0 {
            return;
        }
        let scaled = self.radius * self.options.zoom_factor.powf(-scroll_delta);
        self.radius = scaled.clamp(self.options.min_radius, self.options.max_radius);
    }

    /// Pan by deltas already normalized to the viewport size.
    pub fn pan(&mut self, dx_normalized: f32, dy_normalized: f32) {
        if !(dx_normalized.is_finite() && dy_normalized.is_finite()) {
            return;
        }
        self.pan_offset += Vector2::new(dx_normalized, dy_normalized);
    }

    /// Set the image aspect ratio, clamping degenerate values.
    pub fn set_aspect(&mut self, aspect: f32) {
        if !aspect.is_finite() || aspect <= 0.0 {
            log::debug!("ignoring degenerate aspect ratio {aspect}");
            return;
        }
        self.aspect = aspect.clamp(MIN_ASPECT, MAX_ASPECT);
    }

    /// Move the orbit target onto `point` and drop any pan.
    pub fn center_on(&mut self, point: Point3<f32>) {
        self.target = point;
        self.pan_offset = Vector2::zeros();
    }

    /// Frame a new target at the given distance, keeping the aspect ratio.
    pub fn reset(&mut self, target: Point3<f32>, radius: f32) {
        self.target = target;
        self.radius = if radius.is_finite() {
            radius.clamp(self.options.min_radius, self.options.max_radius)
        } else {
            self.options.max_radius
        };
        self.azimuth = 0.0;
        self.elevation = 0.3_f32.clamp(-self.options.max_elevation, self.options.max_elevation);
        self.pan_offset = Vector2::zeros();
    }

    /// Height of the visible image plane at the target distance.
    fn visible_height(&self) -> f32 {
        2.0 * self.radius * (self.options.fov / 2.0).tan()
    }

    fn orbit_eye(&self) -> Point3<f32> {
        let (sin_elev, cos_elev) = self.elevation.sin_cos();
        let (sin_azim, cos_azim) = self.azimuth.sin_cos();

        self.target
            + Vector3::new(
                self.radius * cos_elev * sin_azim,
                self.radius * sin_elev,
                self.radius * cos_elev * cos_azim,
            )
    }

    /// World-to-camera rigid transform, pan included.
    pub fn view_isometry(&self) -> Isometry3<f32> {
        let look = Isometry3::look_at_rh(&self.orbit_eye(), &self.target, &Vector3::y());
        let h = self.visible_height();
        let pan = Translation3::new(
            self.pan_offset.x * h * self.aspect,
            -self.pan_offset.y * h,
            0.0,
        );
        pan * look
    }

    /// View matrix (world to camera). Pure function of the camera state.
    pub fn derive_view_matrix(&self) -> Matrix4<f32> {
        self.view_isometry().to_homogeneous()
    }

    /// Camera eye position in world space.
    pub fn eye_position(&self) -> Point3<f32> {
        self.view_isometry().inverse() * Point3::origin()
    }

    /// World-space right and up directions of the image plane.
    pub fn view_basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let inv = self.view_isometry().inverse();
        (inv * Vector3::x(), inv * Vector3::y())
    }

    fn perspective(&self) -> Perspective3<f32> {
        Perspective3::new(self.aspect, self.options.fov, self.options.near, self.options.far)
    }

    /// Projection matrix (camera to clip).
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.perspective().to_homogeneous()
    }

    /// Combined view-projection matrix.
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.derive_view_matrix()
    }

    /// Project a world point to pixel coordinates (origin top-left).
    ///
    /// Returns `None` for points behind the near plane.
    pub fn project(&self, point: &Point3<f32>, viewport: Viewport) -> Option<Point2<f32>> {
        let in_view = self.view_isometry() * point;
        if -in_view.z < self.options.near {
            return None;
        }
        let ndc = self.perspective().project_point(&in_view);
        Some(Point2::new(
            (ndc.x + 1.0) * 0.5 * viewport.width() as f32,
            (1.0 - ndc.y) * 0.5 * viewport.height() as f32,
        ))
    }

    /// Cast a ray from the eye through a pixel.
    pub fn screen_ray(&self, cursor: Point2<f32>, viewport: Viewport) -> Ray {
        let ndc_x = cursor.x / viewport.width() as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - cursor.y / viewport.height() as f32 * 2.0;
        let t = (self.options.fov / 2.0).tan();

        let in_view = Vector3::new(ndc_x * t * viewport.aspect(), ndc_y * t, -1.0);
        let inv = self.view_isometry().inverse();

        Ray::new(inv * Point3::origin(), inv * in_view)
    }

    /// World distance covered by one pixel at the depth of `point`.
    pub fn world_units_per_pixel(&self, point: &Point3<f32>, viewport: Viewport) -> f32 {
        let depth = (-(self.view_isometry() * point).z).max(self.options.near);
        2.0 * depth * (self.options.fov / 2.0).tan() / viewport.height() as f32
    }
}

/// Wrap an angle into `[0, 2π)`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
