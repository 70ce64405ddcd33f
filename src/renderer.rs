// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The path tracer.
//!
//! A `Renderer` is built once per run.  Building one places the
//! camera: it walks outward from the origin along the seed's camera
//! direction until it is comfortably outside the fractal, and keeps
//! walking until a handful of test rays actually see something.  Then
//! it works out the yaw and pitch that point the camera back at the
//! origin and keeps them as two rotation matrices, so no pixel ever
//! has to take a sine.
//!
//! After that the renderer is read-only.  Each pixel draws its random
//! numbers from its own stream, so one renderer can be shared by every
//! render thread, and a pixel comes out the same whichever thread
//! renders it.

use log::{debug, warn};

use crate::dice::{pixel_stream, Dice, CAMERA_STREAM};
use crate::fractal::FractalField;
use crate::seed::Seed;
use crate::vector::{Mat3, Ray, Vec3};

/// Rays that get further than this without hitting anything miss.
pub const MAX_DIST: f64 = 64.0;
/// A march that gets this close to the surface has hit it.
pub const HIT_THRESHOLD: f64 = 1e-4;
/// Step budget for a single march.
pub const MAX_STEPS: usize = 512;
/// Gamma applied to the averaged color.
pub const GAMMA: f64 = 0.45;

// How far off the surface secondary rays start, along the normal.
const SURFACE_OFFSET: f64 = 2.0 * HIT_THRESHOLD;
// Camera seeker: random probe rays per candidate radius, and how far out
// to look before giving up.
const CAMERA_PROBES: usize = 64;
const CAMERA_MAX_RADIUS: f64 = 32.0;
// Distance haze.
const HAZE: Vec3 = Vec3::new(0.9, 1.0, 1.0);
const HAZE_AMOUNT: f64 = 0.05;
const FOG_DENSITY: f64 = 0.01;

/// The numbers that come from the configuration rather than the seed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Vertical field of view, in degrees.
    pub fov: f64,
    /// Paths traced per pixel.
    pub samples: usize,
    /// Surface hits per path.
    pub bounces: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            width: 1920,
            height: 1080,
            fov: 45.0,
            samples: 4,
            bounces: 2,
        }
    }
}

/// Where a single path stands.  A path starts out tracing; every hit
/// sends it back to tracing along a bounced ray until it runs out of
/// bounces, and a miss ends it.
#[derive(Copy, Clone, Debug, PartialEq)]
enum PathState {
    Tracing(Ray),
    Missed,
    Exhausted,
}

/// Everything needed to turn a pixel coordinate into a color.
pub struct Renderer<'a> {
    field: &'a FractalField,
    settings: RenderSettings,
    run_seed: u64,
    camera: Vec3,
    yaw: Mat3,
    pitch: Mat3,
    focal: f64,
    light_direction: Vec3,
    light_color: Vec3,
    sky_color: Vec3,
    gloss_chance: f64,
    gloss_amount: f64,
}

/// The yaw and pitch that turn the camera's forward axis, `-z`, to
/// face the origin from `position`.  Yaw is about y, pitch about x, and
/// pitch is applied first.
pub fn orientation(position: Vec3) -> (Mat3, Mat3) {
    let len = position.length();
    if len == 0.0 {
        return (Mat3::IDENTITY, Mat3::IDENTITY);
    }
    let yaw = position.x.atan2(position.z);
    let pitch = (-position.y / len).asin();
    (Mat3::rotation_y(yaw), Mat3::rotation_x(pitch))
}

impl<'a> Renderer<'a> {
    /// Set up the scene for `seed` and place the camera.  `run_seed`
    /// fixes every random number the renderer will ever draw.
    pub fn new(
        field: &'a FractalField,
        seed: &Seed,
        settings: RenderSettings,
        run_seed: u64,
    ) -> Renderer<'a> {
        let half_fov = settings.fov.to_radians() / 2.0;
        let mut renderer = Renderer {
            field,
            settings,
            run_seed,
            camera: Vec3::ZERO,
            yaw: Mat3::IDENTITY,
            pitch: Mat3::IDENTITY,
            focal: (settings.height as f64 / 2.0) / half_fov.tan(),
            light_direction: seed.light_direction.normalize(),
            light_color: seed.light_color,
            sky_color: seed.sky_color,
            gloss_chance: seed.gloss_chance,
            gloss_amount: seed.gloss_amount,
        };
        let camera = renderer.seek_camera(seed);
        renderer.place_camera(camera);
        debug!(
            "camera at ({:.4}, {:.4}, {:.4}), estimate {:.4}",
            camera.x,
            camera.y,
            camera.z,
            field.distance_estimate(camera)
        );
        renderer
    }

    fn place_camera(&mut self, position: Vec3) {
        let (yaw, pitch) = orientation(position);
        self.camera = position;
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// Walk out along the seed's camera direction one unit at a time.
    /// A radius is a candidate once the field is at least the seed's
    /// camera distance away; the first candidate from which a random
    /// probe ray hits the fractal wins.
    fn seek_camera(&mut self, seed: &Seed) -> Vec3 {
        let mut direction = seed.camera_direction.normalize();
        if direction.length() == 0.0 {
            direction = Vec3::new(0.0, 0.0, 1.0);
        }
        let mut dice = Dice::new(self.run_seed, CAMERA_STREAM);
        let mut first_candidate = None;
        let mut radius = 1.0;
        while radius <= CAMERA_MAX_RADIUS {
            let position = direction * radius;
            radius += 1.0;
            let estimate = self.field.distance_estimate(position);
            if !(estimate >= seed.camera_distance) {
                continue;
            }
            first_candidate.get_or_insert(position);
            self.place_camera(position);
            for _ in 0..CAMERA_PROBES {
                let x = dice.int(0, self.settings.width as i64 - 1) as usize;
                let y = dice.int(0, self.settings.height as i64 - 1) as usize;
                if self.primary_hit(x, y).is_some() {
                    return position;
                }
            }
        }
        warn!("no camera position within {} sees the fractal", CAMERA_MAX_RADIUS);
        first_candidate.unwrap_or(direction * CAMERA_MAX_RADIUS)
    }

    /// The settings this renderer was built with.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Where the camera ended up.
    pub fn camera(&self) -> Vec3 {
        self.camera
    }

    /// Unit direction of the camera ray through the centre of pixel
    /// (`x`, `y`), with `y = 0` the top row.
    pub fn ray_direction(&self, x: usize, y: usize) -> Vec3 {
        let w = self.settings.width as f64;
        let h = self.settings.height as f64;
        let local = Vec3::new(x as f64 + 0.5 - w / 2.0, h / 2.0 - (y as f64 + 0.5), -self.focal);
        self.yaw.apply(self.pitch.apply(local)).normalize()
    }

    /// Sphere-trace `ray` through the field.  `Some(t)` is the distance
    /// to the hit; `None` is a miss, whether the ray left the scene,
    /// ran out of steps, or found a non-finite estimate.
    pub fn march(&self, ray: &Ray) -> Option<f64> {
        let mut t = 0.0;
        for _ in 0..MAX_STEPS {
            let h = self.field.distance_estimate(ray.at(t));
            if !h.is_finite() {
                return None;
            }
            if h < HIT_THRESHOLD {
                return Some(t);
            }
            t += h;
            if t > MAX_DIST {
                return None;
            }
        }
        None
    }

    /// March the camera ray for pixel (`x`, `y`).
    pub fn primary_hit(&self, x: usize, y: usize) -> Option<f64> {
        self.march(&Ray::new(self.camera, self.ray_direction(x, y)))
    }

    /// Cosine-weighted direction around `normal`: a random point on the
    /// unit sphere added to the normal.
    fn diffuse_direction(&self, normal: Vec3, dice: &mut Dice) -> Vec3 {
        let d = (normal + dice.unit_sphere()).normalize();
        if d.length() == 0.0 {
            normal
        } else {
            d
        }
    }

    /// Pick where a path goes after hitting the surface.  Usually a
    /// diffuse bounce; with probability `gloss_chance` a mirror
    /// reflection wobbled by up to `gloss_amount`.
    pub fn bounce_direction(&self, direction: Vec3, normal: Vec3, dice: &mut Dice) -> Vec3 {
        if dice.unit() >= self.gloss_chance {
            return self.diffuse_direction(normal, dice);
        }
        let reflected = direction.reflect(normal);
        let d = (reflected + dice.unit_sphere() * self.gloss_amount).normalize();
        if d.length() == 0.0 {
            reflected
        } else {
            d
        }
    }

    /// Background color for row `y`.
    pub fn sky(&self, y: usize) -> Vec3 {
        let t = 1.0 - (y as f64 + 0.5) / self.settings.height as f64;
        self.field.gradient_bottom.mix(self.field.gradient_top, t)
    }

    /// Light arriving at a surface point (lifted off the surface to
    /// `origin`) from the directional light and one sample of the sky.
    fn lighting(&self, origin: Vec3, normal: Vec3, dice: &mut Dice) -> Vec3 {
        let mut light = Vec3::ZERO;
        let facing = self.light_direction.dot(normal).max(0.0);
        if facing > 0.0 {
            let shadow = self
                .field
                .shadow_attenuation(&Ray::new(origin, self.light_direction));
            light += self.light_color * (facing * shadow);
        }
        let sky_ray = Ray::new(origin, self.diffuse_direction(normal, dice));
        light += self.sky_color * self.field.shadow_attenuation(&sky_ray);
        light
    }

    /// Trace one path from the camera along `direction`.  Returns the
    /// unclamped radiance and the distance to the first hit (zero on a
    /// miss).
    fn trace(&self, direction: Vec3, sky: Vec3, dice: &mut Dice) -> (Vec3, f64) {
        let mut accumulated = Vec3::ZERO;
        let mut transmission = Vec3::ONE;
        let mut first_distance = 0.0;
        let mut bounce = 0;
        let mut state = PathState::Tracing(Ray::new(self.camera, direction));

        while let PathState::Tracing(ray) = state {
            state = if bounce == self.settings.bounces {
                PathState::Exhausted
            } else {
                match self.march(&ray) {
                    None => {
                        if bounce == 0 {
                            accumulated = sky;
                        }
                        PathState::Missed
                    }
                    Some(t) => {
                        if bounce == 0 {
                            first_distance = t;
                        }
                        let point = ray.at(t);
                        let normal = self.field.surface_normal(point);
                        let albedo = self.field.surface_color(point);
                        let origin = point + normal * SURFACE_OFFSET;

                        let light = self.lighting(origin, normal, dice);
                        transmission *= albedo;
                        accumulated += transmission * light;

                        let next = self.bounce_direction(ray.direction, normal, dice);
                        PathState::Tracing(Ray::new(origin, next))
                    }
                }
            };
            bounce += 1;
        }
        (accumulated, first_distance)
    }

    /// Color of pixel (`x`, `y`): the average of `samples` paths,
    /// gamma corrected, scaled to `0..=255` per channel.
    pub fn render(&self, x: usize, y: usize) -> Vec3 {
        let index = y * self.settings.width + x;
        let mut dice = Dice::new(self.run_seed, pixel_stream(index));
        let direction = self.ray_direction(x, y);
        let sky = self.sky(y);
        let samples = self.settings.samples.max(1);

        let mut color = Vec3::ZERO;
        for _ in 0..samples {
            let (radiance, distance) = self.trace(direction, sky, &mut dice);
            let fog = (-FOG_DENSITY * distance * distance).exp();
            let graded = radiance * fog + HAZE * (HAZE_AMOUNT * (1.0 - fog));
            if graded.is_finite() {
                color += graded.clamp(0.0, 1.0);
            }
        }
        color /= samples as f64;
        color.powf(GAMMA) * 255.0
    }
}
