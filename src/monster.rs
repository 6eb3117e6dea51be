use std::f32::consts::TAU;

use eframe::egui::{self, Color32, Painter, Pos2, Rect, Stroke, Vec2};
use rand::Rng;

use crate::{noise::NoiseField, status::StatusRecord};

const INITIAL_PARTICLES: usize = 5;
const GROWTH_CHECK_FRAMES: u64 = 300;
const SETTLE_FRAMES: u32 = 60;
const SETTLE_DAMPING: f32 = 0.9;
const NOISE_SCALE: f32 = 0.005;
const SIZE_EASE: f32 = 0.01;
const BLOB_ANGLE_STEP: f32 = 0.5;
const SPIKE_COUNT: usize = 8;

pub struct GrassMonster {
    agitated: bool,
    intensity: u8,
    particles: Vec<Particle>,
    settle_frames_left: Option<u32>,
    frame_count: u64,
    noise: NoiseField,
    bounds: Rect,
}

impl GrassMonster {
    pub fn new() -> Self {
        Self {
            agitated: false,
            intensity: 0,
            particles: Vec::new(),
            settle_frames_left: None,
            frame_count: 0,
            noise: NoiseField::new(rand::thread_rng().gen()),
            bounds: Rect::from_min_size(Pos2::ZERO, egui::vec2(1920.0, 1080.0)),
        }
    }

    // A settle already in flight runs to completion even if the status flips
    // back to agitated before the countdown ends.
    pub fn apply_status(&mut self, record: &StatusRecord) {
        let was_agitated = self.agitated;
        self.agitated = record.state.is_agitated();
        self.intensity = record.intensity;

        if was_agitated && !self.agitated {
            self.settle_frames_left = Some(SETTLE_FRAMES);
        }
        if self.agitated && self.particles.is_empty() {
            self.init_particles();
        }
    }

    pub fn step(&mut self, bounds: Rect) {
        self.bounds = bounds;
        self.frame_count = self.frame_count.wrapping_add(1);

        if let Some(frames_left) = self.settle_frames_left {
            for particle in &mut self.particles {
                particle.vel *= SETTLE_DAMPING;
                particle.pos += particle.vel;
            }
            let frames_left = frames_left - 1;
            if frames_left == 0 {
                self.settle_frames_left = None;
                self.particles.clear();
            } else {
                self.settle_frames_left = Some(frames_left);
            }
            return;
        }

        if !self.agitated {
            return;
        }

        if self.frame_count % GROWTH_CHECK_FRAMES == 0 && self.particles.len() < self.particle_cap()
        {
            self.particles.push(Particle::spawn(self.bounds));
        }

        for particle in &mut self.particles {
            particle.update(self.intensity, self.bounds, &self.noise);
        }
    }

    pub fn paint(&self, painter: &Painter) {
        if self.particles.is_empty() {
            return;
        }

        if let Some(fade) = self.settle_fade() {
            let alpha = (fade * 255.0) as u8;
            let fill = Color32::from_rgba_unmultiplied(100, 255, 100, alpha);
            let spikes = Color32::from_rgba_unmultiplied(60, 40, 20, alpha);
            for particle in &self.particles {
                self.paint_particle(painter, particle, fill, spikes);
            }
            return;
        }

        if !self.agitated {
            return;
        }

        let fill = Color32::from_rgba_unmultiplied(80, 60, 40, 200);
        let spikes = Color32::from_rgb(60, 40, 20);
        for particle in &self.particles {
            self.paint_particle(painter, particle, fill, spikes);
        }
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn is_settling(&self) -> bool {
        self.settle_frames_left.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.agitated || self.settle_frames_left.is_some()
    }

    pub fn settle_fade(&self) -> Option<f32> {
        self.settle_frames_left
            .map(|left| left as f32 / SETTLE_FRAMES as f32)
    }

    fn particle_cap(&self) -> usize {
        usize::from(self.intensity / 10) + INITIAL_PARTICLES
    }

    fn init_particles(&mut self) {
        for _ in 0..INITIAL_PARTICLES {
            self.particles.push(Particle::spawn(self.bounds));
        }
    }

    fn paint_particle(
        &self,
        painter: &Painter,
        particle: &Particle,
        fill: Color32,
        spikes: Color32,
    ) {
        let center = particle.pos;
        let wobble_phase = self.frame_count as f32 * 0.01;

        let mut ring = Vec::new();
        let mut a = 0.0f32;
        while a < TAU {
            let xoff = a.cos() + 1.0;
            let yoff = a.sin() + 1.0;
            let r = particle.size
                + self.noise.sample(xoff + wobble_phase, yoff) * (particle.size * 0.5);
            ring.push(Pos2::new(center.x + r * a.cos(), center.y + r * a.sin()));
            a += BLOB_ANGLE_STEP;
        }
        painter.add(egui::Shape::mesh(blob_mesh(center, &ring, fill)));

        let stroke = Stroke::new(2.0, spikes);
        for i in 0..SPIKE_COUNT {
            let angle = (i as f32 / SPIKE_COUNT as f32) * TAU;
            let tip = center + Vec2::new(angle.cos(), angle.sin()) * (particle.size * 1.2);
            painter.line_segment([center, tip], stroke);
        }
    }
}

impl Default for GrassMonster {
    fn default() -> Self {
        Self::new()
    }
}

// Radial blobs are star shaped from their center, so a center fan
// triangulates them safely where a convex tessellation would not.
fn blob_mesh(center: Pos2, ring: &[Pos2], fill: Color32) -> egui::epaint::Mesh {
    let mut mesh = egui::epaint::Mesh::default();
    mesh.colored_vertex(center, fill);
    for point in ring {
        mesh.colored_vertex(*point, fill);
    }
    let ring_len = ring.len() as u32;
    for i in 0..ring_len {
        let a = 1 + i;
        let b = 1 + ((i + 1) % ring_len);
        mesh.add_triangle(0, a, b);
    }
    mesh
}

#[derive(Debug, Clone)]
struct Particle {
    pos: Pos2,
    vel: Vec2,
    noise_offset: Vec2,
    size: f32,
}

impl Particle {
    fn spawn(bounds: Rect) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            pos: Pos2::new(
                bounds.min.x + rng.gen_range(0.0..bounds.width().max(1.0)),
                bounds.min.y + rng.gen_range(0.0..bounds.height().max(1.0)),
            ),
            vel: Vec2::ZERO,
            noise_offset: Vec2::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..1000.0)),
            size: rng.gen_range(50.0..100.0),
        }
    }

    fn update(&mut self, intensity: u8, bounds: Rect, field: &NoiseField) {
        let speed = 2.0 + f32::from(intensity) / 20.0;
        let angle = field.sample(
            self.pos.x * NOISE_SCALE + self.noise_offset.x,
            self.pos.y * NOISE_SCALE + self.noise_offset.y,
        ) * TAU
            * 2.0;
        self.vel = Vec2::new(angle.cos() * speed, angle.sin() * speed);
        self.pos += self.vel;

        // Wraps with a margin of the current size so a particle leaves the
        // viewport fully before reappearing outside the opposite edge.
        if self.pos.x < bounds.min.x - self.size {
            self.pos.x = bounds.max.x + self.size;
        }
        if self.pos.x > bounds.max.x + self.size {
            self.pos.x = bounds.min.x - self.size;
        }
        if self.pos.y < bounds.min.y - self.size {
            self.pos.y = bounds.max.y + self.size;
        }
        if self.pos.y > bounds.max.y + self.size {
            self.pos.y = bounds.min.y - self.size;
        }

        let target = 50.0 + f32::from(intensity) * 2.0;
        self.size = egui::lerp(self.size..=target, SIZE_EASE);
    }
}
