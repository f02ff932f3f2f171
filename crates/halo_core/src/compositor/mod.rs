//! # Occlusion Compositor
//!
//! Turns this frame's placements into a [`DrawList`] in exactly three passes:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ 1. PushClip(screen − head)  orbit, depth < 0   (far → near)│
//! │    PopClip                                                 │
//! │ 2. veil, every particle, unclipped             (far → near)│
//! │ 3. orbit, depth >= 0, unclipped                (far → near)│
//! │ [4. DebugOutline]                                          │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! An orbit particle lands in exactly one of passes 1 and 3. Veil glyphs are
//! always above the head whatever their own depth.
//!
//! Per-glyph parameters, with `k = (depth + 1) / 2`:
//!
//! - orbit: font scale and alpha both lerp upward over `k`
//! - veil: alpha falls linearly with the particle's radial parameter `u`

mod draw_list;

pub use draw_list::{ClipRegion, DrawCommand, DrawList, GlyphDraw, GlyphInstance, Layer, Passes};

use halo_shared::{Color, Vec2};

use crate::config::{ColorMode, RenderConfig, SettingsSnapshot};
use crate::geometry::Placement;
use crate::particles::{Particle, ParticleKind};
use crate::tracking::AnchorState;

/// Three-pass draw list builder.
#[derive(Debug, Clone)]
pub struct Compositor {
    config: RenderConfig,
    /// Scratch: indices into the particle/placement arrays.
    order: Vec<usize>,
}

impl Compositor {
    /// Creates the compositor.
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            order: Vec::with_capacity(1024),
        }
    }

    /// Render parameters.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Records one frame into `out`.
    ///
    /// `particles` and `placements` are parallel slices.
    pub fn compose(
        &mut self,
        particles: &[&Particle],
        placements: &[Placement],
        anchor: &AnchorState,
        viewport: Vec2,
        settings: &SettingsSnapshot,
        out: &mut DrawList,
    ) {
        out.begin_frame();
        let count = particles.len().min(placements.len());

        // Pass 1: behind the head.
        out.push_clip(head_clip(anchor, viewport));
        self.collect(particles, placements, count, |p, d| p.is_orbit() && d < 0.0);
        self.emit(particles, placements, Layer::BehindHead, settings, out);
        out.pop_clip();

        // Pass 2: veil.
        self.collect(particles, placements, count, |p, _| !p.is_orbit());
        self.emit(particles, placements, Layer::Veil, settings, out);

        // Pass 3: in front.
        self.collect(particles, placements, count, |p, d| p.is_orbit() && d >= 0.0);
        self.emit(particles, placements, Layer::Front, settings, out);

        if self.config.debug_overlay {
            out.push(DrawCommand::DebugOutline {
                center: anchor.position,
                head_radii: anchor.head_radii,
                veil_radii: anchor.veil_radii,
                silhouette: anchor.silhouette.clone(),
                color: Color::DEBUG,
            });
        }
    }

    /// Fills `order` with matching indices sorted far to near.
    fn collect(
        &mut self,
        particles: &[&Particle],
        placements: &[Placement],
        count: usize,
        keep: impl Fn(&Particle, f32) -> bool,
    ) {
        self.order.clear();
        self.order
            .extend((0..count).filter(|&i| keep(particles[i], placements[i].depth)));
        self.order
            .sort_by(|&a, &b| placements[a].depth.total_cmp(&placements[b].depth));
    }

    fn emit(
        &self,
        particles: &[&Particle],
        placements: &[Placement],
        layer: Layer,
        settings: &SettingsSnapshot,
        out: &mut DrawList,
    ) {
        for &i in &self.order {
            let particle = particles[i];
            let placed = placements[i];
            let (scale, alpha) = self.glyph_params(particle, placed.depth);
            let base = match settings.color_mode {
                ColorMode::Global => settings.global_color,
                ColorMode::PerCommit => particle.color,
            };
            out.push_glyph(GlyphDraw {
                particle_id: particle.id,
                text: particle.token.clone(),
                position: placed.position,
                font_size: settings.font_size * scale,
                color: base.with_alpha(base.a * alpha),
                depth: placed.depth,
                layer,
            });
        }
    }

    /// Font scale and opacity for one particle.
    #[must_use]
    pub fn glyph_params(&self, particle: &Particle, depth: f32) -> (f32, f32) {
        match &particle.kind {
            ParticleKind::Orbit(_) => {
                let k = ((depth + 1.0) * 0.5).clamp(0.0, 1.0);
                (lerp(self.config.orbit_font_scale, k), lerp(self.config.orbit_alpha, k))
            }
            ParticleKind::Veil(veil) => {
                let [far, near] = self.config.veil_alpha;
                let u = veil.u.clamp(0.0, 1.0);
                (self.config.veil_font_scale, near - (near - far) * u)
            }
        }
    }
}

fn lerp([lo, hi]: [f32; 2], t: f32) -> f32 {
    lo + (hi - lo) * t
}

/// Everything on screen except the head.
fn head_clip(anchor: &AnchorState, viewport: Vec2) -> ClipRegion {
    match &anchor.silhouette {
        Some(polygon) => ClipRegion::ScreenMinusPolygon {
            viewport,
            polygon: polygon.clone(),
        },
        None => ClipRegion::ScreenMinusEllipse {
            viewport,
            center: anchor.position,
            radii: anchor.head_radii,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{Motion, OrbitState, VeilState};
    use std::sync::Arc;

    fn anchor() -> AnchorState {
        AnchorState {
            position: Vec2::new(400.0, 300.0),
            face_size: Vec2::new(200.0, 250.0),
            head_radii: Vec2::new(100.0, 120.0),
            veil_radii: Vec2::new(80.0, 100.0),
            silhouette: None,
            face_present: false,
            acquired: true,
        }
    }

    fn orbit(id: u64, color: Color) -> Particle {
        Particle {
            id,
            token: Arc::from("o"),
            color,
            born_at: 0.0,
            kind: ParticleKind::Orbit(OrbitState {
                lane: 0,
                slot: 0,
                motion: Motion::new(0.0, 0.5),
            }),
        }
    }

    fn veil(id: u64, u: f32) -> Particle {
        Particle {
            id,
            token: Arc::from("v"),
            color: Color::WHITE,
            born_at: 0.0,
            kind: ParticleKind::Veil(VeilState {
                u,
                bias_y: 0.0,
                local: Vec2::ZERO,
                rest: Vec2::ZERO,
                motion: Motion::new(0.0, 0.1),
            }),
        }
    }

    fn at(depth: f32) -> Placement {
        Placement {
            position: Vec2::new(10.0, 10.0),
            depth,
        }
    }

    fn settings() -> SettingsSnapshot {
        SettingsSnapshot {
            font_size: 20.0,
            speed_multiplier: 1.0,
            color_mode: ColorMode::PerCommit,
            global_color: Color::hex_rgb(0x00FF00),
        }
    }

    #[test]
    fn test_three_passes_in_order() {
        let red = Color::hex_rgb(0xFF0000);
        let particles = [orbit(1, red), orbit(2, red), veil(3, 0.5), orbit(4, red), veil(5, 0.1)];
        let refs: Vec<&Particle> = particles.iter().collect();
        let placements = [at(-0.2), at(0.7), at(-0.9), at(-0.8), at(0.9)];

        let mut compositor = Compositor::new(RenderConfig::default());
        let mut list = DrawList::new();
        compositor.compose(&refs, &placements, &anchor(), Vec2::new(800.0, 600.0), &settings(), &mut list);

        let passes = list.passes();
        // Far to near inside each pass.
        assert_eq!(passes.behind_head, vec![4, 1]);
        assert_eq!(passes.veil, vec![3, 5]);
        assert_eq!(passes.front, vec![2]);

        let commands = list.commands();
        assert!(matches!(commands[0], DrawCommand::PushClip(ClipRegion::ScreenMinusEllipse { .. })));
        assert!(matches!(commands[3], DrawCommand::PopClip));
        assert_eq!(list.clip_depth(), 0);
        for (glyph, clip) in list.glyphs_with_clip() {
            assert_eq!(clip.is_some(), glyph.layer == Layer::BehindHead);
        }
    }

    #[test]
    fn test_silhouette_selects_polygon_clip() {
        let mut anchor = anchor();
        anchor.silhouette = Some(vec![Vec2::ZERO, Vec2::X, Vec2::new(0.0, 1.0)]);
        let mut compositor = Compositor::new(RenderConfig::default());
        let mut list = DrawList::new();
        compositor.compose(&[], &[], &anchor, Vec2::new(800.0, 600.0), &settings(), &mut list);
        assert!(matches!(
            list.commands()[0],
            DrawCommand::PushClip(ClipRegion::ScreenMinusPolygon { .. })
        ));
    }

    #[test]
    fn test_orbit_params_increase_with_depth() {
        let compositor = Compositor::new(RenderConfig::default());
        let particle = orbit(1, Color::WHITE);
        let (far_scale, far_alpha) = compositor.glyph_params(&particle, -1.0);
        let (mid_scale, mid_alpha) = compositor.glyph_params(&particle, 0.0);
        let (near_scale, near_alpha) = compositor.glyph_params(&particle, 1.0);
        assert!(far_scale < mid_scale && mid_scale < near_scale);
        assert!(far_alpha < mid_alpha && mid_alpha < near_alpha);
        assert_eq!(near_scale, RenderConfig::default().orbit_font_scale[1]);
    }

    #[test]
    fn test_veil_alpha_falls_with_u() {
        let compositor = Compositor::new(RenderConfig::default());
        let [far, near] = RenderConfig::default().veil_alpha;
        let (_, center) = compositor.glyph_params(&veil(1, 0.0), 0.0);
        let (_, edge) = compositor.glyph_params(&veil(2, 1.0), 0.0);
        assert_eq!(center, near);
        assert_eq!(edge, far);
    }

    #[test]
    fn test_color_mode() {
        let particles = [orbit(1, Color::hex_rgb(0xFF0000))];
        let refs: Vec<&Particle> = particles.iter().collect();
        let placements = [at(1.0)];
        let mut compositor = Compositor::new(RenderConfig::default());
        let mut list = DrawList::new();

        compositor.compose(&refs, &placements, &anchor(), Vec2::new(800.0, 600.0), &settings(), &mut list);
        assert_eq!(list.glyphs().next().unwrap().color.to_hex_rgb(), 0xFF0000);

        let global = SettingsSnapshot {
            color_mode: ColorMode::Global,
            ..settings()
        };
        compositor.compose(&refs, &placements, &anchor(), Vec2::new(800.0, 600.0), &global, &mut list);
        let glyph = list.glyphs().next().unwrap();
        assert_eq!(glyph.color.to_hex_rgb(), 0x00FF00);
        assert_eq!(glyph.font_size, 20.0 * RenderConfig::default().orbit_font_scale[1]);
    }

    #[test]
    fn test_debug_overlay() {
        let mut compositor = Compositor::new(RenderConfig {
            debug_overlay: true,
            ..RenderConfig::default()
        });
        let mut list = DrawList::new();
        compositor.compose(&[], &[], &anchor(), Vec2::new(800.0, 600.0), &settings(), &mut list);
        assert!(matches!(list.commands().last(), Some(DrawCommand::DebugOutline { .. })));
    }
}
