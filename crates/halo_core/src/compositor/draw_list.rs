//! Render commands for one frame.
//!
//! The engine owns no canvas. Each tick it records a flat command list that
//! any 2D backend can replay in order: a clip stack plus positioned glyphs.

use std::sync::Arc;

use halo_shared::{Color, Vec2};

use crate::particles::ParticleId;

/// Which occlusion pass a glyph was drawn in.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Orbit glyphs with `depth < 0`, clipped to exclude the head.
    BehindHead = 0,
    /// Veil glyphs, unclipped, above the behind-head pass.
    Veil = 1,
    /// Orbit glyphs with `depth >= 0`, unclipped, on top.
    Front = 2,
}

/// Drawable area for the glyphs between a push and its pop.
///
/// Both variants describe "the whole viewport with a hole", filled with the
/// even-odd rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipRegion {
    /// Viewport rectangle minus the head silhouette polygon.
    ScreenMinusPolygon {
        /// Viewport size in pixels.
        viewport: Vec2,
        /// Silhouette, screen pixels.
        polygon: Vec<Vec2>,
    },
    /// Viewport rectangle minus the head ellipse (no silhouette this frame).
    ScreenMinusEllipse {
        /// Viewport size in pixels.
        viewport: Vec2,
        /// Ellipse center.
        center: Vec2,
        /// Ellipse radii.
        radii: Vec2,
    },
}

impl ClipRegion {
    /// Whether `point` is drawable under this clip (outside the hole,
    /// inside the viewport).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let viewport = match self {
            Self::ScreenMinusPolygon { viewport, .. } | Self::ScreenMinusEllipse { viewport, .. } => {
                *viewport
            }
        };
        let on_screen = point.x >= 0.0 && point.y >= 0.0 && point.x <= viewport.x && point.y <= viewport.y;
        on_screen && !self.in_hole(point)
    }

    fn in_hole(&self, point: Vec2) -> bool {
        match self {
            Self::ScreenMinusPolygon { polygon, .. } => polygon_contains(polygon, point),
            Self::ScreenMinusEllipse { center, radii, .. } => {
                if radii.x <= 0.0 || radii.y <= 0.0 {
                    return false;
                }
                let d = point - *center;
                let nx = d.x / radii.x;
                let ny = d.y / radii.y;
                nx * nx + ny * ny < 1.0
            }
        }
    }
}

/// Even-odd point-in-polygon test.
fn polygon_contains(polygon: &[Vec2], point: Vec2) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// One positioned glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphDraw {
    /// Source particle.
    pub particle_id: ParticleId,
    /// Token text.
    pub text: Arc<str>,
    /// Center position in pixels.
    pub position: Vec2,
    /// Font size in pixels.
    pub font_size: f32,
    /// Fill color, alpha already applied.
    pub color: Color,
    /// `sin(theta)` of the particle.
    pub depth: f32,
    /// Pass the glyph belongs to.
    pub layer: Layer,
}

/// A render command.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Restricts subsequent glyphs until the matching pop.
    PushClip(ClipRegion),
    /// Draw one glyph.
    Glyph(GlyphDraw),
    /// Ends the innermost clip.
    PopClip,
    /// Anchor ellipse and silhouette outline, drawn last.
    DebugOutline {
        /// Anchor position.
        center: Vec2,
        /// Head ellipse radii.
        head_radii: Vec2,
        /// Veil ellipse radii.
        veil_radii: Vec2,
        /// Silhouette polygon, if any.
        silhouette: Option<Vec<Vec2>>,
        /// Stroke color.
        color: Color,
    },
}

/// Particle ids per pass, in draw order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Passes {
    /// Behind-head orbit pass.
    pub behind_head: Vec<ParticleId>,
    /// Veil pass.
    pub veil: Vec<ParticleId>,
    /// Front orbit pass.
    pub front: Vec<ParticleId>,
}

/// GPU-ready glyph instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlyphInstance {
    /// Center position (x, y).
    pub position: [f32; 2],
    /// Font size in pixels.
    pub font_size: f32,
    /// Depth, `[-1, 1]`.
    pub depth: f32,
    /// RGBA color.
    pub color: [f32; 4],
    /// [`Layer`] as `u32`.
    pub layer: u32,
    /// Index of the glyph in [`DrawList::glyphs`], for text lookup.
    pub glyph_index: u32,
}

/// Command list for one frame.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    clip_depth: usize,
}

impl DrawList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: Vec::with_capacity(1024),
            clip_depth: 0,
        }
    }

    /// Starts a new frame, keeping the allocation.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
        self.clip_depth = 0;
    }

    /// Pushes a clip region.
    pub fn push_clip(&mut self, region: ClipRegion) {
        self.clip_depth += 1;
        self.commands.push(DrawCommand::PushClip(region));
    }

    /// Pops the innermost clip region. Unbalanced pops are ignored.
    pub fn pop_clip(&mut self) {
        if self.clip_depth == 0 {
            return;
        }
        self.clip_depth -= 1;
        self.commands.push(DrawCommand::PopClip);
    }

    /// Appends a glyph.
    pub fn push_glyph(&mut self, glyph: GlyphDraw) {
        self.commands.push(DrawCommand::Glyph(glyph));
    }

    /// Appends any command other than a clip push/pop.
    pub fn push(&mut self, command: DrawCommand) {
        match command {
            DrawCommand::PushClip(region) => self.push_clip(region),
            DrawCommand::PopClip => self.pop_clip(),
            other => self.commands.push(other),
        }
    }

    /// Commands in replay order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Open clip regions (0 once a frame is complete).
    #[must_use]
    pub fn clip_depth(&self) -> usize {
        self.clip_depth
    }

    /// Glyphs in draw order.
    pub fn glyphs(&self) -> impl Iterator<Item = &GlyphDraw> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Glyph(glyph) => Some(glyph),
            _ => None,
        })
    }

    /// Number of glyphs.
    #[must_use]
    pub fn glyph_count(&self) -> usize {
        self.glyphs().count()
    }

    /// Glyphs paired with the clip region active when each was drawn.
    pub fn glyphs_with_clip(&self) -> Vec<(&GlyphDraw, Option<&ClipRegion>)> {
        let mut stack: Vec<&ClipRegion> = Vec::new();
        let mut out = Vec::new();
        for command in &self.commands {
            match command {
                DrawCommand::PushClip(region) => stack.push(region),
                DrawCommand::PopClip => {
                    stack.pop();
                }
                DrawCommand::Glyph(glyph) => out.push((glyph, stack.last().copied())),
                DrawCommand::DebugOutline { .. } => {}
            }
        }
        out
    }

    /// Particle ids per pass.
    #[must_use]
    pub fn passes(&self) -> Passes {
        let mut passes = Passes::default();
        for glyph in self.glyphs() {
            let ids = match glyph.layer {
                Layer::BehindHead => &mut passes.behind_head,
                Layer::Veil => &mut passes.veil,
                Layer::Front => &mut passes.front,
            };
            ids.push(glyph.particle_id);
        }
        passes
    }

    /// Packs every glyph for instanced upload.
    #[must_use]
    pub fn instances(&self) -> Vec<GlyphInstance> {
        self.glyphs()
            .enumerate()
            .map(|(index, glyph)| GlyphInstance {
                position: glyph.position.to_array(),
                font_size: glyph.font_size,
                depth: glyph.depth,
                color: glyph.color.to_array(),
                layer: glyph.layer as u32,
                glyph_index: index as u32,
            })
            .collect()
    }

    /// Instances as raw bytes.
    #[must_use]
    pub fn instance_bytes(instances: &[GlyphInstance]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(id: ParticleId, layer: Layer) -> GlyphDraw {
        GlyphDraw {
            particle_id: id,
            text: Arc::from("a"),
            position: Vec2::new(10.0, 20.0),
            font_size: 12.0,
            color: Color::WHITE,
            depth: 0.5,
            layer,
        }
    }

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(100.0, 100.0),
            Vec2::new(200.0, 100.0),
            Vec2::new(200.0, 200.0),
            Vec2::new(100.0, 200.0),
        ]
    }

    #[test]
    fn test_polygon_hole_is_even_odd() {
        let clip = ClipRegion::ScreenMinusPolygon {
            viewport: Vec2::new(400.0, 400.0),
            polygon: square(),
        };
        assert!(!clip.contains(Vec2::new(150.0, 150.0)));
        assert!(clip.contains(Vec2::new(50.0, 150.0)));
        assert!(clip.contains(Vec2::new(250.0, 250.0)));
        assert!(!clip.contains(Vec2::new(-1.0, 10.0)));
    }

    #[test]
    fn test_ellipse_hole() {
        let clip = ClipRegion::ScreenMinusEllipse {
            viewport: Vec2::new(400.0, 400.0),
            center: Vec2::new(200.0, 200.0),
            radii: Vec2::new(50.0, 100.0),
        };
        assert!(!clip.contains(Vec2::new(200.0, 290.0)));
        assert!(clip.contains(Vec2::new(260.0, 200.0)));
    }

    #[test]
    fn test_clip_stack_balanced() {
        let mut list = DrawList::new();
        list.pop_clip();
        assert!(list.commands().is_empty());

        list.push_clip(ClipRegion::ScreenMinusPolygon {
            viewport: Vec2::new(400.0, 400.0),
            polygon: square(),
        });
        list.push_glyph(glyph(1, Layer::BehindHead));
        list.pop_clip();
        list.push_glyph(glyph(2, Layer::Front));
        assert_eq!(list.clip_depth(), 0);

        let clipped = list.glyphs_with_clip();
        assert!(clipped[0].1.is_some());
        assert!(clipped[1].1.is_none());

        list.begin_frame();
        assert_eq!(list.glyph_count(), 0);
    }

    #[test]
    fn test_passes_and_instances() {
        let mut list = DrawList::new();
        list.push_glyph(glyph(3, Layer::BehindHead));
        list.push_glyph(glyph(7, Layer::Veil));
        list.push_glyph(glyph(5, Layer::Front));

        let passes = list.passes();
        assert_eq!(passes.behind_head, vec![3]);
        assert_eq!(passes.veil, vec![7]);
        assert_eq!(passes.front, vec![5]);

        let instances = list.instances();
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[1].layer, Layer::Veil as u32);
        assert_eq!(instances[2].glyph_index, 2);
        assert_eq!(
            DrawList::instance_bytes(&instances).len(),
            3 * std::mem::size_of::<GlyphInstance>()
        );
    }
}
