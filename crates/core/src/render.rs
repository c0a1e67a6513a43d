//! Renderer contract: draw commands, the `Surface` trait, and the stateless
//! `Renderer` that turns a [`Scene`] into draw commands.
//!
//! Z-order is fixed by [`Layer`]: background grid, then field sources, then
//! entity links and entities, then the overlay. Within a layer commands are
//! emitted in collection order. The renderer only ever reads the scene.

use crate::color::{Rgba, Srgb};
use crate::entity::{neighbor_links, polygon_vertex, Entity, EntityKind};
use crate::field_source::{FieldSource, SourceKind};
use crate::simulation::Scene;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Draw layer, in back-to-front order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Grid,
    Sources,
    Entities,
    Overlay,
}

/// How a command composites onto what is already drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Source-over alpha blending.
    #[default]
    Normal,
    /// Adds light; used for glows.
    Additive,
}

/// Colour and compositing of one command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    pub color: Rgba,
    pub blend: BlendMode,
}

impl Paint {
    pub fn new(color: Srgb, alpha: f64) -> Self {
        Self {
            color: color.with_alpha(alpha),
            blend: BlendMode::Normal,
        }
    }

    pub fn additive(mut self) -> Self {
        self.blend = BlendMode::Additive;
        self
    }
}

/// Geometry of one command. Widths are stroke widths in surface units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    /// Filled disc.
    Circle { center: DVec2, radius: f64 },
    /// Stroked circle outline.
    Ring {
        center: DVec2,
        radius: f64,
        width: f64,
    },
    Line { from: DVec2, to: DVec2, width: f64 },
    /// Open stroked path.
    Polyline { points: Vec<DVec2>, width: f64 },
    /// Filled closed polygon.
    Polygon { points: Vec<DVec2> },
    Text { at: DVec2, text: String, size: f64 },
}

/// A single drawing instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawCommand {
    pub layer: Layer,
    pub paint: Paint,
    pub shape: Shape,
}

/// A drawing target owned by the host.
pub trait Surface {
    /// False once the host has torn the surface down.
    fn is_available(&self) -> bool;

    /// Starts a new frame.
    fn clear(&mut self);

    fn draw(&mut self, command: &DrawCommand);
}

/// Collects commands instead of drawing them.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    frames: usize,
    available: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            frames: 0,
            available: true,
        }
    }

    /// Commands drawn since the last clear.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of clears, i.e. frames started.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Simulates the host destroying (or restoring) the surface.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn count(&self, layer: Layer) -> usize {
        self.commands.iter().filter(|c| c.layer == layer).count()
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for RecordingSurface {
    fn is_available(&self) -> bool {
        self.available
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.frames += 1;
    }

    fn draw(&mut self, command: &DrawCommand) {
        self.commands.push(command.clone());
    }
}

/// Visual settings of the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub grid: bool,
    pub grid_color: Srgb,
    pub grid_alpha: f64,
    pub links: bool,
    pub link_color: Srgb,
    /// Source and spark glows composite additively.
    pub glow: bool,
    pub hud: bool,
    pub hud_color: Srgb,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            grid: true,
            grid_color: Srgb::from_u8(100, 150, 255),
            grid_alpha: 0.15,
            links: true,
            link_color: Srgb::from_u8(0, 255, 255),
            glow: true,
            hud: true,
            hud_color: Srgb::from_u8(0, 255, 170),
        }
    }
}

/// Stateless scene-to-commands translator.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub style: RenderStyle,
}

impl Renderer {
    pub fn new(style: RenderStyle) -> Self {
        Self { style }
    }

    /// Clears `surface` and draws `scene` onto it.
    pub fn render(&self, scene: &Scene<'_>, surface: &mut dyn Surface) {
        surface.clear();
        for command in self.commands(scene) {
            surface.draw(&command);
        }
    }

    /// All draw commands for `scene`, sorted back to front.
    pub fn commands(&self, scene: &Scene<'_>) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        if self.style.grid {
            self.grid(scene, &mut out);
        }
        for source in scene.sources {
            self.source(source, &mut out);
        }
        if self.style.links {
            self.links(scene, &mut out);
        }
        for entity in scene.entities {
            self.entity(entity, &mut out);
        }
        if self.style.hud {
            self.overlay(scene, &mut out);
        }
        out
    }

    fn paint(&self, color: Srgb, alpha: f64, glow: bool) -> Paint {
        let paint = Paint::new(color, alpha);
        if glow && self.style.glow {
            paint.additive()
        } else {
            paint
        }
    }

    fn grid(&self, scene: &Scene<'_>, out: &mut Vec<DrawCommand>) {
        let paint = Paint::new(self.style.grid_color, self.style.grid_alpha);
        let grid = scene.grid;
        let lines = (0..grid.rows())
            .map(|r| grid.row_points(r).collect::<Vec<_>>())
            .chain((0..grid.cols()).map(|c| grid.column_points(c).collect()));
        out.extend(lines.map(|points| DrawCommand {
            layer: Layer::Grid,
            paint,
            shape: Shape::Polyline { points, width: 1.0 },
        }));
    }

    fn source(&self, source: &FieldSource, out: &mut Vec<DrawCommand>) {
        let alpha = source.opacity();
        let center = source.position;
        let mut push = |paint: Paint, shape: Shape| {
            out.push(DrawCommand {
                layer: Layer::Sources,
                paint,
                shape,
            })
        };

        match source.kind {
            SourceKind::GravityWell {
                event_horizon,
                rotation,
                ..
            } => {
                let lens = Srgb::from_u8(200, 100, 255);
                for i in 0..8 {
                    let angle = i as f64 / 8.0 * TAU + rotation;
                    let at = center + DVec2::from_angle(angle) * (event_horizon * 4.0 + i as f64 * 20.0);
                    push(
                        self.paint(lens, alpha * 0.3, false),
                        Shape::Ring {
                            center: at,
                            radius: 10.0,
                            width: 1.0,
                        },
                    );
                }
                push(
                    self.paint(lens, alpha * 0.4, true),
                    Shape::Circle {
                        center,
                        radius: event_horizon * 1.6,
                    },
                );
                push(
                    Paint::new(Srgb::BLACK, alpha),
                    Shape::Circle {
                        center,
                        radius: event_horizon,
                    },
                );
                push(
                    self.paint(lens, alpha, false),
                    Shape::Ring {
                        center,
                        radius: event_horizon,
                        width: 2.0,
                    },
                );
            }
            SourceKind::WarpField {
                radius,
                arms,
                rotation,
                pulsation,
            } => {
                let color = Srgb::from_u8(100, 200, 255);
                for ring in 1..=4 {
                    push(
                        self.paint(color, alpha * pulsation * 0.5 / ring as f64, false),
                        Shape::Ring {
                            center,
                            radius: radius * ring as f64 / 4.0,
                            width: 1.0,
                        },
                    );
                }
                let arm_paint = self.paint(Srgb::from_u8(150, 150, 255), alpha * pulsation * 0.6, true);
                for arm in 0..arms {
                    let base = arm as f64 / arms as f64 * TAU + rotation;
                    let points = (0..=12)
                        .map(|i| {
                            let r = radius * i as f64 / 12.0;
                            center + DVec2::from_angle(base + r / radius.max(1e-9) * TAU) * r
                        })
                        .collect();
                    push(arm_paint, Shape::Polyline { points, width: 1.5 });
                }
            }
            SourceKind::Wormhole {
                radius, rotation, ..
            } => {
                let throat = Srgb::from_u8(100, 200, 255);
                push(
                    self.paint(throat, alpha * 0.2, true),
                    Shape::Circle {
                        center,
                        radius: radius * 2.0,
                    },
                );
                for layer in 0..5 {
                    let depth = layer as f64 / 5.0;
                    let points = (0..6)
                        .map(|i| polygon_vertex(center, radius * (0.3 + depth * 0.7), rotation * (1.0 + depth), i, 6))
                        .collect();
                    push(
                        self.paint(throat, alpha * (1.0 - depth) * 0.5, false),
                        Shape::Polygon { points },
                    );
                }
                push(
                    Paint::new(Srgb::BLACK, alpha),
                    Shape::Circle {
                        center,
                        radius: radius * 0.3,
                    },
                );
                push(
                    self.paint(Srgb::WHITE, alpha, false),
                    Shape::Ring {
                        center,
                        radius,
                        width: 2.0,
                    },
                );
            }
        }
    }

    fn links(&self, scene: &Scene<'_>, out: &mut Vec<DrawCommand>) {
        let links = neighbor_links(
            scene.entities,
            scene.connection_cap,
            scene.connection_distance,
        );
        out.extend(links.into_iter().map(|link| DrawCommand {
            layer: Layer::Entities,
            paint: Paint::new(self.style.link_color, link.strength * 0.2),
            shape: Shape::Line {
                from: scene.entities[link.a].position,
                to: scene.entities[link.b].position,
                width: 0.5,
            },
        }));
    }

    fn entity(&self, entity: &Entity, out: &mut Vec<DrawCommand>) {
        let alpha = entity.opacity();
        let color = entity.color();
        let at = entity.position;
        let mut push = |paint: Paint, shape: Shape| {
            out.push(DrawCommand {
                layer: Layer::Entities,
                paint,
                shape,
            })
        };

        match &entity.kind {
            EntityKind::Mote { size, .. } => push(
                self.paint(color, alpha, false),
                Shape::Circle {
                    center: at,
                    radius: *size,
                },
            ),
            EntityKind::Energy {
                size,
                trail,
                pulse_phase,
                ..
            } => {
                if trail.len() > 1 {
                    push(
                        self.paint(color, alpha * 0.5, true),
                        Shape::Polyline {
                            points: trail.iter().copied().collect(),
                            width: size * 0.5,
                        },
                    );
                }
                push(
                    self.paint(color, alpha, true),
                    Shape::Circle {
                        center: at,
                        radius: size * (1.0 + pulse_phase.sin() * 0.2),
                    },
                );
            }
            EntityKind::Fragment { size, rotation, .. } => {
                let points = (0..6)
                    .map(|i| polygon_vertex(at, *size, *rotation, i, 6))
                    .collect();
                push(self.paint(color, alpha * 0.4, false), Shape::Polygon { points });
            }
            EntityKind::Spark { size } => push(
                self.paint(color, alpha, true),
                Shape::Circle {
                    center: at,
                    radius: *size,
                },
            ),
            EntityKind::Lightning { segments } => {
                for segment in segments {
                    push(
                        self.paint(color, alpha * segment.intensity, true),
                        Shape::Line {
                            from: segment.start,
                            to: segment.end,
                            width: 3.0,
                        },
                    );
                }
            }
            EntityKind::Shockwave { radius, .. } => push(
                self.paint(color, alpha, false),
                Shape::Ring {
                    center: at,
                    radius: *radius,
                    width: 3.0,
                },
            ),
            EntityKind::RiftMote { size, .. } => push(
                self.paint(color, alpha, true),
                Shape::Circle {
                    center: at,
                    radius: *size,
                },
            ),
        }
    }

    fn overlay(&self, scene: &Scene<'_>, out: &mut Vec<DrawCommand>) {
        let paint = Paint::new(self.style.hud_color, 0.8);
        out.push(DrawCommand {
            layer: Layer::Overlay,
            paint,
            shape: Shape::Text {
                at: DVec2::new(10.0, 20.0),
                text: format!(
                    "tick {}  entities {}  sources {}",
                    scene.tick,
                    scene.entities.len(),
                    scene.sources.len()
                ),
                size: 12.0,
            },
        });
        if let Some(pointer) = scene.pointer {
            out.push(DrawCommand {
                layer: Layer::Overlay,
                paint: Paint::new(self.style.hud_color, 0.3),
                shape: Shape::Ring {
                    center: pointer,
                    radius: 12.0,
                    width: 1.0,
                },
            });
        }
    }
}
