use log::warn;
use nodenav_engine::{NodeView, Viewport};
use nodenav_formats::{BoundingBox, MapData, Vertex};

use crate::raster::{Canvas, Rgba};

pub const BACKGROUND: Rgba = [0, 0, 0, 255];
pub const MAP_GRAY: Rgba = [190, 190, 190, 255];
pub const LEFT_RED: Rgba = [255, 0, 0, 255];
pub const RIGHT_BLUE: Rgba = [0, 0, 255, 255];
pub const PARTITION_GREEN: Rgba = [144, 238, 144, 255];

/// A shape in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Rgba,
    },
    Rect {
        a: (f64, f64),
        b: (f64, f64),
        color: Rgba,
    },
}

/// Shapes drawn into a frame, back to front.
///
/// The heading is not rasterised; it goes to stdout and the JSON report.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub primitives: Vec<Primitive>,
}

impl Scene {
    /// The map's linedefs, shared by every frame of a session.
    pub fn backdrop(map: &MapData) -> Self {
        let mut primitives = Vec::with_capacity(map.linedefs.len());

        let mut skipped = 0usize;
        for line in &map.linedefs {
            let from = map.vertexes.get(line.from_vertex as usize);
            let to = map.vertexes.get(line.to_vertex as usize);
            match (from, to) {
                (Some(from), Some(to)) => primitives.push(Primitive::Line {
                    from: point(from),
                    to: point(to),
                    color: MAP_GRAY,
                }),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("skipped {skipped} linedefs with out-of-range vertexes");
        }
        Scene { primitives }
    }

    /// The backdrop plus the child boxes and partition line of `view`.
    pub fn for_node(&self, view: &NodeView) -> Self {
        let mut primitives = Vec::with_capacity(self.primitives.len() + 3);
        primitives.extend_from_slice(&self.primitives);

        let node = &view.node;
        primitives.push(bbox_rect(&node.left_bbox, LEFT_RED));
        primitives.push(bbox_rect(&node.right_bbox, RIGHT_BLUE));
        primitives.push(Primitive::Line {
            from: (f64::from(node.x), f64::from(node.y)),
            to: (
                f64::from(node.x) + f64::from(node.dx),
                f64::from(node.y) + f64::from(node.dy),
            ),
            color: PARTITION_GREEN,
        });

        Scene { primitives }
    }

    pub fn render(&self, viewport: &Viewport, width: u32, height: u32) -> Canvas {
        let mut canvas = Canvas::new(width, height, BACKGROUND);
        let project = |(x, y): (f64, f64)| viewport.world_to_screen(x, y, width, height);
        for primitive in &self.primitives {
            match *primitive {
                Primitive::Line { from, to, color } => {
                    canvas.draw_line(project(from), project(to), color)
                }
                Primitive::Rect { a, b, color } => canvas.draw_rect(project(a), project(b), color),
            }
        }
        canvas
    }
}

fn point(vertex: &Vertex) -> (f64, f64) {
    (f64::from(vertex.x), f64::from(vertex.y))
}

fn bbox_rect(bbox: &BoundingBox, color: Rgba) -> Primitive {
    Primitive::Rect {
        a: (f64::from(bbox.x_upper), f64::from(bbox.y_upper)),
        b: (f64::from(bbox.x_lower), f64::from(bbox.y_lower)),
        color,
    }
}
