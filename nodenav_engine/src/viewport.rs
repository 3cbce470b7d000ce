use std::fmt;

use nodenav_formats::Node;
use serde::Serialize;
use thiserror::Error;

/// Fraction of the window left empty around the fitted bounds.
pub const DEFAULT_MARGIN: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    X,
    Y,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViewportError {
    #[error("node bounds have zero extent on the {axis} axis")]
    DegenerateBounds { axis: Axis },
}

/// Union of both child bounding boxes of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub min_x: i16,
    pub max_x: i16,
    pub min_y: i16,
    pub max_y: i16,
}

impl Bounds {
    pub fn of_node(node: &Node) -> Self {
        let xs = node.left_bbox.xs().into_iter().chain(node.right_bbox.xs());
        let ys = node.left_bbox.ys().into_iter().chain(node.right_bbox.ys());
        let (min_x, max_x) = min_max(xs);
        let (min_y, max_y) = min_max(ys);
        Bounds {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }
}

fn min_max(values: impl Iterator<Item = i16>) -> (i16, i16) {
    values.fold((i16::MAX, i16::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Map-space center and pixels-per-map-unit scale for one node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center_x: f64,
    pub center_y: f64,
    pub scale: f64,
}

impl Viewport {
    /// Fits both child boxes of `node` into a `width` x `height` window,
    /// keeping the aspect ratio and leaving `margin` of each half-extent free.
    pub fn compute(
        node: &Node,
        width: u32,
        height: u32,
        margin: f64,
    ) -> Result<Self, ViewportError> {
        let bounds = Bounds::of_node(node);
        let center_x = (f64::from(bounds.min_x) + f64::from(bounds.max_x)) / 2.0;
        let center_y = (f64::from(bounds.min_y) + f64::from(bounds.max_y)) / 2.0;

        let half_x = f64::from(bounds.max_x) - center_x;
        let half_y = f64::from(bounds.max_y) - center_y;
        if half_x == 0.0 {
            return Err(ViewportError::DegenerateBounds { axis: Axis::X });
        }
        if half_y == 0.0 {
            return Err(ViewportError::DegenerateBounds { axis: Axis::Y });
        }

        let scale_x = (f64::from(width) / 2.0 / half_x) * (1.0 - margin);
        let scale_y = (f64::from(height) / 2.0 / half_y) * (1.0 - margin);

        Ok(Viewport {
            center_x,
            center_y,
            scale: scale_x.min(scale_y),
        })
    }

    /// Map coordinates to window pixels. Map y grows up, window y grows down.
    pub fn world_to_screen(&self, x: f64, y: f64, width: u32, height: u32) -> (f64, f64) {
        (
            (x - self.center_x) * self.scale + f64::from(width) / 2.0,
            f64::from(height) / 2.0 - (y - self.center_y) * self.scale,
        )
    }
}

pub fn compute(
    node: &Node,
    width: u32,
    height: u32,
    margin: f64,
) -> Result<Viewport, ViewportError> {
    Viewport::compute(node, width, height, margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodenav_formats::BoundingBox;

    fn node_with(left: BoundingBox, right: BoundingBox) -> Node {
        Node {
            x: 0,
            y: 0,
            dx: 0,
            dy: 1,
            left_bbox: left,
            right_bbox: right,
            left_child: 0x8000,
            right_child: 0x8001,
        }
    }

    fn bbox(y_upper: i16, y_lower: i16, x_upper: i16, x_lower: i16) -> BoundingBox {
        BoundingBox {
            y_upper,
            y_lower,
            x_upper,
            x_lower,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn fits_symmetric_bounds_into_640_by_480() {
        let node = node_with(bbox(-10, 10, -10, 10), bbox(-5, 5, -5, 5));
        let view = compute(&node, 640, 480, DEFAULT_MARGIN).unwrap();
        assert_close(view.center_x, 0.0);
        assert_close(view.center_y, 0.0);
        assert_close(view.scale, 21.6);
    }

    #[test]
    fn uses_both_child_boxes() {
        let node = node_with(bbox(100, 0, 0, 50), bbox(100, 0, 50, 300));
        let bounds = Bounds::of_node(&node);
        assert_eq!(
            bounds,
            Bounds {
                min_x: 0,
                max_x: 300,
                min_y: 0,
                max_y: 100
            }
        );
        let view = compute(&node, 640, 480, 0.0).unwrap();
        assert_close(view.center_x, 150.0);
        assert_close(view.center_y, 50.0);
        // x: 320 / 150, y: 240 / 50; the wider axis wins.
        assert_close(view.scale, 320.0 / 150.0);
    }

    #[test]
    fn odd_extent_keeps_fractional_center() {
        let node = node_with(bbox(3, 0, 0, 1), bbox(3, 0, 0, 1));
        let view = compute(&node, 100, 100, 0.0).unwrap();
        assert_close(view.center_x, 0.5);
        assert_close(view.center_y, 1.5);
        assert_close(view.scale, 100.0 / 3.0);
    }

    #[test]
    fn zero_width_bounds_are_degenerate() {
        let node = node_with(bbox(10, -10, 4, 4), bbox(10, -10, 4, 4));
        assert_eq!(
            compute(&node, 640, 480, DEFAULT_MARGIN),
            Err(ViewportError::DegenerateBounds { axis: Axis::X })
        );
    }

    #[test]
    fn zero_height_bounds_are_degenerate() {
        let node = node_with(bbox(7, 7, -10, 10), bbox(7, 7, 0, 5));
        assert_eq!(
            compute(&node, 640, 480, DEFAULT_MARGIN),
            Err(ViewportError::DegenerateBounds { axis: Axis::Y })
        );
    }

    #[test]
    fn screen_mapping_centers_and_flips_y() {
        let view = Viewport {
            center_x: 100.0,
            center_y: -50.0,
            scale: 2.0,
        };
        assert_eq!(view.world_to_screen(100.0, -50.0, 640, 480), (320.0, 240.0));
        assert_eq!(view.world_to_screen(110.0, -40.0, 640, 480), (340.0, 220.0));
    }
}
