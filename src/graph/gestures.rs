// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Ephemeral pointer gestures: drawing a new workspace and dragging a wire.
//!
//! Neither is part of the durable model; both reset after finishing.

use serde::{Deserialize, Serialize};

use super::types::{Rect, MIN_WORKSPACE_SIZE};
use crate::types::WorkspaceId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// In-progress rectangle drawn on the canvas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingState {
    start: Option<Point>,
    current: Option<Point>,
}

impl DrawingState {
    pub fn is_drawing(&self) -> bool {
        self.start.is_some()
    }

    pub fn start(&mut self, x: f64, y: f64) {
        let point = Point::new(x, y);
        self.start = Some(point);
        self.current = Some(point);
    }

    pub fn update(&mut self, x: f64, y: f64) {
        if self.is_drawing() {
            self.current = Some(Point::new(x, y));
        }
    }

    /// Preview of the rectangle being drawn.
    pub fn preview(&self) -> Option<Rect> {
        Some(normalize(self.start?, self.current?))
    }

    /// End the gesture; returns the rectangle if it is large enough.
    pub fn finish(&mut self) -> Option<Rect> {
        let rect = self.preview();
        self.cancel();
        rect.filter(|r| r.width >= MIN_WORKSPACE_SIZE && r.height >= MIN_WORKSPACE_SIZE)
    }

    pub fn cancel(&mut self) {
        self.start = None;
        self.current = None;
    }
}

fn normalize(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), (b.x - a.x).abs(), (b.y - a.y).abs())
}

/// Which side of a workspace a wire was dragged from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    Input,
    Output,
}

/// In-progress drag-to-connect gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WiringState {
    source: Option<(WorkspaceId, PortKind)>,
    pointer: Point,
}

impl WiringState {
    pub fn is_wiring(&self) -> bool {
        self.source.is_some()
    }

    pub fn begin(&mut self, source: impl Into<WorkspaceId>, port: PortKind, x: f64, y: f64) {
        self.source = Some((source.into(), port));
        self.pointer = Point::new(x, y);
    }

    pub fn update(&mut self, x: f64, y: f64) {
        if self.is_wiring() {
            self.pointer = Point::new(x, y);
        }
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn source(&self) -> Option<(&str, PortKind)> {
        self.source.as_ref().map(|(id, port)| (id.as_str(), *port))
    }

    /// Drop the wire on `target`, yielding the directed edge `(from, to)`.
    pub fn finish(&mut self, target: &str) -> Option<(WorkspaceId, WorkspaceId)> {
        let (source, port) = self.source.take()?;
        if source == target {
            return None;
        }
        Some(match port {
            PortKind::Output => (source, target.to_string()),
            PortKind::Input => (target.to_string(), source),
        })
    }

    pub fn cancel(&mut self) {
        self.source = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawing_normalizes_rectangle() {
        let mut drawing = DrawingState::default();
        drawing.start(300.0, 400.0);
        drawing.update(100.0, 150.0);

        let rect = drawing.finish().unwrap();
        assert_eq!(rect, Rect::new(100.0, 150.0, 200.0, 250.0));
        assert!(!drawing.is_drawing());
    }

    #[test]
    fn test_drawing_too_small_is_discarded() {
        let mut drawing = DrawingState::default();
        drawing.start(0.0, 0.0);
        drawing.update(99.0, 500.0);
        assert!(drawing.finish().is_none());
        assert!(!drawing.is_drawing());
    }

    #[test]
    fn test_update_without_start_is_ignored() {
        let mut drawing = DrawingState::default();
        drawing.update(10.0, 10.0);
        assert!(drawing.preview().is_none());
        assert!(drawing.finish().is_none());
    }

    #[test]
    fn test_wiring_direction_follows_port() {
        let mut wiring = WiringState::default();
        wiring.begin("a", PortKind::Output, 0.0, 0.0);
        assert_eq!(
            wiring.finish("b"),
            Some(("a".to_string(), "b".to_string()))
        );

        wiring.begin("a", PortKind::Input, 0.0, 0.0);
        wiring.update(5.0, 5.0);
        assert_eq!(wiring.pointer(), Point::new(5.0, 5.0));
        assert_eq!(
            wiring.finish("b"),
            Some(("b".to_string(), "a".to_string()))
        );
        assert!(!wiring.is_wiring());
    }

    #[test]
    fn test_wiring_onto_self_yields_nothing() {
        let mut wiring = WiringState::default();
        wiring.begin("a", PortKind::Output, 0.0, 0.0);
        assert!(wiring.finish("a").is_none());
        assert!(wiring.finish("b").is_none());
    }
}
