use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Axis-aligned rectangle in world or screen space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::new(min.x, min.y, size.x, size.y)
    }

    /// Rect of the given size whose center is `center`.
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::from_min_size(center - size * 0.5, size)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn topleft(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Strict overlap test: shared edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Whether `other` lies entirely inside `self` (edges inclusive).
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Intersection of two rects.
    ///
    /// Degenerate (zero-width or zero-height) rects survive clipping when they
    /// lie inside `self`; two solid rects that only touch along an edge yield
    /// `None`.
    pub fn clip(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        if (right == left && self.w > 0.0 && other.w > 0.0)
            || (bottom == top && self.h > 0.0 && other.h > 0.0)
        {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Grow by `dx` in total width and `dy` in total height, keeping the center.
    pub fn inflate(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x - dx * 0.5, self.y - dy * 0.5, self.w + dx, self.h + dy)
    }

    pub fn translate(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }

    /// Position of the given anchor point on this rect.
    pub fn anchor(&self, anchor: Anchor) -> Vec2 {
        self.topleft() + self.size() * anchor.factor()
    }

    /// Copy of this rect moved so that `anchor` sits at `pos`.
    pub fn with_anchor(&self, anchor: Anchor, pos: Vec2) -> Rect {
        Rect::from_min_size(pos - self.size() * anchor.factor(), self.size())
    }

    /// Move this rect inside `bounds`. A rect larger than `bounds` along an
    /// axis is centered on that axis instead.
    pub fn clamp(&self, bounds: &Rect) -> Rect {
        let x = if self.w >= bounds.w {
            bounds.x + (bounds.w - self.w) * 0.5
        } else {
            self.x.clamp(bounds.x, bounds.right() - self.w)
        };
        let y = if self.h >= bounds.h {
            bounds.y + (bounds.h - self.h) * 0.5
        } else {
            self.y.clamp(bounds.y, bounds.bottom() - self.h)
        };
        Rect::new(x, y, self.w, self.h)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.w, self.h)
    }
}

/// Named point on a rect used to position it.
///
/// Only point anchors are accepted; single-axis names such as `centerx` or
/// `left` cannot place a rect on both axes and are rejected when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    TopLeft,
    MidTop,
    TopRight,
    MidLeft,
    Center,
    MidRight,
    BottomLeft,
    MidBottom,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::MidTop,
        Anchor::TopRight,
        Anchor::MidLeft,
        Anchor::Center,
        Anchor::MidRight,
        Anchor::BottomLeft,
        Anchor::MidBottom,
        Anchor::BottomRight,
    ];

    /// Fraction of the rect size from its top-left corner.
    pub fn factor(self) -> Vec2 {
        match self {
            Anchor::TopLeft => Vec2::new(0.0, 0.0),
            Anchor::MidTop => Vec2::new(0.5, 0.0),
            Anchor::TopRight => Vec2::new(1.0, 0.0),
            Anchor::MidLeft => Vec2::new(0.0, 0.5),
            Anchor::Center => Vec2::new(0.5, 0.5),
            Anchor::MidRight => Vec2::new(1.0, 0.5),
            Anchor::BottomLeft => Vec2::new(0.0, 1.0),
            Anchor::MidBottom => Vec2::new(0.5, 1.0),
            Anchor::BottomRight => Vec2::new(1.0, 1.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Anchor::TopLeft => "topleft",
            Anchor::MidTop => "midtop",
            Anchor::TopRight => "topright",
            Anchor::MidLeft => "midleft",
            Anchor::Center => "center",
            Anchor::MidRight => "midright",
            Anchor::BottomLeft => "bottomleft",
            Anchor::MidBottom => "midbottom",
            Anchor::BottomRight => "bottomright",
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Anchor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Anchor::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| Error::invalid(format!("unknown rect anchor {s:?}")))
    }
}
