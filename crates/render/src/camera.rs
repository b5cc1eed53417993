use glam::Vec2;
use scrollkit_common::{EntityId, Error, Rect, Result};
use scrollkit_kernel::Locate;
use serde::{Deserialize, Serialize};

/// Camera behaviour settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Maximum world units per second the camera moves toward its target.
    /// `None` snaps to the target every update.
    pub follow_speed: Option<f32>,
}

impl CameraConfig {
    pub fn validate(&self) -> Result<()> {
        match self.follow_speed {
            Some(speed) if !(speed.is_finite() && speed > 0.0) => Err(Error::invalid(format!(
                "follow_speed must be positive, got {speed}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Where a camera draws on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// Viewport rect relative to its parent surface.
    pub rect: Rect,
    /// Absolute screen offset of the parent surface, for nested viewports.
    pub parent_offset: Vec2,
}

impl View {
    /// Full-screen view of the given size.
    pub fn new(size: Vec2) -> Self {
        Self {
            rect: Rect::from_min_size(Vec2::ZERO, size),
            parent_offset: Vec2::ZERO,
        }
    }

    /// Top-left corner of the view in absolute screen coordinates.
    pub fn abs_offset(&self) -> Vec2 {
        self.parent_offset + self.rect.topleft()
    }
}

/// 2D scrolling camera.
///
/// The camera's world rect has the size of its view and is centered on
/// `position` after every update. It never clamps itself to the world;
/// callers clamp positions (see [`Rect::clamp`]) before assigning them.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    view: View,
    rect: Rect,
    position: Vec2,
    prev_position: Vec2,
    target: Option<EntityId>,
    config: CameraConfig,
}

impl Camera {
    /// Camera showing the world region at the origin with the view's size.
    pub fn new(view: View) -> Self {
        let position = view.rect.size() * 0.5;
        Self {
            view,
            rect: Rect::from_center(position, view.rect.size()),
            position,
            prev_position: position,
            target: None,
            config: CameraConfig::default(),
        }
    }

    pub fn with_config(view: View, config: CameraConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(view)
        })
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Replace the view. The world rect is resized around the current position.
    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.rect = Rect::from_center(self.position, view.rect.size());
    }

    /// World-space rect currently visible.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Jump to `pos` without interpolating from the old position.
    pub fn set_position(&mut self, pos: Vec2) {
        self.position = pos;
        self.prev_position = pos;
        self.rect = Rect::from_center(pos, self.view.rect.size());
    }

    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<EntityId>) {
        self.target = target;
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Advance one tick: follow the target (if it still exists) and
    /// re-center the world rect on the new position.
    pub fn update(&mut self, dt: f32, targets: &impl Locate) {
        self.prev_position = self.position;
        if let Some(id) = self.target {
            match targets.locate(id) {
                Some(goal) => self.position = self.follow(goal, dt),
                None => tracing::warn!(?id, "camera target no longer exists"),
            }
        }
        self.rect = Rect::from_center(self.position, self.view.rect.size());
    }

    fn follow(&self, goal: Vec2, dt: f32) -> Vec2 {
        let Some(speed) = self.config.follow_speed else {
            return goal;
        };
        let delta = goal - self.position;
        let reach = speed * dt.max(0.0);
        if delta.length() <= reach {
            goal
        } else {
            self.position + delta.normalize() * reach
        }
    }

    /// Position blended between the previous and current tick by `alpha`
    /// (clamped to `0.0..=1.0`).
    pub fn interpolate(&self, alpha: f32) -> Vec2 {
        self.prev_position.lerp(self.position, alpha.clamp(0.0, 1.0))
    }

    /// World rect centered on [`Camera::interpolate`].
    pub fn interpolated_rect(&self, alpha: f32) -> Rect {
        Rect::from_center(self.interpolate(alpha), self.view.rect.size())
    }

    pub fn screen_to_world(&self, pos: Vec2) -> Vec2 {
        pos - self.view.abs_offset() + self.rect.topleft()
    }

    pub fn world_to_screen(&self, pos: Vec2) -> Vec2 {
        pos - self.rect.topleft() + self.view.abs_offset()
    }
}
