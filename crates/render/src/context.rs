use scrollkit_kernel::ContextStack;

use crate::camera::Camera;

/// Per-view rendering state that a game switches between, e.g. one per
/// player in split screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewContext {
    pub camera: Camera,
    /// Name of the map this view is showing, if any.
    pub active_map: Option<String>,
}

impl ViewContext {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            active_map: None,
        }
    }

    pub fn with_map(mut self, name: impl Into<String>) -> Self {
        self.active_map = Some(name.into());
        self
    }
}

/// Saved view contexts, by name or as a stack of temporary overrides.
pub type ViewStack = ContextStack<ViewContext>;

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::View;

    #[test]
    fn split_screen_switches_views() {
        let half = Vec2::new(320.0, 480.0);
        let mut left = Camera::new(View::new(half));
        left.set_position(Vec2::new(100.0, 100.0));
        let mut right = Camera::new(View::new(half));
        right.set_position(Vec2::new(2000.0, 900.0));

        let mut views = ViewStack::new();
        views.save("p1", &ViewContext::new(left).with_map("overworld"));
        views.save("p2", &ViewContext::new(right).with_map("cave"));

        let mut active = views.restore("p1").unwrap();
        assert_eq!(active.camera.position(), Vec2::new(100.0, 100.0));
        active.camera.set_position(Vec2::new(150.0, 100.0));
        views.save("p1", &active);

        let active = views.restore("p2").unwrap();
        assert_eq!(active.active_map.as_deref(), Some("cave"));
        assert_eq!(active.camera.position(), Vec2::new(2000.0, 900.0));

        let p1 = views.restore("p1").unwrap();
        assert_eq!(p1.camera.position(), Vec2::new(150.0, 100.0));
        assert_eq!(views.names().collect::<Vec<_>>(), ["p1", "p2"]);
    }

    #[test]
    fn push_pop_overrides_view() {
        let base = ViewContext::new(Camera::new(View::new(Vec2::splat(100.0))));
        let mut views = ViewStack::new();
        views.push("menu", base.clone().with_map("menu"));
        assert_eq!(views.depth(), 1);
        let top = views.pop().unwrap();
        assert_eq!(top.name, "menu");
        assert_eq!(top.state.active_map.as_deref(), Some("menu"));
        assert!(views.pop().is_none());
    }
}
