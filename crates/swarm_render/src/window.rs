//! Window management
//!
//! Cross-platform window creation via winit

use winit::window::Window;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Fly Swarm".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Create window attributes from config
///
/// In winit 0.30+ windows must be created inside `ApplicationHandler::resumed`.
pub fn window_attributes(config: &WindowConfig) -> winit::window::WindowAttributes {
    Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
}

/// Width over height, never dividing by zero.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}
