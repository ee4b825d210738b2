//! Crate-level error aggregating each subsystem's failures

use thiserror::Error;

use crate::config::ConfigError;
use crate::gfx::geometry::text::TextError;
use crate::gfx::geometry::typeface::FontError;
use crate::gfx::rendering::RenderError;
use crate::params::ParamError;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error("font: {0}")]
    Font(#[from] FontError),
    #[error("text: {0}")]
    Text(#[from] TextError),
    #[error("render: {0}")]
    Render(#[from] RenderError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window: {0}")]
    Window(#[from] winit::error::OsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamId;

    #[test]
    fn param_errors_keep_their_message() {
        let err = SceneError::from(ParamError::UnknownKey("glow".into()));
        assert!(matches!(err, SceneError::Param(_)));
        assert_eq!(err.to_string(), "no control is named 'glow'");
        assert!(ParamId::from_key("glow").is_none());
    }
}
