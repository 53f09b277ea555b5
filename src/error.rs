//! Crate-wide error type and exit-code mapping (spec §7).

use thiserror::Error;

use crate::scene::SceneLoadError;

#[derive(Debug, Error)]
pub enum RenderError {
    /// Argument/usage error: missing scene path, malformed resolution, etc.
    /// Surfaced before any render work begins.
    #[error("{0}")]
    Args(String),

    #[error(transparent)]
    SceneLoad(#[from] SceneLoadError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Process exit code for this error (spec §6/§7: 1 for argument/scene
    /// errors, 2 for I/O errors on save).
    pub fn exit_code(&self) -> i32 {
        match self {
            RenderError::Args(_) => 1,
            RenderError::SceneLoad(_) => 1,
            RenderError::Io(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_and_scene_load_exit_one_io_exits_two() {
        assert_eq!(RenderError::Args("bad resolution".into()).exit_code(), 1);
        assert_eq!(RenderError::SceneLoad(SceneLoadError::NoCamera).exit_code(), 1);
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(RenderError::Io(io_err).exit_code(), 2);
    }
}
