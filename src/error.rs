/// Failures while bringing up the window and GPU. The scene logic itself cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter found: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[cfg(not(target_arch = "wasm32"))]
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[cfg(not(target_arch = "wasm32"))]
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("browser error: {0}")]
    Browser(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_errors_keep_their_message() {
        let err = ViewerError::Browser("no body on document".into());
        assert_eq!(err.to_string(), "browser error: no body on document");
    }
}
