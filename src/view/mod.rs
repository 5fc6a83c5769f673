// VIEW: Rendering and graphics
pub mod gpu_init;
pub mod render;
pub mod textures;

pub use gpu_init::GpuContext;
pub use render::{Renderer, UiFrame};
