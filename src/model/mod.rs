// MODEL: scene data, camera and lights
pub mod camera;
pub mod geometry;
pub mod lighting;
pub mod picking;
pub mod scene;

pub use camera::OrbitCamera;
pub use geometry::{Aabb, Mesh, MeshBuffer, Vertex};
pub use lighting::{LightRig, LightSettings};
pub use picking::Ray;
pub use scene::{hex_color, Color, Material, ObjectId, Scene, SceneObject, Shape, TextureKind, Transform, UvTransform};
