use std::f32::consts::FRAC_PI_4;
use std::f32::consts::FRAC_PI_2;

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use super::geometry::{self, Aabb, Mesh};

/// RGB in 0..=1
pub type Color = [f32; 3];

/// Convert a 0xRRGGBB literal into linear-ish float RGB
pub fn hex_color(hex: u32) -> Color {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Stable index of an object inside its [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Sphere,
    Torus,
    Cylinder,
    Ground,
}

impl Shape {
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Sphere => "Sphere",
            Shape::Torus => "Torus",
            Shape::Cylinder => "Cylinder",
            Shape::Ground => "Ground",
        }
    }
}

/// Position, XYZ Euler rotation and per-axis scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local-to-world matrix (scale, then rotate, then translate)
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Metal,
    Wood,
    Plaster,
    Grid,
}

/// Texture-coordinate transform: repeat, offset and rotation about a pivot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvTransform {
    pub repeat: Vec2,
    pub offset: Vec2,
    pub rotation: f32,
    pub center: Vec2,
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            repeat: Vec2::ONE,
            offset: Vec2::ZERO,
            rotation: 0.0,
            center: Vec2::ZERO,
        }
    }
}

impl UvTransform {
    pub fn repeat(x: f32, y: f32) -> Self {
        Self { repeat: Vec2::new(x, y), ..Default::default() }
    }

    /// Top two rows of the 3x3 affine matrix applied to (u, v, 1)
    pub fn rows(&self) -> [[f32; 3]; 2] {
        let (s, c) = self.rotation.sin_cos();
        let Vec2 { x: sx, y: sy } = self.repeat;
        let Vec2 { x: cx, y: cy } = self.center;
        let Vec2 { x: tx, y: ty } = self.offset;
        [
            [sx * c, sx * s, -sx * (c * cx + s * cy) + cx + tx],
            [-sy * s, sy * c, -sy * (-s * cx + c * cy) + cy + ty],
        ]
    }

    pub fn apply(&self, uv: Vec2) -> Vec2 {
        let [r0, r1] = self.rows();
        Vec2::new(
            r0[0] * uv.x + r0[1] * uv.y + r0[2],
            r1[0] * uv.x + r1[1] * uv.y + r1[2],
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub texture: TextureKind,
    pub uv: UvTransform,
}

pub struct SceneObject {
    pub id: ObjectId,
    pub shape: Shape,
    pub mesh: Mesh,
    pub material: Material,
    pub transform: Transform,
    pub highlight_color: Color,
    pub selectable: bool,
    /// Cached from `mesh`; geometry never changes after construction
    local_bounds: Aabb,
}

impl SceneObject {
    pub fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }

    pub fn name(&self) -> &'static str {
        self.shape.name()
    }
}

pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self { objects: Vec::new() }
    }

    /// The demo scene: sphere, torus and cylinder on a 100x100 ground plane
    pub fn demo() -> Self {
        let mut scene = Self::new();
        scene.add(
            Shape::Sphere,
            geometry::sphere(1.2, 32, 32),
            Material {
                texture: TextureKind::Metal,
                uv: UvTransform {
                    repeat: Vec2::new(2.0, 2.0),
                    rotation: FRAC_PI_4,
                    center: Vec2::new(0.5, 0.5),
                    ..Default::default()
                },
            },
            Transform::from_position(Vec3::new(-4.0, 0.5, 0.0)),
            Some(hex_color(0x22d3ee)),
        );
        scene.add(
            Shape::Torus,
            geometry::torus(1.2, 0.4, 24, 64),
            Material { texture: TextureKind::Wood, uv: UvTransform::repeat(3.0, 1.0) },
            Transform::from_position(Vec3::new(0.0, 0.5, 0.0)).with_rotation(Vec3::new(FRAC_PI_4, 0.0, 0.0)),
            Some(hex_color(0xfee685)),
        );
        scene.add(
            Shape::Cylinder,
            geometry::cylinder(1.0, 1.0, 2.5, 32),
            Material {
                texture: TextureKind::Plaster,
                uv: UvTransform {
                    repeat: Vec2::new(1.0, 2.0),
                    offset: Vec2::new(0.25, 0.0),
                    ..Default::default()
                },
            },
            Transform::from_position(Vec3::new(4.0, 0.5, 0.0)),
            Some(hex_color(0xa4f4cf)),
        );
        scene.add(
            Shape::Ground,
            geometry::plane(100.0, 100.0),
            Material { texture: TextureKind::Grid, uv: UvTransform::repeat(10.0, 10.0) },
            Transform::from_position(Vec3::new(0.0, -2.0, 0.0)).with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
            None,
        );
        scene
    }

    /// Adds an object; `highlight` of `None` makes it unselectable.
    pub fn add(
        &mut self,
        shape: Shape,
        mesh: Mesh,
        material: Material,
        transform: Transform,
        highlight: Option<Color>,
    ) -> ObjectId {
        let id = ObjectId(self.objects.len());
        let local_bounds = mesh.bounding_box();
        self.objects.push(SceneObject {
            id,
            shape,
            mesh,
            material,
            transform,
            highlight_color: highlight.unwrap_or([1.0, 1.0, 1.0]),
            selectable: highlight.is_some(),
            local_bounds,
        });
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id.0)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn selectable(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.selectable)
    }

    pub fn find(&self, shape: Shape) -> Option<ObjectId> {
        self.objects.iter().find(|o| o.shape == shape).map(|o| o.id)
    }

    pub fn transforms(&self) -> Vec<Transform> {
        self.objects.iter().map(|o| o.transform).collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::demo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_has_three_selectable_objects_and_ground() {
        let scene = Scene::demo();
        assert_eq!(scene.len(), 4);
        assert_eq!(scene.selectable().count(), 3);
        let ground = scene.find(Shape::Ground).unwrap();
        assert!(!scene.get(ground).unwrap().selectable);
    }

    #[test]
    fn highlight_colors_are_distinct() {
        let scene = Scene::demo();
        let colors: Vec<Color> = scene.selectable().map(|o| o.highlight_color).collect();
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }

    #[test]
    fn hex_color_splits_channels() {
        assert_eq!(hex_color(0xff0080), [1.0, 0.0, 128.0 / 255.0]);
    }

    #[test]
    fn transform_matrix_scales_before_translating() {
        let mut t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        t.scale = Vec3::splat(2.0);
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn uv_repeat_and_offset() {
        let uv = UvTransform { repeat: Vec2::new(1.0, 2.0), offset: Vec2::new(0.25, 0.0), ..Default::default() };
        let out = uv.apply(Vec2::new(0.5, 0.5));
        assert!((out - Vec2::new(0.75, 1.0)).length() < 1e-6);
    }

    #[test]
    fn uv_rotation_pivots_around_center() {
        let uv = UvTransform { rotation: 1.0, center: Vec2::new(0.5, 0.5), ..Default::default() };
        let out = uv.apply(Vec2::new(0.5, 0.5));
        assert!((out - Vec2::new(0.5, 0.5)).length() < 1e-6);
    }

    #[test]
    fn ground_plane_faces_up_after_rotation() {
        let scene = Scene::demo();
        let ground = scene.get(scene.find(Shape::Ground).unwrap()).unwrap();
        let up = ground.transform.matrix().transform_vector3(Vec3::Z);
        assert!((up - Vec3::Y).length() < 1e-5);
    }
}
