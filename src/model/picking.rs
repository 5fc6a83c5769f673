use glam::Vec3;

use super::geometry::Aabb;
use super::scene::{ObjectId, Scene, SceneObject};

/// A ray in world space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Ray-AABB slab test. Returns the entry distance, or exit distance when
/// the origin is inside the box.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv = ray.direction.recip();
    let t1 = (aabb.min - ray.origin) * inv;
    let t2 = (aabb.max - ray.origin) * inv;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }
    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Möller-Trumbore ray-triangle intersection
pub fn ray_triangle(ray: &Ray, [v0, v1, v2]: [Vec3; 3]) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > EPSILON).then_some(t)
}

/// Distance along `ray` (world units of the ray parameter) to the object's surface
pub fn intersect_object(ray: &Ray, object: &SceneObject) -> Option<f32> {
    let inv = object.transform.matrix().inverse();
    // keep the direction unnormalised so `t` is shared between both spaces
    let local = Ray {
        origin: inv.transform_point3(ray.origin),
        direction: inv.transform_vector3(ray.direction),
    };

    ray_aabb(&local, &object.local_bounds())?;

    object
        .mesh
        .triangles()
        .filter_map(|tri| ray_triangle(&local, tri))
        .min_by(|a, b| a.total_cmp(b))
}

impl Scene {
    /// Nearest selectable object under the ray
    pub fn pick(&self, ray: &Ray) -> Option<ObjectId> {
        self.selectable()
            .filter_map(|o| intersect_object(ray, o).map(|t| (o.id, t)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Shape;

    fn ray_towards(from: Vec3, to: Vec3) -> Ray {
        Ray { origin: from, direction: (to - from).normalize() }
    }

    #[test]
    fn slab_hits_box_in_front() {
        let aabb = Aabb { min: Vec3::splat(-1.0), max: Vec3::splat(1.0) };
        let ray = ray_towards(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert!((ray_aabb(&ray, &aabb).unwrap() - 4.0).abs() < 1e-5);
        let away = Ray { origin: Vec3::new(0.0, 0.0, 5.0), direction: Vec3::Z };
        assert!(ray_aabb(&away, &aabb).is_none());
    }

    #[test]
    fn triangle_hit_and_miss() {
        let tri = [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        let hit = ray_towards(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO);
        assert!((ray_triangle(&hit, tri).unwrap() - 3.0).abs() < 1e-5);
        let miss = ray_towards(Vec3::new(5.0, 5.0, 3.0), Vec3::new(5.0, 5.0, 0.0));
        assert!(ray_triangle(&miss, tri).is_none());
    }

    #[test]
    fn picks_each_object_through_its_center() {
        let scene = Scene::demo();
        for shape in [Shape::Sphere, Shape::Cylinder] {
            let id = scene.find(shape).unwrap();
            let center = scene.get(id).unwrap().transform.position;
            let ray = ray_towards(center + Vec3::new(0.0, 0.0, 20.0), center);
            assert_eq!(scene.pick(&ray), Some(id), "{shape:?}");
        }
    }

    #[test]
    fn torus_hole_is_not_a_hit_but_the_ring_is() {
        let scene = Scene::demo();
        let torus = scene.find(Shape::Torus).unwrap();
        // ring passes through (0, 0.5, 0) +/- 1.2 along x
        let ring = Vec3::new(1.2, 0.5, 0.0);
        let ray = ray_towards(ring + Vec3::new(0.0, 10.0, 0.0), ring);
        assert_eq!(scene.pick(&ray), Some(torus));

        let hole = ray_towards(Vec3::new(0.0, 20.0, 0.0), Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(scene.pick(&hole), None);
    }

    #[test]
    fn ground_is_never_picked() {
        let scene = Scene::demo();
        let ray = ray_towards(Vec3::new(20.0, 10.0, 20.0), Vec3::new(20.0, -2.0, 20.0));
        assert_eq!(scene.pick(&ray), None);
    }

    #[test]
    fn sky_ray_misses() {
        let scene = Scene::demo();
        let ray = Ray { origin: Vec3::new(6.0, 6.0, 10.0), direction: Vec3::Y };
        assert_eq!(scene.pick(&ray), None);
    }

    #[test]
    fn picking_follows_moved_objects() {
        let mut scene = Scene::demo();
        let sphere = scene.find(Shape::Sphere).unwrap();
        scene.get_mut(sphere).unwrap().transform.position = Vec3::new(0.0, 10.0, 0.0);
        let ray = ray_towards(Vec3::new(0.0, 10.0, 20.0), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(scene.pick(&ray), Some(sphere));
    }
}
