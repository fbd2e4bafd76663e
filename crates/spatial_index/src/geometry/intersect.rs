//! Ray intersection and overlap predicates
//!
//! All routines expect sensible inputs (see the module docs); sensibility
//! is re-checked with debug assertions, matching how the engine treats
//! these as precondition failures rather than runtime errors.

use super::{AreaTriangle, Plane, Ray};
use crate::bounds::Aabb;
use crate::foundation::math::Vec3;

/// Compute the point where a ray crosses a plane
///
/// A ray parallel to the plane yields a hit only if its start already lies
/// on the plane (degenerate containment). Otherwise the parametric
/// distance along the normalized direction must fall within
/// `[0, ray.length]`.
#[must_use]
pub fn ray_plane_intersection(ray: &Ray, plane: &Plane) -> Option<Vec3> {
    debug_assert!(ray.is_sensible(), "invalid ray provided");
    debug_assert!(plane.is_sensible(), "invalid plane provided");

    // Ray perpendicular to the plane's normal, i.e. parallel to the plane.
    if plane.normal.dot(&ray.direction) == 0.0 {
        if (plane.point_on_plane - ray.start).dot(&plane.normal) != 0.0 {
            return None;
        }
        // Start lies on the plane and is the first point of intersection.
        return Some(ray.start);
    }

    let ray_direction = ray.direction.normalize();
    let distance = plane.normal.dot(&(plane.point_on_plane - ray.start))
        / plane.normal.dot(&ray_direction);

    if distance < 0.0 || distance > ray.length {
        return None;
    }

    Some(ray.start + distance * ray_direction)
}

/// Compute the point where a ray crosses a triangle
///
/// Intersects the triangle's supporting plane, then tests containment by
/// comparing the triangle's doubled area against the sum of the three
/// sub-triangle areas formed with the candidate point, within a relative
/// epsilon.
///
/// A ray coplanar with the triangle is an accepted false-negative: the
/// plane test degenerates to the start point, which is then area-tested
/// like any other candidate, and interior crossings along the plane are
/// not detected.
#[must_use]
pub fn ray_triangle_intersection(ray: &Ray, triangle: &AreaTriangle) -> Option<Vec3> {
    debug_assert!(ray.is_sensible(), "invalid ray provided");
    debug_assert!(triangle.is_sensible(), "invalid triangle provided");

    let plane = Plane {
        point_on_plane: triangle.points[0],
        normal: triangle.normal(),
    };
    let candidate = ray_plane_intersection(ray, &plane)?;

    // The sub-triangle areas sum to the triangle's area iff the point lies
    // within the triangle. Areas are kept doubled and squared to avoid
    // square roots.
    let [a, b, c] = triangle.points;
    let triangle_area = 0.25 * (b - a).cross(&(c - a)).magnitude_squared();
    let partial_area = 0.25
        * ((a - candidate).cross(&(b - candidate)).magnitude_squared()
            + (a - candidate).cross(&(c - candidate)).magnitude_squared()
            + (b - candidate).cross(&(c - candidate)).magnitude_squared());

    let inside = partial_area <= triangle_area
        || (partial_area - triangle_area).abs()
            <= f32::EPSILON * partial_area.max(triangle_area);

    inside.then_some(candidate)
}

/// Compute where a ray enters and exits an axis-aligned box
///
/// The box is decomposed into its 12 face triangles and every triangle is
/// tested; hits are de-duplicated by parametric distance so that edge or
/// vertex grazes shared by several triangles count once. An AABB is
/// convex, so at most two distinct points survive; they are returned
/// ordered by distance from the ray start.
///
/// A box without volume yields no intersections.
#[must_use]
pub fn ray_aabb_intersections(ray: &Ray, bounds: &Aabb) -> Vec<Vec3> {
    debug_assert!(ray.is_sensible(), "invalid ray provided");
    debug_assert!(bounds.is_sensible(), "invalid axis-aligned box provided");

    if !super::is_positive(&bounds.dimensions()) {
        return Vec::new();
    }

    let direction = ray.direction.normalize();
    let mut hits: Vec<(f32, Vec3)> = Vec::new();
    // Distances closer than this are the same geometric point (an edge or
    // corner shared between face triangles).
    let distance_epsilon = 1e-4 * bounds.dimensions().magnitude().max(1.0);

    for triangle in bounds.face_triangles() {
        let Some(point) = ray_triangle_intersection(ray, &triangle) else {
            continue;
        };
        let distance = (point - ray.start).dot(&direction);
        if hits
            .iter()
            .any(|(existing, _)| (existing - distance).abs() <= distance_epsilon)
        {
            continue;
        }
        hits.push((distance, point));
    }

    hits.sort_by(|a, b| a.0.total_cmp(&b.0));
    hits.truncate(2);
    hits.into_iter().map(|(_, point)| point).collect()
}

/// Whether a ray passes through an axis-aligned box
///
/// True iff the ray's start lies inside the box or the ray crosses at
/// least one face within its length. Decided with the slab method rather
/// than the triangle decomposition; both answer the same predicate and the
/// slab test needs no allocation.
#[must_use]
pub fn ray_overlaps_aabb(ray: &Ray, bounds: &Aabb) -> bool {
    debug_assert!(ray.is_sensible(), "invalid ray provided");
    debug_assert!(bounds.is_sensible(), "invalid axis-aligned box provided");

    if !super::is_positive(&bounds.dimensions()) {
        return false;
    }

    match bounds.intersect_ray(ray.start, ray.direction.normalize()) {
        Some(entry) => entry <= ray.length,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box_at(center: Vec3) -> Aabb {
        Aabb::from_center_dimensions(center, Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_plane_hit() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0)).unwrap();
        let plane = Plane::new(Vec3::zeros(), Vec3::y()).unwrap();
        let hit = ray_plane_intersection(&ray, &plane).unwrap();
        assert_relative_eq!(hit, Vec3::zeros(), epsilon = 1e-6);
    }

    #[test]
    fn test_ray_plane_behind_start_misses() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 1.0, 0.0)).unwrap();
        let plane = Plane::new(Vec3::zeros(), Vec3::y()).unwrap();
        assert!(ray_plane_intersection(&ray, &plane).is_none());
    }

    #[test]
    fn test_ray_plane_parallel() {
        let plane = Plane::new(Vec3::zeros(), Vec3::y()).unwrap();

        // Parallel and off the plane: no intersection.
        let above = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::x()).unwrap();
        assert!(ray_plane_intersection(&above, &plane).is_none());

        // Parallel but starting on the plane: degenerate containment.
        let on = Ray::new(Vec3::zeros(), Vec3::x()).unwrap();
        assert_relative_eq!(ray_plane_intersection(&on, &plane).unwrap(), Vec3::zeros());
    }

    #[test]
    fn test_ray_plane_respects_length() {
        let plane = Plane::new(Vec3::zeros(), Vec3::y()).unwrap();
        let short = Ray::with_length(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 2.0)
            .unwrap();
        assert!(ray_plane_intersection(&short, &plane).is_none());
        let long = Ray::with_length(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -1.0, 0.0), 8.0)
            .unwrap();
        assert!(ray_plane_intersection(&long, &plane).is_some());
    }

    #[test]
    fn test_ray_triangle_inside_hit() {
        let triangle = AreaTriangle::new([
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, -1.0, 0.0)).unwrap();
        let hit = ray_triangle_intersection(&ray, &triangle).unwrap();
        assert_relative_eq!(hit, Vec3::zeros(), epsilon = 1e-6);
    }

    #[test]
    fn test_ray_triangle_outside_miss() {
        let triangle = AreaTriangle::new([
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        let ray = Ray::new(Vec3::new(5.0, 2.0, 5.0), Vec3::new(0.0, -1.0, 0.0)).unwrap();
        assert!(ray_triangle_intersection(&ray, &triangle).is_none());
    }

    #[test]
    fn test_ray_triangle_vertex_hit() {
        let triangle = AreaTriangle::new([
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        let ray = Ray::new(Vec3::new(0.0, 2.0, 1.0), Vec3::new(0.0, -1.0, 0.0)).unwrap();
        let hit = ray_triangle_intersection(&ray, &triangle).unwrap();
        assert_relative_eq!(hit, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_ray_aabb_through_center() {
        let bounds = unit_box_at(Vec3::zeros());
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::x()).unwrap();
        let hits = ray_aabb_intersections(&ray, &bounds);
        assert_eq!(hits.len(), 2);
        assert_relative_eq!(hits[0], Vec3::new(-0.5, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(hits[1], Vec3::new(0.5, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_ray_aabb_from_inside() {
        let bounds = unit_box_at(Vec3::zeros());
        let ray = Ray::new(Vec3::zeros(), Vec3::x()).unwrap();
        let hits = ray_aabb_intersections(&ray, &bounds);
        assert_eq!(hits.len(), 1);
        assert_relative_eq!(hits[0], Vec3::new(0.5, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_ray_aabb_edge_graze_counts_once() {
        let bounds = unit_box_at(Vec3::zeros());
        // Travels along the top-front edge of the box.
        let ray = Ray::new(Vec3::new(-5.0, 0.5, 0.5), Vec3::x()).unwrap();
        let hits = ray_aabb_intersections(&ray, &bounds);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_ray_aabb_miss() {
        let bounds = unit_box_at(Vec3::zeros());
        let ray = Ray::new(Vec3::new(-5.0, 3.0, 0.0), Vec3::x()).unwrap();
        assert!(ray_aabb_intersections(&ray, &bounds).is_empty());
        assert!(!ray_overlaps_aabb(&ray, &bounds));
    }

    #[test]
    fn test_ray_overlap_start_inside() {
        let bounds = unit_box_at(Vec3::zeros());
        let ray = Ray::new(Vec3::new(0.1, 0.1, 0.1), Vec3::z()).unwrap();
        assert!(ray_overlaps_aabb(&ray, &bounds));
    }

    #[test]
    fn test_ray_overlap_respects_length() {
        let bounds = unit_box_at(Vec3::new(10.0, 0.0, 0.0));
        let short = Ray::with_length(Vec3::zeros(), Vec3::x(), 5.0).unwrap();
        assert!(!ray_overlaps_aabb(&short, &bounds));
        let long = Ray::with_length(Vec3::zeros(), Vec3::x(), 20.0).unwrap();
        assert!(ray_overlaps_aabb(&long, &bounds));
    }
}
