//! Property tests for the weld operator

use brickforge_scene::Mesh;
use nalgebra::Point3;
use proptest::prelude::*;

fn mesh_strategy() -> impl Strategy<Value = Mesh> {
    prop::collection::vec((0u8..6, 0u8..6, 0u8..6), 3..40).prop_flat_map(|cells| {
        let positions: Vec<Point3<f64>> = cells
            .iter()
            .map(|&(x, y, z)| Point3::new(x as f64, y as f64, z as f64) * 0.00005)
            .collect();
        let n = positions.len();
        prop::collection::vec(prop::collection::vec(0..n, 3..5), 1..20)
            .prop_map(move |faces| Mesh::new(positions.clone(), faces))
    })
}

proptest! {
    #[test]
    fn weld_keeps_every_point_within_reach(mesh in mesh_strategy(), threshold in 0.00001f64..0.0002) {
        let original = mesh.positions.clone();
        let mut welded = mesh.clone();
        let removed = welded.weld(threshold);

        prop_assert_eq!(removed + welded.vertex_count(), original.len());
        for p in &original {
            prop_assert!(welded.positions.iter().any(|q| (q - p).norm() <= threshold));
        }
    }

    #[test]
    fn weld_leaves_valid_faces(mesh in mesh_strategy(), threshold in 0.00001f64..0.0002) {
        let mut welded = mesh;
        welded.weld(threshold);
        for face in &welded.faces {
            prop_assert!(face.iter().all(|&i| i < welded.vertex_count()));
            let mut distinct = face.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert!(distinct.len() >= 3);
        }
    }

    #[test]
    fn non_positive_threshold_is_a_no_op(mesh in mesh_strategy()) {
        let mut welded = mesh.clone();
        prop_assert_eq!(welded.weld(0.0), 0);
        prop_assert_eq!(welded, mesh);
    }
}
