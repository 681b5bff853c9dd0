use crate::buffer::{create_buffer, TypedBuffer};
use crate::device::{BufferTarget, Device, ElementType};
use crate::diag::Diagnostics;

/// Triangle list over the 12 vertices of [`icosahedron_positions`]:
/// five around the north pole, ten around the equator, five around the south
/// pole.
pub const ICOSAHEDRON_INDICES: [u16; 60] = [
    0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 5, 0, 5, 1, //
    2, 1, 6, 3, 2, 7, 4, 3, 8, 5, 4, 9, 1, 5, 10, //
    11, 10, 9, 11, 9, 8, 11, 8, 7, 11, 7, 6, 11, 6, 10, //
    10, 5, 9, 9, 4, 8, 8, 3, 7, 7, 2, 6, 6, 1, 10,
];

/// Vertex positions of a unit-circumradius icosahedron, poles on the Y axis.
///
/// Returned as `f64` so the float conversion happens once, at upload.
pub fn icosahedron_positions() -> [f64; 36] {
    let a = 1.0 / 5.0f64.sqrt();
    let b = (1.0 - a) / 2.0;
    let c = (1.0 + a) / 2.0;
    let d = b.sqrt();
    let e = c.sqrt();

    #[rustfmt::skip]
    let positions = [
        0.0, 1.0, 0.0,
        0.0, a, 2.0 * a,
        e, a, b,
        d, a, -c,
        -d, a, -c,
        -e, a, b,
        d, -a, c,
        e, -a, -b,
        0.0, -a, -2.0 * a,
        -e, -a, -b,
        -d, -a, c,
        0.0, -1.0, 0.0,
    ];
    positions
}

/// Buffers for one mesh, keyed by attribute role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSet {
    pub position: TypedBuffer,
    /// Same device buffer as `position`: on a unit sphere normals equal positions.
    pub normal: TypedBuffer,
    pub index: TypedBuffer,
}

impl BufferSet {
    /// Deletes every distinct device buffer in the set.
    pub fn release<D: Device + ?Sized>(self, device: &mut D) {
        let shared = self.normal.id() == self.position.id();
        self.position.release(device);
        if !shared {
            self.normal.release(device);
        }
        self.index.release(device);
    }
}

/// Uploads the icosahedron as a position buffer (float, 3 per vertex) and an
/// index buffer (u16, 1 per index), with `normal` aliasing `position`.
///
/// Returns `None` only if the device refuses to allocate a buffer; anything
/// already allocated is deleted first.
pub fn create_icosahedron_buffer_set<D: Device + ?Sized>(
    device: &mut D,
    diagnostics: &mut dyn Diagnostics,
) -> Option<BufferSet> {
    let position = create_buffer(
        device,
        diagnostics,
        BufferTarget::Array,
        &icosahedron_positions(),
        ElementType::Float32,
        3,
    )?;

    let indices: Vec<f64> = ICOSAHEDRON_INDICES.iter().map(|&i| f64::from(i)).collect();
    let Some(index) = create_buffer(
        device,
        diagnostics,
        BufferTarget::ElementArray,
        &indices,
        ElementType::UnsignedShort16,
        1,
    ) else {
        position.release(device);
        return None;
    };

    Some(BufferSet {
        normal: position.clone(),
        position,
        index,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::device::{HeadlessDevice, HeadlessLimits};
    use crate::diag::DiagnosticLog;

    // ── topology ──────────────────────────────────────────────────────────

    #[test]
    fn twenty_triangles_over_twelve_vertices() {
        assert_eq!(ICOSAHEDRON_INDICES.len() / 3, 20);
        let distinct: BTreeSet<u16> = ICOSAHEDRON_INDICES.iter().copied().collect();
        assert_eq!(distinct, (0..12).collect::<BTreeSet<u16>>());
    }

    #[test]
    fn every_edge_is_shared_by_two_faces() {
        let mut edges = std::collections::HashMap::new();
        for tri in ICOSAHEDRON_INDICES.chunks_exact(3) {
            for (p, q) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                *edges.entry((p.min(q), p.max(q))).or_insert(0) += 1;
            }
        }
        assert_eq!(edges.len(), 30);
        assert!(edges.values().all(|&n| n == 2));
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn vertices_lie_on_unit_sphere() {
        for v in icosahedron_positions().chunks_exact(3) {
            let r = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((r - 1.0).abs() < 1e-12, "radius {r}");
        }
    }

    fn expected_positions() -> [f64; 36] {
        let a = 5.0f64.sqrt().recip();
        let b = 0.5 * (1.0 - a);
        let c = 0.5 * (1.0 + a);
        let (d, e) = (b.sqrt(), c.sqrt());
        [
            0.0, 1.0, 0.0, //
            0.0, a, 2.0 * a, //
            e, a, b, //
            d, a, -c, //
            -d, a, -c, //
            -e, a, b, //
            d, -a, c, //
            e, -a, -b, //
            0.0, -a, -2.0 * a, //
            -e, -a, -b, //
            -d, -a, c, //
            0.0, -1.0, 0.0,
        ]
    }

    #[test]
    fn positions_match_the_vertex_table_exactly() {
        let got = icosahedron_positions();
        for (i, (g, want)) in got.iter().zip(expected_positions()).enumerate() {
            assert_eq!(g.to_bits(), want.to_bits(), "component {i}: {g} != {want}");
        }
    }

    #[test]
    fn indices_match_the_face_table_exactly() {
        let expected: [u16; 60] = [
            0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 5, 0, 5, 1, 2, 1, 6, 3, 2, 7, 4, 3, 8, 5, 4, 9, 1, 5,
            10, 11, 10, 9, 11, 9, 8, 11, 8, 7, 11, 7, 6, 11, 6, 10, 10, 5, 9, 9, 4, 8, 8, 3, 7, 7,
            2, 6, 6, 1, 10,
        ];
        assert_eq!(ICOSAHEDRON_INDICES, expected);
    }

    #[test]
    fn uploaded_bytes_are_the_f32_narrowing() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let set = create_icosahedron_buffer_set(&mut dev, &mut log).unwrap();

        let positions: Vec<f32> = dev
            .buffer_bytes(set.position.id())
            .unwrap()
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let expected: Vec<f32> = expected_positions().iter().map(|&v| v as f32).collect();
        assert_eq!(positions.len(), 36);
        for (i, (g, want)) in positions.iter().zip(&expected).enumerate() {
            assert_eq!(g.to_bits(), want.to_bits(), "component {i}");
        }

        let indices: Vec<u16> = dev
            .buffer_bytes(set.index.id())
            .unwrap()
            .chunks_exact(2)
            .map(|c| u16::from_ne_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(indices, ICOSAHEDRON_INDICES);
    }

    #[test]
    fn poles_sit_on_the_y_axis() {
        let p = icosahedron_positions();
        assert_eq!(&p[0..3], &[0.0, 1.0, 0.0]);
        assert_eq!(&p[33..36], &[0.0, -1.0, 0.0]);
    }

    #[test]
    fn edges_have_equal_length() {
        let p = icosahedron_positions();
        let vertex = |i: u16| &p[i as usize * 3..i as usize * 3 + 3];
        let lengths: Vec<f64> = ICOSAHEDRON_INDICES
            .chunks_exact(3)
            .flat_map(|t| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
            .map(|(i, j)| {
                let (u, v) = (vertex(i), vertex(j));
                ((u[0] - v[0]).powi(2) + (u[1] - v[1]).powi(2) + (u[2] - v[2]).powi(2)).sqrt()
            })
            .collect();
        let first = lengths[0];
        assert!(lengths.iter().all(|l| (l - first).abs() < 1e-12));
    }

    // ── buffer set ────────────────────────────────────────────────────────

    #[test]
    fn buffer_set_layout() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let set = create_icosahedron_buffer_set(&mut dev, &mut log).unwrap();

        assert!(log.is_empty());
        assert_eq!(set.position.item_count(), 12);
        assert_eq!(set.position.item_size(), 3);
        assert_eq!(set.position.element_type(), ElementType::Float32);
        assert_eq!(set.index.item_count(), 60);
        assert_eq!(set.index.element_type(), ElementType::UnsignedShort16);
        assert_eq!(set.index.target(), BufferTarget::ElementArray);
        assert_eq!(dev.live_buffers(), 2);
    }

    #[test]
    fn normal_aliases_position() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let set = create_icosahedron_buffer_set(&mut dev, &mut log).unwrap();
        assert_eq!(set.normal, set.position);
        assert_eq!(set.normal.id(), set.position.id());
    }

    #[test]
    fn release_deletes_shared_buffer_once() {
        let mut dev = HeadlessDevice::new();
        let mut log = DiagnosticLog::new();
        let set = create_icosahedron_buffer_set(&mut dev, &mut log).unwrap();
        set.release(&mut dev);
        assert_eq!(dev.live_buffers(), 0);
        assert_eq!(dev.poll_error(), None);
    }

    #[test]
    fn partial_allocation_is_rolled_back() {
        let mut dev = HeadlessDevice::with_limits(HeadlessLimits {
            max_buffers: 1,
            ..Default::default()
        });
        let mut log = DiagnosticLog::new();
        assert!(create_icosahedron_buffer_set(&mut dev, &mut log).is_none());
        assert_eq!(dev.live_buffers(), 0);
    }
}
