// THEORY:
// The `BorderTracer` finds the ring of pixels that immediately surrounds a connected
// component. That ring is what the `ShadowClassifier` inspects: a shadow is
// recognized by what lies just outside it, not by what lies inside it.
//
// Key architectural principles:
// 1.  **8-Neighborhood**: Every component pixel contributes its 8 neighbors. Any
//     neighbor that is not part of the component itself is a border pixel.
// 2.  **No Duplicates**: Neighboring component pixels share most of their
//     neighbors. A visited set, local to a single call, guarantees each border
//     pixel is recorded exactly once.
// 3.  **Image Edge Limitation**: Component pixels on the outermost row or column
//     are skipped entirely, so neighbor access can never leave the image. As a
//     consequence, a component touching the image edge gets an incomplete border
//     and may be classified on partial evidence.
// 4.  **Stateless Utility**: The tracer keeps no state between calls and is safe to
//     run from any number of workers at once.

use crate::core_modules::lab_planes::PixelCoordinate;

pub mod border_tracer {
    use super::*;
    use std::collections::HashSet;

    /// Returns the unique border pixels of `component`, in discovery order.
    pub fn trace_border(
        component: &[PixelCoordinate],
        width: u32,
        height: u32,
    ) -> Vec<PixelCoordinate> {
        let members: HashSet<PixelCoordinate> = component.iter().copied().collect();
        let mut visited: HashSet<PixelCoordinate> = HashSet::new();
        let mut border = Vec::new();

        for pixel in component {
            if pixel.is_on_image_edge(width, height) {
                continue;
            }

            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dy == 0 && dx == 0 {
                        continue;
                    }
                    // Interior pixels always have all 8 neighbors in bounds.
                    let neighbor = PixelCoordinate::new(
                        (pixel.row as i64 + dy) as u32,
                        (pixel.col as i64 + dx) as u32,
                    );
                    if members.contains(&neighbor) {
                        continue;
                    }
                    if visited.insert(neighbor) {
                        border.push(neighbor);
                    }
                }
            }
        }

        border
    }
}

#[cfg(test)]
mod tests {
    use super::border_tracer::trace_border;
    use super::*;
    use std::collections::HashSet;

    fn square(top: u32, left: u32, size: u32) -> Vec<PixelCoordinate> {
        let mut pixels = Vec::new();
        for r in top..top + size {
            for c in left..left + size {
                pixels.push(PixelCoordinate::new(r, c));
            }
        }
        pixels
    }

    #[test]
    fn single_interior_pixel_has_eight_border_pixels() {
        let border = trace_border(&[PixelCoordinate::new(2, 2)], 5, 5);
        assert_eq!(border.len(), 8);
        assert!(!border.contains(&PixelCoordinate::new(2, 2)));
    }

    #[test]
    fn interior_square_is_ringed_exactly_once() {
        // 5x5 square at (2,2)..(6,6) inside a 9x9 image.
        let component = square(2, 2, 5);
        let border = trace_border(&component, 9, 9);

        let unique: HashSet<_> = border.iter().copied().collect();
        assert_eq!(unique.len(), border.len(), "border contains duplicates");
        assert_eq!(border.len(), 7 * 7 - 5 * 5);
        let members: HashSet<PixelCoordinate> = component.into_iter().collect();
        let expected: HashSet<PixelCoordinate> =
            square(1, 1, 7).into_iter().filter(|p| !members.contains(p)).collect();
        assert_eq!(unique, expected);
    }

    #[test]
    fn interior_border_matches_brute_force_neighborhood() {
        // An irregular, fully interior shape.
        let shape = [(3, 3), (3, 4), (4, 4), (5, 4), (5, 5), (5, 6), (2, 6)];
        let component: Vec<PixelCoordinate> = shape
            .iter()
            .map(|&(r, c)| PixelCoordinate::new(r, c))
            .collect();
        let members: HashSet<_> = component.iter().copied().collect();

        let mut expected = HashSet::new();
        for p in &component {
            for dr in -1i64..=1 {
                for dc in -1i64..=1 {
                    let row = (p.row as i64 + dr) as u32;
                    let col = (p.col as i64 + dc) as u32;
                    let n = PixelCoordinate::new(row, col);
                    if !members.contains(&n) {
                        expected.insert(n);
                    }
                }
            }
        }

        let border = trace_border(&component, 10, 10);
        assert_eq!(border.len(), expected.len());
        assert_eq!(border.into_iter().collect::<HashSet<_>>(), expected);
    }

    #[test]
    fn pixels_on_the_image_edge_contribute_nothing() {
        let border = trace_border(&[PixelCoordinate::new(0, 3), PixelCoordinate::new(4, 5)], 6, 5);
        assert!(border.is_empty());
    }

    #[test]
    fn edge_touching_component_gets_partial_border() {
        // Column 0 pixel is skipped, only (1,1) contributes neighbors.
        let component = vec![PixelCoordinate::new(1, 0), PixelCoordinate::new(1, 1)];
        let border = trace_border(&component, 4, 4);
        assert_eq!(border.len(), 7);
        assert!(border.contains(&PixelCoordinate::new(0, 0)));
        assert!(border.contains(&PixelCoordinate::new(2, 2)));
        assert!(!border.contains(&PixelCoordinate::new(1, 0)));
    }

    #[test]
    fn empty_component_has_empty_border() {
        assert!(trace_border(&[], 4, 4).is_empty());
    }
}
