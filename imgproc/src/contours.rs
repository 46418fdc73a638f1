//! Border following (Suzuki & Abe, 1985) over binary images.
//!
//! Every border of every connected component is traced: outer borders and
//! hole borders, each tagged with the index of its enclosing border.

use image::GrayImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderType {
    Outer,
    Hole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<(i32, i32)>,
    pub border_type: BorderType,
    /// Index of the enclosing contour in the same result set.
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Outermost borders only.
    External,
    /// Every border with its full nesting.
    Tree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainApprox {
    /// Every border pixel.
    None,
    /// Straight horizontal, vertical and diagonal runs reduced to their end points.
    Simple,
}

// Clockwise on screen (y grows downwards).
const DIRS_8: [(isize, isize); 8] = [
    (1, 0),   // E
    (1, 1),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
    (-1, 0),  // W
    (-1, -1), // NW
    (0, -1),  // N
    (1, -1),  // NE
];
const EAST: usize = 0;

struct Grid {
    width: usize,
    cells: Vec<i32>,
}

impl Grid {
    /// Binary image with a one-pixel zero frame around it.
    fn padded(binary: &GrayImage) -> Self {
        let width = binary.width() as usize + 2;
        let height = binary.height() as usize + 2;
        let mut cells = vec![0i32; width * height];
        for (x, y, px) in binary.enumerate_pixels() {
            if px[0] > 0 {
                cells[(y as usize + 1) * width + x as usize + 1] = 1;
            }
        }
        Self { width, cells }
    }

    fn get(&self, p: (usize, usize)) -> i32 {
        self.cells[p.1 * self.width + p.0]
    }

    fn set(&mut self, p: (usize, usize), value: i32) {
        self.cells[p.1 * self.width + p.0] = value;
    }
}

fn step(p: (usize, usize), dir: usize) -> (usize, usize) {
    let (dx, dy) = DIRS_8[dir];
    ((p.0 as isize + dx) as usize, (p.1 as isize + dy) as usize)
}

fn dir_between(from: (usize, usize), to: (usize, usize)) -> usize {
    let d = (to.0 as isize - from.0 as isize, to.1 as isize - from.1 as isize);
    DIRS_8
        .iter()
        .position(|&v| v == d)
        .unwrap_or(EAST)
}

/// Find the borders of the non-zero regions of `binary`.
pub fn find_contours(binary: &GrayImage, mode: RetrievalMode, method: ChainApprox) -> Vec<Contour> {
    let mut grid = Grid::padded(binary);
    let width = grid.width;
    let height = binary.height() as usize + 2;
    let mut contours: Vec<Contour> = Vec::new();
    let mut nbd: i32 = 1;

    for y in 1..height - 1 {
        let mut lnbd: i32 = 1;
        for x in 1..width - 1 {
            let p = (x, y);
            let value = grid.get(p);
            if value == 0 {
                continue;
            }

            let start = if value == 1 && grid.get((x - 1, y)) == 0 {
                Some((BorderType::Outer, (x - 1, y)))
            } else if value >= 1 && grid.get((x + 1, y)) == 0 {
                if value > 1 {
                    lnbd = value;
                }
                Some((BorderType::Hole, (x + 1, y)))
            } else {
                None
            };

            if let Some((border_type, adjacent)) = start {
                nbd += 1;
                let parent = enclosing(border_type, lnbd, &contours);
                let traced = follow_border(&mut grid, p, adjacent, nbd);
                let points = traced
                    .into_iter()
                    .map(|(px, py)| (px as i32 - 1, py as i32 - 1))
                    .collect();
                contours.push(Contour {
                    points,
                    border_type,
                    parent,
                });
            }

            let value = grid.get(p);
            if value != 1 {
                lnbd = value.abs();
            }
        }
    }

    if method == ChainApprox::Simple {
        for contour in &mut contours {
            contour.points = approx_simple(&contour.points);
        }
    }

    match mode {
        RetrievalMode::Tree => contours,
        RetrievalMode::External => contours
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
            .collect(),
    }
}

// The last border met on this row decides the parent: a border of the other
// kind encloses the new one, a border of the same kind is its sibling.
fn enclosing(border_type: BorderType, lnbd: i32, contours: &[Contour]) -> Option<usize> {
    if lnbd < 2 {
        return None;
    }
    let idx = (lnbd - 2) as usize;
    let previous = contours.get(idx)?;
    if previous.border_type != border_type {
        Some(idx)
    } else {
        previous.parent
    }
}

fn follow_border(
    grid: &mut Grid,
    start: (usize, usize),
    adjacent: (usize, usize),
    nbd: i32,
) -> Vec<(usize, usize)> {
    let from = dir_between(start, adjacent);
    let first = (0..8)
        .map(|k| step(start, (from + k) % 8))
        .find(|&q| grid.get(q) != 0);

    let Some(first) = first else {
        grid.set(start, -nbd);
        return vec![start];
    };

    let mut points = Vec::new();
    let mut previous = first;
    let mut current = start;

    loop {
        points.push(current);

        let back = dir_between(current, previous);
        let mut east_is_zero = false;
        let mut next = previous;
        for k in 1..=8 {
            let dir = (back + 8 - k) % 8;
            let q = step(current, dir);
            if grid.get(q) != 0 {
                next = q;
                break;
            }
            if dir == EAST {
                east_is_zero = true;
            }
        }

        if east_is_zero {
            grid.set(current, -nbd);
        } else if grid.get(current) == 1 {
            grid.set(current, nbd);
        }

        if next == start && current == first {
            break;
        }
        previous = current;
        current = next;
    }

    points
}

fn approx_simple(points: &[(i32, i32)]) -> Vec<(i32, i32)> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            (cur.0 - prev.0, cur.1 - prev.1) != (next.0 - cur.0, next.1 - cur.1)
        })
        .map(|i| points[i])
        .collect()
}

/// Axis-aligned bounding box `(x, y, width, height)`.
pub fn bounding_rect(contour: &Contour) -> Option<(i32, i32, u32, u32)> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
    for &(x, y) in &contour.points[1..] {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Some((
        min_x,
        min_y,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}
