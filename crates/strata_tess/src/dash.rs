//! Dash decomposition
//!
//! A [`Dasher`] walks a flattened contour and cuts it into the visible runs
//! of a dash pattern. Each run is an open contour refined like any other, so
//! the stroke triangulator caps both of its ends.

use strata_core::Point;

use crate::config::TessellationContext;
use crate::contour::{Contour, PointFlags};

/// Above this many dashes per contour the contour is stroked solid
pub const MAX_DASHES_PER_CONTOUR: f32 = 100_000.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct DashElement {
    visible: bool,
    start: f32,
    end: f32,
    index: usize,
}

impl DashElement {
    fn length(&self) -> f32 {
        self.end - self.start
    }
}

/// A normalized dash pattern with its phase
#[derive(Clone, Debug, PartialEq)]
pub struct Dasher {
    elements: Vec<DashElement>,
    total: f32,
    /// Element the walk starts in, trimmed to the phase
    first: DashElement,
}

impl Dasher {
    /// Build from alternating visible/gap lengths.
    ///
    /// Returns `None` for patterns that would not dash anything: empty, with
    /// a negative entry, or with a non-positive total.
    pub fn new(pattern: &[f32], offset: f32) -> Option<Self> {
        if pattern.is_empty() || pattern.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return None;
        }

        // An odd pattern is repeated so visibility alternates per cycle
        let repeats = if pattern.len() % 2 == 0 { 1 } else { 2 };
        let mut elements = Vec::with_capacity(pattern.len() * repeats);
        let mut total = 0.0;
        let mut visible = true;
        for (index, length) in pattern.iter().cycle().take(pattern.len() * repeats).enumerate() {
            elements.push(DashElement {
                visible,
                start: total,
                end: total + length,
                index,
            });
            total += length;
            visible = !visible;
        }
        if total <= 0.0 {
            return None;
        }

        let phase = normalize_offset(offset, total);
        let element = elements
            .iter()
            .find(|e| e.start <= phase && e.end > phase)
            .or_else(|| elements.iter().rev().find(|e| e.length() > 0.0))
            .copied()?;
        let first = DashElement {
            start: phase.min(element.end),
            ..element
        };

        Some(Self {
            elements,
            total,
            first,
        })
    }

    /// Length of one full pattern cycle
    pub fn pattern_length(&self) -> f32 {
        self.total
    }

    fn next(&self, element: &DashElement) -> DashElement {
        self.elements[(element.index + 1) % self.elements.len()]
    }

    /// Visible runs of `contour`, each refined into an open contour
    pub fn dash_contour(&self, contour: &Contour, ctx: &TessellationContext) -> Vec<Contour> {
        if contour.len() < 2 {
            return Vec::new();
        }

        let mut points: Vec<(Point, PointFlags)> = contour
            .points()
            .iter()
            .map(|p| (p.pos, p.flags & PointFlags::CORNER))
            .collect();
        if contour.is_closed() {
            points.push(points[0]);
        }

        let length: f32 = points.windows(2).map(|w| w[0].0.distance(w[1].0)).sum();
        let estimated = length / self.total * self.elements.len() as f32 * 0.5;
        if estimated > MAX_DASHES_PER_CONTOUR {
            tracing::warn!(
                estimated,
                pattern_length = self.total,
                "dash pattern too dense, stroking contour solid"
            );
            return vec![contour.clone()];
        }

        let mut walk = Walk {
            points: &points,
            next_index: 2,
            p0: points[0],
            p1: points[1],
            remaining: points[0].0.distance(points[1].0),
        };
        let mut runs = Vec::new();
        let mut element = self.first;

        loop {
            let span = element.length();
            let finished = if element.visible {
                let mut run = vec![walk.p0];
                let done = walk.advance(span, Some(&mut run));
                if run.len() >= 2 {
                    let dash = Contour::from_flagged_points(run, false, ctx);
                    if dash.len() >= 2 {
                        runs.push(dash);
                    }
                }
                done
            } else {
                walk.advance(span, None)
            };
            if finished {
                break;
            }
            element = self.next(&element);
        }

        tracing::trace!(points = points.len(), dashes = runs.len(), "contour dashed");
        runs
    }
}

/// Phase folded into `[0, total)`
fn normalize_offset(offset: f32, total: f32) -> f32 {
    let phase = if offset < 0.0 {
        total + offset % total
    } else {
        offset % total
    };
    if phase.is_finite() && phase < total {
        phase
    } else {
        0.0
    }
}

/// Cursor along the segments of a polyline
struct Walk<'a> {
    points: &'a [(Point, PointFlags)],
    next_index: usize,
    p0: (Point, PointFlags),
    p1: (Point, PointFlags),
    /// Length left between `p0` and `p1`, tracked apart from the positions
    remaining: f32,
}

impl Walk<'_> {
    /// Move `span` along the polyline, collecting passed points into `run`.
    ///
    /// Returns `true` when the end of the polyline was reached.
    fn advance(&mut self, span: f32, mut run: Option<&mut Vec<(Point, PointFlags)>>) -> bool {
        let mut covered = 0.0;
        loop {
            let step = span - covered;
            // A step below the precision of `remaining` would never shorten it
            let stalled = step > 0.0 && self.remaining - step >= self.remaining;
            if self.remaining <= step || stalled {
                covered += self.remaining;
                if let Some(run) = run.as_deref_mut() {
                    run.push(self.p1);
                }
                if self.next_index >= self.points.len() {
                    return true;
                }
                self.p0 = self.p1;
                self.p1 = self.points[self.next_index];
                self.next_index += 1;
                self.remaining = self.p0.0.distance(self.p1.0);
            } else {
                let t = step / self.remaining;
                self.p0 = (self.p0.0.lerp(self.p1.0, t), PointFlags::empty());
                self.remaining -= step;
                if let Some(run) = run {
                    run.push(self.p0);
                }
                return false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TessellationConfig;

    fn ctx() -> TessellationContext {
        TessellationContext::new(&TessellationConfig::default())
    }

    fn run_length(contour: &Contour) -> f32 {
        contour
            .points()
            .windows(2)
            .map(|w| w[0].pos.distance(w[1].pos))
            .sum()
    }

    fn straight(len: f32) -> Contour {
        Contour::from_points(&[Point::ZERO, Point::new(len, 0.0)], false, &ctx())
    }

    #[test]
    fn test_even_pattern_on_line() {
        let dasher = Dasher::new(&[10.0, 10.0], 0.0).unwrap();
        let runs = dasher.dash_contour(&straight(100.0), &ctx());

        // floor(L / 2d) full dashes
        assert_eq!(runs.len(), 5);
        for (i, run) in runs.iter().enumerate() {
            assert!(!run.is_closed());
            assert!((run.point(0).pos.x - 20.0 * i as f32).abs() < 1e-3);
            assert!((run_length(run) - 10.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_visible_length_is_length_minus_gaps() {
        let dasher = Dasher::new(&[10.0, 5.0], 0.0).unwrap();
        let runs = dasher.dash_contour(&straight(100.0), &ctx());
        // Dashes start at 0, 15, ..., 90: seven dashes and six gaps
        assert_eq!(runs.len(), 7);
        let visible: f32 = runs.iter().map(run_length).sum();
        assert!((visible - (100.0 - 6.0 * 5.0)).abs() < 1e-3);
    }

    #[test]
    fn test_odd_pattern_is_doubled() {
        let dasher = Dasher::new(&[5.0], 0.0).unwrap();
        assert_eq!(dasher.pattern_length(), 10.0);
        let runs = dasher.dash_contour(&straight(30.0), &ctx());
        assert_eq!(runs.len(), 3);
    }

    #[test]
    fn test_offset_shifts_phase() {
        let dasher = Dasher::new(&[10.0, 10.0], 5.0).unwrap();
        let runs = dasher.dash_contour(&straight(40.0), &ctx());
        // First dash is the remaining half of the first element
        assert!((run_length(&runs[0]) - 5.0).abs() < 1e-3);
        assert!((runs[1].point(0).pos.x - 15.0).abs() < 1e-3);

        // A negative phase starts inside the trailing gap
        let dasher = Dasher::new(&[10.0, 10.0], -5.0).unwrap();
        let runs = dasher.dash_contour(&straight(40.0), &ctx());
        assert!((runs[0].point(0).pos.x - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_closed_contour_dashes_around_corners() {
        let square = Contour::from_points(
            &[
                Point::ZERO,
                Point::new(0.0, 10.0),
                Point::new(10.0, 10.0),
                Point::new(10.0, 0.0),
            ],
            true,
            &ctx(),
        );
        let dasher = Dasher::new(&[15.0, 5.0], 0.0).unwrap();
        let runs = dasher.dash_contour(&square, &ctx());

        assert_eq!(runs.len(), 2);
        // Each dash turns one corner
        assert!(runs.iter().all(|r| r.len() == 3));
        let visible: f32 = runs.iter().map(run_length).sum();
        assert!((visible - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(Dasher::new(&[], 0.0).is_none());
        assert!(Dasher::new(&[0.0, 0.0], 0.0).is_none());
        assert!(Dasher::new(&[5.0, -1.0], 0.0).is_none());
    }

    #[test]
    fn test_short_contours_skipped() {
        let dasher = Dasher::new(&[1.0, 1.0], 0.0).unwrap();
        let single = Contour::from_points(&[Point::ZERO], false, &ctx());
        assert!(dasher.dash_contour(&single, &ctx()).is_empty());
    }

    #[test]
    fn test_tiny_steps_far_from_origin_terminate() {
        let far = Contour::from_points(
            &[Point::new(4096.0, 0.0), Point::new(4106.0, 0.0)],
            false,
            &ctx(),
        );
        let dasher = Dasher::new(&[1e-4, 1e-4], 0.0).unwrap();
        let runs = dasher.dash_contour(&far, &ctx());

        // Dashes below the distance tolerance collapse and are dropped
        assert!(runs.iter().all(|r| r.len() >= 2 && !r.is_closed()));
    }

    #[test]
    fn test_stalled_step_consumes_segment() {
        let points = [
            (Point::new(4096.0, 0.0), PointFlags::CORNER),
            (Point::new(4106.0, 0.0), PointFlags::CORNER),
        ];
        let mut walk = Walk {
            points: &points,
            next_index: 2,
            p0: points[0],
            p1: points[1],
            remaining: 10.0,
        };
        assert!(!walk.advance(4.0, None));
        assert!((walk.remaining - 6.0).abs() < 1e-4);
        assert!(walk.advance(1e-9, None));
    }

    #[test]
    fn test_dense_pattern_falls_back_to_solid() {
        let dasher = Dasher::new(&[1e-4, 1e-4], 0.0).unwrap();
        let runs = dasher.dash_contour(&straight(1000.0), &ctx());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 2);
    }
}
