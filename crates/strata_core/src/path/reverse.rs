//! Subpath normalization and reversal

use smallvec::SmallVec;

use super::PathCommand;
use crate::geometry::{Point, Winding};

#[derive(Clone, Copy, Debug)]
enum Segment {
    Line(Point),
    Cubic(Point, Point, Point),
}

impl Segment {
    fn end(&self) -> Point {
        match *self {
            Segment::Line(p) | Segment::Cubic(_, _, p) => p,
        }
    }
}

/// One subpath in `[MoveTo, segments.., Winding?, Close?]` form
#[derive(Debug, Default)]
struct Subpath {
    start: Point,
    segments: SmallVec<[Segment; 8]>,
    winding: Option<Winding>,
    closed: bool,
}

impl Subpath {
    fn starting_at(start: Point) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }

    fn emit(&self, out: &mut Vec<PathCommand>) {
        out.push(PathCommand::MoveTo(self.start));
        out.extend(self.segments.iter().map(|s| match *s {
            Segment::Line(p) => PathCommand::LineTo(p),
            Segment::Cubic(control1, control2, end) => PathCommand::CubicTo {
                control1,
                control2,
                end,
            },
        }));
        self.emit_tail(out);
    }

    fn emit_reversed(&self, out: &mut Vec<PathCommand>) {
        let end = self.segments.last().map_or(self.start, Segment::end);
        out.push(PathCommand::MoveTo(end));
        for (i, segment) in self.segments.iter().enumerate().rev() {
            let from = if i == 0 {
                self.start
            } else {
                self.segments[i - 1].end()
            };
            out.push(match *segment {
                Segment::Line(_) => PathCommand::LineTo(from),
                Segment::Cubic(c1, c2, _) => PathCommand::CubicTo {
                    control1: c2,
                    control2: c1,
                    end: from,
                },
            });
        }
        self.emit_tail(out);
    }

    fn emit_tail(&self, out: &mut Vec<PathCommand>) {
        if let Some(winding) = self.winding {
            out.push(PathCommand::Winding(winding));
        }
        if self.closed {
            out.push(PathCommand::Close);
        }
    }
}

/// Group commands into normalized subpaths
///
/// Consecutive moves collapse into the last one, and winding/close markers
/// move to the end of their subpath.
fn subpaths(commands: &[PathCommand]) -> Vec<Subpath> {
    let mut out = Vec::new();
    let mut current: Option<Subpath> = None;

    for command in commands {
        match *command {
            PathCommand::MoveTo(p) => match current.as_mut() {
                Some(sub) if sub.segments.is_empty() => sub.start = p,
                _ => {
                    out.extend(current.take());
                    current = Some(Subpath::starting_at(p));
                }
            },
            PathCommand::LineTo(p) => current
                .get_or_insert_with(Subpath::default)
                .segments
                .push(Segment::Line(p)),
            PathCommand::CubicTo {
                control1,
                control2,
                end,
            } => current
                .get_or_insert_with(Subpath::default)
                .segments
                .push(Segment::Cubic(control1, control2, end)),
            PathCommand::Close => current.get_or_insert_with(Subpath::default).closed = true,
            PathCommand::Winding(w) => {
                current.get_or_insert_with(Subpath::default).winding = Some(w);
            }
        }
    }

    out.extend(current);
    out
}

/// Commands in normalized form
#[cfg(test)]
pub(super) fn normalized(commands: &[PathCommand]) -> Vec<PathCommand> {
    let mut out = Vec::with_capacity(commands.len());
    for sub in subpaths(commands) {
        sub.emit(&mut out);
    }
    out
}

/// Normalized commands with every subpath reversed
pub(super) fn reversed(commands: &[PathCommand]) -> Vec<PathCommand> {
    let mut out = Vec::with_capacity(commands.len());
    for sub in subpaths(commands) {
        sub.emit_reversed(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::path::Path;

    #[test]
    fn test_reverse_line_path() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(1.0, 0.0).line_to(1.0, 1.0);
        path.reverse();

        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(Point::new(1.0, 1.0)),
                PathCommand::LineTo(Point::new(1.0, 0.0)),
                PathCommand::LineTo(Point::new(0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn test_reverse_swaps_cubic_controls() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).cubic_to(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        path.reverse();

        assert_eq!(
            path.commands()[1],
            PathCommand::CubicTo {
                control1: Point::new(3.0, 4.0),
                control2: Point::new(1.0, 2.0),
                end: Point::new(0.0, 0.0),
            }
        );
    }

    #[test]
    fn test_normalize_moves_markers_to_end() {
        let commands = vec![
            PathCommand::MoveTo(Point::new(9.0, 9.0)),
            PathCommand::MoveTo(Point::new(0.0, 0.0)),
            PathCommand::Winding(Winding::Clockwise),
            PathCommand::LineTo(Point::new(1.0, 0.0)),
            PathCommand::Close,
            PathCommand::LineTo(Point::new(1.0, 1.0)),
        ];
        assert_eq!(
            normalized(&commands),
            vec![
                PathCommand::MoveTo(Point::new(0.0, 0.0)),
                PathCommand::LineTo(Point::new(1.0, 0.0)),
                PathCommand::LineTo(Point::new(1.0, 1.0)),
                PathCommand::Winding(Winding::Clockwise),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn test_reverse_twice_reproduces_normalized() {
        let mut path = Path::new();
        path.move_to(3.0, 3.0)
            .move_to(0.0, 0.0)
            .line_to(10.0, 0.0)
            .cubic_to(12.0, 2.0, 12.0, 8.0, 10.0, 10.0)
            .winding(Winding::CounterClockwise)
            .close()
            .rect(Rect::new(20.0, 20.0, 5.0, 5.0))
            .ellipse(40.0, 40.0, 3.0, 2.0);

        let expected = normalized(path.commands());
        path.reverse();
        assert_ne!(path.commands(), expected.as_slice());
        path.reverse();
        assert_eq!(path.commands(), expected.as_slice());
    }

    #[test]
    fn test_reverse_empty_path() {
        let mut path = Path::new();
        path.reverse();
        assert!(path.is_empty());
    }
}
