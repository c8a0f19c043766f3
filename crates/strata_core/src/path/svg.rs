//! SVG path data (`d` attribute) parsing

use super::Path;
use crate::error::{Error, Result};
use crate::geometry::{Point, Vec2};

pub(super) fn parse(data: &str) -> Result<Path> {
    let mut parser = Parser { src: data, pos: 0 };
    let mut path = Path::new();
    let mut previous: Option<char> = None;

    loop {
        parser.skip_separators();
        let Some(c) = parser.peek_char() else {
            break;
        };
        let offset = parser.pos;

        if previous.is_none() && c != 'M' && c != 'm' {
            return Err(Error::MissingMoveTo(c));
        }
        if !c.is_ascii_alphabetic() {
            return Err(Error::UnexpectedCharacter {
                character: c,
                offset,
            });
        }
        parser.pos += 1;

        let mut command = c;
        loop {
            parser.apply(&mut path, command, previous)?;
            previous = Some(command);
            if command.eq_ignore_ascii_case(&'z') || !parser.at_number() {
                break;
            }
            // Extra coordinate pairs after a move are implicit lines
            command = match command {
                'M' => 'L',
                'm' => 'l',
                other => other,
            };
        }
    }

    Ok(path)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn at_number(&mut self) -> bool {
        self.skip_separators();
        matches!(self.peek(), Some(b'0'..=b'9' | b'+' | b'-' | b'.'))
    }

    fn expect_argument(&mut self, command: char) -> Result<()> {
        self.skip_separators();
        match self.peek_char() {
            None => Err(Error::UnexpectedEnd(command)),
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => Ok(()),
            Some(c) => Err(Error::UnexpectedCharacter {
                character: c,
                offset: self.pos,
            }),
        }
    }

    fn digits(&mut self) -> usize {
        let start = self.pos;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn number(&mut self, command: char) -> Result<f32> {
        self.expect_argument(command)?;
        let start = self.pos;

        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let mut count = self.digits();
        if self.peek() == Some(b'.') {
            self.pos += 1;
            count += self.digits();
        }
        if count == 0 {
            return Err(Error::InvalidNumber(start));
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.digits() == 0 {
                self.pos = mark;
                return Err(Error::InvalidNumber(start));
            }
        }

        self.src[start..self.pos]
            .parse::<f32>()
            .map_err(|_| Error::InvalidNumber(start))
    }

    /// Arc flags may be written without separators (`a1 1 0 01 5 5`)
    fn flag(&mut self, command: char) -> Result<bool> {
        self.expect_argument(command)?;
        match self.peek() {
            Some(b'0') => {
                self.pos += 1;
                Ok(false)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(true)
            }
            _ => Err(Error::InvalidNumber(self.pos)),
        }
    }

    fn pair(&mut self, command: char) -> Result<(f32, f32)> {
        Ok((self.number(command)?, self.number(command)?))
    }

    fn apply(&mut self, path: &mut Path, command: char, previous: Option<char>) -> Result<()> {
        match command {
            'M' => {
                let (x, y) = self.pair(command)?;
                path.move_to(x, y);
            }
            'm' => {
                let (x, y) = self.pair(command)?;
                path.move_to_rel(x, y);
            }
            'L' => {
                let (x, y) = self.pair(command)?;
                path.line_to(x, y);
            }
            'l' => {
                let (x, y) = self.pair(command)?;
                path.line_to_rel(x, y);
            }
            'H' => {
                let x = self.number(command)?;
                path.horizontal_line_to(x);
            }
            'h' => {
                let dx = self.number(command)?;
                path.horizontal_line_to_rel(dx);
            }
            'V' => {
                let y = self.number(command)?;
                path.vertical_line_to(y);
            }
            'v' => {
                let dy = self.number(command)?;
                path.vertical_line_to_rel(dy);
            }
            'C' | 'c' => {
                let (x1, y1) = self.pair(command)?;
                let (x2, y2) = self.pair(command)?;
                let (x, y) = self.pair(command)?;
                if command == 'C' {
                    path.cubic_to(x1, y1, x2, y2, x, y);
                } else {
                    path.cubic_to_rel(x1, y1, x2, y2, x, y);
                }
            }
            'S' | 's' => {
                let (x2, y2) = self.pair(command)?;
                let (x, y) = self.pair(command)?;
                let follows_cubic = matches!(previous, Some('C' | 'c' | 'S' | 's'));
                let cur = path.current_point();
                match (command == 'S', follows_cubic) {
                    (true, true) => path.smooth_cubic_to(x2, y2, x, y),
                    (false, true) => path.smooth_cubic_to_rel(x2, y2, x, y),
                    (true, false) => path.cubic_to(cur.x, cur.y, x2, y2, x, y),
                    (false, false) => path.cubic_to_rel(0.0, 0.0, x2, y2, x, y),
                };
            }
            'Q' => {
                let (cx, cy) = self.pair(command)?;
                let (x, y) = self.pair(command)?;
                path.quad_to(cx, cy, x, y);
            }
            'q' => {
                let (cx, cy) = self.pair(command)?;
                let (x, y) = self.pair(command)?;
                path.quad_to_rel(cx, cy, x, y);
            }
            'T' | 't' => {
                let (x, y) = self.pair(command)?;
                let follows_quad = matches!(previous, Some('Q' | 'q' | 'T' | 't'));
                let cur = path.current_point();
                match (command == 'T', follows_quad) {
                    (true, true) => path.smooth_quad_to(x, y),
                    (false, true) => path.smooth_quad_to_rel(x, y),
                    (true, false) => path.quad_to(cur.x, cur.y, x, y),
                    (false, false) => path.quad_to_rel(0.0, 0.0, x, y),
                };
            }
            'A' | 'a' => {
                let (rx, ry) = self.pair(command)?;
                let rotation = self.number(command)?;
                let large_arc = self.flag(command)?;
                let sweep = self.flag(command)?;
                let (x, y) = self.pair(command)?;
                let radii = Vec2::new(rx, ry);
                if command == 'A' {
                    path.svg_arc_to(radii, rotation, large_arc, sweep, Point::new(x, y));
                } else {
                    path.svg_arc_to_rel(radii, rotation, large_arc, sweep, Vec2::new(x, y));
                }
            }
            'Z' | 'z' => {
                path.close();
            }
            other => {
                return Err(Error::UnexpectedCharacter {
                    character: other,
                    offset: self.pos - 1,
                });
            }
        }
        Ok(())
    }
}
