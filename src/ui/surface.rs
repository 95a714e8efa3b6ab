/// Drawing surface abstraction.
///
/// The game draws into any `Surface` in world pixels, already shifted by the
/// camera. The terminal renderer is one implementation; tests use a
/// recording one.

use crate::domain::geom::Rect;

/// What a filled rectangle represents. The surface picks actual colors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Shade {
    Wall,
    Space,
    Player,
    Shadow, // landing marker under an airborne player
}

pub trait Surface {
    /// Drawable area in pixels.
    fn size(&self) -> (u32, u32);

    fn fill_rect(&mut self, rect: Rect, shade: Shade);

    /// One line of status text at text row `line` (0 = first line below the map).
    fn put_text(&mut self, line: usize, text: &str);
}

#[cfg(test)]
pub mod recording {
    use super::*;

    /// Records every call for assertions.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub width: u32,
        pub height: u32,
        pub rects: Vec<(Rect, Shade)>,
        pub lines: Vec<(usize, String)>,
    }

    impl RecordingSurface {
        pub fn new(width: u32, height: u32) -> Self {
            RecordingSurface { width, height, ..Default::default() }
        }

        pub fn count(&self, shade: Shade) -> usize {
            self.rects.iter().filter(|(_, s)| *s == shade).count()
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn fill_rect(&mut self, rect: Rect, shade: Shade) {
            self.rects.push((rect, shade));
        }

        fn put_text(&mut self, line: usize, text: &str) {
            self.lines.push((line, text.to_string()));
        }
    }
}
