use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{ImageError, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use log::debug;
use std::fmt;
use std::path::Path;

use crate::puzzle::{Puzzle, PuzzleError};
use crate::types::Assignment;

/// How a blocked cell is drawn.
pub const BLOCK: char = '█';

/// The side length of a cell in an exported image, in pixels.
pub const CELL_SIZE: u32 = 100;

/// The width of the dark border around each cell in an exported image.
pub const CELL_BORDER: u32 = 2;

/// Letters come from 8x8 bitmaps, with each bit drawn as a square this many pixels wide.
const GLYPH_SCALE: u32 = 8;
const GLYPH_BITS: u32 = 8;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug)]
pub enum ImageExportError {
    Puzzle(PuzzleError),
    TooLarge { width: usize, height: usize },
    Image(ImageError),
}

impl fmt::Display for ImageExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageExportError::Puzzle(error) => write!(f, "{error}"),
            ImageExportError::TooLarge { width, height } => {
                write!(f, "A {width}x{height} grid is too large to draw")
            }
            ImageExportError::Image(error) => write!(f, "Couldn’t write image: {error}"),
        }
    }
}

impl std::error::Error for ImageExportError {}

impl From<PuzzleError> for ImageExportError {
    fn from(error: PuzzleError) -> Self {
        ImageExportError::Puzzle(error)
    }
}

impl From<ImageError> for ImageExportError {
    fn from(error: ImageError) -> Self {
        ImageExportError::Image(error)
    }
}

/// Turn the given puzzle and (possibly partial) assignment into a rendered string, one line per
/// row. Open cells that no assigned word covers are drawn as spaces.
pub fn render_grid(puzzle: &Puzzle, assignment: &Assignment) -> Result<String, PuzzleError> {
    let letters = puzzle.letter_grid(assignment)?;

    Ok(letters
        .iter()
        .enumerate()
        .map(|(row, line)| {
            line.iter()
                .enumerate()
                .map(|(col, cell)| {
                    if puzzle.is_open((row, col)) {
                        cell.unwrap_or(' ')
                    } else {
                        BLOCK
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

/// A square of the given size at the given pixel coords, if imageproc can address it.
fn square(x: u32, y: u32, size: u32) -> Option<Rect> {
    Some(Rect::at(i32::try_from(x).ok()?, i32::try_from(y).ok()?).of_size(size, size))
}

/// Draw the given puzzle and (possibly partial) assignment as an image: a black canvas with a
/// white square for each open cell and its letter, if any, drawn in black in the middle.
pub fn render_image(
    puzzle: &Puzzle,
    assignment: &Assignment,
) -> Result<RgbaImage, ImageExportError> {
    let letters = puzzle.letter_grid(assignment)?;

    let too_large = || ImageExportError::TooLarge {
        width: puzzle.width,
        height: puzzle.height,
    };
    let to_pixels = |cells: usize| {
        u32::try_from(cells)
            .ok()
            .and_then(|cells| cells.checked_mul(CELL_SIZE))
            .filter(|&pixels| i32::try_from(pixels).is_ok())
    };
    let image_width = to_pixels(puzzle.width).ok_or_else(too_large)?;
    let image_height = to_pixels(puzzle.height).ok_or_else(too_large)?;

    let mut image = RgbaImage::from_pixel(image_width, image_height, BLACK);
    let interior_size = CELL_SIZE - 2 * CELL_BORDER;
    let inset = (interior_size - GLYPH_BITS * GLYPH_SCALE) / 2;

    for (row, (line, open_cells)) in (0u32..).zip(letters.iter().zip(puzzle.structure())) {
        for (col, (letter, &open)) in (0u32..).zip(line.iter().zip(open_cells)) {
            if !open {
                continue;
            }

            let left = col * CELL_SIZE + CELL_BORDER;
            let top = row * CELL_SIZE + CELL_BORDER;
            draw_filled_rect_mut(
                &mut image,
                square(left, top, interior_size).ok_or_else(too_large)?,
                WHITE,
            );

            let Some(glyph) = *letter else {
                continue;
            };
            let Some(bitmap) = BASIC_FONTS.get(glyph).or_else(|| LATIN_FONTS.get(glyph)) else {
                debug!("no bitmap for {glyph:?}, leaving its cell blank");
                continue;
            };

            for (bit_row, bits) in (0u32..).zip(bitmap) {
                for bit in 0..GLYPH_BITS {
                    // The lowest bit is the leftmost pixel.
                    if bits & (1 << bit) == 0 {
                        continue;
                    }
                    let pixel = square(
                        left + inset + bit * GLYPH_SCALE,
                        top + inset + bit_row * GLYPH_SCALE,
                        GLYPH_SCALE,
                    )
                    .ok_or_else(too_large)?;
                    draw_filled_rect_mut(&mut image, pixel, BLACK);
                }
            }
        }
    }

    Ok(image)
}

/// Draw the puzzle with `render_image` and write it to `path`. The format is picked from the
/// path's extension.
pub fn save_image(
    puzzle: &Puzzle,
    assignment: &Assignment,
    path: impl AsRef<Path>,
) -> Result<(), ImageExportError> {
    render_image(puzzle, assignment)?.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use crate::puzzle::{Direction, Puzzle, PuzzleError, Variable};
    use crate::render::{
        render_grid, render_image, save_image, ImageExportError, CELL_BORDER, CELL_SIZE,
    };
    use crate::types::Assignment;
    use crate::word_list::WordList;

    const STRUCTURE: &str = "
#___#
#_##_
#____
#_##_
";

    fn puzzle() -> Puzzle {
        Puzzle::from_structure_str(STRUCTURE, WordList::from_words(&[])).unwrap()
    }

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn complete_fill() -> Assignment {
        [
            (Variable::new(0, 1, Direction::Across, 3), "CAT".to_string()),
            (Variable::new(0, 1, Direction::Down, 4), "CODE".to_string()),
            (Variable::new(2, 1, Direction::Across, 4), "DIME".to_string()),
            (Variable::new(1, 4, Direction::Down, 3), "RED".to_string()),
        ]
        .into_iter()
        .collect()
    }

    /// How many black pixels are inside the white interior of the given cell.
    fn dark_pixels_in_cell(image: &RgbaImage, row: u32, col: u32) -> usize {
        let interior = (CELL_BORDER..CELL_SIZE - CELL_BORDER).flat_map(|dy| {
            (CELL_BORDER..CELL_SIZE - CELL_BORDER).map(move |dx| (dx, dy))
        });
        interior
            .filter(|&(dx, dy)| {
                *image.get_pixel(col * CELL_SIZE + dx, row * CELL_SIZE + dy) == BLACK
            })
            .count()
    }

    #[test]
    fn test_render_complete_fill() {
        assert_eq!(
            render_grid(&puzzle(), &complete_fill()).unwrap(),
            "█CAT█\n█O██R\n█DIME\n█E██D"
        );
    }

    #[test]
    fn test_render_empty_assignment() {
        assert_eq!(
            render_grid(&puzzle(), &Assignment::new()).unwrap(),
            "█   █\n█ ██ \n█    \n█ ██ "
        );
    }

    #[test]
    fn test_render_keeps_lone_open_cells() {
        // The open cell in the corner isn't part of any slot, but it's still not a block.
        let puzzle = Puzzle::from_structure_str("__\n#_\n_#", WordList::from_words(&[])).unwrap();

        assert_eq!(
            render_grid(&puzzle, &Assignment::new()).unwrap(),
            "  \n█ \n █"
        );
    }

    #[test]
    fn test_render_rejects_foreign_slots() {
        let stranger = Variable::new(3, 0, Direction::Across, 2);
        let assignment: Assignment = [(stranger, "AB".to_string())].into_iter().collect();

        assert_eq!(
            render_grid(&puzzle(), &assignment).unwrap_err(),
            PuzzleError::UnknownVariable(stranger)
        );
    }

    #[test]
    fn test_image_has_a_square_per_cell() {
        let image = render_image(&puzzle(), &complete_fill()).unwrap();

        assert_eq!(image.dimensions(), (5 * CELL_SIZE, 4 * CELL_SIZE));
    }

    #[test]
    fn test_image_blocks_and_open_cells_differ() {
        let image = render_image(&puzzle(), &Assignment::new()).unwrap();
        let center = CELL_SIZE / 2;

        // (0, 0) is a block and (0, 1) is open.
        assert_eq!(*image.get_pixel(center, center), BLACK);
        assert_eq!(*image.get_pixel(CELL_SIZE + center, center), WHITE);
        assert_ne!(
            image.get_pixel(center, center),
            image.get_pixel(CELL_SIZE + center, center)
        );

        // Open cells keep a dark border.
        assert_eq!(*image.get_pixel(CELL_SIZE, 0), BLACK);
        assert_eq!(*image.get_pixel(CELL_SIZE + CELL_BORDER, CELL_BORDER), WHITE);

        // Nothing is drawn inside an open cell until it has a letter.
        assert_eq!(dark_pixels_in_cell(&image, 0, 1), 0);
    }

    #[test]
    fn test_image_draws_letters() {
        let filled = render_image(&puzzle(), &complete_fill()).unwrap();

        for (row, col) in [(0, 1), (0, 2), (0, 3), (2, 4), (3, 1)] {
            assert!(
                dark_pixels_in_cell(&filled, row, col) > 0,
                "cell ({row}, {col}) should have a letter"
            );
        }

        // Different letters look different.
        let cell_pixels = |row: u32, col: u32| -> Vec<Rgba<u8>> {
            (0..CELL_SIZE)
                .flat_map(|dy| (0..CELL_SIZE).map(move |dx| (dx, dy)))
                .map(|(dx, dy)| *filled.get_pixel(col * CELL_SIZE + dx, row * CELL_SIZE + dy))
                .collect()
        };
        assert_ne!(cell_pixels(0, 1), cell_pixels(0, 2));
    }

    #[test]
    fn test_image_rejects_foreign_slots() {
        let stranger = Variable::new(3, 0, Direction::Across, 2);
        let assignment: Assignment = [(stranger, "AB".to_string())].into_iter().collect();

        assert!(matches!(
            render_image(&puzzle(), &assignment),
            Err(ImageExportError::Puzzle(PuzzleError::UnknownVariable(variable)))
                if variable == stranger
        ));
    }

    #[test]
    fn test_save_image_writes_png() {
        let puzzle = puzzle();
        let assignment = complete_fill();
        let path = std::env::temp_dir().join(format!(
            "crossword_csp_render_{}.png",
            std::process::id()
        ));

        save_image(&puzzle, &assignment, &path).unwrap();
        let saved = image::open(&path).unwrap().to_rgba8();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(saved, render_image(&puzzle, &assignment).unwrap());
    }
}
