//! # Text rendering for the PCD8544
//!
//! Characters are placed at a text row (one 8 pixel bank) and a pixel column. Each
//! character is the 5 column glyph from [`font`](crate::font) plus one empty spacing
//! column. Double size stretches every glyph column over two banks and sends it twice,
//! so a double size character is 12 columns wide and 16 pixels high.
//!
//! Nothing wraps to the next line. Whatever would land right of column 83 is dropped,
//! and a string stops at the first character that would start past the right edge.
use core::convert::TryFrom;
use core::fmt::Error as FmtError;
use core::fmt::Result as FmtResult;
use core::fmt::Write;

use hal::digital::v2::OutputPin;

use crate::{
    backend::PCD8544Backend,
    display::{Error, PCD8544},
    font::{glyph_for, GLYPH_WIDTH},
    ROWS, WIDTH,
};

const SPACING: u8 = 0x00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TextSize {
    /// 6x8 pixel cells
    Normal = 1,
    /// 12x16 pixel cells spanning two rows
    Double = 2,
}

impl TextSize {
    pub fn factor(self) -> u8 {
        self as u8
    }

    /// Columns one character cell takes, spacing included.
    pub fn stride(self) -> u8 {
        (GLYPH_WIDTH + 1) * self.factor()
    }
}

impl TryFrom<u8> for TextSize {
    type Error = u8;

    fn try_from(factor: u8) -> Result<Self, u8> {
        match factor {
            1 => Ok(TextSize::Normal),
            2 => Ok(TextSize::Double),
            other => Err(other),
        }
    }
}

/// Stretches one half of a pixel column over a whole byte, for double height text.
///
/// The column is split into four 2-bit pairs, top first. `half` 0 takes pairs 0 and 1,
/// `half` 1 takes pairs 2 and 3. Each bit of a taken pair is doubled, so each pair
/// fills one nibble of the result: the first pair the low (upper on screen) nibble,
/// the second pair the high one.
pub fn stretch_column(column: u8, half: u8) -> u8 {
    let mut stretched = 0;
    for slot in 0..2 {
        let pair = (column >> (4 * half + 2 * slot)) & 0b11;
        let nibble = (pair & 0b01) * 0b0011 | (pair & 0b10) * 0b0110;
        stretched |= nibble << (4 * slot);
    }
    stretched
}

impl<Backend, RST> PCD8544<Backend, RST>
where
    Backend: PCD8544Backend,
    RST: OutputPin,
{
    /// Draws one character with its top-left corner at (`row`, `col`).
    ///
    /// Out of range positions draw nothing, characters outside 0x20..=0x7f draw as
    /// `?`, and columns past the right edge are cut off.
    pub fn render_char(
        &mut self,
        row: u8,
        col: u8,
        c: char,
        size: TextSize,
    ) -> Result<(), Error<Backend, RST>> {
        if row >= ROWS || col >= WIDTH {
            return Ok(());
        }
        let glyph = glyph_for(c);
        let factor = size.factor();

        for half in 0..factor {
            self.set_cursor(row + half, col)?;
            let mut x = col;
            for &column in glyph.iter() {
                let column = match size {
                    TextSize::Normal => column,
                    TextSize::Double => stretch_column(column, half),
                };
                self.emit_clipped(&mut x, column, factor)?;
            }
            self.emit_clipped(&mut x, SPACING, factor)?;
        }
        Ok(())
    }

    /// Draws `text` left to right starting at (`row`, `col`), one cell stride per
    /// character, stopping once the next character would start past the right edge.
    pub fn render_string(
        &mut self,
        row: u8,
        col: u8,
        text: &str,
        size: TextSize,
    ) -> Result<(), Error<Backend, RST>> {
        let stride = u16::from(size.stride());
        let mut x = u16::from(col);
        for c in text.chars() {
            if x >= u16::from(WIDTH) {
                break;
            }
            // x < WIDTH, fits
            self.render_char(row, x as u8, c, size)?;
            x += stride;
        }
        Ok(())
    }

    /// A `core::fmt::Write` cursor starting at (`row`, `col`), so `write!` can render
    /// formatted values.
    pub fn writer(&mut self, row: u8, col: u8, size: TextSize) -> TextWriter<'_, Backend, RST> {
        TextWriter {
            display: self,
            row,
            col: u16::from(col),
            size,
        }
    }

    // sends `value` up to `repeat` times, never at or past the right edge
    fn emit_clipped(
        &mut self,
        x: &mut u8,
        value: u8,
        repeat: u8,
    ) -> Result<(), Error<Backend, RST>> {
        for _ in 0..repeat {
            if *x < WIDTH {
                Self::bus(self.backend.send_data(value))?;
                *x += 1;
            }
        }
        Ok(())
    }
}

/// Text cursor over a [`PCD8544`], see [`PCD8544::writer`].
///
/// `\r` returns to column 0, `\n` moves one text line (one or two rows, by size) down
/// and to column 0. Anything past the right edge is dropped silently.
pub struct TextWriter<'a, Backend, RST> {
    display: &'a mut PCD8544<Backend, RST>,
    row: u8,
    col: u16,
    size: TextSize,
}

impl<'a, Backend, RST> TextWriter<'a, Backend, RST> {
    /// Current (row, column) of the cursor. The column may lie past the right edge.
    pub fn position(&self) -> (u8, u16) {
        (self.row, self.col)
    }
}

impl<'a, Backend, RST> Write for TextWriter<'a, Backend, RST>
where
    Backend: PCD8544Backend,
    RST: OutputPin,
{
    fn write_str(&mut self, s: &str) -> FmtResult {
        for c in s.chars() {
            match c {
                '\r' => self.col = 0,
                '\n' => {
                    self.col = 0;
                    self.row = self.row.saturating_add(self.size.factor());
                }
                _ => {
                    if self.col < u16::from(WIDTH) {
                        self.display
                            .render_char(self.row, self.col as u8, c, self.size)
                            .map_err(|_| FmtError)?;
                    }
                    self.col = self.col.saturating_add(u16::from(self.size.stride()));
                }
            }
        }
        Ok(())
    }
}
