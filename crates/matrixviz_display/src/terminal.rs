//! Terminal Matrix Emulation
//!
//! Shows the matrix in a truecolor terminal using crossterm. Each terminal
//! cell carries two matrix rows: the upper half block glyph is painted with
//! the upper pixel as foreground and the lower pixel as background.
//!
//! Only cells whose colors changed since the previous frame are redrawn.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{debug, warn};

use crate::canvas::{Canvas, MatrixDisplay};
use crate::error::DisplayResult;
use crate::framebuffer::FrameBuffer;
use crate::pixel::Rgb;

const HALF_BLOCK: char = '\u{2580}';

pub struct TerminalDisplay<W: Write = Stdout> {
    out: W,
    frame: FrameBuffer,
    /// Last (upper, lower) pair drawn into each terminal cell
    shown: Vec<Option<(Rgb, Rgb)>>,
    alternate_screen: bool,
}

impl TerminalDisplay<Stdout> {
    /// Take over the terminal (alternate screen, hidden cursor)
    pub fn open(width: usize, height: usize) -> DisplayResult<Self> {
        let mut display = Self::with_writer(io::stdout(), width, height)?;
        execute!(
            display.out,
            EnterAlternateScreen,
            cursor::Hide,
            Clear(ClearType::All)
        )?;
        display.alternate_screen = true;
        debug!("Terminal matrix opened ({}x{})", width, height);
        Ok(display)
    }
}

impl<W: Write> TerminalDisplay<W> {
    /// Render into an arbitrary writer without touching terminal modes
    pub fn with_writer(out: W, width: usize, height: usize) -> DisplayResult<Self> {
        let frame = FrameBuffer::new(width, height)?;
        let cells = width * height.div_ceil(2);
        Ok(Self {
            out,
            frame,
            shown: vec![None; cells],
            alternate_screen: false,
        })
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Forget what is on screen so the next present redraws every cell
    pub fn invalidate(&mut self) {
        self.shown.fill(None);
    }

    fn draw_changed_cells(&mut self) -> io::Result<()> {
        let width = self.frame.width();
        let height = self.frame.height();

        for row in 0..height.div_ceil(2) {
            let upper_y = row * 2;
            for x in 0..width {
                let upper = self.frame.pixel(x, upper_y).unwrap_or(Rgb::BLACK);
                let lower = self.frame.pixel(x, upper_y + 1).unwrap_or(Rgb::BLACK);

                let cell = row * width + x;
                if self.shown[cell] == Some((upper, lower)) {
                    continue;
                }

                queue!(
                    self.out,
                    cursor::MoveTo(x as u16, row as u16),
                    SetForegroundColor(to_term(upper)),
                    SetBackgroundColor(to_term(lower)),
                    Print(HALF_BLOCK)
                )?;
                self.shown[cell] = Some((upper, lower));
            }
        }

        queue!(self.out, ResetColor)?;
        self.out.flush()
    }
}

fn to_term(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

impl<W: Write> Canvas for TerminalDisplay<W> {
    fn width(&self) -> usize {
        self.frame.width()
    }

    fn height(&self) -> usize {
        self.frame.height()
    }

    fn clear(&mut self) {
        self.frame.clear();
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        self.frame.set_pixel(x, y, color);
    }
}

impl<W: Write> MatrixDisplay for TerminalDisplay<W> {
    fn present(&mut self) -> DisplayResult<()> {
        self.draw_changed_cells()?;
        self.frame.present()
    }
}

impl<W: Write> Drop for TerminalDisplay<W> {
    fn drop(&mut self) {
        if self.alternate_screen {
            if let Err(e) = execute!(self.out, ResetColor, cursor::Show, LeaveAlternateScreen) {
                warn!("Failed to restore terminal: {}", e);
            }
        }
    }
}
