//! Half-block presenter: shows an RGBA frame buffer in a truecolor terminal
use std::io::{self, Write};

use crossterm::{
    cursor,
    style::{self, Colors, Print, ResetColor, SetColors, SetForegroundColor},
    terminal, QueueableCommand,
};
use raster3d_core::{Color, FrameBuffers, Presenter};

/// Upper half block. The foreground paints the top pixel, the background the bottom one.
const HALF_BLOCK: char = '▀';

const STATUS_TEXT: &str = "raster3d | WASD/Space/C=Move Arrows=Look Q=Quit";

/// Pixel viewport for a terminal of `cols` x `rows` cells
pub fn viewport_for(cols: u16, rows: u16) -> (u32, u32) {
    (u32::from(cols.max(1)), u32::from(rows.max(1)) * 2)
}

fn to_terminal(color: Color) -> style::Color {
    style::Color::Rgb {
        r: color.r,
        g: color.g,
        b: color.b,
    }
}

/// Presents each frame as rows of half-block cells, two pixel rows per cell
pub struct TerminalPresenter<W: Write> {
    out: W,
    show_status: bool,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_status: true,
        }
    }

    /// Toggle the status line drawn over the top row
    pub fn with_status(mut self, show_status: bool) -> Self {
        self.show_status = show_status;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, frame: &FrameBuffers) -> io::Result<()> {
        let rows = frame.height().div_ceil(2);
        for row in 0..rows {
            self.out.queue(cursor::MoveTo(0, row as u16))?;
            let mut current = None;
            for x in 0..frame.width() {
                let top = frame.pixel(x, row * 2).unwrap_or(Color::BLACK);
                let bottom = frame.pixel(x, row * 2 + 1).unwrap_or(Color::BLACK);
                // Only emit escape codes when the cell colors change
                if current != Some((top, bottom)) {
                    self.out
                        .queue(SetColors(Colors::new(to_terminal(top), to_terminal(bottom))))?;
                    current = Some((top, bottom));
                }
                self.out.queue(Print(HALF_BLOCK))?;
            }
        }
        self.out.queue(ResetColor)?;
        Ok(())
    }

    fn draw_status(&mut self) -> io::Result<()> {
        self.out.queue(cursor::MoveTo(0, 0))?;
        self.out.queue(SetForegroundColor(style::Color::Yellow))?;
        self.out.queue(Print(STATUS_TEXT))?;
        self.out.queue(ResetColor)?;
        Ok(())
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn present(&mut self, frame: &FrameBuffers) -> io::Result<()> {
        self.draw(frame)?;
        if self.show_status {
            self.draw_status()?;
        }
        self.out.flush()
    }

    fn viewport(&mut self) -> io::Result<Option<(u32, u32)>> {
        let (cols, rows) = terminal::size()?;
        Ok(Some(viewport_for(cols, rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(frame: &FrameBuffers) -> String {
        let mut presenter = TerminalPresenter::new(Vec::new()).with_status(false);
        presenter.present(frame).unwrap();
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn test_viewport_is_two_pixels_per_row() {
        assert_eq!(viewport_for(80, 24), (80, 48));
        assert_eq!(viewport_for(0, 0), (1, 2));
    }

    #[test]
    fn test_present_writes_one_cell_per_column_and_row_pair() {
        let frame = FrameBuffers::new(5, 4);
        let output = present(&frame);
        assert_eq!(output.matches(HALF_BLOCK).count(), 10);
    }

    #[test]
    fn test_odd_height_pads_last_row() {
        let frame = FrameBuffers::new(3, 3);
        let output = present(&frame);
        assert_eq!(output.matches(HALF_BLOCK).count(), 6);
    }

    #[test]
    fn test_colors_are_emitted_as_truecolor() {
        let mut frame = FrameBuffers::new(2, 2);
        frame.clear(Color::rgb(10, 20, 30));
        let output = present(&frame);
        // foreground and background escapes for the same color
        assert!(output.contains("38;2;10;20;30"));
        assert!(output.contains("48;2;10;20;30"));
    }

    #[test]
    fn test_uniform_row_sets_colors_once() {
        let mut frame = FrameBuffers::new(8, 2);
        frame.clear(Color::rgb(1, 2, 3));
        let output = present(&frame);
        assert_eq!(output.matches("38;2;1;2;3").count(), 1);
    }

    #[test]
    fn test_status_line_is_drawn() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.present(&FrameBuffers::new(4, 2)).unwrap();
        let output = String::from_utf8(presenter.into_inner()).unwrap();
        assert!(output.contains(STATUS_TEXT));
    }
}
