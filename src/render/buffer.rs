//! In-memory page recording.

use super::{DrawText, PageSink, WriterError};

#[derive(Debug, Clone, PartialEq)]
pub enum PageCommand {
    Draw(DrawText),
    NewPage,
}

/// Records draw calls so a page can be composed away from the real writer
/// and replayed into it later, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageBuffer {
    commands: Vec<PageCommand>,
}

impl PageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PageCommand] {
        &self.commands
    }

    /// Draw calls only, in issue order.
    pub fn draws(&self) -> impl Iterator<Item = &DrawText> {
        self.commands.iter().filter_map(|c| match c {
            PageCommand::Draw(d) => Some(d),
            PageCommand::NewPage => None,
        })
    }

    pub fn pages(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PageCommand::NewPage))
            .count()
    }

    /// Issue every recorded call against `sink`.
    pub fn replay_into<S: PageSink + ?Sized>(&self, sink: &mut S) -> Result<(), WriterError> {
        for command in &self.commands {
            match command {
                PageCommand::Draw(draw) => sink.draw_text(draw)?,
                PageCommand::NewPage => sink.new_page()?,
            }
        }
        Ok(())
    }
}

impl PageSink for PageBuffer {
    fn new_page(&mut self) -> Result<(), WriterError> {
        self.commands.push(PageCommand::NewPage);
        Ok(())
    }

    fn draw_text(&mut self, command: &DrawText) -> Result<(), WriterError> {
        self.commands.push(PageCommand::Draw(command.clone()));
        Ok(())
    }
}
