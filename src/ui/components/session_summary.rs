use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::store::schema::ProgressRecord;
use crate::ui::theme::Theme;

/// Shown once the parent's time limit has ended the session.
pub struct SessionSummary<'a> {
    pub stats: &'a ProgressRecord,
    pub garden: u32,
    pub theme: &'a Theme,
}

impl<'a> SessionSummary<'a> {
    pub fn new(stats: &'a ProgressRecord, garden: u32, theme: &'a Theme) -> Self {
        Self {
            stats,
            garden,
            theme,
        }
    }
}

impl Widget for SessionSummary<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Time for a break! ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        Paragraph::new(Line::from(Span::styled(
            "Your garden grew today",
            Style::default()
                .fg(colors.accent())
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(layout[0], buf);

        let rows = [
            ("  Plants grown: ", self.garden.to_string()),
            (
                "  Correct:      ",
                format!(
                    "{}/{} ({:.0}%)",
                    self.stats.total_correct_answers,
                    self.stats.total_questions_answered,
                    self.stats.accuracy()
                ),
            ),
            ("  Best streak:  ", self.stats.streak_best.to_string()),
        ];
        for (row, (label, value)) in rows.into_iter().enumerate() {
            Paragraph::new(Line::from(vec![
                Span::styled(label, Style::default().fg(colors.fg())),
                Span::styled(value, Style::default().fg(colors.success())),
            ]))
            .render(layout[row + 1], buf);
        }

        Paragraph::new(Line::from(Span::styled(
            "  [q] Quit",
            Style::default().fg(colors.accent()),
        )))
        .render(layout[5], buf);
    }
}
