use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::generator::Problem;
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    TryAgain,
}

/// The prompt and numbered options for the problem on screen.
pub struct QuizCard<'a> {
    problem: &'a Problem,
    hinted: Option<usize>,
    feedback: Option<Feedback>,
    theme: &'a Theme,
}

impl<'a> QuizCard<'a> {
    pub fn new(problem: &'a Problem, theme: &'a Theme) -> Self {
        Self {
            problem,
            hinted: None,
            feedback: None,
            theme,
        }
    }

    pub fn hinted(mut self, index: Option<usize>) -> Self {
        self.hinted = index;
        self
    }

    pub fn feedback(mut self, feedback: Option<Feedback>) -> Self {
        self.feedback = feedback;
        self
    }

    fn lines(&self) -> Vec<Line<'a>> {
        let colors = &self.theme.colors;
        let mut lines = vec![
            Line::from(Span::styled(
                self.problem.prompt.as_str(),
                Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];

        for (i, option) in self.problem.options.iter().enumerate() {
            let ruled_out = self.hinted == Some(i);
            let style = if ruled_out {
                Style::default()
                    .fg(colors.hint())
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(colors.accent())
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  [{}] ", i + 1), Style::default().fg(colors.fg())),
                Span::styled(option.as_str(), style),
            ]));
        }

        if let Some(feedback) = self.feedback {
            let (text, color) = match feedback {
                Feedback::Correct => ("Great job! A new seed for your garden.", colors.success()),
                Feedback::TryAgain => ("Not quite. Try again!", colors.warning()),
            };
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(text, Style::default().fg(color))));
        }
        lines
    }
}

impl Widget for QuizCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));

        Paragraph::new(self.lines())
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> Problem {
        Problem {
            prompt: "Which word matches: \"a baby plant\"".to_string(),
            options: vec!["seed".into(), "sprout".into(), "root".into()],
            answer: "sprout".to_string(),
            equation: None,
        }
    }

    fn rendered(card: QuizCard<'_>) -> Vec<String> {
        let area = Rect::new(0, 0, 50, 10);
        let mut buf = Buffer::empty(area);
        card.render(area, &mut buf);
        (0..area.height)
            .map(|y| (0..area.width).map(|x| buf[(x, y)].symbol().to_string()).collect())
            .collect()
    }

    #[test]
    fn renders_numbered_options() {
        let theme = Theme::default();
        let problem = problem();
        let rows = rendered(QuizCard::new(&problem, &theme));
        assert!(rows.iter().any(|r| r.contains("[1] seed")));
        assert!(rows.iter().any(|r| r.contains("[3] root")));
    }

    #[test]
    fn feedback_line_follows_options() {
        let theme = Theme::default();
        let problem = problem();
        let rows = rendered(QuizCard::new(&problem, &theme).feedback(Some(Feedback::TryAgain)));
        assert!(rows.iter().any(|r| r.contains("Try again")));
    }
}
