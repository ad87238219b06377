use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Wide,   // >=60 cols: quiz card + garden bar
    Narrow, // <60 cols: quiz card only, short key hints
}

impl LayoutTier {
    pub fn from_area(area: Rect) -> Self {
        if area.width >= 60 {
            LayoutTier::Wide
        } else {
            LayoutTier::Narrow
        }
    }

    pub fn show_garden_bar(&self, height: u16) -> bool {
        height >= 16 && *self == LayoutTier::Wide
    }

    pub fn key_hints(&self) -> &'static str {
        match self {
            LayoutTier::Wide => {
                "[1-3] answer  [h] hint  [n] skip  [m/t/d] mode/theme/difficulty  [r] reset  [q] quit"
            }
            LayoutTier::Narrow => "[1-3] [h]int [n]ext [q]uit",
        }
    }
}

pub struct AppLayout {
    pub header: Rect,
    pub main: Rect,
    pub garden: Option<Rect>,
    pub footer: Rect,
    pub tier: LayoutTier,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let tier = LayoutTier::from_area(area);
        let garden_height = if tier.show_garden_bar(area.height) { 3 } else { 0 };

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(garden_height),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            header: vertical[0],
            main: vertical[1],
            garden: (garden_height > 0).then_some(vertical[2]),
            footer: vertical[3],
            tier,
        }
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 40;
    const MIN_POPUP_HEIGHT: u16 = 12;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}
