use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

use super::app::{App, CardRow, LaneColumn, Mode};

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());

    if app.lanes.is_empty() {
        render_empty(frame, app, chunks[0]);
    } else {
        let n = app.lanes.len() as u32;
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(app.lanes.iter().map(|_| Constraint::Ratio(1, n)))
            .split(chunks[0]);
        let focused = app.lane_cursor;
        for (i, lane) in app.lanes.iter_mut().enumerate() {
            render_lane(frame, lane, &app.collapsed, i == focused, columns[i]);
        }
    }

    render_status(frame, app, chunks[1]);

    match app.mode {
        Mode::Help => render_help(frame),
        Mode::ConfirmArchive => render_confirm(
            frame,
            "Archive",
            "Move all completed cards to the archive?",
        ),
        Mode::Normal => {}
    }
}

fn render_empty(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from("No lanes. Add a \"## Heading\" to the file.")];
    for err in &app.board_errors {
        lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
    }
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Board "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_lane(
    frame: &mut Frame,
    lane: &mut LaneColumn,
    collapsed: &std::collections::HashSet<String>,
    focused: bool,
    area: Rect,
) {
    let items: Vec<ListItem> = lane
        .rows
        .iter()
        .map(|row| card_item(row, collapsed.contains(&row.id)))
        .collect();

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let title = format!(" {} ({}/{}) ", lane.title, lane.done, lane.total);
    let mut list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style),
    );
    if focused {
        list = list.highlight_style(Style::default().bg(Color::DarkGray));
    }

    frame.render_stateful_widget(list, area, &mut lane.list_state);
}

fn card_item(row: &CardRow, collapsed: bool) -> ListItem<'static> {
    let indicator = match (row.has_children, collapsed) {
        (true, true) => "> ",
        (true, false) => "v ",
        (false, _) => "  ",
    };
    let (mark, mark_style, title_style) = if row.is_complete {
        (
            "[x] ",
            Style::default().fg(Color::Green),
            Style::default().fg(Color::DarkGray).crossed_out(),
        )
    } else {
        ("[ ] ", Style::default().fg(Color::Yellow), Style::default())
    };
    ListItem::new(Line::from(vec![
        Span::raw(tree_prefix(row)),
        Span::raw(indicator),
        Span::styled(mark, mark_style),
        Span::styled(row.title.clone(), title_style),
    ]))
}

/// Tree connectors for a row, built from the last-sibling flags of its
/// ancestors.
pub fn tree_prefix(row: &CardRow) -> String {
    let mut prefix = String::new();
    for d in 1..row.depth + 1 {
        if d == row.depth {
            if row.is_last_at_depth[d] {
                prefix.push_str("└── ");
            } else {
                prefix.push_str("├── ");
            }
        } else if row.is_last_at_depth[d] {
            prefix.push_str("    ");
        } else {
            prefix.push_str("│   ");
        }
    }
    prefix
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(err) = &app.error {
        Line::styled(err.clone(), Style::default().fg(Color::Red))
    } else if let Some(status) = &app.status {
        Line::styled(status.clone(), Style::default().fg(Color::Green))
    } else {
        let archived = if app.archived > 0 {
            format!("  archived: {}", app.archived)
        } else {
            String::new()
        };
        Line::styled(
            format!("?: help  q: quit{archived}"),
            Style::default().fg(Color::DarkGray),
        )
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Center a rectangle within an area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

const HELP: &[(&str, &str)] = &[
    ("j/Down  ", "Move down"),
    ("k/Up    ", "Move up"),
    ("h/Left  ", "Previous lane"),
    ("l/Right ", "Next lane"),
    ("Space   ", "Toggle complete"),
    ("z       ", "Collapse/expand"),
    ("H/L     ", "Move card to previous/next lane"),
    ("K/J     ", "Move card up/down"),
    ("a       ", "Archive completed cards"),
    ("r       ", "Reload from disk"),
    ("?       ", "Toggle help"),
    ("q/Esc   ", "Quit"),
];

/// One row per binding plus the border, shrunk to fit small terminals.
fn help_area(term: Rect) -> Rect {
    let width = 50.min(term.width.saturating_sub(4));
    let height = (HELP.len() as u16 + 2).min(term.height.saturating_sub(2));
    centered_rect(width, height, term)
}

fn render_help(frame: &mut Frame) {
    let area = help_area(frame.area());

    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let help_text: Vec<Line> = HELP
        .iter()
        .map(|(keys, what)| {
            Line::from(vec![
                Span::styled(*keys, Style::default().fg(Color::Cyan)),
                Span::raw(*what),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(help_text), inner);
}

/// Render a confirmation dialog overlay.
pub fn render_confirm(frame: &mut Frame, action: &str, message: &str) {
    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = 5.min(term.height.saturating_sub(2));
    let area = centered_rect(width, height, term);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {action} "))
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = vec![
        Line::raw(message.to_string()),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Proceed? "),
            Span::styled("y", Style::default().fg(Color::Green).bold()),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Red).bold()),
        ]),
    ];

    frame.render_widget(Paragraph::new(text), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use ratatui::backend::TestBackend;

    #[test]
    fn help_popup_fits_every_binding() {
        let area = help_area(Rect::new(0, 0, 80, 40));
        assert_eq!(area.height as usize, HELP.len() + 2);
        assert_eq!(area.width, 50);
        assert_eq!(area.x, 15);
    }

    #[test]
    fn help_popup_shrinks_on_short_terminal() {
        let area = help_area(Rect::new(0, 0, 30, 8));
        assert_eq!(area.height, 6);
        assert_eq!(area.width, 26);
        assert_eq!(area.y, 1);
    }

    #[test]
    fn tree_prefix_connectors() {
        let app = App::new(&parse("## A\n- [ ] a\n  - [ ] b\n    - [ ] c\n  - [ ] d\n"));
        let prefixes: Vec<String> = app.lanes[0].rows.iter().map(tree_prefix).collect();
        assert_eq!(prefixes, vec!["", "├── ", "│   └── ", "└── "]);
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn draws_lanes_and_cards() {
        let mut app = App::new(&parse("## To Do\n- [ ] Buy milk\n## Done\n- [x] Pay bills\n"));
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("To Do (0/1)"));
        assert!(text.contains("Done (1/1)"));
        assert!(text.contains("[ ] Buy milk"));
        assert!(text.contains("[x] Pay bills"));
    }

    #[test]
    fn help_overlay_lists_bindings() {
        let mut app = App::new(&parse("## A\n- [ ] a\n"));
        app.mode = Mode::Help;
        let mut terminal = Terminal::new(TestBackend::new(80, 40)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains(" Help "));
        for (_, what) in HELP {
            assert!(text.contains(what), "missing {what:?}");
        }
    }

    #[test]
    fn draws_placeholder_without_lanes() {
        let mut board = parse("");
        board.errors.push("board.md does not exist".into());
        let mut app = App::new(&board);
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("No lanes"));
        assert!(text.contains("board.md does not exist"));
    }
}
