use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, View};

use super::styles;
use super::{detail, garage};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, app),
        AppState::AddingVehicle => {
            render_input_overlay(frame, " Add Vehicle ", "Registration:", &app.input)
        }
        AppState::AttachingImage => {
            render_input_overlay(frame, " Attach Photo ", "Image file path:", &app.input)
        }
        AppState::ConfirmingRemove => render_remove_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled("  Garage", styles::title_style()),
        Span::styled(" | ", styles::muted_style()),
        Span::styled("Vehicles", styles::tab_style(app.view == View::Garage)),
    ];
    if let Some(ref session) = app.detail {
        spans.push(Span::styled(" > ", styles::muted_style()));
        spans.push(Span::styled(
            session.registration().to_string(),
            styles::tab_style(app.view == View::Detail),
        ));
    }

    let help_hint = "[?] Help";
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    spans.push(Span::raw(
        " ".repeat((area.width as usize).saturating_sub(used + help_hint.len() + 2)),
    ));
    spans.push(Span::styled(help_hint, styles::muted_style()));

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Garage => garage::render(frame, app, area),
        View::Detail => detail::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.view {
        View::Garage => "[a]dd | [v]alidate | [q]uit",
        View::Detail => "[r]efresh | [i]mage | [x] remove | [Esc] back",
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => String::new(),
    };
    let right_text = format!(" {} ", shortcuts);

    let width = area.width as usize;
    let padding_len = width
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::highlight_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame, _app: &App) {
    let area = centered_rect_fixed(52, 24, frame.area());

    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Garage", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Garage", styles::highlight_style())),
        help_line("↑/↓", "Move through the list"),
        help_line("a", "Add a vehicle by registration"),
        help_line("s", "Select / deselect"),
        help_line("x", "Remove vehicle"),
        help_line("Enter", "View details"),
        help_line("v", "Check every vehicle with DVLA"),
        Line::from(""),
        Line::from(Span::styled(" Details", styles::highlight_style())),
        help_line("r", "Refresh from DVLA"),
        help_line("i", "Attach a photo from a file"),
        help_line("d", "Remove the photo"),
        help_line("x", "Remove vehicle"),
        help_line("Esc", "Back to the garage"),
        Line::from(""),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

fn render_input_overlay(frame: &mut Frame, title: &str, label: &str, value: &str) {
    let area = centered_rect_fixed(50, 7, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {}", label), styles::muted_style())),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(format!("{}▌", value), styles::input_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" [Enter]", styles::help_key_style()),
            Span::styled(" submit  ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(title.to_string())
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_remove_overlay(frame: &mut Frame, app: &App) {
    let registration = app
        .detail
        .as_ref()
        .map(|s| s.registration().to_string())
        .unwrap_or_default();

    render_confirm_overlay(
        frame,
        format!("   Remove {} from your garage?", registration),
        "remove",
    );
}

fn render_quit_overlay(frame: &mut Frame) {
    render_confirm_overlay(frame, "   Are you sure you want to quit?".to_string(), "quit");
}

fn render_confirm_overlay(frame: &mut Frame, question: String, verb: &'static str) {
    let area = centered_rect_fixed(46, 7, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(question, styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", verb), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines).block(block);

    frame.render_widget(paragraph, area);
}
