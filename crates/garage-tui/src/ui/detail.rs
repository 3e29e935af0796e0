use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use garage_core::{CachedData, DetailState, VehicleDetailRecord, VehicleDetailSession};

use crate::app::App;
use crate::ui::styles;
use crate::utils::format::{
    format_bytes, format_co2, format_date, format_engine_capacity, format_flag, format_weight,
};

/// Width of the label column
const LABEL_WIDTH: usize = 22;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(session) = app.detail.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    render_record(frame, session, chunks[0]);
    render_image(frame, session, chunks[1]);
}

fn render_record(frame: &mut Frame, session: &VehicleDetailSession, area: Rect) {
    let (title, lines) = match session.state() {
        DetailState::Loading => (
            format!(" {} ", session.registration()),
            vec![Line::from(Span::styled("Loading...", styles::muted_style()))],
        ),
        DetailState::Failed(err) => (
            format!(" {} ", session.registration()),
            vec![
                Line::from(Span::styled(err.to_string(), styles::error_style())),
                Line::from(""),
                Line::from(Span::styled("Press [r] to try again", styles::muted_style())),
            ],
        ),
        DetailState::Ready(cached) => (
            format!(" {} - cached {} ", session.registration(), cached.age_display()),
            record_lines(cached),
        ),
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn record_lines(cached: &CachedData<VehicleDetailRecord>) -> Vec<Line<'static>> {
    let record = &cached.data;
    let mut lines = Vec::new();

    push_section(&mut lines, "Vehicle");
    lines.push(field("Make", Some(record.make.clone()).filter(|m| !m.is_empty())));
    lines.push(field("Colour", record.colour.clone()));
    lines.push(field("Year of manufacture", record.year_of_manufacture.map(|y| y.to_string())));
    lines.push(field(
        "First registered",
        record.month_of_first_registration.as_deref().map(format_date),
    ));
    lines.push(field("Fuel type", record.fuel_type.clone()));
    lines.push(field("Engine capacity", record.engine_capacity.map(format_engine_capacity)));
    lines.push(field("Wheelplan", record.wheelplan.clone()));
    lines.push(field("Type approval", record.type_approval.clone()));
    lines.push(field("Revenue weight", record.revenue_weight.map(format_weight)));

    push_section(&mut lines, "Emissions");
    lines.push(field("CO2", record.co2_emissions.map(format_co2)));
    lines.push(field("Euro status", record.euro_status.clone()));
    lines.push(field("Real driving emissions", record.real_driving_emissions.clone()));

    push_section(&mut lines, "Tax & MOT");
    lines.push(field("Tax status", record.tax_status.clone()));
    lines.push(field("Tax due", record.tax_due_date.as_deref().map(format_date)));
    lines.push(field("MOT status", record.mot_status.clone()));
    lines.push(field("MOT expiry", record.mot_expiry_date.as_deref().map(format_date)));
    lines.push(field("ART end date", record.art_end_date.as_deref().map(format_date)));

    push_section(&mut lines, "Registration");
    lines.push(field(
        "Last V5C issued",
        record.date_of_last_v5c_issued.as_deref().map(format_date),
    ));
    lines.push(field(
        "Marked for export",
        Some(format_flag(record.marked_for_export).to_string()),
    ));

    lines
}

fn push_section(lines: &mut Vec<Line<'static>>, heading: &'static str) {
    if !lines.is_empty() {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(heading, styles::title_style())));
}

fn field(label: &'static str, value: Option<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {:<width$}", label, width = LABEL_WIDTH),
            styles::highlight_style(),
        ),
        Span::raw(value.unwrap_or_else(|| "-".to_string())),
    ])
}

fn render_image(frame: &mut Frame, session: &VehicleDetailSession, area: Rect) {
    let lines = match session.image() {
        Some(image) => vec![
            Line::from(vec![
                Span::styled("Type  ", styles::highlight_style()),
                Span::raw(image.media_type.clone()),
            ]),
            Line::from(vec![
                Span::styled("Size  ", styles::highlight_style()),
                Span::raw(format_bytes(image.size_bytes())),
            ]),
            Line::from(""),
            Line::from(Span::styled("[i] replace  [d] remove", styles::muted_style())),
        ],
        None => vec![
            Line::from(Span::styled("No photo attached", styles::muted_style())),
            Line::from(""),
            Line::from(Span::styled("[i] attach an image file", styles::muted_style())),
        ],
    };

    let block = Block::default()
        .title(" Photo ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}
