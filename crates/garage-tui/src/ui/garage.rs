use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use garage_core::VehicleSummary;

use crate::app::App;
use crate::ui::styles;
use crate::utils::format::truncate_string;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_vehicle_list(frame, app, chunks[0]);
    render_vehicle_summary(frame, app, chunks[1]);
}

fn render_vehicle_list(frame: &mut Frame, app: &App, area: Rect) {
    let selected_id = app.collection.selected_id();

    let items: Vec<ListItem> = app
        .collection
        .vehicles()
        .iter()
        .enumerate()
        .map(|(i, vehicle)| {
            let marker = if selected_id == Some(vehicle.id) { "*" } else { " " };
            let style = if i == app.cursor {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            let line = Line::from(vec![
                Span::styled(format!("{} {:<10}", marker, vehicle.registration_number), style),
                Span::styled(
                    format!("{:<28}", truncate_string(&vehicle.description(), 28)),
                    style,
                ),
                Span::styled(
                    vehicle.validation_status.label(),
                    styles::validation_style(vehicle.validation_status),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    let title = if app.validation_running() {
        format!(" Garage ({}) - validating ", app.collection.len())
    } else {
        format!(" Garage ({}) ", app.collection.len())
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    if app.collection.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " No vehicles yet. Press [a] to add one.",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list = List::new(items).block(block);

    let mut state = ListState::default();
    state.select(Some(app.cursor));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_vehicle_summary(frame: &mut Frame, app: &App, area: Rect) {
    let (title, content) = match app.vehicle_at_cursor() {
        Some(vehicle) => (
            format!(" {} ", vehicle.registration_number),
            summary_lines(vehicle, app.collection.selected_id() == Some(vehicle.id)),
        ),
        None => (
            " No Vehicle ".to_string(),
            vec![Line::from(Span::styled(
                "Add a vehicle to see it here",
                styles::muted_style(),
            ))],
        ),
    };

    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn summary_lines(vehicle: &VehicleSummary, selected: bool) -> Vec<Line<'static>> {
    let field = |label: &'static str, value: Option<String>| {
        Line::from(vec![
            Span::styled(format!("{:<10}", label), styles::highlight_style()),
            Span::raw(value.unwrap_or_else(|| "-".to_string())),
        ])
    };

    let mut lines = vec![
        field("Make", vehicle.make.clone()),
        field("Model", vehicle.model.clone()),
        field("Colour", vehicle.colour.clone()),
        field("Fuel", vehicle.fuel_type.clone()),
        field("Year", vehicle.year_of_manufacture.map(|y| y.to_string())),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<10}", "Status"), styles::highlight_style()),
            Span::styled(
                vehicle.validation_status.label(),
                styles::validation_style(vehicle.validation_status),
            ),
        ]),
    ];

    if let Some(ref err) = vehicle.validation_error {
        lines.push(Line::from(Span::styled(err.clone(), styles::error_style())));
    }

    if selected {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Selected", styles::success_style())));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[Enter] details  [s] select  [x] remove",
        styles::muted_style(),
    )));

    lines
}
