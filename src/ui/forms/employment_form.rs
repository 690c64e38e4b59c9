//! Employment form rendering
//!
//! Renders the schema's sections and groups in declaration order, followed
//! by the derived total, the action row, and a help line. Layout is driven
//! entirely by the schema; a `row` group splits its width across fields.

use super::field_renderer::{draw_field, field_height, selected_currency};
use crate::app::App;
use crate::currency::format_money;
use crate::platform;
use crate::schema::{ActionType, FieldGroup};
use crate::ui::components::{render_button, BUTTON_HEIGHT};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Draw the whole form into the given area.
pub fn draw(frame: &mut Frame, area: Rect, app: &App) {
    let schema = &app.schema;

    let title = schema.title.as_deref().unwrap_or(schema.id.as_str());
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let mut inner = block.inner(area);
    frame.render_widget(block, area);

    // Respect the schema's max width hint.
    if let Some(max_width) = schema.layout.as_ref().and_then(|l| l.max_width) {
        if inner.width > max_width {
            inner.width = max_width;
        }
    }

    let mut constraints: Vec<Constraint> = Vec::new();
    for section in &schema.sections {
        if section.title.is_some() {
            constraints.push(Constraint::Length(1));
        }
        for group in &section.groups {
            constraints.push(Constraint::Length(group_height(group)));
        }
    }
    constraints.push(Constraint::Length(1)); // derived total
    constraints.push(Constraint::Length(BUTTON_HEIGHT)); // actions
    constraints.push(Constraint::Length(1)); // help line
    constraints.push(Constraint::Min(0));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let mut idx = 0;
    for section in &schema.sections {
        if let Some(title) = &section.title {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    title.clone(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ))),
                chunks[idx],
            );
            idx += 1;
        }
        for group in &section.groups {
            draw_group(frame, chunks[idx], group, app);
            idx += 1;
        }
    }

    draw_total(frame, chunks[idx], app);
    draw_actions(frame, chunks[idx + 1], app);
    draw_help(frame, chunks[idx + 2]);
}

fn group_height(group: &FieldGroup) -> u16 {
    let is_row = group
        .direction
        .map(|d| d == crate::schema::GroupDirection::Row)
        .unwrap_or(false);
    if is_row {
        group.fields.iter().map(field_height).max().unwrap_or(0)
    } else {
        group.fields.iter().map(field_height).sum()
    }
}

fn draw_group(frame: &mut Frame, area: Rect, group: &FieldGroup, app: &App) {
    let is_row = group
        .direction
        .map(|d| d == crate::schema::GroupDirection::Row)
        .unwrap_or(false);

    if is_row {
        let per_field = vec![Constraint::Ratio(1, group.fields.len().max(1) as u32); group.fields.len()];
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(per_field)
            .split(area);
        for (field, chunk) in group.fields.iter().zip(chunks.iter()) {
            draw_field(frame, *chunk, field, &app.instance);
        }
    } else {
        let per_field: Vec<Constraint> = group
            .fields
            .iter()
            .map(|f| Constraint::Length(field_height(f)))
            .collect();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(per_field)
            .split(area);
        for (field, chunk) in group.fields.iter().zip(chunks.iter()) {
            draw_field(frame, *chunk, field, &app.instance);
        }
    }
}

fn draw_total(frame: &mut Frame, area: Rect, app: &App) {
    let code = selected_currency(&app.instance);
    let line = Line::from(vec![
        Span::styled("Total income over period: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format_money(app.total, &code),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_actions(frame: &mut Frame, area: Rect, app: &App) {
    let actions: Vec<_> = app
        .schema
        .actions
        .iter()
        .filter(|a| a.action_type != ActionType::Unknown)
        .collect();
    if actions.is_empty() {
        return;
    }

    let is_focused = app.instance.is_actions_row_active();
    let button_width = 18u16;
    let mut constraints: Vec<Constraint> =
        vec![Constraint::Length(button_width); actions.len()];
    constraints.push(Constraint::Min(0));
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (i, action) in actions.iter().enumerate() {
        let accent = match action.action_type {
            ActionType::Submit => Some(Color::Green),
            ActionType::Reset => Some(Color::Yellow),
            _ => None,
        };
        render_button(
            frame,
            chunks[i],
            &action.label,
            is_focused && app.instance.selected_action == i,
            accent,
        );
    }
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from(vec![
        Span::styled("Tab", Style::default().fg(Color::Cyan)),
        Span::raw(": next field  "),
        Span::styled("←/→", Style::default().fg(Color::Cyan)),
        Span::raw(": change option  "),
        Span::styled(platform::EXPORT_SHORTCUT, Style::default().fg(Color::Cyan)),
        Span::raw(": export  "),
        Span::styled(platform::RESET_SHORTCUT, Style::default().fg(Color::Cyan)),
        Span::raw(": reset  "),
        Span::styled("Ctrl+C", Style::default().fg(Color::Cyan)),
        Span::raw(": quit"),
    ]))
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}
