//! Per-field-type rendering dispatch
//!
//! One entry point renders any declared field: the match over the config
//! tag picks the variant's display behavior, every variant shares the same
//! bordered-input look, value binding, and inline error line. An unknown
//! tag renders nothing and the rest of the form carries on.

use crate::currency::format_money;
use crate::schema::FieldConfig;
use crate::state::{FieldValue, FormInstance};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use rust_decimal::Decimal;

/// Rows a field occupies: bordered input plus one error line.
pub fn field_height(config: &FieldConfig) -> u16 {
    match config {
        FieldConfig::Textarea { constraints, .. } => constraints.rows.unwrap_or(3) + 2 + 1,
        FieldConfig::Unknown { .. } => 0,
        _ => 3 + 1,
    }
}

/// Draw one field: bordered input bound to the instance value, cursor when
/// active, error line underneath when present.
pub fn draw_field(frame: &mut Frame, area: Rect, config: &FieldConfig, instance: &FormInstance) {
    if let FieldConfig::Unknown { name, raw_type } = config {
        tracing::warn!(field = %name, field_type = %raw_type, "not rendering unrecognized field type");
        return;
    }

    let name = config.name();
    let is_active = instance.is_field_active(name);
    let error = instance.error(name);

    let style = if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let border_style = if error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        style
    };

    let display_value = display_value(config, instance, is_active);
    let display_str = if display_value.is_empty() && !is_active {
        placeholder(config)
    } else {
        display_value
    };

    let cursor = if is_active && accepts_typing(config) {
        "▌"
    } else {
        ""
    };

    let is_multiline = matches!(config, FieldConfig::Textarea { .. });
    let content = if is_multiline {
        let mut lines: Vec<Line> = display_str
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect();
        if is_active {
            if let Some(last) = lines.last_mut() {
                last.spans
                    .push(Span::styled(cursor, Style::default().fg(Color::Cyan)));
            } else {
                lines.push(Line::from(Span::styled(
                    cursor,
                    Style::default().fg(Color::Cyan),
                )));
            }
        }
        Paragraph::new(lines)
    } else {
        Paragraph::new(Line::from(vec![
            Span::styled(display_str.clone(), style),
            Span::styled(cursor, Style::default().fg(Color::Cyan)),
        ]))
    };

    let required_marker = if config.is_required() { " *" } else { "" };
    let block = Block::default()
        .title(format!(" {}{} ", config.label(), required_marker))
        .borders(Borders::ALL)
        .border_style(border_style);

    let input_area = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    frame.render_widget(content.wrap(Wrap { trim: false }).block(block), input_area);

    if let Some(message) = error {
        let error_area = Rect {
            y: area.y + area.height.saturating_sub(1),
            height: 1,
            ..area
        };
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" {message}"),
                Style::default().fg(Color::Red),
            ))),
            error_area,
        );
    }
}

/// Variant-specific display value.
fn display_value(config: &FieldConfig, instance: &FormInstance, is_active: bool) -> String {
    let value = instance.value(config.name());
    match config {
        FieldConfig::Text { .. } | FieldConfig::Textarea { .. } => value
            .map(|v| v.as_text().to_string())
            .unwrap_or_default(),
        FieldConfig::Currency { .. } => {
            let amount = value.map(FieldValue::as_currency).unwrap_or(0);
            if is_active {
                // While focused: the raw digit string being typed.
                if amount == 0 {
                    String::new()
                } else {
                    amount.to_string()
                }
            } else if amount == 0 {
                String::new()
            } else {
                // While blurred: locale/currency formatted.
                let code = selected_currency(instance);
                format_money(Decimal::from(amount), &code)
            }
        }
        FieldConfig::Date { .. } => {
            if is_active {
                instance.edit_buffer(config.name()).to_string()
            } else {
                value
                    .and_then(|v| v.as_date())
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| instance.edit_buffer(config.name()).to_string())
            }
        }
        FieldConfig::Select { options, .. } => {
            let selected = value.map(|v| v.as_text().to_string()).unwrap_or_default();
            let label = options
                .iter()
                .find(|o| o.value == selected)
                .map(|o| o.label.clone())
                .unwrap_or(selected);
            if is_active {
                format!("◂ {label} ▸")
            } else {
                label
            }
        }
        FieldConfig::Number { .. } => {
            if is_active {
                instance.edit_buffer(config.name()).to_string()
            } else {
                value
                    .and_then(|v| v.as_number())
                    .map(|n| n.to_string())
                    .unwrap_or_default()
            }
        }
        FieldConfig::Unknown { .. } => String::new(),
    }
}

fn placeholder(config: &FieldConfig) -> String {
    config
        .common()
        .and_then(|c| c.placeholder.clone())
        .unwrap_or_else(|| "(empty)".to_string())
}

fn accepts_typing(config: &FieldConfig) -> bool {
    !matches!(config, FieldConfig::Select { .. } | FieldConfig::Unknown { .. })
}

/// Currency code currently selected on the form, for money formatting.
pub fn selected_currency(instance: &FormInstance) -> String {
    instance
        .value("currency")
        .map(|v| v.as_text().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "USD".to_string())
}
