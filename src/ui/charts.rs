use chrono::{Datelike, NaiveDate};
use ratatui::layout::{Direction, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::Line;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType,
};
use ratatui::Frame;

use crate::models::DATE_FORMAT;
use crate::view::SalesView;

/// Plot coordinates for the dual-line chart. Dates become day numbers so the
/// x axis is linear in time.
pub(crate) struct LineSeries {
    pub(crate) amount: Vec<(f64, f64)>,
    pub(crate) quantity: Vec<(f64, f64)>,
    pub(crate) x_bounds: [f64; 2],
    pub(crate) y_bounds: [f64; 2],
    pub(crate) first: NaiveDate,
    pub(crate) last: NaiveDate,
}

fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

pub(crate) fn line_series(view: &SalesView) -> LineSeries {
    let amount: Vec<(f64, f64)> = view
        .amount_series()
        .into_iter()
        .map(|(date, value)| (day_number(date), value))
        .collect();
    let quantity: Vec<(f64, f64)> = view
        .quantity_series()
        .into_iter()
        .map(|(date, value)| (day_number(date), value as f64))
        .collect();

    let (first, last) = view.date_range();
    let (mut x_min, mut x_max) = (day_number(first), day_number(last));
    // A single sale day would collapse the axis.
    if x_min == x_max {
        x_min -= 1.0;
        x_max += 1.0;
    }

    let y_max = amount
        .iter()
        .chain(&quantity)
        .map(|(_, y)| *y)
        .fold(0.0_f64, f64::max);
    let y_max = if y_max > 0.0 { y_max * 1.1 } else { 1.0 };

    LineSeries {
        amount,
        quantity,
        x_bounds: [x_min, x_max],
        y_bounds: [0.0, y_max],
        first,
        last,
    }
}

/// Amount received and quantity sold over time, one line each.
pub(crate) fn render_line_chart(frame: &mut Frame, area: Rect, series: &LineSeries) {
    let datasets = vec![
        Dataset::default()
            .name("Amount received")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&series.amount),
        Dataset::default()
            .name("Quantity sold")
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&series.quantity),
    ];

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Amount received and quantity sold over time"),
        )
        .x_axis(
            Axis::default()
                .title("Sale date")
                .style(Style::default().fg(Color::Gray))
                .bounds(series.x_bounds)
                .labels(vec![
                    series.first.format(DATE_FORMAT).to_string(),
                    series.last.format(DATE_FORMAT).to_string(),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("Value / quantity")
                .style(Style::default().fg(Color::Gray))
                .bounds(series.y_bounds)
                .labels(vec!["0".to_string(), format!("{:.0}", series.y_bounds[1])]),
        );
    frame.render_widget(chart, area);
}

/// One horizontal bar per sale, labelled with its date.
pub(crate) fn quantity_bars(view: &SalesView) -> Vec<Bar<'static>> {
    view.quantity_bars()
        .into_iter()
        .map(|(quantity, date)| {
            let value = u64::try_from(quantity).unwrap_or(0);
            Bar::default()
                .value(value)
                .text_value(quantity.to_string())
                .label(Line::from(date.format(DATE_FORMAT).to_string()))
        })
        .collect()
}

pub(crate) fn render_bar_chart(frame: &mut Frame, area: Rect, view: &SalesView) {
    let bars = quantity_bars(view);
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Quantity sold by date"),
        )
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Yellow))
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}
