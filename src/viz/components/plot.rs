use crossterm::event::{Event, KeyCode};
use ratatui::{prelude::*, style::Stylize, widgets::*};

use crate::viz::{util::event_keycode, Update};

use super::Component;

/// One metric over training episodes
pub struct Plot {
    y_title: String,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    data: Vec<(f64, f64)>,
}

impl Plot {
    pub fn new(y_title: &str, episodes: u32) -> Self {
        Self {
            y_title: String::from(y_title),
            x_bounds: [0.0, episodes.into()],
            y_bounds: [f64::MAX, f64::MIN],
            data: Vec::new(),
        }
    }

    pub fn update(&mut self, point: (f64, f64)) {
        self.x_bounds[1] = self.x_bounds[1].max(point.0);
        self.y_bounds[0] = self.y_bounds[0].min(point.1);
        self.y_bounds[1] = self.y_bounds[1].max(point.1);
        self.data.push(point);
    }

    fn labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
        bounds.iter().map(|x| format!("{x:.2}").bold()).collect()
    }
}

impl WidgetRef for Plot {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title(self.y_title.as_str())
            .padding(Padding::uniform(2));

        if self.data.is_empty() {
            Paragraph::new("Waiting for the first checkpoint...")
                .block(block)
                .dark_gray()
                .render(area, buf);
            return;
        }

        let dataset = Dataset::default()
            .marker(Marker::Braille)
            .graph_type(GraphType::Line)
            .cyan()
            .data(&self.data);

        let x_axis = Axis::default()
            .title("Episode")
            .dark_gray()
            .labels(Self::labels(self.x_bounds))
            .bounds(self.x_bounds);

        let y_axis = Axis::default()
            .title(self.y_title.as_str())
            .dark_gray()
            .labels(Self::labels(self.y_bounds))
            .bounds(self.y_bounds);

        Chart::new(vec![dataset])
            .block(block)
            .x_axis(x_axis)
            .y_axis(y_axis)
            .render(area, buf);
    }
}

/// A tabbed set of [`Plot`]s, one per tracked metric
pub struct Plots {
    names: Vec<&'static str>,
    plots: Vec<Plot>,
    selected: usize,
}

impl Plots {
    pub fn new(names: &[&'static str], episodes: u32) -> Self {
        Self {
            names: names.to_vec(),
            plots: names.iter().map(|n| Plot::new(n, episodes)).collect(),
            selected: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn next_plot(&mut self) {
        self.selected = (self.selected + 1) % self.len();
    }

    pub fn prev_plot(&mut self) {
        let len = self.len();
        self.selected = (self.selected + len - 1) % len;
    }

    pub fn update(&mut self, update: Update) {
        let Update { episode, data } = update;
        for (plot, metric) in self.plots.iter_mut().zip(data) {
            plot.update((episode.into(), metric));
        }
    }
}

impl WidgetRef for Plots {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let [tabs_area, plot_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        Tabs::new(self.names.iter().copied())
            .white()
            .highlight_style(Style::default().light_green())
            .select(self.selected)
            .render(tabs_area, buf);

        if let Some(plot) = self.plots.get(self.selected) {
            plot.render_ref(plot_area, buf);
        }
    }
}

impl Component for Plots {
    fn handle_ui_event(&mut self, event: &Event) -> bool {
        match event_keycode(event) {
            Some(KeyCode::Left) => self.prev_plot(),
            Some(KeyCode::Right) => self.next_plot(),
            _ => return false,
        }
        true
    }
}
