use std::{
    io,
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use crossterm::event::{self, Event, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::{
    components::{help, Component, Logs, Plots},
    tui,
    util::event_keycode,
};

const TABS: [&str; 2] = ["Plots", "Logs"];

#[derive(Default)]
enum State {
    #[default]
    Train,
    /// The sender hung up, nothing more will arrive
    Done,
    Quit,
}

/// Format for updating plot data, one value per plotted metric
pub struct Update {
    pub episode: u32,
    pub data: Vec<f64>,
}

/// The root TUI component which holds the main app state and runs the render loop
pub struct App {
    state: State,
    episode: u32,
    total_episodes: u32,
    selected_tab: usize,
    show_help: bool,
    plots: Plots,
    logs: Logs,
}

impl App {
    pub fn new(plots: &[&'static str], total_episodes: u32) -> Self {
        Self {
            state: State::default(),
            episode: 0,
            total_episodes,
            selected_tab: 0,
            show_help: false,
            plots: Plots::new(plots, total_episodes),
            logs: Logs::default(),
        }
    }

    /// Initialize the terminal and run the main loop
    ///
    /// Restores the terminal on exit
    pub fn run(&mut self, rx: Receiver<Update>) -> io::Result<()> {
        let mut terminal = tui::init()?;

        loop {
            match self.state {
                State::Train => self.drain(&rx),
                State::Done => {}
                State::Quit => break,
            }

            terminal.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(Duration::from_millis(16))? {
                let event = event::read()?;
                self.handle_event(&event);
            }
        }

        tui::restore()
    }

    fn drain(&mut self, rx: &Receiver<Update>) {
        loop {
            match rx.try_recv() {
                Ok(update) => {
                    self.episode = update.episode;
                    self.plots.update(update);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.state = State::Done;
                    break;
                }
            }
        }
    }

    fn handle_event(&mut self, event: &Event) {
        match event_keycode(event) {
            Some(KeyCode::Char('q')) => self.state = State::Quit,
            Some(KeyCode::Char('h')) => self.show_help = !self.show_help,
            Some(KeyCode::Tab) => self.selected_tab = (self.selected_tab + 1) % TABS.len(),
            _ => {
                let _ = match self.selected_tab {
                    0 => self.plots.handle_ui_event(event),
                    _ => self.logs.handle_ui_event(event),
                };
            }
        }
    }

    fn progress_title(&self) -> String {
        match self.state {
            State::Train => format!("Training {}/{}", self.episode, self.total_episodes),
            _ => format!("Done {}/{}", self.episode, self.total_episodes),
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [menu_area, main_area, progress_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        Tabs::new(TABS)
            .block(Block::default().padding(Padding::uniform(1)))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        match self.selected_tab {
            0 => self.plots.render_ref(main_area, buf),
            _ => self.logs.render_ref(main_area, buf),
        }

        Gauge::default()
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title(self.progress_title()),
            )
            .gauge_style(Color::Cyan)
            .ratio(crate::util::ratio(
                self.episode.into(),
                self.total_episodes.into(),
            ))
            .render(progress_area, buf);

        if self.show_help {
            help::render_help(area, buf, self.selected_tab);
        }
    }
}
