use std::{
    io,
    sync::mpsc::{self, Sender},
    thread::{self, JoinHandle},
};

use log::{LevelFilter, SetLoggerError};

use crate::train::Checkpoint;

pub use app::{App, Update};

mod app;
mod components;
mod tui;
mod util;

/// Metrics plotted by the dashboard, in the order of [`Update::data`]
pub const PLOTS: [&str; 3] = ["success rate (%)", "avg steps", "total reward"];

impl From<&Checkpoint> for Update {
    fn from(checkpoint: &Checkpoint) -> Self {
        let stats = &checkpoint.stats;
        Self {
            episode: checkpoint.episode,
            data: vec![stats.success_rate(), stats.avg_steps(), stats.total_reward],
        }
    }
}

/// Install `tui-logger` as the log backend and spawn the dashboard on its own thread
///
/// Send one [`Update`] per checkpoint through the returned channel. Dropping the sender
/// marks training as done; the dashboard stays up until the user quits with `q`.
pub fn init(
    total_episodes: u32,
) -> Result<(JoinHandle<io::Result<()>>, Sender<Update>), SetLoggerError> {
    tui_logger::init_logger(LevelFilter::Trace)?;
    tui_logger::set_default_level(LevelFilter::Debug);

    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || App::new(&PLOTS, total_episodes).run(rx));
    Ok((handle, tx))
}
