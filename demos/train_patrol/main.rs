use std::{error::Error, fs, path::Path};

use log::info;
use patrol_rl::{config::Hyperparameters, engine::Engine, gym::Position};

const NUM_EPISODES: u32 = 100_000;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = Path::new("demos/train_patrol/out");
    fs::create_dir_all(path)?;

    let mut engine = Engine::with_hyperparameters(Hyperparameters {
        episodes: NUM_EPISODES,
        ..Default::default()
    })?;
    engine.toggle_pit(Position::new(2, 6))?;

    let mut wtr = csv::Writer::from_path(path.join("checkpoints.csv"))?;
    wtr.write_record(["episode", "success_rate", "avg_steps", "total_reward"])?;

    let mut run = engine.train();
    for checkpoint in run.by_ref() {
        let stats = &checkpoint.stats;
        wtr.write_record(&[
            checkpoint.episode.to_string(),
            stats.success_rate().to_string(),
            stats.avg_steps().to_string(),
            stats.total_reward.to_string(),
        ])?;
    }
    let stats = run.finish();
    wtr.flush()?;
    info!("{stats}");

    let report = engine.run();
    for (tick, step) in report.path.iter().enumerate() {
        info!("{tick:>3}: agent {} enemies {} {}", step.agent, step.enemies[0], step.enemies[1]);
    }
    info!("{}", report.outcome);

    Ok(())
}
