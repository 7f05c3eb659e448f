use std::error::Error;

use patrol_rl::{config::Hyperparameters, engine::Engine, viz};

const NUM_EPISODES: u32 = 200_000;

fn main() -> Result<(), Box<dyn Error>> {
    let mut engine = Engine::with_hyperparameters(Hyperparameters {
        episodes: NUM_EPISODES,
        ..Default::default()
    })?;

    let (handle, tx) = viz::init(NUM_EPISODES)?;

    engine.train_with(|checkpoint| {
        // the dashboard may already be closed
        let _ = tx.send(viz::Update::from(checkpoint));
    });
    log::info!("{}", engine.run().outcome);
    drop(tx);

    handle.join().map_err(|_| "dashboard thread panicked")??;
    Ok(())
}
