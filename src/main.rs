use std::{env, sync::Arc};

use log::info;

use neural_engine::{
    Checkpointer, EngineConfig, EpochStatistics, MemoryStorage, NetFactory, StatisticsManager,
    WorkerPool,
};

const CONFIG_ENV: &str = "ENGINE_CONFIG";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match env::args().nth(1).or_else(|| env::var(CONFIG_ENV).ok()) {
        Some(path) => {
            info!("loading configuration from {path}");
            EngineConfig::from_path(&path)?
        }
        None => {
            info!("no configuration given, using the default one");
            let config = EngineConfig::default();
            config.validate()?;
            config
        }
    };

    let pool = WorkerPool::new(config.threads)?;
    let storage = Arc::new(MemoryStorage::new());
    let factory = NetFactory::new(config.topology.clone(), config.distribution, config.seed);
    let mut net = factory.build(storage.as_ref())?;

    let checkpointer = Checkpointer::new(storage.clone());
    let mut stats = EpochStatistics::new(Some(checkpointer.clone()), config.checkpoint_interval);

    for epoch in 1..=config.epochs {
        for sample in &config.samples {
            let report = net.train_step(&sample.input, &sample.expected, config.learning_rate, &pool)?;
            stats.add_output_error(&report.output_error);
        }

        stats.collect_stats(epoch, &net);
    }

    checkpointer.wait_idle();
    info!(checkpoints = storage.len(); "training done");

    for sample in &config.samples {
        let output = net.predict(&sample.input)?;
        info!("{:?} -> {output:?} (expected {:?})", sample.input, sample.expected);
    }

    Ok(())
}
