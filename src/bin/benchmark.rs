use std::time::Instant;

use gridgrowth::network::Network;
use gridgrowth::params::StrategyKind;
use gridgrowth::strategy;

#[path = "../scenario_params.rs"]
mod scenario_params;

fn main() {
    for strategy_kind in [StrategyKind::SingleThreaded, StrategyKind::MultiThreaded] {
        let mut params = scenario_params::get_scenario_params();
        params.technical_params.strategy = strategy_kind;

        let mut network = Network::new(params.clone()).unwrap();
        let mut strategy = strategy::create_strategy(&params.technical_params);

        let wall_start = Instant::now();
        network.run(strategy.as_mut()).unwrap();
        let wall_time = wall_start.elapsed();
        network.terminate(strategy);

        let num_steps = network.simulation_step();
        eprintln!("{:?}:", strategy_kind);
        eprintln!(
            "  Wall time: {:.3} s ({:.3} us per step)",
            wall_time.as_secs_f64(),
            1e6 * wall_time.as_secs_f64() / num_steps as f64
        );
        eprintln!("  Total spikes: {}", network.total_spikes());
        eprintln!(
            "  Synapses: {}",
            network.synapses().iter().map(Vec::len).sum::<usize>()
        );
    }
}
