use simple_error::SimpleResult;

use crate::grid::GridLayout;
use crate::history::HistoryTable;
use crate::multi_threaded::MultiThreadedSim;
use crate::neuron::LifNeuron;
use crate::params::{GrowthParams, NetworkParams, StrategyKind, TechnicalParams};
use crate::single_threaded::SingleThreadedSim;
use crate::synapse::DynamicSynapse;
use crate::types::NeuronType;

/// State shared between the network and the simulation strategy.
#[derive(Debug, Clone)]
pub struct SimulationInfo {
    pub grid: GridLayout,
    pub growth: GrowthParams,
    pub max_rate: f32,
    pub delta_t: f32,
    pub seed: u64,
    /// Current growth epoch, 1-based while running.
    pub current_epoch: usize,
    /// Global step counter across all epochs.
    pub simulation_step: u64,
    pub neurons: Vec<LifNeuron>,
    pub neuron_types: Vec<NeuronType>,
    pub starter_map: Vec<bool>,
    /// Outgoing synapses, keyed by source neuron.
    pub synapses: Vec<Vec<DynamicSynapse>>,
    /// Per-neuron input accumulator, zeroed by the neuron once read.
    pub summation: Vec<f32>,
}

impl SimulationInfo {
    pub fn new(params: &NetworkParams) -> Self {
        let grid = GridLayout::new(params.grid.width, params.grid.height);
        let num_neurons = grid.num_neurons();

        Self {
            grid,
            growth: params.growth.clone(),
            max_rate: params.growth.max_rate(),
            delta_t: params.delta_t,
            seed: params.technical_params.seed,
            current_epoch: 0,
            simulation_step: 0,
            neurons: vec![LifNeuron::new(); num_neurons],
            neuron_types: vec![NeuronType::Excitatory; num_neurons],
            starter_map: vec![false; num_neurons],
            synapses: vec![Vec::new(); num_neurons],
            summation: vec![0.0; num_neurons],
        }
    }

    pub fn num_neurons(&self) -> usize {
        self.grid.num_neurons()
    }

    pub fn steps_per_epoch(&self) -> u64 {
        self.growth.steps_per_epoch(self.delta_t)
    }

    pub fn num_synapses(&self) -> usize {
        self.synapses.iter().map(Vec::len).sum()
    }
}

/// Per-step numerics and connectivity growth, driven by the network once per epoch.
pub trait SimulationStrategy {
    fn init(
        &mut self,
        si: &mut SimulationInfo,
        x_locations: &[f32],
        y_locations: &[f32],
    ) -> SimpleResult<()>;

    /// Radii carried over from a restored checkpoint.
    fn init_radii(&mut self, prior_radii: &[f32]);

    /// Runs one epoch worth of steps with connectivity frozen.
    fn advance_until_growth(&mut self, si: &mut SimulationInfo);

    /// Updates connectivity and fills the current epoch's history rows.
    fn update_network(
        &mut self,
        si: &mut SimulationInfo,
        radii_history: &mut HistoryTable,
        rates_history: &mut HistoryTable,
    );

    fn term(&mut self, si: &mut SimulationInfo);
}

pub fn create_strategy(technical_params: &TechnicalParams) -> Box<dyn SimulationStrategy> {
    match technical_params.strategy {
        StrategyKind::SingleThreaded => Box::new(SingleThreadedSim::new()),
        StrategyKind::MultiThreaded => Box::new(MultiThreadedSim::new(
            technical_params
                .num_threads
                .unwrap_or_else(num_cpus::get),
            technical_params.pin_threads,
        )),
    }
}
