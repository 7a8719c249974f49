use log::{debug, info};
use simple_error::{try_with, SimpleError, SimpleResult};
use std::io::{Read, Write};

use crate::history::{spike_histograms, HistoryTable};
use crate::neuron::LifNeuron;
use crate::params::{self, NetworkParams};
use crate::population::{
    compute_neuron_counts, NeuronCounts, PopulationBuilder, StarterAssignment, TypeAssignment,
};
use crate::state_codec::{self, CheckpointTarget, StateDocument};
use crate::strategy::{SimulationInfo, SimulationStrategy};
use crate::synapse::DynamicSynapse;
use crate::types::NeuronType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Constructed,
    Reset,
    Populated,
    Running(usize),
    Terminated,
}

pub struct Network {
    params: NetworkParams,
    counts: NeuronCounts,
    si: SimulationInfo,
    radii_history: HistoryTable,
    rates_history: HistoryTable,
    prior_radii: Option<Vec<f32>>,
    run_state: RunState,
}

impl Network {
    pub fn new(params: NetworkParams) -> SimpleResult<Self> {
        try_with!(
            params::validate_network_params(&params),
            "invalid network parameters"
        );

        let counts = compute_neuron_counts(&params);
        info!(
            "{} neurons on a {}x{} grid: {} excitatory, {} inhibitory, {} starter",
            counts.total,
            params.grid.width,
            params.grid.height,
            counts.excitatory,
            counts.inhibitory,
            counts.starter
        );

        let mut network = Self {
            si: SimulationInfo::new(&params),
            radii_history: HistoryTable::new(counts.total),
            rates_history: HistoryTable::new(counts.total),
            prior_radii: None,
            run_state: RunState::Constructed,
            params,
            counts,
        };

        network.reset();
        network.populate()?;

        Ok(network)
    }

    /// Returns the network to its freshly allocated, unpopulated state.
    pub fn reset(&mut self) {
        self.si = SimulationInfo::new(&self.params);
        self.radii_history =
            HistoryTable::with_initial_row(self.counts.total, self.params.growth.start_radius);
        self.rates_history = HistoryTable::with_initial_row(self.counts.total, 0.0);
        self.prior_radii = None;
        self.run_state = RunState::Reset;
        debug!("network reset");
    }

    pub fn populate(&mut self) -> SimpleResult<()> {
        if self.run_state != RunState::Reset {
            return Err(SimpleError::new(format!(
                "cannot populate a network in state {:?}",
                self.run_state
            )));
        }

        let mut builder = PopulationBuilder::new(self.params.technical_params.seed);
        let (type_assignment, starter_assignment) = match &self.params.population.fixed_layout {
            Some(layout) => (
                TypeAssignment::Fixed {
                    inhibitory: &layout.inhibitory,
                },
                StarterAssignment::Fixed {
                    starters: &layout.starters,
                },
            ),
            None => (
                TypeAssignment::Random {
                    inhibitory_count: self.counts.inhibitory,
                },
                StarterAssignment::Random {
                    target_count: self.counts.starter,
                },
            ),
        };

        let grid = self.si.grid;
        self.si.neuron_types = builder.assign_neuron_types(&grid, type_assignment)?;
        self.si.starter_map =
            builder.assign_starter_neurons(&grid, &self.si.neuron_types, starter_assignment)?;

        for (i, neuron) in self.si.neurons.iter_mut().enumerate() {
            builder.initialize_biophysics(
                neuron,
                &self.params.neuron_ranges,
                self.params.delta_t,
                self.si.neuron_types[i] == NeuronType::Inhibitory,
                self.si.starter_map[i],
            );
        }

        self.run_state = RunState::Populated;
        Ok(())
    }

    /// Runs every growth epoch with the given strategy. Blocks until done.
    pub fn run(&mut self, strategy: &mut dyn SimulationStrategy) -> SimpleResult<()> {
        if self.run_state != RunState::Populated {
            return Err(SimpleError::new(format!(
                "cannot run a network in state {:?}",
                self.run_state
            )));
        }

        let x_locations = self.si.grid.x_locations();
        let y_locations = self.si.grid.y_locations();
        try_with!(
            strategy.init(&mut self.si, &x_locations, &y_locations),
            "cannot initialize simulation strategy"
        );

        if let Some(prior_radii) = self.prior_radii.take() {
            strategy.init_radii(&prior_radii);
        }

        let epoch_count = self.params.growth.epoch_count;
        for epoch in 1..=epoch_count {
            self.si.current_epoch = epoch;
            self.run_state = RunState::Running(epoch);

            strategy.advance_until_growth(&mut self.si);

            let previous_radii = self.radii_history.row(epoch - 1).to_vec();
            self.radii_history.push_row(&previous_radii);
            self.rates_history.push_row(&vec![0.0; self.counts.total]);

            strategy.update_network(&mut self.si, &mut self.radii_history, &mut self.rates_history);

            info!(
                "epoch {}/{} done at step {}, {} synapses",
                epoch,
                epoch_count,
                self.si.simulation_step,
                self.si.num_synapses()
            );
        }

        Ok(())
    }

    /// Releases the strategy's resources. The network keeps its final state.
    pub fn terminate(&mut self, mut strategy: Box<dyn SimulationStrategy>) {
        strategy.term(&mut self.si);
        self.run_state = RunState::Terminated;
        debug!("simulation terminated");
    }

    pub fn save_state<W: Write>(&self, out: &mut W) -> SimpleResult<()> {
        let growth = &self.params.growth;
        let total_duration = growth.epoch_duration * growth.epoch_count as f32;
        let histograms = spike_histograms(&self.si.neurons, self.si.delta_t, total_duration);

        let doc = StateDocument {
            radii_history: &self.radii_history,
            rates_history: &self.rates_history,
            histograms: &histograms,
            grid: &self.si.grid,
            neurons: &self.si.neurons,
            neuron_types: &self.si.neuron_types,
            starter_map: &self.si.starter_map,
            epoch_duration: growth.epoch_duration,
            simulation_end_time: self.simulation_end_time(),
        };

        try_with!(
            state_codec::write_state_document(out, &doc),
            "cannot write state document"
        );
        Ok(())
    }

    pub fn write_checkpoint<W: Write>(&self, out: &mut W) -> SimpleResult<()> {
        let epoch = self.si.current_epoch;
        try_with!(
            state_codec::write_checkpoint(
                out,
                &self.si.neurons,
                &self.si.synapses,
                self.radii_history.row(epoch),
                self.rates_history.row(epoch),
            ),
            "cannot write checkpoint"
        );

        info!(
            "checkpoint written at epoch {}: {} neurons, {} synapses",
            epoch,
            self.counts.total,
            self.si.num_synapses()
        );
        Ok(())
    }

    /// Replaces neurons, synapses and the initial history row with the
    /// checkpoint's. Only allowed between populate and run.
    pub fn restore_from_checkpoint<R: Read>(&mut self, input: &mut R) -> SimpleResult<()> {
        if self.run_state != RunState::Populated {
            return Err(SimpleError::new(format!(
                "cannot restore a checkpoint into a network in state {:?}",
                self.run_state
            )));
        }

        let target = CheckpointTarget {
            grid: self.si.grid,
            delta_t: self.si.delta_t,
            max_synapses_per_neuron: self.params.growth.max_synapses_per_neuron,
        };
        let checkpoint = try_with!(
            state_codec::read_checkpoint(input, &target),
            "cannot read checkpoint"
        );

        self.si.neurons = checkpoint.neurons;
        self.si.synapses = checkpoint.synapses;
        self.radii_history.set_row(0, &checkpoint.radii);
        self.rates_history.set_row(0, &checkpoint.rates);
        self.prior_radii = Some(checkpoint.radii);

        info!(
            "checkpoint restored: {} neurons, {} synapses",
            self.counts.total,
            self.si.num_synapses()
        );
        Ok(())
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn neuron_counts(&self) -> NeuronCounts {
        self.counts
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn simulation_info(&self) -> &SimulationInfo {
        &self.si
    }

    pub fn neurons(&self) -> &[LifNeuron] {
        &self.si.neurons
    }

    pub fn neuron_types(&self) -> &[NeuronType] {
        &self.si.neuron_types
    }

    pub fn starter_map(&self) -> &[bool] {
        &self.si.starter_map
    }

    pub fn synapses(&self) -> &[Vec<DynamicSynapse>] {
        &self.si.synapses
    }

    pub fn radii_history(&self) -> &HistoryTable {
        &self.radii_history
    }

    pub fn rates_history(&self) -> &HistoryTable {
        &self.rates_history
    }

    pub fn simulation_step(&self) -> u64 {
        self.si.simulation_step
    }

    pub fn simulation_end_time(&self) -> f32 {
        (self.si.simulation_step as f64 * self.si.delta_t as f64) as f32
    }

    pub fn total_spikes(&self) -> usize {
        self.si
            .neurons
            .iter()
            .map(|neuron| neuron.spike_history.len())
            .sum()
    }
}
