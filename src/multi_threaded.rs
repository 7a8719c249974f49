//! Partitioned stepping over struct-of-arrays synapse stores.
//!
//! Each worker owns a contiguous neuron range, the synapse slots of those
//! neurons and its own noise stream. Synaptic input is accumulated into one
//! buffer per worker and reduced in worker order, so a run is reproducible
//! for a fixed thread count.

use core_affinity::CoreId;
use log::debug;
use simple_error::{SimpleError, SimpleResult};
use std::ops::Range;
use std::sync::{Barrier, Mutex, MutexGuard};
use std::thread;

use crate::grid::GridLayout;
use crate::growth::GrowthState;
use crate::history::HistoryTable;
use crate::neuron::LifNeuron;
use crate::strategy::{SimulationInfo, SimulationStrategy};
use crate::synapse::DynamicSynapse;
use crate::synapse_store::SynapseStore;
use crate::util::{derive_seed, get_partition_range, NoiseSource};

struct Worker {
    range: Range<usize>,
    store: SynapseStore,
    noise: NoiseSource,
    core_id: Option<usize>,
    inputs: Vec<f32>,
}

struct StepContext<'a> {
    contributions: &'a [Mutex<Vec<f32>>],
    barrier: &'a Barrier,
    worker_id: usize,
    slots_per_neuron: usize,
    steps: Range<u64>,
}

fn lock(buffer: &Mutex<Vec<f32>>) -> MutexGuard<'_, Vec<f32>> {
    buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Worker {
    fn load(&mut self, synapses: &[Vec<DynamicSynapse>], grid: &GridLayout, k: usize) {
        self.store.import_from_per_neuron_lists(synapses, k);
        self.store.bind_summation_points(grid);
    }

    fn slots_of(&self, local_neuron: usize, k: usize) -> Range<usize> {
        local_neuron * k..(local_neuron + 1) * k
    }

    fn run_epoch(&mut self, neurons: &mut [LifNeuron], ctx: &StepContext) {
        if let Some(id) = self.core_id {
            core_affinity::set_for_current(CoreId { id });
        }

        for step in ctx.steps.clone() {
            self.inputs.iter_mut().for_each(|input| *input = 0.0);
            for buffer in ctx.contributions {
                let buffer = lock(buffer);
                let partition = &buffer[self.range.clone()];
                for (input, contribution) in self.inputs.iter_mut().zip(partition) {
                    *input += contribution;
                }
            }

            for (local, neuron) in neurons.iter_mut().enumerate() {
                if neuron.advance(self.inputs[local], step, &mut self.noise) {
                    for slot in self.slots_of(local, ctx.slots_per_neuron) {
                        if self.store.is_in_use(slot) {
                            self.store.pre_spike_hit(slot);
                        }
                    }
                }
            }

            ctx.barrier.wait();

            {
                let mut own = lock(&ctx.contributions[ctx.worker_id]);
                own.iter_mut().for_each(|value| *value = 0.0);

                for slot in 0..self.store.capacity() {
                    if self.store.is_in_use(slot) {
                        let psr = self.store.advance_slot(slot, step);
                        if let Some(target) = self.store.summation_target(slot) {
                            own[target] += psr;
                        }
                    }
                }
            }

            ctx.barrier.wait();
        }
    }
}

struct State {
    workers: Vec<Worker>,
    growth: GrowthState,
    slots_per_neuron: usize,
}

/// Steps neurons and synapses on a pool of scoped worker threads.
pub struct MultiThreadedSim {
    num_threads: usize,
    pin_threads: bool,
    state: Option<State>,
}

impl MultiThreadedSim {
    pub fn new(num_threads: usize, pin_threads: bool) -> Self {
        Self {
            num_threads,
            pin_threads,
            state: None,
        }
    }

    fn state_mut(&mut self) -> &mut State {
        self.state
            .as_mut()
            .expect("multi-threaded strategy used before init")
    }

    fn core_ids(&self) -> SimpleResult<Vec<Option<usize>>> {
        if !self.pin_threads {
            return Ok(vec![None; self.num_threads]);
        }

        let core_ids = core_affinity::get_core_ids().unwrap_or_default();
        if core_ids.len() < self.num_threads {
            return Err(SimpleError::new(format!(
                "cannot pin {} threads to {} cores",
                self.num_threads,
                core_ids.len()
            )));
        }

        Ok(core_ids
            .into_iter()
            .take(self.num_threads)
            .map(|core_id| Some(core_id.id))
            .collect())
    }
}

impl SimulationStrategy for MultiThreadedSim {
    fn init(
        &mut self,
        si: &mut SimulationInfo,
        x_locations: &[f32],
        y_locations: &[f32],
    ) -> SimpleResult<()> {
        if self.num_threads == 0 {
            return Err(SimpleError::new("num_threads must be strictly positive"));
        }

        let num_neurons = si.num_neurons();
        let slots_per_neuron = si.growth.max_synapses_per_neuron;
        let mut workers = Vec::with_capacity(self.num_threads);

        for (worker_id, core_id) in self.core_ids()?.into_iter().enumerate() {
            let range = get_partition_range(self.num_threads, worker_id, num_neurons);
            let mut store = SynapseStore::new();
            store.allocate(range.len() * slots_per_neuron)?;

            let mut worker = Worker {
                range: range.clone(),
                store,
                noise: NoiseSource::new(derive_seed(si.seed, worker_id))?,
                core_id,
                inputs: vec![0.0; range.len()],
            };
            worker.load(&si.synapses[range], &si.grid, slots_per_neuron);
            workers.push(worker);
        }

        debug!(
            "multi-threaded strategy ready: {} workers, {} slots each neuron{}",
            self.num_threads,
            slots_per_neuron,
            if self.pin_threads { ", pinned" } else { "" }
        );

        self.state = Some(State {
            workers,
            growth: GrowthState::new(x_locations, y_locations, si.growth.start_radius),
            slots_per_neuron,
        });

        Ok(())
    }

    fn init_radii(&mut self, prior_radii: &[f32]) {
        self.state_mut().growth.set_radii(prior_radii);
    }

    fn advance_until_growth(&mut self, si: &mut SimulationInfo) {
        let state = self.state_mut();
        let num_neurons = si.num_neurons();
        let start_step = si.simulation_step;
        let end_step = start_step + si.steps_per_epoch();

        let mut contributions: Vec<Mutex<Vec<f32>>> = (0..state.workers.len())
            .map(|_| Mutex::new(vec![0.0; num_neurons]))
            .collect();
        // input left over from the previous epoch
        contributions[0] = Mutex::new(std::mem::take(&mut si.summation));

        let barrier = Barrier::new(state.workers.len());
        let mut neuron_chunks = Vec::with_capacity(state.workers.len());
        let mut rest: &mut [LifNeuron] = &mut si.neurons;
        for worker in &state.workers {
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(worker.range.len());
            neuron_chunks.push(chunk);
            rest = tail;
        }

        let slots_per_neuron = state.slots_per_neuron;
        thread::scope(|scope| {
            for (worker_id, (worker, neurons)) in
                state.workers.iter_mut().zip(neuron_chunks).enumerate()
            {
                let ctx = StepContext {
                    contributions: &contributions,
                    barrier: &barrier,
                    worker_id,
                    slots_per_neuron,
                    steps: start_step..end_step,
                };
                scope.spawn(move || worker.run_epoch(neurons, &ctx));
            }
        });

        let mut summation = vec![0.0; num_neurons];
        for buffer in &contributions {
            for (total, contribution) in summation.iter_mut().zip(lock(buffer).iter()) {
                *total += contribution;
            }
        }
        si.summation = summation;

        for worker in &state.workers {
            worker.store.export_to_per_neuron_lists(
                &mut si.synapses[worker.range.clone()],
                slots_per_neuron,
                &si.grid,
            );
        }

        si.simulation_step = end_step;
    }

    fn update_network(
        &mut self,
        si: &mut SimulationInfo,
        radii_history: &mut HistoryTable,
        rates_history: &mut HistoryTable,
    ) {
        let state = self.state_mut();
        state.growth.grow(si, radii_history, rates_history);

        let slots_per_neuron = state.slots_per_neuron;
        for worker in state.workers.iter_mut() {
            let range = worker.range.clone();
            worker.load(&si.synapses[range], &si.grid, slots_per_neuron);
        }
    }

    fn term(&mut self, _si: &mut SimulationInfo) {
        if let Some(mut state) = self.state.take() {
            for worker in state.workers.iter_mut() {
                worker.store.release();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_util;

    #[test]
    fn pinning_needs_enough_cores() {
        let params = test_util::get_template_network_params();
        let mut si = SimulationInfo::new(&params);
        let mut sut = MultiThreadedSim::new(100_000, true);

        let result = sut.init(&mut si, &[], &[]);
        assert!(result.unwrap_err().as_str().starts_with("cannot pin 100000 threads"));
    }

    #[test]
    fn zero_threads_are_rejected() {
        let params = test_util::get_template_network_params();
        let mut si = SimulationInfo::new(&params);
        let mut sut = MultiThreadedSim::new(0, false);

        assert!(sut.init(&mut si, &[], &[]).is_err());
    }

    #[test]
    fn partitions_cover_all_neurons() {
        let params = test_util::get_template_network_params();
        let mut si = SimulationInfo::new(&params);
        let mut sut = MultiThreadedSim::new(3, false);
        let (x_locations, y_locations) = (si.grid.x_locations(), si.grid.y_locations());
        sut.init(&mut si, &x_locations, &y_locations).unwrap();

        let state = sut.state.as_ref().unwrap();
        let ranges: Vec<_> = state.workers.iter().map(|w| w.range.clone()).collect();
        assert_eq!(ranges, [0..7, 7..14, 14..20]);
        assert_eq!(state.workers[2].store.capacity(), 6 * 8);

        sut.term(&mut si);
        assert!(sut.state.is_none());
    }
}
