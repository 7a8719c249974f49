//! Struct-of-arrays synapse storage.
//!
//! Slot `i * slots_per_neuron + j` holds the `j`-th synapse of neuron `i`.
//! The per-neuron list form is used while connectivity is mutated; this form is
//! used for per-step updates. Conversion between the two keeps list order equal
//! to ascending slot order within a neuron's slot range.

use simple_error::{SimpleError, SimpleResult};

use crate::grid::{Coordinate, GridLayout};
use crate::synapse::{apply_short_term_plasticity, DelayQueue, DynamicSynapse};
use crate::types::SynapseType;

#[derive(Debug, Default)]
pub struct SynapseStore {
    allocated: bool,
    in_use: Vec<bool>,
    summation_point: Vec<Option<usize>>,
    summation_coord: Vec<Coordinate>,
    synapse_coord: Vec<Coordinate>,
    delta_t: Vec<f32>,
    w: Vec<f32>,
    psr: Vec<f32>,
    decay: Vec<f32>,
    total_delay: Vec<u32>,
    syn_type: Vec<SynapseType>,
    delay_queue: Vec<u32>,
    delay_queue_len: Vec<u32>,
    delay_idx: Vec<u32>,
    tau: Vec<f32>,
    r: Vec<f32>,
    u: Vec<f32>,
    last_spike: Vec<Option<u64>>,
}

impl SynapseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    pub fn capacity(&self) -> usize {
        self.in_use.len()
    }

    pub fn allocate(&mut self, count: usize) -> SimpleResult<()> {
        if self.allocated {
            return Err(SimpleError::new(format!(
                "synapse store already holds {} slots and must be released first",
                self.capacity()
            )));
        }

        self.in_use = vec![false; count];
        self.summation_point = vec![None; count];
        self.summation_coord = vec![Coordinate::default(); count];
        self.synapse_coord = vec![Coordinate::default(); count];
        self.delta_t = vec![0.0; count];
        self.w = vec![0.0; count];
        self.psr = vec![0.0; count];
        self.decay = vec![0.0; count];
        self.total_delay = vec![0; count];
        self.syn_type = vec![SynapseType::II; count];
        self.delay_queue = vec![0; count];
        self.delay_queue_len = vec![0; count];
        self.delay_idx = vec![0; count];
        self.tau = vec![0.0; count];
        self.r = vec![0.0; count];
        self.u = vec![0.0; count];
        self.last_spike = vec![None; count];
        self.allocated = true;

        Ok(())
    }

    pub fn release(&mut self) {
        *self = Self::default();
    }

    pub fn is_in_use(&self, index: usize) -> bool {
        self.in_use[index]
    }

    pub fn num_in_use(&self) -> usize {
        self.in_use.iter().filter(|in_use| **in_use).count()
    }

    pub fn write_slot(&mut self, index: usize, synapse: &DynamicSynapse) {
        self.in_use[index] = true;
        self.summation_point[index] = None;
        self.summation_coord[index] = synapse.destination;
        self.synapse_coord[index] = synapse.source;
        self.delta_t[index] = synapse.delta_t;
        self.w[index] = synapse.w;
        self.psr[index] = synapse.psr;
        self.decay[index] = synapse.decay;
        self.total_delay[index] = synapse.total_delay;
        self.syn_type[index] = synapse.syn_type;
        self.delay_queue[index] = synapse.delay_queue.bits;
        self.delay_queue_len[index] = synapse.delay_queue.len;
        self.delay_idx[index] = synapse.delay_queue.idx;
        self.tau[index] = synapse.tau;
        self.r[index] = synapse.r;
        self.u[index] = synapse.u;
        self.last_spike[index] = synapse.last_spike;
    }

    /// Copies slot `index` out. The slot must be in use.
    pub fn read_slot(&self, index: usize) -> DynamicSynapse {
        assert!(self.in_use[index], "read of unused synapse slot {}", index);

        DynamicSynapse {
            source: self.synapse_coord[index],
            destination: self.summation_coord[index],
            summation_point: self.summation_point[index],
            w: self.w[index],
            psr: self.psr[index],
            decay: self.decay[index],
            delta_t: self.delta_t[index],
            tau: self.tau[index],
            r: self.r[index],
            u: self.u[index],
            total_delay: self.total_delay[index],
            delay_queue: self.delay_queue_at(index),
            last_spike: self.last_spike[index],
            syn_type: self.syn_type[index],
        }
    }

    pub fn try_read_slot(&self, index: usize) -> Option<DynamicSynapse> {
        match self.in_use.get(index) {
            Some(true) => Some(self.read_slot(index)),
            _ => None,
        }
    }

    /// Rewrites `lists[i]` from the in-use slots of neuron `i`, in ascending
    /// slot order, binding each entry to its destination's summation slot.
    pub fn export_to_per_neuron_lists(
        &self,
        lists: &mut [Vec<DynamicSynapse>],
        slots_per_neuron: usize,
        grid: &GridLayout,
    ) {
        assert!(lists.len() * slots_per_neuron <= self.capacity());

        for (neuron_idx, list) in lists.iter_mut().enumerate() {
            list.clear();
            let slot_start = neuron_idx * slots_per_neuron;

            for slot in slot_start..slot_start + slots_per_neuron {
                if self.in_use[slot] {
                    let mut synapse = self.read_slot(slot);
                    synapse.bind(grid);
                    list.push(synapse);
                }
            }
        }
    }

    pub fn import_from_per_neuron_lists(
        &mut self,
        lists: &[Vec<DynamicSynapse>],
        slots_per_neuron: usize,
    ) {
        assert!(lists.len() * slots_per_neuron <= self.capacity());
        self.in_use.iter_mut().for_each(|in_use| *in_use = false);

        for (neuron_idx, list) in lists.iter().enumerate() {
            assert!(
                list.len() <= slots_per_neuron,
                "neuron {} has {} synapses, more than {} slots",
                neuron_idx,
                list.len(),
                slots_per_neuron
            );

            let slot_start = neuron_idx * slots_per_neuron;
            for (offset, synapse) in list.iter().enumerate() {
                self.write_slot(slot_start + offset, synapse);
            }
        }
    }

    /// Rebinds every in-use slot to the summation buffer.
    pub fn bind_summation_points(&mut self, grid: &GridLayout) {
        for slot in 0..self.capacity() {
            if self.in_use[slot] {
                self.summation_point[slot] = Some(grid.index_of(&self.summation_coord[slot]));
            }
        }
    }

    pub fn summation_target(&self, index: usize) -> Option<usize> {
        self.summation_point[index]
    }

    pub fn pre_spike_hit(&mut self, index: usize) {
        let mut queue = self.delay_queue_at(index);
        queue.schedule(self.total_delay[index]);
        self.delay_queue[index] = queue.bits;
    }

    /// Advances slot `index` by one step and returns its post-synaptic response.
    pub fn advance_slot(&mut self, index: usize, step: u64) -> f32 {
        let mut queue = self.delay_queue_at(index);

        if queue.take_due() {
            apply_short_term_plasticity(
                &mut self.r[index],
                &mut self.u[index],
                &mut self.last_spike[index],
                step,
                self.delta_t[index],
                &self.syn_type[index].stp_constants(),
            );
            self.psr[index] += (self.w[index] / self.decay[index]) * self.u[index] * self.r[index];
        }

        self.psr[index] *= self.decay[index];
        queue.advance();

        self.delay_queue[index] = queue.bits;
        self.delay_idx[index] = queue.idx;

        self.psr[index]
    }

    fn delay_queue_at(&self, index: usize) -> DelayQueue {
        DelayQueue {
            bits: self.delay_queue[index],
            len: self.delay_queue_len[index],
            idx: self.delay_idx[index],
        }
    }
}
