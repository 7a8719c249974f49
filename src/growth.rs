//! Activity-dependent outgrowth: firing rates drive neurite radii, and the
//! overlap of neighbouring neurite fields sets connection weights.

use log::debug;
use std::f32::consts::PI;

use crate::history::HistoryTable;
use crate::neuron::LifNeuron;
use crate::params::GrowthParams;
use crate::strategy::SimulationInfo;
use crate::synapse::DynamicSynapse;
use crate::types::SynapseType;

pub const SYNAPSE_STRENGTH_ADJUSTMENT: f32 = 1e-8;

/// Area shared by two circles of radius `r1` and `r2` whose centres are `distance` apart.
pub fn overlap_area(r1: f32, r2: f32, distance: f32) -> f32 {
    if distance >= r1 + r2 {
        return 0.0;
    }

    if distance <= (r1 - r2).abs() {
        let r = r1.min(r2);
        return PI * r * r;
    }

    let d2 = distance * distance;
    let r1_2 = r1 * r1;
    let r2_2 = r2 * r2;
    let alpha = ((d2 + r1_2 - r2_2) / (2.0 * distance * r1)).clamp(-1.0, 1.0).acos();
    let beta = ((d2 + r2_2 - r1_2) / (2.0 * distance * r2)).clamp(-1.0, 1.0).acos();
    let kite = (-distance + r1 + r2)
        * (distance + r1 - r2)
        * (distance - r1 + r2)
        * (distance + r1 + r2);

    r1_2 * alpha + r2_2 * beta - 0.5 * kite.max(0.0).sqrt()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityChanges {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct GrowthState {
    pub radii: Vec<f32>,
    pub rates: Vec<f32>,
    x_locations: Vec<f32>,
    y_locations: Vec<f32>,
}

impl GrowthState {
    pub fn new(x_locations: &[f32], y_locations: &[f32], start_radius: f32) -> Self {
        assert_eq!(x_locations.len(), y_locations.len());
        let num_neurons = x_locations.len();

        Self {
            radii: vec![start_radius; num_neurons],
            rates: vec![0.0; num_neurons],
            x_locations: x_locations.to_vec(),
            y_locations: y_locations.to_vec(),
        }
    }

    pub fn set_radii(&mut self, radii: &[f32]) {
        self.radii.copy_from_slice(radii);
    }

    fn distance(&self, a: usize, b: usize) -> f32 {
        let dx = self.x_locations[a] - self.x_locations[b];
        let dy = self.y_locations[a] - self.y_locations[b];
        (dx * dx + dy * dy).sqrt()
    }

    /// Converts the epoch's spike counts to rates and clears the counts.
    pub fn update_rates(&mut self, neurons: &mut [LifNeuron], epoch_duration: f32) {
        for (rate, neuron) in self.rates.iter_mut().zip(neurons.iter_mut()) {
            *rate = neuron.spike_count as f32 / epoch_duration;
            neuron.clear_spike_count();
        }
    }

    pub fn update_radii(&mut self, growth: &GrowthParams, max_rate: f32) {
        for (radius, rate) in self.radii.iter_mut().zip(&self.rates) {
            let outgrowth =
                1.0 - 2.0 / (1.0 + ((growth.epsilon - rate / max_rate) / growth.beta).exp());
            *radius += growth.epoch_duration * growth.rho * outgrowth;

            if *radius < growth.min_radius {
                *radius = growth.min_radius;
            }
        }
    }

    /// Adds, reweights or removes the synapse `a -> b` for every ordered pair.
    pub fn update_weights(&self, si: &mut SimulationInfo) -> ConnectivityChanges {
        let num_neurons = si.num_neurons();
        let max_synapses = si.growth.max_synapses_per_neuron;
        let mut changes = ConnectivityChanges::default();

        for a in 0..num_neurons {
            let source = si.grid.coordinate_of(a);

            for b in (0..num_neurons).filter(|b| *b != a) {
                let destination = si.grid.coordinate_of(b);
                let syn_type = SynapseType::between(si.neuron_types[a], si.neuron_types[b]);
                let area = overlap_area(self.radii[a], self.radii[b], self.distance(a, b));
                let w = area * syn_type.sign() * SYNAPSE_STRENGTH_ADJUSTMENT;

                let outgoing = &mut si.synapses[a];
                let existing = outgoing
                    .iter()
                    .position(|synapse| synapse.destination == destination);

                match existing {
                    Some(pos) if w == 0.0 => {
                        outgoing.remove(pos);
                        changes.removed += 1;
                    }
                    Some(pos) => {
                        outgoing[pos].w = w;
                        changes.updated += 1;
                    }
                    None if w != 0.0 && outgoing.len() < max_synapses => {
                        outgoing.push(DynamicSynapse::new(
                            source,
                            destination,
                            b,
                            w,
                            si.delta_t,
                            syn_type,
                        ));
                        changes.added += 1;
                    }
                    None => {}
                }
            }
        }

        changes
    }

    /// One growth step for the current epoch, filling that epoch's history rows.
    pub fn grow(
        &mut self,
        si: &mut SimulationInfo,
        radii_history: &mut HistoryTable,
        rates_history: &mut HistoryTable,
    ) {
        self.update_rates(&mut si.neurons, si.growth.epoch_duration);
        self.update_radii(&si.growth, si.max_rate);

        rates_history.set_row(si.current_epoch, &self.rates);
        radii_history.set_row(si.current_epoch, &self.radii);

        let changes = self.update_weights(si);
        debug!(
            "epoch {}: {} synapses added, {} updated, {} removed, {} total",
            si.current_epoch,
            changes.added,
            changes.updated,
            changes.removed,
            si.num_synapses()
        );
    }
}
