//! Deterministic construction of the neuron population.
//!
//! Every random draw comes from one seeded stream, and the order of draws is
//! part of the contract: changing it changes the generated network even for
//! the same seed.

use log::{debug, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use simple_error::{SimpleError, SimpleResult};

use crate::grid::GridLayout;
use crate::neuron::{LifNeuron, EXCITATORY_REFRACTORY_PERIOD, INHIBITORY_REFRACTORY_PERIOD};
use crate::params::{NetworkParams, NeuronRanges, ParamRange};
use crate::types::NeuronType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeuronCounts {
    pub total: usize,
    pub excitatory: usize,
    pub inhibitory: usize,
    pub starter: usize,
}

pub fn compute_neuron_counts(params: &NetworkParams) -> NeuronCounts {
    let total = params.grid.width * params.grid.height;
    let population = &params.population;

    match &population.fixed_layout {
        Some(layout) => NeuronCounts {
            total,
            excitatory: total.saturating_sub(layout.inhibitory.len()),
            inhibitory: layout.inhibitory.len(),
            starter: layout.starters.len(),
        },
        None => {
            let inhibitory = (total as f64 * population.inhibitory_fraction) as usize;
            NeuronCounts {
                total,
                excitatory: total - inhibitory,
                inhibitory,
                starter: (total as f64 * population.starter_fraction) as usize,
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TypeAssignment<'a> {
    Random { inhibitory_count: usize },
    Fixed { inhibitory: &'a [usize] },
}

#[derive(Debug, Clone, Copy)]
pub enum StarterAssignment<'a> {
    Random { target_count: usize },
    Fixed { starters: &'a [usize] },
}

pub struct PopulationBuilder {
    rng: StdRng,
}

impl PopulationBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn assign_neuron_types(
        &mut self,
        grid: &GridLayout,
        assignment: TypeAssignment,
    ) -> SimpleResult<Vec<NeuronType>> {
        let num_neurons = grid.num_neurons();

        match assignment {
            TypeAssignment::Fixed { inhibitory } => {
                debug!(
                    "fixed layout: {} inhibitory, {} excitatory",
                    inhibitory.len(),
                    num_neurons.saturating_sub(inhibitory.len())
                );

                let mut types = vec![NeuronType::Excitatory; num_neurons];
                for index in inhibitory {
                    if !grid.contains_index(*index) {
                        return Err(SimpleError::new(format!(
                            "inhibitory layout index {} is out of range for {} neurons",
                            index, num_neurons
                        )));
                    }
                    types[*index] = NeuronType::Inhibitory;
                }

                Ok(types)
            }
            TypeAssignment::Random { inhibitory_count } => {
                if inhibitory_count > num_neurons {
                    return Err(SimpleError::new(format!(
                        "inhibitory neuron count {} exceeds neuron count {}",
                        inhibitory_count, num_neurons
                    )));
                }

                debug!(
                    "random layout: {} inhibitory, {} excitatory",
                    inhibitory_count,
                    num_neurons - inhibitory_count
                );

                let mut ordered: Vec<NeuronType> = (0..num_neurons)
                    .map(|index| {
                        if index < inhibitory_count {
                            NeuronType::Inhibitory
                        } else {
                            NeuronType::Excitatory
                        }
                    })
                    .collect();

                let mut shuffled = Vec::with_capacity(num_neurons);
                while !ordered.is_empty() {
                    let pick = self.rng.gen_range(0..ordered.len());
                    shuffled.push(ordered.remove(pick));
                }

                Ok(shuffled)
            }
        }
    }

    pub fn assign_starter_neurons(
        &mut self,
        grid: &GridLayout,
        types: &[NeuronType],
        assignment: StarterAssignment,
    ) -> SimpleResult<Vec<bool>> {
        let num_neurons = grid.num_neurons();
        let mut starter_map = vec![false; num_neurons];

        match assignment {
            StarterAssignment::Fixed { starters } => {
                for index in starters {
                    if !grid.contains_index(*index) {
                        return Err(SimpleError::new(format!(
                            "starter layout index {} is out of range for {} neurons",
                            index, num_neurons
                        )));
                    }
                    starter_map[*index] = true;
                }
            }
            StarterAssignment::Random { target_count } => {
                let excitatory_count = types
                    .iter()
                    .filter(|neuron_type| **neuron_type == NeuronType::Excitatory)
                    .count();

                if target_count > excitatory_count {
                    return Err(SimpleError::new(format!(
                        "starter neuron count {} exceeds excitatory neuron count {}",
                        target_count, excitatory_count
                    )));
                }

                let mut allocated = 0;
                while allocated < target_count {
                    let index = self.rng.gen_range(0..num_neurons);

                    if types[index] == NeuronType::Excitatory && !starter_map[index] {
                        starter_map[index] = true;
                        allocated += 1;
                        trace!("starter neuron at index {}", index);
                    }
                }
            }
        }

        debug!(
            "{} starter neurons assigned",
            starter_map.iter().filter(|is_starter| **is_starter).count()
        );

        Ok(starter_map)
    }

    pub fn initialize_biophysics(
        &mut self,
        neuron: &mut LifNeuron,
        ranges: &NeuronRanges,
        delta_t: f32,
        is_inhibitory: bool,
        is_starter: bool,
    ) {
        // one statement per draw: the order below is the stream order
        let i_inject = self.in_range(&ranges.i_inject);
        let i_noise = self.in_range(&ranges.i_noise);
        let v_thresh = self.in_range(&ranges.v_thresh);
        let v_rest = self.in_range(&ranges.v_resting);
        let v_reset = self.in_range(&ranges.v_reset);
        let v_init = self.in_range(&ranges.v_init);
        neuron.set_params(i_inject, i_noise, v_thresh, v_rest, v_reset, v_init, delta_t);

        neuron.t_refract = if is_inhibitory {
            INHIBITORY_REFRACTORY_PERIOD
        } else {
            EXCITATORY_REFRACTORY_PERIOD
        };

        if is_starter {
            neuron.v_thresh = self.in_range(&ranges.starter_v_thresh);
            neuron.v_reset = self.in_range(&ranges.starter_v_reset);
            neuron.t_refract = EXCITATORY_REFRACTORY_PERIOD;
        }
    }

    fn in_range(&mut self, range: &ParamRange) -> f32 {
        range.min + self.rng.gen::<f32>() * (range.max - range.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_util;
    use itertools::Itertools;

    fn count_type(types: &[NeuronType], neuron_type: NeuronType) -> usize {
        types.iter().filter(|t| **t == neuron_type).count()
    }

    #[test]
    fn counts_truncate_fractions() {
        let mut params = test_util::get_template_network_params();
        params.grid.width = 7;
        params.grid.height = 3;
        params.population.inhibitory_fraction = 0.3;
        params.population.excitatory_fraction = 0.7;
        params.population.starter_fraction = 0.15;

        assert_eq!(
            compute_neuron_counts(&params),
            NeuronCounts {
                total: 21,
                excitatory: 15,
                inhibitory: 6,
                starter: 3,
            }
        );
    }

    #[test]
    fn neurons_not_inhibitory_count_as_excitatory() {
        let mut params = test_util::get_template_network_params();
        params.population.inhibitory_fraction = 0.2;
        params.population.excitatory_fraction = 0.5;

        let counts = compute_neuron_counts(&params);
        assert_eq!(counts.inhibitory, 4);
        assert_eq!(counts.excitatory, 16);

        let grid = GridLayout::new(params.grid.width, params.grid.height);
        let types = PopulationBuilder::new(1)
            .assign_neuron_types(
                &grid,
                TypeAssignment::Random {
                    inhibitory_count: counts.inhibitory,
                },
            )
            .unwrap();
        assert_eq!(count_type(&types, NeuronType::Excitatory), counts.excitatory);
    }

    #[test]
    fn counts_from_fixed_layout() {
        let params = test_util::get_fixed_layout_params(5, 2, &[2, 5, 7], &[0, 9]);
        assert_eq!(
            compute_neuron_counts(&params),
            NeuronCounts {
                total: 10,
                excitatory: 7,
                inhibitory: 3,
                starter: 2,
            }
        );
    }

    #[test]
    fn random_types_have_exact_counts() {
        let grid = GridLayout::new(8, 5);

        for seed in 0..10 {
            let mut sut = PopulationBuilder::new(seed);
            let types = sut
                .assign_neuron_types(&grid, TypeAssignment::Random { inhibitory_count: 9 })
                .unwrap();
            assert_eq!(types.len(), 40);
            assert_eq!(count_type(&types, NeuronType::Inhibitory), 9);
            assert_eq!(count_type(&types, NeuronType::Excitatory), 31);
        }
    }

    #[test]
    fn random_types_are_reproducible() {
        let grid = GridLayout::new(10, 10);
        let assignment = TypeAssignment::Random {
            inhibitory_count: 20,
        };

        let first = PopulationBuilder::new(42)
            .assign_neuron_types(&grid, assignment)
            .unwrap();
        let second = PopulationBuilder::new(42)
            .assign_neuron_types(&grid, assignment)
            .unwrap();
        let other = PopulationBuilder::new(43)
            .assign_neuron_types(&grid, assignment)
            .unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn fixed_types_ignore_seed() {
        let grid = GridLayout::new(5, 2);
        let inhibitory = [2, 5, 7];

        for seed in [0, 1, 99] {
            let types = PopulationBuilder::new(seed)
                .assign_neuron_types(&grid, TypeAssignment::Fixed { inhibitory: &inhibitory })
                .unwrap();
            let inhibitory_positions = types
                .iter()
                .positions(|t| *t == NeuronType::Inhibitory)
                .collect_vec();
            assert_eq!(inhibitory_positions, inhibitory);
        }
    }

    #[test]
    fn fixed_types_reject_out_of_range() {
        let grid = GridLayout::new(2, 2);
        let result = PopulationBuilder::new(0)
            .assign_neuron_types(&grid, TypeAssignment::Fixed { inhibitory: &[4] });
        assert_eq!(
            result.unwrap_err().as_str(),
            "inhibitory layout index 4 is out of range for 4 neurons"
        );
    }

    #[test]
    fn random_starters_are_excitatory_and_exact() {
        let grid = GridLayout::new(6, 6);
        let mut sut = PopulationBuilder::new(3);
        let types = sut
            .assign_neuron_types(&grid, TypeAssignment::Random { inhibitory_count: 12 })
            .unwrap();

        let starters = sut
            .assign_starter_neurons(&grid, &types, StarterAssignment::Random { target_count: 24 })
            .unwrap();

        assert_eq!(starters.iter().filter(|s| **s).count(), 24);
        for (index, is_starter) in starters.iter().enumerate() {
            if *is_starter {
                assert_eq!(types[index], NeuronType::Excitatory);
            }
        }
    }

    #[test]
    fn too_many_random_starters_is_an_error() {
        let grid = GridLayout::new(2, 2);
        let types = vec![
            NeuronType::Inhibitory,
            NeuronType::Excitatory,
            NeuronType::Inhibitory,
            NeuronType::Inhibitory,
        ];
        let result = PopulationBuilder::new(0).assign_starter_neurons(
            &grid,
            &types,
            StarterAssignment::Random { target_count: 2 },
        );
        assert_eq!(
            result.unwrap_err().as_str(),
            "starter neuron count 2 exceeds excitatory neuron count 1"
        );
    }

    #[test]
    fn fixed_starters() {
        let grid = GridLayout::new(3, 1);
        let types = vec![NeuronType::Excitatory; 3];
        let starters = PopulationBuilder::new(0)
            .assign_starter_neurons(&grid, &types, StarterAssignment::Fixed { starters: &[2] })
            .unwrap();
        assert_eq!(starters, [false, false, true]);
    }

    #[test]
    fn biophysics_draw_from_ranges() {
        let ranges = NeuronRanges {
            i_inject: ParamRange::new(1.0, 2.0),
            i_noise: ParamRange::new(3.0, 4.0),
            v_thresh: ParamRange::new(10.0, 11.0),
            v_resting: ParamRange::fixed(0.5),
            v_reset: ParamRange::new(5.0, 6.0),
            v_init: ParamRange::new(7.0, 8.0),
            starter_v_thresh: ParamRange::new(20.0, 21.0),
            starter_v_reset: ParamRange::new(30.0, 31.0),
        };

        let mut sut = PopulationBuilder::new(5);

        let mut inhibitory = LifNeuron::new();
        sut.initialize_biophysics(&mut inhibitory, &ranges, 1e-4, true, false);
        assert!((1.0..=2.0).contains(&inhibitory.i_inject));
        assert!((3.0..=4.0).contains(&inhibitory.i_noise));
        assert!((10.0..=11.0).contains(&inhibitory.v_thresh));
        assert_eq!(inhibitory.v_rest, 0.5);
        assert!((5.0..=6.0).contains(&inhibitory.v_reset));
        assert!((7.0..=8.0).contains(&inhibitory.v_init));
        assert_eq!(inhibitory.vm, inhibitory.v_init);
        assert_eq!(inhibitory.t_refract, INHIBITORY_REFRACTORY_PERIOD);

        let mut starter = LifNeuron::new();
        sut.initialize_biophysics(&mut starter, &ranges, 1e-4, false, true);
        assert!((20.0..=21.0).contains(&starter.v_thresh));
        assert!((30.0..=31.0).contains(&starter.v_reset));
        assert_eq!(starter.t_refract, EXCITATORY_REFRACTORY_PERIOD);
    }

    #[test]
    fn biophysics_are_reproducible() {
        let ranges = NeuronRanges::default();
        let mut first = LifNeuron::new();
        let mut second = LifNeuron::new();
        PopulationBuilder::new(8).initialize_biophysics(&mut first, &ranges, 1e-4, false, true);
        PopulationBuilder::new(8).initialize_biophysics(&mut second, &ranges, 1e-4, false, true);
        assert_eq!(first, second);
    }
}
