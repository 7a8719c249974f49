use simple_error::{try_with, SimpleResult};
use statrs::distribution::Normal;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use rand::{prelude::Distribution, rngs::StdRng, SeedableRng};

/// Seed for an independent random stream, stable for a given `(seed, stream_id)`.
pub fn derive_seed(seed: u64, stream_id: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    (seed, stream_id).hash(&mut hasher);
    hasher.finish()
}

/// Per-thread source of standard normal samples for membrane noise.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: StdRng,
    normal: Normal,
}

impl NoiseSource {
    pub fn new(seed: u64) -> SimpleResult<Self> {
        let normal = try_with!(Normal::new(0.0, 1.0), "cannot create noise distribution");
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            normal,
        })
    }

    pub fn sample(&mut self) -> f32 {
        self.normal.sample(&mut self.rng) as f32
    }
}

pub fn get_partition_range(
    num_threads: usize,
    thread_id: usize,
    num_neurons: usize,
) -> Range<usize> {
    let min_partition_size = num_neurons / num_threads;
    let remainder = num_neurons % num_threads;

    if thread_id < remainder {
        let partition_size = min_partition_size + 1;
        let start = partition_size * thread_id;
        let end = start + partition_size;
        Range { start, end }
    } else {
        let start =
            (min_partition_size + 1) * remainder + min_partition_size * (thread_id - remainder);
        let end = start + min_partition_size;
        Range { start, end }
    }
}

#[cfg(test)]
pub mod test_util {
    use crate::params::{FixedLayout, NetworkParams};
    use float_cmp::{assert_approx_eq, ApproxEq};
    use std::fmt::Debug;

    pub fn assert_approx_eq_slice<T>(left: &[T], right: &[T])
    where
        T: ApproxEq + Debug + Copy,
    {
        assert_eq!(left.len(), right.len());

        for item in left.iter().zip(right) {
            assert_approx_eq!(T, *item.0, *item.1);
        }
    }

    pub fn get_template_network_params() -> NetworkParams {
        let mut params = NetworkParams::default();
        params.grid.width = 5;
        params.grid.height = 4;
        params.population.inhibitory_fraction = 0.25;
        params.population.excitatory_fraction = 0.75;
        params.population.starter_fraction = 0.1;
        params.growth.epoch_duration = 0.01;
        params.growth.epoch_count = 2;
        params.growth.max_synapses_per_neuron = 8;
        params.technical_params.seed = 7;
        params
    }

    pub fn get_fixed_layout_params(
        width: usize,
        height: usize,
        inhibitory: &[usize],
        starters: &[usize],
    ) -> NetworkParams {
        let mut params = get_template_network_params();
        params.grid.width = width;
        params.grid.height = height;
        params.population.fixed_layout = Some(FixedLayout {
            inhibitory: inhibitory.to_vec(),
            starters: starters.to_vec(),
        });
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_range() {
        assert_eq!(get_partition_range(1, 0, 11), Range { start: 0, end: 11 });

        assert_eq!(get_partition_range(2, 0, 11), Range { start: 0, end: 6 });
        assert_eq!(get_partition_range(2, 1, 11), Range { start: 6, end: 11 });

        assert_eq!(get_partition_range(3, 0, 11), Range { start: 0, end: 4 });
        assert_eq!(get_partition_range(3, 1, 11), Range { start: 4, end: 8 });
        assert_eq!(get_partition_range(3, 2, 11), Range { start: 8, end: 11 });

        for i in 0..11 {
            assert_eq!(
                get_partition_range(11, i, 11),
                Range {
                    start: i,
                    end: i + 1
                }
            );
        }

        assert_eq!(get_partition_range(4, 3, 2), Range { start: 2, end: 2 });
    }

    #[test]
    fn derived_seeds_are_stable_and_distinct() {
        assert_eq!(derive_seed(3, 0), derive_seed(3, 0));
        assert_ne!(derive_seed(3, 0), derive_seed(3, 1));
        assert_ne!(derive_seed(3, 0), derive_seed(4, 0));
    }

    #[test]
    fn noise_is_reproducible() {
        let mut first = NoiseSource::new(11).unwrap();
        let mut second = NoiseSource::new(11).unwrap();

        for _ in 0..10 {
            assert_eq!(first.sample(), second.sample());
        }
    }
}
