use log::debug;
use simple_error::SimpleResult;

use crate::growth::GrowthState;
use crate::history::HistoryTable;
use crate::strategy::{SimulationInfo, SimulationStrategy};
use crate::util::{derive_seed, NoiseSource};

struct State {
    noise: NoiseSource,
    growth: GrowthState,
}

/// Steps neurons and per-neuron synapse lists on the calling thread.
#[derive(Default)]
pub struct SingleThreadedSim {
    state: Option<State>,
}

impl SingleThreadedSim {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut State {
        self.state
            .as_mut()
            .expect("single-threaded strategy used before init")
    }
}

impl SimulationStrategy for SingleThreadedSim {
    fn init(
        &mut self,
        si: &mut SimulationInfo,
        x_locations: &[f32],
        y_locations: &[f32],
    ) -> SimpleResult<()> {
        for synapse in si.synapses.iter_mut().flatten() {
            synapse.bind(&si.grid);
        }

        self.state = Some(State {
            noise: NoiseSource::new(derive_seed(si.seed, 0))?,
            growth: GrowthState::new(x_locations, y_locations, si.growth.start_radius),
        });

        debug!("single-threaded strategy ready for {} neurons", si.num_neurons());
        Ok(())
    }

    fn init_radii(&mut self, prior_radii: &[f32]) {
        self.state_mut().growth.set_radii(prior_radii);
    }

    fn advance_until_growth(&mut self, si: &mut SimulationInfo) {
        let noise = &mut self.state_mut().noise;
        let end_step = si.simulation_step + si.steps_per_epoch();

        for step in si.simulation_step..end_step {
            for (i, neuron) in si.neurons.iter_mut().enumerate() {
                let input = si.summation[i];
                si.summation[i] = 0.0;

                if neuron.advance(input, step, noise) {
                    for synapse in si.synapses[i].iter_mut() {
                        synapse.pre_spike_hit();
                    }
                }
            }

            for synapse in si.synapses.iter_mut().flatten() {
                synapse.advance(step, &mut si.summation);
            }
        }

        si.simulation_step = end_step;
    }

    fn update_network(
        &mut self,
        si: &mut SimulationInfo,
        radii_history: &mut HistoryTable,
        rates_history: &mut HistoryTable,
    ) {
        self.state_mut()
            .growth
            .grow(si, radii_history, rates_history);
    }

    fn term(&mut self, _si: &mut SimulationInfo) {
        self.state = None;
    }
}
