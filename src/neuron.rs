use crate::util::NoiseSource;

pub const DEFAULT_CM: f32 = 3e-8;
pub const DEFAULT_RM: f32 = 1e6;
pub const INHIBITORY_REFRACTORY_PERIOD: f32 = 2e-3;
pub const EXCITATORY_REFRACTORY_PERIOD: f32 = 3e-3;

/// Leaky integrate-and-fire neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct LifNeuron {
    pub cm: f32,
    pub rm: f32,
    pub v_thresh: f32,
    pub v_rest: f32,
    pub v_reset: f32,
    pub v_init: f32,
    pub t_refract: f32,
    pub i_noise: f32,
    pub i_inject: f32,
    pub i_syn: f32,
    pub refractory_steps: i32,
    pub c1: f32,
    pub c2: f32,
    pub i0: f32,
    pub vm: f32,
    pub has_fired: bool,
    pub tau: f32,
    pub delta_t: f32,
    pub spike_count: u32,
    /// Steps at which the neuron fired over the whole run.
    pub spike_history: Vec<u64>,
}

impl LifNeuron {
    pub fn new() -> Self {
        let mut neuron = Self {
            cm: DEFAULT_CM,
            rm: DEFAULT_RM,
            v_thresh: 0.0,
            v_rest: 0.0,
            v_reset: 0.0,
            v_init: 0.0,
            t_refract: EXCITATORY_REFRACTORY_PERIOD,
            i_noise: 0.0,
            i_inject: 0.0,
            i_syn: 0.0,
            refractory_steps: 0,
            c1: 0.0,
            c2: 0.0,
            i0: 0.0,
            vm: 0.0,
            has_fired: false,
            tau: 0.0,
            delta_t: 1e-4,
            spike_count: 0,
            spike_history: Vec::new(),
        };
        neuron.update_internal();
        neuron
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_params(
        &mut self,
        i_inject: f32,
        i_noise: f32,
        v_thresh: f32,
        v_rest: f32,
        v_reset: f32,
        v_init: f32,
        delta_t: f32,
    ) {
        self.i_inject = i_inject;
        self.i_noise = i_noise;
        self.v_thresh = v_thresh;
        self.v_rest = v_rest;
        self.v_reset = v_reset;
        self.v_init = v_init;
        self.vm = v_init;
        self.delta_t = delta_t;
        self.update_internal();
    }

    fn update_internal(&mut self) {
        self.tau = self.cm * self.rm;
        if self.tau > 0.0 {
            self.c1 = (-self.delta_t / self.tau).exp();
            self.c2 = self.rm * (1.0 - self.c1);
        } else {
            self.c1 = 0.0;
            self.c2 = self.rm;
        }

        if self.rm > 0.0 {
            self.i0 = self.i_inject + self.v_rest / self.rm;
        } else {
            self.i0 = self.i_inject;
        }
    }

    /// Integrates one step with the given synaptic input. Returns whether the
    /// neuron fired.
    pub fn advance(&mut self, synaptic_input: f32, step: u64, noise: &mut NoiseSource) -> bool {
        self.has_fired = false;

        if self.refractory_steps > 0 {
            self.refractory_steps -= 1;
            self.i_syn = 0.0;
            return false;
        }

        self.i_syn = synaptic_input;
        let i_noise = self.i_noise * noise.sample();
        self.vm = self.c1 * self.vm + self.c2 * (self.i0 + self.i_syn + i_noise);

        if self.vm >= self.v_thresh {
            self.fire(step);
        }

        self.has_fired
    }

    fn fire(&mut self, step: u64) {
        self.has_fired = true;
        self.spike_count += 1;
        self.spike_history.push(step);
        self.refractory_steps = (self.t_refract / self.delta_t + 0.5) as i32;
        self.vm = self.v_reset;
    }

    pub fn clear_spike_count(&mut self) {
        self.spike_count = 0;
    }
}

impl Default for LifNeuron {
    fn default() -> Self {
        Self::new()
    }
}
