use gridgrowth::params::NetworkParams;

pub fn get_scenario_params() -> NetworkParams {
    let params_yaml_str = r#"
grid:
  width: 20
  height: 20
population:
  inhibitory_fraction: 0.1
  excitatory_fraction: 0.9
  starter_fraction: 0.1
  fixed_layout: null
neuron_ranges:
  i_inject: { min: 13.5e-9, max: 13.5e-9 }
  i_noise: { min: 1.0e-9, max: 1.5e-9 }
  v_thresh: { min: 15.0e-3, max: 15.0e-3 }
  v_resting: { min: 0.0, max: 0.0 }
  v_reset: { min: 13.5e-3, max: 13.5e-3 }
  v_init: { min: 13.0e-3, max: 13.0e-3 }
  starter_v_thresh: { min: 13.565e-3, max: 13.655e-3 }
  starter_v_reset: { min: 13.0e-3, max: 13.0e-3 }
growth:
  epsilon: 0.6
  beta: 0.1
  rho: 0.0001
  target_rate: 1.9
  min_radius: 0.1
  start_radius: 0.4
  epoch_duration: 1.0
  epoch_count: 5
  max_firing_rate: 200
  max_synapses_per_neuron: 32
delta_t: 1.0e-4
technical_params:
  strategy: SingleThreaded
  num_threads: null
  pin_threads: false
  seed: 0
"#;

    serde_yaml::from_str(params_yaml_str).unwrap()
}
