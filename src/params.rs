use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use simple_error::{try_with, SimpleError, SimpleResult};

use crate::population;
use crate::synapse::{self, DELAY_QUEUE_LENGTH};
use crate::types::{HashSet, SynapseType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    pub grid: GridParams,
    pub population: PopulationParams,
    pub neuron_ranges: NeuronRanges,
    pub growth: GrowthParams,
    /// Simulation step size in seconds.
    pub delta_t: f32,
    pub technical_params: TechnicalParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationParams {
    pub inhibitory_fraction: f64,
    pub excitatory_fraction: f64,
    pub starter_fraction: f64,
    pub fixed_layout: Option<FixedLayout>,
}

/// Explicit neuron placement. Indexes not listed as inhibitory are excitatory.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedLayout {
    pub inhibitory: Vec<usize>,
    pub starters: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuronRanges {
    pub i_inject: ParamRange,
    pub i_noise: ParamRange,
    pub v_thresh: ParamRange,
    pub v_resting: ParamRange,
    pub v_reset: ParamRange,
    pub v_init: ParamRange,
    pub starter_v_thresh: ParamRange,
    pub starter_v_reset: ParamRange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    pub epsilon: f32,
    pub beta: f32,
    pub rho: f32,
    pub target_rate: f32,
    pub min_radius: f32,
    pub start_radius: f32,
    pub epoch_duration: f32,
    pub epoch_count: usize,
    pub max_firing_rate: usize,
    pub max_synapses_per_neuron: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    SingleThreaded,
    MultiThreaded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalParams {
    pub strategy: StrategyKind,
    pub num_threads: Option<usize>,
    pub pin_threads: bool,
    pub seed: u64,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
        }
    }
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            inhibitory_fraction: 0.1,
            excitatory_fraction: 0.9,
            starter_fraction: 0.1,
            fixed_layout: None,
        }
    }
}

impl Default for NeuronRanges {
    fn default() -> Self {
        Self {
            i_inject: ParamRange::fixed(13.5e-9),
            i_noise: ParamRange::new(1.0e-9, 1.5e-9),
            v_thresh: ParamRange::fixed(15.0e-3),
            v_resting: ParamRange::fixed(0.0),
            v_reset: ParamRange::fixed(13.5e-3),
            v_init: ParamRange::fixed(13.0e-3),
            starter_v_thresh: ParamRange::new(13.565e-3, 13.655e-3),
            starter_v_reset: ParamRange::fixed(13.0e-3),
        }
    }
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            epsilon: 0.6,
            beta: 0.1,
            rho: 0.0001,
            target_rate: 1.9,
            min_radius: 0.1,
            start_radius: 0.4,
            epoch_duration: 100.0,
            epoch_count: 10,
            max_firing_rate: 200,
            max_synapses_per_neuron: 200,
        }
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            grid: GridParams::default(),
            population: PopulationParams::default(),
            neuron_ranges: NeuronRanges::default(),
            growth: GrowthParams::default(),
            delta_t: 1e-4,
            technical_params: TechnicalParams::default(),
        }
    }
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::SingleThreaded
    }
}

impl Default for TechnicalParams {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            num_threads: None,
            pin_threads: false,
            seed: 1,
        }
    }
}

impl GrowthParams {
    pub fn max_rate(&self) -> f32 {
        self.target_rate / self.epsilon
    }

    pub fn steps_per_epoch(&self, delta_t: f32) -> u64 {
        (self.epoch_duration / delta_t).round() as u64
    }
}

/// Reads parameters from a YAML or JSON file, by extension.
pub fn load_network_params<P: AsRef<Path>>(path: P) -> SimpleResult<NetworkParams> {
    let path = path.as_ref();
    let content = try_with!(
        fs::read_to_string(path),
        "cannot read parameter file {}",
        path.display()
    );

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let params: NetworkParams = if is_json {
        try_with!(serde_json::from_str(&content), "invalid JSON parameters")
    } else {
        try_with!(serde_yaml::from_str(&content), "invalid YAML parameters")
    };

    Ok(params)
}

pub fn validate_network_params(params: &NetworkParams) -> Result<(), SimpleError> {
    validate_grid_params(&params.grid)?;
    validate_population_params(params)?;
    validate_neuron_ranges(&params.neuron_ranges)?;
    validate_growth_params(&params.growth)?;
    validate_delta_t(params)?;
    validate_technical_params(&params.technical_params)?;

    Ok(())
}

fn validate_grid_params(grid_params: &GridParams) -> Result<(), SimpleError> {
    if grid_params.width == 0 {
        return Err(SimpleError::new("grid width must be strictly positive"));
    }

    if grid_params.height == 0 {
        return Err(SimpleError::new("grid height must be strictly positive"));
    }

    match grid_params.width.checked_mul(grid_params.height) {
        Some(num_neurons) if num_neurons <= i32::MAX as usize => {}
        _ => return Err(SimpleError::new("grid has too many neurons")),
    }

    Ok(())
}

fn validate_fraction(name: &str, fraction: f64) -> Result<(), SimpleError> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(SimpleError::new(format!("{} must be in [0, 1]", name)));
    }

    Ok(())
}

fn validate_population_params(params: &NetworkParams) -> Result<(), SimpleError> {
    let population = &params.population;
    let num_neurons = params.grid.width * params.grid.height;

    validate_fraction("inhibitory_fraction", population.inhibitory_fraction)?;
    validate_fraction("excitatory_fraction", population.excitatory_fraction)?;
    validate_fraction("starter_fraction", population.starter_fraction)?;

    if population.inhibitory_fraction + population.excitatory_fraction > 1.0 + 1e-9 {
        return Err(SimpleError::new(
            "inhibitory_fraction and excitatory_fraction must not sum to more than 1",
        ));
    }

    if let Some(layout) = &population.fixed_layout {
        validate_fixed_layout(layout, num_neurons)?;
    } else {
        let counts = population::compute_neuron_counts(params);
        if counts.starter > num_neurons - counts.inhibitory {
            return Err(SimpleError::new(format!(
                "starter neuron count {} exceeds excitatory neuron count {}",
                counts.starter,
                num_neurons - counts.inhibitory
            )));
        }
    }

    Ok(())
}

fn validate_layout_indexes(
    name: &str,
    indexes: &[usize],
    num_neurons: usize,
) -> Result<HashSet<usize>, SimpleError> {
    let mut seen = HashSet::default();

    for index in indexes {
        if *index >= num_neurons {
            return Err(SimpleError::new(format!(
                "{} layout index {} is out of range for {} neurons",
                name, index, num_neurons
            )));
        }

        if !seen.insert(*index) {
            return Err(SimpleError::new(format!(
                "duplicate {} layout index {}",
                name, index
            )));
        }
    }

    Ok(seen)
}

fn validate_fixed_layout(layout: &FixedLayout, num_neurons: usize) -> Result<(), SimpleError> {
    let inhibitory = validate_layout_indexes("inhibitory", &layout.inhibitory, num_neurons)?;
    validate_layout_indexes("starter", &layout.starters, num_neurons)?;

    if let Some(index) = layout
        .starters
        .iter()
        .find(|index| inhibitory.contains(index))
    {
        return Err(SimpleError::new(format!(
            "starter neuron {} must not be inhibitory",
            index
        )));
    }

    Ok(())
}

fn validate_range(name: &str, range: &ParamRange) -> Result<(), SimpleError> {
    if !range.min.is_finite() || !range.max.is_finite() {
        return Err(SimpleError::new(format!("{}: bounds must be finite", name)));
    }

    if range.min > range.max {
        return Err(SimpleError::new(format!(
            "{}: min must not be greater than max",
            name
        )));
    }

    Ok(())
}

fn validate_neuron_ranges(ranges: &NeuronRanges) -> Result<(), SimpleError> {
    validate_range("i_inject", &ranges.i_inject)?;
    validate_range("i_noise", &ranges.i_noise)?;
    validate_range("v_thresh", &ranges.v_thresh)?;
    validate_range("v_resting", &ranges.v_resting)?;
    validate_range("v_reset", &ranges.v_reset)?;
    validate_range("v_init", &ranges.v_init)?;
    validate_range("starter_v_thresh", &ranges.starter_v_thresh)?;
    validate_range("starter_v_reset", &ranges.starter_v_reset)?;

    Ok(())
}

fn validate_growth_params(growth_params: &GrowthParams) -> Result<(), SimpleError> {
    for (name, value) in [
        ("epsilon", growth_params.epsilon),
        ("beta", growth_params.beta),
        ("rho", growth_params.rho),
        ("target_rate", growth_params.target_rate),
        ("min_radius", growth_params.min_radius),
        ("start_radius", growth_params.start_radius),
        ("epoch_duration", growth_params.epoch_duration),
    ] {
        if !value.is_finite() {
            return Err(SimpleError::new(format!("{} must be finite", name)));
        }
    }

    if growth_params.epsilon <= 0.0 {
        return Err(SimpleError::new("epsilon must be strictly positive"));
    }

    if growth_params.beta <= 0.0 {
        return Err(SimpleError::new("beta must be strictly positive"));
    }

    if growth_params.rho < 0.0 {
        return Err(SimpleError::new("rho must not be negative"));
    }

    if growth_params.target_rate <= 0.0 {
        return Err(SimpleError::new("target_rate must be strictly positive"));
    }

    if growth_params.min_radius < 0.0 {
        return Err(SimpleError::new("min_radius must not be negative"));
    }

    if growth_params.start_radius < growth_params.min_radius {
        return Err(SimpleError::new(
            "start_radius must not be less than min_radius",
        ));
    }

    if growth_params.epoch_duration <= 0.0 {
        return Err(SimpleError::new("epoch_duration must be strictly positive"));
    }

    if growth_params.max_synapses_per_neuron == 0 {
        return Err(SimpleError::new(
            "max_synapses_per_neuron must be strictly positive",
        ));
    }

    Ok(())
}

fn validate_delta_t(params: &NetworkParams) -> Result<(), SimpleError> {
    let delta_t = params.delta_t;

    if !delta_t.is_finite() || delta_t <= 0.0 {
        return Err(SimpleError::new("delta_t must be finite and strictly positive"));
    }

    if params.growth.epoch_duration < delta_t {
        return Err(SimpleError::new(
            "epoch_duration must not be less than delta_t",
        ));
    }

    for syn_type in [SynapseType::II, SynapseType::IE, SynapseType::EI, SynapseType::EE] {
        let total_delay = synapse::total_delay_steps(syn_type.stp_constants().delay, delta_t);
        if total_delay >= DELAY_QUEUE_LENGTH {
            return Err(SimpleError::new(format!(
                "delta_t too small: {:?} delay of {} steps does not fit the delay queue",
                syn_type, total_delay
            )));
        }
    }

    Ok(())
}

fn validate_technical_params(technical_params: &TechnicalParams) -> Result<(), SimpleError> {
    if let Some(num_threads) = technical_params.num_threads {
        if num_threads == 0 {
            return Err(SimpleError::new("num_threads must be strictly positive"));
        }

        if technical_params.pin_threads && num_cpus::get() < num_threads {
            return Err(SimpleError::new(
                "num_threads must not be greater than number of available CPUs when pinning threads",
            ));
        }
    }

    Ok(())
}
