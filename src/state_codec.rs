//! XML state-history document and little-endian binary checkpoint.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use itertools::Itertools;
use std::fmt::Display;
use std::io::{self, Read, Write};

use crate::grid::{Coordinate, GridLayout};
use crate::history::{HistoryTable, SpikeHistograms};
use crate::neuron::LifNeuron;
use crate::synapse::{DelayQueue, DynamicSynapse, DELAY_QUEUE_LENGTH};
use crate::types::{NeuronType, SynapseType};

const XML_DECLARATION: &str = r#"<?xml version="1.0" standalone="no"?>"#;
const XML_COMMENT: &str = "<!-- State output file for the DCT growth modeling-->";
const NO_LAST_SPIKE: u64 = u64::MAX;

/// What a checkpoint must agree with to be restored into a network.
#[derive(Debug, Clone, Copy)]
pub struct CheckpointTarget {
    pub grid: GridLayout,
    pub delta_t: f32,
    pub max_synapses_per_neuron: usize,
}

/// Everything the state document reports, borrowed from the network.
pub struct StateDocument<'a> {
    pub radii_history: &'a HistoryTable,
    pub rates_history: &'a HistoryTable,
    pub histograms: &'a SpikeHistograms,
    pub grid: &'a GridLayout,
    pub neurons: &'a [LifNeuron],
    pub neuron_types: &'a [NeuronType],
    pub starter_map: &'a [bool],
    pub epoch_duration: f32,
    pub simulation_end_time: f32,
}

pub fn write_matrix_xml<W: Write, T: Display>(
    out: &mut W,
    name: &str,
    num_rows: usize,
    num_columns: usize,
    values: &[T],
) -> io::Result<()> {
    debug_assert_eq!(values.len(), num_rows * num_columns);

    writeln!(
        out,
        r#"<Matrix name="{}" type="complete" rows="{}" columns="{}" multiplier="1.0">"#,
        name, num_rows, num_columns
    )?;

    if num_columns > 0 {
        for row in values.chunks(num_columns) {
            writeln!(out, "   {}", row.iter().join(" "))?;
        }
    }

    writeln!(out, "</Matrix>")
}

fn write_table_xml<W: Write>(out: &mut W, name: &str, table: &HistoryTable) -> io::Result<()> {
    write_matrix_xml(
        out,
        name,
        table.num_rows(),
        table.num_columns(),
        table.values(),
    )
}

fn write_vector_xml<W: Write, T: Display>(out: &mut W, name: &str, values: &[T]) -> io::Result<()> {
    write_matrix_xml(out, name, 1, values.len(), values)
}

/// Grid indices of starter neurons, x outer and y inner.
pub fn starter_indices(grid: &GridLayout, starter_map: &[bool]) -> Vec<usize> {
    (0..grid.width)
        .cartesian_product(0..grid.height)
        .map(|(x, y)| grid.index_of(&Coordinate::new(x as u32, y as u32)))
        .filter(|index| starter_map[*index])
        .collect()
}

pub fn write_state_document<W: Write>(out: &mut W, doc: &StateDocument) -> io::Result<()> {
    writeln!(out, "{}", XML_DECLARATION)?;
    writeln!(out, "{}", XML_COMMENT)?;
    writeln!(out, "<SimState>")?;

    write_table_xml(out, "radiiHistory", doc.radii_history)?;
    write_table_xml(out, "ratesHistory", doc.rates_history)?;
    write_vector_xml(out, "burstinessHist", &doc.histograms.burstiness)?;
    write_vector_xml(out, "spikesHistory", &doc.histograms.spikes)?;
    write_vector_xml(out, "xloc", &doc.grid.x_locations())?;
    write_vector_xml(out, "yloc", &doc.grid.y_locations())?;

    let type_codes = doc
        .neuron_types
        .iter()
        .map(|neuron_type| neuron_type.code())
        .collect_vec();
    write_vector_xml(out, "neuronTypes", &type_codes)?;

    let starters = starter_indices(doc.grid, doc.starter_map);
    if !starters.is_empty() {
        write_vector_xml(out, "starterNeurons", &starters)?;
    }

    let thresholds = doc
        .neurons
        .iter()
        .map(|neuron| neuron.v_thresh)
        .collect_vec();
    write_vector_xml(out, "neuronThresh", &thresholds)?;
    write_vector_xml(out, "Tsim", &[doc.epoch_duration])?;
    write_vector_xml(out, "simulationEndTime", &[doc.simulation_end_time])?;

    writeln!(out, "</SimState>")?;
    out.flush()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub neurons: Vec<LifNeuron>,
    /// Keyed by source neuron, bound to the summation buffer.
    pub synapses: Vec<Vec<DynamicSynapse>>,
    pub radii: Vec<f32>,
    pub rates: Vec<f32>,
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn to_i32(value: usize, what: &str) -> io::Result<i32> {
    i32::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} {} does not fit the checkpoint format", what, value),
        )
    })
}

fn read_count<R: Read>(input: &mut R, what: &str) -> io::Result<usize> {
    let count = input.read_i32::<LittleEndian>()?;
    usize::try_from(count).map_err(|_| invalid_data(format!("negative {}: {}", what, count)))
}

pub fn write_checkpoint<W: Write>(
    out: &mut W,
    neurons: &[LifNeuron],
    synapses: &[Vec<DynamicSynapse>],
    radii: &[f32],
    rates: &[f32],
) -> io::Result<()> {
    assert_eq!(radii.len(), neurons.len());
    assert_eq!(rates.len(), neurons.len());

    out.write_i32::<LittleEndian>(to_i32(neurons.len(), "neuron count")?)?;
    for neuron in neurons {
        write_neuron_record(out, neuron)?;
    }

    let num_synapses = synapses.iter().map(Vec::len).sum();
    out.write_i32::<LittleEndian>(to_i32(num_synapses, "synapse count")?)?;
    for synapse in synapses.iter().flatten() {
        write_synapse_record(out, synapse)?;
    }

    for radius in radii {
        out.write_f32::<LittleEndian>(*radius)?;
    }
    for rate in rates {
        out.write_f32::<LittleEndian>(*rate)?;
    }

    out.flush()
}

fn write_neuron_record<W: Write>(out: &mut W, neuron: &LifNeuron) -> io::Result<()> {
    for value in [
        neuron.cm,
        neuron.rm,
        neuron.v_thresh,
        neuron.v_rest,
        neuron.v_reset,
        neuron.v_init,
        neuron.t_refract,
        neuron.i_noise,
        neuron.i_inject,
        neuron.i_syn,
    ] {
        out.write_f32::<LittleEndian>(value)?;
    }
    out.write_i32::<LittleEndian>(neuron.refractory_steps)?;
    for value in [neuron.c1, neuron.c2, neuron.i0, neuron.vm] {
        out.write_f32::<LittleEndian>(value)?;
    }
    out.write_u8(neuron.has_fired as u8)?;
    out.write_f32::<LittleEndian>(neuron.tau)?;
    out.write_f32::<LittleEndian>(neuron.delta_t)?;
    let spike_count = i32::try_from(neuron.spike_count).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "spike count {} does not fit the checkpoint format",
                neuron.spike_count
            ),
        )
    })?;
    out.write_i32::<LittleEndian>(spike_count)
}

fn write_synapse_record<W: Write>(out: &mut W, synapse: &DynamicSynapse) -> io::Result<()> {
    for value in [
        synapse.source.x,
        synapse.source.y,
        synapse.destination.x,
        synapse.destination.y,
    ] {
        out.write_i32::<LittleEndian>(value as i32)?;
    }
    for value in [
        synapse.w,
        synapse.psr,
        synapse.decay,
        synapse.delta_t,
        synapse.tau,
        synapse.r,
        synapse.u,
    ] {
        out.write_f32::<LittleEndian>(value)?;
    }
    out.write_i32::<LittleEndian>(synapse.total_delay as i32)?;
    out.write_u32::<LittleEndian>(synapse.delay_queue.bits)?;
    out.write_i32::<LittleEndian>(synapse.delay_queue.len as i32)?;
    out.write_i32::<LittleEndian>(synapse.delay_queue.idx as i32)?;
    out.write_i32::<LittleEndian>(synapse.syn_type.code())?;
    out.write_u64::<LittleEndian>(synapse.last_spike.unwrap_or(NO_LAST_SPIKE))
}

/// Decodes a whole checkpoint. Nothing is returned unless every record is valid
/// and agrees with `target`.
pub fn read_checkpoint<R: Read>(
    input: &mut R,
    target: &CheckpointTarget,
) -> io::Result<Checkpoint> {
    let grid = &target.grid;
    let num_neurons = read_count(input, "neuron count")?;
    if num_neurons != grid.num_neurons() {
        return Err(invalid_data(format!(
            "checkpoint holds {} neurons, network has {}",
            num_neurons,
            grid.num_neurons()
        )));
    }

    let neurons = (0..num_neurons)
        .map(|_| read_neuron_record(input))
        .collect::<io::Result<Vec<_>>>()?;
    for (i, neuron) in neurons.iter().enumerate() {
        check_delta_t("neuron", i, neuron.delta_t, target.delta_t)?;
    }

    let num_synapses = read_count(input, "synapse count")?;
    let mut synapses = vec![Vec::new(); num_neurons];
    for i in 0..num_synapses {
        let mut synapse = read_synapse_record(input, grid)?;
        check_delta_t("synapse", i, synapse.delta_t, target.delta_t)?;
        synapse.bind(grid);

        let source = grid.index_of(&synapse.source);
        synapses[source].push(synapse);
        if synapses[source].len() > target.max_synapses_per_neuron {
            return Err(invalid_data(format!(
                "neuron {} has {} synapses, more than max_synapses_per_neuron {}",
                source,
                synapses[source].len(),
                target.max_synapses_per_neuron
            )));
        }
    }

    let radii = read_f32_vec(input, num_neurons)?;
    let rates = read_f32_vec(input, num_neurons)?;

    Ok(Checkpoint {
        neurons,
        synapses,
        radii,
        rates,
    })
}

fn check_delta_t(what: &str, index: usize, recorded: f32, expected: f32) -> io::Result<()> {
    if recorded != expected {
        return Err(invalid_data(format!(
            "{} {} was recorded with delta_t {}, network uses {}",
            what, index, recorded, expected
        )));
    }
    Ok(())
}

fn read_f32_vec<R: Read>(input: &mut R, len: usize) -> io::Result<Vec<f32>> {
    let mut values = vec![0.0; len];
    input.read_f32_into::<LittleEndian>(&mut values)?;
    Ok(values)
}

fn read_neuron_record<R: Read>(input: &mut R) -> io::Result<LifNeuron> {
    let mut neuron = LifNeuron::new();
    neuron.cm = input.read_f32::<LittleEndian>()?;
    neuron.rm = input.read_f32::<LittleEndian>()?;
    neuron.v_thresh = input.read_f32::<LittleEndian>()?;
    neuron.v_rest = input.read_f32::<LittleEndian>()?;
    neuron.v_reset = input.read_f32::<LittleEndian>()?;
    neuron.v_init = input.read_f32::<LittleEndian>()?;
    neuron.t_refract = input.read_f32::<LittleEndian>()?;
    neuron.i_noise = input.read_f32::<LittleEndian>()?;
    neuron.i_inject = input.read_f32::<LittleEndian>()?;
    neuron.i_syn = input.read_f32::<LittleEndian>()?;
    neuron.refractory_steps = input.read_i32::<LittleEndian>()?;
    neuron.c1 = input.read_f32::<LittleEndian>()?;
    neuron.c2 = input.read_f32::<LittleEndian>()?;
    neuron.i0 = input.read_f32::<LittleEndian>()?;
    neuron.vm = input.read_f32::<LittleEndian>()?;
    neuron.has_fired = input.read_u8()? != 0;
    neuron.tau = input.read_f32::<LittleEndian>()?;
    neuron.delta_t = input.read_f32::<LittleEndian>()?;

    let spike_count = input.read_i32::<LittleEndian>()?;
    neuron.spike_count = u32::try_from(spike_count)
        .map_err(|_| invalid_data(format!("negative spike count: {}", spike_count)))?;

    Ok(neuron)
}

fn read_coordinate<R: Read>(input: &mut R, grid: &GridLayout) -> io::Result<Coordinate> {
    let x = input.read_i32::<LittleEndian>()?;
    let y = input.read_i32::<LittleEndian>()?;

    match (u32::try_from(x), u32::try_from(y)) {
        (Ok(x), Ok(y)) if grid.contains(&Coordinate::new(x, y)) => Ok(Coordinate::new(x, y)),
        _ => Err(invalid_data(format!(
            "synapse coordinate ({}, {}) is outside the {}x{} grid",
            x, y, grid.width, grid.height
        ))),
    }
}

fn read_synapse_record<R: Read>(input: &mut R, grid: &GridLayout) -> io::Result<DynamicSynapse> {
    let source = read_coordinate(input, grid)?;
    let destination = read_coordinate(input, grid)?;

    let mut fields = [0.0f32; 7];
    input.read_f32_into::<LittleEndian>(&mut fields)?;
    let [w, psr, decay, delta_t, tau, r, u] = fields;

    let total_delay = input.read_i32::<LittleEndian>()?;
    let bits = input.read_u32::<LittleEndian>()?;
    let queue_len = input.read_i32::<LittleEndian>()?;
    let cursor = input.read_i32::<LittleEndian>()?;

    if queue_len != DELAY_QUEUE_LENGTH as i32 {
        return Err(invalid_data(format!(
            "delay queue length {} is not {}",
            queue_len, DELAY_QUEUE_LENGTH
        )));
    }
    if total_delay < 1 || total_delay >= queue_len {
        return Err(invalid_data(format!(
            "total delay {} is outside the delay queue",
            total_delay
        )));
    }
    if cursor < 0 || cursor >= queue_len {
        return Err(invalid_data(format!(
            "delay cursor {} is outside the delay queue",
            cursor
        )));
    }

    let type_code = input.read_i32::<LittleEndian>()?;
    let syn_type = SynapseType::from_code(type_code)
        .ok_or_else(|| invalid_data(format!("unknown synapse type code {}", type_code)))?;

    let last_spike = match input.read_u64::<LittleEndian>()? {
        NO_LAST_SPIKE => None,
        step => Some(step),
    };

    Ok(DynamicSynapse {
        source,
        destination,
        summation_point: None,
        w,
        psr,
        decay,
        delta_t,
        tau,
        r,
        u,
        total_delay: total_delay as u32,
        delay_queue: DelayQueue {
            bits,
            len: queue_len as u32,
            idx: cursor as u32,
        },
        last_spike,
        syn_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEURON_RECORD_SIZE: usize = 18 * 4 + 1;
    const SYNAPSE_RECORD_SIZE: usize = 16 * 4 + 8;

    fn make_neurons(count: usize) -> Vec<LifNeuron> {
        (0..count)
            .map(|i| {
                let mut neuron = LifNeuron::new();
                neuron.set_params(
                    i as f32 * 1e-9,
                    1e-10,
                    15e-3,
                    0.0,
                    13.5e-3,
                    i as f32 * 1e-3,
                    1e-4,
                );
                neuron.refractory_steps = i as i32;
                neuron.has_fired = i % 2 == 0;
                neuron.spike_count = 3 * i as u32;
                neuron
            })
            .collect()
    }

    fn make_synapses(grid: &GridLayout) -> Vec<Vec<DynamicSynapse>> {
        let mut lists = vec![Vec::new(); grid.num_neurons()];
        let mut first = DynamicSynapse::new(
            grid.coordinate_of(0),
            grid.coordinate_of(3),
            3,
            2e-8,
            1e-4,
            SynapseType::EE,
        );
        first.delay_queue.schedule(4);
        first.delay_queue.advance();
        first.last_spike = Some(77);
        first.psr = 0.5;
        let second = DynamicSynapse::new(
            grid.coordinate_of(0),
            grid.coordinate_of(1),
            1,
            -1e-8,
            1e-4,
            SynapseType::IE,
        );
        let third = DynamicSynapse::new(
            grid.coordinate_of(2),
            grid.coordinate_of(0),
            0,
            1e-8,
            1e-4,
            SynapseType::EI,
        );
        lists[0] = vec![first, second];
        lists[2] = vec![third];
        lists
    }

    fn target(grid: GridLayout) -> CheckpointTarget {
        CheckpointTarget {
            grid,
            delta_t: 1e-4,
            max_synapses_per_neuron: 2,
        }
    }

    fn encode(grid: &GridLayout) -> Vec<u8> {
        let neurons = make_neurons(grid.num_neurons());
        let synapses = make_synapses(grid);
        let radii = vec![0.4, 0.5, 0.6, 0.7];
        let rates = vec![0.0, 1.5, 2.5, 3.5];
        let mut buffer = Vec::new();
        write_checkpoint(&mut buffer, &neurons, &synapses, &radii, &rates).unwrap();
        buffer
    }

    #[test]
    fn checkpoint_layout_is_packed() {
        let grid = GridLayout::new(2, 2);
        let buffer = encode(&grid);

        assert_eq!(
            buffer.len(),
            4 + 4 * NEURON_RECORD_SIZE + 4 + 3 * SYNAPSE_RECORD_SIZE + 2 * 4 * 4
        );
        assert_eq!(buffer[0..4], 4i32.to_le_bytes());
        let synapse_count_at = 4 + 4 * NEURON_RECORD_SIZE;
        assert_eq!(buffer[synapse_count_at..synapse_count_at + 4], 3i32.to_le_bytes());
    }

    #[test]
    fn checkpoint_round_trip() {
        let grid = GridLayout::new(2, 2);
        let buffer = encode(&grid);

        let checkpoint = read_checkpoint(&mut buffer.as_slice(), &target(grid)).unwrap();

        assert_eq!(checkpoint.neurons, make_neurons(4));
        assert_eq!(checkpoint.synapses, make_synapses(&grid));
        assert_eq!(checkpoint.radii, [0.4, 0.5, 0.6, 0.7]);
        assert_eq!(checkpoint.rates, [0.0, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn neuron_count_mismatch_is_rejected() {
        let buffer = encode(&GridLayout::new(2, 2));
        let result = read_checkpoint(&mut buffer.as_slice(), &target(GridLayout::new(3, 2)));
        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "checkpoint holds 4 neurons, network has 6");
    }

    #[test]
    fn unknown_type_code_is_rejected() {
        let grid = GridLayout::new(2, 2);
        let mut buffer = encode(&grid);
        let type_at = 4 + 4 * NEURON_RECORD_SIZE + 4 + 4 * 4 + 7 * 4 + 4 * 4;
        buffer[type_at..type_at + 4].copy_from_slice(&9i32.to_le_bytes());

        let err = read_checkpoint(&mut buffer.as_slice(), &target(grid)).unwrap_err();
        assert_eq!(err.to_string(), "unknown synapse type code 9");
    }

    #[test]
    fn out_of_grid_coordinate_is_rejected() {
        let grid = GridLayout::new(2, 2);
        let mut buffer = encode(&grid);
        let destination_x_at = 4 + 4 * NEURON_RECORD_SIZE + 4 + 2 * 4;
        buffer[destination_x_at..destination_x_at + 4].copy_from_slice(&2i32.to_le_bytes());

        let err = read_checkpoint(&mut buffer.as_slice(), &target(grid)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn delta_t_mismatch_is_rejected() {
        let grid = GridLayout::new(2, 2);
        let buffer = encode(&grid);
        let mut finer = target(grid);
        finer.delta_t = 5e-5;

        let err = read_checkpoint(&mut buffer.as_slice(), &finer).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(
            err.to_string(),
            "neuron 0 was recorded with delta_t 0.0001, network uses 0.00005"
        );
    }

    #[test]
    fn synapse_delta_t_mismatch_is_rejected() {
        let grid = GridLayout::new(2, 2);
        let neurons = make_neurons(4);
        let mut synapses = make_synapses(&grid);
        synapses[2][0].delta_t = 2e-4;
        let mut buffer = Vec::new();
        write_checkpoint(&mut buffer, &neurons, &synapses, &[0.4; 4], &[0.0; 4]).unwrap();

        let err = read_checkpoint(&mut buffer.as_slice(), &target(grid)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "synapse 2 was recorded with delta_t 0.0002, network uses 0.0001"
        );
    }

    #[test]
    fn lists_longer_than_the_cap_are_rejected() {
        let grid = GridLayout::new(2, 2);
        let buffer = encode(&grid);
        let mut capped = target(grid);
        capped.max_synapses_per_neuron = 1;

        let err = read_checkpoint(&mut buffer.as_slice(), &capped).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(
            err.to_string(),
            "neuron 0 has 2 synapses, more than max_synapses_per_neuron 1"
        );
    }

    #[test]
    fn truncated_checkpoint_is_rejected() {
        let grid = GridLayout::new(2, 2);
        let buffer = encode(&grid);
        let truncated = &buffer[..buffer.len() - 1];

        let err = read_checkpoint(&mut &truncated[..], &target(grid)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn starters_enumerate_x_outer() {
        let grid = GridLayout::new(3, 2);
        let mut starter_map = vec![false; 6];
        starter_map[1] = true; // (1, 0)
        starter_map[3] = true; // (0, 1)
        starter_map[5] = true; // (2, 1)

        assert_eq!(starter_indices(&grid, &starter_map), [3, 1, 5]);
    }

    #[test]
    fn matrix_format() {
        let mut out = Vec::new();
        write_matrix_xml(&mut out, "m", 2, 2, &[1.0f32, 2.5, 3.0, 4.0]).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<Matrix name=\"m\" type=\"complete\" rows=\"2\" columns=\"2\" multiplier=\"1.0\">\n   1 2.5\n   3 4\n</Matrix>\n"
        );
    }

    #[test]
    fn state_document_order() {
        let grid = GridLayout::new(2, 1);
        let radii_history = HistoryTable::with_initial_row(2, 0.4);
        let rates_history = HistoryTable::with_initial_row(2, 0.0);
        let histograms = SpikeHistograms {
            burstiness: vec![0.0],
            spikes: vec![0.0; 100],
        };
        let neurons = make_neurons(2);
        let neuron_types = [NeuronType::Inhibitory, NeuronType::Excitatory];
        let mut starter_map = vec![false, false];

        let write = |starter_map: &[bool]| {
            let doc = StateDocument {
                radii_history: &radii_history,
                rates_history: &rates_history,
                histograms: &histograms,
                grid: &grid,
                neurons: &neurons,
                neuron_types: &neuron_types,
                starter_map,
                epoch_duration: 100.0,
                simulation_end_time: 0.5,
            };
            let mut out = Vec::new();
            write_state_document(&mut out, &doc).unwrap();
            String::from_utf8(out).unwrap()
        };

        let text = write(starter_map.as_slice());
        assert!(text.starts_with(
            "<?xml version=\"1.0\" standalone=\"no\"?>\n<!-- State output file for the DCT growth modeling-->\n<SimState>\n"
        ));
        assert!(text.ends_with("</SimState>\n"));
        assert!(!text.contains("starterNeurons"));
        assert!(text.contains("name=\"neuronTypes\" type=\"complete\" rows=\"1\" columns=\"2\" multiplier=\"1.0\">\n   1 2\n"));
        assert!(text.contains("name=\"simulationEndTime\" type=\"complete\" rows=\"1\" columns=\"1\" multiplier=\"1.0\">\n   0.5\n"));

        let names = [
            "radiiHistory",
            "ratesHistory",
            "burstinessHist",
            "spikesHistory",
            "xloc",
            "yloc",
            "neuronTypes",
            "neuronThresh",
            "Tsim",
            "simulationEndTime",
        ];
        let positions = names
            .iter()
            .map(|name| text.find(&format!("name=\"{}\"", name)).unwrap())
            .collect_vec();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

        starter_map[1] = true;
        let text = write(starter_map.as_slice());
        let starters_at = text.find("name=\"starterNeurons\"").unwrap();
        assert!(text.find("name=\"neuronTypes\"").unwrap() < starters_at);
        assert!(starters_at < text.find("name=\"neuronThresh\"").unwrap());
    }
}
