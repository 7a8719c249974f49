use crate::neuron::LifNeuron;

/// Dense row-major table, one row per epoch and one column per neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryTable {
    num_columns: usize,
    values: Vec<f32>,
}

impl HistoryTable {
    pub fn new(num_columns: usize) -> Self {
        Self {
            num_columns,
            values: Vec::new(),
        }
    }

    pub fn with_initial_row(num_columns: usize, value: f32) -> Self {
        let mut table = Self::new(num_columns);
        table.push_row(&vec![value; num_columns]);
        table
    }

    pub fn num_rows(&self) -> usize {
        if self.num_columns == 0 {
            0
        } else {
            self.values.len() / self.num_columns
        }
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    pub fn push_row(&mut self, row: &[f32]) {
        assert_eq!(row.len(), self.num_columns);
        self.values.extend_from_slice(row);
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.values[row * self.num_columns..(row + 1) * self.num_columns]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [f32] {
        &mut self.values[row * self.num_columns..(row + 1) * self.num_columns]
    }

    pub fn set_row(&mut self, row: usize, values: &[f32]) {
        self.row_mut(row).copy_from_slice(values);
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Spike counts binned over the run: per second (burstiness) and per 10 ms.
#[derive(Debug, Clone, PartialEq)]
pub struct SpikeHistograms {
    pub burstiness: Vec<f32>,
    pub spikes: Vec<f32>,
}

pub fn spike_histograms(
    neurons: &[LifNeuron],
    delta_t: f32,
    total_duration: f32,
) -> SpikeHistograms {
    let mut burstiness = vec![0.0; total_duration.max(0.0) as usize];
    let mut spikes = vec![0.0; (total_duration * 100.0).max(0.0) as usize];

    for neuron in neurons {
        for step in &neuron.spike_history {
            let t = *step as f64 * delta_t as f64;

            if let Some(bin) = burstiness.get_mut(t as usize) {
                *bin += 1.0;
            }

            if let Some(bin) = spikes.get_mut((t * 100.0) as usize) {
                *bin += 1.0;
            }
        }
    }

    SpikeHistograms { burstiness, spikes }
}
