pub mod grid;
pub mod growth;
pub mod history;
pub mod multi_threaded;
pub mod network;
pub mod neuron;
pub mod params;
pub mod population;
pub mod single_threaded;
pub mod state_codec;
pub mod strategy;
pub mod synapse;
pub mod synapse_store;
pub mod types;

mod util;
