use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: u32,
    pub y: u32,
}

impl Coordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Coordinate) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Row-major mapping between flat neuron indexes and grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub width: usize,
    pub height: usize,
}

impl GridLayout {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn num_neurons(&self) -> usize {
        self.width * self.height
    }

    pub fn contains_index(&self, index: usize) -> bool {
        index < self.num_neurons()
    }

    pub fn contains(&self, coord: &Coordinate) -> bool {
        (coord.x as usize) < self.width && (coord.y as usize) < self.height
    }

    pub fn coordinate_of(&self, index: usize) -> Coordinate {
        debug_assert!(self.contains_index(index));
        Coordinate {
            x: (index % self.width) as u32,
            y: (index / self.width) as u32,
        }
    }

    pub fn index_of(&self, coord: &Coordinate) -> usize {
        debug_assert!(self.contains(coord));
        coord.x as usize + coord.y as usize * self.width
    }

    pub fn x_locations(&self) -> Vec<f32> {
        (0..self.num_neurons())
            .map(|index| (index % self.width) as f32)
            .collect()
    }

    pub fn y_locations(&self) -> Vec<f32> {
        (0..self.num_neurons())
            .map(|index| (index / self.width) as f32)
            .collect()
    }
}
