use crate::grid::{Coordinate, GridLayout};
use crate::types::{StpConstants, SynapseType};

pub const DELAY_QUEUE_LENGTH: u32 = u32::BITS;

const INITIAL_UTILIZATION: f32 = 0.4;

pub fn total_delay_steps(delay: f32, delta_t: f32) -> u32 {
    (delay / delta_t) as u32 + 1
}

/// Circular record of pending deliveries, one bit per future step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayQueue {
    pub bits: u32,
    pub len: u32,
    pub idx: u32,
}

impl DelayQueue {
    pub fn new() -> Self {
        Self {
            bits: 0,
            len: DELAY_QUEUE_LENGTH,
            idx: 0,
        }
    }

    pub fn schedule(&mut self, delay: u32) {
        debug_assert!(delay < self.len);

        let mut pos = self.idx + delay;
        if pos >= self.len {
            pos -= self.len;
        }

        self.bits |= 1 << pos;
    }

    /// Clears the bit under the cursor, returning whether a delivery was due.
    pub fn take_due(&mut self) -> bool {
        let mask = 1 << self.idx;
        let due = self.bits & mask != 0;
        self.bits &= !mask;
        due
    }

    pub fn advance(&mut self) {
        self.idx += 1;
        if self.idx >= self.len {
            self.idx = 0;
        }
    }
}

impl Default for DelayQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Markram facilitation/depression update for a spike delivered at `step`.
pub fn apply_short_term_plasticity(
    r: &mut f32,
    u: &mut f32,
    last_spike: &mut Option<u64>,
    step: u64,
    delta_t: f32,
    stp: &StpConstants,
) {
    match last_spike.map(|last| step.checked_sub(last)) {
        Some(Some(elapsed)) => {
            let isi = elapsed as f32 * delta_t;
            *r = 1.0 + (*r * (1.0 - *u) - 1.0) * (-isi / stp.d).exp();
            *u = stp.u + *u * (1.0 - stp.u) * (-isi / stp.f).exp();
        }
        // stamped by an earlier run whose step count was reset; fully recovered
        Some(None) => {
            *r = 1.0;
            *u = stp.u;
        }
        None => {}
    }

    *last_spike = Some(step);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicSynapse {
    pub source: Coordinate,
    pub destination: Coordinate,
    /// Index of the destination's slot in the shared summation buffer; not persisted.
    pub summation_point: Option<usize>,
    pub w: f32,
    pub psr: f32,
    pub decay: f32,
    pub delta_t: f32,
    pub tau: f32,
    pub r: f32,
    pub u: f32,
    pub total_delay: u32,
    pub delay_queue: DelayQueue,
    pub last_spike: Option<u64>,
    pub syn_type: SynapseType,
}

impl DynamicSynapse {
    pub fn new(
        source: Coordinate,
        destination: Coordinate,
        summation_point: usize,
        w: f32,
        delta_t: f32,
        syn_type: SynapseType,
    ) -> Self {
        let stp = syn_type.stp_constants();

        Self {
            source,
            destination,
            summation_point: Some(summation_point),
            w,
            psr: 0.0,
            decay: (-delta_t / stp.tau).exp(),
            delta_t,
            tau: stp.tau,
            r: 1.0,
            u: INITIAL_UTILIZATION,
            total_delay: total_delay_steps(stp.delay, delta_t),
            delay_queue: DelayQueue::new(),
            last_spike: None,
            syn_type,
        }
    }

    pub fn bind(&mut self, grid: &GridLayout) {
        self.summation_point = Some(grid.index_of(&self.destination));
    }

    pub fn pre_spike_hit(&mut self) {
        self.delay_queue.schedule(self.total_delay);
    }

    /// One step: delivers a due spike, decays the response and adds it to the
    /// destination's summation slot.
    pub fn advance(&mut self, step: u64, summation: &mut [f32]) {
        if self.delay_queue.take_due() {
            apply_short_term_plasticity(
                &mut self.r,
                &mut self.u,
                &mut self.last_spike,
                step,
                self.delta_t,
                &self.syn_type.stp_constants(),
            );
            self.psr += (self.w / self.decay) * self.u * self.r;
        }

        self.psr *= self.decay;
        self.delay_queue.advance();

        debug_assert!(self.summation_point.is_some());
        if let Some(target) = self.summation_point {
            summation[target] += self.psr;
        }
    }
}
