//! Fixed-length delay queues — the transit pipes between tiers.
//!
//! RULE: a pipe's length equals its lead time and never changes for the
//! life of a game. One quantity is popped at the start of every tick and
//! one is pushed at the end, so the length invariant holds between ticks.

use crate::types::Quantity;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelayQueue {
    buffer: VecDeque<Quantity>,
    delay: usize,
}

impl DelayQueue {
    /// A pipe of fixed `delay` length with every slot holding `fill`.
    /// `fill = 0` models empty pipes; the classic steady-state start
    /// primes each slot with the base demand.
    pub fn primed(delay: usize, fill: Quantity) -> Self {
        Self {
            buffer: VecDeque::from(vec![fill; delay]),
            delay,
        }
    }

    /// Pop the quantity due this week. Call once at the start of a tick.
    pub fn pop_arrival(&mut self) -> Quantity {
        self.buffer.pop_front().unwrap_or(0)
    }

    /// Push a quantity entering transit. Call once at the end of a tick.
    pub fn push_departure(&mut self, quantity: Quantity) {
        self.buffer.push_back(quantity);
    }

    /// Total units currently in transit. Summed in `u64`: each slot holds
    /// up to `Quantity::MAX`, so the sum does not fit the slot type.
    pub fn in_transit(&self) -> u64 {
        self.buffer.iter().map(|&q| u64::from(q)).sum()
    }
}
