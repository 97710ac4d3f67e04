// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Double buffering of body state
//!
//! Every step reads the current buffer and writes the next one; nothing is
//! ever updated in place. The roles flip with [`DoubleBuffer::swap`].

use crate::body::Body;

/// Current/next pair of body arrays
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    current: Vec<Body>,
    next: Vec<Body>,
    generation: u64,
}

impl DoubleBuffer {
    /// Start from `bodies` as the current state
    pub fn new(bodies: Vec<Body>) -> Self {
        let next = bodies.clone();
        DoubleBuffer {
            current: bodies,
            next,
            generation: 0,
        }
    }

    /// Number of bodies in each buffer
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// Check if the buffers hold no bodies
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// State being read this step
    pub fn current(&self) -> &[Body] {
        &self.current
    }

    /// State being written this step
    pub fn next(&self) -> &[Body] {
        &self.next
    }

    /// Borrow the current state for reading and the next for writing
    pub fn split_mut(&mut self) -> (&[Body], &mut [Body]) {
        (&self.current, &mut self.next)
    }

    /// Make the next buffer current
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
        self.generation += 1;
    }

    /// Number of swaps performed
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Take the current state
    pub fn into_current(self) -> Vec<Body> {
        self.current
    }
}
