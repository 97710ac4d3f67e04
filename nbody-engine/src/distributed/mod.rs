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
//! Distributed-memory protocols
//!
//! Each protocol runs as a group of ranks that share nothing but
//! messages, coordinated through a [`Communicator`]. The bundled transport,
//! [`LocalCluster`], runs the ranks as threads of the current process;
//! the protocols themselves only see the [`Communicator`] trait.
//!
//! - [`RingExecutor`]: each rank owns a slice of bodies and passes copies
//!   of it around a ring, accumulating direct-summation accelerations.
//! - [`TriangularExecutor`]: each rank evaluates a contiguous range of the
//!   N(N-1)/2 body pairs once, applying equal and opposite forces, then
//!   all ranks sum their force arrays.
//! - [`TreeExecutor`]: each rank builds the full octree from the broadcast
//!   state, advances its own slice, and all ranks gather the slices.
//!
//! Rank 0 holds the initial state, owns the trajectory sink, and returns
//! the final state.

mod comm;
mod partition;
mod ring;
mod tree;
mod triangular;

pub use comm::{Communicator, LocalCluster, LocalCommunicator, Packet, COLLECTIVE_TAG_BASE, ROOT};
pub use partition::{decode_pair, pair_count, pairs, Pairs, Partition};
pub use ring::RingExecutor;
pub use tree::TreeExecutor;
pub use triangular::TriangularExecutor;
