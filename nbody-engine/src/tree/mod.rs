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
//! Barnes-Hut spatial tree
//!
//! The octree is rebuilt from scratch every time step. Nodes live in a
//! flat arena and refer to their children by [`NodeId`], so rebuilding
//! clears the arena instead of freeing nodes one by one.

mod bounds;
mod octree;

pub use bounds::Bounds;
pub use octree::{NodeId, NodeKind, Octree, MAX_DEPTH};
