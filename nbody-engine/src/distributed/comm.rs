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
//! Message passing between ranks
//!
//! [`Communicator`] is the seam between the distributed protocols and the
//! transport. Implementors only provide point-to-point [`Communicator::send`]
//! and [`Communicator::recv`]; every collective is built on top of them
//! with rank 0 as the root.
//!
//! [`LocalCluster`] runs each rank on its own OS thread and connects every
//! ordered pair of ranks with a channel. Ranks share no state besides the
//! messages they exchange. Sends never block. A receive matches on
//! `(source, tag)`; messages from the same source with other tags are
//! parked until asked for. When a rank exits, every receive waiting on it
//! fails with [`SimulationError::Communication`], so one failing rank
//! brings the whole run down instead of hanging it.

use std::collections::VecDeque;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::body::Body;
use crate::error::{Result, SimulationError};
use crate::math::Vector3;
use crate::simulation::TrajectorySink;
use super::Partition;

/// Rank that roots every collective and owns the trajectory sink
pub const ROOT: usize = 0;

/// Tags at or above this value are reserved for collectives
pub const COLLECTIVE_TAG_BASE: u32 = 1 << 31;

const TAG_BROADCAST: u32 = COLLECTIVE_TAG_BASE;
const TAG_SCATTER: u32 = COLLECTIVE_TAG_BASE + 1;
const TAG_GATHER: u32 = COLLECTIVE_TAG_BASE + 2;
const TAG_REDUCE: u32 = COLLECTIVE_TAG_BASE + 3;
const TAG_BARRIER: u32 = COLLECTIVE_TAG_BASE + 4;

/// Payload of one message
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// A slice of body state
    Bodies(Vec<Body>),
    /// Per-body vectors such as forces
    Vectors(Vec<Vector3>),
    /// Synchronization only
    Signal,
}

impl Packet {
    fn kind(&self) -> &'static str {
        match self {
            Packet::Bodies(_) => "bodies",
            Packet::Vectors(_) => "vectors",
            Packet::Signal => "signal",
        }
    }

    fn mismatch(&self, expected: &str) -> SimulationError {
        SimulationError::Communication(format!(
            "expected {} packet, got {}",
            expected,
            self.kind()
        ))
    }

    /// Unwrap a body payload
    pub fn into_bodies(self) -> Result<Vec<Body>> {
        match self {
            Packet::Bodies(bodies) => Ok(bodies),
            other => Err(other.mismatch("bodies")),
        }
    }

    /// Unwrap a vector payload
    pub fn into_vectors(self) -> Result<Vec<Vector3>> {
        match self {
            Packet::Vectors(vectors) => Ok(vectors),
            other => Err(other.mismatch("vectors")),
        }
    }

    /// Check this is a bare signal
    pub fn into_signal(self) -> Result<()> {
        match self {
            Packet::Signal => Ok(()),
            other => Err(other.mismatch("signal")),
        }
    }
}

/// Point-to-point messaging plus the collectives the protocols need
///
/// Every rank must call the same collectives in the same order.
pub trait Communicator {
    /// This rank's index
    fn rank(&self) -> usize;

    /// Number of ranks
    fn size(&self) -> usize;

    /// Queue `packet` for `dest` under `tag`
    fn send(&mut self, dest: usize, tag: u32, packet: Packet) -> Result<()>;

    /// Block until a packet from `source` with `tag` arrives
    fn recv(&mut self, source: usize, tag: u32) -> Result<Packet>;

    /// Check if this rank is the collective root
    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }

    /// Send to `dest` and receive from `source` under the same tag
    fn send_recv(&mut self, packet: Packet, dest: usize, source: usize, tag: u32) -> Result<Packet> {
        self.send(dest, tag, packet)?;
        self.recv(source, tag)
    }

    /// Replace `bodies` on every rank with the root's copy
    fn broadcast_bodies(&mut self, bodies: &mut Vec<Body>) -> Result<()> {
        if self.is_root() {
            for dest in 1..self.size() {
                self.send(dest, TAG_BROADCAST, Packet::Bodies(bodies.clone()))?;
            }
        } else {
            *bodies = self.recv(ROOT, TAG_BROADCAST)?.into_bodies()?;
        }
        Ok(())
    }

    /// Hand each rank its slice of the root's `bodies`
    ///
    /// Only the root's `bodies` is read.
    fn scatter_bodies(&mut self, bodies: &[Body], partition: &Partition) -> Result<Vec<Body>> {
        if self.is_root() {
            for dest in 1..self.size() {
                let slice = bodies[partition.range(dest)].to_vec();
                self.send(dest, TAG_SCATTER, Packet::Bodies(slice))?;
            }
            Ok(bodies[partition.range(ROOT)].to_vec())
        } else {
            self.recv(ROOT, TAG_SCATTER)?.into_bodies()
        }
    }

    /// Concatenate every rank's `local` slice at the root, in rank order
    ///
    /// Returns `None` on every other rank.
    fn gather_bodies(&mut self, local: &[Body]) -> Result<Option<Vec<Body>>> {
        if !self.is_root() {
            self.send(ROOT, TAG_GATHER, Packet::Bodies(local.to_vec()))?;
            return Ok(None);
        }
        let mut all = local.to_vec();
        for source in 1..self.size() {
            all.extend(self.recv(source, TAG_GATHER)?.into_bodies()?);
        }
        Ok(Some(all))
    }

    /// Concatenate every rank's `local` slice on every rank
    fn all_gather_bodies(&mut self, local: &[Body]) -> Result<Vec<Body>> {
        let mut all = self.gather_bodies(local)?.unwrap_or_default();
        self.broadcast_bodies(&mut all)?;
        Ok(all)
    }

    /// Element-wise sum of `values` over all ranks, written back everywhere
    ///
    /// The root adds contributions in rank order, so every rank ends up
    /// with bit-identical sums.
    fn all_reduce_sum(&mut self, values: &mut [Vector3]) -> Result<()> {
        if !self.is_root() {
            self.send(ROOT, TAG_REDUCE, Packet::Vectors(values.to_vec()))?;
            let reduced = self.recv(ROOT, TAG_REDUCE)?.into_vectors()?;
            if reduced.len() != values.len() {
                return Err(SimulationError::Communication(format!(
                    "reduced {} values, expected {}",
                    reduced.len(),
                    values.len()
                )));
            }
            values.copy_from_slice(&reduced);
            return Ok(());
        }

        for source in 1..self.size() {
            let contribution = self.recv(source, TAG_REDUCE)?.into_vectors()?;
            if contribution.len() != values.len() {
                return Err(SimulationError::Communication(format!(
                    "rank {} contributed {} values, expected {}",
                    source,
                    contribution.len(),
                    values.len()
                )));
            }
            for (total, value) in values.iter_mut().zip(contribution) {
                *total += value;
            }
        }
        for dest in 1..self.size() {
            self.send(dest, TAG_REDUCE, Packet::Vectors(values.to_vec()))?;
        }
        Ok(())
    }

    /// Block until every rank has reached the barrier
    fn barrier(&mut self) -> Result<()> {
        if self.is_root() {
            for source in 1..self.size() {
                self.recv(source, TAG_BARRIER)?.into_signal()?;
            }
            for dest in 1..self.size() {
                self.send(dest, TAG_BARRIER, Packet::Signal)?;
            }
            Ok(())
        } else {
            self.send(ROOT, TAG_BARRIER, Packet::Signal)?;
            self.recv(ROOT, TAG_BARRIER)?.into_signal()
        }
    }
}

#[derive(Debug)]
struct Envelope {
    tag: u32,
    packet: Packet,
}

/// One rank's endpoint in a [`LocalCluster`]
#[derive(Debug)]
pub struct LocalCommunicator {
    rank: usize,
    size: usize,
    outboxes: Vec<Option<Sender<Envelope>>>,
    inboxes: Vec<Option<Receiver<Envelope>>>,
    pending: Vec<VecDeque<Envelope>>,
}

impl LocalCommunicator {
    fn check_peer(&self, peer: usize) -> Result<()> {
        if peer < self.size {
            Ok(())
        } else {
            Err(SimulationError::Communication(format!(
                "rank {} addressed nonexistent rank {} (size {})",
                self.rank, peer, self.size
            )))
        }
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&mut self, dest: usize, tag: u32, packet: Packet) -> Result<()> {
        self.check_peer(dest)?;
        let envelope = Envelope { tag, packet };
        match &self.outboxes[dest] {
            Some(outbox) => outbox.send(envelope).map_err(|_| {
                SimulationError::Communication(format!(
                    "rank {} cannot reach rank {}: peer has shut down",
                    self.rank, dest
                ))
            }),
            None => {
                // loopback
                self.pending[dest].push_back(envelope);
                Ok(())
            }
        }
    }

    fn recv(&mut self, source: usize, tag: u32) -> Result<Packet> {
        self.check_peer(source)?;
        if let Some(position) = self.pending[source].iter().position(|e| e.tag == tag) {
            if let Some(envelope) = self.pending[source].remove(position) {
                return Ok(envelope.packet);
            }
        }

        let Some(inbox) = &self.inboxes[source] else {
            return Err(SimulationError::Communication(format!(
                "rank {} waits on a message to itself that was never sent (tag {})",
                self.rank, tag
            )));
        };
        loop {
            let envelope = inbox.recv().map_err(|_| {
                SimulationError::Communication(format!(
                    "rank {} lost connection to rank {}",
                    self.rank, source
                ))
            })?;
            if envelope.tag == tag {
                return Ok(envelope.packet);
            }
            self.pending[source].push_back(envelope);
        }
    }
}

/// A set of in-process ranks connected by channels
#[derive(Debug, Clone, Copy)]
pub struct LocalCluster {
    size: usize,
}

impl LocalCluster {
    /// Cluster of `size` ranks
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(SimulationError::InvalidConfig(
                "a cluster needs at least one rank".to_string(),
            ));
        }
        Ok(LocalCluster { size })
    }

    /// Number of ranks
    pub fn size(&self) -> usize {
        self.size
    }

    /// Build the fully connected endpoint mesh, indexed by rank
    pub fn communicators(&self) -> Vec<LocalCommunicator> {
        let size = self.size;
        let mut outboxes: Vec<Vec<Option<Sender<Envelope>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut inboxes: Vec<Vec<Option<Receiver<Envelope>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for source in 0..size {
            for dest in 0..size {
                if source != dest {
                    let (tx, rx) = unbounded();
                    outboxes[source][dest] = Some(tx);
                    inboxes[dest][source] = Some(rx);
                }
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| LocalCommunicator {
                rank,
                size,
                outboxes,
                inboxes,
                pending: (0..size).map(|_| VecDeque::new()).collect(),
            })
            .collect()
    }

    /// Run `task` on every rank and return the root's result
    ///
    /// The root runs on the calling thread and is the only rank handed the
    /// sink. If any rank fails, the run fails; an error other than a
    /// communication failure is preferred since those are usually a
    /// consequence of another rank going away.
    pub fn run<T, F>(&self, sink: &mut dyn TrajectorySink, task: F) -> Result<T>
    where
        T: Send,
        F: Fn(&mut LocalCommunicator, Option<&mut dyn TrajectorySink>) -> Result<T> + Sync,
    {
        let mut communicators = self.communicators();
        let mut root = communicators.remove(ROOT);
        let task = &task;

        std::thread::scope(|scope| {
            let handles = communicators
                .into_iter()
                .map(|mut comm| {
                    std::thread::Builder::new()
                        .name(format!("nbody-rank-{}", comm.rank()))
                        .spawn_scoped(scope, move || task(&mut comm, None))
                })
                .collect::<std::io::Result<Vec<_>>>()?;

            let root_result = task(&mut root, Some(sink));
            // wake any peer still waiting on the root
            drop(root);

            let mut failures = Vec::new();
            let value = match root_result {
                Ok(value) => Some(value),
                Err(e) => {
                    failures.push(e);
                    None
                }
            };
            for handle in handles {
                match handle.join() {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => failures.push(e),
                    Err(payload) => failures.push(SimulationError::from_panic(payload)),
                }
            }

            let primary = failures
                .iter()
                .position(|e| !matches!(e, SimulationError::Communication(_)))
                .unwrap_or(0);
            if primary < failures.len() {
                let error = failures.swap_remove(primary);
                tracing::error!(error = %error, failed_ranks = failures.len() + 1, "distributed run failed");
                return Err(error);
            }
            value.ok_or_else(|| SimulationError::Communication("root produced no result".to_string()))
        })
    }
}
