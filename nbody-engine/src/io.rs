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
//! Plain-text body lists and trajectories
//!
//! Input is whitespace-separated: the body count `N`, then `N` records of
//! seven numbers each, `m px py pz vx vy vz`. Line breaks carry no meaning.
//!
//! Output is line-oriented: `N`, the frame count `F`, one mass per line,
//! then `F * N` lines of `px py pz vx vy vz`, frame-major.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::body::{validate_bodies, Body};
use crate::error::{Result, SimulationError};
use crate::math::Vector3;
use crate::simulation::TrajectoryLog;

const FIELDS_PER_BODY: usize = 7;

/// Parse a body list
///
/// Record 0 is the count; record `i + 1` is body `i`. Every body is
/// validated before returning.
pub fn read_bodies<R: Read>(mut reader: R) -> Result<Vec<Body>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut tokens = text.split_whitespace();

    let count: usize = match tokens.next() {
        Some(token) => token.parse().map_err(|_| SimulationError::Parse {
            record: 0,
            reason: format!("body count {:?} is not a non-negative integer", token),
        })?,
        None => {
            return Err(SimulationError::Parse {
                record: 0,
                reason: "missing body count".to_string(),
            })
        }
    };
    if count == 0 {
        return Err(SimulationError::EmptyBodySet);
    }

    let mut bodies = Vec::with_capacity(count);
    for index in 0..count {
        let record = index + 1;
        let mut fields = [0.0; FIELDS_PER_BODY];
        for (position, field) in fields.iter_mut().enumerate() {
            let token = tokens.next().ok_or_else(|| SimulationError::Parse {
                record,
                reason: format!(
                    "expected {} fields, input ended after {}",
                    FIELDS_PER_BODY, position
                ),
            })?;
            *field = token.parse().map_err(|_| SimulationError::Parse {
                record,
                reason: format!("field {} ({:?}) is not a number", position, token),
            })?;
        }
        let [m, px, py, pz, vx, vy, vz] = fields;
        bodies.push(Body::new(m, Vector3::new(px, py, pz), Vector3::new(vx, vy, vz)));
    }

    let extra = tokens.count();
    if extra > 0 {
        tracing::warn!(extra, "ignoring trailing tokens after the last body");
    }

    validate_bodies(&bodies)?;
    Ok(bodies)
}

/// Read a body list from a file
pub fn load_bodies(path: impl AsRef<Path>) -> Result<Vec<Body>> {
    let path = path.as_ref();
    let bodies = read_bodies(File::open(path)?)?;
    tracing::info!(path = %path.display(), bodies = bodies.len(), "loaded bodies");
    Ok(bodies)
}

/// Write the masses of `bodies` and every frame slot of `log`
///
/// Frames the run never reached are written as zeros so the file always
/// holds exactly `frame_capacity` frames.
pub fn write_trajectory<W: Write>(writer: W, bodies: &[Body], log: &TrajectoryLog) -> Result<()> {
    if bodies.len() != log.body_count() {
        return Err(SimulationError::InvalidConfig(format!(
            "trajectory holds {} bodies but {} masses were given",
            log.body_count(),
            bodies.len()
        )));
    }

    let mut out = BufWriter::new(writer);
    writeln!(out, "{}", log.body_count())?;
    writeln!(out, "{}", log.frame_capacity())?;
    for body in bodies {
        writeln!(out, "{}", body.mass)?;
    }
    for frame in 0..log.frame_capacity() {
        for sample in log.frame(frame).unwrap_or_default() {
            let (p, v) = (sample.position, sample.velocity);
            writeln!(out, "{} {} {} {} {} {}", p.x, p.y, p.z, v.x, v.y, v.z)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Write a trajectory to a file
pub fn save_trajectory(path: impl AsRef<Path>, bodies: &[Body], log: &TrajectoryLog) -> Result<()> {
    let path = path.as_ref();
    write_trajectory(File::create(path)?, bodies, log)?;
    tracing::info!(path = %path.display(), frames = log.recorded_frames(), "wrote trajectory");
    Ok(())
}
