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
//! Trajectory sampling and storage

use crate::body::Body;
use crate::math::Vector3;

/// Which iterations produce a trajectory frame
///
/// Iteration `t` (zero-based) is sampled as frame `t / stride` when
/// `t % stride == 0` and that frame index is below the frame count. With
/// zero frames nothing is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSchedule {
    stride: usize,
    frames: usize,
}

impl FrameSchedule {
    /// Schedule `frames` samples over `iterations` steps
    pub fn new(iterations: usize, frames: usize) -> Self {
        let stride = if frames == 0 { 0 } else { (iterations / frames).max(1) };
        FrameSchedule { stride, frames }
    }

    /// Iterations between samples (0 when sampling is disabled)
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of frames that will be recorded
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Frame index recorded after `iteration`, if any
    pub fn frame_at(&self, iteration: usize) -> Option<usize> {
        if self.stride == 0 || iteration % self.stride != 0 {
            return None;
        }
        let frame = iteration / self.stride;
        (frame < self.frames).then_some(frame)
    }
}

/// Receiver of sampled frames
///
/// Sinks are owned by exactly one thread at a time: the serial loop, the
/// leader of the shared-memory team, or rank 0 of a distributed run.
pub trait TrajectorySink: Send {
    /// Record the state of every body as frame `frame`
    fn append_frame(&mut self, frame: usize, bodies: &[Body]);
}

/// Sink that keeps nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TrajectorySink for NullSink {
    fn append_frame(&mut self, _frame: usize, _bodies: &[Body]) {}
}

/// Position and velocity of one body in one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    /// Position at the sampled step
    pub position: Vector3,
    /// Velocity at the sampled step
    pub velocity: Vector3,
}

impl From<&Body> for Sample {
    fn from(body: &Body) -> Self {
        Sample {
            position: body.position,
            velocity: body.velocity,
        }
    }
}

/// In-memory trajectory, frame-major
///
/// Sample `(frame, body)` lives at `frame * bodies + body`.
#[derive(Debug, Clone)]
pub struct TrajectoryLog {
    bodies: usize,
    frames: usize,
    samples: Vec<Sample>,
    recorded: usize,
}

impl TrajectoryLog {
    /// Log with room for `frames` frames of `bodies` bodies
    pub fn new(bodies: usize, frames: usize) -> Self {
        TrajectoryLog {
            bodies,
            frames,
            samples: vec![Sample::default(); bodies * frames],
            recorded: 0,
        }
    }

    /// Bodies per frame
    pub fn body_count(&self) -> usize {
        self.bodies
    }

    /// Frame capacity
    pub fn frame_capacity(&self) -> usize {
        self.frames
    }

    /// One past the highest frame recorded so far
    pub fn recorded_frames(&self) -> usize {
        self.recorded
    }

    /// Every sample of `frame`, or `None` beyond capacity
    pub fn frame(&self, frame: usize) -> Option<&[Sample]> {
        if frame >= self.frames {
            return None;
        }
        let start = frame * self.bodies;
        Some(&self.samples[start..start + self.bodies])
    }

    /// One sample
    pub fn sample(&self, frame: usize, body: usize) -> Option<Sample> {
        self.frame(frame).and_then(|f| f.get(body).copied())
    }

    /// Iterate over recorded frames in order
    pub fn frames(&self) -> impl Iterator<Item = &[Sample]> {
        self.samples
            .chunks(self.bodies.max(1))
            .take(self.recorded)
    }
}

impl TrajectorySink for TrajectoryLog {
    fn append_frame(&mut self, frame: usize, bodies: &[Body]) {
        if frame >= self.frames {
            tracing::warn!(frame, capacity = self.frames, "dropping frame beyond log capacity");
            return;
        }
        if bodies.len() != self.bodies {
            tracing::warn!(
                frame,
                expected = self.bodies,
                got = bodies.len(),
                "dropping frame with wrong body count"
            );
            return;
        }

        let start = frame * self.bodies;
        for (slot, body) in self.samples[start..start + self.bodies].iter_mut().zip(bodies) {
            *slot = Sample::from(body);
        }
        self.recorded = self.recorded.max(frame + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_stride() {
        let schedule = FrameSchedule::new(10_000, 2000);
        assert_eq!(schedule.stride(), 5);
        assert_eq!(schedule.frame_at(0), Some(0));
        assert_eq!(schedule.frame_at(5), Some(1));
        assert_eq!(schedule.frame_at(6), None);
        assert_eq!(schedule.frame_at(9_995), Some(1999));
    }

    #[test]
    fn test_schedule_uneven_division_caps_frames() {
        // stride 3, so iteration 9 would be frame 3
        let schedule = FrameSchedule::new(10, 3);
        let sampled: Vec<_> = (0..10).filter_map(|t| schedule.frame_at(t)).collect();
        assert_eq!(sampled, vec![0, 1, 2]);
    }

    #[test]
    fn test_schedule_disabled() {
        let schedule = FrameSchedule::new(10, 0);
        assert!((0..10).all(|t| schedule.frame_at(t).is_none()));
    }

    #[test]
    fn test_log_records_frames() {
        let mut log = TrajectoryLog::new(2, 3);
        let bodies = [
            Body::new(1.0, Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)),
            Body::at_rest(1.0, Vector3::new(2.0, 0.0, 0.0)),
        ];
        log.append_frame(1, &bodies);

        assert_eq!(log.recorded_frames(), 2);
        let sample = log.sample(1, 0).unwrap();
        assert_eq!(sample.position, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(sample.velocity, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(log.sample(0, 1).unwrap(), Sample::default());
        assert_eq!(log.frames().count(), 2);
    }

    #[test]
    fn test_log_ignores_out_of_range() {
        let mut log = TrajectoryLog::new(1, 1);
        log.append_frame(3, &[Body::at_rest(1.0, Vector3::zero())]);
        log.append_frame(0, &[]);
        assert_eq!(log.recorded_frames(), 0);
        assert!(log.frame(1).is_none());
    }
}
