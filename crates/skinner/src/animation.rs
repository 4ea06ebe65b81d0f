use glam::{Quat, Vec3};
use log::{debug, trace, warn};
use skinner_asset::{
    animation::{AnimationAsset, AnimationChannel, ChannelValues},
    node::SceneGraph,
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AnimationState {
    /// Nothing plays; node transforms are left alone.
    #[default]
    Idle,
    Playing { animation: usize, time: f32 },
}

/// Position of a sample time between two keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub from: usize,
    pub to: usize,
    /// In `[0, 1]`.
    pub factor: f32,
    /// Time between the two keys.
    pub delta: f32,
}

/// Find the key interval holding `time` by scanning from the first key.
///
/// Intervals are half-open. From the final key on, the first key sharing
/// the final time is held. Before the first key, or when nothing matches,
/// interval 0 is used with the factor clamped. A zero-length interval gives
/// factor 0, and a single key gives `from == to == 0`.
pub fn find_keyframe(times: &[f32], time: f32) -> Keyframe {
    let last = times.len().saturating_sub(1);
    let hold = |from| Keyframe {
        from,
        to: from,
        factor: 0.0,
        delta: 0.0,
    };
    if last == 0 {
        return hold(0);
    }

    let mut index = 0;
    while index < last {
        if times[index] <= time && time < times[index + 1] {
            break;
        }
        index += 1;
    }
    if index == last {
        if time >= times[last] {
            let end = times[last];
            return hold(times.iter().position(|key| *key >= end).unwrap_or(last));
        }
        index = 0;
    }

    let (start, end) = (times[index], times[index + 1]);
    let delta = end - start;
    // NaN and times before the first key fail the comparison
    let factor = if delta > 0.0 && time >= start {
        ((time - start) / delta).min(1.0)
    } else {
        0.0
    };
    Keyframe {
        from: index,
        to: index + 1,
        factor,
        delta,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelSample {
    Translation(Vec3),
    Rotation(Quat),
    Scale(Vec3),
}

pub fn sample_channel(channel: &AnimationChannel, time: f32) -> ChannelSample {
    let Keyframe {
        from,
        to,
        factor,
        delta,
    } = find_keyframe(channel.times(), time);
    let interpolation = channel.interpolation();
    match channel.values() {
        ChannelValues::Translation(values) => {
            ChannelSample::Translation(interpolation.sample(values, from, to, factor, delta))
        }
        ChannelValues::Rotation(values) => {
            ChannelSample::Rotation(interpolation.sample(values, from, to, factor, delta))
        }
        ChannelValues::Scale(values) => {
            ChannelSample::Scale(interpolation.sample(values, from, to, factor, delta))
        }
    }
}

/// Plays one animation of a model at a time, looping.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    animations: Vec<AnimationAsset>,
    state: AnimationState,
}

impl Animator {
    /// Start playing `active`, or the first animation when `active` is out
    /// of range. Idle without animations.
    pub fn new(animations: Vec<AnimationAsset>, active: usize) -> Self {
        let state = if animations.is_empty() {
            AnimationState::Idle
        } else {
            let animation = if active < animations.len() {
                active
            } else {
                warn!(
                    "Animation #{} not found among {}, playing #0",
                    active,
                    animations.len()
                );
                0
            };
            AnimationState::Playing {
                animation,
                time: 0.0,
            }
        };
        Self { animations, state }
    }

    pub fn animations(&self) -> &[AnimationAsset] {
        &self.animations
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn active(&self) -> Option<&AnimationAsset> {
        match self.state {
            AnimationState::Idle => None,
            AnimationState::Playing { animation, .. } => self.animations.get(animation),
        }
    }

    /// Playback time in seconds, 0 when idle.
    pub fn current_time(&self) -> f32 {
        match self.state {
            AnimationState::Idle => 0.0,
            AnimationState::Playing { time, .. } => time,
        }
    }

    /// Play animation `index` from its start. Returns `false`, changing
    /// nothing, when there is no such animation.
    pub fn play(&mut self, index: usize) -> bool {
        if index >= self.animations.len() {
            warn!("Animation #{} not found", index);
            return false;
        }
        debug!("Playing animation #{}", index);
        self.state = AnimationState::Playing {
            animation: index,
            time: 0.0,
        };
        true
    }

    pub fn stop(&mut self) {
        self.state = AnimationState::Idle;
    }

    /// Seek the active animation. Times outside `[0, duration)` wrap around.
    pub fn set_time(&mut self, time: f32) {
        let duration = self.active().map_or(0.0, |animation| animation.duration);
        if let AnimationState::Playing { time: current, .. } = &mut self.state {
            *current = if duration > 0.0 && time.is_finite() {
                time.rem_euclid(duration)
            } else {
                0.0
            };
            // rem_euclid can round up to the divisor
            if *current >= duration {
                *current = 0.0;
            }
        }
    }

    /// Move playback time forward by `elapsed` seconds, wrapping to 0 once
    /// it reaches the duration. Negative or NaN steps count as 0.
    pub fn advance(&mut self, elapsed: f32) {
        let duration = self.active().map_or(0.0, |animation| animation.duration);
        if let AnimationState::Playing { time, .. } = &mut self.state {
            *time += elapsed.max(0.0);
            if *time >= duration {
                *time = 0.0;
            }
            trace!("Animate time: {:.03}s", *time);
        }
    }

    /// Write every channel of the active animation, sampled at the current
    /// time, into the target nodes' local transforms. Global matrices are
    /// left stale.
    pub fn apply(&self, graph: &mut SceneGraph) {
        let Some(animation) = self.active() else {
            return;
        };
        let time = self.current_time();
        for channel in &animation.channels {
            let Some(node) = graph.node_mut(channel.target()) else {
                warn!("Target node to be animated not found: #{}", channel.target());
                continue;
            };
            let transform = node.transform_mut();
            match sample_channel(channel, time) {
                ChannelSample::Translation(translation) => transform.translation = translation,
                ChannelSample::Rotation(rotation) => transform.rotation = rotation,
                ChannelSample::Scale(scale) => transform.scale = scale,
            }
        }
    }

    /// One tick: advance, apply and propagate down the hierarchy.
    pub fn update(&mut self, elapsed: f32, graph: &mut SceneGraph) {
        self.advance(elapsed);
        self.apply(graph);
        graph.update_hierarchy();
    }
}
