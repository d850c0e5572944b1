//! Environment adapters applied before handing an environment to an agent.

use std::path::Path;

use crate::{ConfigError, Environment, Recorder, Step};

/// Ticks per step used when the caller does not choose one.
pub const DEFAULT_FRAME_SKIP: usize = 4;

/// Repeats each action for several consecutive ticks.
///
/// Rewards of the repeated ticks are summed. Repetition stops early on
/// termination; the last observation and info are returned.
pub struct FrameSkip<E>{
    inner: E,
    skip: usize,
}

impl<E> FrameSkip<E>{
    /// Wraps `inner` so each step covers `skip` ticks.
    ///
    /// # Returns
    /// `Err(ConfigError::ZeroFrameSkip)` if `skip` is zero.
    pub fn new(inner: E, skip: usize) -> Result<Self, ConfigError>{
        if skip == 0{
            return Err(ConfigError::ZeroFrameSkip);
        }
        Ok(FrameSkip { inner, skip })
    }

    #[inline]
    pub fn skip(&self) -> usize{
        self.skip
    }

    #[inline]
    pub fn inner(&self) -> &E{
        &self.inner
    }

    pub fn into_inner(self) -> E{
        self.inner
    }
}

impl<E: Environment<N>, const N: usize> Environment<N> for FrameSkip<E>{
    type Observation = E::Observation;
    type Info = E::Info;
    type Error = E::Error;

    fn reset(&mut self) -> Result<E::Observation, E::Error>{
        self.inner.reset()
    }

    fn step(&mut self, action: usize) -> Result<Step<E::Observation, E::Info>, E::Error>{
        let mut step = self.inner.step(action)?;
        let mut total_reward = step.reward;

        for _ in 1..self.skip{
            if step.done{
                break;
            }
            step = self.inner.step(action)?;
            total_reward += step.reward;
        }

        step.reward = total_reward;
        Ok(step)
    }

    fn render(&mut self){
        self.inner.render()
    }
}

impl<E: Recorder<N>, const N: usize> Recorder<N> for FrameSkip<E>{
    fn start_recording(&mut self, path: &Path) -> Result<(), E::Error>{
        self.inner.start_recording(path)
    }

    fn stop_recording(&mut self) -> Result<(), E::Error>{
        self.inner.stop_recording()
    }
}

/// Ends every episode after a fixed number of steps.
pub struct TimeLimit<E>{
    inner: E,
    max_episode_steps: usize,
    elapsed: usize,
}

impl<E> TimeLimit<E>{
    /// Wraps `inner` so `done` is forced after `max_episode_steps` steps.
    ///
    /// # Returns
    /// `Err(ConfigError::ZeroTimeLimit)` if `max_episode_steps` is zero.
    pub fn new(inner: E, max_episode_steps: usize) -> Result<Self, ConfigError>{
        if max_episode_steps == 0{
            return Err(ConfigError::ZeroTimeLimit);
        }
        Ok(TimeLimit { inner, max_episode_steps, elapsed: 0 })
    }

    /// Steps taken since the last reset.
    #[inline]
    pub fn elapsed(&self) -> usize{
        self.elapsed
    }

    #[inline]
    pub fn inner(&self) -> &E{
        &self.inner
    }

    pub fn into_inner(self) -> E{
        self.inner
    }
}

impl<E: Environment<N>, const N: usize> Environment<N> for TimeLimit<E>{
    type Observation = E::Observation;
    type Info = E::Info;
    type Error = E::Error;

    fn reset(&mut self) -> Result<E::Observation, E::Error>{
        self.elapsed = 0;
        self.inner.reset()
    }

    fn step(&mut self, action: usize) -> Result<Step<E::Observation, E::Info>, E::Error>{
        let mut step = self.inner.step(action)?;
        self.elapsed += 1;

        if self.elapsed >= self.max_episode_steps{
            step.done = true;
        }
        Ok(step)
    }

    fn render(&mut self){
        self.inner.render()
    }
}

impl<E: Recorder<N>, const N: usize> Recorder<N> for TimeLimit<E>{
    fn start_recording(&mut self, path: &Path) -> Result<(), E::Error>{
        self.inner.start_recording(path)
    }

    fn stop_recording(&mut self) -> Result<(), E::Error>{
        self.inner.stop_recording()
    }
}
