//! Test utilities for the search implementation

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{Environment, Recorder, Step};

/// Fault raised by the test environments
#[derive(Debug, Error, PartialEq)]
#[error("emulator fault at step {0}")]
pub struct EnvFault(pub usize);

/// A deterministic environment driven by a reward table.
///
/// The reward for playing action `a` at step `t` is `table[t][a]`. The episode
/// terminates after `table.len()` steps.
pub struct RewardTableEnv<const N: usize>{
    table: Vec<[f64; N]>,
    fail_at: Option<usize>,
    t: usize,
    /// Number of `reset` calls so far
    pub resets: usize,
    /// Number of `render` calls so far
    pub renders: usize,
    /// Every action stepped since the last reset
    pub played: Vec<usize>,
}

impl<const N: usize> RewardTableEnv<N>{
    pub fn new(table: Vec<[f64; N]>) -> Self{
        RewardTableEnv { table, fail_at: None, t: 0, resets: 0, renders: 0, played: Vec::new() }
    }

    /// Makes `step` fail once the episode reaches step `t`
    pub fn failing_at(mut self, t: usize) -> Self{
        self.fail_at = Some(t);
        self
    }
}

impl<const N: usize> Environment<N> for RewardTableEnv<N>{
    type Observation = usize;
    type Info = ();
    type Error = EnvFault;

    fn reset(&mut self) -> Result<usize, EnvFault>{
        self.t = 0;
        self.resets += 1;
        self.played.clear();
        Ok(0)
    }

    fn step(&mut self, action: usize) -> Result<Step<usize, ()>, EnvFault>{
        if self.fail_at == Some(self.t){
            return Err(EnvFault(self.t));
        }

        let reward = self.table.get(self.t).map_or(0.0, |row| row[action]);
        self.t += 1;
        self.played.push(action);

        Ok(Step { observation: self.t, reward, done: self.t >= self.table.len(), info: () })
    }

    fn render(&mut self){
        self.renders += 1;
    }
}

/// Rewards 1 for every step that follows a hidden target sequence.
///
/// The episode ends on the first wrong action or when the sequence is complete.
pub struct PrefixEnv<const N: usize>{
    target: Vec<usize>,
    t: usize,
}

impl<const N: usize> PrefixEnv<N>{
    pub fn new(target: Vec<usize>) -> Self{
        PrefixEnv { target, t: 0 }
    }
}

impl<const N: usize> Environment<N> for PrefixEnv<N>{
    type Observation = usize;
    type Info = ();
    type Error = EnvFault;

    fn reset(&mut self) -> Result<usize, EnvFault>{
        self.t = 0;
        Ok(0)
    }

    fn step(&mut self, action: usize) -> Result<Step<usize, ()>, EnvFault>{
        let hit = self.target.get(self.t) == Some(&action);
        self.t += 1;

        Ok(Step { observation: self.t, reward: if hit { 1.0 } else { 0.0 }, done: !hit || self.t >= self.target.len(), info: () })
    }
}

/// Wraps an environment and keeps recorded movies in memory.
pub struct RecordingEnv<E>{
    pub inner: E,
    /// Finished movies: path and the actions stepped while recording
    pub movies: Vec<(PathBuf, Vec<usize>)>,
    current: Option<(PathBuf, Vec<usize>)>,
}

impl<E> RecordingEnv<E>{
    pub fn new(inner: E) -> Self{
        RecordingEnv { inner, movies: Vec::new(), current: None }
    }

    pub fn is_recording(&self) -> bool{
        self.current.is_some()
    }
}

impl<E: Environment<N>, const N: usize> Environment<N> for RecordingEnv<E>{
    type Observation = E::Observation;
    type Info = E::Info;
    type Error = E::Error;

    fn reset(&mut self) -> Result<E::Observation, E::Error>{
        if let Some((_, actions)) = &mut self.current{
            actions.clear();
        }
        self.inner.reset()
    }

    fn step(&mut self, action: usize) -> Result<Step<E::Observation, E::Info>, E::Error>{
        let step = self.inner.step(action)?;
        if let Some((_, actions)) = &mut self.current{
            actions.push(action);
        }
        Ok(step)
    }
}

impl<E: Environment<N>, const N: usize> Recorder<N> for RecordingEnv<E>{
    fn start_recording(&mut self, path: &Path) -> Result<(), E::Error>{
        self.current = Some((path.to_path_buf(), Vec::new()));
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), E::Error>{
        if let Some(movie) = self.current.take(){
            self.movies.push(movie);
        }
        Ok(())
    }
}
