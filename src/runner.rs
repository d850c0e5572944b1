//! Outer episode loop with best-trajectory tracking.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    time::Instant,
};

use log::info;

use crate::{record_trajectory, Agent, ConfigError, Environment, Episode, Recorder, SelectionPolicy};

/// Extension of movie files written by the recorder.
pub const MOVIE_EXTENSION: &str = ".bk2";

/// Configuration of the episode loop.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig{
    /// The loop stops once the executed steps of all episodes exceed this budget.
    pub timestep_limit: u64,
    /// Where to record each new best trajectory, if anywhere.
    pub save: Option<PathBuf>,
    /// Log the elapsed time whenever the best reward improves.
    pub report_time: bool,
}

impl RunConfig{
    /// - `timestep_limit`: 100 000 000
    /// - `save`: `None`
    /// - `report_time`: `false`
    pub const DEFAULT: RunConfig = RunConfig{
        timestep_limit: 100_000_000,
        save: None,
        report_time: false,
    };

    pub fn validate(&self) -> Result<(), ConfigError>{
        if self.timestep_limit == 0{
            return Err(ConfigError::ZeroTimestepLimit);
        }
        Ok(())
    }
}

impl Default for RunConfig{
    fn default() -> Self{
        Self::DEFAULT
    }
}

/// State of the loop once it stops.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary{
    /// Episodes played.
    pub episodes: u64,
    /// Executed steps summed over every episode.
    pub timesteps: u64,
    /// Highest total reward seen, `-inf` if no episode ran.
    pub best_reward: f64,
    /// Actions of the episode that set `best_reward`.
    pub best_actions: Vec<usize>,
    /// Nodes in the search tree, root included.
    pub node_count: usize,
}

/// Appends the movie extension unless `path` already ends with it.
pub fn normalize_movie_path(path: &Path) -> PathBuf{
    if path.as_os_str().to_string_lossy().ends_with(MOVIE_EXTENSION){
        return path.to_path_buf();
    }

    let mut name = OsString::from(path.as_os_str());
    name.push(MOVIE_EXTENSION);
    PathBuf::from(name)
}

/// Repeats episodes until the timestep budget is exhausted.
///
/// The search never stops early on a good episode. An episode that strictly
/// beats every earlier one becomes the best trajectory, and the best reward
/// never decreases.
pub struct Runner<E, P, const N: usize>{
    agent: Agent<E, P, N>,
    config: RunConfig,
    episodes: u64,
    timesteps: u64,
    best_reward: f64,
    best_actions: Vec<usize>,
}

impl<E, P, const N: usize> Runner<E, P, N>
where
    E: Environment<N>,
    P: SelectionPolicy<N>,
{
    /// Wraps `agent` in a loop.
    ///
    /// # Returns
    /// `Err(ConfigError)` if `config` is invalid.
    pub fn new(agent: Agent<E, P, N>, mut config: RunConfig) -> Result<Self, ConfigError>{
        config.validate()?;
        config.save = config.save.as_deref().map(normalize_movie_path);

        Ok(Runner{
            agent,
            config,
            episodes: 0,
            timesteps: 0,
            best_reward: f64::NEG_INFINITY,
            best_actions: Vec::new(),
        })
    }

    /// The wrapped agent.
    #[inline]
    pub fn agent(&self) -> &Agent<E, P, N>{
        &self.agent
    }

    /// The loop configuration, with the save path normalised.
    #[inline]
    pub fn config(&self) -> &RunConfig{
        &self.config
    }

    /// Best reward so far, `-inf` before the first episode.
    #[inline]
    pub fn best_reward(&self) -> f64{
        self.best_reward
    }

    /// Actions of the best episode so far, empty before the first episode.
    #[inline]
    pub fn best_actions(&self) -> &[usize]{
        &self.best_actions
    }

    /// Executed steps summed over every episode so far.
    #[inline]
    pub fn timesteps(&self) -> u64{
        self.timesteps
    }

    /// Whether the executed steps exceed the timestep budget.
    #[inline]
    pub fn is_exhausted(&self) -> bool{
        self.timesteps > self.config.timestep_limit
    }

    /// Snapshot of the loop state.
    pub fn summary(&self) -> RunSummary{
        RunSummary{
            episodes: self.episodes,
            timesteps: self.timesteps,
            best_reward: self.best_reward,
            best_actions: self.best_actions.clone(),
            node_count: self.agent.node_count(),
        }
    }

    /// Runs one episode and folds it into the loop state.
    ///
    /// # Returns
    /// The episode and whether it set a new best reward.
    pub fn iterate(&mut self) -> Result<(Episode, bool), E::Error>{
        let episode = self.agent.run_episode()?;
        self.episodes += 1;
        self.timesteps += episode.actions.len() as u64;

        let improved = episode.total_reward > self.best_reward;
        if improved{
            info!("New best reward {} from {}", episode.total_reward, self.best_reward);
            self.best_reward = episode.total_reward;
            self.best_actions.clone_from(&episode.actions);
        }

        Ok((episode, improved))
    }

    /// Loops until the budget is exhausted, calling `on_improve` with the
    /// environment and the new best actions after every improvement.
    pub fn run_with<F>(&mut self, mut on_improve: F) -> Result<RunSummary, E::Error>
    where
        F: FnMut(&mut E, &[usize]) -> Result<(), E::Error>,
    {
        let start = Instant::now();

        loop{
            let (_, improved) = self.iterate()?;

            if improved{
                if self.config.report_time{
                    info!("Elapsed time {:.3}s", start.elapsed().as_secs_f64());
                }
                on_improve(self.agent.env_mut(), &self.best_actions)?;
            }

            if self.is_exhausted(){
                info!("Timed out after {} steps in {} episodes", self.timesteps, self.episodes);
                break;
            }
        }

        Ok(self.summary())
    }

    /// Loops until the budget is exhausted without persisting anything.
    pub fn run(&mut self) -> Result<RunSummary, E::Error>{
        self.run_with(|_, _| Ok(()))
    }
}

impl<E, P, const N: usize> Runner<E, P, N>
where
    E: Recorder<N>,
    P: SelectionPolicy<N>,
{
    /// Loops like [`Runner::run`], replaying each new best trajectory into a
    /// movie file when a save path is configured.
    pub fn run_recording(&mut self) -> Result<RunSummary, E::Error>{
        let Some(path) = self.config.save.clone() else {
            return self.run();
        };

        self.run_with(|env, actions| {
            info!("Saving {}", path.display());
            record_trajectory(env, actions, &path)
        })
    }
}
