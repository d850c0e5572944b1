//! Tree-based action search for deterministic retro-game environments.
//!
//! The agents in this crate never snapshot emulator state. They rely on the
//! environment being a pure function of its initial state and the actions fed
//! to it, and search by replaying whole action sequences from the start:
//!
//! 1. walk the search tree to build a candidate action sequence,
//! 2. replay it against the environment until termination,
//! 3. back-propagate the total reward along the executed actions.
//!
//! Two policies drive the walk: the greedy Brute (epsilon-greedy by visit
//! count) and the Q lookahead (gambler gate plus a bounded Bellman backup).
//!
//! # Modules
//! - `env`: The environment capability and the movie recording side channel.
//! - `tree`: Grow-only arena tree with fixed-size child slots.
//! - `search_tree`: Node statistics, best-action lookup and reward back-propagation.
//! - `policy`: The shared tree walk plus the Brute and random policies.
//! - `lookahead`: The Q policy.
//! - `rollout`: Deterministic replay of an action sequence.
//! - `agent`: One select, rollout, update pass per episode.
//! - `runner`: The outer loop with timestep budget and best trajectory tracking.
//! - `wrappers`: Frame skip and time limit adapters.
//! - `utils`: Random number helpers.
//! - `test_utils`: Toy environments for testing.
//!
//! # Examples
//! ```rust
//! use retro_brute::{test_utils::PrefixEnv, AgentConfig, Brute, RunConfig, Runner};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let env = PrefixEnv::<4>::new(vec![3, 1, 2]);
//! let agent = Brute::brute(env, &AgentConfig { max_episode_steps: 10, render: false, seed: Some(7) })?;
//! let mut runner = Runner::new(agent, RunConfig { timestep_limit: 1_000, ..RunConfig::DEFAULT })?;
//!
//! let summary = runner.run()?;
//! println!("best reward {} after {} episodes", summary.best_reward, summary.episodes);
//! # Ok(())
//! # }
//! ```

mod tree;
mod env;
mod error;
mod search_tree;
mod policy;
mod lookahead;
mod agent;
mod runner;
pub mod rollout;
pub mod wrappers;
pub mod utils;

#[doc(hidden)]
pub mod test_utils;

pub use tree::*;
pub use env::*;
pub use error::ConfigError;
pub use search_tree::*;
pub use policy::*;
pub use lookahead::*;
pub use agent::*;
pub use runner::*;
pub use rollout::{rollout, Rollout};
pub use wrappers::{FrameSkip, TimeLimit, DEFAULT_FRAME_SKIP};
