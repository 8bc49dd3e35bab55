#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy behaviour strategies and the system that drives them each tick.
//!
//! Every enemy owns exactly one [`EnemyAi`] strategy. Strategies read the
//! level, move their own agent through its movement primitive, and may
//! damage the target through the shared attack protocol. No strategy ever
//! observes another enemy's state.

pub mod aggressive;
pub mod guard;
pub mod patrol;
pub mod random;

use std::{collections::BTreeMap, fmt, time::Duration};

use delve_core::{config::AiTuning, AgentId, AiKind, AiState, Event};
use delve_world::{agent::Agent, level::Level, Combatants};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use aggressive::Aggressive;
pub use guard::Guard;
pub use patrol::Patrol;
pub use random::RandomMovement;

/// Everything a strategy may touch during one update.
#[derive(Debug)]
pub struct AiContext<'a> {
    /// Agent driven by the strategy.
    pub agent: &'a mut Agent,
    /// Agent the strategy hunts.
    pub target: &'a mut Agent,
    /// Level both agents move through.
    pub level: &'a Level,
    /// Current simulation time.
    pub now: Duration,
    /// Simulation time covered by this update.
    pub dt: Duration,
    /// Sink for damage and death events caused by attacks.
    pub events: &'a mut Vec<Event>,
}

impl AiContext<'_> {
    /// Reports whether the target is alive and inside the agent's detection radius.
    #[must_use]
    pub fn target_detected(&self) -> bool {
        !self.target.is_dead() && self.agent.can_detect(self.target.position())
    }

    /// Attacks the target when possible, otherwise steps toward it.
    ///
    /// Returns [`AiState::Attacking`] when damage landed and
    /// [`AiState::Chasing`] otherwise.
    pub fn pursue(&mut self) -> AiState {
        if self.agent.attack(self.target, self.now, self.events) {
            return AiState::Attacking;
        }

        let _ = self.agent.move_towards(self.target.position(), self.level);
        AiState::Chasing
    }
}

/// Interchangeable enemy behaviour.
pub trait EnemyAi: fmt::Debug {
    /// Advances the strategy by one tick.
    fn update(&mut self, ctx: &mut AiContext<'_>);

    /// Observable state after the most recent update.
    fn state(&self) -> AiState;

    /// Returns the strategy to its freshly constructed condition.
    fn reset(&mut self);

    /// Strategy family.
    fn kind(&self) -> AiKind;
}

/// System owning one strategy per live enemy.
#[derive(Debug)]
pub struct Behaviors {
    tuning: AiTuning,
    rng: ChaCha8Rng,
    strategies: BTreeMap<AgentId, Box<dyn EnemyAi>>,
}

impl Behaviors {
    /// Creates the system; every strategy's random stream derives from `seed`.
    #[must_use]
    pub fn new(tuning: AiTuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: ChaCha8Rng::seed_from_u64(seed),
            strategies: BTreeMap::new(),
        }
    }

    /// Consumes world events, updating every strategy once per elapsed tick.
    ///
    /// Spawn events attach new strategies and removal events drop them.
    /// Damage and death caused by attacks are appended to `out_events`.
    pub fn handle(&mut self, events: &[Event], combatants: Combatants<'_>, out_events: &mut Vec<Event>) {
        let Combatants {
            level,
            player,
            enemies,
            now,
        } = combatants;

        for event in events {
            match event {
                Event::EnemySpawned {
                    agent, ai, position, ..
                } => {
                    let strategy = self.instantiate(*ai, *position);
                    let _ = self.strategies.insert(*agent, strategy);
                }
                Event::AgentRemoved { agent } => {
                    let _ = self.strategies.remove(agent);
                }
                Event::TimeAdvanced { dt } => {
                    for enemy in enemies.iter_mut() {
                        let Some(strategy) = self.strategies.get_mut(&enemy.id()) else {
                            continue;
                        };

                        let before = strategy.state();
                        let mut ctx = AiContext {
                            agent: enemy,
                            target: &mut *player,
                            level,
                            now,
                            dt: *dt,
                            events: &mut *out_events,
                        };
                        strategy.update(&mut ctx);

                        let after = strategy.state();
                        if before != after {
                            tracing::trace!(
                                agent = ctx.agent.id().get(),
                                ?before,
                                ?after,
                                "behaviour state changed"
                            );
                        }
                    }
                }
                Event::AgentDamaged { .. } | Event::AgentDied { .. } => {}
            }
        }
    }

    /// State reported for the agent, with dead agents always reported as [`AiState::Dead`].
    #[must_use]
    pub fn state_of(&self, agent: &Agent) -> Option<AiState> {
        if agent.is_dead() {
            return Some(AiState::Dead);
        }

        self.strategies.get(&agent.id()).map(|strategy| strategy.state())
    }

    /// Strategy attached to the agent, if any.
    #[must_use]
    pub fn strategy(&self, agent: AgentId) -> Option<&dyn EnemyAi> {
        self.strategies.get(&agent).map(|strategy| strategy.as_ref())
    }

    /// Resets the agent's strategy, returning whether one was attached.
    pub fn reset(&mut self, agent: AgentId) -> bool {
        let Some(strategy) = self.strategies.get_mut(&agent) else {
            return false;
        };
        strategy.reset();
        true
    }

    /// Number of attached strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Reports whether no strategy is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    fn instantiate(&mut self, kind: AiKind, position: glam::Vec2) -> Box<dyn EnemyAi> {
        let seed = self.rng.gen::<u64>();
        match kind {
            AiKind::Random => Box::new(RandomMovement::new(self.tuning.random.clone(), seed)),
            AiKind::Patrol => Box::new(Patrol::new(position, self.tuning.patrol.clone(), seed)),
            AiKind::Guard => Box::new(Guard::new(position, self.tuning.guard.clone())),
            AiKind::Aggressive => Box::new(Aggressive::new(self.tuning.aggressive.clone())),
        }
    }
}

/// Draws `true` with probability `chance`.
pub(crate) fn roll<R: Rng>(rng: &mut R, chance: f64) -> bool {
    rng.gen::<f64>() < chance
}
