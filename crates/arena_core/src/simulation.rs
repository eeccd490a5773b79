//! Frame orchestrator.
//!
//! [`Simulation`] owns every entity in a match and advances them one frame
//! per [`Simulation::tick`]. The systems run in a fixed order and only the
//! seeded generator stored in the simulation supplies randomness, so the same
//! [`MatchConfig`] and the same inputs always produce the same state hash.
//!
//! # Example
//!
//! ```
//! use arena_core::config::MatchConfig;
//! use arena_core::difficulty::Difficulty;
//! use arena_core::input::{FrameInput, PlayerInput};
//! use arena_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(MatchConfig::solo(Difficulty::Easy, 42));
//! assert_eq!(sim.director().robot_count(), 8);
//!
//! let events = sim.tick(&FrameInput::solo(PlayerInput::firing_at(0.0)));
//! assert_eq!(events.shots_fired, 1);
//! assert_eq!(sim.current_tick(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::Vec2;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::arena::{EntityArena, Handle};
use crate::boss::Boss;
use crate::combatant::{Combatant, PlayerSlot};
use crate::config::{GameMode, MatchConfig};
use crate::difficulty::DEFAULT_PLAYER_HEALTH;
use crate::effects::{Camera, Effects};
use crate::error::Result;
use crate::events::{MatchOutcome, TickEvents};
use crate::grenade::{Explosion, Grenade, SmokeCloud};
use crate::input::FrameInput;
use crate::math::MapBounds;
use crate::obstacle::{border_walls, find_safe_position, Obstacle, ObstacleSource};
use crate::player::{spawn_positions, ControlSource, LoadoutPolicy, Player, PLAYER_RADIUS};
use crate::projectile::Projectile;
use crate::robot::Robot;
use crate::shop::{self, ShopItem, ShopPrompts};
use crate::wave::WaveDirector;

/// Where the match stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Systems run every tick.
    #[default]
    Playing,
    /// The shop is open; the world is paused until it closes.
    Shop,
    /// The match has ended.
    Over,
}

/// A running match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub(crate) tick: u64,
    pub(crate) config: MatchConfig,
    pub(crate) bounds: MapBounds,
    pub(crate) obstacles: Vec<Obstacle>,
    pub(crate) players: Vec<Player>,
    pub(crate) director: WaveDirector,
    pub(crate) projectiles: EntityArena<Projectile>,
    pub(crate) grenades: EntityArena<Grenade>,
    pub(crate) explosions: EntityArena<Explosion>,
    pub(crate) smoke: EntityArena<SmokeCloud>,
    pub(crate) effects: Effects,
    pub(crate) cameras: Vec<Camera>,
    pub(crate) phase: MatchPhase,
    pub(crate) prompts: ShopPrompts,
    pub(crate) outcome: Option<MatchOutcome>,
    pub(crate) rng: Pcg32,
}

impl Simulation {
    /// Set up a match: obstacles, players and the first robot cohort.
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let bounds = config.bounds;

        let mut obstacles: Vec<Obstacle> = border_walls(bounds).to_vec();
        obstacles.extend(config.obstacles.obstacles(bounds, &mut rng));

        let mode = config.mode;
        let settings = config.difficulty.settings();
        let health = if mode.is_pvp() {
            DEFAULT_PLAYER_HEALTH
        } else {
            settings.player_health
        };
        let spawns = spawn_positions(mode, bounds, config.host);
        let safe = |spawn: Vec2| find_safe_position(&obstacles, bounds, spawn, PLAYER_RADIUS);

        let mut players = vec![Player::new(
            PlayerSlot::One,
            safe(spawns[0]),
            health,
            ControlSource::LocalPrimary,
            LoadoutPolicy::Full,
        )];
        if mode.has_second_player() {
            let control = match mode {
                GameMode::Coop if config.ai_teammate => ControlSource::AiProxy,
                GameMode::OnlineCoop | GameMode::OnlinePvp => ControlSource::Remote,
                _ => ControlSource::LocalSecondary,
            };
            players.push(Player::new(
                PlayerSlot::Two,
                safe(spawns[1]),
                health,
                control,
                LoadoutPolicy::Baseline,
            ));
        }

        let mut director = WaveDirector::new(config.difficulty);
        if mode.has_robots() {
            let anchor = players[0].body.position;
            director.spawn_cohort(anchor, bounds, &obstacles, &mut rng);
            if settings.boss && director.current_wave() == director.max_waves() {
                director.spawn_boss(anchor, bounds, &mut rng);
            }
        }

        let cameras = if mode == GameMode::Pvp {
            vec![Camera::split_screen(), Camera::split_screen()]
        } else {
            vec![Camera::full_screen()]
        };

        tracing::info!(
            ?mode,
            difficulty = config.difficulty.name(),
            seed = config.seed,
            obstacles = obstacles.len(),
            robots = director.robot_count(),
            "Match started"
        );

        Self {
            tick: 0,
            config,
            bounds,
            obstacles,
            players,
            director,
            projectiles: EntityArena::new(),
            grenades: EntityArena::new(),
            explosions: EntityArena::new(),
            smoke: EntityArena::new(),
            effects: Effects::default(),
            cameras,
            phase: MatchPhase::Playing,
            prompts: ShopPrompts::default(),
            outcome: None,
            rng,
        }
    }

    /// Advance the match by one frame.
    ///
    /// Systems run in this order:
    /// 1. primary player (movement, aim, weapon actions)
    /// 2. companion player
    /// 3. cameras
    /// 4. transient effects
    /// 5. projectiles and their hits
    /// 6. grenades, explosions and smoke
    /// 7. robots
    /// 8. boss
    /// 9. win/lose and wave progression, then shop prompts
    ///
    /// Each category compacts its removed entities right after its own pass.
    /// While the shop is open only `close_shop` is honored; once the match is
    /// over nothing changes.
    pub fn tick(&mut self, input: &FrameInput) -> TickEvents {
        let mut events = TickEvents::default();

        match self.phase {
            MatchPhase::Over => return events,
            MatchPhase::Shop => {
                if input.close_shop {
                    self.close_shop();
                }
                self.tick += 1;
                return events;
            }
            MatchPhase::Playing => {}
        }

        // 1-2. Players
        self.run_player_system(PlayerSlot::One, input.get(PlayerSlot::One), &mut events);
        self.run_player_system(PlayerSlot::Two, input.get(PlayerSlot::Two), &mut events);

        // 3-4. Presentation state
        self.run_camera_system();
        let positions = self.player_positions();
        self.effects.update(positions);

        // 5. Projectiles
        self.run_projectile_system(&mut events);

        // 6. Grenades and what they leave behind
        self.run_grenade_system(&mut events);

        // 7-8. Enemies
        self.run_robot_system(&mut events);
        self.run_boss_system(&mut events);

        // 9. Outcome
        self.run_outcome_system(&mut events);
        if self.phase == MatchPhase::Playing {
            self.run_shop_prompt_system(&mut events);
        }

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Frames simulated so far.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// The config this match was built from.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Map size.
    #[must_use]
    pub const fn bounds(&self) -> MapBounds {
        self.bounds
    }

    /// Border walls followed by the interior obstacles.
    #[must_use]
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Players in slot order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The player in `slot`, if that seat is taken.
    #[must_use]
    pub fn player(&self, slot: PlayerSlot) -> Option<&Player> {
        self.players.get(slot.index())
    }

    /// Mutable access to the player in `slot`.
    pub fn player_mut(&mut self, slot: PlayerSlot) -> Option<&mut Player> {
        self.players.get_mut(slot.index())
    }

    /// Robot cohort and boss.
    #[must_use]
    pub const fn director(&self) -> &WaveDirector {
        &self.director
    }

    /// Mutable access to the wave director, for scripted scenarios.
    pub fn director_mut(&mut self) -> &mut WaveDirector {
        &mut self.director
    }

    /// Living robots.
    #[must_use]
    pub const fn robots(&self) -> &EntityArena<Robot> {
        self.director.robots()
    }

    /// The boss, if present.
    #[must_use]
    pub const fn boss(&self) -> Option<&Boss> {
        self.director.boss()
    }

    /// Rounds in flight.
    #[must_use]
    pub const fn projectiles(&self) -> &EntityArena<Projectile> {
        &self.projectiles
    }

    /// Grenades in flight.
    #[must_use]
    pub const fn grenades(&self) -> &EntityArena<Grenade> {
        &self.grenades
    }

    /// Blast animations.
    #[must_use]
    pub const fn explosions(&self) -> &EntityArena<Explosion> {
        &self.explosions
    }

    /// Smoke screens.
    #[must_use]
    pub const fn smoke_clouds(&self) -> &EntityArena<SmokeCloud> {
        &self.smoke
    }

    /// Cosmetic effects.
    #[must_use]
    pub const fn effects(&self) -> &Effects {
        &self.effects
    }

    /// One camera, or one per player in local PvP.
    #[must_use]
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// How the match ended, once it has.
    #[must_use]
    pub const fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        matches!(self.phase, MatchPhase::Over)
    }

    /// Score of every player combined.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.players.iter().map(|p| p.score).sum()
    }

    /// Kills of every player combined.
    #[must_use]
    pub fn kills(&self) -> u32 {
        self.players.iter().map(|p| p.kills).sum()
    }

    pub(crate) fn player_positions(&self) -> [Option<Vec2>; 2] {
        [PlayerSlot::One, PlayerSlot::Two].map(|slot| self.player(slot).map(|p| p.body.position))
    }

    // ========================================================================
    // Shop
    // ========================================================================

    /// Open the shop and pause the world.
    pub fn open_shop(&mut self) {
        if self.phase == MatchPhase::Playing {
            self.phase = MatchPhase::Shop;
        }
    }

    /// Close the shop and resume play.
    pub fn close_shop(&mut self) {
        if self.phase == MatchPhase::Shop {
            self.phase = MatchPhase::Playing;
        }
    }

    /// Buy `item` for the player in `slot`. Returns whether it went through.
    pub fn buy(&mut self, slot: PlayerSlot, item: ShopItem) -> bool {
        if self.phase == MatchPhase::Over {
            return false;
        }
        self.player_mut(slot)
            .is_some_and(|player| shop::buy(player, item))
    }

    // ========================================================================
    // Entity injection
    // ========================================================================

    /// Add a round to the world.
    pub fn spawn_projectile(&mut self, projectile: Projectile) -> Handle {
        self.projectiles.insert(projectile)
    }

    /// Add a robot to the cohort, bypassing spawn rules.
    pub fn spawn_robot(&mut self, robot: Robot) -> Handle {
        self.director.insert_robot(robot)
    }

    pub(crate) fn finish(&mut self, outcome: MatchOutcome, events: &mut TickEvents) {
        self.phase = MatchPhase::Over;
        self.outcome = Some(outcome);
        events.outcome = Some(outcome);
        if outcome == MatchOutcome::Victory {
            events.progress_changed = true;
        }
        tracing::info!(
            tick = self.tick,
            ?outcome,
            score = self.score(),
            kills = self.kills(),
            "Match over"
        );
    }

    // ========================================================================
    // Hashing and persistence
    // ========================================================================

    /// Hash of the complete match state.
    ///
    /// Two simulations with identical state produce identical hashes. Floats
    /// are hashed by bit pattern.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.outcome.hash(&mut hasher);
        self.prompts.hash(&mut hasher);

        self.players.len().hash(&mut hasher);
        for player in &self.players {
            player.slot.hash(&mut hasher);
            hash_combatant(&player.body, &mut hasher);
            player.loadout.current_index().hash(&mut hasher);
            player.loadout.fire_cooldown().hash(&mut hasher);
            player.loadout.reload().hash(&mut hasher);
            player.loadout.recoil().to_bits().hash(&mut hasher);
            player.loadout.weapons().hash(&mut hasher);
            player.coins.hash(&mut hasher);
            player.unlocks.hash(&mut hasher);
            player.medkits.hash(&mut hasher);
            player.kills.hash(&mut hasher);
            player.score.hash(&mut hasher);
        }

        self.director.current_wave().hash(&mut hasher);
        self.director.settle_frames().hash(&mut hasher);
        self.director.robot_count().hash(&mut hasher);
        for (handle, robot) in self.director.robots().iter() {
            handle.hash(&mut hasher);
            hash_combatant(&robot.body, &mut hasher);
            robot.kind.hash(&mut hasher);
            robot.state.hash(&mut hasher);
            hash_vec(robot.patrol_target, &mut hasher);
            robot.fire_cooldown.hash(&mut hasher);
            robot.knife_cooldown.hash(&mut hasher);
            robot.frozen.hash(&mut hasher);
            robot.headshot_marked.hash(&mut hasher);
        }
        if let Some(boss) = self.director.boss() {
            hash_combatant(&boss.body, &mut hasher);
            boss.pattern.hash(&mut hasher);
            boss.pattern_timer.hash(&mut hasher);
            if let Some(point) = boss.charge_target {
                hash_vec(point, &mut hasher);
            }
            boss.fire_cooldown.hash(&mut hasher);
            boss.headshot_marked.hash(&mut hasher);
        }

        self.projectiles.len().hash(&mut hasher);
        for (handle, projectile) in self.projectiles.iter() {
            handle.hash(&mut hasher);
            hash_vec(projectile.origin, &mut hasher);
            hash_vec(projectile.position, &mut hasher);
            projectile.speed.to_bits().hash(&mut hasher);
            projectile.angle.to_bits().hash(&mut hasher);
            projectile.damage.hash(&mut hasher);
            projectile.tag.hash(&mut hasher);
            projectile.owner.hash(&mut hasher);
            projectile.lifetime.hash(&mut hasher);
        }
        for (_, grenade) in self.grenades.iter() {
            grenade.kind.hash(&mut hasher);
            hash_vec(grenade.position, &mut hasher);
            grenade.angle.to_bits().hash(&mut hasher);
            grenade.speed.to_bits().hash(&mut hasher);
            grenade.fuse.hash(&mut hasher);
            grenade.exploded.hash(&mut hasher);
            grenade.thrower.hash(&mut hasher);
        }
        for (_, explosion) in self.explosions.iter() {
            hash_vec(explosion.center, &mut hasher);
            explosion.lifetime.hash(&mut hasher);
        }
        for (_, cloud) in self.smoke.iter() {
            hash_vec(cloud.center, &mut hasher);
            cloud.radius.to_bits().hash(&mut hasher);
            cloud.lifetime.hash(&mut hasher);
        }

        // Generator position, without advancing the real one
        self.rng.clone().next_u64().hash(&mut hasher);

        hasher.finish()
    }

    /// Serialize the whole match with bincode.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Restore a match serialized with [`Simulation::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}

fn hash_vec(v: Vec2, hasher: &mut DefaultHasher) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
}

fn hash_combatant(body: &Combatant, hasher: &mut DefaultHasher) {
    hash_vec(body.position, hasher);
    body.angle.to_bits().hash(hasher);
    body.health.hash(hasher);
    body.speed.to_bits().hash(hasher);
    body.hit_flash.hash(hasher);
}
