//! Per-frame systems run by [`Simulation::tick`].
//!
//! Each `run_*` method is one pass over one category of entities. Passes
//! walk a snapshot of handles and look each entity up again, so damage and
//! removals made mid-pass are visible to later entities in the same pass.
//! Removal is only marked; the pass compacts its own arena at the end.

use glam::Vec2;

use crate::arena::{EntityArena, Handle};
use crate::boss::{Boss, BOSS_COINS, BOSS_SCORE, CONTACT_DAMAGE};
use crate::combat::{
    chain_damage, chain_targets, in_melee_cone, kill_score, player_blast_damage,
    projectile_hits_boss, projectile_hits_circle, projectile_hits_robot,
};
use crate::combatant::PlayerSlot;
use crate::config::GameMode;
use crate::events::{CombatEvent, DamageSource, MatchOutcome, Target, TickEvents};
use crate::grenade::{Detonation, Explosion, Grenade, SmokeCloud};
use crate::input::PlayerInput;
use crate::loadout::FireOutcome;
use crate::math::angle_to;
use crate::player::{ControlSource, Player, PLAYER_RADIUS};
use crate::projectile::{Projectile, ProjectileOwner};
use crate::robot::Robot;
use crate::simulation::{MatchPhase, Simulation};
use crate::wave::WaveProgress;
use crate::weapon::{WeaponFlags, WeaponKind};

/// Autopilot opens fire on targets closer than this.
pub const AUTOPILOT_FIRE_RANGE: f32 = 300.0;

/// Autopilot walks back towards its partner beyond this distance.
pub const AUTOPILOT_FOLLOW_DISTANCE: f32 = 150.0;

const AXIS_DEAD_ZONE: f32 = 5.0;

// ============================================================================
// Targeting helpers
// ============================================================================

/// Slot and position of every living player, in slot order.
#[must_use]
pub fn living_players(players: &[Player]) -> Vec<(PlayerSlot, Vec2)> {
    players
        .iter()
        .filter(|p| p.is_alive())
        .map(|p| (p.slot, p.body.position))
        .collect()
}

/// Position of the living player closest to `from`. Ties go to the lower slot.
#[must_use]
pub fn nearest_player(living: &[(PlayerSlot, Vec2)], from: Vec2) -> Option<Vec2> {
    living
        .iter()
        .map(|(_, pos)| *pos)
        .reduce(|best, pos| {
            if pos.distance(from) < best.distance(from) {
                pos
            } else {
                best
            }
        })
}

/// Closest living robot to `from`, falling back to the boss.
#[must_use]
pub fn nearest_enemy(robots: &EntityArena<Robot>, boss: Option<&Boss>, from: Vec2) -> Option<Vec2> {
    robots
        .values()
        .filter(|r| r.is_alive())
        .map(|r| r.body.position)
        .reduce(|best, pos| {
            if pos.distance(from) < best.distance(from) {
                pos
            } else {
                best
            }
        })
        .or_else(|| boss.filter(|b| b.is_alive()).map(|b| b.body.position))
}

/// Whether any smoke cloud hides the shooter or its target.
#[must_use]
pub fn smoke_blocks(smoke: &EntityArena<SmokeCloud>, shooter: Vec2, target: Vec2) -> bool {
    smoke
        .values()
        .any(|cloud| cloud.contains(shooter) || cloud.contains(target))
}

/// Input the built-in autopilot would give `me` this frame.
///
/// Walks back to `lead` when it strays too far, aims at the nearest enemy,
/// fires inside [`AUTOPILOT_FIRE_RANGE`] and reloads an empty magazine,
/// switching weapon once the magazine can no longer be refilled.
#[must_use]
pub fn autopilot_input(
    me: &Player,
    lead: Option<&Player>,
    robots: &EntityArena<Robot>,
    boss: Option<&Boss>,
) -> PlayerInput {
    let mut input = PlayerInput::IDLE;
    let here = me.body.position;

    if let Some(lead) = lead.filter(|p| p.is_alive() && p.slot != me.slot) {
        let offset = lead.body.position - here;
        if offset.length() > AUTOPILOT_FOLLOW_DISTANCE {
            input.left = offset.x < -AXIS_DEAD_ZONE;
            input.right = offset.x > AXIS_DEAD_ZONE;
            input.up = offset.y < -AXIS_DEAD_ZONE;
            input.down = offset.y > AXIS_DEAD_ZONE;
        }
    }

    if let Some(target) = nearest_enemy(robots, boss, here) {
        input.aim = Some(angle_to(here, target));
        input.fire = here.distance(target) <= AUTOPILOT_FIRE_RANGE;
    }

    let weapon = me.loadout.current();
    if !weapon.kind.is_melee() && weapon.ammo == 0 {
        if weapon.reloads > 0 && !weapon.kind.never_reloads() {
            input.reload = true;
        } else {
            input.switch_weapon = true;
        }
        input.fire = false;
    }
    input
}

fn sniper_equipped(players: &[Player]) -> bool {
    players
        .iter()
        .any(|p| p.is_alive() && p.loadout.current_kind() == WeaponKind::Sniper)
}

// ============================================================================
// Systems
// ============================================================================

impl Simulation {
    /// Movement, aim and weapon actions for one player.
    pub(crate) fn run_player_system(
        &mut self,
        slot: PlayerSlot,
        input: &PlayerInput,
        events: &mut TickEvents,
    ) {
        let Some(player) = self.players.get_mut(slot.index()) else {
            return;
        };
        if !player.is_alive() {
            return;
        }
        if player.tick_timers() {
            events.reloads_finished += 1;
        }

        let control = player.control;
        let input = match control {
            // Remote peers only move through snapshots
            ControlSource::Remote => return,
            ControlSource::AiProxy => {
                let Some(me) = self.players.get(slot.index()) else {
                    return;
                };
                autopilot_input(
                    me,
                    self.players.first(),
                    self.director.robots(),
                    self.director.boss(),
                )
            }
            ControlSource::LocalPrimary | ControlSource::LocalSecondary => *input,
        };
        let auto_aim = input.aim.is_none()
            && (control == ControlSource::AiProxy
                || (control == ControlSource::LocalSecondary && self.config.mode == GameMode::Coop));

        let Some(player) = self.players.get_mut(slot.index()) else {
            return;
        };
        player.apply_movement(&input, self.bounds, &self.obstacles);
        if let Some(angle) = input.aim {
            player.body.angle = angle;
        } else if auto_aim {
            let here = player.body.position;
            if let Some(target) = nearest_enemy(self.director.robots(), self.director.boss(), here) {
                player.aim_at(target);
            }
        }

        if input.switch_weapon {
            player.loadout.switch_weapon();
        }
        if input.reload {
            player.loadout.start_reload();
        }
        if input.use_medkit && player.use_medkit() {
            self.effects.on_heal(slot, player.body.position);
            events.progress_changed = true;
        }

        let kind = player.loadout.current_kind();
        let trigger = input.fire || (input.melee && kind.is_melee());
        if !trigger {
            return;
        }
        let shooter = player.body.position;
        let angle = player.body.angle;
        match player.fire() {
            FireOutcome::None => {}
            FireOutcome::Melee {
                origin,
                angle,
                damage,
            } => self.resolve_melee(slot, origin, angle, damage, events),
            outcome => {
                events.shots_fired += self.spawn_fire(slot, kind, shooter, angle, outcome);
            }
        }
    }

    /// Put the result of a ranged or thrown trigger pull into the world.
    ///
    /// Returns the number of rounds spawned. Melee outcomes are ignored.
    pub(crate) fn spawn_fire(
        &mut self,
        slot: PlayerSlot,
        kind: WeaponKind,
        shooter: Vec2,
        angle: f32,
        outcome: FireOutcome,
    ) -> u32 {
        match outcome {
            FireOutcome::Projectiles(rounds) => {
                self.effects
                    .on_fire(kind, shooter, angle, PLAYER_RADIUS, &mut self.rng);
                let count = rounds.len() as u32;
                for round in rounds {
                    self.projectiles.insert(round);
                }
                count
            }
            FireOutcome::Throw {
                kind,
                position,
                angle,
            } => {
                self.grenades
                    .insert(Grenade::new(kind, position, angle, Some(slot)));
                0
            }
            FireOutcome::None | FireOutcome::Melee { .. } => 0,
        }
    }

    fn resolve_melee(
        &mut self,
        slot: PlayerSlot,
        origin: Vec2,
        angle: f32,
        damage: i32,
        events: &mut TickEvents,
    ) {
        if self.config.mode.is_pvp() {
            let opponent = slot.opponent();
            let reachable = self
                .player(opponent)
                .is_some_and(|p| p.is_alive() && in_melee_cone(origin, angle, p.body.position));
            if reachable {
                self.apply_damage(
                    Target::Player(opponent),
                    damage,
                    DamageSource::Melee,
                    Some(slot),
                    false,
                    events,
                );
            }
            return;
        }

        let hits: Vec<Handle> = self
            .director
            .robots()
            .iter()
            .filter(|(_, r)| r.is_alive() && in_melee_cone(origin, angle, r.body.position))
            .map(|(handle, _)| handle)
            .collect();
        for handle in hits {
            self.apply_damage(
                Target::Robot(handle),
                damage,
                DamageSource::Melee,
                Some(slot),
                false,
                events,
            );
        }
    }

    /// Follow the players with the camera(s).
    pub(crate) fn run_camera_system(&mut self) {
        let bounds = self.bounds;
        if self.cameras.len() > 1 {
            for (camera, player) in self.cameras.iter_mut().zip(&self.players) {
                camera.update(player.body.position, bounds);
            }
            return;
        }

        let shared = matches!(self.config.mode, GameMode::Coop | GameMode::OnlineCoop);
        let focus = if shared {
            let living = living_players(&self.players);
            if living.is_empty() {
                None
            } else {
                let sum: Vec2 = living.iter().map(|(_, pos)| *pos).sum();
                Some(sum / living.len() as f32)
            }
        } else {
            None
        };
        let Some(focus) = focus.or_else(|| self.players.first().map(|p| p.body.position)) else {
            return;
        };
        if let Some(camera) = self.cameras.first_mut() {
            camera.update(focus, bounds);
        }
    }

    /// Move projectiles and resolve what they hit.
    pub(crate) fn run_projectile_system(&mut self, events: &mut TickEvents) {
        let pvp = self.config.mode.is_pvp();

        for handle in self.projectiles.handles() {
            let Some(projectile) = self.projectiles.get_mut(handle) else {
                continue;
            };
            projectile.advance();
            let blocked = projectile.is_spent(self.bounds)
                || self
                    .obstacles
                    .iter()
                    .any(|o| o.collides_point(projectile.position));
            if blocked {
                self.projectiles.remove(handle);
                continue;
            }

            let projectile = projectile.clone();
            let consumed = match projectile.owner {
                ProjectileOwner::Player(slot) if pvp => {
                    self.strike_opponent(&projectile, slot, events)
                }
                ProjectileOwner::Player(slot) => self.strike_enemies(&projectile, slot, events),
                ProjectileOwner::Robot | ProjectileOwner::Boss => {
                    self.strike_players(&projectile, events)
                }
            };
            if consumed {
                self.projectiles.remove(handle);
            }
        }

        self.projectiles.compact();
        self.director.compact();
    }

    fn strike_opponent(
        &mut self,
        projectile: &Projectile,
        shooter: PlayerSlot,
        events: &mut TickEvents,
    ) -> bool {
        let opponent = shooter.opponent();
        let hit = self.player(opponent).is_some_and(|p| {
            p.is_alive() && projectile_hits_circle(projectile, p.body.position, p.body.radius)
        });
        if hit {
            self.apply_damage(
                Target::Player(opponent),
                projectile.player_hit_damage(),
                DamageSource::Projectile,
                Some(shooter),
                false,
                events,
            );
        }
        hit
    }

    fn strike_enemies(
        &mut self,
        projectile: &Projectile,
        shooter: PlayerSlot,
        events: &mut TickEvents,
    ) -> bool {
        let flags = projectile.tag.flags();
        let robot_hit = self
            .director
            .robots()
            .iter()
            .filter(|(_, r)| r.is_alive())
            .find_map(|(handle, r)| projectile_hits_robot(projectile, r).map(|hit| (handle, hit)));

        if let Some((handle, hit)) = robot_hit {
            let headshot = hit.is_headshot();
            let damage = projectile.hit_damage(headshot);
            if flags.contains(WeaponFlags::ELECTRIC) {
                let splash = chain_damage(damage);
                for other in chain_targets(self.director.robots(), handle) {
                    self.apply_damage(
                        Target::Robot(other),
                        splash,
                        DamageSource::Chain,
                        Some(shooter),
                        false,
                        events,
                    );
                }
            }
            let source = if headshot {
                DamageSource::Headshot
            } else {
                DamageSource::Projectile
            };
            let killed = self.apply_damage(
                Target::Robot(handle),
                damage,
                source,
                Some(shooter),
                headshot,
                events,
            );
            if !killed && flags.contains(WeaponFlags::FREEZE) {
                if let Some(robot) = self.director.robots_mut().get_mut(handle) {
                    robot.freeze();
                    events.combat.push(CombatEvent::Frozen {
                        target: Target::Robot(handle),
                    });
                }
            }
            return true;
        }

        let boss_hit = self
            .director
            .boss()
            .filter(|b| b.is_alive())
            .and_then(|b| projectile_hits_boss(projectile, b));
        let Some(hit) = boss_hit else {
            return false;
        };
        let headshot = hit.is_headshot();
        let source = if headshot {
            DamageSource::Headshot
        } else {
            DamageSource::Projectile
        };
        self.apply_damage(
            Target::Boss,
            projectile.hit_damage(headshot),
            source,
            Some(shooter),
            headshot,
            events,
        );
        true
    }

    fn strike_players(&mut self, projectile: &Projectile, events: &mut TickEvents) -> bool {
        let victim = self
            .players
            .iter()
            .find(|p| {
                p.is_alive() && projectile_hits_circle(projectile, p.body.position, p.body.radius)
            })
            .map(|p| p.slot);
        let Some(slot) = victim else {
            return false;
        };
        self.apply_damage(
            Target::Player(slot),
            projectile.hit_damage(false),
            DamageSource::Projectile,
            None,
            false,
            events,
        );
        true
    }

    /// Roll grenades, detonate expired fuses, animate blasts and smoke.
    pub(crate) fn run_grenade_system(&mut self, events: &mut TickEvents) {
        for handle in self.explosions.handles() {
            if let Some(explosion) = self.explosions.get_mut(handle) {
                explosion.update();
                if explosion.is_done() {
                    self.explosions.remove(handle);
                }
            }
        }
        for handle in self.smoke.handles() {
            if let Some(cloud) = self.smoke.get_mut(handle) {
                cloud.update();
                if cloud.is_done() {
                    self.smoke.remove(handle);
                }
            }
        }

        let mut blasts = Vec::new();
        for handle in self.grenades.handles() {
            let Some(grenade) = self.grenades.get_mut(handle) else {
                continue;
            };
            grenade.update(self.bounds, &self.obstacles);
            let Some(detonation) = grenade.detonate() else {
                continue;
            };
            self.grenades.remove(handle);
            events.detonations += 1;
            match detonation {
                Detonation::Explosion(explosion) => blasts.push(explosion),
                Detonation::Smoke(cloud) => {
                    tracing::debug!(x = cloud.center.x, y = cloud.center.y, "Smoke deployed");
                    self.smoke.insert(cloud);
                }
            }
        }

        for blast in blasts {
            self.apply_explosion(&blast, events);
            self.explosions.insert(blast);
        }

        self.grenades.compact();
        self.explosions.compact();
        self.smoke.compact();
        self.director.compact();
    }

    fn apply_explosion(&mut self, blast: &Explosion, events: &mut TickEvents) {
        let robots: Vec<(Handle, i32)> = self
            .director
            .robots()
            .iter()
            .filter(|(_, r)| r.is_alive())
            .filter_map(|(handle, r)| {
                blast
                    .damage_at(blast.center.distance(r.body.position))
                    .map(|damage| (handle, damage))
            })
            .collect();
        for (handle, damage) in robots {
            self.apply_damage(
                Target::Robot(handle),
                damage,
                DamageSource::Explosion,
                blast.thrower,
                false,
                events,
            );
        }

        let boss_damage = self
            .director
            .boss()
            .filter(|b| b.is_alive())
            .and_then(|b| blast.damage_at(blast.center.distance(b.body.position)));
        if let Some(damage) = boss_damage {
            self.apply_damage(
                Target::Boss,
                damage,
                DamageSource::Explosion,
                blast.thrower,
                false,
                events,
            );
        }

        let players: Vec<(PlayerSlot, i32)> = living_players(&self.players)
            .into_iter()
            .filter_map(|(slot, pos)| {
                let distance = blast.center.distance(pos);
                (distance <= blast.max_radius).then(|| {
                    (
                        slot,
                        player_blast_damage(blast.damage, distance, blast.max_radius),
                    )
                })
            })
            .collect();
        for (slot, damage) in players {
            let credited = blast.thrower.filter(|thrower| *thrower != slot);
            self.apply_damage(
                Target::Player(slot),
                damage,
                DamageSource::Explosion,
                credited,
                false,
                events,
            );
        }
    }

    /// Robot AI, knife attacks and ranged fire.
    pub(crate) fn run_robot_system(&mut self, events: &mut TickEvents) {
        let marked = sniper_equipped(&self.players);
        let fallback = self
            .players
            .first()
            .map_or(self.bounds.center(), |p| p.body.position);

        for handle in self.director.robots().handles() {
            let living = living_players(&self.players);
            let Some(robot) = self.director.robots_mut().get_mut(handle) else {
                continue;
            };
            if !robot.is_alive() {
                continue;
            }
            robot.headshot_marked = marked;
            let target = nearest_player(&living, robot.body.position).unwrap_or(fallback);
            robot.update(target, self.bounds, &self.obstacles, &mut self.rng);

            let stabbed = living
                .iter()
                .find(|(_, pos)| robot.can_knife(*pos))
                .map(|(slot, _)| *slot);
            if let Some(slot) = stabbed {
                let damage = robot.knife_attack();
                self.apply_damage(
                    Target::Player(slot),
                    damage,
                    DamageSource::Melee,
                    None,
                    false,
                    events,
                );
                continue;
            }

            if !robot.can_shoot() || smoke_blocks(&self.smoke, robot.body.position, target) {
                continue;
            }
            let rounds = robot.shoot(&mut self.rng);
            events.shots_fired += rounds.len() as u32;
            for round in rounds {
                self.projectiles.insert(round);
            }
        }

        self.director.compact();
    }

    /// Boss AI, spread fire and contact damage.
    pub(crate) fn run_boss_system(&mut self, events: &mut TickEvents) {
        let marked = sniper_equipped(&self.players);
        let living = living_players(&self.players);
        let fallback = self
            .players
            .first()
            .map_or(self.bounds.center(), |p| p.body.position);

        let Some(boss) = self.director.boss_mut() else {
            return;
        };
        if !boss.is_alive() {
            return;
        }
        boss.headshot_marked = marked;
        let target = nearest_player(&living, boss.body.position).unwrap_or(fallback);
        boss.update(target, self.bounds);

        if boss.can_shoot() {
            let rounds = boss.shoot();
            events.shots_fired += rounds.len() as u32;
            for round in rounds {
                self.projectiles.insert(round);
            }
        }

        let touching: Vec<PlayerSlot> = living
            .iter()
            .filter(|(_, pos)| boss.touches(*pos, PLAYER_RADIUS))
            .map(|(slot, _)| *slot)
            .collect();
        for slot in touching {
            self.apply_damage(
                Target::Player(slot),
                CONTACT_DAMAGE,
                DamageSource::Contact,
                None,
                false,
                events,
            );
        }

        self.director.compact();
    }

    /// Decide whether the match is over and drive wave progression.
    pub(crate) fn run_outcome_system(&mut self, events: &mut TickEvents) {
        if self.config.mode.is_pvp() {
            let fallen = self.players.iter().find(|p| !p.is_alive()).map(|p| p.slot);
            if let Some(slot) = fallen {
                self.finish(MatchOutcome::PvpWinner(slot.opponent()), events);
            }
            return;
        }

        let living = living_players(&self.players);
        let Some(&(_, anchor)) = living.first() else {
            self.finish(MatchOutcome::Defeat, events);
            return;
        };

        let progress = self
            .director
            .update(anchor, self.bounds, &self.obstacles, &mut self.rng);
        match progress {
            WaveProgress::InProgress | WaveProgress::Settling => {}
            WaveProgress::Advanced { .. } => events.wave = Some(progress),
            WaveProgress::Cleared => {
                events.wave = Some(progress);
                self.finish(MatchOutcome::Victory, events);
            }
        }
    }

    /// Open the shop when the primary player crosses a coin threshold.
    pub(crate) fn run_shop_prompt_system(&mut self, events: &mut TickEvents) {
        if self.config.mode.is_pvp() {
            return;
        }
        let Some(player) = self.players.first() else {
            return;
        };
        if let Some(prompt) = self.prompts.check(player) {
            tracing::info!(?prompt, coins = player.coins, "Shop opened");
            events.shop_prompt = Some(prompt);
            self.phase = MatchPhase::Shop;
        }
    }

    // ========================================================================
    // Damage
    // ========================================================================

    /// Deal damage and settle a kill. Returns whether the target died.
    ///
    /// Dead or missing targets are ignored. Killed robots are marked for
    /// removal; the boss is dropped by the director's compaction.
    pub(crate) fn apply_damage(
        &mut self,
        target: Target,
        amount: i32,
        source: DamageSource,
        credited: Option<PlayerSlot>,
        headshot: bool,
        events: &mut TickEvents,
    ) -> bool {
        let killed = match target {
            Target::Robot(handle) => {
                let Some(robot) = self.director.robots_mut().get_mut(handle) else {
                    return false;
                };
                if !robot.is_alive() {
                    return false;
                }
                let killed = robot.body.take_damage(amount);
                if killed {
                    self.director.robots_mut().remove(handle);
                }
                killed
            }
            Target::Boss => {
                let Some(boss) = self.director.boss_mut() else {
                    return false;
                };
                if !boss.is_alive() {
                    return false;
                }
                boss.body.take_damage(amount)
            }
            Target::Player(slot) => {
                let Some(player) = self.player_mut(slot) else {
                    return false;
                };
                if !player.is_alive() {
                    return false;
                }
                player.body.take_damage(amount)
            }
        };

        events.combat.push(CombatEvent::Damage {
            target,
            amount,
            source,
        });
        if !killed {
            return false;
        }

        events.combat.push(CombatEvent::Killed { target, credited });
        let settings = self.director.settings();
        match target {
            Target::Robot(_) => {
                self.reward(credited, kill_score(settings.points, headshot), settings.coins, events);
            }
            Target::Boss => {
                tracing::info!(tick = self.tick, ?credited, "Boss defeated");
                self.reward(credited, kill_score(BOSS_SCORE, headshot), BOSS_COINS, events);
            }
            Target::Player(slot) => {
                tracing::info!(tick = self.tick, ?slot, ?credited, "Player down");
                if self.config.mode.is_pvp() {
                    self.reward(credited, 0, 0, events);
                }
            }
        }
        true
    }

    fn reward(
        &mut self,
        credited: Option<PlayerSlot>,
        score: u32,
        coins: u32,
        events: &mut TickEvents,
    ) {
        let pvp = self.config.mode.is_pvp();
        let Some(player) = credited.and_then(|slot| self.player_mut(slot)) else {
            return;
        };
        player.kills += 1;
        player.score += score;
        if pvp {
            return;
        }
        // Partners without a wallet of their own pay into the primary player's.
        let paid = player.add_coins(coins)
            || self
                .player_mut(PlayerSlot::One)
                .is_some_and(|primary| primary.add_coins(coins));
        if paid {
            events.progress_changed = true;
        }
    }

    /// Fire the equipped weapon of a network-driven player.
    ///
    /// Only ranged and thrown weapons produce anything; remote melee is
    /// resolved on the peer that owns the player.
    pub(crate) fn fire_remote(&mut self, slot: PlayerSlot) -> u32 {
        let Some(player) = self.player_mut(slot) else {
            return 0;
        };
        let kind = player.loadout.current_kind();
        if kind.is_melee() || !player.is_alive() {
            return 0;
        }
        let shooter = player.body.position;
        let angle = player.body.angle;
        let outcome = player.fire();
        self.spawn_fire(slot, kind, shooter, angle, outcome)
    }
}
