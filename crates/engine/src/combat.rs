use chrono::Utc;
use dashmap::DashMap;
use moor_mud_common::{CombatId, LocKey, MonsterId, PlayerId, SessionId, Stats};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::Engine;

/// Actions a combatant may take on their turn.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CombatAction {
    Attack,
    Defend,
    Flee,
}

impl CombatAction {
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "attack" | "att" | "a" | "1" => Some(Self::Attack),
            "defend" | "def" | "2" => Some(Self::Defend),
            "flee" | "3" => Some(Self::Flee),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CombatantSide {
    Player,
    Monster,
}

/// Mutable turn state, guarded by a plain mutex: the turn-loop task is the
/// only writer, the `combat`/`cs` status command is the only other reader.
pub struct CombatInner {
    pub order: [CombatantSide; 2],
    pub turn_index: usize,
    pub round: u32,
    pub player_hp: i32,
    pub player_max_hp: i32,
    pub monster_hp: i32,
    pub monster_max_hp: i32,
    pub player_defending: bool,
    pub monster_defending: bool,
}

pub struct Combat {
    pub id: CombatId,
    pub player_id: PlayerId,
    pub session_id: SessionId,
    pub monster_id: MonsterId,
    pub monster_name: String,
    pub coords: moor_mud_common::Coords,
    pub active: AtomicBool,
    pub inner: Mutex<CombatInner>,
}

pub enum CombatOutcome {
    MonsterDied,
    PlayerDied,
    Fled,
}

/// Rolls 1d20 + a modifier.
fn roll_d20(modifier: i32) -> i32 {
    rand::rng().random_range(1..=20) + modifier
}

/// Registry of every active combat.
#[derive(Default)]
pub struct CombatRegistry {
    combats: DashMap<CombatId, Arc<Combat>>,
}

impl CombatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, combat: Arc<Combat>) {
        self.combats.insert(combat.id, combat);
    }

    pub fn get(&self, id: CombatId) -> Option<Arc<Combat>> {
        self.combats.get(&id).map(|c| c.clone())
    }

    pub fn remove(&self, id: CombatId) {
        self.combats.remove(&id);
    }

    /// Is this monster already fighting someone? Used by the aggro check
    /// so an aggressive monster never double-engages.
    pub fn monster_in_combat(&self, monster_id: MonsterId) -> bool {
        self.combats.iter().any(|c| c.monster_id == monster_id)
    }

    pub fn monster_ids_in_combat(&self) -> Vec<MonsterId> {
        self.combats.iter().map(|c| c.monster_id).collect()
    }
}

/// Initiates combat between `player_id`/`session_id` and `monster_id`,
/// computing initiative (d20 + dex modifier each side, ties break by dex)
/// and registering the combat. Spawns the
/// per-combat turn-loop task.
pub async fn start_combat(
    engine: &Arc<Engine>,
    player_id: PlayerId,
    session_id: SessionId,
    player_stats: Stats,
    player_hp: i32,
    monster_id: MonsterId,
) {
    let Some(monster) = engine.world.get_monster(monster_id) else {
        return;
    };
    let player_roll = roll_d20(player_stats.initiative_bonus());
    let monster_roll = roll_d20(monster.stats.initiative_bonus());
    let player_first = if player_roll != monster_roll {
        player_roll > monster_roll
    } else {
        player_stats.dexterity >= monster.stats.dexterity
    };
    let order = if player_first {
        [CombatantSide::Player, CombatantSide::Monster]
    } else {
        [CombatantSide::Monster, CombatantSide::Player]
    };

    let combat = Arc::new(Combat {
            id: CombatId::new(),
            player_id,
            session_id,
            monster_id,
            monster_name: monster.name.get(&moor_mud_common::Locale::default_locale()).to_string(),
            coords: monster.current_coords,
            active: AtomicBool::new(true),
            inner: Mutex::new(CombatInner {
                    order,
                    turn_index: 0,
                    round: 1,
                    player_hp,
                    player_max_hp: player_stats.max_hp(),
                    monster_hp: monster.current_hp,
                    monster_max_hp: monster.stats.max_hp(),
                    player_defending: false,
                    monster_defending: false,
            }),
    });

    if let Some(session) = engine.sessions.get(session_id) {
        session.enter_combat(combat.id);
    }
    engine.combats.insert(combat.clone());

    engine.broadcast.broadcast_to_room(
        combat.coords,
        LocKey::new("combat.start").param("monster", &combat.monster_name),
        None,
    );

    let engine = engine.clone();
    tokio::spawn(async move {
            run_combat(engine, combat).await;
    });
}

async fn run_combat(engine: Arc<Engine>, combat: Arc<Combat>) {
    loop {
        if !combat.active.load(Ordering::SeqCst) {
            return;
        }
        let side = {
            let inner = combat.inner.lock().unwrap();
            inner.order[inner.turn_index % 2]
        };

        let action = match side {
            CombatantSide::Monster => decide_monster_action(&combat),
            CombatantSide::Player => await_player_action(&engine, &combat).await,
        };

        let Some(outcome) = resolve_turn(&engine, &combat, side, action).await else {
            // Combat continues; advance to the next turn.
            let mut inner = combat.inner.lock().unwrap();
            inner.turn_index += 1;
            if inner.turn_index % 2 == 0 {
                inner.round += 1;
            }
            continue;
        };

        end_combat(&engine, &combat, outcome).await;
        return;
    }
}

/// Monsters attack unless their HP ratio has dropped below 25%, in which
/// case they attempt to flee.
fn decide_monster_action(combat: &Combat) -> CombatAction {
    let inner = combat.inner.lock().unwrap();
    if inner.monster_max_hp > 0 && inner.monster_hp * 4 < inner.monster_max_hp {
        CombatAction::Flee
    } else {
        CombatAction::Attack
    }
}

/// Waits up to the configured combat-turn timeout for the player's next
/// action command; defaults to `Attack` on timeout.
async fn await_player_action(engine: &Arc<Engine>, combat: &Combat) -> CombatAction {
    let Some(session) = engine.sessions.get(combat.session_id) else {
        return CombatAction::Flee;
    };
    let (tx, rx) = tokio::sync::oneshot::channel();
    *session.pending_combat_action.lock().unwrap() = Some(tx);
    let timeout = std::time::Duration::from_secs(engine.config.combat_turn_timeout_secs);
    let action = match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(action)) => action,
        _ => CombatAction::Attack,
    };
    session.pending_combat_action.lock().unwrap().take();
    action
}

/// Applies one combatant's chosen action. Returns `Some(outcome)` once the
/// fight is over (an HP dropped to zero or a flee succeeded).
async fn resolve_turn(
    engine: &Arc<Engine>,
    combat: &Combat,
    side: CombatantSide,
    action: CombatAction,
) -> Option<CombatOutcome> {
    // Expire this side's own defending flag: it only protects through the
    // opponent's following turn.
    {
        let mut inner = combat.inner.lock().unwrap();
        match side {
            CombatantSide::Player => inner.player_defending = false,
            CombatantSide::Monster => inner.monster_defending = false,
        }
    }

    let Some(monster) = engine.world.get_monster(combat.monster_id) else {
        return Some(CombatOutcome::MonsterDied);
    };
    let player_stats = engine
        .player_stats(combat.player_id)
        .await
        .unwrap_or_default();

    match action {
        CombatAction::Defend => {
            let mut inner = combat.inner.lock().unwrap();
            let actor = match side {
                CombatantSide::Player => {
                    inner.player_defending = true;
                    "You"
                }
                CombatantSide::Monster => {
                    inner.monster_defending = true;
                    combat.monster_name.as_str()
                }
            };
            engine.broadcast.broadcast_to_room(
                combat.coords,
                LocKey::new("combat.defend").param("actor", actor),
                None,
            );
            None
        }
        CombatAction::Flee => {
            let (fleeing_dex, opponent_dex) = match side {
                CombatantSide::Player => (player_stats.dexterity, monster.stats.dexterity),
                CombatantSide::Monster => (monster.stats.dexterity, player_stats.dexterity),
            };
            let chance = (engine.config.flee_base_chance
                + 0.02 * (fleeing_dex - opponent_dex) as f64)
                .clamp(0.05, 0.95);
            let succeeded = rand::rng().random_bool(chance);
            let actor = match side {
                CombatantSide::Player => "You",
                CombatantSide::Monster => combat.monster_name.as_str(),
            };
            if succeeded {
                engine.broadcast.broadcast_to_room(
                    combat.coords,
                    LocKey::new("combat.flee_success").param("actor", actor),
                    None,
                );
                Some(CombatOutcome::Fled)
            } else {
                engine.broadcast.broadcast_to_room(
                    combat.coords,
                    LocKey::new("combat.flee_failed").param("actor", actor),
                    None,
                );
                None
            }
        }
        CombatAction::Attack => {
            let (attacker_name, defender_name, attack_bonus, target_ac, was_defending) = match side
            {
                CombatantSide::Player => (
                    "You".to_string(),
                    combat.monster_name.clone(),
                    player_stats.attack_bonus() + engine.equipped_weapon_bonus(combat.player_id).await,
                    monster.stats.armor_class(),
                    combat.inner.lock().unwrap().monster_defending,
                ),
                CombatantSide::Monster => (
                    combat.monster_name.clone(),
                    "you".to_string(),
                    monster.stats.attack_bonus(),
                    player_stats.armor_class(),
                    combat.inner.lock().unwrap().player_defending,
                ),
            };
            let roll = roll_d20(attack_bonus);
            if roll < target_ac {
                engine.broadcast.broadcast_to_room(
                    combat.coords,
                    LocKey::new("combat.attack_miss")
                        .param("actor", &attacker_name)
                        .param("target", &defender_name),
                    None,
                );
                return None;
            }

            let attacker_stats = match side {
                CombatantSide::Player => player_stats,
                CombatantSide::Monster => monster.stats,
            };
            let mut raw = attacker_stats.attack_power();
            if side == CombatantSide::Player {
                raw += engine.equipped_weapon_bonus(combat.player_id).await;
            }
            if was_defending {
                raw = (raw as f64 * 0.5).round() as i32;
            }

            let defender_stats = match side {
                CombatantSide::Player => monster.stats,
                CombatantSide::Monster => player_stats,
            };

            let (new_hp, dealt) = {
                let mut inner = combat.inner.lock().unwrap();
                let current = match side {
                    CombatantSide::Player => inner.monster_hp,
                    CombatantSide::Monster => inner.player_hp,
                };
                let (new_hp, dealt) = defender_stats.apply_damage(current, raw);
                match side {
                    CombatantSide::Player => inner.monster_hp = new_hp,
                    CombatantSide::Monster => inner.player_hp = new_hp,
                }
                (new_hp, dealt)
            };

            engine.broadcast.broadcast_to_room(
                combat.coords,
                LocKey::new("combat.attack_hit")
                    .param("damage", dealt)
                    .param("target", &defender_name),
                None,
            );

            if new_hp <= 0 {
                return Some(match side {
                        CombatantSide::Player => CombatOutcome::MonsterDied,
                        CombatantSide::Monster => CombatOutcome::PlayerDied,
                });
            }
            None
        }
    }
}

async fn end_combat(engine: &Arc<Engine>, combat: &Combat, outcome: CombatOutcome) {
    combat.active.store(false, Ordering::SeqCst);
    engine.combats.remove(combat.id);
    if let Some(session) = engine.sessions.get(combat.session_id) {
        session.leave_combat();
    }

    match outcome {
        CombatOutcome::MonsterDied => {
            let _ = engine.world.kill_monster(combat.monster_id);
            if let Some(monster) = engine.world.get_monster(combat.monster_id) {
                engine.award_kill_rewards(combat.player_id, &monster).await;
            }
            if let Some(session) = engine.sessions.get(combat.session_id) {
                session.send_line(engine.catalog.render(
                        &session.locale(),
                        &LocKey::new("combat.victory").param("monster", &combat.monster_name),
                ));
            }
        }
        CombatOutcome::PlayerDied => {
            let hp = { combat.inner.lock().unwrap().player_max_hp / 2 }.max(1);
            engine.respawn_player_after_death(combat.player_id, hp).await;
            if let Some(session) = engine.sessions.get(combat.session_id) {
                session.send_line(
                    engine
                        .catalog
                        .render(&session.locale(), &LocKey::new("combat.defeat")),
                );
            }
        }
        CombatOutcome::Fled => {}
    }

    if let Some(session) = engine.sessions.get(combat.session_id) {
        crate::room_view::send_room_view(engine, &session).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_shortcuts() {
        assert_eq!(CombatAction::parse("1"), Some(CombatAction::Attack));
        assert_eq!(CombatAction::parse("2"), Some(CombatAction::Defend));
        assert_eq!(CombatAction::parse("3"), Some(CombatAction::Flee));
        assert_eq!(CombatAction::parse("dance"), None);
    }
}
