//! Bosses and other hand-scripted actors.
//!
//! A [`PhysicsActor`] does not compose modules. It is a resumable state
//! machine: `state` indexes the boss's handler table, `wait` is the
//! condition the current state is suspended on and `locals` holds whatever
//! the handlers need to remember between ticks. The shared scheduler lives in
//! [`crate::systems::boss`].

use bevy_ecs::prelude::{Component, Entity};
use serde::{Deserialize, Serialize};

use crate::components::animation::{AnimAction, AnimDef, AnimTable, LogicAnimation};
use crate::components::dispatch::Faction;
use crate::components::movement::{Kinematics, MovementModule};
use crate::components::remains::{EffectKind, ItemKind};
use crate::events::projectile::ProjectileKind;
use crate::fixed::{Angle, Fixed, FixedVec3, Tick};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossKind {
    BobaFett,
    KellDragon,
    PhaseOne,
    PhaseTwo,
    PhaseThree,
    Turret,
    Welder,
    MouseBot,
}

/// What the current state is waiting for before its handler runs again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Wait {
    /// Run on the next tick.
    #[default]
    Ready,
    /// Run once the clock reaches this tick.
    Until(Tick),
    /// Run when the current play-once animation completes.
    Animation,
    /// Run when resting on the floor.
    Landed,
}

/// Tuning copied from the species table at setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BossProfile {
    pub speed: Fixed,
    pub speed_rot: i32,
    pub speed_vert: Fixed,
    pub projectile: ProjectileKind,
    #[serde(default)]
    pub secondary: Option<ProjectileKind>,
    pub melee_damage: Fixed,
    pub melee_range: Fixed,
    pub attack_range: Fixed,
    pub fire_offset: FixedVec3,
    /// Percent chance to bounce a projectile back.
    #[serde(default)]
    pub reflect_chance: u32,
    #[serde(default)]
    pub alert_sound: Option<String>,
    #[serde(default)]
    pub attack_sound: Option<String>,
    #[serde(default)]
    pub hurt_sound: Option<String>,
    #[serde(default)]
    pub die_sound: Option<String>,
    pub corpse: bool,
    #[serde(default)]
    pub drop: Option<ItemKind>,
    #[serde(default)]
    pub death_effect: Option<EffectKind>,
}

impl Default for BossProfile {
    fn default() -> Self {
        Self {
            speed: Fixed::from_int(20),
            speed_rot: 8192,
            speed_vert: Fixed::from_int(12),
            projectile: ProjectileKind::RifleBolt,
            secondary: None,
            melee_damage: Fixed::from_int(10),
            melee_range: Fixed::from_int(8),
            attack_range: Fixed::from_int(120),
            fire_offset: FixedVec3::new(Fixed::ZERO, Fixed::from_int(5), Fixed::ONE),
            reflect_chance: 0,
            alert_sound: None,
            attack_sound: None,
            hurt_sound: None,
            die_sound: None,
            corpse: true,
            drop: None,
            death_effect: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BobaLocals {
    /// Strafe direction, -1 or 1.
    pub strafe: i32,
    pub shots_left: u32,
    pub hover_height: Fixed,
    pub next_dodge: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KellLocals {
    pub leap_ready: Tick,
    pub strikes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseOneLocals {
    pub swings: u32,
    pub pain_ready: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseTwoLocals {
    pub rockets_left: u32,
    pub flight_until: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseThreeLocals {
    pub rockets_left: u32,
    pub flight_until: Tick,
    /// End of the reflect window; hits before it bounce off.
    pub reflect_until: Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurretLocals {
    pub burst_left: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WelderLocals {
    /// Heading of the wall the arm is mounted on.
    pub base_yaw: Angle,
    pub sweep_dir: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseBotLocals {
    pub turn_at: Tick,
    pub beep_at: Tick,
    pub flee_until: Tick,
}

/// Handler locals kept across ticks, one variant per boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossLocals {
    #[default]
    None,
    BobaFett(BobaLocals),
    KellDragon(KellLocals),
    PhaseOne(PhaseOneLocals),
    PhaseTwo(PhaseTwoLocals),
    PhaseThree(PhaseThreeLocals),
    Turret(TurretLocals),
    Welder(WelderLocals),
    MouseBot(MouseBotLocals),
}

#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsActor {
    pub kind: BossKind,
    pub movement: MovementModule,
    pub anim: LogicAnimation,
    pub anim_table: AnimTable,
    pub kin: Kinematics,
    pub last_player_pos: FixedVec3,
    pub hp: Fixed,
    pub alive: bool,
    pub flying: bool,
    pub faction: Faction,
    /// Index into the boss handler table.
    pub state: u32,
    pub wait: Wait,
    /// Tick the current state was entered.
    pub state_tick: Tick,
    pub profile: BossProfile,
    #[serde(default)]
    pub locals: BossLocals,
    #[serde(skip)]
    pub last_attacker: Option<Entity>,
}

impl PhysicsActor {
    pub fn new(kind: BossKind, hp: Fixed, profile: BossProfile, anim_table: AnimTable) -> Self {
        Self {
            kind,
            movement: MovementModule::default(),
            anim: LogicAnimation::default(),
            anim_table,
            kin: Kinematics::default(),
            last_player_pos: FixedVec3::ZERO,
            hp,
            alive: true,
            flying: false,
            faction: Faction::Imperial,
            state: 0,
            wait: Wait::Ready,
            state_tick: 0,
            profile,
            locals: BossLocals::None,
            last_attacker: None,
        }
    }

    /// Start the animation for `action` and return it.
    pub fn play(&mut self, action: AnimAction) -> AnimDef {
        let def = self.anim_table.get(action);
        self.anim = LogicAnimation::start(&def);
        def
    }

    /// Keep a looping animation running without restarting it.
    pub fn loop_anim(&mut self, action: AnimAction) {
        let def = self.anim_table.get(action);
        if self.anim.anim_id != def.anim_id || self.anim.is_ready() {
            self.anim = LogicAnimation::start(&def);
        }
    }

    pub fn is_dying(&self) -> bool {
        self.hp <= Fixed::ZERO
    }
}
