//! Projectile spawn requests and the aiming helpers used to fill them.
//!
//! Projectiles themselves (flight, impact, damage delivery) belong to the
//! host engine. Actors only describe what to launch; the host answers later
//! with a [`MessageKind::Damage`](crate::events::message::MessageKind) when
//! something is hit.

use bevy_ecs::message::Message;
use bevy_ecs::prelude::Entity;
use serde::{Deserialize, Serialize};

use crate::components::dispatch::Faction;
use crate::components::worldobject::SectorId;
use crate::fixed::{Angle, Fixed, FixedVec3, TICKS_PER_SECOND, atan2_units, dist_approx, vec2_to_angle};

/// Projectile families the host knows how to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    /// Melee blow; never spawned, only used to tag player hits.
    Punch,
    RifleBolt,
    TurretBolt,
    ProbeBolt,
    Thermal,
    Repeater,
    Plasma,
    Mortar,
    Concussion,
    Rocket,
    Spark,
}

impl ProjectileKind {
    /// Launch speed in units per second.
    pub fn speed(self) -> Fixed {
        Fixed::from_int(match self {
            ProjectileKind::Punch => 0,
            ProjectileKind::RifleBolt => 250,
            ProjectileKind::TurretBolt => 300,
            ProjectileKind::ProbeBolt => 250,
            ProjectileKind::Thermal => 80,
            ProjectileKind::Repeater => 270,
            ProjectileKind::Plasma => 150,
            ProjectileKind::Mortar => 110,
            ProjectileKind::Concussion => 300,
            ProjectileKind::Rocket => 120,
            ProjectileKind::Spark => 60,
        })
    }

    /// Follows a ballistic arc rather than a straight line.
    pub fn is_arcing(self) -> bool {
        matches!(self, ProjectileKind::Thermal | ProjectileKind::Mortar)
    }
}

/// Ask the host to launch a projectile.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct ProjectileSpawn {
    pub kind: ProjectileKind,
    pub sector: SectorId,
    pub pos: FixedVec3,
    pub yaw: Angle,
    pub pitch: Angle,
    pub speed: Fixed,
    pub owner: Entity,
    pub owner_faction: Faction,
}

/// Heading and pitch from `from` straight at `to`. Positive pitch aims up.
pub fn aim_at_target(from: &FixedVec3, to: &FixedVec3) -> (Angle, Angle) {
    let yaw = from.angle_to(to);
    let horizontal = from.dist_xz(to);
    let pitch = vec2_to_angle(to.y - from.y, horizontal);
    (yaw, pitch)
}

/// Point to aim at so a projectile of `speed` meets a target moving at
/// `velocity` (units per second), using the current distance as flight time.
pub fn lead_target(from: &FixedVec3, target: &FixedVec3, velocity: &FixedVec3, speed: Fixed) -> FixedVec3 {
    if !speed.is_positive() {
        return *target;
    }
    let dist = dist_approx(target.x - from.x, target.z - from.z);
    let flight = dist / speed;
    *target + velocity.scale(flight)
}

/// Pitch that lobs a projectile of `speed` onto `to` under `gravity`
/// (units per second squared). Falls back to a 45 degree lob when the
/// target is out of reach.
pub fn aim_arcing(from: &FixedVec3, to: &FixedVec3, speed: Fixed, gravity: Fixed) -> Angle {
    let horizontal = from.dist_xz(to);
    if !horizontal.is_positive() || !speed.is_positive() || !gravity.is_positive() {
        return vec2_to_angle(to.y - from.y, horizontal);
    }
    // 24.8 keeps the fourth power of the speed inside an i128.
    let narrow = |value: Fixed| i128::from(value.0 >> 8);
    let (h, rise, v, g) = (narrow(horizontal), narrow(to.y - from.y), narrow(speed), narrow(gravity));
    if g == 0 || h == 0 {
        return vec2_to_angle(to.y - from.y, horizontal);
    }
    let v2 = v * v;
    let disc = v2 * v2 - g * (g * h * h + 2 * rise * v2);
    if disc < 0 {
        return Angle::new(Angle::QUARTER / 2);
    }
    // Both stay under 2^48 for any 16.16 input.
    atan2_units((v2 - disc.isqrt()) as i64, (g * h) as i64)
}

/// Ticks a projectile of `speed` needs to cover `dist`.
pub fn flight_ticks(dist: Fixed, speed: Fixed) -> u32 {
    if !speed.is_positive() {
        return 0;
    }
    let seconds = dist / speed;
    seconds.mul_int(TICKS_PER_SECOND as i32).floor().max(0) as u32
}
