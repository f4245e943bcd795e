//! Collision service consumed by actor movement.
//!
//! The collision math belongs to the host engine. Actors submit a
//! [`CollisionInfo`] describing the step they would like to take and get back
//! the step they are allowed to take, plus what blocked them. The service is
//! stored in the world as the [`Collision`] resource.
//!
//! [`OpenArena`] is a small self-contained implementation (flat floor,
//! rectangular bounds, solid blocks with optional openings, pits and liquid
//! pools) used by the binary and the tests.

use bevy_ecs::prelude::Resource;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::components::worldobject::SectorId;
use crate::fixed::{Fixed, FixedVec3, dist_approx};

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CollisionFlags: u32 {
        /// Refuse steps that would drop off a ledge.
        const AVOID_LEDGES = 1 << 0;
        /// Ignore floor changes entirely.
        const FLYING       = 1 << 1;
    }
}

/// Vertical opening in a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallGap {
    pub bottom: Fixed,
    pub top: Fixed,
}

impl WallGap {
    pub fn height(&self) -> Fixed {
        self.top - self.bottom
    }

    /// Would a body of `height` standing at `y` pass through?
    pub fn admits(&self, y: Fixed, height: Fixed) -> bool {
        y >= self.bottom && y + height <= self.top
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionHit {
    /// A wall, possibly an adjoining one with an opening.
    Wall { gap: Option<WallGap> },
    /// The floor drops away.
    Ledge,
    /// Another object, identified by the host.
    Object(u32),
}

/// In/out record for one movement step.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionInfo {
    pub pos: FixedVec3,
    pub radius: Fixed,
    pub height: Fixed,
    pub sector: SectorId,
    /// Requested displacement.
    pub delta: FixedVec3,
    pub flags: CollisionFlags,
    /// Displacement actually allowed.
    pub actual: FixedVec3,
    pub hit: Option<CollisionHit>,
    /// Unit direction along the blocking surface, `(x, z)`.
    pub response_dir: (Fixed, Fixed),
}

impl CollisionInfo {
    pub fn new(pos: FixedVec3, radius: Fixed, height: Fixed, sector: SectorId, delta: FixedVec3) -> Self {
        Self {
            pos,
            radius,
            height,
            sector,
            delta,
            flags: CollisionFlags::empty(),
            actual: delta,
            hit: None,
            response_dir: (Fixed::ZERO, Fixed::ZERO),
        }
    }

    pub fn with_flags(mut self, flags: CollisionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn blocked(&self) -> bool {
        self.hit.is_some()
    }
}

/// Floor under a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorInfo {
    pub height: Fixed,
    pub liquid: bool,
}

pub trait CollisionService: Send + Sync {
    /// Fill in `actual`, `hit` and `response_dir` for the requested step.
    fn resolve(&self, info: &mut CollisionInfo);

    fn floor_at(&self, pos: &FixedVec3, sector: SectorId) -> FloorInfo;

    fn line_of_sight(&self, from: &FixedVec3, to: &FixedVec3) -> bool;
}

/// The collision service in use.
#[derive(Resource)]
pub struct Collision(pub Box<dyn CollisionService>);

impl Collision {
    pub fn new(service: impl CollisionService + 'static) -> Self {
        Collision(Box::new(service))
    }

    pub fn service(&self) -> &dyn CollisionService {
        self.0.as_ref()
    }
}

/// Axis-aligned rectangle on the floor plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: Fixed,
    pub min_z: Fixed,
    pub max_x: Fixed,
    pub max_z: Fixed,
}

impl Rect {
    pub fn new(min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Self {
        Self {
            min_x: Fixed::from_int(min_x),
            min_z: Fixed::from_int(min_z),
            max_x: Fixed::from_int(max_x),
            max_z: Fixed::from_int(max_z),
        }
    }

    pub fn contains(&self, x: Fixed, z: Fixed) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    /// Grow (or shrink, for negative `by`) on every side.
    pub fn expanded(&self, by: Fixed) -> Rect {
        Rect {
            min_x: self.min_x - by,
            min_z: self.min_z - by,
            max_x: self.max_x + by,
            max_z: self.max_z + by,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub rect: Rect,
    pub gap: Option<WallGap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pit {
    pub rect: Rect,
    pub depth: Fixed,
}

/// Flat test level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenArena {
    pub bounds: Rect,
    pub floor: Fixed,
    pub blocks: Vec<Block>,
    pub pits: Vec<Pit>,
    pub liquid: Vec<Rect>,
}

impl OpenArena {
    /// Square arena spanning `[-half, half]` on both axes.
    pub fn new(half: i32) -> Self {
        Self {
            bounds: Rect::new(-half, -half, half, half),
            floor: Fixed::ZERO,
            blocks: Vec::new(),
            pits: Vec::new(),
            liquid: Vec::new(),
        }
    }

    pub fn with_block(mut self, rect: Rect, gap: Option<WallGap>) -> Self {
        self.blocks.push(Block { rect, gap });
        self
    }

    pub fn with_pit(mut self, rect: Rect, depth: Fixed) -> Self {
        self.pits.push(Pit { rect, depth });
        self
    }

    pub fn with_liquid(mut self, rect: Rect) -> Self {
        self.liquid.push(rect);
        self
    }

    fn blocks_point(&self, x: Fixed, z: Fixed, y: Fixed) -> bool {
        self.blocks.iter().any(|block| {
            block.rect.contains(x, z) && !block.gap.is_some_and(|gap| y >= gap.bottom && y <= gap.top)
        })
    }
}

fn unit(v: Fixed) -> Fixed {
    if v.is_negative() { -Fixed::ONE } else { Fixed::ONE }
}

impl CollisionService for OpenArena {
    fn resolve(&self, info: &mut CollisionInfo) {
        info.actual = info.delta;
        info.hit = None;
        info.response_dir = (Fixed::ZERO, Fixed::ZERO);

        let dest_x = info.pos.x + info.delta.x;
        let dest_z = info.pos.z + info.delta.z;

        let inner = self.bounds.expanded(-info.radius);
        if !inner.contains(dest_x, dest_z) {
            let clamped_x = dest_x.clamp(inner.min_x, inner.max_x);
            let clamped_z = dest_z.clamp(inner.min_z, inner.max_z);
            info.actual.x = clamped_x - info.pos.x;
            info.actual.z = clamped_z - info.pos.z;
            info.hit = Some(CollisionHit::Wall { gap: None });
            info.response_dir = if clamped_x != dest_x {
                (Fixed::ZERO, unit(info.delta.z))
            } else {
                (unit(info.delta.x), Fixed::ZERO)
            };
            return;
        }

        for block in &self.blocks {
            let grown = block.rect.expanded(info.radius);
            if !grown.contains(dest_x, dest_z) {
                continue;
            }
            if block.gap.is_some_and(|gap| gap.admits(info.pos.y, info.height)) {
                continue;
            }
            info.actual.x = Fixed::ZERO;
            info.actual.z = Fixed::ZERO;
            info.hit = Some(CollisionHit::Wall { gap: block.gap });
            let outside_x = info.pos.x < grown.min_x || info.pos.x > grown.max_x;
            info.response_dir = if outside_x {
                (Fixed::ZERO, unit(info.delta.z))
            } else {
                (unit(info.delta.x), Fixed::ZERO)
            };
            return;
        }

        if info.flags.contains(CollisionFlags::AVOID_LEDGES) && !info.flags.contains(CollisionFlags::FLYING) {
            let into_pit = self
                .pits
                .iter()
                .any(|pit| pit.rect.contains(dest_x, dest_z) && !pit.rect.contains(info.pos.x, info.pos.z));
            if into_pit {
                info.actual.x = Fixed::ZERO;
                info.actual.z = Fixed::ZERO;
                info.hit = Some(CollisionHit::Ledge);
            }
        }
    }

    fn floor_at(&self, pos: &FixedVec3, _sector: SectorId) -> FloorInfo {
        let depth = self
            .pits
            .iter()
            .find(|pit| pit.rect.contains(pos.x, pos.z))
            .map_or(Fixed::ZERO, |pit| pit.depth);
        FloorInfo {
            height: self.floor - depth,
            liquid: self.liquid.iter().any(|rect| rect.contains(pos.x, pos.z)),
        }
    }

    fn line_of_sight(&self, from: &FixedVec3, to: &FixedVec3) -> bool {
        let dist = dist_approx(to.x - from.x, to.z - from.z);
        let steps = dist.floor().clamp(1, 1024);
        (0..=steps).all(|i| {
            let t = Fixed::from_ratio(i, steps);
            let x = from.x + (to.x - from.x) * t;
            let y = from.y + (to.y - from.y) * t;
            let z = from.z + (to.z - from.z) * t;
            !self.blocks_point(x, z, y)
        })
    }
}
