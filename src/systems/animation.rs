//! Logic animation arbitration.
//!
//! Modules never set an actor's animation directly. They file an
//! [`AnimRequest`] on the [`ActorContext`](crate::components::module::ActorContext)
//! and the driver settles it here once all modules have run:
//!
//! 1. [`apply_request`] decides whether the request replaces what is playing.
//! 2. [`advance`] steps the frame counter and, once a play-once animation
//!    ends, falls back to the idle or walk loop.
//! 3. [`commit`] publishes the frame to the renderer's [`RenderFrame`].

use crate::components::animation::{AnimAction, AnimPriority, AnimTable, LogicAnimation, RenderFrame};
use crate::components::module::AnimRequest;

/// Install `request` if it outranks what is playing.
///
/// A request wins when its priority is at least the current one, or when the
/// current animation has finished. A death animation is never replaced.
/// Returns `true` when the request was installed.
pub fn apply_request(anim: &mut LogicAnimation, priority: &mut AnimPriority, request: Option<AnimRequest>) -> bool {
    let Some(request) = request else {
        return false;
    };
    if *priority == AnimPriority::Death {
        return false;
    }
    if request.priority >= *priority || anim.is_ready() {
        *anim = request.anim;
        *priority = request.priority;
        return true;
    }
    false
}

/// Step `anim` by `ticks`.
///
/// When a play-once animation (other than death) has finished, the actor
/// drops back to its walk loop if `moving`, else to idle, at the matching
/// low priority.
pub fn advance(
    anim: &mut LogicAnimation,
    priority: &mut AnimPriority,
    table: &AnimTable,
    moving: bool,
    flying: bool,
    ticks: u32,
) {
    if !anim.advance(ticks) || *priority == AnimPriority::Death {
        return;
    }
    let (action, fallback) = if moving {
        let action = if flying { AnimAction::Fly } else { AnimAction::Walk };
        (action, AnimPriority::Move)
    } else {
        (AnimAction::Idle, AnimPriority::Idle)
    };
    let def = table.get(action);
    if def.is_none() {
        return;
    }
    *anim = LogicAnimation::start(&def);
    *priority = fallback;
}

/// Publish the current frame.
pub fn commit(anim: &LogicAnimation, frame: &mut RenderFrame) {
    frame.anim_id = anim.anim_id;
    frame.frame = anim.frame_index();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::animation::AnimDef;

    fn request(priority: AnimPriority, def: AnimDef) -> Option<AnimRequest> {
        Some(AnimRequest {
            priority,
            anim: LogicAnimation::start(&def),
        })
    }

    fn table() -> AnimTable {
        AnimTable::default()
            .with(AnimAction::Idle, AnimDef::looping(0, 1, 1))
            .with(AnimAction::Walk, AnimDef::looping(1, 4, 8))
            .with(AnimAction::Hurt, AnimDef::once(6, 2, 10))
            .with(AnimAction::Die1, AnimDef::once(7, 4, 10))
    }

    #[test]
    fn lower_priority_waits_for_completion() {
        let mut anim = LogicAnimation::start(&AnimDef::once(6, 2, 10));
        let mut priority = AnimPriority::Hurt;
        assert!(!apply_request(&mut anim, &mut priority, request(AnimPriority::Move, AnimDef::looping(1, 4, 8))));
        assert_eq!(anim.anim_id, 6);

        anim.advance(145);
        assert!(apply_request(&mut anim, &mut priority, request(AnimPriority::Move, AnimDef::looping(1, 4, 8))));
        assert_eq!(anim.anim_id, 1);
        assert_eq!(priority, AnimPriority::Move);
    }

    #[test]
    fn death_is_final() {
        let mut anim = LogicAnimation::start(&AnimDef::once(7, 4, 10));
        let mut priority = AnimPriority::Death;
        anim.advance(1000);
        assert!(!apply_request(&mut anim, &mut priority, request(AnimPriority::Death, AnimDef::once(8, 4, 10))));
        assert_eq!(anim.anim_id, 7);
    }

    #[test]
    fn finished_hurt_falls_back_to_walk() {
        let table = table();
        let mut anim = LogicAnimation::start(&table.get(AnimAction::Hurt));
        let mut priority = AnimPriority::Hurt;
        advance(&mut anim, &mut priority, &table, true, false, 145);
        assert_eq!(anim.anim_id, 1);
        assert_eq!(priority, AnimPriority::Move);
    }

    #[test]
    fn finished_death_holds_last_frame() {
        let table = table();
        let mut anim = LogicAnimation::start(&table.get(AnimAction::Die1));
        let mut priority = AnimPriority::Death;
        advance(&mut anim, &mut priority, &table, false, false, 1000);
        let mut frame = RenderFrame::default();
        commit(&anim, &mut frame);
        assert_eq!(frame, RenderFrame { anim_id: 7, frame: 3 });
    }
}
