/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Divisor for computing the soft timeout of a search.
macro_rules! soft_timeout_divisor {
    () => {
        20
    };
}
pub(crate) use soft_timeout_divisor;

/// Divisor for computing the hard timeout of a search.
macro_rules! hard_timeout_divisor {
    () => {
        5
    };
}
pub(crate) use hard_timeout_divisor;

/// Divisor for computing how much of the time increment to use.
macro_rules! time_inc_divisor {
    () => {
        2
    };
}
pub(crate) use time_inc_divisor;

/// Bonus for each pseudo-legal square a knight can reach.
macro_rules! knight_mobility {
    () => {
        4
    };
}
pub(crate) use knight_mobility;

/// Bonus for each pseudo-legal square a bishop can reach.
macro_rules! bishop_mobility {
    () => {
        5
    };
}
pub(crate) use bishop_mobility;

/// Bonus for each pseudo-legal square a rook can reach.
macro_rules! rook_mobility {
    () => {
        2
    };
}
pub(crate) use rook_mobility;

/// Bonus for each pseudo-legal square a queen can reach.
macro_rules! queen_mobility {
    () => {
        1
    };
}
pub(crate) use queen_mobility;

/// Bonus for every friendly pawn sheltering the king.
macro_rules! king_shield_bonus {
    () => {
        10
    };
}
pub(crate) use king_shield_bonus;

/// Ordering score for the move that was best in the previous iteration.
macro_rules! pv_move_bonus {
    () => {
        i32::MAX
    };
}
pub(crate) use pv_move_bonus;

/// Ordering score added to every capture, so captures precede all quiets.
macro_rules! capture_base_bonus {
    () => {
        100_000
    };
}
pub(crate) use capture_base_bonus;

/// Ordering score for non-capturing promotions, before killers.
macro_rules! promotion_bonus {
    () => {
        90_000
    };
}
pub(crate) use promotion_bonus;

/// Ordering score for killer moves.
macro_rules! killer_bonus {
    () => {
        80_000
    };
}
pub(crate) use killer_bonus;
