//! Axis-aligned collision shapes, attack tiers and the player's shield.

use glam::Vec2;
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::constants::projectile::TIER_TOPS;

/// An axis-aligned rectangle in screen space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Top-left corner.
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Builds a rectangle from its left edge and bottom edge, the way entities are anchored.
    pub fn from_bottom_left(left: f32, bottom: f32, size: Vec2) -> Self {
        Self {
            min: Vec2::new(left, bottom - size.y),
            size,
        }
    }

    pub fn left(&self) -> f32 {
        self.min.x
    }

    pub fn right(&self) -> f32 {
        self.min.x + self.size.x
    }

    pub fn top(&self) -> f32 {
        self.min.y
    }

    pub fn bottom(&self) -> f32 {
        self.min.y + self.size.y
    }

    /// Strict overlap test; rectangles that only share an edge do not collide.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right() && other.left() < self.right() && self.top() < other.bottom() && other.top() < self.bottom()
    }
}

/// One of the three vertical attack and block heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Tier {
    Top,
    #[default]
    Middle,
    Bottom,
}

impl Tier {
    /// Top edge of a projectile travelling at this height.
    pub fn projectile_top(self) -> f32 {
        TIER_TOPS[self.index()]
    }

    pub fn index(self) -> usize {
        match self {
            Tier::Top => 0,
            Tier::Middle => 1,
            Tier::Bottom => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index % 3 {
            0 => Tier::Top,
            1 => Tier::Middle,
            _ => Tier::Bottom,
        }
    }

    /// Wheel-style cycling: top, middle, bottom, then back to top.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }
}

/// The player's shield: an on/off flag plus an independent position selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Shield {
    pub active: bool,
    pub position: Tier,
}

impl Shield {
    pub fn toggle(&mut self) {
        self.active = !self.active;
    }

    pub fn set(&mut self, tier: Tier) {
        self.position = tier;
    }

    pub fn cycle(&mut self) {
        self.position = self.position.next();
    }

    /// A hazard is blocked iff the shield is up at the hazard's exact tier.
    pub fn blocks(&self, tier: Tier) -> bool {
        self.active && self.position == tier
    }

    /// `None` while the shield is down.
    pub fn state(&self) -> Option<Tier> {
        self.active.then_some(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_contact_is_not_overlap() {
        let a = Rect::new(Vec2::ZERO, Vec2::splat(10.0));
        let b = Rect::new(Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Rect::new(Vec2::new(9.0, 9.0), Vec2::splat(10.0))));
    }

    #[test]
    fn tier_cycle_wraps() {
        assert_eq!(Tier::Top.next(), Tier::Middle);
        assert_eq!(Tier::Middle.next(), Tier::Bottom);
        assert_eq!(Tier::Bottom.next(), Tier::Top);
    }
}
