//! Staggered starts.
//!
//! A sort turns a set of positioned targets into per-target start delays; a
//! [`FrameGroup`] registers the resulting listeners together and cancels them
//! together.
//!
//! Positions use the engine's canonical space: logical pixels, origin top-left,
//! +Y down.

mod geometry;
mod group;
mod sort;

pub use geometry::{Bounds, Vec2};
pub use group::FrameGroup;
pub use sort::{
    Anchor, Direction, LinearStagger, RadialStagger, SequentialStagger, Stagger, Target, Timed,
};
