//! Composition entities touched by reversible commands.
//!
//! Only the fields needed to snapshot and restore an entity are modelled.

mod clip;
mod tempo;
mod track;

pub use clip::{Clip, NewClip};
pub use tempo::Tempo;
pub use track::{NewTrack, Track, TrackPatch};
