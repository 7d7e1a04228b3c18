// Valuation engine: normalization, availability, VONA, standings, scores.

pub mod availability;
pub mod normalize;
pub mod score;
pub mod standings;
pub mod vona;
