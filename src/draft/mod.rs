// Draft mechanics: pick scheduling, state, roster assignment.

pub mod roster;
pub mod schedule;
pub mod state;
