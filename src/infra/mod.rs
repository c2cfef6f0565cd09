//! Collaborators outside the core: where the farmer is and what markets pay.

pub mod location;
pub mod prices;
