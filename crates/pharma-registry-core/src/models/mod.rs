//! Domain models for the establishment registry.

mod agency;
mod depot;
mod enums;
mod establishment;
mod geo;
mod manufacturing;
mod pharmacy;
mod wholesaler;

pub use agency::*;
pub use depot::*;
pub use enums::*;
pub use establishment::*;
pub use geo::*;
pub use manufacturing::*;
pub use pharmacy::*;
pub use wholesaler::*;
