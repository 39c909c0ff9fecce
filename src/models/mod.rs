//! Domain records for the abjour order engine.

pub mod accessory;
pub mod material;
pub mod opening;
pub mod order;
pub mod user;

pub use accessory::{AccessoryLine, Requirement, Unit};
pub use material::Material;
pub use opening::{Opening, OpeningGeometry, OpeningInput};
pub use order::{Order, OrderStatus};
pub use user::{Role, User};
