pub mod data;

pub use data::agent::{AgentView, SpeciesId};
pub use data::component::HerdComponent;
pub use data::vector::Vec3;
pub use uuid::Uuid;
