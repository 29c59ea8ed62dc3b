pub mod capture;
pub mod profile;

pub use capture::CaptureCatalog;
pub use profile::{CarrierProfile, GeneratorConfig, SimulatedCatalog};
