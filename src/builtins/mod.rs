pub mod cd;
pub mod registry;
pub mod status;
pub mod system;
