// handlers/elevated/mod.rs - Admin-only endpoints
pub mod complaints;
pub mod devices;
pub mod staff;
