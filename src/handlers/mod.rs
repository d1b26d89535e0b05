// handlers/mod.rs - three access tiers
//
// Public (no session) → Protected (session, per-route role gate) → Elevated (Admin only)
pub mod elevated;
pub mod protected;
pub mod public;
