// handlers/protected/mod.rs - endpoints behind a resolved session
//
// Every route here runs after `require_session`; the identity is in the
// request extensions. Role gates are attached per route group in `app`.
pub mod account;
pub mod appointments;
pub mod contact;
pub mod records;
