// handlers/mod.rs - HTTP handlers
//
// items: /api/items CRUD (public reads, owner-gated writes)
// health: service banner and liveness
pub mod health;
pub mod items;
