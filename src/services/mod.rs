//! Database-backed operations behind the HTTP routes.
//!
//! Every function takes a borrowed connection so callers decide whether it
//! runs standalone or inside a wider transaction.

pub mod carts;
pub mod orders;
pub mod products;
