pub mod carts;
pub mod health;
pub mod orders;
pub mod products;
