pub mod geocode;
pub mod health;
pub mod shops;
pub mod stats;
