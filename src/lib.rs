pub mod attribution;
pub mod batch;
pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod export;
pub mod loader;
pub mod model;
pub mod rates;
pub mod shifts;
pub mod store;
pub mod strength;
pub mod synthetic;
pub mod timeline;
pub mod toi;
