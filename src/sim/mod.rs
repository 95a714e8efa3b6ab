pub mod engine;
pub mod event;
pub mod level;
pub mod scheduler;
pub mod world;
