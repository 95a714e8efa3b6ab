pub mod geom;
pub mod grid;
pub mod intent;
pub mod player;
pub mod tile;
