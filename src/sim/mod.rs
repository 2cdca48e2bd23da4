pub mod camera;
pub mod event;
pub mod level;
pub mod save;
pub mod spawner;
pub mod step;
pub mod world;
