pub mod collision;
pub mod entity;
pub mod physics;
