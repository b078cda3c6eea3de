pub mod physics;
pub mod trail;
pub mod collision;
pub mod zone;
pub mod camera;
pub mod spawn;
pub mod bot;
