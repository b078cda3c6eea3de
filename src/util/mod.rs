pub mod clock;
pub mod vec2;
