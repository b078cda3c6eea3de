pub mod constants;
pub mod state;
pub mod systems;
pub mod game_loop;
pub mod match_result;
pub mod spatial;
pub mod input_buffer;
