pub mod frame_sampler;
pub mod pixel;
pub mod pulse_trigger;
pub mod sample_grid;
pub mod scene_scorer;
pub mod scheduler;
