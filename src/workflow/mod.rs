pub mod render_loop;

pub use render_loop::RenderLoop;
