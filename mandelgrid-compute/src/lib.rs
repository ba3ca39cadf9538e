pub mod mandelbrot;

pub use mandelbrot::compute_chunk;
