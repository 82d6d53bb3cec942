mod capture;
mod gate;
mod resampler;
