mod audio;
mod input;
mod recorder;
mod support;
