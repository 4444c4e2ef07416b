pub mod accumulator;
pub mod codec;
pub mod wav_format;
