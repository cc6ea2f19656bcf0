/// ADTS/AAC
pub mod aac;
/// H.264/AVC
pub mod h264;
/// MPEG-1/2 audio layers I-III
pub mod mpeg_audio;
