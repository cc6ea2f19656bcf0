/// MPEG-2 transport stream demuxing
pub mod ts;
