use crate::av::{AudioSample, AudioTrack, VideoSample, VideoTrack};
use crate::error::{ErrorEvent, ErrorSink};
use crate::Result;

/// Sample-AES decryption of demuxed samples, applied in place.
///
/// The cipher itself lives outside this crate; the demuxer only decides
/// what is decrypted and in which order.
#[async_trait::async_trait]
pub trait SampleDecrypter: Send {
    /// Decrypt the payload of each ADTS frame.
    async fn decrypt_aac_samples(&mut self, samples: &mut [AudioSample]) -> Result<()>;

    /// Decrypt the protected slice data of each access unit.
    async fn decrypt_avc_samples(&mut self, samples: &mut [VideoSample]) -> Result<()>;
}

/// Decrypts audio, then video. Returns once both have settled; failures are
/// reported to the sink and leave the samples as they were.
pub async fn decrypt_tracks(
    decrypter: &mut dyn SampleDecrypter,
    audio: &mut AudioTrack,
    video: &mut VideoTrack,
    sink: &mut dyn ErrorSink,
) {
    if audio.is_aac() && !audio.samples.is_empty() {
        if let Err(error) = decrypter.decrypt_aac_samples(&mut audio.samples).await {
            sink.report(ErrorEvent::decrypt(error));
        }
    }
    if !video.samples.is_empty() {
        if let Err(error) = decrypter.decrypt_avc_samples(&mut video.samples).await {
            sink.report(ErrorEvent::decrypt(error));
        }
    }
}
