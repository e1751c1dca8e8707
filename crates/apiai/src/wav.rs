//! RIFF/WAVE container writer for synthesized speech
//!
//! The speech endpoint returns headerless 16-bit mono PCM at 8 kHz together
//! with a `Content-Length`. Because the length is known up front, the whole
//! 44-byte header is written before the first sample and the samples are then
//! copied straight from the response body to disk.
//!
//! Layout:
//!
//! ```text
//! 0..4    "RIFF"
//! 4..8    u32 LE  data length + 36
//! 8..12   "WAVE"
//! 12..16  "fmt "
//! 16..20  u32 LE  16
//! 20..36  PCM format fields (see FieldOrder)
//! 36..40  "data"
//! 40..44  u32 LE  data length
//! 44..    samples
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::{debug, instrument, warn};

use crate::error::ClientError;
use crate::ports::SpeechHandler;
use crate::transport::AudioStream;

/// Size of the header preceding the samples
pub const HEADER_LEN: usize = 44;

/// Size of the `fmt ` chunk body for PCM
const FMT_CHUNK_LEN: u32 = 16;

/// Header bytes counted by the RIFF size field besides the samples
const RIFF_OVERHEAD: u32 = 4 + (8 + FMT_CHUNK_LEN) + 8;

/// Byte order of the PCM format fields inside the `fmt ` chunk
///
/// Chunk ids and chunk sizes are always little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    /// Format fields big-endian, the layout this client has always produced
    #[default]
    BigEndian,
    /// Format fields little-endian, as most audio tools expect
    LittleEndian,
}

/// Linear PCM parameters of the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Format tag, 1 for PCM
    pub audio_format: u16,
    /// Channel count
    pub channels: u16,
    /// Samples per second
    pub sample_rate: u32,
    /// Bytes per second
    pub byte_rate: u32,
    /// Bytes per sample frame
    pub block_align: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
}

impl PcmFormat {
    /// Mono 16-bit PCM at 8000 Hz, the format of the speech endpoint
    pub const SPEECH: Self = Self {
        audio_format: 1,
        channels: 1,
        sample_rate: 8000,
        byte_rate: 16000,
        block_align: 2,
        bits_per_sample: 16,
    };

    /// Linear PCM with derived byte rate and block alignment
    ///
    /// Returns `None` if the block alignment does not fit in 16 bits or the
    /// byte rate does not fit in 32 bits.
    #[must_use]
    pub const fn linear(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Option<Self> {
        let Some(block_align) = channels.checked_mul(bits_per_sample / 8) else {
            return None;
        };
        let Some(byte_rate) = sample_rate.checked_mul(block_align as u32) else {
            return None;
        };

        Some(Self {
            audio_format: 1,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
        })
    }

    fn put(&self, buf: &mut BytesMut, order: FieldOrder) {
        match order {
            FieldOrder::BigEndian => {
                buf.put_u16(self.audio_format);
                buf.put_u16(self.channels);
                buf.put_u32(self.sample_rate);
                buf.put_u32(self.byte_rate);
                buf.put_u16(self.block_align);
                buf.put_u16(self.bits_per_sample);
            },
            FieldOrder::LittleEndian => {
                buf.put_u16_le(self.audio_format);
                buf.put_u16_le(self.channels);
                buf.put_u32_le(self.sample_rate);
                buf.put_u32_le(self.byte_rate);
                buf.put_u16_le(self.block_align);
                buf.put_u16_le(self.bits_per_sample);
            },
        }
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::SPEECH
    }
}

/// Build the 44-byte header for `data_len` bytes of samples
///
/// # Errors
///
/// Returns `ClientError::AudioTooLarge` if the RIFF size would not fit in 32
/// bits.
pub fn header(
    format: &PcmFormat,
    order: FieldOrder,
    data_len: u64,
) -> Result<[u8; HEADER_LEN], ClientError> {
    let data_len32 = u32::try_from(data_len)
        .ok()
        .filter(|len| len.checked_add(RIFF_OVERHEAD).is_some())
        .ok_or(ClientError::AudioTooLarge(data_len))?;

    let mut buf = BytesMut::with_capacity(HEADER_LEN);
    buf.put_slice(b"RIFF");
    buf.put_u32_le(data_len32 + RIFF_OVERHEAD);
    buf.put_slice(b"WAVE");
    buf.put_slice(b"fmt ");
    buf.put_u32_le(FMT_CHUNK_LEN);
    format.put(&mut buf, order);
    buf.put_slice(b"data");
    buf.put_u32_le(data_len32);

    let mut out = [0u8; HEADER_LEN];
    out.copy_from_slice(&buf);
    Ok(out)
}

/// Streaming WAV writer over any async sink
///
/// The header is written first with the declared length; samples are then
/// appended as they arrive. [`WavWriter::finish`] fails if the samples
/// written do not add up to the declared length.
#[derive(Debug)]
pub struct WavWriter<W> {
    inner: W,
    declared_len: u64,
    written: u64,
}

impl<W: AsyncWrite + Unpin + Send> WavWriter<W> {
    /// Write the header and return a writer ready for samples
    ///
    /// # Errors
    ///
    /// Returns an error if the length does not fit the container or the
    /// header cannot be written.
    pub async fn start(
        mut inner: W,
        format: &PcmFormat,
        order: FieldOrder,
        declared_len: u64,
    ) -> Result<Self, WavError> {
        let header = header(format, order, declared_len).map_err(WavError::Container)?;
        inner.write_all(&header).await?;

        Ok(Self {
            inner,
            declared_len,
            written: 0,
        })
    }

    /// Append raw sample bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails.
    pub async fn write_samples(&mut self, samples: &[u8]) -> Result<(), WavError> {
        self.inner.write_all(samples).await?;
        self.written += samples.len() as u64;
        Ok(())
    }

    /// Sample bytes written so far
    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Flush, check the length and return the sink
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails or fewer/more bytes than declared
    /// were written.
    pub async fn finish(mut self) -> Result<W, WavError> {
        self.inner.flush().await?;

        if self.written != self.declared_len {
            return Err(WavError::Container(ClientError::LengthMismatch {
                declared: self.declared_len,
                received: self.written,
            }));
        }

        Ok(self.inner)
    }
}

/// Failure while writing a WAV stream
#[derive(Debug, thiserror::Error)]
pub enum WavError {
    /// Sink failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Container constraint violated
    #[error(transparent)]
    Container(ClientError),
}

impl WavError {
    fn at(self, path: &Path) -> ClientError {
        match self {
            Self::Io(source) => ClientError::io(path, source),
            Self::Container(err) => err,
        }
    }
}

/// Speech handler persisting the stream as a WAV file
///
/// Each invocation creates (or truncates) the file, so one handler value can
/// be reused for successive syntheses to the same path. A failed invocation
/// may leave a partial file behind; the returned error is the signal that it
/// is unusable.
#[derive(Debug, Clone)]
pub struct WavFileHandler {
    path: PathBuf,
    format: PcmFormat,
    order: FieldOrder,
}

impl WavFileHandler {
    /// Handler writing speech-format PCM to `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: PcmFormat::SPEECH,
            order: FieldOrder::default(),
        }
    }

    /// Use another PCM format
    #[must_use]
    pub const fn with_format(mut self, format: PcmFormat) -> Self {
        self.format = format;
        self
    }

    /// Use another byte order for the format fields
    #[must_use]
    pub const fn with_field_order(mut self, order: FieldOrder) -> Self {
        self.order = order;
        self
    }

    /// Destination path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create a handler writing to `path`
#[must_use]
pub fn create_handler(path: impl Into<PathBuf>) -> WavFileHandler {
    WavFileHandler::new(path)
}

#[async_trait]
impl SpeechHandler for WavFileHandler {
    #[instrument(skip(self, audio))]
    async fn handle(
        &mut self,
        mut audio: AudioStream,
        declared_len: u64,
    ) -> Result<(), ClientError> {
        let file = File::create(&self.path)
            .await
            .map_err(|e| ClientError::io(&self.path, e))?;

        let mut writer =
            WavWriter::start(BufWriter::new(file), &self.format, self.order, declared_len)
                .await
                .map_err(|e| e.at(&self.path))?;

        while let Some(chunk) = audio.chunk().await? {
            writer
                .write_samples(&chunk)
                .await
                .map_err(|e| e.at(&self.path))?;
        }

        let written = writer.written();
        let mut buffered = match writer.finish().await {
            Ok(buffered) => buffered,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    declared_len,
                    written,
                    "Speech file left incomplete"
                );
                return Err(e.at(&self.path));
            },
        };
        buffered
            .shutdown()
            .await
            .map_err(|e| ClientError::io(&self.path, e))?;

        debug!(path = %self.path.display(), written, "Speech file written");
        Ok(())
    }
}
