use flate2::bufread::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, BufReader, BufWriter, Read, Write};

/// Settings for gzip compression/decompression of archive streams.
#[derive(Clone, Debug)]
pub struct GzipOptions {
    /// Compression level, 0 (store) to 9 (best). Values above 9 are clamped.
    pub level: u32,

    /// Buffer size used for file/stream IO wrappers.
    pub buffer_size: usize,
}

impl Default for GzipOptions {
    fn default() -> Self {
        Self {
            level: 6,
            buffer_size: 256 * 1024, // 256 KiB
        }
    }
}

/// Encoder type produced by [`GzipCodec::encoder`].
pub type TrackedEncoder<W> = GzEncoder<WriteTracker<BufWriter<W>>>;

#[derive(Clone, Debug)]
pub struct GzipCodec {
    opts: GzipOptions,
}

impl GzipCodec {
    pub fn new(opts: GzipOptions) -> Self {
        Self { opts }
    }

    /// Wrap `writer` in a buffered gzip encoder.
    ///
    /// Every write that reaches the buffered sink goes through a [`WriteTracker`],
    /// so callers can tell a failing output stream apart from a failing input
    /// (see [`encoder_failed`]).
    pub fn encoder<W: Write>(&self, writer: W) -> TrackedEncoder<W> {
        let level = Compression::new(self.opts.level.min(9));
        let buffered = BufWriter::with_capacity(self.opts.buffer_size, writer);
        GzEncoder::new(WriteTracker::new(buffered), level)
    }

    /// Wrap `reader` in a buffered gzip decoder. Concatenated gzip members are
    /// decoded as one stream.
    pub fn decoder<R: Read>(&self, reader: R) -> MultiGzDecoder<BufReader<R>> {
        MultiGzDecoder::new(BufReader::with_capacity(self.opts.buffer_size, reader))
    }
}

/// Write the gzip trailer, flush every buffer and hand back the raw writer.
pub fn finish_encoder<W: Write>(encoder: TrackedEncoder<W>) -> io::Result<W> {
    let tracker = encoder.finish()?;
    let mut inner = tracker.into_inner().into_inner().map_err(|e| e.into_error())?;
    inner.flush()?;
    Ok(inner)
}

/// Whether the sink below `encoder` has reported a write or flush error.
pub fn encoder_failed<W: Write>(encoder: &TrackedEncoder<W>) -> bool {
    encoder.get_ref().has_failed()
}

/// Write adapter that remembers the first error its inner writer returned.
///
/// `Interrupted` is retried by callers and is not recorded.
#[derive(Debug)]
pub struct WriteTracker<W> {
    inner: W,
    failure: Option<io::ErrorKind>,
}

impl<W> WriteTracker<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            failure: None,
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure(&self) -> Option<io::ErrorKind> {
        self.failure
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn record<T>(&mut self, result: io::Result<T>) -> io::Result<T> {
        if let Err(ref e) = result {
            if e.kind() != io::ErrorKind::Interrupted && self.failure.is_none() {
                self.failure = Some(e.kind());
            }
        }
        result
    }
}

impl<W: Write> Write for WriteTracker<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buf);
        self.record(result)
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.inner.flush();
        self.record(result)
    }
}
