//! File-backed output: [`FrameWriter`] and [`FrameReader`].

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tide_core::OutputError;

use crate::codec::{decode_frame, decode_header, encode_frame, encode_header};
use crate::payload::Payload;
use crate::sink::OutputSink;

/// One decoded output frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Simulation time in seconds.
    pub time: f64,
    /// Arrays written at that time.
    pub payload: Payload,
}

/// Streams payloads to a byte sink in the binary frame format.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`. The header is written on construction.
///
/// # Examples
///
/// ```
/// use tide_core::Attributes;
/// use tide_obs::{FrameReader, FrameWriter, OutputArray, OutputSink, Payload};
///
/// let mut payload = Payload::new();
/// payload.insert("max_nu", OutputArray::scalar(1e-3, Attributes::new("maximum viscosity", "m2/s")));
///
/// let mut writer = FrameWriter::new(Vec::new(), "stats").unwrap();
/// writer.write("stats", &payload, 300.0).unwrap();
/// writer.write("stats", &payload, 600.0).unwrap();
/// writer.close().unwrap();
/// assert_eq!(writer.frames_written(), 2);
/// let bytes = writer.into_inner();
///
/// let mut reader = FrameReader::open(bytes.as_slice()).unwrap();
/// assert_eq!(reader.name(), "stats");
/// assert_eq!(reader.next_frame().unwrap().unwrap().time, 300.0);
/// assert_eq!(reader.next_frame().unwrap().unwrap().time, 600.0);
/// assert!(reader.next_frame().unwrap().is_none());
/// ```
pub struct FrameWriter<W: Write> {
    writer: W,
    name: String,
    frames_written: u64,
    closed: bool,
}

impl<W: Write> FrameWriter<W> {
    /// Create a writer for schedule `name`, immediately writing the header.
    ///
    /// # Errors
    ///
    /// Any I/O error from writing the header.
    pub fn new(mut writer: W, name: &str) -> Result<Self, OutputError> {
        encode_header(&mut writer, name)?;
        Ok(Self {
            writer,
            name: name.to_string(),
            frames_written: 0,
            closed: false,
        })
    }

    /// Schedule name recorded in the header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Consume the writer and return the underlying stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl FrameWriter<BufWriter<File>> {
    /// Create (or truncate) `path` and write the header.
    ///
    /// # Errors
    ///
    /// Any I/O error from creating the file or writing the header.
    pub fn create(path: impl AsRef<Path>, name: &str) -> Result<Self, OutputError> {
        let file = File::create(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), name, "opened frame file");
        Self::new(BufWriter::new(file), name)
    }
}

impl<W: Write + Send> OutputSink for FrameWriter<W> {
    fn write(&mut self, name: &str, payload: &Payload, time: f64) -> Result<(), OutputError> {
        if self.closed {
            return Err(OutputError::Closed {
                name: name.to_string(),
            });
        }
        encode_frame(&mut self.writer, time, payload)?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), OutputError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads frames written by [`FrameWriter`].
///
/// The header is validated on construction.
pub struct FrameReader<R: Read> {
    reader: R,
    name: String,
    frames_read: u64,
}

impl<R: Read> FrameReader<R> {
    /// Open a frame stream, reading and validating the header.
    ///
    /// # Errors
    ///
    /// [`OutputError::InvalidMagic`], [`OutputError::UnsupportedVersion`],
    /// or an I/O error.
    pub fn open(mut reader: R) -> Result<Self, OutputError> {
        let name = decode_header(&mut reader)?;
        Ok(Self {
            reader,
            name,
            frames_read: 0,
        })
    }

    /// Schedule name from the header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the next frame, or `None` if the stream is exhausted.
    ///
    /// # Errors
    ///
    /// [`OutputError::MalformedFrame`] on truncated or corrupt data.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, OutputError> {
        let frame = decode_frame(&mut self.reader)?;
        Ok(frame.map(|(time, payload)| {
            self.frames_read += 1;
            Frame { time, payload }
        }))
    }

    /// Number of frames read so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Read every remaining frame.
    ///
    /// # Errors
    ///
    /// The first decode error encountered.
    pub fn read_all(&mut self) -> Result<Vec<Frame>, OutputError> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

impl FrameReader<BufReader<File>> {
    /// Open a frame file from disk.
    ///
    /// # Errors
    ///
    /// Same as [`open`](FrameReader::open), plus file-open errors.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        Self::open(BufReader::new(File::open(path)?))
    }
}
