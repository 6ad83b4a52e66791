use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::os::unix::net::UnixStream;
use std::path::Path;

use tracing::debug;

/// Socket read size; frames are small, so one chunk usually carries many.
pub(crate) const READ_BUFFER_BYTES: usize = 4096;

/// Outcome of one socket read attempt.
pub(crate) enum SocketRead {
    Data(usize),
    /// Clean end of stream or a fatal error; counts toward exhaustion.
    Empty,
    /// Transient condition; back off and retry without counting.
    Retry,
}

/// Blocking Unix-socket stream of raw record bytes.
pub(crate) struct SocketSource {
    stream: UnixStream,
}

impl SocketSource {
    pub(crate) fn connect(path: &Path) -> io::Result<Self> {
        UnixStream::connect(path).map(|stream| Self { stream })
    }

    pub(crate) fn read_chunk(&mut self, buf: &mut [u8]) -> SocketRead {
        match self.stream.read(buf) {
            Ok(0) => SocketRead::Empty,
            Ok(count) => SocketRead::Data(count),
            Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::WouldBlock) => {
                SocketRead::Retry
            }
            Err(err) => {
                debug!(error = %err, "frame socket read failed");
                SocketRead::Empty
            }
        }
    }
}

/// Outcome of one tail-file read attempt.
pub(crate) enum FileRead {
    Record(String),
    /// Nothing new yet; poll again later.
    Pending,
}

/// Tail-style reader over an append-only record file.
pub(crate) struct FileSource {
    reader: BufReader<File>,
    line: Vec<u8>,
    partial: Vec<u8>,
}

impl FileSource {
    pub(crate) fn open(path: &Path) -> io::Result<Self> {
        File::open(path).map(|file| Self {
            reader: BufReader::new(file),
            line: Vec::new(),
            partial: Vec::new(),
        })
    }

    /// Next complete record without its delimiter. A line still being
    /// appended (no newline yet) stays buffered until the writer finishes
    /// it, so a record is never dispatched in halves.
    pub(crate) fn read_record(&mut self) -> FileRead {
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return FileRead::Pending,
                Ok(_) => {
                    self.partial.extend_from_slice(&self.line);
                    if self.partial.last() != Some(&b'\n') {
                        return FileRead::Pending;
                    }
                    let record = trimmed_record(&self.partial);
                    self.partial.clear();
                    return FileRead::Record(record);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    debug!(error = %err, "frame file read failed");
                    return FileRead::Pending;
                }
            }
        }
    }
}

fn trimmed_record(raw: &[u8]) -> String {
    let mut end = raw.len();
    while end > 0 && (raw[end - 1] == b'\n' || raw[end - 1] == b'\r') {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
