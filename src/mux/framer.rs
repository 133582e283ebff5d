//! Line framing from a raw byte stream into tagged sink writes.

use std::sync::Arc;

use colored::Color;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};

use super::sink::FanInSink;
use super::tag::paint;

/// Errors that stop one stream's framing loop.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("failed reading from source: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed writing to destination: {0}")]
    Write(#[source] std::io::Error),
}

/// Consume `source` until EOF, writing one tagged line per sink call.
///
/// A line is the maximal byte run up to and including the next `\n`; an
/// unterminated remainder at EOF becomes one final line. The tag, the
/// (optionally colorized) content and the terminator reach the sink in a
/// single write, so the sink's atomicity guarantee holds per line. Both a
/// read error and a write error stop the loop without draining the rest of
/// the input.
pub async fn frame_lines<R, W>(
    source: R,
    tag: Vec<u8>,
    color: Option<Color>,
    sink: Arc<FanInSink<W>>,
) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(FrameError::Read)?;
        if read == 0 {
            return Ok(());
        }

        trim_terminator(&mut buf);

        let mut line = Vec::with_capacity(tag.len() + buf.len() + 24);
        line.extend_from_slice(&tag);
        match color {
            Some(color) => line.extend_from_slice(&paint(color, &buf)),
            None => line.extend_from_slice(&buf),
        }
        line.push(b'\n');

        sink.write_line(&line).await.map_err(FrameError::Write)?;
    }
}

/// Strip one trailing `\n` (and a preceding `\r`) so the emitted unit never
/// carries a duplicated terminator.
fn trim_terminator(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};

    /// Records every write call as one unit, to observe line granularity.
    /// With `fail_after` set, writes beyond that count fail.
    #[derive(Default)]
    struct RecordingWriter {
        units: Arc<Mutex<Vec<Vec<u8>>>>,
        fail_after: Option<usize>,
    }

    impl AsyncWrite for RecordingWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let mut units = self.units.lock().unwrap();
            if let Some(limit) = self.fail_after {
                if units.len() >= limit {
                    return Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "sink closed",
                    )));
                }
            }
            units.push(buf.to_vec());
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn recording_sink() -> (Arc<FanInSink<RecordingWriter>>, Arc<Mutex<Vec<Vec<u8>>>>) {
        let units = Arc::new(Mutex::new(Vec::new()));
        let writer = RecordingWriter {
            units: Arc::clone(&units),
            fail_after: None,
        };
        (Arc::new(FanInSink::new(writer)), units)
    }

    #[tokio::test]
    async fn unterminated_remainder_becomes_one_final_line() {
        let (sink, units) = recording_sink();

        frame_lines(&b"a\nb\nc"[..], b"T ".to_vec(), None, sink)
            .await
            .unwrap();

        let units = units.lock().unwrap();
        assert_eq!(*units, vec![b"T a\n".to_vec(), b"T b\n".to_vec(), b"T c\n".to_vec()]);
    }

    #[tokio::test]
    async fn terminated_input_emits_exactly_one_unit_per_line() {
        let (sink, units) = recording_sink();

        frame_lines(&b"a\nb\n"[..], b"T ".to_vec(), None, sink)
            .await
            .unwrap();

        let units = units.lock().unwrap();
        assert_eq!(*units, vec![b"T a\n".to_vec(), b"T b\n".to_vec()]);
    }

    #[tokio::test]
    async fn carriage_returns_are_stripped_with_the_terminator() {
        let (sink, units) = recording_sink();

        frame_lines(&b"a\r\nb\r\n"[..], b"T ".to_vec(), None, sink)
            .await
            .unwrap();

        let units = units.lock().unwrap();
        assert_eq!(*units, vec![b"T a\n".to_vec(), b"T b\n".to_vec()]);
    }

    #[tokio::test]
    async fn color_decorates_the_content_but_not_the_tag() {
        let (sink, units) = recording_sink();

        frame_lines(&b"x\n"[..], b"T ".to_vec(), Some(Color::BrightRed), sink)
            .await
            .unwrap();

        let units = units.lock().unwrap();
        assert_eq!(*units, vec![b"T \x1b[91mx\x1b[0m\n".to_vec()]);
    }

    #[tokio::test]
    async fn empty_input_emits_nothing() {
        let (sink, units) = recording_sink();

        frame_lines(&b""[..], b"T ".to_vec(), None, sink)
            .await
            .unwrap();

        assert!(units.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_error_stops_framing_without_draining_input() {
        let units = Arc::new(Mutex::new(Vec::new()));
        let writer = RecordingWriter {
            units: Arc::clone(&units),
            fail_after: Some(1),
        };
        let sink = Arc::new(FanInSink::new(writer));

        let result = frame_lines(&b"one\ntwo\nthree\n"[..], b"T ".to_vec(), None, sink).await;

        assert!(matches!(result, Err(FrameError::Write(_))));
        // Only the line written before the failure reached the sink.
        assert_eq!(*units.lock().unwrap(), vec![b"T one\n".to_vec()]);
    }

    #[tokio::test]
    async fn read_error_stops_framing_after_delivered_lines() {
        let (sink, units) = recording_sink();
        let source = tokio_test::io::Builder::new()
            .read(b"one\n")
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "boom"))
            .build();

        let result = frame_lines(source, b"T ".to_vec(), None, sink).await;

        assert!(matches!(result, Err(FrameError::Read(_))));
        assert_eq!(*units.lock().unwrap(), vec![b"T one\n".to_vec()]);
    }
}
