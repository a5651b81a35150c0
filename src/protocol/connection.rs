use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{
    message::{Request, RequestErr, Response},
    MAX_FRAME_LEN, MAX_HEADER_LEN,
};

/// A wrapper around a byte stream that takes care of
/// the length prefixed framing in both directions
pub struct Connection<S> {
    buffer: BytesMut,
    stream: S,
}

#[derive(thiserror::Error, Debug)]
pub enum ConnectionErr {
    #[error("{0}")]
    Io(#[from] tokio::io::Error),

    #[error("The frame header is not a valid length")]
    BadHeader,

    #[error("The frame is too long: {0} bytes")]
    FrameIsTooLong(usize),

    #[error("Reached EOF in the middle of a frame")]
    UnexpectedEof,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            buffer: BytesMut::new(),
            stream,
        }
    }

    /// Reads a single request from the stream
    ///
    /// the outer error means the stream can't be used anymore,
    /// the inner error is a malformed request the client should be told about.
    /// returns None once the client closes the stream between two frames.
    pub async fn read_request(
        &mut self,
    ) -> Result<Option<Result<Request, RequestErr>>, ConnectionErr> {
        let Some(frame) = self.read_frame().await? else {
            return Ok(None);
        };

        Ok(Some(Request::from_bytes(&frame)))
    }

    /// Writes the given response to the client
    pub async fn send_response(&mut self, response: &Response) -> Result<(), ConnectionErr> {
        self.write_frame(response.to_string().as_bytes()).await
    }

    /// Reads a full frame, and returns its payload
    ///
    /// returns an error if it reaches EOF in the _middle of a frame_, but otherwise None.
    pub async fn read_frame(&mut self) -> Result<Option<Bytes>, ConnectionErr> {
        let Some(length) = self.read_header().await? else {
            return Ok(None);
        };

        while self.buffer.len() < length {
            let rcount = self.stream.read_buf(&mut self.buffer).await?;
            if rcount == 0 {
                return Err(ConnectionErr::UnexpectedEof);
            }
        }

        Ok(Some(self.buffer.split_to(length).freeze()))
    }

    /// Writes the payload as a single frame, and flushes the stream
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<(), ConnectionErr> {
        if payload.len() > MAX_FRAME_LEN {
            return Err(ConnectionErr::FrameIsTooLong(payload.len()));
        }

        let mut frame = BytesMut::with_capacity(MAX_HEADER_LEN + 1 + payload.len());
        frame.put_slice(format!("{}\n", payload.len()).as_bytes());
        frame.put_slice(payload);

        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;

        Ok(())
    }

    // reads the "<length>\n" part of a frame
    async fn read_header(&mut self) -> Result<Option<usize>, ConnectionErr> {
        let mut position = 0;

        loop {
            // check if we already have the end of the header
            if let Some(offset) = self.buffer[position..].iter().position(|b| *b == b'\n') {
                let header = self.buffer.split_to(position + offset);
                self.buffer.advance(1);
                return parse_header(&header).map(Some);
            }

            // set position to the last byte we didn't check yet
            position = self.buffer.len();
            if position > MAX_HEADER_LEN {
                return Err(ConnectionErr::BadHeader);
            }

            let rcount = self.stream.read_buf(&mut self.buffer).await?;
            if rcount == 0 {
                if position == 0 {
                    // reached EOF between two frames
                    return Ok(None);
                }

                return Err(ConnectionErr::UnexpectedEof);
            }
        }
    }
}

fn parse_header(raw: &[u8]) -> Result<usize, ConnectionErr> {
    if raw.is_empty() || !raw.iter().all(u8::is_ascii_digit) {
        return Err(ConnectionErr::BadHeader);
    }

    let length = std::str::from_utf8(raw)
        .ok()
        .and_then(|raw| raw.parse::<usize>().ok())
        .ok_or(ConnectionErr::BadHeader)?;

    if length > MAX_FRAME_LEN {
        return Err(ConnectionErr::FrameIsTooLong(length));
    }

    Ok(length)
}

#[cfg(test)]
impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub async fn send_request(&mut self, request: &Request) -> Result<(), ConnectionErr> {
        self.write_frame(request.to_string().as_bytes()).await
    }

    pub async fn read_response(&mut self) -> Option<Response> {
        let frame = self.read_frame().await.ok()??;
        std::str::from_utf8(&frame).ok()?.parse().ok()
    }
}
