//! A plain TCP connection to one broker.
//!
//! This is deliberately low level: it frames requests, hands back
//! responses one at a time and checks correlation ids, nothing more.
//! Tests use it to talk to the mock cluster over real sockets.

use std::{io, net::SocketAddr};

use bytes::{Buf, Bytes, BytesMut};
use nombytes::NomBytes;
use tokio::net::TcpStream;
use tracing::instrument;

use super::MAX_FRAME_SIZE;
use crate::{
    encode::ToByte,
    error::{Error, Result},
    protocol::{parse_header_response, HeaderRequest, Request, Response},
};

const DEFAULT_CLIENT_ID: &str = "samsa-mock";

/// TCP connection to a mock broker.
///
/// ### Example
/// ```rust,ignore
/// let mut conn = BrokerConnection::connect(addrs[0]).await?;
/// let response = conn
///     .request(&Request::Metadata(protocol::MetadataRequest::all()))
///     .await?;
/// ```
#[derive(Debug)]
pub struct BrokerConnection {
    stream: TcpStream,
    client_id: String,
    correlation_id: i32,
}

impl BrokerConnection {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        tracing::debug!("Connecting to {:?}", addr);
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::IoError(e.kind()))?;
        Ok(Self {
            stream,
            client_id: DEFAULT_CLIENT_ID.to_owned(),
            correlation_id: 0,
        })
    }

    pub fn client_id(mut self, client_id: &str) -> Self {
        self.client_id = client_id.to_owned();
        self
    }

    #[instrument(name = "network-read", level = "trace", skip(self))]
    async fn read(&mut self, size: usize) -> Result<BytesMut> {
        let mut buf = BytesMut::zeroed(size);
        let mut index = 0_usize;
        while index < size {
            // Wait for the socket to be readable
            self.stream
                .readable()
                .await
                .map_err(|e| Error::IoError(e.kind()))?;

            // Try to read data, this may still fail with `WouldBlock`
            // if the readiness event is a false positive.
            match self.stream.try_read(&mut buf[index..]) {
                Ok(0) => {
                    tracing::trace!("Connection closed by broker");
                    return Err(Error::IoError(io::ErrorKind::UnexpectedEof));
                }
                Ok(n) => {
                    index += n;
                    tracing::trace!("Read {} bytes", n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    tracing::trace!("WouldBlock on read");
                    continue;
                }
                Err(e) => {
                    tracing::error!("ERROR: Reading on Socket {:?}", e);
                    return Err(Error::IoError(e.kind()));
                }
            }
        }
        Ok(buf)
    }

    #[instrument(name = "network-write", level = "trace", skip_all)]
    async fn write(&mut self, buf: &[u8]) -> Result<()> {
        let mut index = 0_usize;
        while index < buf.len() {
            // Wait for the socket to be writable
            self.stream
                .writable()
                .await
                .map_err(|e| Error::IoError(e.kind()))?;

            match self.stream.try_write(&buf[index..]) {
                Ok(n) => {
                    index += n;
                    tracing::trace!("Wrote {} bytes", n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    tracing::trace!("WouldBlock on write");
                    continue;
                }
                Err(e) => {
                    tracing::error!("ERROR: Writing to Socket {:?}", e);
                    return Err(Error::IoError(e.kind()));
                }
            }
        }
        Ok(())
    }

    /// Serialize a header and body and send them to the broker.
    ///
    /// Responses come back in the order requests were sent, use
    /// [`receive_response`](Self::receive_response) to read them.
    pub async fn send_raw<R: ToByte>(&mut self, header: &HeaderRequest, body: &R) -> Result<()> {
        let mut buffer = Vec::with_capacity(4);

        buffer.extend_from_slice(&[0, 0, 0, 0]);
        header.encode(&mut buffer)?;
        body.encode(&mut buffer)?;

        let size = i32::try_from(buffer.len() - 4).map_err(|_| Error::EncodingError)?;
        size.encode(&mut &mut buffer[..])?;

        tracing::trace!("Sending bytes {}", buffer.len());
        self.write(&buffer).await
    }

    /// Send a request with the next correlation id, returning the header used.
    pub async fn send_request(&mut self, req: &Request) -> Result<HeaderRequest> {
        self.correlation_id += 1;
        let header = HeaderRequest::new(
            req.key(),
            req.version(),
            self.correlation_id,
            &self.client_id,
        );
        self.send_raw(&header, req).await?;
        Ok(header)
    }

    /// Receive one response frame, still holding its correlation id.
    pub async fn receive_response(&mut self) -> Result<Bytes> {
        // figure out the message size
        let mut size = self.read(4).await?;

        let length = size.get_u32() as usize;
        if length > MAX_FRAME_SIZE {
            return Err(Error::FrameTooLarge(length));
        }
        tracing::trace!("Reading {} bytes", length);
        Ok(self.read(length).await?.freeze())
    }

    /// Read the response to `header` and decode it.
    pub async fn receive_for(&mut self, header: &HeaderRequest) -> Result<Response> {
        let frame = self.receive_response().await?;
        let (body, response_header) = parse_header_response(NomBytes::new(frame.clone()))
            .map_err(|_| Error::ParsingError(frame))?;
        if response_header.correlation_id != header.correlation_id {
            return Err(Error::CorrelationMismatch {
                expected: header.correlation_id,
                actual: response_header.correlation_id,
            });
        }
        Response::decode(header.api_key, header.api_version, body.into_bytes())
    }

    /// Send a request and wait for its response.
    pub async fn request(&mut self, req: &Request) -> Result<Response> {
        let header = self.send_request(req).await?;
        self.receive_for(&header).await
    }
}
