//! The reader and writer tasks behind every client connection.

use std::time::Instant;

use bytes::{Bytes, BytesMut};
use nombytes::NomBytes;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::{mpsc, oneshot, watch},
};

use super::MAX_FRAME_SIZE;
use crate::{
    cluster::{closed, spawn, Context},
    encode::ToByte,
    error::{Error, Result},
    protocol::{self, HeaderRequest, Request, Response},
};

const RESPONSE_QUEUE_SIZE: usize = 2;

/// A request read off a connection, on its way to the event loop.
#[derive(Clone, Debug)]
pub struct ClientRequest {
    /// The broker the request arrived on.
    pub node: i32,
    pub header: HeaderRequest,
    pub request: Request,
    pub at: Instant,
    pub(crate) resp_tx: mpsc::Sender<ClientResponse>,
}

/// The answer to a [`ClientRequest`]. An error closes the connection.
#[derive(Debug)]
pub struct ClientResponse {
    pub correlation_id: i32,
    pub result: Result<Response>,
}

pub(crate) fn start(node: i32, stream: TcpStream, ctx: &Context) {
    let (read, write) = stream.into_split();
    let (resp_tx, resp_rx) = mpsc::channel(RESPONSE_QUEUE_SIZE);
    let (done_tx, done_rx) = oneshot::channel();
    spawn(read_requests(
        node,
        read,
        ctx.req_tx.clone(),
        resp_tx,
        done_rx,
        ctx.die.clone(),
    ));
    spawn(write_responses(node, write, resp_rx, done_tx, ctx.die.clone()));
}

/// Reads one size delimited frame, `None` on a clean end of stream.
pub(crate) async fn read_frame(read: &mut OwnedReadHalf) -> Result<Option<Bytes>> {
    let size = match read.read_u32().await {
        Ok(size) => size as usize,
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if size > MAX_FRAME_SIZE {
        return Err(Error::FrameTooLarge(size));
    }
    let mut buf = BytesMut::zeroed(size);
    read.read_exact(&mut buf).await?;
    Ok(Some(buf.freeze()))
}

fn parse_frame(node: i32, frame: Bytes, resp_tx: &mpsc::Sender<ClientResponse>) -> Result<ClientRequest> {
    let (body, header) = protocol::parse_header_request(NomBytes::new(frame.clone()))
        .map_err(|_| Error::ParsingError(frame))?;
    let request = Request::decode(&header, body.into_bytes())?;
    Ok(ClientRequest {
        node,
        header,
        request,
        at: Instant::now(),
        resp_tx: resp_tx.clone(),
    })
}

async fn read_requests(
    node: i32,
    mut read: OwnedReadHalf,
    req_tx: mpsc::Sender<ClientRequest>,
    resp_tx: mpsc::Sender<ClientResponse>,
    mut done: oneshot::Receiver<()>,
    mut die: watch::Receiver<bool>,
) {
    loop {
        let frame = tokio::select! {
            _ = &mut done => break,
            _ = closed(&mut die) => break,
            frame = read_frame(&mut read) => frame,
        };
        let frame = match frame {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(node, "closing connection: {}", err);
                break;
            }
        };
        let creq = match parse_frame(node, frame, &resp_tx) {
            Ok(creq) => creq,
            Err(err) => {
                tracing::warn!(node, "closing connection on bad request: {}", err);
                break;
            }
        };
        tokio::select! {
            sent = req_tx.send(creq) => if sent.is_err() { break },
            _ = closed(&mut die) => break,
        }
    }
    tracing::trace!(node, "connection reader done");
}

async fn write_responses(
    node: i32,
    mut write: OwnedWriteHalf,
    mut resp_rx: mpsc::Receiver<ClientResponse>,
    done: oneshot::Sender<()>,
    mut die: watch::Receiver<bool>,
) {
    loop {
        let resp = tokio::select! {
            resp = resp_rx.recv() => resp,
            _ = closed(&mut die) => break,
        };
        let Some(resp) = resp else { break };
        let response = match resp.result {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    node,
                    correlation_id = resp.correlation_id,
                    "closing connection: {}",
                    err
                );
                break;
            }
        };
        let buf = match encode_frame(resp.correlation_id, &response) {
            Ok(buf) => buf,
            Err(err) => {
                tracing::error!(node, "ERROR: failed encoding response: {}", err);
                break;
            }
        };
        if let Err(err) = write.write_all(&buf).await {
            tracing::warn!(node, "failed writing response: {}", err);
            break;
        }
    }
    // the reader closes its half too
    let _ = done.send(());
    tracing::trace!(node, "connection writer done");
}

pub(crate) fn encode_frame(correlation_id: i32, response: &Response) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(8);
    buffer.extend_from_slice(&[0, 0, 0, 0]);
    protocol::HeaderResponse { correlation_id }.encode(&mut buffer)?;
    response.encode(&mut buffer)?;

    let size = i32::try_from(buffer.len() - 4).map_err(|_| Error::EncodingError)?;
    size.encode(&mut &mut buffer[..])?;
    Ok(buffer)
}
