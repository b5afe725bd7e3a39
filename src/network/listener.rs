//! One accept loop per broker.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::{net::TcpListener, sync::oneshot};

use super::conn;
use crate::{
    cluster::{closed, spawn, Broker, Context},
    error::{Error, Result},
};

fn bind(port: i32) -> Result<TcpListener> {
    let port = u16::try_from(port.max(0))
        .map_err(|_| Error::IoError(std::io::ErrorKind::InvalidInput))?;
    let listener = std::net::TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))?;
    listener.set_nonblocking(true)?;
    Ok(TcpListener::from_std(listener)?)
}

/// Binds `127.0.0.1:port` for `node` and starts accepting connections.
///
/// The returned broker owns the listener, dropping it stops the accept
/// loop.
pub(crate) fn start(node: i32, port: i32, ctx: &Context) -> Result<Broker> {
    let listener = bind(port).map_err(|err| {
        tracing::error!(node, port, "ERROR: failed to bind broker: {}", err);
        err
    })?;
    let addr = listener.local_addr()?;
    let (close_tx, close_rx) = oneshot::channel();
    spawn(accept(node, listener, ctx.clone(), close_rx));
    tracing::debug!(node, %addr, "broker listening");
    Ok(Broker::new(node, addr, close_tx))
}

async fn accept(
    node: i32,
    listener: TcpListener,
    ctx: Context,
    mut close: oneshot::Receiver<()>,
) {
    let mut die = ctx.die.clone();
    loop {
        tokio::select! {
            _ = &mut close => break,
            _ = closed(&mut die) => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(node, %peer, "accepted connection");
                    conn::start(node, stream, &ctx);
                }
                Err(err) => {
                    tracing::warn!(node, "failed to accept connection: {}", err);
                }
            },
        }
    }
    tracing::debug!(node, "broker listener closed");
}
