//! Connection to the local forwarder.
//!
//! A [`Face`] owns one stream socket to the forwarder. Two background tasks
//! service it: a writer draining the outgoing queue, and a reader that
//! demultiplexes incoming packets. Interests under an installed filter are
//! handed to the application through the channel returned by
//! [`Face::connect`]; Data and Nacks satisfy pending Interests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use prefix_request_core::lp::{self, NackReason};
use prefix_request_core::{Data, Interest, Name, Packet};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};

use crate::framing;

/// Capacity of the channel carrying filtered Interests to the application.
const INCOMING_CAPACITY: usize = 64;

/// Default lifetime of expressed Interests.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Debug, thiserror::Error)]
pub enum FaceError {
    #[error("failed to connect to forwarder: {0}")]
    Connect(#[source] std::io::Error),

    /// The connection to the forwarder is gone.
    #[error("face is closed")]
    Closed,
}

/// An Interest that matched an installed filter.
#[derive(Debug, Clone)]
pub struct IncomingInterest {
    pub interest: Interest,
    /// Ingress face attached by the forwarder, when local fields are enabled.
    pub incoming_face_id: Option<u64>,
}

/// Answer to an expressed Interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Data(Data),
    Nack(NackReason),
}

struct PendingInterest {
    name: Name,
    can_be_prefix: bool,
    reply: oneshot::Sender<Reply>,
}

impl PendingInterest {
    fn satisfied_by(&self, data_name: &Name) -> bool {
        if self.can_be_prefix {
            self.name.is_prefix_of(data_name)
        } else {
            &self.name == data_name
        }
    }
}

#[derive(Default)]
struct Shared {
    filters: RwLock<Vec<Name>>,
    pending: Mutex<Vec<PendingInterest>>,
}

/// Cloneable handle to the forwarder connection.
#[derive(Clone)]
pub struct Face {
    outgoing: mpsc::UnboundedSender<Vec<u8>>,
    shared: Arc<Shared>,
}

impl Face {
    /// Connect to the forwarder's Unix socket.
    ///
    /// # Errors
    ///
    /// Returns [`FaceError::Connect`] if the socket cannot be reached.
    pub async fn connect(
        path: impl AsRef<Path>,
    ) -> Result<(Self, mpsc::Receiver<IncomingInterest>), FaceError> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path)
            .await
            .map_err(FaceError::Connect)?;
        tracing::info!(path = %path.display(), "Connected to forwarder");
        Ok(Self::from_stream(stream))
    }

    /// Run a face over an already connected stream.
    ///
    /// The returned receiver yields Interests matching installed filters.
    /// It closes when the forwarder closes the connection.
    pub fn from_stream<S>(stream: S) -> (Self, mpsc::Receiver<IncomingInterest>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (incoming_tx, incoming_rx) = mpsc::channel(INCOMING_CAPACITY);
        let shared = Arc::new(Shared::default());

        tokio::spawn(write_loop(writer, outgoing_rx));
        tokio::spawn(read_loop(reader, Arc::clone(&shared), incoming_tx));

        (
            Self {
                outgoing: outgoing_tx,
                shared,
            },
            incoming_rx,
        )
    }

    /// Deliver Interests under `prefix` to the application.
    ///
    /// This only affects local dispatch. Getting the forwarder to send them
    /// here is a separate management command.
    pub async fn add_filter(&self, prefix: Name) {
        self.shared.filters.write().await.push(prefix);
    }

    /// Send an Interest and wait for its Data or Nack.
    ///
    /// Waits for as long as the forwarder takes; there is no local timer.
    ///
    /// # Errors
    ///
    /// Returns [`FaceError::Closed`] if the connection drops first.
    pub async fn express_interest(&self, mut interest: Interest) -> Result<Reply, FaceError> {
        if interest.nonce.is_none() {
            interest.nonce = Some(rand::random());
        }
        if interest.lifetime.is_none() {
            interest.lifetime = Some(DEFAULT_INTEREST_LIFETIME);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        {
            // Held across the send so the reader cannot match a reply first.
            let mut pending = self.shared.pending.lock().await;
            self.send_wire(interest.wire_encode())?;
            pending.push(PendingInterest {
                name: interest.name.clone(),
                can_be_prefix: interest.can_be_prefix,
                reply: reply_tx,
            });
        }

        reply_rx.await.map_err(|_| FaceError::Closed)
    }

    /// Send a Data packet.
    ///
    /// # Errors
    ///
    /// Returns [`FaceError::Closed`] if the connection is gone.
    pub fn put(&self, data: &Data) -> Result<(), FaceError> {
        self.send_wire(data.wire_encode())
    }

    fn send_wire(&self, wire: Vec<u8>) -> Result<(), FaceError> {
        self.outgoing.send(wire).map_err(|_| FaceError::Closed)
    }
}

async fn write_loop<W>(mut writer: W, mut outgoing: mpsc::UnboundedReceiver<Vec<u8>>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(wire) = outgoing.recv().await {
        if let Err(e) = framing::write_packet(&mut writer, &wire).await {
            tracing::warn!(error = %e, "Failed to write to forwarder");
            break;
        }
    }
}

async fn read_loop<R>(
    mut reader: R,
    shared: Arc<Shared>,
    incoming: mpsc::Sender<IncomingInterest>,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let wire = match framing::read_packet(&mut reader).await {
            Ok(wire) => wire,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::info!("Forwarder closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read from forwarder");
                break;
            }
        };

        let frame = match lp::decode_frame(&wire) {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "Dropping undecodable packet");
                continue;
            }
        };

        match (frame.packet, frame.nack) {
            (Packet::Interest(interest), Some(reason)) => {
                resolve(&shared, Reply::Nack(reason), |p| p.name == interest.name).await;
            }
            (Packet::Interest(interest), None) => {
                let wanted = shared
                    .filters
                    .read()
                    .await
                    .iter()
                    .any(|filter| filter.is_prefix_of(&interest.name));
                if !wanted {
                    tracing::debug!(name = %interest.name, "No filter for Interest");
                    continue;
                }
                let delivered = incoming
                    .send(IncomingInterest {
                        interest,
                        incoming_face_id: frame.incoming_face_id,
                    })
                    .await;
                if delivered.is_err() {
                    tracing::debug!("Application stopped accepting Interests");
                }
            }
            (Packet::Data(data), _) => {
                let name = data.name.clone();
                resolve(&shared, Reply::Data(data), |p| p.satisfied_by(&name)).await;
            }
        }
    }

    // Dropping the senders fails every outstanding express_interest.
    shared.pending.lock().await.clear();
}

async fn resolve<F>(shared: &Shared, reply: Reply, matches: F)
where
    F: Fn(&PendingInterest) -> bool,
{
    let mut pending = shared.pending.lock().await;
    let (matched, rest): (Vec<_>, Vec<_>) = pending.drain(..).partition(|p| matches(p));
    *pending = rest;
    drop(pending);

    if matched.is_empty() {
        tracing::debug!("Unsolicited reply from forwarder");
    }
    for entry in matched {
        let _ = entry.reply.send(reply.clone());
    }
}
