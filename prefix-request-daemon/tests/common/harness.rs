//! Test harnesses for listener tests.
//!
//! The listener runs against in-memory collaborators: commands go in over
//! a channel, and every registration call, reply and outcome line comes out
//! over its own channel so tests can await them.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use prefix_request_auth::{expected_proof, PrivateKey, Secret};
use prefix_request_core::lp::encode_frame;
use prefix_request_core::mgmt::{ControlParameters, ControlResponse};
use prefix_request_core::tlv::{self, types};
use prefix_request_core::{listen_prefix, Data, Interest, Name, RegistrationRequest};
use prefix_request_daemon::framing;
use prefix_request_daemon::listener::ListenerError;
use prefix_request_daemon::{
    CommandListener, FaceError, IncomingInterest, KeyChain, OutcomeLogger, RegistrationFailure,
    RegistrationFuture, RouteManager, RouteRegistrar, Transport,
};
use tokio::io::DuplexStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// How long a test waits for something that should happen.
const WAIT: Duration = Duration::from_secs(5);

/// The uppercase hex proof for `prefix_uri` under `secret`.
pub fn proof_for(secret: &str, prefix_uri: &str) -> String {
    expected_proof(&Secret::new(secret), prefix_uri.as_bytes())
}

/// `/localhop/prefix-request/<prefix_uri>/<proof>/<nonce>`.
pub fn command_name(prefix_uri: &str, proof: &str, nonce: &str) -> Name {
    listen_prefix().with(prefix_uri).with(proof).with(nonce)
}

/// A registration the listener started, waiting for the test to settle it.
pub struct PendingCall {
    pub request: RegistrationRequest,
    respond: oneshot::Sender<Result<Name, RegistrationFailure>>,
}

impl PendingCall {
    /// Report success with the requested name.
    pub fn succeed(self) {
        let name = self.request.prefix.clone();
        let _ = self.respond.send(Ok(name));
    }

    /// Report failure with `code`.
    pub fn fail(self, code: u32) {
        let _ = self.respond.send(Err(RegistrationFailure {
            code,
            detail: "simulated".into(),
        }));
    }
}

/// Route manager that hands every call to the test.
struct ScriptedManager {
    calls: mpsc::UnboundedSender<PendingCall>,
}

impl RouteManager for ScriptedManager {
    fn start_registration(&self, request: RegistrationRequest) -> RegistrationFuture {
        let (respond, outcome) = oneshot::channel();
        let _ = self.calls.send(PendingCall { request, respond });
        Box::pin(async move {
            outcome.await.unwrap_or_else(|_| {
                Err(RegistrationFailure {
                    code: 500,
                    detail: "test dropped the call".into(),
                })
            })
        })
    }
}

/// Transport that captures replies.
struct CapturingTransport {
    replies: mpsc::UnboundedSender<Data>,
}

impl Transport for CapturingTransport {
    fn send(&self, data: &Data) -> Result<(), FaceError> {
        self.replies.send(data.clone()).map_err(|_| FaceError::Closed)
    }
}

/// Outcome log sink that forwards complete lines.
struct LineSink {
    partial: Vec<u8>,
    lines: mpsc::UnboundedSender<String>,
}

impl Write for LineSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.partial.extend_from_slice(buf);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
            let _ = self.lines.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An outcome logger whose lines arrive on the returned channel.
pub fn line_logger() -> (OutcomeLogger, mpsc::UnboundedReceiver<String>) {
    let (lines, rx) = mpsc::unbounded_channel();
    let sink = LineSink {
        partial: Vec::new(),
        lines,
    };
    (OutcomeLogger::new(Box::new(sink)), rx)
}

pub fn test_keychain() -> Arc<KeyChain> {
    let identity = Name::from_uri("/localhost/prefix-request").expect("valid identity");
    Arc::new(KeyChain::new(PrivateKey::generate(), &identity))
}

/// A running listener wired to in-memory collaborators.
pub struct TestListener {
    pub keychain: Arc<KeyChain>,
    commands: mpsc::Sender<IncomingInterest>,
    calls: mpsc::UnboundedReceiver<PendingCall>,
    replies: mpsc::UnboundedReceiver<Data>,
    log_lines: mpsc::UnboundedReceiver<String>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ListenerError>>,
}

impl TestListener {
    /// Start a listener holding `secret`.
    pub fn start(secret: &str) -> Self {
        let (calls_tx, calls) = mpsc::unbounded_channel();
        let (replies_tx, replies) = mpsc::unbounded_channel();
        let (logger, log_lines) = line_logger();
        let (commands, commands_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let keychain = test_keychain();

        let listener = CommandListener::new(
            Secret::new(secret),
            RouteRegistrar::new(Arc::new(ScriptedManager { calls: calls_tx })),
            Arc::new(CapturingTransport {
                replies: replies_tx,
            }),
            Arc::clone(&keychain),
            logger,
        );

        let handle = tokio::spawn(listener.run(commands_rx, async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            keychain,
            commands,
            calls,
            replies,
            log_lines,
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// Deliver a command Interest as if it arrived on `face_id`.
    pub async fn send(&self, name: Name, face_id: Option<u64>) {
        self.commands
            .send(IncomingInterest {
                interest: Interest::new(name),
                incoming_face_id: face_id,
            })
            .await
            .expect("listener is running");
    }

    pub async fn next_call(&mut self) -> PendingCall {
        tokio::time::timeout(WAIT, self.calls.recv())
            .await
            .expect("timed out waiting for a registration")
            .expect("registration channel closed")
    }

    pub async fn next_reply(&mut self) -> Data {
        tokio::time::timeout(WAIT, self.replies.recv())
            .await
            .expect("timed out waiting for a reply")
            .expect("reply channel closed")
    }

    pub async fn next_log_line(&mut self) -> String {
        tokio::time::timeout(WAIT, self.log_lines.recv())
            .await
            .expect("timed out waiting for an outcome line")
            .expect("outcome channel closed")
    }

    /// Nothing was registered or replied so far.
    ///
    /// Only meaningful after a later outcome line has been observed, since
    /// commands are handled in arrival order.
    pub fn assert_quiet(&mut self) {
        assert!(self.calls.try_recv().is_err(), "unexpected registration");
        assert!(self.replies.try_recv().is_err(), "unexpected reply");
    }

    pub fn assert_no_log_line(&mut self) {
        assert!(self.log_lines.try_recv().is_err(), "unexpected outcome line");
    }

    /// Stop the listener and return how it ended.
    pub async fn stop(mut self) -> Result<(), ListenerError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.handle.await.expect("listener task panicked")
    }

    /// Close the command channel, as a vanished forwarder would.
    pub async fn close_transport(self) -> Result<(), ListenerError> {
        let Self {
            commands,
            handle,
            shutdown,
            ..
        } = self;
        drop(commands);
        let result = handle.await.expect("listener task panicked");
        drop(shutdown);
        result
    }
}

/// Split an outcome line into its timestamp and the remaining fields.
pub fn parse_log_line(line: &str) -> (i64, Vec<String>) {
    let mut fields = line.split('\t');
    let ts = fields
        .next()
        .and_then(|ts| ts.parse().ok())
        .expect("numeric timestamp");
    (ts, fields.map(str::to_string).collect())
}

/// The forwarder's end of a face.
pub struct FakeForwarder {
    stream: DuplexStream,
}

impl FakeForwarder {
    pub fn new(stream: DuplexStream) -> Self {
        Self { stream }
    }

    async fn read(&mut self) -> Vec<u8> {
        tokio::time::timeout(WAIT, framing::read_packet(&mut self.stream))
            .await
            .expect("timed out waiting for a packet")
            .expect("face closed")
            .to_vec()
    }

    /// Receive a management command and decode its parameters.
    pub async fn next_command(&mut self) -> (Interest, String, ControlParameters) {
        let interest = Interest::wire_decode(&self.read().await).expect("command Interest");
        let verb = interest
            .name
            .components()
            .get(2..4)
            .map(|c| {
                format!(
                    "{}/{}",
                    String::from_utf8_lossy(c[0].value()),
                    String::from_utf8_lossy(c[1].value())
                )
            })
            .expect("management name");
        let encoded = interest.name.get(4).expect("parameters component").value();
        let element =
            tlv::decode_single(encoded, types::CONTROL_PARAMETERS).expect("ControlParameters");
        let params = ControlParameters::decode_value(element.value).expect("valid parameters");
        (interest, verb, params)
    }

    /// Answer `command` with `status_code`, echoing `body` on success.
    pub async fn respond(
        &mut self,
        command: &Interest,
        status_code: u32,
        body: Option<ControlParameters>,
    ) {
        let response = ControlResponse {
            status_code,
            status_text: if status_code == 200 { "OK" } else { "Error" }.into(),
            body,
        };
        let data = Data::new(command.name.clone(), response.wire_encode());
        self.write(&data.wire_encode()).await;
    }

    /// Deliver a command Interest carrying IncomingFaceId `face_id`.
    pub async fn send_interest(&mut self, name: Name, face_id: Option<u64>) {
        let mut interest = Interest::new(name);
        interest.nonce = Some([1, 2, 3, 4]);
        let frame = encode_frame(&interest.wire_encode(), face_id, None);
        self.write(&frame).await;
    }

    pub async fn next_data(&mut self) -> Data {
        Data::wire_decode(&self.read().await).expect("Data packet")
    }

    async fn write(&mut self, wire: &[u8]) {
        framing::write_packet(&mut self.stream, wire)
            .await
            .expect("face closed");
    }

    /// Hang up.
    pub fn close(self) {
        drop(self.stream);
    }
}
