//! MQTT source: subscribes to the configured topics and feeds raw readings
//! into the ingestion queue.
//!
//! The source owns the transport event loop and a reconnect state machine:
//! transient failures are retried with exponential backoff, fatal ones
//! (authentication, TLS, protocol violations) end the task with an error.

use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, MqttOptions, Packet, QoS,
};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backoff::{AttemptsExhausted, Backoff};
use super::queue::{IngestHandle, RawEvent};
use crate::config::mqtt::MqttConfig;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("mqtt connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    RetriesExhausted(#[from] AttemptsExhausted),
}

/// Connection lifecycle, published through a watch channel so other tasks
/// can observe transitions without polling the source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceState {
    Connecting,
    Connected,
    /// Waiting out a backoff delay (seconds) before the next attempt.
    Reconnecting(f64),
    Disconnected(String),
}

impl SourceState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SourceState::Connected)
    }
}

impl std::fmt::Display for SourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceState::Connecting => write!(f, "connecting"),
            SourceState::Connected => write!(f, "connected"),
            SourceState::Reconnecting(secs) => write!(f, "reconnecting in {secs}s"),
            SourceState::Disconnected(reason) => write!(f, "disconnected: {reason}"),
        }
    }
}

pub struct MqttSource {
    config: MqttConfig,
    client: AsyncClient,
    event_loop: rumqttc::EventLoop,
    queue: IngestHandle,
    cancel: CancellationToken,
    backoff: Backoff,
    state_tx: watch::Sender<SourceState>,
    // kept so state updates never hit a receiverless channel
    state_rx: watch::Receiver<SourceState>,
}

impl MqttSource {
    pub fn new(config: MqttConfig, queue: IngestHandle, cancel: CancellationToken) -> Self {
        let client_id = config.effective_client_id();
        info!(
            host = %config.host,
            port = config.port,
            client_id = %client_id,
            "creating mqtt source"
        );

        let mut options = MqttOptions::new(client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive));
        options.set_clean_session(config.clean_session);

        let (client, event_loop) = AsyncClient::new(options, 10);
        let backoff = Backoff::new(
            Duration::from_secs(config.reconnect_delay),
            Duration::from_secs(config.max_reconnect_delay),
            config.reconnect_backoff_multiplier,
            config.max_reconnect_attempts,
        );
        let (state_tx, state_rx) = watch::channel(SourceState::Connecting);

        Self {
            config,
            client,
            event_loop,
            queue,
            cancel,
            backoff,
            state_tx,
            state_rx,
        }
    }

    /// A receiver for connection state transitions.
    pub fn state(&self) -> watch::Receiver<SourceState> {
        self.state_rx.clone()
    }

    fn set_state(&self, state: SourceState) {
        // cannot fail: self.state_rx keeps the channel open
        let _ = self.state_tx.send(state);
    }

    /// Drives the transport until cancellation or a fatal error.
    pub async fn run(mut self) -> Result<(), SourceError> {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("shutdown requested, disconnecting from broker");
                    if let Err(err) = self.client.disconnect().await {
                        debug!("disconnect on shutdown failed: {err}");
                    }
                    self.set_state(SourceState::Disconnected("shutdown".to_string()));
                    return Ok(());
                }
                event = self.event_loop.poll() => match event {
                    Ok(event) => self.handle_event(event).await?,
                    Err(err) if is_fatal(&err) => {
                        error!("fatal mqtt connection error: {err}");
                        self.set_state(SourceState::Disconnected(err.to_string()));
                        return Err(err.into());
                    }
                    Err(err) => {
                        let sleep = match self.backoff.next_sleep() {
                            Ok(sleep) => sleep,
                            Err(exhausted) => {
                                error!("giving up on broker: {exhausted}");
                                self.set_state(SourceState::Disconnected(err.to_string()));
                                return Err(exhausted.into());
                            }
                        };
                        warn!(
                            attempt = self.backoff.attempts(),
                            "mqtt connection lost ({err}), retrying in {:?}",
                            sleep
                        );
                        self.set_state(SourceState::Reconnecting(sleep.as_secs_f64()));
                        tokio::time::sleep(sleep).await;
                    }
                }
            }
        }
    }

    async fn handle_event(&mut self, event: Event) -> Result<(), SourceError> {
        match event {
            Event::Incoming(Packet::ConnAck(ack))
                if ack.code == ConnectReturnCode::Success =>
            {
                info!(host = %self.config.host, "connected to broker");
                self.backoff.reset();
                self.set_state(SourceState::Connected);
                self.subscribe_all().await?;
            }
            Event::Incoming(Packet::Publish(publish)) => {
                let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                debug!(topic = %publish.topic, payload = %payload, "reading received");
                self.queue.enqueue(RawEvent::new(publish.topic, payload));
            }
            Event::Incoming(Packet::Disconnect) => {
                warn!("broker sent disconnect");
                self.set_state(SourceState::Disconnected("broker disconnect".to_string()));
            }
            _ => {}
        }
        Ok(())
    }

    async fn subscribe_all(&mut self) -> Result<(), SourceError> {
        for topic in &self.config.topics {
            info!(topic = %topic, "subscribing");
            self.client.subscribe(topic, QoS::AtMostOnce).await?;
        }
        Ok(())
    }
}

/// Errors that reconnecting cannot fix.
fn is_fatal(err: &ConnectionError) -> bool {
    match err {
        ConnectionError::Tls(_) => true,
        ConnectionError::MqttState(_) => true,
        ConnectionError::NotConnAck(_) => true,
        ConnectionError::RequestsDone => true,
        ConnectionError::Io(io) => matches!(
            io.kind(),
            std::io::ErrorKind::AddrInUse
                | std::io::ErrorKind::PermissionDenied
                | std::io::ErrorKind::InvalidInput
                | std::io::ErrorKind::InvalidData
        ),
        ConnectionError::ConnectionRefused(code) => matches!(
            code,
            ConnectReturnCode::RefusedProtocolVersion
                | ConnectReturnCode::BadClientId
                | ConnectReturnCode::BadUserNamePassword
                | ConnectReturnCode::NotAuthorized
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use rumqttc::Publish;

    use super::*;
    use crate::core::queue::IngestQueue;

    fn test_config() -> MqttConfig {
        MqttConfig {
            host: "localhost".to_string(),
            topics: vec!["/+/+/temperature".to_string()],
            ..Default::default()
        }
    }

    fn source_with_queue() -> (MqttSource, IngestQueue) {
        let (handle, queue) = IngestQueue::channel();
        let source = MqttSource::new(test_config(), handle, CancellationToken::new());
        (source, queue)
    }

    #[test]
    fn test_io_error_classification() {
        let refused = ConnectionError::Io(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(!is_fatal(&refused));

        let denied = ConnectionError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(is_fatal(&denied));
    }

    #[test]
    fn test_auth_refusal_is_fatal_but_unavailable_is_not() {
        assert!(is_fatal(&ConnectionError::ConnectionRefused(
            ConnectReturnCode::NotAuthorized
        )));
        assert!(!is_fatal(&ConnectionError::ConnectionRefused(
            ConnectReturnCode::ServiceUnavailable
        )));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SourceState::Connecting.to_string(), "connecting");
        assert_eq!(SourceState::Connected.to_string(), "connected");
        assert_eq!(
            SourceState::Reconnecting(5.0).to_string(),
            "reconnecting in 5s"
        );
        assert_eq!(
            SourceState::Disconnected("shutdown".to_string()).to_string(),
            "disconnected: shutdown"
        );
        assert!(SourceState::Connected.is_connected());
        assert!(!SourceState::Connecting.is_connected());
    }

    #[tokio::test]
    async fn test_publish_event_lands_in_queue() {
        let (mut source, mut queue) = source_with_queue();

        let publish = Publish::new("/loc1/src2/temperature", QoS::AtMostOnce, "23.5");
        source
            .handle_event(Event::Incoming(Packet::Publish(publish)))
            .await
            .unwrap();

        let event = queue.dequeue().await.unwrap();
        assert_eq!(event.topic, "/loc1/src2/temperature");
        assert_eq!(event.payload, "23.5");
    }

    #[tokio::test]
    async fn test_connack_transitions_state_to_connected() {
        let (mut source, _queue) = source_with_queue();
        assert_eq!(*source.state().borrow(), SourceState::Connecting);

        let ack = rumqttc::ConnAck {
            session_present: false,
            code: ConnectReturnCode::Success,
        };
        source
            .handle_event(Event::Incoming(Packet::ConnAck(ack)))
            .await
            .unwrap();

        assert_eq!(*source.state().borrow(), SourceState::Connected);
    }
}
