//! 에코 핸들러
//!
//! 서버 이벤트를 소비해 연결을 구성하고, 수신한 데이터를 그대로 되돌려
//! 보내는 데모 협력자입니다.

use std::sync::Weak;

use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::event::{ConnectionEvent, ServerEvent};
use crate::service::{ConnectionRegistry, SocketConnection, SocketServer};
use crate::tool::SimpleUtils;

/// 에코 핸들러
///
/// 수락 이벤트마다 연결 객체를 구성해 시작하고, 연결별 이벤트 소비
/// 태스크를 띄웁니다.
pub struct EchoHandler {
    registry: Weak<ConnectionRegistry>,
    buffer_size: usize,
}

impl EchoHandler {
    /// 새로운 에코 핸들러 생성
    pub fn new(server: &SocketServer, buffer_size: usize) -> Self {
        Self {
            registry: server.registry_handle(),
            buffer_size,
        }
    }

    /// 서버 이벤트 소비 루프 실행
    ///
    /// 서버가 중지되어 이벤트 채널이 닫히면 반환합니다.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<ServerEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                ServerEvent::ConnectionAccepted {
                    socket,
                    connection_id,
                } => {
                    self.attach_connection(socket, connection_id).await;
                }
                ServerEvent::ConnectionRejected { socket } => {
                    if let Ok(addr) = socket.peer_addr() {
                        warn!("연결 거부됨: {}", addr);
                    }
                }
                ServerEvent::StartFailed { error } => {
                    error!("서버 시작 실패: {}", error);
                }
            }
        }

        debug!("서버 이벤트 채널 종료");
    }

    /// 수락된 소켓을 연결로 구성하고 에코 루프 시작
    async fn attach_connection(&self, socket: TcpStream, connection_id: usize) {
        let connection =
            SocketConnection::new(socket, connection_id, self.registry.clone(), self.buffer_size);

        let mut conn_events = match connection.take_events().await {
            Some(events) => events,
            None => return,
        };

        if !connection.start().await {
            warn!("연결 {} 시작 실패", connection_id);
            return;
        }

        tokio::spawn(async move {
            while let Some(event) = conn_events.recv().await {
                match event {
                    ConnectionEvent::DataReceived(data) => {
                        debug!(
                            "연결 {} 수신 {}바이트: {}",
                            connection.connection_id(),
                            data.len(),
                            SimpleUtils::bytes_to_hex(&data)
                        );
                        if let Err(e) = connection.send_data(&data) {
                            warn!("연결 {} 에코 전송 실패: {}", connection.connection_id(), e);
                        }
                    }
                    ConnectionEvent::DataSending(data) => {
                        debug!(
                            "연결 {} 전송 예정 {}바이트",
                            connection.connection_id(),
                            data.len()
                        );
                    }
                    ConnectionEvent::SocketError(e) => {
                        warn!("연결 {} 소켓 에러: {}", connection.connection_id(), e);
                    }
                    ConnectionEvent::Closed { connection_id } => {
                        info!("연결 {} 종료", connection_id);
                        break;
                    }
                }
            }
        });
    }
}
