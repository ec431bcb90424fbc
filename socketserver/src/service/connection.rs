//! 소켓 연결
//!
//! 수락된 소켓 하나를 소유하고 수신 루프, 비동기 전송, 멱등 종료를
//! 담당합니다. 수신 루프는 연결당 하나의 수신만 미결 상태로 유지하며,
//! 종료 시 소속 서버의 레지스트리에서 자신의 슬롯을 해제합니다.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::event::ConnectionEvent;
use crate::service::ConnectionRegistry;
use crate::tool::error::{ErrorHandler, ErrorSeverity, SocketResult, SocketServerError};
use crate::tool::NetworkUtils;

/// 기본 수신 버퍼 크기 (바이트)
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// 서버에 소속되지 않은 연결의 id
pub const STANDALONE_CONNECTION_ID: usize = 0;

/// 소켓 연결
///
/// 이미 연결된 소켓으로 생성되며, `start` 호출 시 수신 루프가 시작됩니다.
/// 복제본은 같은 연결 상태를 공유하므로 태스크 간에 자유롭게 전달할 수
/// 있습니다. 종료는 멱등적이며 `Closed` 이벤트는 연결당 정확히 한 번
/// 발생합니다.
#[derive(Clone)]
pub struct SocketConnection {
    connection_id: usize,
    peer_addr: Option<SocketAddr>,
    buffer_size: usize,
    stream: Arc<Mutex<Option<TcpStream>>>,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
    connected: Arc<AtomicBool>,
    closing: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
    recv_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    registry: Weak<ConnectionRegistry>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    event_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<ConnectionEvent>>>>,
}

impl SocketConnection {
    /// 서버 소속 연결 생성
    ///
    /// 수락 이벤트로 전달받은 소켓과 연결 id, 서버의 레지스트리 핸들로
    /// 연결을 구성합니다.
    pub fn new(
        socket: TcpStream,
        connection_id: usize,
        registry: Weak<ConnectionRegistry>,
        buffer_size: usize,
    ) -> Self {
        let peer_addr = socket.peer_addr().ok();
        let (events, event_rx) = mpsc::unbounded_channel();

        Self {
            connection_id,
            peer_addr,
            buffer_size,
            stream: Arc::new(Mutex::new(Some(socket))),
            writer: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(peer_addr.is_some())),
            closing: Arc::new(AtomicBool::new(false)),
            disposed: Arc::new(AtomicBool::new(false)),
            recv_task: Arc::new(Mutex::new(None)),
            registry,
            events,
            event_rx: Arc::new(Mutex::new(Some(event_rx))),
        }
    }

    /// 서버에 소속되지 않은 연결 생성 (연결 id 0)
    pub fn standalone(socket: TcpStream, buffer_size: usize) -> Self {
        Self::new(socket, STANDALONE_CONNECTION_ID, Weak::new(), buffer_size)
    }

    /// 아웃바운드 연결 헬퍼
    ///
    /// 주어진 주소로 연결하고 서버에 소속되지 않은 연결을 생성합니다.
    pub async fn connect(addr: &str, buffer_size: usize) -> Result<Self> {
        let socket_addr = NetworkUtils::parse_socket_addr(addr)?;
        let socket = TcpStream::connect(socket_addr)
            .await
            .with_context(|| format!("아웃바운드 연결 실패: {}", addr))?;

        info!("아웃바운드 연결 성공: {}", addr);
        Ok(Self::standalone(socket, buffer_size))
    }

    /// 연결 id 조회
    pub fn connection_id(&self) -> usize {
        self.connection_id
    }

    /// 상대방 주소 조회
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// 연결 상태 조회
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// 해제 여부 조회
    pub fn disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// 이벤트 수신자 획득 (최초 한 번만 반환)
    pub async fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ConnectionEvent>> {
        self.event_rx.lock().await.take()
    }

    /// 수신 루프 시작
    ///
    /// 소켓이 연결 상태가 아니거나 수신 루프를 시작할 수 없으면 정리 후
    /// false를 반환합니다. 성공 시 소속 레지스트리에 슬롯을 등록하고
    /// true를 반환하며, 데이터 도착을 기다리지 않고 즉시 반환합니다.
    pub async fn start(&self) -> bool {
        if self.disposed.load(Ordering::SeqCst) {
            return false;
        }

        if !self.connected.load(Ordering::SeqCst) {
            self.disconnect().await;
            return false;
        }

        let taken = self.stream.lock().await.take();
        let stream = match taken {
            Some(stream) => stream,
            // 이미 시작되었거나 해제 진행 중인 연결
            None => return false,
        };

        if stream.peer_addr().is_err() {
            self.disconnect().await;
            return false;
        }

        // 소속 서버가 있으면 슬롯 등록 (수락 경로의 등록과 멱등)
        if let Some(registry) = self.registry.upgrade() {
            registry.add(self.connection_id).await;
        }

        let (read_half, write_half) = stream.into_split();
        *self.writer.lock().await = Some(write_half);

        let conn = self.clone();
        let handle = tokio::spawn(async move {
            conn.receive_loop(read_half).await;
        });
        *self.recv_task.lock().await = Some(handle);

        debug!("연결 {} 수신 루프 시작", self.connection_id);
        true
    }

    /// 수신 루프
    ///
    /// 고정 크기 버퍼로 수신을 반복합니다. 0바이트 수신(상대방 정상 종료),
    /// 소켓 에러, 해제 감지 시 루프를 빠져나오며 종료 절차로 이어집니다.
    async fn receive_loop(&self, mut read_half: tokio::net::tcp::OwnedReadHalf) {
        let mut buffer = vec![0u8; self.buffer_size];

        loop {
            if self.disposed.load(Ordering::SeqCst) {
                break;
            }

            match read_half.read(&mut buffer).await {
                Ok(0) => {
                    debug!("연결 {} 상대방 정상 종료", self.connection_id);
                    self.disconnect().await;
                    break;
                }
                Ok(received) => {
                    // 공유 버퍼는 다음 수신에서 재사용되므로 독립 복사본을 전달
                    let data = buffer[..received].to_vec();
                    self.emit(ConnectionEvent::DataReceived(data));
                }
                Err(e) => {
                    if !self.disposed.load(Ordering::SeqCst) {
                        let error = SocketServerError::connection_error(
                            self.connection_id,
                            &e.to_string(),
                        );
                        ErrorHandler::handle_error(
                            &error,
                            ErrorSeverity::Warning,
                            "SocketConnection",
                            "receive_loop",
                        );
                        self.emit(ConnectionEvent::SocketError(e));
                    }
                    self.disconnect().await;
                    break;
                }
            }
        }
    }

    /// 데이터 비동기 전송
    ///
    /// 전송 직전 `DataSending` 이벤트를 발생시킨 뒤 전체 버퍼 전송을
    /// 예약합니다. 전송 에러는 `SocketError` 이벤트와 종료 절차로 이어지며
    /// 호출자에게 전파되지 않습니다. 빈 데이터는 인자 에러로 즉시 거부되고
    /// 어떤 이벤트도 발생하지 않습니다.
    pub fn send_data(&self, data: &[u8]) -> SocketResult<()> {
        if data.is_empty() {
            return Err(SocketServerError::InvalidArgument(
                "전송할 데이터가 비어 있습니다".to_string(),
            ));
        }

        let payload = data.to_vec();
        self.emit(ConnectionEvent::DataSending(payload.clone()));

        let conn = self.clone();
        tokio::spawn(async move {
            match conn.write_payload(&payload).await {
                Ok(true) => {}
                // 해제된 연결에 대한 전송은 종료 처리로 흡수
                Ok(false) => conn.disconnect().await,
                Err(e) => {
                    let error =
                        SocketServerError::connection_error(conn.connection_id, &e.to_string());
                    ErrorHandler::handle_error(
                        &error,
                        ErrorSeverity::Warning,
                        "SocketConnection",
                        "send_data",
                    );
                    conn.emit(ConnectionEvent::SocketError(e));
                    conn.disconnect().await;
                }
            }
        });

        Ok(())
    }

    /// 전송 대상 소켓에 전체 버퍼 기록
    ///
    /// 수신 루프가 시작된 연결은 쓰기 반쪽으로, 시작 전의 연결은 원본
    /// 스트림으로 전송합니다. 소켓이 이미 반납된 경우 false를 반환합니다.
    async fn write_payload(&self, payload: &[u8]) -> std::io::Result<bool> {
        let mut writer = self.writer.lock().await;
        if let Some(write_half) = writer.as_mut() {
            write_half.write_all(payload).await?;
            return Ok(true);
        }
        drop(writer);

        let mut stream = self.stream.lock().await;
        if let Some(socket) = stream.as_mut() {
            socket.write_all(payload).await?;
            return Ok(true);
        }

        Ok(false)
    }

    /// 연결 종료 (멱등)
    ///
    /// 쓰기 방향 종료를 시도하고, 아직 해제되지 않았다면 `Closed` 이벤트를
    /// 정확히 한 번 발생시킨 뒤 자원을 해제합니다. 이미 종료 절차가 시작된
    /// 연결에 대한 호출은 무시됩니다.
    pub async fn disconnect(&self) {
        if self.closing.swap(true, Ordering::SeqCst) {
            return;
        }

        if self.connected.swap(false, Ordering::SeqCst) {
            // 종료 시도 실패와 무관하게 종료 절차는 계속 진행
            let mut writer = self.writer.lock().await;
            if let Some(write_half) = writer.as_mut() {
                if let Err(e) = write_half.shutdown().await {
                    debug!("연결 {} 소켓 종료 실패: {}", self.connection_id, e);
                }
            }
        }

        if !self.disposed.load(Ordering::SeqCst) {
            self.emit(ConnectionEvent::Closed {
                connection_id: self.connection_id,
            });
            self.dispose().await;
        }
    }

    /// 자원 해제 (첫 호출만 유효)
    ///
    /// 소켓 핸들을 반납하고, 소속 서버가 있으면 레지스트리에서 슬롯을
    /// 해제합니다.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.connected.store(false, Ordering::SeqCst);
        *self.stream.lock().await = None;
        *self.writer.lock().await = None;

        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.connection_id).await;
        }

        info!("연결 {} 해제 완료", self.connection_id);

        // 미결 수신은 태스크 취소로 정리 (수신 루프 내부에서의 해제면 이미 종료 직전)
        if let Some(handle) = self.recv_task.lock().await.take() {
            handle.abort();
        }
    }

    /// 이벤트 발신 (수신자가 사라진 경우 무시)
    fn emit(&self, event: ConnectionEvent) {
        if self.events.send(event).is_err() {
            debug!("연결 {} 이벤트 수신자 없음", self.connection_id);
        }
    }
}
