//! 소켓 서버
//!
//! 리스닝 소켓을 소유하고 수락 루프, 슬롯 기반 수용 제어, 서버 생명주기
//! 관리를 담당합니다. 서버는 연결 객체를 직접 소유하지 않으며, 수락된
//! 소켓을 이벤트로 소비자에게 넘깁니다.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::event::ServerEvent;
use crate::service::ConnectionRegistry;
use crate::tool::NetworkUtils;

/// 서버 인스턴스 id 발급기 (프로세스 내 고유)
static NEXT_SERVER_ID: AtomicUsize = AtomicUsize::new(1);

/// 서버 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerStats {
    pub current_connections: usize,
    pub peak_connections: usize,
    pub total_accepted: u64,
    pub total_rejected: u64,
    pub max_connections: usize,
    pub bind_address: String,
    pub started_at_timestamp: Option<i64>,
    pub uptime_seconds: u64,
}

/// 소켓 서버
///
/// 설정된 주소에서 인바운드 연결을 수락하고, 슬롯 레지스트리를 기준으로
/// 수용 여부를 결정합니다. 수락 루프는 한 번에 하나의 수락만 미결 상태로
/// 유지합니다.
pub struct SocketServer {
    server_id: usize,
    config: ServerConfig,
    registry: Arc<ConnectionRegistry>,
    listening: AtomicBool,
    local_addr: Mutex<Option<SocketAddr>>,
    stop_tx: watch::Sender<bool>,
    events: mpsc::UnboundedSender<ServerEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<ServerEvent>>>,
    stats: Arc<Mutex<ServerStats>>,
    started_at: Mutex<Option<Instant>>,
}

impl SocketServer {
    /// 새로운 소켓 서버 생성
    pub fn new(config: ServerConfig) -> Self {
        let server_id = NEXT_SERVER_ID.fetch_add(1, Ordering::SeqCst);
        let registry = Arc::new(ConnectionRegistry::new(config.max_connections));
        let (stop_tx, _) = watch::channel(false);
        let (events, event_rx) = mpsc::unbounded_channel();

        let stats = ServerStats {
            max_connections: config.max_connections,
            bind_address: config.bind_address(),
            ..ServerStats::default()
        };

        Self {
            server_id,
            config,
            registry,
            listening: AtomicBool::new(false),
            local_addr: Mutex::new(None),
            stop_tx,
            events,
            event_rx: Mutex::new(Some(event_rx)),
            stats: Arc::new(Mutex::new(stats)),
            started_at: Mutex::new(None),
        }
    }

    /// 기본 설정으로 서버 생성
    pub fn with_default_config() -> Self {
        Self::new(ServerConfig::default())
    }

    /// 서버 인스턴스 id 조회
    pub fn server_id(&self) -> usize {
        self.server_id
    }

    /// 수신 대기 여부 조회
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// 실제 바인드된 주소 조회 (시작 전에는 None)
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// 레지스트리 핸들 조회
    ///
    /// 연결 객체가 소속 슬롯을 등록/해제할 때 사용하는 비소유 핸들입니다.
    pub fn registry_handle(&self) -> Weak<ConnectionRegistry> {
        Arc::downgrade(&self.registry)
    }

    /// 현재 연결 수 조회
    pub async fn connection_count(&self) -> usize {
        self.registry.count().await
    }

    /// 서버 이벤트 수신자 획득 (최초 한 번만 반환)
    pub async fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ServerEvent>> {
        self.event_rx.lock().await.take()
    }

    /// 서버 시작
    ///
    /// 설정된 주소에 바인드하고 수락 루프에 진입합니다. `stop` 호출이나
    /// 치명적 리스너 에러가 발생할 때까지 호출한 태스크를 점유하므로
    /// 별도 태스크에서 실행하는 것을 전제로 합니다.
    pub async fn start(&self) -> Result<()> {
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!("소켓 서버 {}가 이미 실행 중입니다", self.server_id);
            return Ok(());
        }

        self.stop_tx.send_replace(false);

        // 이전 실행의 슬롯 점유 상태 폐기
        self.registry.clear().await;

        let bind_addr = self.config.bind_address();
        info!("🚀 소켓 서버 {} 시작 중... ({})", self.server_id, bind_addr);

        let socket_addr = match NetworkUtils::parse_socket_addr(&bind_addr) {
            Ok(addr) => addr,
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                let error = std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string());
                error!("리스너 시작 실패: {}", error);
                self.emit(ServerEvent::StartFailed { error });
                return Err(anyhow!("바인드 주소가 유효하지 않습니다: {}", bind_addr));
            }
        };

        let listener = match Self::bind_listener(socket_addr, self.config.backlog) {
            Ok(listener) => listener,
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                let message = e.to_string();
                error!("리스너 시작 실패: {} ({})", bind_addr, message);
                self.emit(ServerEvent::StartFailed { error: e });
                return Err(anyhow!("리스너 바인드 실패: {} ({})", bind_addr, message));
            }
        };

        *self.local_addr.lock().await = listener.local_addr().ok();
        *self.started_at.lock().await = Some(Instant::now());
        self.update_stats(|stats| {
            stats.started_at_timestamp = Some(chrono::Utc::now().timestamp());
        })
        .await;

        info!(
            "✅ 소켓 서버 {}가 {}에서 수신 대기 중입니다 (최대 연결 {})",
            self.server_id,
            bind_addr,
            self.registry.max_slots()
        );

        let result = self.accept_loop(&listener).await;

        self.listening.store(false, Ordering::SeqCst);
        self.registry.clear().await;
        info!("🛑 소켓 서버 {} 수락 루프 종료", self.server_id);

        result
    }

    /// 수락 루프
    ///
    /// 중지 신호는 각 수락 사이클 시작 시 확인합니다. 수락이 이미 완료된
    /// 소켓은 중지 신호와 동시에 도착하더라도 수용/거부 처리 후 루프를
    /// 종료합니다.
    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        let mut stop_rx = self.stop_tx.subscribe();

        loop {
            if *stop_rx.borrow() {
                info!("소켓 서버 {} 중지 신호 수신", self.server_id);
                return Ok(());
            }

            tokio::select! {
                biased;

                accepted = listener.accept() => {
                    match accepted {
                        Ok((socket, addr)) => {
                            self.admit_connection(socket, addr).await;
                        }
                        Err(e) => {
                            error!("연결 수락 실패: {}", e);
                            let message = e.to_string();
                            self.emit(ServerEvent::StartFailed { error: e });
                            return Err(anyhow!("리스너가 치명적 에러로 종료되었습니다: {}", message));
                        }
                    }
                }
                _ = stop_rx.changed() => {}
            }
        }
    }

    /// 수락된 소켓 수용 처리
    ///
    /// 수락 루프 안에서 직렬로 실행되므로 슬롯 계산이 경쟁하지 않습니다.
    /// 슬롯이 가득 차면 연결 객체를 만들지 않고 거부합니다.
    async fn admit_connection(&self, socket: TcpStream, addr: SocketAddr) {
        if self.registry.is_full().await {
            warn!(
                "⚠️ 최대 연결 수 초과로 연결 거부: {} ({}/{})",
                addr,
                self.registry.count().await,
                self.registry.max_slots()
            );
            self.reject_connection(socket).await;
            return;
        }

        let connection_id = self.registry.first_available_slot().await;
        self.registry.add(connection_id).await;

        let current = self.registry.count().await;
        self.update_stats(|stats| {
            stats.total_accepted += 1;
            stats.current_connections = current;
            stats.peak_connections = stats.peak_connections.max(current);
        })
        .await;

        info!("새 연결 수락: {} (연결 id {})", addr, connection_id);
        self.emit(ServerEvent::ConnectionAccepted {
            socket,
            connection_id,
        });
    }

    /// 연결 거부 처리
    ///
    /// 소켓 정리는 최선 노력으로 수행하고, 소켓 소유권은 거부 이벤트와
    /// 함께 소비자에게 넘깁니다.
    async fn reject_connection(&self, mut socket: TcpStream) {
        if let Err(e) = socket.shutdown().await {
            debug!("거부된 소켓 종료 실패: {}", e);
        }

        self.update_stats(|stats| {
            stats.total_rejected += 1;
        })
        .await;

        self.emit(ServerEvent::ConnectionRejected { socket });
    }

    /// 서버 중지 요청
    ///
    /// 어느 태스크에서든 호출 가능하며, 진행 중인 수락 사이클이 끝나는
    /// 대로 수락 루프가 반환됩니다. 이미 중지된 서버에 대한 호출은
    /// 무시됩니다.
    pub fn stop(&self) {
        if !self.is_listening() {
            warn!("소켓 서버 {}가 이미 중지되어 있습니다", self.server_id);
            return;
        }

        info!("🛑 소켓 서버 {} 중지 요청", self.server_id);
        self.stop_tx.send_replace(true);
    }

    /// 서버 통계 조회
    pub async fn stats(&self) -> ServerStats {
        let mut stats = self.stats.lock().await.clone();

        stats.current_connections = self.registry.count().await;
        stats.peak_connections = stats.peak_connections.max(stats.current_connections);
        if let Some(started_at) = *self.started_at.lock().await {
            stats.uptime_seconds = started_at.elapsed().as_secs();
        }

        stats
    }

    /// 백로그 길이를 적용해 리스너 생성
    fn bind_listener(addr: SocketAddr, backlog: u32) -> std::io::Result<TcpListener> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true).ok();
        socket.bind(&addr.into())?;
        socket.listen(backlog as i32)?;

        let std_listener: std::net::TcpListener = socket.into();
        std_listener.set_nonblocking(true)?;

        TcpListener::from_std(std_listener)
    }

    /// 서버 통계 갱신 (경합 시 갱신 생략)
    async fn update_stats<F>(&self, update_fn: F)
    where
        F: FnOnce(&mut ServerStats),
    {
        if let Ok(mut stats) = self.stats.try_lock() {
            update_fn(&mut stats);
        }
    }

    /// 이벤트 발신 (수신자가 사라진 경우 무시)
    fn emit(&self, event: ServerEvent) {
        if self.events.send(event).is_err() {
            debug!("소켓 서버 {} 이벤트 수신자 없음", self.server_id);
        }
    }
}
