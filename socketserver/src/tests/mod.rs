//! 소켓 서버 테스트 모듈
//!
//! 각 기능별로 분리된 테스트 파일들을 관리합니다.


// 테스트 유틸리티
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ServerConfig;
use crate::service::{ConnectionRegistry, SocketServer};

/// 테스트용 서버 설정 생성 (임시 포트)
pub fn test_config(max_connections: usize) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections,
        ..ServerConfig::default()
    }
}

/// 테스트용 소켓 서버 생성
pub fn create_test_server(max_connections: usize) -> Arc<SocketServer> {
    Arc::new(SocketServer::new(test_config(max_connections)))
}

/// 테스트용 레지스트리 생성
pub fn create_test_registry(max_slots: usize) -> Arc<ConnectionRegistry> {
    Arc::new(ConnectionRegistry::new(max_slots))
}

/// 테스트용 연결 쌍 생성 (서버 측 스트림, 클라이언트 스트림)
pub async fn create_stream_pair() -> std::io::Result<(TcpStream, TcpStream)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let client = TcpStream::connect(addr).await?;
    let (server_side, _) = listener.accept().await?;
    Ok((server_side, client))
}

/// 서버가 수신 대기 주소를 가질 때까지 대기
pub async fn wait_until_listening(server: &SocketServer) -> Option<std::net::SocketAddr> {
    for _ in 0..100 {
        if let Some(addr) = server.local_addr().await {
            return Some(addr);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

/// 조건이 참이 될 때까지 대기 (최대 1초)
pub async fn wait_for<F, Fut>(mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
