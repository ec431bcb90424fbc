//! 에코 데모 서버
//!
//! 라이브러리의 외부 협력자 예시입니다. 서버 이벤트를 소비해 연결을
//! 구성하고, 수신한 데이터를 그대로 되돌려 보냅니다.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};

use socketserver::{validate_config, EchoHandler, ServerConfig, SocketServer};

/// 에코 데모 서버 메인 진입점
///
/// 환경변수:
/// - tcp_host: 바인드 호스트 (기본값: "127.0.0.1")
/// - tcp_port: 바인드 포트 (기본값: "4000")
/// - max_connections: 최대 동시 연결 수 (기본값: "1000")
/// - backlog: 수락 대기 큐 길이 (기본값: "100")
/// - recv_buffer_size: 수신 버퍼 크기 (기본값: "1024")
#[tokio::main]
async fn main() -> Result<()> {
    // 로깅 설정
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // 환경 설정 로드
    let config = ServerConfig::from_env()?;

    // 설정 검증
    validate_config(&config)?;

    info!("=== 에코 데모 서버 설정 ===");
    info!("바인드 주소: {}", config.bind_address());
    info!("최대 연결 수: {}", config.max_connections);
    info!("수락 대기 큐: {}", config.backlog);
    info!("수신 버퍼 크기: {}바이트", config.buffer_size);
    info!("==========================");

    // 서버 생성 및 이벤트 소비자 연결
    let server = Arc::new(SocketServer::new(config.clone()));
    let events = server
        .take_events()
        .await
        .context("서버 이벤트 수신자를 가져올 수 없습니다")?;

    let handler = EchoHandler::new(&server, config.buffer_size);
    tokio::spawn(async move {
        handler.run(events).await;
    });

    // 수락 루프 시작
    let server_task = {
        let server = server.clone();
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                error!("소켓 서버 실행 오류: {}", e);
            }
        })
    };

    // 종료 시그널 대기
    tokio::signal::ctrl_c().await?;
    info!("종료 시그널 수신, 서버를 중지합니다...");

    server.stop();
    let _ = server_task.await;

    // 최종 통계 출력
    let stats = server.stats().await;
    info!("서버 최종 통계: {}", serde_json::to_string(&stats)?);

    Ok(())
}
