//! 에코 세션 통합 테스트
//!
//! 에코 핸들러를 협력자로 붙인 서버에 실제 클라이언트로 접속해
//! 왕복 전송과 종료 처리를 검증합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use tokio_test::assert_ok;

use socketserver::{EchoHandler, ServerConfig, SocketServer};

fn test_config(max_connections: usize) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_connections,
        ..ServerConfig::default()
    }
}

async fn wait_listening(server: &SocketServer) -> SocketAddr {
    for _ in 0..100 {
        if let Some(addr) = server.local_addr().await {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("서버가 수신 대기 상태가 되지 않음");
}

async fn start_echo_server(max_connections: usize) -> (Arc<SocketServer>, SocketAddr) {
    let config = test_config(max_connections);
    let buffer_size = config.buffer_size;
    let server = Arc::new(SocketServer::new(config));

    let events = server.take_events().await.unwrap();
    let handler = EchoHandler::new(&server, buffer_size);
    tokio::spawn(async move {
        handler.run(events).await;
    });

    {
        let server = server.clone();
        tokio::spawn(async move { server.start().await });
    }

    let addr = wait_listening(&server).await;
    (server, addr)
}

/// 단일 클라이언트 에코 왕복 테스트
#[tokio::test]
async fn test_echo_round_trip() {
    let (server, addr) = start_echo_server(4).await;

    let mut client = TcpStream::connect(addr).await.unwrap();
    tokio_test::assert_ok!(client.write_all(b"ping").await);

    let mut buf = [0u8; 4];
    tokio_test::assert_ok!(client.read_exact(&mut buf).await);
    assert_eq!(&buf, b"ping", "에코 응답은 요청과 같아야 함");

    // 클라이언트 종료 후 슬롯이 해제되어야 함
    drop(client);
    let mut freed = false;
    for _ in 0..100 {
        if server.connection_count().await == 0 {
            freed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(freed, "클라이언트 종료 후 슬롯이 해제되어야 함");

    let stats = server.stats().await;
    assert_eq!(stats.total_accepted, 1);
    assert_eq!(stats.total_rejected, 0);

    server.stop();

    println!("✅ 에코 왕복 테스트 통과");
}

/// 복수 클라이언트 동시 에코 테스트
#[tokio::test]
async fn test_concurrent_echo_sessions() {
    let (server, addr) = start_echo_server(8).await;

    let mut tasks = Vec::new();
    for i in 0..5u8 {
        tasks.push(tokio::spawn(async move {
            let mut client = TcpStream::connect(addr).await.unwrap();
            let payload = vec![i; 16];
            client.write_all(&payload).await.unwrap();

            let mut buf = vec![0u8; 16];
            client.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, payload, "각 연결의 에코는 독립적이어야 함");
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }

    let stats = server.stats().await;
    assert_eq!(stats.total_accepted, 5);

    server.stop();

    println!("✅ 동시 에코 세션 테스트 통과");
}
