//! 비동기 TCP 소켓 서버 라이브러리
//!
//! 인바운드 TCP 연결을 설정된 한도까지 수락하고, 수락된 소켓마다 버퍼
//! 기반 비동기 수신/전송을 수행하는 연결 객체를 제공하는 최소 프레임워크
//! 구현입니다.
//!
//! # 주요 기능
//!
//! - **수용 제어**: 슬롯 레지스트리 기반 최대 연결 수 제한과 거부 처리
//! - **슬롯 재사용**: 해제된 연결 id 중 가장 작은 값을 우선 재할당
//! - **연결 생명주기**: 수신 루프, 비동기 전송, 멱등 종료 상태 기계
//! - **이벤트 통지**: 수락/거부/수신/전송/에러/종료 이벤트 채널
//! - **에러 처리**: 체계적인 에러 분류와 심각도 기반 로깅
//!
//! # 아키텍처
//!
//! ```text
//! Socket Server
//! ├── Service Layer (핵심 로직)
//! │   ├── SocketServer (수락 루프, 수용 제어)
//! │   ├── ConnectionRegistry (슬롯 추적)
//! │   └── SocketConnection (연결 상태 기계)
//! ├── Handler Layer (이벤트 소비)
//! │   └── EchoHandler (에코 데모 협력자)
//! ├── Event (이벤트 정의)
//! │   ├── ServerEvent (수락/거부/시작 실패)
//! │   └── ConnectionEvent (수신/전송/에러/종료)
//! └── Tool Layer (유틸리티)
//!     ├── SimpleUtils (기본 유틸)
//!     ├── NetworkUtils (네트워크 유틸)
//!     └── Error (에러 처리)
//! ```
//!
//! # 사용 예시
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use socketserver::{EchoHandler, ServerConfig, SocketServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     let server = Arc::new(SocketServer::new(config.clone()));
//!
//!     // 이벤트 소비자 연결
//!     let events = server.take_events().await.unwrap();
//!     let handler = EchoHandler::new(&server, config.buffer_size);
//!     tokio::spawn(async move { handler.run(events).await });
//!
//!     // 수락 루프 진입 (stop 호출 시까지 블로킹)
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

/// 환경 설정 관리
///
/// 서버 실행에 필요한 환경변수 및 설정을 관리합니다.
pub mod config;

/// 생명주기 이벤트 정의
///
/// 서버와 연결이 소비자에게 전달하는 이벤트 타입들을 정의합니다.
pub mod event;

/// 핵심 서비스 레이어
///
/// 서버, 슬롯 레지스트리, 연결 상태 기계를 포함합니다.
pub mod service;

/// 이벤트 핸들러 레이어
///
/// 서버 이벤트를 소비해 연결을 구성하는 협력자들을 포함합니다.
pub mod handler;

/// 공통 유틸리티 도구들
///
/// 데이터 변환, 에러 처리, 네트워크 유틸리티를 포함합니다.
pub mod tool;

/// 통합 테스트 지원 모듈
///
/// 테스트 헬퍼와 기능별 테스트들을 포함합니다.
pub mod tests;

/// 환경 설정 타입들
pub use config::{validate_config, ServerConfig};

/// 이벤트 타입들
pub use event::{ConnectionEvent, ServerEvent};

/// 핵심 서비스 타입들
pub use service::{ConnectionRegistry, ServerStats, SocketConnection, SocketServer};

/// 에코 데모 핸들러
pub use handler::EchoHandler;

/// 기본 유틸리티
pub use tool::SimpleUtils;
