//! 소켓 서버 환경 설정 모듈
//!
//! .env 파일과 환경변수에서 서버 설정을 로드하고 검증합니다.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::tool::NetworkUtils;

/// 소켓 서버 설정 구조체
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 바인드 호스트 주소
    pub host: String,
    /// 바인드 포트 번호
    pub port: u16,
    /// 최대 동시 연결 수
    pub max_connections: usize,
    /// 수락 대기 큐 길이
    pub backlog: u32,
    /// 연결당 수신 버퍼 크기 (바이트)
    pub buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            max_connections: 1000,
            backlog: 100,
            buffer_size: 1024,
        }
    }
}

impl ServerConfig {
    /// 환경변수에서 설정을 로드합니다.
    ///
    /// 로드 순서:
    /// 1. .env 파일
    /// 2. 시스템 환경변수
    /// 3. 기본값
    ///
    /// 환경변수:
    /// - tcp_host: 바인드 호스트 (기본값: "127.0.0.1")
    /// - tcp_port: 바인드 포트 (기본값: "4000")
    /// - max_connections: 최대 동시 연결 수 (기본값: "1000")
    /// - backlog: 수락 대기 큐 길이 (기본값: "100")
    /// - recv_buffer_size: 수신 버퍼 크기 (기본값: "1024")
    pub fn from_env() -> Result<Self> {
        // .env 파일 로드 시도
        Self::load_env_file();

        let defaults = Self::default();

        // 환경변수에서 값 읽기 (기본값 포함)
        let config = Self {
            host: std::env::var("tcp_host").unwrap_or(defaults.host),
            port: std::env::var("tcp_port")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(defaults.port),
            max_connections: std::env::var("max_connections")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(defaults.max_connections),
            backlog: std::env::var("backlog")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(defaults.backlog),
            buffer_size: std::env::var("recv_buffer_size")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .unwrap_or(defaults.buffer_size),
        };

        info!("소켓 서버 설정 로드 완료: {:?}", config);
        Ok(config)
    }

    /// 바인드 주소를 반환합니다.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// .env 파일을 로드합니다.
    fn load_env_file() {
        // 여러 위치에서 .env 파일 찾기
        let env_paths = vec![
            "../.env",    // 상위 디렉토리
            ".env",       // 현재 디렉토리
            "../../.env", // 프로젝트 루트
        ];

        let mut loaded = false;
        for path in env_paths {
            if Path::new(path).exists() && dotenv::from_filename(path).is_ok() {
                info!(".env 파일 로드 성공: {}", path);
                loaded = true;
                break;
            }
        }

        if !loaded {
            warn!(".env 파일을 찾을 수 없습니다. 기본값과 시스템 환경변수를 사용합니다.");
        }
    }
}

/// 설정 검증 유틸리티
pub fn validate_config(config: &ServerConfig) -> Result<()> {
    NetworkUtils::validate_port(config.port)?;

    if config.host.is_empty() {
        anyhow::bail!("바인드 호스트 주소가 비어있습니다");
    }

    if config.max_connections == 0 {
        anyhow::bail!("최대 연결 수는 1 이상이어야 합니다");
    }

    if config.backlog == 0 {
        anyhow::bail!("수락 대기 큐 길이는 1 이상이어야 합니다");
    }

    if config.buffer_size == 0 {
        anyhow::bail!("수신 버퍼 크기는 1 이상이어야 합니다");
    }

    Ok(())
}
