//! 공통 에러 처리 시스템
//!
//! 소켓 서버에서 발생하는 에러를 체계적으로 관리합니다.

use thiserror::Error;
use tracing::{error, info, warn};

/// 소켓 서버 에러 타입
///
/// 서버와 연결에서 발생할 수 있는 에러를 체계적으로 분류합니다.
#[derive(Error, Debug)]
pub enum SocketServerError {
    /// 연결 관련 에러
    #[error("연결 에러 [연결 {connection_id}]: {message}")]
    Connection {
        connection_id: usize,
        message: String,
    },

    /// 네트워크 I/O 에러
    #[error("네트워크 에러 [작업: {operation}]: {source}")]
    Network {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// 인자 검증 에러
    #[error("인자 에러: {0}")]
    InvalidArgument(String),

    /// 설정 관련 에러
    #[error("설정 에러 [키: {key}]: {message}")]
    Configuration { key: String, message: String },

    /// 내부 시스템 에러
    #[error("내부 에러 [컴포넌트: {component}]: {message}")]
    Internal { component: String, message: String },
}

/// 에러 생성 헬퍼 함수들
impl SocketServerError {
    /// 연결 에러 생성
    pub fn connection_error(connection_id: usize, message: &str) -> Self {
        Self::Connection {
            connection_id,
            message: message.to_string(),
        }
    }

    /// 설정 에러 생성
    pub fn configuration_error(key: &str, message: &str) -> Self {
        Self::Configuration {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<std::io::Error> for SocketServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Network {
            operation: "io_operation".to_string(),
            source: err,
        }
    }
}

/// 에러 심각도 레벨
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorSeverity {
    /// 정보성 - 정상 동작 중 발생하는 예상 가능한 상황
    Info,
    /// 경고 - 주의가 필요하지만 서비스는 계속 가능
    Warning,
    /// 에러 - 기능에 영향을 주지만 복구 가능
    Error,
    /// 치명적 - 서비스 중단이 필요한 심각한 문제
    Critical,
}

/// 에러 핸들러
///
/// 에러를 심각도에 맞는 로그 레벨로 중앙에서 기록합니다.
pub struct ErrorHandler;

impl ErrorHandler {
    /// 에러를 처리하고 로깅합니다.
    ///
    /// # Arguments
    ///
    /// * `error` - 처리할 에러
    /// * `severity` - 에러 심각도
    /// * `component` - 에러가 발생한 컴포넌트
    /// * `operation` - 에러가 발생한 작업
    pub fn handle_error(
        error: &SocketServerError,
        severity: ErrorSeverity,
        component: &str,
        operation: &str,
    ) {
        let log_message = format!("[{}] [{}] {}", component, operation, error);

        match severity {
            ErrorSeverity::Info => info!("{}", log_message),
            ErrorSeverity::Warning => warn!("{}", log_message),
            ErrorSeverity::Error => error!("{}", log_message),
            ErrorSeverity::Critical => {
                error!("🚨 CRITICAL: {}", log_message);
            }
        }
    }
}

/// 결과 타입 별칭
pub type SocketResult<T> = Result<T, SocketServerError>;
