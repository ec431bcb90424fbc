//! 네트워크 유틸리티
//!
//! IP 주소 파싱, 포트 검증, 연결 테스트 기능을 제공합니다.

use anyhow::{anyhow, Result};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// 네트워크 유틸리티
pub struct NetworkUtils;

impl NetworkUtils {
    /// IP 주소 문자열 파싱
    ///
    /// 문자열을 IpAddr로 파싱합니다. IPv4와 IPv6를 모두 지원합니다.
    pub fn parse_ip(ip_str: &str) -> Result<IpAddr> {
        ip_str
            .parse::<IpAddr>()
            .map_err(|e| anyhow!("IP 주소 파싱 실패: {} ({})", ip_str, e))
    }

    /// 소켓 주소 파싱
    pub fn parse_socket_addr(addr_str: &str) -> Result<SocketAddr> {
        addr_str
            .parse::<SocketAddr>()
            .map_err(|e| anyhow!("소켓 주소 파싱 실패: {} ({})", addr_str, e))
    }

    /// 포트 번호 검증
    pub fn validate_port(port: u16) -> Result<u16> {
        match port {
            0 => Err(anyhow!("포트 0은 사용할 수 없습니다")),
            1..=1023 => {
                warn!("시스템 포트 사용: {} (권한 필요 가능)", port);
                Ok(port)
            }
            _ => Ok(port),
        }
    }

    /// 연결 테스트 (타임아웃 포함)
    pub async fn test_connection(addr: &str, timeout_secs: u64) -> Result<bool> {
        let socket_addr = Self::parse_socket_addr(addr)?;

        match timeout(
            Duration::from_secs(timeout_secs),
            TcpStream::connect(socket_addr),
        )
        .await
        {
            Ok(Ok(_)) => {
                debug!("연결 테스트 성공: {}", addr);
                Ok(true)
            }
            Ok(Err(e)) => {
                debug!("연결 실패: {} ({})", addr, e);
                Ok(false)
            }
            Err(_) => {
                debug!("연결 타임아웃: {} ({}초)", addr, timeout_secs);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip() {
        assert!(NetworkUtils::parse_ip("192.168.1.1").is_ok());
        assert!(NetworkUtils::parse_ip("::1").is_ok());
        assert!(NetworkUtils::parse_ip("잘못된 주소").is_err());

        println!("✅ IP 파싱 테스트 통과");
    }

    #[test]
    fn test_parse_socket_addr() {
        let addr = NetworkUtils::parse_socket_addr("127.0.0.1:4000").unwrap();
        assert_eq!(addr.port(), 4000);
        assert!(NetworkUtils::parse_socket_addr("127.0.0.1").is_err(), "포트 없는 주소는 실패해야 함");

        println!("✅ 소켓 주소 파싱 테스트 통과");
    }

    #[test]
    fn test_validate_port() {
        assert!(NetworkUtils::validate_port(0).is_err());
        assert!(NetworkUtils::validate_port(80).is_ok());
        assert!(NetworkUtils::validate_port(4000).is_ok());
        assert!(NetworkUtils::validate_port(65535).is_ok());

        println!("✅ 포트 검증 테스트 통과");
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // 닫힌 포트로의 연결은 false를 반환해야 함
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let reachable = NetworkUtils::test_connection(&addr.to_string(), 1).await.unwrap();
        assert!(!reachable, "닫힌 포트 연결은 실패해야 함");

        println!("✅ 연결 테스트 통과");
    }
}
