//! 간단한 공통 유틸리티

use std::time::{SystemTime, UNIX_EPOCH};

/// 간단한 데이터 유틸리티
pub struct SimpleUtils;

impl SimpleUtils {
    /// 현재 타임스탬프 (초)
    ///
    /// 현재 시간을 Unix 타임스탬프(초 단위)로 반환합니다.
    /// 시스템 시간을 사용하며, 오류 시 0을 반환합니다.
    pub fn current_timestamp() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// 바이트를 16진수로 변환
    ///
    /// 바이트 배열을 소문자 16진수 문자열로 변환합니다.
    /// 각 바이트는 2자리 16진수로 표현됩니다.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use socketserver::tool::SimpleUtils;
    ///
    /// let bytes = b"Hello";
    /// let hex = SimpleUtils::bytes_to_hex(bytes);
    /// assert_eq!(hex, "48656c6c6f");
    /// ```
    pub fn bytes_to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// 16진수를 바이트로 변환
    ///
    /// 16진수 문자열을 바이트 배열로 변환합니다.
    /// "0x" 접두사는 자동으로 제거되며, 대소문자를 구분하지 않습니다.
    ///
    /// # Errors
    ///
    /// * "홀수 길이 16진수" - 16진수 길이가 홀수인 경우
    /// * "잘못된 16진수" - 16진수가 아닌 문자가 포함된 경우
    pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, &'static str> {
        let hex = hex.trim().replace("0x", "");

        if hex.len() % 2 != 0 {
            return Err("홀수 길이 16진수");
        }

        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| "잘못된 16진수"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_hex_roundtrip() {
        let bytes = b"Hello";
        let hex = SimpleUtils::bytes_to_hex(bytes);
        assert_eq!(hex, "48656c6c6f");

        let restored = SimpleUtils::hex_to_bytes(&hex).unwrap();
        assert_eq!(restored, bytes);

        println!("✅ 16진수 변환 테스트 통과");
    }

    #[test]
    fn test_invalid_hex() {
        assert!(SimpleUtils::hex_to_bytes("abc").is_err(), "홀수 길이는 실패해야 함");
        assert!(SimpleUtils::hex_to_bytes("zz").is_err(), "16진수가 아닌 문자는 실패해야 함");

        println!("✅ 잘못된 16진수 테스트 통과");
    }

    #[test]
    fn test_current_timestamp() {
        let timestamp = SimpleUtils::current_timestamp();
        assert!(timestamp > 0, "타임스탬프는 0보다 커야 함");

        println!("✅ 타임스탬프 테스트 통과");
    }
}
