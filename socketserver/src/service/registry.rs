//! 연결 슬롯 레지스트리
//!
//! 서버별 연결 슬롯 점유 상태를 추적하고 빈 슬롯 할당을 담당합니다.

use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::debug;

/// 연결 슬롯 레지스트리
///
/// 하나의 서버 인스턴스에 소속되어 점유된 슬롯 id 집합과 최대 슬롯 수를
/// 관리합니다. 수락 경로와 연결 해제 경로가 동시에 접근하므로 모든 연산은
/// 단일 뮤텍스로 직렬화됩니다.
pub struct ConnectionRegistry {
    slots: Mutex<HashSet<usize>>,
    max_slots: usize,
}

impl ConnectionRegistry {
    /// 새로운 레지스트리 생성
    pub fn new(max_slots: usize) -> Self {
        Self {
            slots: Mutex::new(HashSet::new()),
            max_slots,
        }
    }

    /// 최대 슬롯 수 조회
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// 점유된 슬롯 수 조회
    pub async fn count(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// 슬롯이 가득 찼는지 확인
    pub async fn is_full(&self) -> bool {
        self.slots.lock().await.len() >= self.max_slots
    }

    /// 첫 번째 사용 가능한 슬롯 id 조회
    ///
    /// 점유 집합에 없는 가장 작은 id를 반환합니다. 해제된 슬롯이 있으면
    /// 그 id를 재사용하고, 빈 구멍이 없으면 현재 점유 수를 새 id로
    /// 반환합니다.
    pub async fn first_available_slot(&self) -> usize {
        let slots = self.slots.lock().await;
        let count = slots.len();
        (0..count).find(|id| !slots.contains(id)).unwrap_or(count)
    }

    /// 슬롯 점유 (이미 점유된 id는 무시)
    pub async fn add(&self, slot_id: usize) {
        let mut slots = self.slots.lock().await;
        if slots.insert(slot_id) {
            debug!(
                "슬롯 {} 점유: {}/{} 슬롯 사용 중",
                slot_id,
                slots.len(),
                self.max_slots
            );
        }
    }

    /// 슬롯 해제 (점유되지 않은 id는 무시)
    pub async fn remove(&self, slot_id: usize) {
        let mut slots = self.slots.lock().await;
        if slots.remove(&slot_id) {
            debug!(
                "슬롯 {} 해제: {}/{} 슬롯 사용 중",
                slot_id,
                slots.len(),
                self.max_slots
            );
        }
    }

    /// 모든 슬롯 해제
    ///
    /// 서버 (재)시작 시 이전 실행의 점유 상태를 폐기하는 데 사용됩니다.
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 빈 레지스트리 기본 상태 테스트
    #[tokio::test]
    async fn test_empty_registry() {
        let registry = ConnectionRegistry::new(10);

        assert_eq!(registry.count().await, 0);
        assert!(!registry.is_full().await);
        assert_eq!(registry.first_available_slot().await, 0);

        println!("✅ 빈 레지스트리 테스트 통과");
    }

    /// 슬롯 구멍 재사용 테스트
    #[tokio::test]
    async fn test_first_available_slot_reuses_hole() {
        let registry = ConnectionRegistry::new(10);

        registry.add(0).await;
        registry.add(1).await;
        registry.add(2).await;
        registry.add(3).await;
        registry.remove(2).await;

        // 점유 {0, 1, 3}, count = 3 이면 구멍인 2를 반환해야 함
        assert_eq!(registry.count().await, 3);
        assert_eq!(registry.first_available_slot().await, 2);

        registry.add(2).await;
        assert_eq!(registry.first_available_slot().await, 4);

        println!("✅ 슬롯 구멍 재사용 테스트 통과");
    }

    /// 추가/해제 멱등성 테스트
    #[tokio::test]
    async fn test_add_remove_idempotent() {
        let registry = ConnectionRegistry::new(5);

        registry.add(1).await;
        registry.add(1).await;
        assert_eq!(registry.count().await, 1, "중복 추가는 무시되어야 함");

        registry.remove(1).await;
        registry.remove(1).await;
        assert_eq!(registry.count().await, 0, "중복 해제는 무시되어야 함");

        println!("✅ 추가/해제 멱등성 테스트 통과");
    }

    /// 가득 참 판정 테스트
    #[tokio::test]
    async fn test_is_full() {
        let registry = ConnectionRegistry::new(2);

        registry.add(0).await;
        assert!(!registry.is_full().await);

        registry.add(1).await;
        assert!(registry.is_full().await);

        registry.remove(0).await;
        assert!(!registry.is_full().await);

        println!("✅ 가득 참 판정 테스트 통과");
    }

    /// 전체 해제 테스트
    #[tokio::test]
    async fn test_clear() {
        let registry = ConnectionRegistry::new(5);

        registry.add(0).await;
        registry.add(1).await;
        registry.clear().await;

        assert_eq!(registry.count().await, 0);
        assert_eq!(registry.first_available_slot().await, 0);

        println!("✅ 전체 해제 테스트 통과");
    }
}
