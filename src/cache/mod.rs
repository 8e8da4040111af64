//! 응답 캐시 - 입력 기반 content-addressed 메모이제이션
//!
//! 같은 입력으로 같은 API 호출을 반복하지 않도록
//! 요청 입력의 SHA-256 해시를 키로 응답을 저장합니다.
//! 무제한, 프로세스 수명 동안 유지 (eviction 없음).

use std::collections::HashMap;

use sha2::{Digest, Sha256};

/// 응답 캐시
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, String>,
}

impl ResponseCache {
    /// 빈 캐시 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 입력 파트들로 캐시 키 생성
    ///
    /// 파트 경계가 섞이지 않도록 각 파트 앞에 길이를 해싱합니다
    /// (["ab","c"]와 ["a","bc"]가 다른 키가 되도록).
    pub fn key(parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }

        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }

    /// 캐시 조회
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    /// 캐시 저장
    pub fn insert(&mut self, key: String, value: String) {
        self.entries.insert(key, value);
    }

    /// 저장된 엔트리 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 캐시가 비었는지 확인
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_inputs_same_key() {
        let a = ResponseCache::key(&["complete", "claude-2", "prompt text"]);
        let b = ResponseCache::key(&["complete", "claude-2", "prompt text"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_inputs_different_key() {
        let a = ResponseCache::key(&["complete", "claude-2", "question one"]);
        let b = ResponseCache::key(&["complete", "claude-2", "question two"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_part_boundaries_matter() {
        let a = ResponseCache::key(&["ab", "c"]);
        let b = ResponseCache::key(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_get_and_insert() {
        let mut cache = ResponseCache::new();
        let key = ResponseCache::key(&["embed", "voyage-2", "hello"]);

        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());

        cache.insert(key.clone(), "[0.1, 0.2]".to_string());

        assert_eq!(cache.get(&key), Some("[0.1, 0.2]"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_is_hex_digest() {
        let key = ResponseCache::key(&["x"]);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
