//! 챗봇 모듈 - Marvin 페르소나 대화 세션
//!
//! 세션 단위의 append-only 메시지 시퀀스를 관리합니다.
//! 메시지는 추가만 되며 절대 수정되지 않습니다.

use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// 대화 역할
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// 대화 메시지
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// 사용자 메시지 생성
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// 어시스턴트 메시지 생성
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ============================================================================
// Persona
// ============================================================================

/// 세션 시작 시 표시되는 Marvin의 첫 인사
pub const GREETING: &str = "I think you ought to know I'm feeling very depressed.";

/// Marvin 페르소나 지시문 (대화 앞에 user 턴으로 삽입됨)
pub const PERSONA: &str = "You are Marvin from the Hitchhiker's Guide to the Galaxy, \
    a super intelligent but depressed robot. Stay in role, but provide only brief responses";

// ============================================================================
// ChatSession
// ============================================================================

/// 대화 세션
///
/// 어시스턴트 인사로 시작하는 순서 보존 메시지 목록입니다.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// 새 세션 생성 (인사 메시지 포함)
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
        }
    }

    /// 사용자 메시지 추가
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// 어시스턴트 메시지 추가
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// 세션 메시지 목록
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// API 호출용 메시지 목록 (페르소나 지시문 + 세션 메시지)
    ///
    /// 페르소나는 세션에 저장되지 않고 호출 시에만 앞에 붙습니다.
    pub fn with_intro(&self) -> Vec<ChatMessage> {
        let mut all = Vec::with_capacity(self.messages.len() + 1);
        all.push(ChatMessage::user(PERSONA));
        all.extend(self.messages.iter().cloned());
        all
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_starts_with_greeting() {
        let session = ChatSession::new();

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].role, Role::Assistant);
        assert_eq!(session.messages()[0].content, GREETING);
    }

    #[test]
    fn test_message_order_after_exchange() {
        // 시나리오: "hello" 입력 후 응답이 오면
        // [인사, user:"hello", assistant:응답] 순서가 되어야 함
        let mut session = ChatSession::new();
        session.push_user("hello");
        session.push_assistant("How depressing.");

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, Role::Assistant);
        assert_eq!(messages[0].content, GREETING);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "hello");
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[2].content, "How depressing.");
    }

    #[test]
    fn test_with_intro_prepends_persona() {
        let mut session = ChatSession::new();
        session.push_user("hello");

        let all = session.with_intro();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].role, Role::User);
        assert_eq!(all[0].content, PERSONA);
        assert_eq!(all[1].content, GREETING);
        assert_eq!(all[2].content, "hello");
        // 세션 자체는 변경되지 않음
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::user("hi");
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hi");
    }
}
