use crate::core::truncate_utf8;
use chrono::{DateTime, Local};
use ringbuffer::{AllocRingBuffer, RingBuffer};

pub const CHAT_MAX_MESSAGES: usize = 128;
pub const CHAT_SENDER_LEN: usize = 31;
pub const CHAT_MESSAGE_LEN: usize = 255;

/// ローカルで生成するお知らせの送信者名
pub const SYSTEM_SENDER: &str = "System";

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub at: DateTime<Local>,
}

/// 対局中のチャット・システムメッセージ履歴 (古いものから捨てる)
pub struct ChatLog {
    messages: AllocRingBuffer<ChatMessage>,
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatLog {
    pub fn new() -> Self {
        Self {
            messages: AllocRingBuffer::new(CHAT_MAX_MESSAGES),
        }
    }

    /// 追加する。送信者名と本文は上限長で切り詰める
    pub fn add(&mut self, sender: &str, text: &str) {
        let _ = self.messages.enqueue(ChatMessage {
            sender: truncate_utf8(sender, CHAT_SENDER_LEN).to_string(),
            text: truncate_utf8(text, CHAT_MESSAGE_LEN).to_string(),
            at: Local::now(),
        });
    }

    pub fn system(&mut self, text: &str) {
        self.add(SYSTEM_SENDER, text);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `latest(0)` が最新のメッセージ
    pub fn latest(&self, index_from_end: usize) -> Option<&ChatMessage> {
        let len = self.messages.len();
        if index_from_end >= len {
            return None;
        }
        self.messages.get(len - 1 - index_from_end)
    }
}
