// =====================================================================================
// File: core-bridge/src/queue.rs
// Description: Cross-chain message queue and delivery tracker. Maintains a
//              strict per-destination-chain FIFO and rejects replayed
//              nonces before a message is ever enqueued.
// Author: arkSong (arksong2018@gmail.com)
// =====================================================================================

use crate::error::{BridgeError, BridgeResult};
use crate::types::{Message, MessageStatus};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub max_delivery_attempts: u32,
    pub message_ttl_seconds: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_delivery_attempts: 5,
            message_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Default)]
struct ChainQueue {
    order: VecDeque<Uuid>,
}

/// Per-destination-chain FIFO message queue with nonce-based replay
/// protection. Delivery order is tracked per destination chain; the replay
/// window is tracked per `(source_chain, target_chain)` pair, since two
/// senders delivering to the same destination must not be able to block
/// each other's nonce sequence.
pub struct MessageQueue {
    messages: Arc<DashMap<Uuid, Message>>,
    queues: Arc<DashMap<String, ChainQueue>>,
    nonces: Arc<DashMap<(String, String), u64>>,
    config: QueueConfig,
}

impl MessageQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            messages: Arc::new(DashMap::new()),
            queues: Arc::new(DashMap::new()),
            nonces: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Enqueues `payload` for delivery to `target_chain`. Rejects the send
    /// if `nonce` has already been seen for this `(source_chain,
    /// target_chain)` pair.
    pub fn send(&self, source_chain: String, target_chain: String, nonce: u64, payload: Vec<u8>) -> BridgeResult<Uuid> {
        let route = (source_chain.clone(), target_chain.clone());
        if let Some(last) = self.nonces.get(&route) {
            if nonce <= *last {
                return Err(BridgeError::replay_detected(
                    format!("{source_chain}->{target_chain}"),
                    nonce,
                ));
            }
        }
        self.nonces.insert(route, nonce);

        let mut queue = self.queues.entry(target_chain.clone()).or_default();

        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4(),
            source_chain,
            target_chain: target_chain.clone(),
            nonce,
            payload,
            status: MessageStatus::Pending,
            delivery_attempts: 0,
            created_at: now,
            updated_at: now,
            acknowledged_at: None,
        };
        let id = message.id;
        queue.order.push_back(id);
        drop(queue);

        self.messages.insert(id, message);
        tracing::info!(message_id = %id, chain = %target_chain, nonce, "message enqueued");
        Ok(id)
    }

    /// Pops the next undelivered message for `target_chain` in FIFO order
    /// and marks it PROCESSING, or `None` if the queue is empty or the head
    /// is not yet eligible.
    pub fn process_next(&self, target_chain: &str) -> BridgeResult<Option<Message>> {
        let Some(mut queue) = self.queues.get_mut(target_chain) else {
            return Ok(None);
        };

        while let Some(&head_id) = queue.order.front() {
            let mut entry = self
                .messages
                .get_mut(&head_id)
                .ok_or_else(|| BridgeError::internal("queue references missing message"))?;

            match entry.status {
                MessageStatus::Pending => {
                    entry.status = MessageStatus::Processing;
                    entry.delivery_attempts += 1;
                    entry.updated_at = Utc::now();
                    return Ok(Some(entry.clone()));
                }
                MessageStatus::Processing => return Ok(None),
                _ => {
                    queue.order.pop_front();
                    continue;
                }
            }
        }
        Ok(None)
    }

    pub fn acknowledge(&self, message_id: Uuid) -> BridgeResult<()> {
        let mut entry = self
            .messages
            .get_mut(&message_id)
            .ok_or_else(|| BridgeError::not_found("message", message_id.to_string()))?;
        if entry.status.is_terminal() {
            return Err(BridgeError::precondition_failed(format!(
                "message {message_id} already terminal ({:?})",
                entry.status
            )));
        }
        entry.status = MessageStatus::Delivered;
        entry.acknowledged_at = Some(Utc::now());
        entry.updated_at = Utc::now();
        self.pop_if_head(&entry.target_chain, message_id);
        Ok(())
    }

    pub fn mark_failed(&self, message_id: Uuid, requeue: bool) -> BridgeResult<()> {
        let mut entry = self
            .messages
            .get_mut(&message_id)
            .ok_or_else(|| BridgeError::not_found("message", message_id.to_string()))?;

        let exhausted = entry.delivery_attempts >= self.config.max_delivery_attempts;
        if requeue && !exhausted {
            entry.status = MessageStatus::Pending;
        } else {
            entry.status = MessageStatus::Failed;
            self.pop_if_head(&entry.target_chain, message_id);
        }
        entry.updated_at = Utc::now();
        Ok(())
    }

    pub fn expire_stale(&self) -> usize {
        let cutoff = Utc::now() - chrono::Duration::seconds(self.config.message_ttl_seconds);
        let mut expired = 0;
        for mut entry in self.messages.iter_mut() {
            if !entry.status.is_terminal() && entry.created_at < cutoff {
                entry.status = MessageStatus::Expired;
                entry.updated_at = Utc::now();
                self.pop_if_head(&entry.target_chain, entry.id);
                expired += 1;
            }
        }
        expired
    }

    pub fn get(&self, message_id: Uuid) -> BridgeResult<Message> {
        self.messages
            .get(&message_id)
            .map(|e| e.clone())
            .ok_or_else(|| BridgeError::not_found("message", message_id.to_string()))
    }

    pub fn queue_depth(&self, target_chain: &str) -> usize {
        self.queues
            .get(target_chain)
            .map(|q| q.order.len())
            .unwrap_or(0)
    }

    fn pop_if_head(&self, target_chain: &str, message_id: Uuid) {
        if let Some(mut queue) = self.queues.get_mut(target_chain) {
            if queue.order.front() == Some(&message_id) {
                queue.order.pop_front();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_order_preserved_per_destination() {
        let queue = MessageQueue::new(QueueConfig::default());
        let a = queue.send("ethereum".into(), "polygon".into(), 1, b"a".to_vec()).unwrap();
        let b = queue.send("ethereum".into(), "polygon".into(), 2, b"b".to_vec()).unwrap();

        let first = queue.process_next("polygon").unwrap().unwrap();
        assert_eq!(first.id, a);
        queue.acknowledge(a).unwrap();

        let second = queue.process_next("polygon").unwrap().unwrap();
        assert_eq!(second.id, b);
    }

    #[test]
    fn duplicate_nonce_rejected_as_replay() {
        let queue = MessageQueue::new(QueueConfig::default());
        queue.send("ethereum".into(), "polygon".into(), 5, b"x".to_vec()).unwrap();
        let result = queue.send("ethereum".into(), "polygon".into(), 5, b"y".to_vec());
        assert!(result.is_err());
    }

    #[test]
    fn nonces_are_independent_per_destination_chain() {
        let queue = MessageQueue::new(QueueConfig::default());
        queue.send("ethereum".into(), "polygon".into(), 1, b"x".to_vec()).unwrap();
        let result = queue.send("ethereum".into(), "bsc".into(), 1, b"y".to_vec());
        assert!(result.is_ok());
    }

    #[test]
    fn nonces_are_independent_per_source_for_the_same_destination() {
        let queue = MessageQueue::new(QueueConfig::default());
        queue.send("ethereum".into(), "polygon".into(), 1, b"x".to_vec()).unwrap();
        // A different sender delivering to the same destination chain must
        // not be blocked by ethereum's nonce sequence.
        let result = queue.send("bsc".into(), "polygon".into(), 1, b"y".to_vec());
        assert!(result.is_ok());
    }

    #[test]
    fn failed_message_requeues_until_attempts_exhausted() {
        let mut config = QueueConfig::default();
        config.max_delivery_attempts = 2;
        let queue = MessageQueue::new(config);
        let id = queue.send("ethereum".into(), "polygon".into(), 1, b"x".to_vec()).unwrap();

        queue.process_next("polygon").unwrap();
        queue.mark_failed(id, true).unwrap();
        assert_eq!(queue.get(id).unwrap().status, MessageStatus::Pending);

        queue.process_next("polygon").unwrap();
        queue.mark_failed(id, true).unwrap();
        assert_eq!(queue.get(id).unwrap().status, MessageStatus::Failed);
    }
}
