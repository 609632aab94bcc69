//! Conversation view derived from the flat message log.
//!
//! Conversations are never stored: every listing call regroups the caller's
//! messages by (counterparty, listing).

use std::collections::HashMap;

use thrifthub_db::models::MessageRow;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub counterparty_id: String,
    pub listing_id: String,
}

#[derive(Debug, Clone)]
pub struct ConversationView {
    pub key: ConversationKey,
    pub last_message: MessageRow,
    /// Unread messages addressed to the requester under this key.
    pub unread_count: usize,
}

/// Group `messages` (in arrival order) into conversations as seen by
/// `requester_id`.
///
/// The last message is the one with the greatest timestamp; among equal
/// timestamps the first one scanned wins. The result is ordered by last
/// activity, most recent first, with ties kept in first-seen order.
/// Messages the requester neither sent nor received are ignored.
pub fn aggregate(requester_id: &str, messages: Vec<MessageRow>) -> Vec<ConversationView> {
    let mut index: HashMap<ConversationKey, usize> = HashMap::new();
    let mut conversations: Vec<ConversationView> = Vec::new();

    for message in messages {
        let counterparty = if message.sender_id == requester_id {
            message.recipient_id.clone()
        } else if message.recipient_id == requester_id {
            message.sender_id.clone()
        } else {
            continue;
        };

        let unread = message.recipient_id == requester_id && !message.is_read;
        let key = ConversationKey {
            counterparty_id: counterparty,
            listing_id: message.listing_id.clone(),
        };

        match index.get(&key) {
            Some(&slot) => {
                let conversation = &mut conversations[slot];
                if unread {
                    conversation.unread_count += 1;
                }
                if message.created_at > conversation.last_message.created_at {
                    conversation.last_message = message;
                }
            }
            None => {
                index.insert(key.clone(), conversations.len());
                conversations.push(ConversationView {
                    key,
                    last_message: message,
                    unread_count: usize::from(unread),
                });
            }
        }
    }

    // stable: equal timestamps keep first-seen order
    conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
    conversations
}
