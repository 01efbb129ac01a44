//! Ordered conversation store.
//!
//! The store owns the messages shown to the user. Insertion order is display
//! order. Only three mutations exist: `append`, `replace` and `remove`.
//! Replacing or removing an id that is not present is a no-op.

use std::fmt;

/// Opaque message identifier, unique within one conversation.
///
/// Ids come from a per-store counter and are never reused, even after the
/// message they named has been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Text typed by the person at the keyboard.
    User,
    /// Text generated by the model.
    Model,
    /// A fixed notice describing a failure.
    Error,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Model => "Gemini",
            Role::Error => "Error",
        }
    }
}

/// A single conversation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
}

/// One completed user/model exchange, used as model history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: String,
    pub model: String,
}

/// Ordered list of messages with unique ids.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
    revision: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the end and returns its freshly allocated id.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            content: content.into(),
        });
        self.revision += 1;
        id
    }

    /// Replaces the content of the message with `id`.
    ///
    /// Returns `false` and leaves the store untouched when no such message exists.
    pub fn replace(&mut self, id: MessageId, content: impl Into<String>) -> bool {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        message.content = content.into();
        self.revision += 1;
        true
    }

    /// Removes the message with `id`.
    ///
    /// Returns `false` when no such message exists, so removing twice is safe.
    pub fn remove(&mut self, id: MessageId) -> bool {
        let Some(pos) = self.messages.iter().position(|m| m.id == id) else {
            return false;
        };
        self.messages.remove(pos);
        self.revision += 1;
        true
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Counter bumped by every effective mutation.
    ///
    /// Renderers compare it against the last value they saw to decide whether
    /// to re-layout and scroll.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Completed exchanges in order.
    ///
    /// A user message counts only when the very next message is a non-blank
    /// model reply; users whose request failed (followed by an error, or
    /// nothing) or whose reply came back empty are skipped.
    pub fn exchanges(&self) -> Vec<Exchange> {
        self.messages
            .windows(2)
            .filter_map(|pair| match (&pair[0], &pair[1]) {
                (
                    Message {
                        role: Role::User,
                        content: user,
                        ..
                    },
                    Message {
                        role: Role::Model,
                        content: model,
                        ..
                    },
                ) if !model.trim().is_empty() => Some(Exchange {
                    user: user.clone(),
                    model: model.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order_and_unique_ids() {
        let mut conv = Conversation::new();
        let a = conv.append(Role::User, "hi");
        let b = conv.append(Role::Model, "hello");
        let c = conv.append(Role::User, "again");

        assert_ne!(a, b);
        assert_ne!(b, c);
        let roles: Vec<Role> = conv.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Model, Role::User]);
    }

    #[test]
    fn test_replace_missing_id_is_noop() {
        let mut conv = Conversation::new();
        let id = conv.append(Role::Model, "...");
        assert!(conv.remove(id));
        let before = conv.revision();

        assert!(!conv.replace(id, "late"));
        assert!(conv.is_empty());
        assert_eq!(conv.revision(), before);
    }

    #[test]
    fn test_remove_twice_is_safe() {
        let mut conv = Conversation::new();
        let keep = conv.append(Role::User, "keep");
        let gone = conv.append(Role::Model, "...");

        assert!(conv.remove(gone));
        assert!(!conv.remove(gone));
        assert_eq!(conv.len(), 1);
        assert_eq!(conv.get(keep).map(|m| m.content.as_str()), Some("keep"));
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let mut conv = Conversation::new();
        let first = conv.append(Role::Model, "x");
        conv.remove(first);
        let second = conv.append(Role::Model, "y");
        assert_ne!(first, second);
    }

    #[test]
    fn test_replace_only_touches_target() {
        let mut conv = Conversation::new();
        let user = conv.append(Role::User, "question");
        let model = conv.append(Role::Model, "...");

        assert!(conv.replace(model, "answer"));
        assert_eq!(conv.get(user).unwrap().content, "question");
        assert_eq!(conv.get(model).unwrap().content, "answer");
    }

    #[test]
    fn test_exchanges_skip_failed_requests() {
        let mut conv = Conversation::new();
        conv.append(Role::User, "one");
        conv.append(Role::Model, "first");
        conv.append(Role::User, "two");
        conv.append(Role::Error, "Sorry");
        conv.append(Role::User, "three");
        conv.append(Role::Model, "third");

        let exchanges = conv.exchanges();
        assert_eq!(
            exchanges,
            vec![
                Exchange {
                    user: "one".into(),
                    model: "first".into()
                },
                Exchange {
                    user: "three".into(),
                    model: "third".into()
                },
            ]
        );
    }

    #[test]
    fn test_exchanges_skip_empty_replies() {
        let mut conv = Conversation::new();
        conv.append(Role::User, "one");
        conv.append(Role::Model, "");
        conv.append(Role::User, "two");
        conv.append(Role::Model, "  \n");
        conv.append(Role::User, "three");
        conv.append(Role::Model, "third");

        assert_eq!(
            conv.exchanges(),
            vec![Exchange {
                user: "three".into(),
                model: "third".into()
            }]
        );
    }
}
