//! Bus topic names.
//!
//! Topics map one-to-one onto NATS subjects. Each feed type publishes to its
//! own topic so relay consumers never see foreign payloads.

/// Default topic for price events.
pub const DEFAULT_PRICE_TOPIC: &str = "prices";

/// Default topic for news items.
pub const DEFAULT_NEWS_TOPIC: &str = "news";

/// Build the queue group name for a set of relay consumers.
///
/// Consumers sharing a group split the topic between them; consumers without
/// a group each receive every message.
///
/// `q.<group>`
#[must_use]
pub fn queue_group(group: &str) -> String {
    format!("q.{group}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_group_name() {
        assert_eq!(queue_group("relay"), "q.relay");
    }

    #[test]
    fn test_default_topics_are_distinct() {
        assert_ne!(DEFAULT_PRICE_TOPIC, DEFAULT_NEWS_TOPIC);
    }
}
