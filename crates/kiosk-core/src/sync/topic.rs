use std::fmt;

use kiosk_api::KioskRoute;

/// Default broker prefix for topic destinations.
pub const DEFAULT_TOPIC_PREFIX: &str = "/topic/";

/// Notification topic of one kiosk, derived once from its routing ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    path: String,
    destination: String,
}

impl Topic {
    /// `displays/{org}/{parking}[/{kiosk}]` under `prefix`.
    pub fn new(route: &KioskRoute, prefix: &str) -> Self {
        let mut path = format!("displays/{}/{}", route.org_id, route.parking_id);
        if let Some(kiosk_id) = route.kiosk_id.as_deref() {
            path.push('/');
            path.push_str(kiosk_id);
        }

        let destination = if prefix.is_empty() || prefix.ends_with('/') {
            format!("{prefix}{path}")
        } else {
            format!("{prefix}/{path}")
        };

        Self { path, destination }
    }

    /// Topic path without the broker prefix.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full STOMP destination.
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kiosk_segment_only_when_present() {
        let with = Topic::new(&KioskRoute::new("o", "p", Some("127".into())), DEFAULT_TOPIC_PREFIX);
        assert_eq!(with.path(), "displays/o/p/127");
        assert_eq!(with.destination(), "/topic/displays/o/p/127");

        let without = Topic::new(&KioskRoute::new("o", "p", None), DEFAULT_TOPIC_PREFIX);
        assert_eq!(without.path(), "displays/o/p");
    }

    #[test]
    fn prefix_without_trailing_slash() {
        let topic = Topic::new(&KioskRoute::new("o", "p", None), "/exchange/amq.topic");
        assert_eq!(topic.to_string(), "/exchange/amq.topic/displays/o/p");
        assert_eq!(Topic::new(&KioskRoute::new("o", "p", None), "").destination(), "displays/o/p");
    }
}
