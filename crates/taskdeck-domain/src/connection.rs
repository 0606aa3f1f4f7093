use serde::{Deserialize, Serialize};

use crate::card::CardId;

/// A directed edge between two cards on the same page.
///
/// Connections are data; they are resolved to mounted canvas nodes only at
/// render time and never stored as live node references across renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from_card_id: CardId,
    pub to_card_id: CardId,
}

impl Connection {
    pub fn new(from_card_id: CardId, to_card_id: CardId) -> Self {
        Self {
            from_card_id,
            to_card_id,
        }
    }

    /// Check if this connection involves a given card (either endpoint).
    pub fn touches(&self, card_id: CardId) -> bool {
        self.from_card_id == card_id || self.to_card_id == card_id
    }

    /// Check if this connection links two specific cards, in order.
    pub fn connects(&self, from: CardId, to: CardId) -> bool {
        self.from_card_id == from && self.to_card_id == to
    }
}

/// An edge list of card connections for one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionSet {
    connections: Vec<Connection>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(connections: Vec<Connection>) -> Self {
        let mut set = Self::new();
        for connection in connections {
            set.insert(connection);
        }
        set
    }

    /// Add a connection. Exact duplicates are rejected; returns whether the
    /// connection was inserted.
    pub fn insert(&mut self, connection: Connection) -> bool {
        if self
            .connections
            .iter()
            .any(|c| c.connects(connection.from_card_id, connection.to_card_id))
        {
            return false;
        }
        self.connections.push(connection);
        true
    }

    /// Remove an edge between two cards. Returns true if one was removed.
    pub fn remove(&mut self, from: CardId, to: CardId) -> bool {
        let initial_len = self.connections.len();
        self.connections.retain(|c| !c.connects(from, to));
        self.connections.len() < initial_len
    }

    /// Remove all connections involving a card (for deletion cascades).
    /// Returns the number removed.
    pub fn remove_for_card(&mut self, card_id: CardId) -> usize {
        let initial_len = self.connections.len();
        self.connections.retain(|c| !c.touches(card_id));
        initial_len - self.connections.len()
    }

    pub fn contains(&self, from: CardId, to: CardId) -> bool {
        self.connections.iter().any(|c| c.connects(from, to))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub fn as_slice(&self) -> &[Connection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut set = ConnectionSet::new();
        assert!(set.insert(Connection::new(1, 2)));
        assert!(!set.insert(Connection::new(1, 2)));
        // Reverse direction is a distinct edge.
        assert!(set.insert(Connection::new(2, 1)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_remove_edge() {
        let mut set = ConnectionSet::from_vec(vec![Connection::new(1, 2), Connection::new(2, 3)]);
        assert!(set.remove(1, 2));
        assert!(!set.remove(1, 2));
        assert_eq!(set.len(), 1);
        assert!(set.contains(2, 3));
    }

    #[test]
    fn test_remove_for_card_cascades_both_directions() {
        let mut set = ConnectionSet::from_vec(vec![
            Connection::new(1, 2),
            Connection::new(3, 1),
            Connection::new(2, 3),
        ]);

        assert_eq!(set.remove_for_card(1), 2);
        assert_eq!(set.len(), 1);
        assert!(set.contains(2, 3));
    }

    #[test]
    fn test_remove_for_unknown_card_is_noop() {
        let mut set = ConnectionSet::from_vec(vec![Connection::new(1, 2)]);
        assert_eq!(set.remove_for_card(99), 0);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_wire_format() {
        let connection: Connection =
            serde_json::from_str(r#"{"fromCardId": 4, "toCardId": 7}"#).unwrap();
        assert_eq!(connection.from_card_id, 4);
        assert_eq!(connection.to_card_id, 7);
        assert!(connection.touches(4));
        assert!(connection.touches(7));
        assert!(!connection.touches(5));
    }
}
