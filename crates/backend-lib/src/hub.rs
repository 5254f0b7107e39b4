// ============================
// crates/backend-lib/src/hub.rs
// ============================
//! Outbound queues of every push connection.
//!
//! Each connection owns a bounded queue drained by its socket writer. Room
//! broadcasts never await: a full queue drops the event for that connection
//! only, so one slow client cannot stall a room.

use cosmictv_common::ServerEvent;
use dashmap::DashMap;
use metrics::counter;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::metrics::WS_OUTBOX_DROPPED;
use crate::presence::{ConnectionId, RoomView};

/// Registry of connection outboxes
pub struct RoomHub {
    outboxes: DashMap<ConnectionId, mpsc::Sender<ServerEvent>>,
    capacity: usize,
}

impl RoomHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            outboxes: DashMap::new(),
            capacity,
        }
    }

    /// Create the outbox of a new connection
    pub fn register(&self, conn_id: ConnectionId) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.capacity);
        self.outboxes.insert(conn_id, tx);
        rx
    }

    pub fn unregister(&self, conn_id: ConnectionId) {
        self.outboxes.remove(&conn_id);
    }

    pub fn connections(&self) -> usize {
        self.outboxes.len()
    }

    /// Queue an event for one connection. Returns false if it was not queued.
    pub fn send_to(&self, conn_id: ConnectionId, event: ServerEvent) -> bool {
        let Some(outbox) = self.outboxes.get(&conn_id) else {
            return false;
        };
        match outbox.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                counter!(WS_OUTBOX_DROPPED).increment(1);
                tracing::warn!(%conn_id, "outbox full, event dropped");
                false
            },
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Queue an event for every member of a room
    pub fn broadcast(&self, room: RoomView<'_>, event: &ServerEvent) -> usize {
        room.members
            .iter()
            .filter(|conn_id| self.send_to(**conn_id, event.clone()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_broadcast_reaches_room_members_only() {
        let hub = RoomHub::new(8);
        let (a, b, outsider) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut rx_a = hub.register(a);
        let mut rx_b = hub.register(b);
        let mut rx_out = hub.register(outsider);

        let members: HashSet<_> = [a, b].into_iter().collect();
        let room = RoomView {
            stream_id: "s1",
            members: &members,
        };
        let delivered = hub.broadcast(room, &ServerEvent::viewer_count("s1", 2));

        assert_eq!(delivered, 2);
        assert!(matches!(rx_a.recv().await, Some(ServerEvent::ViewerCountUpdate { count: 2, .. })));
        assert!(matches!(rx_b.recv().await, Some(ServerEvent::ViewerCountUpdate { count: 2, .. })));
        assert!(rx_out.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_outbox_drops_instead_of_blocking() {
        let hub = RoomHub::new(1);
        let conn = Uuid::new_v4();
        let mut rx = hub.register(conn);

        assert!(hub.send_to(conn, ServerEvent::like_update("s1", 1)));
        assert!(!hub.send_to(conn, ServerEvent::like_update("s1", 2)));

        assert!(matches!(rx.recv().await, Some(ServerEvent::LikeUpdate { likes: 1, .. })));
    }

    #[test]
    fn test_unregistered_connection() {
        let hub = RoomHub::new(4);
        let conn = Uuid::new_v4();
        let _rx = hub.register(conn);
        assert_eq!(hub.connections(), 1);

        hub.unregister(conn);
        assert_eq!(hub.connections(), 0);
        assert!(!hub.send_to(conn, ServerEvent::like_update("s1", 1)));
    }
}
