use std::sync::Arc;

use docrelay::{ConnectionManager, RoomRegistry, WebsocketReceiveHandler};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub registry: Arc<RoomRegistry>,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub input_handler: WebsocketReceiveHandler,
    pub connections: Vec<String>,
}

pub struct TestSetupBuilder {
    connections: Vec<String>,
}

#[allow(dead_code)]
impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            connections: vec![],
        }
    }

    /// Connections that are open at the transport level but have not joined anything
    pub fn with_connections(mut self, connections: Vec<&str>) -> Self {
        self.connections = connections.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_two_connections(self) -> Self {
        self.with_connections(vec!["conn-a", "conn-b"])
    }

    pub fn with_three_connections(self) -> Self {
        self.with_connections(vec!["conn-a", "conn-b", "conn-c"])
    }

    pub async fn build(self) -> TestSetup {
        let registry = Arc::new(RoomRegistry::new());
        let mock_conn_manager = Arc::new(MockConnectionManager::new());

        for connection in &self.connections {
            mock_conn_manager.add_connected(connection).await;
        }

        let connection_manager: Arc<dyn ConnectionManager> = mock_conn_manager.clone();
        let input_handler = WebsocketReceiveHandler::new(registry.clone(), connection_manager);

        TestSetup {
            registry,
            mock_conn_manager,
            input_handler,
            connections: self.connections,
        }
    }
}
