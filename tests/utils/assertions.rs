//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use serde_json::Value;

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    connections: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for every connection in the setup
    pub fn for_all_connections(setup: &'a TestSetup) -> Self {
        let connections = setup.connections.iter().map(|s| s.as_str()).collect();
        Self { setup, connections }
    }

    /// Create an assertion for specific connections
    pub fn for_connections(setup: &'a TestSetup, connections: Vec<&'a str>) -> Self {
        Self { setup, connections }
    }

    /// Assert that every connection received the event next (consumes it from the queue)
    pub async fn received_event(self, expected_type: &str) -> MessageContent {
        let mut payloads = vec![];

        for connection in &self.connections {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(connection)
                .await;
            let message = match message {
                Some(message) => message,
                None => panic!("{} should have received {}", connection, expected_type),
            };

            let frame: Value = serde_json::from_str(&message).unwrap();
            assert_eq!(
                frame["type"], expected_type,
                "{} received wrong event type",
                connection
            );
            payloads.push(frame["payload"].clone());
        }

        // Broadcast events carry one identical payload to everyone
        for (i, payload) in payloads.iter().enumerate().skip(1) {
            assert_eq!(
                payload, &payloads[0],
                "{} payload differs from {}",
                self.connections[i], self.connections[0]
            );
        }

        MessageContent {
            payload: payloads.into_iter().next().unwrap_or(Value::Null),
        }
    }

    /// Assert that connections have no pending messages
    pub async fn received_no_messages(self) {
        for connection in &self.connections {
            let messages = self
                .setup
                .mock_conn_manager
                .get_messages_for(connection)
                .await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                connection,
                messages
            );
        }
    }
}

pub struct MessageContent {
    pub payload: Value,
}

impl MessageContent {
    pub fn with_field(self, field: &str, expected: Value) -> Self {
        assert_eq!(self.payload[field], expected, "payload field {}", field);
        self
    }

    /// Check a member list field as (id, username) pairs in order
    pub fn with_users(self, field: &str, expected: &[(&str, &str)]) -> Self {
        let users = self.payload[field]
            .as_array()
            .unwrap_or_else(|| panic!("{} should be an array", field));
        let actual: Vec<(String, String)> = users
            .iter()
            .map(|u| {
                (
                    u["id"].as_str().unwrap_or_default().to_string(),
                    u["username"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let expected: Vec<(String, String)> = expected
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        assert_eq!(actual, expected, "member list {}", field);
        self
    }
}
