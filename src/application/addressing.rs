//! Addressing resolver: outbound targets to concrete connection sets.
//!
//! | Target                      | Recipients                               |
//! |-----------------------------|------------------------------------------|
//! | `Client(id)`                | `id` if still registered, else nobody    |
//! | `User { only_one: false }`  | every connection bound to the user       |
//! | `User { only_one: true }`   | one arbitrary connection of the user     |
//! | `Room(name)`                | every member of `name`                   |
//! | `All`                       | every registered connection              |

use std::sync::Arc;

use crate::domain::envelope::Target;
use crate::domain::foundation::ConnectionId;
use crate::ports::ConnectionRegistry;

/// Resolves [`Target`]s against the connection registry.
#[derive(Clone)]
pub struct AddressingResolver {
    registry: Arc<dyn ConnectionRegistry>,
}

impl AddressingResolver {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Connections a frame addressed to `target` should reach.
    ///
    /// Never fails: vanished targets resolve to an empty set.
    pub async fn resolve(&self, target: &Target) -> Vec<ConnectionId> {
        match target {
            Target::Client(id) => {
                if self.registry.contains(id).await {
                    vec![id.clone()]
                } else {
                    Vec::new()
                }
            }
            Target::User { user_id, only_one } => {
                let members = self.registry.connections_of_user(user_id).await;
                if *only_one {
                    members.into_iter().take(1).collect()
                } else {
                    members.into_iter().collect()
                }
            }
            Target::Room(room) => self.registry.room_members(room).await.into_iter().collect(),
            Target::All => self.registry.all_connections().await,
        }
    }
}
