//! Repository traits: the contract between the core engine and the
//! persistence layer.
//! The core never touches SQL directly — it calls these CRUD methods, and a
//! deployment wires in whatever relational store it likes. This crate ships
//! one concrete in-memory implementation, sufficient to run the engine and
//! its tests, splitting the storage contract from its in-process backing.

use crate::model::{GameObject, Monster, Npc, Player, Room};
use async_trait::async_trait;
use dashmap::DashMap;
use moor_mud_common::{MonsterId, MudError, MudResult, NpcId, ObjectId, PlayerId, RoomId};

#[async_trait]
pub trait PlayerRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> MudResult<Option<Player>>;
    async fn find_by_id(&self, id: PlayerId) -> MudResult<Option<Player>>;
    async fn insert(&self, player: Player) -> MudResult<()>;
    async fn update(&self, player: Player) -> MudResult<()>;
    /// Delegated credential check. Implementations compare against whatever scheme
    /// they store; the core only ever sees the boolean result.
    async fn verify_credentials(&self, username: &str, password: &str) -> MudResult<bool>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn all(&self) -> MudResult<Vec<Room>>;
    async fn insert(&self, room: Room) -> MudResult<()>;
    async fn update(&self, room: Room) -> MudResult<()>;
    async fn delete(&self, id: RoomId) -> MudResult<()>;
}

#[async_trait]
pub trait ObjectRepository: Send + Sync {
    async fn all(&self) -> MudResult<Vec<GameObject>>;
    async fn insert(&self, object: GameObject) -> MudResult<()>;
    async fn update(&self, object: GameObject) -> MudResult<()>;
    async fn delete(&self, id: ObjectId) -> MudResult<()>;
}

#[async_trait]
pub trait MonsterRepository: Send + Sync {
    async fn all(&self) -> MudResult<Vec<Monster>>;
    async fn insert(&self, monster: Monster) -> MudResult<()>;
    async fn update(&self, monster: Monster) -> MudResult<()>;
}

#[async_trait]
pub trait NpcRepository: Send + Sync {
    async fn all(&self) -> MudResult<Vec<Npc>>;
    async fn insert(&self, npc: Npc) -> MudResult<()>;
    async fn update(&self, npc: Npc) -> MudResult<()>;
}

/// Test/dev-fixture implementation of every repository trait over
/// process-local maps. Credential verification here is a placeholder
/// plaintext comparison against `credential_hash` — a real deployment
/// plugs in a proper password-hashing crate (argon2 or bcrypt) instead.
#[derive(Default)]
pub struct InMemoryRepositories {
    players: DashMap<PlayerId, Player>,
    players_by_username: DashMap<String, PlayerId>,
    rooms: DashMap<RoomId, Room>,
    objects: DashMap<ObjectId, GameObject>,
    monsters: DashMap<MonsterId, Monster>,
    npcs: DashMap<NpcId, Npc>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayerRepository for InMemoryRepositories {
    async fn find_by_username(&self, username: &str) -> MudResult<Option<Player>> {
        let Some(id) = self.players_by_username.get(username).map(|v| *v) else {
            return Ok(None);
        };
        Ok(self.players.get(&id).map(|p| p.clone()))
    }

    async fn find_by_id(&self, id: PlayerId) -> MudResult<Option<Player>> {
        Ok(self.players.get(&id).map(|p| p.clone()))
    }

    async fn insert(&self, player: Player) -> MudResult<()> {
        if self.players_by_username.contains_key(&player.username) {
            return Err(MudError::user_input(format!(
                        "username '{}' already registered",
                        player.username
            )));
        }
        self.players_by_username
            .insert(player.username.clone(), player.id);
        self.players.insert(player.id, player);
        Ok(())
    }

    async fn update(&self, player: Player) -> MudResult<()> {
        if !self.players.contains_key(&player.id) {
            return Err(MudError::not_found(format!("player {}", player.id)));
        }
        self.players.insert(player.id, player);
        Ok(())
    }

    async fn verify_credentials(&self, username: &str, password: &str) -> MudResult<bool> {
        let Some(id) = self.players_by_username.get(username).map(|v| *v) else {
            return Ok(false);
        };
        let Some(player) = self.players.get(&id) else {
            return Ok(false);
        };
        Ok(player.credential_hash == password)
    }
}

#[async_trait]
impl RoomRepository for InMemoryRepositories {
    async fn all(&self) -> MudResult<Vec<Room>> {
        Ok(self.rooms.iter().map(|r| r.clone()).collect())
    }

    async fn insert(&self, room: Room) -> MudResult<()> {
        self.rooms.insert(room.id, room);
        Ok(())
    }

    async fn update(&self, room: Room) -> MudResult<()> {
        self.rooms.insert(room.id, room);
        Ok(())
    }

    async fn delete(&self, id: RoomId) -> MudResult<()> {
        self.rooms.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ObjectRepository for InMemoryRepositories {
    async fn all(&self) -> MudResult<Vec<GameObject>> {
        Ok(self.objects.iter().map(|o| o.clone()).collect())
    }

    async fn insert(&self, object: GameObject) -> MudResult<()> {
        self.objects.insert(object.id, object);
        Ok(())
    }

    async fn update(&self, object: GameObject) -> MudResult<()> {
        self.objects.insert(object.id, object);
        Ok(())
    }

    async fn delete(&self, id: ObjectId) -> MudResult<()> {
        self.objects.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl MonsterRepository for InMemoryRepositories {
    async fn all(&self) -> MudResult<Vec<Monster>> {
        Ok(self.monsters.iter().map(|m| m.clone()).collect())
    }

    async fn insert(&self, monster: Monster) -> MudResult<()> {
        self.monsters.insert(monster.id, monster);
        Ok(())
    }

    async fn update(&self, monster: Monster) -> MudResult<()> {
        self.monsters.insert(monster.id, monster);
        Ok(())
    }
}

#[async_trait]
impl NpcRepository for InMemoryRepositories {
    async fn all(&self) -> MudResult<Vec<Npc>> {
        Ok(self.npcs.iter().map(|n| n.clone()).collect())
    }

    async fn insert(&self, npc: Npc) -> MudResult<()> {
        self.npcs.insert(npc.id, npc);
        Ok(())
    }

    async fn update(&self, npc: Npc) -> MudResult<()> {
        self.npcs.insert(npc.id, npc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let repo = InMemoryRepositories::new();
        let p1 = Player::new("alice", "hunter2hunter2");
        repo.insert(p1).await.unwrap();
        let p2 = Player::new("alice", "other");
        let err = repo.insert(p2).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn verify_credentials_matches_stored_hash() {
        let repo = InMemoryRepositories::new();
        repo.insert(Player::new("alice", "hunter2hunter2"))
            .await
            .unwrap();
        assert!(repo
                .verify_credentials("alice", "hunter2hunter2")
                .await
                .unwrap());
        assert!(!repo.verify_credentials("alice", "wrong").await.unwrap());
        assert!(!repo.verify_credentials("bob", "wrong").await.unwrap());
    }
}
