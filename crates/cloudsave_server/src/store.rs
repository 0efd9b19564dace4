//! Per-player storage.

use crate::error::{ServerError, ServerResult};
use bytes::Bytes;
use cloudsave_protocol::{FileMetadata, Scalar};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::SystemTime;
use uuid::Uuid;

#[derive(Debug, Default)]
struct PlayerData {
    items: BTreeMap<String, Scalar>,
    files: BTreeMap<String, StoredFile>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    data: Bytes,
    modified: SystemTime,
}

impl StoredFile {
    fn metadata(&self, key: &str) -> FileMetadata {
        FileMetadata {
            key: key.to_string(),
            size_bytes: self.data.len() as u64,
            last_modified: Some(self.modified),
        }
    }
}

/// Key-value entries and files of every player.
///
/// Each player has two separate namespaces: scalar entries and files.
/// Writes to one player never touch another.
#[derive(Debug, Default)]
pub struct PlayerStore {
    players: RwLock<HashMap<Uuid, PlayerData>>,
}

impl PlayerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new player with empty namespaces.
    pub fn create_player(&self, player_id: Uuid) {
        self.players.write().entry(player_id).or_default();
    }

    /// Returns the number of registered players.
    pub fn player_count(&self) -> usize {
        self.players.read().len()
    }

    /// Returns the number of key-value entries of a player.
    pub fn item_count(&self, player_id: &Uuid) -> usize {
        self.players
            .read()
            .get(player_id)
            .map_or(0, |p| p.items.len())
    }

    /// Writes a batch of entries.
    pub fn save_items(
        &self,
        player_id: &Uuid,
        items: BTreeMap<String, Scalar>,
    ) -> ServerResult<()> {
        self.with_player_mut(player_id, |player| {
            player.items.extend(items);
            Ok(())
        })
    }

    /// Reads the entries present among `keys`.
    pub fn load_items(
        &self,
        player_id: &Uuid,
        keys: &BTreeSet<String>,
    ) -> ServerResult<BTreeMap<String, Scalar>> {
        self.with_player(player_id, |player| {
            Ok(keys
                .iter()
                .filter_map(|k| player.items.get(k).map(|v| (k.clone(), v.clone())))
                .collect())
        })
    }

    /// Deletes an entry.
    pub fn delete_item(&self, player_id: &Uuid, key: &str) -> ServerResult<()> {
        self.with_player_mut(player_id, |player| {
            player
                .items
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| ServerError::NotFound(format!("key '{}'", key)))
        })
    }

    /// Writes a file, replacing any previous contents.
    pub fn save_file(&self, player_id: &Uuid, key: &str, data: Bytes) -> ServerResult<()> {
        self.with_player_mut(player_id, |player| {
            player.files.insert(
                key.to_string(),
                StoredFile {
                    data,
                    modified: SystemTime::now(),
                },
            );
            Ok(())
        })
    }

    /// Reads a file.
    pub fn load_file(&self, player_id: &Uuid, key: &str) -> ServerResult<Bytes> {
        self.with_player(player_id, |player| {
            player
                .files
                .get(key)
                .map(|f| f.data.clone())
                .ok_or_else(|| file_not_found(key))
        })
    }

    /// Reads the metadata of a file.
    pub fn file_metadata(&self, player_id: &Uuid, key: &str) -> ServerResult<FileMetadata> {
        self.with_player(player_id, |player| {
            player
                .files
                .get(key)
                .map(|f| f.metadata(key))
                .ok_or_else(|| file_not_found(key))
        })
    }

    /// Lists the metadata of every file, ordered by name.
    pub fn list_files(&self, player_id: &Uuid) -> ServerResult<Vec<FileMetadata>> {
        self.with_player(player_id, |player| {
            Ok(player
                .files
                .iter()
                .map(|(key, file)| file.metadata(key))
                .collect())
        })
    }

    /// Deletes a file.
    pub fn delete_file(&self, player_id: &Uuid, key: &str) -> ServerResult<()> {
        self.with_player_mut(player_id, |player| {
            player
                .files
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| file_not_found(key))
        })
    }

    fn with_player<T>(
        &self,
        player_id: &Uuid,
        f: impl FnOnce(&PlayerData) -> ServerResult<T>,
    ) -> ServerResult<T> {
        let players = self.players.read();
        let player = players.get(player_id).ok_or_else(unknown_player)?;
        f(player)
    }

    fn with_player_mut<T>(
        &self,
        player_id: &Uuid,
        f: impl FnOnce(&mut PlayerData) -> ServerResult<T>,
    ) -> ServerResult<T> {
        let mut players = self.players.write();
        let player = players.get_mut(player_id).ok_or_else(unknown_player)?;
        f(player)
    }
}

fn file_not_found(key: &str) -> ServerError {
    ServerError::NotFound(format!("file '{}'", key))
}

fn unknown_player() -> ServerError {
    ServerError::NotAuthorized("unknown player".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_player() -> (PlayerStore, Uuid) {
        let store = PlayerStore::new();
        let player = Uuid::new_v4();
        store.create_player(player);
        (store, player)
    }

    #[test]
    fn items_roundtrip() {
        let (store, player) = store_with_player();
        let mut items = BTreeMap::new();
        items.insert("playerName".to_string(), Scalar::from("Paul"));
        items.insert("level".to_string(), Scalar::from(3));
        store.save_items(&player, items).unwrap();

        let keys: BTreeSet<String> = ["playerName", "missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let loaded = store.load_items(&player, &keys).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["playerName"], Scalar::from("Paul"));
        assert_eq!(store.item_count(&player), 2);
    }

    #[test]
    fn delete_missing_item() {
        let (store, player) = store_with_player();
        assert!(matches!(
            store.delete_item(&player, "nope"),
            Err(ServerError::NotFound(_))
        ));
    }

    #[test]
    fn files_lifecycle() {
        let (store, player) = store_with_player();
        store.save_file(&player, "b.bin", Bytes::from_static(b"bb")).unwrap();
        store.save_file(&player, "a.bin", Bytes::from_static(b"a")).unwrap();

        let listed = store.list_files(&player).unwrap();
        let names: Vec<_> = listed.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(names, vec!["a.bin", "b.bin"]);
        assert_eq!(store.file_metadata(&player, "b.bin").unwrap().size_bytes, 2);

        store.delete_file(&player, "a.bin").unwrap();
        assert!(store.load_file(&player, "a.bin").is_err());
        assert_eq!(&store.load_file(&player, "b.bin").unwrap()[..], b"bb");
    }

    #[test]
    fn players_are_isolated() {
        let (store, alice) = store_with_player();
        let bob = Uuid::new_v4();
        store.create_player(bob);

        store
            .save_file(&alice, "save.dat", Bytes::from_static(b"x"))
            .unwrap();
        assert!(store.list_files(&bob).unwrap().is_empty());
        assert_eq!(store.player_count(), 2);
    }

    #[test]
    fn unknown_player_is_unauthorized() {
        let store = PlayerStore::new();
        assert!(matches!(
            store.list_files(&Uuid::new_v4()),
            Err(ServerError::NotAuthorized(_))
        ));
    }
}
