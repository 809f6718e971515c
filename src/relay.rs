use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::Error;
use crate::transport::Transport;

/// One set of outbound relay credentials plus the sender it speaks for.
///
/// Identities are immutable once admitted to a pool, and are known only by
/// their position in it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayIdentity {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub secret: String,
    pub from_address: String,
    pub display_name: String,
}

impl RelayIdentity {
    /// `username (display name)`, as shown in status lines
    pub fn label(&self) -> String {
        format!("{} ({})", self.username, self.display_name)
    }

    pub fn is_complete(&self) -> bool {
        !self.host.is_empty()
            && self.port != 0
            && !self.username.is_empty()
            && !self.secret.is_empty()
            && !self.from_address.is_empty()
            && !self.display_name.is_empty()
    }
}

impl fmt::Debug for RelayIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RelayIdentity")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("secret", &"********")
            .field("from_address", &self.from_address)
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Pick the identity handling attempt `attempt_index`.
///
/// Each identity handles `rotation_count` consecutive attempts before the
/// next one takes over, wrapping after the last. Returns the position used.
///
/// `rotation_count` must be at least 1 and `pool` must not be empty.
pub fn select(attempt_index: usize, rotation_count: usize, pool: &[RelayIdentity]) -> (usize, &RelayIdentity) {
    let position = (attempt_index / rotation_count) % pool.len();
    (position, &pool[position])
}

// On-disk form: a list of [[relay]] tables
#[derive(Default, Serialize, Deserialize)]
struct PoolFile {
    #[serde(default)]
    relay: Vec<RelayIdentity>,
}

/// An ordered collection of relay identities
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelayPool {
    identities: Vec<RelayIdentity>,
}

impl RelayPool {
    pub fn new() -> RelayPool {
        RelayPool {
            identities: Vec::new(),
        }
    }

    pub fn from_identities(identities: Vec<RelayIdentity>) -> RelayPool {
        RelayPool { identities }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn identities(&self) -> &[RelayIdentity] {
        &self.identities
    }

    pub fn get(&self, position: usize) -> Option<&RelayIdentity> {
        self.identities.get(position)
    }

    pub fn select(&self, attempt_index: usize, rotation_count: usize) -> Option<(usize, &RelayIdentity)> {
        if self.identities.is_empty() || rotation_count == 0 {
            return None;
        }
        Some(select(attempt_index, rotation_count, &self.identities))
    }

    /// Test-hand-off through `identity` and append it only if that succeeds
    pub fn admit<T: Transport>(&mut self, identity: RelayIdentity, transport: &mut T) -> Result<usize, Error> {
        if !identity.is_complete() {
            return Err(Error::Validation("All relay fields must be filled".to_owned()));
        }

        if let Err(e) = transport.test_connect(&identity) {
            warn!("(relay) test handoff through {}:{} failed: {}", identity.host, identity.port, e);
            return Err(e.into());
        }

        info!("(relay) admitted {}:{} - {}", identity.host, identity.port, identity.username);
        self.identities.push(identity);
        Ok(self.identities.len() - 1)
    }

    pub fn remove(&mut self, position: usize) -> Option<RelayIdentity> {
        if position < self.identities.len() {
            Some(self.identities.remove(position))
        } else {
            None
        }
    }

    pub fn from_toml_str(s: &str) -> Result<RelayPool, Error> {
        let file: PoolFile = toml::from_str(s)?;
        Ok(RelayPool::from_identities(file.relay))
    }

    pub fn to_toml_string(&self) -> Result<String, Error> {
        let file = PoolFile {
            relay: self.identities.clone(),
        };
        Ok(toml::to_string(&file)?)
    }

    /// Load a pool saved by `save`. A missing file is an empty pool.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RelayPool, Error> {
        match fs::read_to_string(path) {
            Ok(contents) => RelayPool::from_toml_str(&contents),
            Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(RelayPool::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}
