//!
//! The launch descriptor store.
//!

pub mod password_policy;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::Deserialize;
use serde::Serialize;

use crate::descriptor::Descriptor;
use crate::error::Error;

use self::password_policy::PasswordPolicy;

///
/// The store file layout.
///
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    /// The descriptors by name.
    #[serde(default)]
    descriptors: BTreeMap<String, Descriptor>,
}

///
/// The launch descriptor store.
///
/// Reads are concurrent, writes are serialized. With a backing file, every mutation
/// rewrites the file before the write lock is released.
///
#[derive(Debug)]
pub struct Store {
    /// The backing file. `None` keeps the store in memory.
    path: Option<PathBuf>,
    /// The password persistence policy.
    policy: PasswordPolicy,
    /// The descriptors by name.
    descriptors: RwLock<BTreeMap<String, Descriptor>>,
}

impl Store {
    ///
    /// Creates an empty in-memory store.
    ///
    /// Passwords are kept, since nothing leaves the process.
    ///
    pub fn in_memory() -> Self {
        Self {
            path: None,
            policy: PasswordPolicy::Plaintext,
            descriptors: RwLock::new(BTreeMap::new()),
        }
    }

    ///
    /// Opens the store backed by the JSON file at `path`.
    ///
    /// A missing file is an empty store. The file is created on the first write.
    ///
    pub fn open(path: PathBuf, policy: PasswordPolicy) -> Result<Self, Error> {
        let descriptors = if path.exists() {
            let data = std::fs::read(path.as_path()).map_err(|error| Error::Store {
                path: path.clone(),
                error,
            })?;
            if data.iter().all(u8::is_ascii_whitespace) {
                BTreeMap::new()
            } else {
                serde_json::from_slice::<StoreFile>(data.as_slice())
                    .map_err(|error| Error::StoreFormat {
                        path: path.clone(),
                        error,
                    })?
                    .descriptors
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = ?path, count = descriptors.len(), "descriptor store opened");

        Ok(Self {
            path: Some(path),
            policy,
            descriptors: RwLock::new(descriptors),
        })
    }

    ///
    /// Saves the descriptor under `name`, replacing any existing one.
    ///
    pub fn save(&self, name: &str, descriptor: Descriptor) -> Result<(), Error> {
        if name.trim().is_empty() {
            return Err(Error::InvalidName);
        }
        let descriptor = match self.policy {
            PasswordPolicy::Plaintext => descriptor,
            PasswordPolicy::Discard => descriptor.without_password(),
        };

        let mut descriptors = self.descriptors.write().expect("Sync");
        let mut updated = descriptors.clone();
        if updated.insert(name.to_owned(), descriptor).is_some() {
            tracing::debug!(name, "descriptor replaced");
        }
        self.persist(&updated)?;
        *descriptors = updated;
        Ok(())
    }

    ///
    /// Loads the descriptor stored under `name`.
    ///
    pub fn load(&self, name: &str) -> Result<Descriptor, Error> {
        self.descriptors
            .read()
            .expect("Sync")
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(name.to_owned()))
    }

    ///
    /// Returns the stored names in lexicographic order.
    ///
    pub fn list(&self) -> Vec<String> {
        self.descriptors
            .read()
            .expect("Sync")
            .keys()
            .cloned()
            .collect()
    }

    ///
    /// Removes the descriptor stored under `name`, if any.
    ///
    pub fn delete(&self, name: &str) -> Result<(), Error> {
        let mut descriptors = self.descriptors.write().expect("Sync");
        if !descriptors.contains_key(name) {
            return Ok(());
        }
        let mut updated = descriptors.clone();
        updated.remove(name);
        self.persist(&updated)?;
        *descriptors = updated;
        Ok(())
    }

    ///
    /// Returns the backing file path.
    ///
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    ///
    /// Writes the descriptors to the backing file through a temporary sibling.
    ///
    /// The temporary file is created readable by the owner only, and the mode survives the rename.
    ///
    fn persist(&self, descriptors: &BTreeMap<String, Descriptor>) -> Result<(), Error> {
        let path = match self.path.as_ref() {
            Some(path) => path,
            None => return Ok(()),
        };
        let store_error = |error: std::io::Error| Error::Store {
            path: path.to_owned(),
            error,
        };

        let parent = match path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent).map_err(store_error)?;
                parent
            }
            None => Path::new("."),
        };

        let file = StoreFile {
            descriptors: descriptors.to_owned(),
        };
        let data = serde_json::to_vec_pretty(&file).expect("Always valid");

        let mut temporary = tempfile::NamedTempFile::new_in(parent).map_err(store_error)?;
        temporary
            .write_all(data.as_slice())
            .and_then(|()| temporary.as_file().sync_all())
            .map_err(store_error)?;
        temporary
            .persist(path.as_path())
            .map_err(|error| store_error(error.error))?;
        Ok(())
    }
}
