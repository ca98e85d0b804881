//! Persistent storage adapter backed by ESP-IDF NVS.
//!
//! Namespaces map directly onto NVS namespaces, so `("wlan", "ssid")`
//! is visible to `idf.py nvs` tooling under the same names.  On the
//! host the adapter degrades to an in-memory map with the same
//! semantics, which the whole test suite runs against.

use crate::app::ports::{StorageError, StoragePort};

// ---------------------------------------------------------------------------
// Device implementation (ESP-IDF NVS)
// ---------------------------------------------------------------------------

#[cfg(all(target_os = "espidf", feature = "espidf"))]
mod backend {
    use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};
    use log::error;

    use super::{StorageError, StoragePort};

    pub struct NvsStorage {
        partition: EspNvsPartition<NvsDefault>,
    }

    impl NvsStorage {
        /// The partition handle is shared with the WiFi driver; clone
        /// the one taken in `main`.
        pub fn new(partition: EspNvsPartition<NvsDefault>) -> Self {
            Self { partition }
        }

        fn open(&self, namespace: &str, writable: bool) -> Result<EspNvs<NvsDefault>, StorageError> {
            EspNvs::new(self.partition.clone(), namespace, writable).map_err(|e| {
                error!("nvs: open '{namespace}' failed: {e}");
                StorageError::IoError
            })
        }
    }

    impl StoragePort for NvsStorage {
        fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
            let nvs = self.open(namespace, false)?;
            match nvs.get_raw(key, buf) {
                Ok(Some(data)) => Ok(data.len()),
                Ok(None) => Err(StorageError::NotFound),
                Err(e) => {
                    error!("nvs: read {namespace}/{key} failed: {e}");
                    Err(StorageError::IoError)
                }
            }
        }

        fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
            let mut nvs = self.open(namespace, true)?;
            nvs.set_raw(key, data).map(|_| ()).map_err(|e| {
                error!("nvs: write {namespace}/{key} failed: {e}");
                StorageError::Full
            })
        }

        fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
            let mut nvs = self.open(namespace, true)?;
            nvs.remove(key).map(|_| ()).map_err(|e| {
                error!("nvs: delete {namespace}/{key} failed: {e}");
                StorageError::IoError
            })
        }

        fn exists(&self, namespace: &str, key: &str) -> bool {
            self.open(namespace, false)
                .map(|nvs| nvs.contains(key).unwrap_or(false))
                .unwrap_or(false)
        }
    }
}

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "espidf"))]
mod backend {
    use std::collections::HashMap;

    use super::{StorageError, StoragePort};

    /// In-memory stand-in for the NVS partition.
    pub struct NvsStorage {
        entries: HashMap<String, Vec<u8>>,
        /// When set, all writes fail. Lets tests exercise flush-failure
        /// paths.
        pub fail_writes: bool,
    }

    impl NvsStorage {
        pub fn new() -> Self {
            Self {
                entries: HashMap::new(),
                fail_writes: false,
            }
        }

        fn composite(namespace: &str, key: &str) -> String {
            format!("{namespace}::{key}")
        }
    }

    impl Default for NvsStorage {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoragePort for NvsStorage {
        fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
            let data = self
                .entries
                .get(&Self::composite(namespace, key))
                .ok_or(StorageError::NotFound)?;
            if data.len() > buf.len() {
                return Err(StorageError::IoError);
            }
            buf[..data.len()].copy_from_slice(data);
            Ok(data.len())
        }

        fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::Full);
            }
            self.entries
                .insert(Self::composite(namespace, key), data.to_vec());
            Ok(())
        }

        fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
            self.entries.remove(&Self::composite(namespace, key));
            Ok(())
        }

        fn exists(&self, namespace: &str, key: &str) -> bool {
            self.entries.contains_key(&Self::composite(namespace, key))
        }
    }
}

pub use backend::NvsStorage;
