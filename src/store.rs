use crate::*;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const CREDENTIAL_FILE: &str = "credentials.env";

/// The full stored credential record. Field names map to the on-disk
/// `NAME=value` keys; absent fields are `None`, never an error.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub private_key: Option<String>,
    pub public_key: Option<String>,
    pub pk_x: Option<String>,
    pub pk_y: Option<String>,
}

/// The public subset of the credential record.
///
/// There is no private-key field on this type at all, so callers that do
/// not explicitly request full access cannot receive the private scalar.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicCredentials {
    pub public_key: Option<String>,
    pub pk_x: Option<String>,
    pub pk_y: Option<String>,
}

/// On-disk custody of a voter key pair.
///
/// Credentials live in a single `NAME=value` file under the configured
/// storage directory. The directory is created with mode 0700 and the file
/// is restricted to 0600 after every write (no-op on platforms without
/// POSIX permission bits). Writes are wholesale: write to a temporary file,
/// restrict it, then rename over the old file.
pub struct SecureKeyStore {
    storage_dir: PathBuf,
}

impl SecureKeyStore {
    pub fn new(config: &VoterConfig) -> Self {
        SecureKeyStore {
            storage_dir: config.storage_dir.clone(),
        }
    }

    fn credential_path(&self) -> PathBuf {
        self.storage_dir.join(CREDENTIAL_FILE)
    }

    /// Create the storage directory with owner-only permissions. Idempotent.
    pub fn ensure_storage_location(&self) -> Result<(), Error> {
        let result = {
            #[cfg(unix)]
            {
                use std::os::unix::fs::DirBuilderExt;
                fs::DirBuilder::new()
                    .recursive(true)
                    .mode(0o700)
                    .create(&self.storage_dir)
            }
            #[cfg(not(unix))]
            {
                fs::create_dir_all(&self.storage_dir)
            }
        };
        result.map_err(|e| {
            tracing::error!(dir = %self.storage_dir.display(), error = %e, "failed to create key storage directory");
            Error::StorageWrite(e)
        })
    }

    /// Overwrite the credential file with the given record.
    ///
    /// Only present fields are written, in fixed order. Failures are logged
    /// and propagated unmodified as [`Error::StorageWrite`].
    pub fn store_credentials(&self, credentials: &Credentials) -> Result<(), Error> {
        self.ensure_storage_location()?;

        let mut contents = String::new();
        let fields = [
            ("PRIVATE_KEY", &credentials.private_key),
            ("PUBLIC_KEY", &credentials.public_key),
            ("PK_X", &credentials.pk_x),
            ("PK_Y", &credentials.pk_y),
        ];
        for (name, value) in &fields {
            if let Some(value) = value {
                contents.push_str(name);
                contents.push('=');
                contents.push_str(value);
                contents.push('\n');
            }
        }

        let path = self.credential_path();
        self.write_restricted(&path, &contents).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to store credentials");
            Error::StorageWrite(e)
        })
    }

    // Temp file, flush, restrict, rename. The handle is scoped so the file
    // is closed before the rename, and permissions are already restricted
    // by the time the record becomes visible under its final name.
    fn write_restricted(&self, path: &Path, contents: &str) -> Result<(), std::io::Error> {
        let tmp = path.with_extension("env.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }
        fs::rename(&tmp, path)
    }

    /// Retrieve only the public fields of the stored record.
    pub fn retrieve_public(&self) -> Result<PublicCredentials, Error> {
        let full = self.retrieve_full()?;
        Ok(PublicCredentials {
            public_key: full.public_key,
            pk_x: full.pk_x,
            pk_y: full.pk_y,
        })
    }

    /// Retrieve the full stored record, private scalar included.
    ///
    /// A missing credential file yields an empty record, matching the
    /// absent-fields-are-None contract.
    pub fn retrieve_full(&self) -> Result<Credentials, Error> {
        let path = self.credential_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Credentials::default());
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read credentials");
                return Err(Error::StorageRead(e));
            }
        };

        let mut credentials = Credentials::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (name, value) = match line.split_once('=') {
                Some(pair) => pair,
                None => continue,
            };
            let value = Some(value.to_string());
            match name {
                "PRIVATE_KEY" => credentials.private_key = value,
                "PUBLIC_KEY" => credentials.public_key = value,
                "PK_X" => credentials.pk_x = value,
                "PK_Y" => credentials.pk_y = value,
                _ => {}
            }
        }
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> SecureKeyStore {
        SecureKeyStore::new(&VoterConfig::new(dir.join("keys")))
    }

    #[test]
    fn round_trip_returns_exactly_the_stored_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let credentials = Credentials {
            private_key: Some("aa".repeat(32)),
            public_key: Some("02".to_string() + &"bb".repeat(32)),
            pk_x: Some("cc".repeat(32)),
            pk_y: Some("dd".repeat(32)),
        };
        store.store_credentials(&credentials).unwrap();

        let loaded = store.retrieve_full().unwrap();
        assert_eq!(loaded, credentials);
    }

    #[test]
    fn partial_record_round_trips_without_extraneous_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let credentials = Credentials {
            private_key: None,
            public_key: Some("02abc0".to_string()),
            pk_x: None,
            pk_y: None,
        };
        store.store_credentials(&credentials).unwrap();

        let loaded = store.retrieve_full().unwrap();
        assert_eq!(loaded, credentials);
        assert!(loaded.private_key.is_none());
        assert!(loaded.pk_x.is_none());
    }

    #[test]
    fn public_retrieval_carries_no_private_field() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let keypair = KeyPair::generate().unwrap();
        store
            .store_credentials(&Credentials::from(&keypair))
            .unwrap();

        // PublicCredentials has no private_key field; check the public
        // fields came through and the serialized form never mentions one.
        let public = store.retrieve_public().unwrap();
        assert_eq!(public.public_key, Some(keypair.public.to_hex()));
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("private"));
    }

    #[test]
    fn missing_file_reads_as_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert_eq!(store.retrieve_full().unwrap(), Credentials::default());
    }

    #[test]
    fn store_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let first = Credentials {
            private_key: Some("11".repeat(32)),
            public_key: Some("02aa".to_string()),
            pk_x: Some("22".repeat(32)),
            pk_y: Some("33".repeat(32)),
        };
        store.store_credentials(&first).unwrap();

        let second = Credentials {
            private_key: None,
            public_key: Some("03bb".to_string()),
            pk_x: None,
            pk_y: None,
        };
        store.store_credentials(&second).unwrap();

        // No leftover fields from the first record.
        assert_eq!(store.retrieve_full().unwrap(), second);
    }

    #[cfg(unix)]
    #[test]
    fn storage_permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store
            .store_credentials(&Credentials {
                private_key: Some("ee".repeat(32)),
                ..Credentials::default()
            })
            .unwrap();

        let dir_mode = fs::metadata(dir.path().join("keys"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(dir_mode & 0o777, 0o700);

        let file_mode = fs::metadata(dir.path().join("keys").join(CREDENTIAL_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);
    }

    #[test]
    fn ensure_storage_location_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.ensure_storage_location().unwrap();
        store.ensure_storage_location().unwrap();
    }
}
