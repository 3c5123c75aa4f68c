//! Integration tests for the nspm vault module.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use nspm::crypto::{Argon2Params, SALT_LEN};
use nspm::errors::NspmError;
use nspm::vault::format::{self, CIPHERTEXTS_FILE, MASTER_FILE, SALTS_FILE, SERVICES_FILE};
use nspm::vault::{CancelToken, VaultSession, VaultStore};
use tempfile::TempDir;

const MASTER: &[u8] = b"Tr0ub4dor&3!xyzzy";

fn fast() -> Argon2Params {
    Argon2Params {
        memory_kib: 8_192,
        iterations: 1,
        parallelism: 1,
    }
}

/// Helper: a vault path inside a fresh temp dir (not yet created).
fn vault_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("vault");
    (dir, path)
}

fn session_of(pairs: &[(&str, &str)]) -> VaultSession {
    let mut session = VaultSession::new();
    for (service, password) in pairs {
        session.add(service, password).unwrap();
    }
    session
}

/// Initialize a vault and save `pairs` into it.
fn seeded(pairs: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let (dir, path) = vault_path();
    let store = VaultStore::initialize(&path, MASTER, &fast()).unwrap();
    store.save(&session_of(pairs), MASTER).unwrap();
    (dir, path)
}

fn assert_corrupt(path: &Path) {
    let store = VaultStore::open(path).unwrap();
    let result = store.load(MASTER);
    assert!(
        matches!(result, Err(NspmError::CorruptVault(_))),
        "expected CorruptVault, got {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

#[test]
fn initialize_creates_an_empty_valid_vault() {
    let (_dir, path) = vault_path();
    let store = VaultStore::initialize(&path, MASTER, &fast()).unwrap();

    assert!(VaultStore::validate(&path));
    for file in [MASTER_FILE, SERVICES_FILE, SALTS_FILE, CIPHERTEXTS_FILE] {
        assert!(path.join(file).is_file(), "{file} missing");
    }
    assert!(store.load(MASTER).unwrap().is_empty());
    assert_eq!(store.master_record().argon2_params, fast());
    assert_eq!(store.path(), path.as_path());
}

#[test]
fn reopened_vault_keeps_its_own_kdf_params() {
    let (_dir, path) = seeded(&[]);
    let store = VaultStore::open(&path).unwrap();
    assert_eq!(store.master_record().argon2_params, fast());
}

#[test]
fn initialize_refuses_existing_path() {
    let (_dir, path) = vault_path();
    fs::create_dir(&path).unwrap();

    assert!(matches!(
        VaultStore::initialize(&path, MASTER, &fast()),
        Err(NspmError::AlreadyExists(_))
    ));
}

#[test]
fn initialize_with_bad_params_creates_nothing() {
    let (_dir, path) = vault_path();
    let params = Argon2Params {
        memory_kib: 16,
        ..fast()
    };

    assert!(matches!(
        VaultStore::initialize(&path, MASTER, &params),
        Err(NspmError::ConfigError(_))
    ));
    assert!(!path.exists());
}

#[test]
fn tampered_kdf_params_are_corruption_not_a_crash() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    let original = fs::read_to_string(path.join(MASTER_FILE)).unwrap();

    for (field, value) in [("memory_kib", u32::MAX), ("iterations", u32::MAX)] {
        let mut record: serde_json::Value = serde_json::from_str(&original).unwrap();
        record["argon2_params"][field] = value.into();
        fs::write(path.join(MASTER_FILE), record.to_string()).unwrap();

        let result = VaultStore::open(&path);
        assert!(
            matches!(result, Err(NspmError::CorruptVault(_))),
            "{field}: expected CorruptVault"
        );
    }
}

#[cfg(unix)]
#[test]
fn vault_files_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;

    assert_eq!(mode(&path), 0o700);
    for file in [MASTER_FILE, SERVICES_FILE, SALTS_FILE, CIPHERTEXTS_FILE] {
        assert_eq!(mode(&path.join(file)), 0o600, "{file}");
    }
}

// ---------------------------------------------------------------------------
// Open / validate
// ---------------------------------------------------------------------------

#[test]
fn open_missing_vault_is_not_found() {
    let (_dir, path) = vault_path();
    assert!(matches!(
        VaultStore::open(&path),
        Err(NspmError::VaultNotFound(_))
    ));
}

#[test]
fn validate_rejects_directory_missing_a_resource() {
    let (_dir, path) = seeded(&[]);
    fs::remove_file(path.join(SALTS_FILE)).unwrap();

    assert!(!VaultStore::validate(&path));
    assert!(matches!(
        VaultStore::open(&path),
        Err(NspmError::CorruptVault(_))
    ));
}

#[test]
fn extra_files_in_the_vault_are_tolerated() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    fs::write(path.join("notes.txt"), "hello").unwrap();

    let store = VaultStore::open(&path).unwrap();
    assert_eq!(store.load(MASTER).unwrap().get("github"), Some("p@ssw0rd1"));
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn github_scenario_roundtrips_across_reopen() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);

    // A fresh handle stands in for a new process.
    let store = VaultStore::open(&path).unwrap();
    let session = store.load(MASTER).unwrap();
    assert_eq!(session, session_of(&[("github", "p@ssw0rd1")]));

    assert!(store.verify_master(MASTER).unwrap());
    assert!(!store.verify_master(b"Tr0ub4dor&3!xyzzY").unwrap());
    assert!(matches!(
        store.load(b"Tr0ub4dor&3!xyzzY"),
        Err(NspmError::WrongMasterPassword)
    ));
}

#[test]
fn removing_the_first_entry_keeps_the_second_intact() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1"), ("mail", "s3cret")]);
    let store = VaultStore::open(&path).unwrap();
    let salts_before = fs::read(path.join(SALTS_FILE)).unwrap();

    let mut session = store.load(MASTER).unwrap();
    session.remove("github").unwrap();
    store.save(&session, MASTER).unwrap();

    let reloaded = VaultStore::open(&path).unwrap().load(MASTER).unwrap();
    assert_eq!(reloaded, session_of(&[("mail", "s3cret")]));

    let salts_after = fs::read(path.join(SALTS_FILE)).unwrap();
    assert_eq!(salts_after.len(), SALT_LEN);
    assert_ne!(&salts_after[..], &salts_before[SALT_LEN..]);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn save_then_load_preserves_the_mapping() {
    let pairs = [
        ("github", "p@ssw0rd1"),
        ("bank", ""),
        ("Mail Server", "with spaces and ünïcödé"),
        ("symbols", "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~"),
        ("multi", "line one\nline two"),
    ];
    let (_dir, path) = seeded(&pairs);

    let loaded = VaultStore::open(&path).unwrap().load(MASTER).unwrap();
    assert_eq!(loaded, session_of(&pairs));
    assert_eq!(
        loaded.services().collect::<Vec<_>>(),
        pairs.iter().map(|(s, _)| *s).collect::<Vec<_>>()
    );
}

#[test]
fn resave_is_idempotent_but_rewrites_bytes() {
    let pairs = [("github", "p@ssw0rd1"), ("mail", "s3cret")];
    let (_dir, path) = seeded(&pairs);
    let store = VaultStore::open(&path).unwrap();

    let salts_1 = fs::read(path.join(SALTS_FILE)).unwrap();
    let cts_1 = fs::read(path.join(CIPHERTEXTS_FILE)).unwrap();

    let session = store.load(MASTER).unwrap();
    store.save(&session, MASTER).unwrap();

    assert_eq!(store.load(MASTER).unwrap(), session_of(&pairs));
    assert_ne!(fs::read(path.join(SALTS_FILE)).unwrap(), salts_1);
    assert_ne!(fs::read(path.join(CIPHERTEXTS_FILE)).unwrap(), cts_1);
    assert_eq!(fs::read(path.join(SERVICES_FILE)).unwrap(), b"github\nmail\n");
}

#[test]
fn flipped_ciphertext_byte_is_corruption() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1"), ("mail", "s3cret")]);
    let text = fs::read_to_string(path.join(CIPHERTEXTS_FILE)).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();

    let mut blob = BASE64.decode(&lines[1]).unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x80;
    lines[1] = BASE64.encode(&blob);
    fs::write(path.join(CIPHERTEXTS_FILE), lines.join("\n") + "\n").unwrap();

    assert_corrupt(&path);
}

#[test]
fn flipped_salt_byte_is_corruption() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    let mut salts = fs::read(path.join(SALTS_FILE)).unwrap();
    salts[3] ^= 0x01;
    fs::write(path.join(SALTS_FILE), salts).unwrap();

    assert_corrupt(&path);
}

#[test]
fn truncated_salts_are_corruption_not_a_short_read() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1"), ("mail", "s3cret")]);
    let salts = fs::read(path.join(SALTS_FILE)).unwrap();
    fs::write(path.join(SALTS_FILE), &salts[..SALT_LEN]).unwrap();

    assert_corrupt(&path);
}

#[test]
fn swapping_whole_entries_is_detected() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1"), ("mail", "s3cret")]);
    fs::write(path.join(SERVICES_FILE), "mail\ngithub\n").unwrap();

    assert_corrupt(&path);
}

#[test]
fn duplicate_service_on_disk_is_corruption() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    let mut records = format::read_entries(&path).unwrap();
    records.push(records[0].clone());
    format::commit_entries(&path, &format::encode_entries(&records).unwrap()).unwrap();

    assert_corrupt(&path);
}

#[test]
fn wrong_password_never_yields_plaintext() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    let store = VaultStore::open(&path).unwrap();

    let wrongs: [&[u8]; 3] = [b"", b"tr0ub4dor&3!xyzzy", b"Tr0ub4dor&3!xyzz"];
    for wrong in wrongs {
        assert!(matches!(
            store.load(wrong),
            Err(NspmError::WrongMasterPassword)
        ));
    }
}

#[test]
fn save_under_wrong_password_writes_nothing() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    let store = VaultStore::open(&path).unwrap();
    let before = fs::read(path.join(CIPHERTEXTS_FILE)).unwrap();

    let result = store.save(&session_of(&[("x", "y")]), b"not the master");
    assert!(matches!(result, Err(NspmError::WrongMasterPassword)));
    assert_eq!(fs::read(path.join(CIPHERTEXTS_FILE)).unwrap(), before);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn cancelled_save_leaves_the_vault_untouched() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    let store = VaultStore::open(&path).unwrap();
    let before = fs::read(path.join(SALTS_FILE)).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let result = store.save_with(&session_of(&[("a", "1"), ("b", "2")]), MASTER, &cancel);

    assert!(matches!(result, Err(NspmError::Cancelled)));
    assert_eq!(fs::read(path.join(SALTS_FILE)).unwrap(), before);
    assert_eq!(
        store.load(MASTER).unwrap(),
        session_of(&[("github", "p@ssw0rd1")])
    );
}

#[test]
fn cancelled_load_returns_no_session() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    let store = VaultStore::open(&path).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    assert!(matches!(
        store.load_with(MASTER, &cancel),
        Err(NspmError::Cancelled)
    ));
}

// ---------------------------------------------------------------------------
// Crash recovery
// ---------------------------------------------------------------------------

#[test]
fn open_discards_an_uncommitted_save() {
    let (_dir, path) = seeded(&[("github", "p@ssw0rd1")]);
    fs::write(path.join(".services.tmp"), "half\n").unwrap();
    fs::write(path.join(".salts.tmp"), [0u8; 5]).unwrap();

    let store = VaultStore::open(&path).unwrap();
    assert!(!path.join(".services.tmp").exists());
    assert!(!path.join(".salts.tmp").exists());
    assert_eq!(
        store.load(MASTER).unwrap(),
        session_of(&[("github", "p@ssw0rd1")])
    );
}
