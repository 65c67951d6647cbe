//! Integration tests for `AccessStore`: password lifecycle, selection
//! atomicity, equipment defaults and reference integrity.

use itaccess::access::{AccessDefaults, NewAccess, SslKind};
use itaccess::errors::ItAccessError;
use itaccess::store::{AccessStore, NewEquipment, StoreOptions};
use tempfile::TempDir;

fn store() -> AccessStore {
    AccessStore::open_in_memory(StoreOptions::default()).expect("in-memory store")
}

fn add(store: &AccessStore, name: &str, password: Option<&str>) -> i64 {
    store
        .create_access(NewAccess {
            name: name.into(),
            password: password.map(str::to_string),
            ..NewAccess::default()
        })
        .unwrap()
}

/// An IT-manager partner, a site and an equipment linked to both.
fn server_fixture(store: &AccessStore) -> (i64, i64, i64) {
    let alice = store.add_partner("Alice", true).unwrap();
    let hq = store.add_site("HQ", None).unwrap();
    let server = store
        .add_equipment(&NewEquipment {
            name: "Server1".into(),
            partner_id: Some(alice),
            site_id: Some(hq),
        })
        .unwrap();
    (alice, hq, server)
}

// ---------------------------------------------------------------------------
// Creation and context defaults
// ---------------------------------------------------------------------------

#[test]
fn access_created_from_equipment_gets_its_partner_and_site() {
    let store = store();
    let (alice, hq, server) = server_fixture(&store);

    let equipment = store.equipment(server).unwrap();
    let id = store
        .create_access(
            NewAccess {
                name: "admin".into(),
                equipment_id: Some(server),
                ..NewAccess::default()
            }
            .with_defaults(AccessDefaults::from_equipment(Some(&equipment))),
        )
        .unwrap();

    let access = store.access(id).unwrap();
    assert_eq!(access.partner_id, Some(alice));
    assert_eq!(access.site_id, Some(hq));
    assert_eq!(access.equipment_id, Some(server));
    assert!(access.active);
    assert!(!access.is_encrypted());
}

#[test]
fn access_without_context_belongs_to_default_company() {
    let store = store();
    let id = add(&store, "root", None);

    let access = store.access(id).unwrap();
    assert_eq!(access.partner_id, None);
    assert_eq!(access.site_id, None);
    assert_eq!(
        store.company(access.company_id).unwrap().name,
        "My Company"
    );
}

#[test]
fn clearing_equipment_clears_partner_but_keeps_site() {
    let store = store();
    let (_, hq, server) = server_fixture(&store);
    let equipment = store.equipment(server).unwrap();
    let id = store
        .create_access(
            NewAccess {
                name: "admin".into(),
                equipment_id: Some(server),
                ..NewAccess::default()
            }
            .with_defaults(AccessDefaults::from_equipment(Some(&equipment))),
        )
        .unwrap();

    let access = store.set_equipment(id, None).unwrap();
    assert_eq!(access.equipment_id, None);
    assert_eq!(access.partner_id, None);
    assert_eq!(access.site_id, Some(hq));
    assert_eq!(store.access(id).unwrap().partner_id, None);
}

#[test]
fn partner_must_be_it_manager() {
    let store = store();
    let bob = store.add_partner("Bob", false).unwrap();

    let err = store
        .create_access(NewAccess {
            name: "admin".into(),
            partner_id: Some(bob),
            ..NewAccess::default()
        })
        .unwrap_err();
    assert!(matches!(err, ItAccessError::PartnerNotItManager(id) if id == bob));
}

/// Equipment whose partner is not flagged as an IT manager.
fn vendor_server(store: &AccessStore) -> (i64, i64) {
    let bob = store.add_partner("Bob", false).unwrap();
    let server = store
        .add_equipment(&NewEquipment {
            name: "Server1".into(),
            partner_id: Some(bob),
            site_id: None,
        })
        .unwrap();
    (bob, server)
}

#[test]
fn equipment_partner_is_inherited_without_it_flag() {
    let store = store();
    let (bob, server) = vendor_server(&store);
    let equipment = store.equipment(server).unwrap();

    let id = store
        .create_access(
            NewAccess {
                name: "admin".into(),
                equipment_id: Some(server),
                ..NewAccess::default()
            }
            .with_defaults(AccessDefaults::from_equipment(Some(&equipment))),
        )
        .unwrap();
    assert_eq!(store.access(id).unwrap().partner_id, Some(bob));
}

#[test]
fn linking_equipment_takes_its_partner_without_it_flag() {
    let store = store();
    let (bob, server) = vendor_server(&store);
    let id = add(&store, "admin", None);

    let access = store.set_equipment(id, Some(server)).unwrap();
    assert_eq!(access.partner_id, Some(bob));
    assert_eq!(store.access(id).unwrap().partner_id, Some(bob));
}

#[test]
fn explicit_partner_other_than_equipments_must_be_it_manager() {
    let store = store();
    let (_, server) = vendor_server(&store);
    let carol = store.add_partner("Carol", false).unwrap();

    let err = store
        .create_access(NewAccess {
            name: "admin".into(),
            equipment_id: Some(server),
            partner_id: Some(carol),
            ..NewAccess::default()
        })
        .unwrap_err();
    assert!(matches!(err, ItAccessError::PartnerNotItManager(id) if id == carol));
}

#[test]
fn empty_username_is_rejected() {
    let store = store();
    let err = store
        .create_access(NewAccess {
            name: "   ".into(),
            ..NewAccess::default()
        })
        .unwrap_err();
    assert!(matches!(err, ItAccessError::InvalidField { .. }));
}

// ---------------------------------------------------------------------------
// Password lifecycle
// ---------------------------------------------------------------------------

#[test]
fn generate_encrypt_decrypt_roundtrip() {
    let mut store = store();
    let id = add(&store, "admin", None);

    store.generate_passwords(&[id]).unwrap();
    let generated = store.access(id).unwrap().password().unwrap().to_string();
    assert_eq!(generated.len(), 16);

    store.encrypt_passwords(&[id]).unwrap();
    let encrypted = store.access(id).unwrap();
    assert!(encrypted.is_encrypted());
    assert_ne!(encrypted.password(), Some(generated.as_str()));

    let revealed = store.decrypt_passwords(&[id]).unwrap();
    assert_eq!(revealed.len(), 1);
    assert_eq!(revealed[0].id, id);
    assert_eq!(revealed[0].username, "admin");
    assert_eq!(revealed[0].password.as_str(), generated);

    // Decrypting does not touch the stored record.
    assert!(store.access(id).unwrap().is_encrypted());
}

#[test]
fn generated_passwords_differ_per_record() {
    let mut store = store();
    let a = add(&store, "a", None);
    let b = add(&store, "b", None);
    store.generate_passwords(&[a, b]).unwrap();

    let pa = store.access(a).unwrap().password().unwrap().to_string();
    let pb = store.access(b).unwrap().password().unwrap().to_string();
    assert_ne!(pa, pb);
}

#[test]
fn encrypting_twice_reports_already_encrypted() {
    let mut store = store();
    let id = add(&store, "admin", Some("secret"));
    store.encrypt_passwords(&[id]).unwrap();
    let stored = store.access(id).unwrap().password().map(str::to_string);

    let err = store.encrypt_passwords(&[id]).unwrap_err();
    assert_eq!(err.to_string(), "Password already encrypted");
    assert_eq!(store.access(id).unwrap().password().map(str::to_string), stored);
}

#[test]
fn encrypt_selection_is_all_or_nothing() {
    let mut store = store();
    let plain = add(&store, "plain", Some("one"));
    let done = add(&store, "done", Some("two"));
    store.encrypt_passwords(&[done]).unwrap();

    let err = store.encrypt_passwords(&[plain, done]).unwrap_err();
    assert!(matches!(err, ItAccessError::AlreadyEncrypted));

    let untouched = store.access(plain).unwrap();
    assert!(!untouched.is_encrypted());
    assert_eq!(untouched.password(), Some("one"));
}

#[test]
fn encrypt_unknown_record_fails_without_changes() {
    let mut store = store();
    let id = add(&store, "admin", Some("secret"));

    let err = store.encrypt_passwords(&[id, 999]).unwrap_err();
    assert!(matches!(
        err,
        ItAccessError::RecordNotFound { model: "Access", id: 999 }
    ));
    assert!(!store.access(id).unwrap().is_encrypted());
}

#[test]
fn decrypt_reveals_every_selected_record() {
    let mut store = store();
    let a = add(&store, "a", Some("alpha"));
    let b = add(&store, "b", Some("beta"));
    store.encrypt_passwords(&[a, b]).unwrap();

    let revealed = store.decrypt_passwords(&[a, b]).unwrap();
    let plain: Vec<&str> = revealed.iter().map(|r| r.password.as_str()).collect();
    assert_eq!(plain, ["alpha", "beta"]);
}

#[test]
fn decrypt_plaintext_record_fails() {
    let mut store = store();
    let id = add(&store, "admin", Some("plain"));
    assert!(matches!(
        store.decrypt_passwords(&[id]),
        Err(ItAccessError::NotEncrypted(_))
    ));
}

#[test]
fn set_password_after_encrypt_resets_flag() {
    let mut store = store();
    let id = add(&store, "admin", Some("old"));
    store.encrypt_passwords(&[id]).unwrap();

    store.set_password(id, "new").unwrap();
    let access = store.access(id).unwrap();
    assert!(!access.is_encrypted());
    assert_eq!(access.password(), Some("new"));
}

#[test]
fn encrypted_at_reports_recent_time() {
    let mut store = store();
    let id = add(&store, "admin", Some("secret"));
    store.encrypt_passwords(&[id]).unwrap();

    let at = store.encrypted_at(id).unwrap();
    let age = chrono::Utc::now() - at;
    assert!(age.num_seconds().abs() < 60);
}

// ---------------------------------------------------------------------------
// Installation secret
// ---------------------------------------------------------------------------

#[test]
fn secret_is_created_once_and_reused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("itaccess.db");

    let token_id;
    {
        let mut store = AccessStore::create(&path, StoreOptions::default()).unwrap();
        assert!(!store.has_secret().unwrap());
        assert!(store.bootstrap_secret().unwrap());
        assert!(!store.bootstrap_secret().unwrap());

        token_id = add(&store, "admin", Some("persisted"));
        store.encrypt_passwords(&[token_id]).unwrap();
    }

    let mut reopened = AccessStore::open(&path, StoreOptions::default()).unwrap();
    assert!(reopened.has_secret().unwrap());
    let revealed = reopened.decrypt_passwords(&[token_id]).unwrap();
    assert_eq!(revealed[0].password.as_str(), "persisted");
}

#[test]
fn encrypt_bootstraps_secret_on_first_use() {
    let mut store = store();
    let id = add(&store, "admin", Some("secret"));
    assert!(!store.has_secret().unwrap());

    store.encrypt_passwords(&[id]).unwrap();
    assert!(store.has_secret().unwrap());
}

#[test]
fn open_missing_database_fails() {
    let dir = TempDir::new().unwrap();
    let result = AccessStore::open(&dir.path().join("nope.db"), StoreOptions::default());
    assert!(matches!(result, Err(ItAccessError::DatabaseNotFound(_))));
}

// ---------------------------------------------------------------------------
// Archive and reference integrity
// ---------------------------------------------------------------------------

#[test]
fn archived_records_are_hidden_from_default_listing() {
    let mut store = store();
    let a = add(&store, "a", None);
    let b = add(&store, "b", None);

    store.set_active(&[a], false).unwrap();
    let visible: Vec<i64> = store.list_access(false).unwrap().iter().map(|x| x.id).collect();
    assert_eq!(visible, [b]);
    assert_eq!(store.list_access(true).unwrap().len(), 2);

    store.set_active(&[a], true).unwrap();
    assert_eq!(store.list_access(false).unwrap().len(), 2);
}

#[test]
fn equipment_with_access_cannot_be_deleted() {
    let store = store();
    let (_, _, server) = server_fixture(&store);
    let id = store
        .create_access(NewAccess {
            name: "admin".into(),
            equipment_id: Some(server),
            ..NewAccess::default()
        })
        .unwrap();

    assert!(matches!(
        store.delete_equipment(server),
        Err(ItAccessError::ReferenceRestricted { model: "Equipment", .. })
    ));

    store.delete_access(id).unwrap();
    store.delete_equipment(server).unwrap();
}

#[test]
fn deleting_partner_unlinks_access() {
    let store = store();
    let (alice, _, _) = server_fixture(&store);
    let id = store
        .create_access(NewAccess {
            name: "admin".into(),
            partner_id: Some(alice),
            ..NewAccess::default()
        })
        .unwrap();

    store.delete_partner(alice).unwrap();
    assert_eq!(store.access(id).unwrap().partner_id, None);
}

#[test]
fn company_with_access_cannot_be_deleted() {
    let store = store();
    let id = add(&store, "admin", None);
    let company = store.access(id).unwrap().company_id;
    assert!(matches!(
        store.delete_company(company),
        Err(ItAccessError::ReferenceRestricted { model: "Company", .. })
    ));
}

#[test]
fn ssl_artifacts_attach_replace_and_cascade() {
    let store = store();
    let id = add(&store, "web", None);

    store
        .attach_ssl(id, SslKind::Cert, Some("a.pem"), b"first")
        .unwrap();
    store
        .attach_ssl(id, SslKind::Cert, Some("b.pem"), b"second")
        .unwrap();
    store
        .attach_ssl(id, SslKind::PrivateKey, None, b"key")
        .unwrap();

    let cert = store.ssl_artifact(id, SslKind::Cert).unwrap().unwrap();
    assert_eq!(cert.filename.as_deref(), Some("b.pem"));
    assert_eq!(cert.data, b"second");
    assert_eq!(store.ssl_artifacts(id).unwrap().len(), 2);

    assert!(store.remove_ssl(id, SslKind::Cert).unwrap());
    assert!(!store.remove_ssl(id, SslKind::Cert).unwrap());

    store.delete_access(id).unwrap();
    assert!(matches!(
        store.ssl_artifacts(id),
        Err(ItAccessError::RecordNotFound { .. })
    ));
}
