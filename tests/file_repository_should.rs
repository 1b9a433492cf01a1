use chrono::Utc;
use stalker_m3u::database::portal::{
    FilePortalRepository, PortalConfig, PortalMeta, PortalRepository, portal_folder_name,
};
use tempfile::TempDir;

fn portal(display_name: &str) -> PortalConfig {
    PortalConfig {
        display_name: display_name.to_string(),
        host: "tv.example.com".to_string(),
        mac_address: "00:1A:79:12:34:56".to_string(),
        serial_number: "ABCDEF123456".to_string(),
        device_id: "dev1".to_string(),
        device_id_2: "dev2".to_string(),
        ..PortalConfig::default()
    }
}

async fn repository() -> (TempDir, FilePortalRepository) {
    let dir = tempfile::tempdir().unwrap();
    let repository = FilePortalRepository::open(dir.path().join("portals"))
        .await
        .unwrap();
    (dir, repository)
}

#[test]
fn test_folder_name_is_stable() {
    let name = portal_folder_name(
        "My Portal",
        "tv.example.com",
        "00:1A:79:12:34:56",
        "ABCDEF123456",
    );
    assert_eq!(name, "My_Portal_621b01db");

    let unsafe_name = portal_folder_name(
        "../weird/name!",
        "tv.example.com",
        "00:1A:79:12:34:56",
        "ABCDEF123456",
    );
    assert!(!unsafe_name.contains('/'));
    assert!(unsafe_name.ends_with("_621b01db"));

    let unnamed = portal_folder_name("  ", "tv.example.com", "00:1A:79:12:34:56", "ABCDEF123456");
    assert_eq!(unnamed, "portal_621b01db");
}

#[tokio::test]
async fn test_first_portal_becomes_active() {
    let (_dir, repository) = repository().await;
    assert_eq!(repository.get_active().await.unwrap(), None);

    let first = repository.create(&portal("My Portal")).await.unwrap();
    let second = repository.create(&portal("Other")).await.unwrap();

    assert_eq!(first, "My_Portal_621b01db");
    assert_eq!(repository.get_active().await.unwrap(), Some(first.clone()));

    let listed = repository.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|p| p.folder == first && p.active));
    assert!(listed.iter().any(|p| p.folder == second && !p.active));

    assert_eq!(
        repository.get(&first).await.unwrap(),
        Some(portal("My Portal"))
    );
}

#[tokio::test]
async fn test_deleting_active_portal_clears_pointer() {
    let (_dir, repository) = repository().await;
    let folder = repository.create(&portal("My Portal")).await.unwrap();

    assert!(repository.delete(&folder).await.unwrap());
    assert_eq!(repository.get_active().await.unwrap(), None);
    assert!(!repository.delete(&folder).await.unwrap());
    assert_eq!(repository.get(&folder).await.unwrap(), None);
}

#[tokio::test]
async fn test_update_only_touches_existing_folders() {
    let (_dir, repository) = repository().await;
    let folder = repository.create(&portal("My Portal")).await.unwrap();

    let updated = PortalConfig {
        low_latency: true,
        ..portal("My Portal")
    };
    assert!(repository.update(&folder, &updated).await.unwrap());
    assert_eq!(repository.get(&folder).await.unwrap(), Some(updated.clone()));

    assert!(!repository.update("missing_1234abcd", &updated).await.unwrap());
}

#[tokio::test]
async fn test_saved_playlist_round_trip() {
    let (_dir, repository) = repository().await;
    let folder = repository.create(&portal("My Portal")).await.unwrap();

    let meta = PortalMeta {
        saved_at: Utc::now(),
        host: "tv.example.com".to_string(),
        channel_count: 2,
        config: portal("My Portal"),
    };
    repository
        .save_playlist(&folder, "#EXTM3U\n", &meta)
        .await
        .unwrap();

    assert_eq!(
        repository.load_saved(&folder, "playlist.m3u8").await.unwrap(),
        Some("#EXTM3U\n".to_string())
    );
    assert_eq!(
        repository.load_meta(&folder).await.unwrap().map(|m| m.channel_count),
        Some(2)
    );
    assert!(repository.list().await.unwrap()[0].has_saved_playlist);

    assert!(repository.delete_saved(&folder).await.unwrap());
    assert_eq!(repository.load_saved(&folder, "playlist.m3u8").await.unwrap(), None);
    assert_eq!(repository.load_meta(&folder).await.unwrap(), None);
    assert!(!repository.delete_saved(&folder).await.unwrap());
}

#[tokio::test]
async fn test_paths_cannot_escape_the_store() {
    let (dir, repository) = repository().await;
    std::fs::write(dir.path().join("secret.txt"), "nope").unwrap();
    let folder = repository.create(&portal("My Portal")).await.unwrap();

    assert_eq!(repository.get("..").await.unwrap(), None);
    assert_eq!(repository.load_saved("..", "secret.txt").await.unwrap(), None);
    assert_eq!(
        repository
            .load_saved(&folder, "../../secret.txt")
            .await
            .unwrap(),
        None
    );
    assert!(!repository.delete("../portals").await.unwrap());
}

#[tokio::test]
async fn test_reopening_picks_an_existing_folder() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("portals");
    std::fs::create_dir_all(root.join("Existing_00000000")).unwrap();

    let repository = FilePortalRepository::open(&root).await.unwrap();

    assert_eq!(
        repository.get_active().await.unwrap().as_deref(),
        Some("Existing_00000000")
    );
}
