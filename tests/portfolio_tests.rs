use std::sync::Arc;

use folio::core::models::{About, Experience, PortfolioDocument, Project, Skill, SocialLink};
use folio::core::portfolio::PortfolioRepository;
use folio::errors::PortfolioError;
use folio::storage::{DocumentStore, FileStore};

fn sample_document() -> PortfolioDocument {
    PortfolioDocument {
        about: About {
            name: "Ada Lovelace".into(),
            title: "Engineer".into(),
            bio: "Writes programs for engines that do not exist yet.".into(),
            email: "ada@example.com".into(),
            location: "London".into(),
            avatar: Some("/uploads/avatar-1-ada.png".into()),
            socials: Some(vec![SocialLink {
                id: "s1".into(),
                platform: "GitHub".into(),
                url: "https://github.com/ada".into(),
                handle: Some("@ada".into()),
                icon: None,
            }]),
        },
        skills: vec![Skill {
            id: "k1".into(),
            name: "Rust".into(),
            level: 90,
            category: "Languages".into(),
            icon: None,
        }],
        experiences: vec![Experience {
            id: "e1".into(),
            title: "Analyst".into(),
            company: "Analytical Engine Co".into(),
            period: "1842 - 1843".into(),
            description: "Notes on the engine.".into(),
            technologies: vec!["punch cards".into()],
        }],
        projects: vec![Project {
            id: "p1".into(),
            title: "Note G".into(),
            description: "Bernoulli numbers.".into(),
            image: None,
            technologies: vec![],
            link: Some("https://example.com/note-g".into()),
            github: None,
        }],
    }
}

fn file_repo(dir: &tempfile::TempDir) -> (PortfolioRepository, FileStore) {
    let store = FileStore::new(dir.path().join("portfolio.json"));
    (PortfolioRepository::new(Arc::new(store.clone())), store)
}

#[tokio::test]
async fn test_first_read_materializes_default_document() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, store) = file_repo(&dir);

    let doc = repo.get().await.unwrap();
    assert_eq!(doc, PortfolioDocument::default());
    assert_eq!(doc.about.socials, Some(vec![]));

    let raw = store.load().await.unwrap().expect("default persisted");
    let persisted: PortfolioDocument = serde_json::from_str(&raw).unwrap();
    assert_eq!(persisted, doc);
}

#[tokio::test]
async fn test_save_then_get_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = file_repo(&dir);
    let doc = sample_document();

    repo.save(&doc).await.unwrap();
    let loaded = repo.get().await.unwrap();
    assert_eq!(loaded, doc);
    assert_eq!(
        serde_json::to_string(&loaded).unwrap(),
        serde_json::to_string(&doc).unwrap()
    );
}

#[tokio::test]
async fn test_absent_optional_fields_stay_absent() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, store) = file_repo(&dir);

    repo.save(&sample_document()).await.unwrap();
    let raw = store.load().await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert!(value["projects"][0].get("image").is_none());
    assert!(value["projects"][0].get("github").is_none());
    assert!(value["skills"][0].get("icon").is_none());
    assert_eq!(value["about"]["avatar"], "/uploads/avatar-1-ada.png");
}

#[tokio::test]
async fn test_save_overwrites_whole_document() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, _) = file_repo(&dir);

    repo.save(&sample_document()).await.unwrap();
    let mut replacement = PortfolioDocument::default();
    replacement.about.name = "Grace".into();
    repo.save(&replacement).await.unwrap();

    let loaded = repo.get().await.unwrap();
    assert_eq!(loaded, replacement);
    assert!(loaded.skills.is_empty());
}

#[tokio::test]
async fn test_invalid_skill_level_is_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, store) = file_repo(&dir);

    let mut doc = sample_document();
    doc.skills[0].level = 150;
    let err = repo.save(&doc).await.unwrap_err();
    assert!(matches!(err, PortfolioError::Validation(_)));
    assert_eq!(store.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_corrupt_document_is_reported_not_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let (repo, store) = file_repo(&dir);
    store.store("{\"about\":").await.unwrap();

    let err = repo.get().await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(err.to_string().contains("corrupt portfolio document"));
    assert_eq!(store.load().await.unwrap().as_deref(), Some("{\"about\":"));
}

#[tokio::test]
async fn test_write_failure_names_the_backend() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the document should be makes the rename fail.
    std::fs::create_dir_all(dir.path().join("portfolio.json/occupied")).unwrap();
    let (repo, _) = file_repo(&dir);

    let err = repo.save(&sample_document()).await.unwrap_err();
    match err {
        PortfolioError::Storage { backend, message } => {
            assert_eq!(backend.to_string(), "file");
            assert!(message.contains("portfolio.json"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
