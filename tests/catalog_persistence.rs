use anyhow::Result;
use mod_catalog_bot::catalog::{Catalog, CatalogError, ModRecord, SqliteCatalog};
use tempfile::TempDir;

fn record(id: &str, name: &str) -> ModRecord {
    ModRecord {
        id: id.to_string(),
        name: name.to_string(),
        download_url: format!("https://modrinth.com/mod/{id}"),
    }
}

#[tokio::test]
async fn test_saved_mods_survive_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("mods.db");

    {
        let catalog = SqliteCatalog::open(&path)?;
        catalog.insert(record("AANobbMI", "Sodium")).await?;
        catalog.insert(record("P7dR8mSH", "Fabric API")).await?;
        catalog.remove("P7dR8mSH").await?;
        catalog.insert(record("mOgUt4GM", "Mod Menu")).await?;
    }

    let reopened = SqliteCatalog::open(&path)?;
    let names: Vec<String> = reopened
        .list_all()
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, ["Sodium", "Mod Menu"]);
    assert!(reopened.exists("AANobbMI").await?);
    assert!(!reopened.exists("P7dR8mSH").await?);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_rejected_after_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("mods.db");

    SqliteCatalog::open(&path)?
        .insert(record("AANobbMI", "Sodium"))
        .await?;

    let reopened = SqliteCatalog::open(&path)?;
    let err = reopened.insert(record("AANobbMI", "Sodium again")).await;
    assert!(matches!(err, Err(CatalogError::DuplicateKey(id)) if id == "AANobbMI"));
    assert_eq!(
        reopened.get("AANobbMI").await?.map(|r| r.name),
        Some("Sodium".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_open_fails_for_missing_directory() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("absent").join("mods.db");
    assert!(matches!(
        SqliteCatalog::open(&path),
        Err(CatalogError::Database(_))
    ));
    Ok(())
}
