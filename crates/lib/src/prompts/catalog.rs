//! # Prompt Template Catalog
//!
//! A read-only library of system-prompt templates, stored as one JSON file
//! per category key (`{prompts_dir}/{key}.json`). Category keys come from a
//! fixed, ordered list; anything else is rejected before touching the disk.

use crate::errors::CatalogError;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Category keys and display names, in presentation order.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("industry", "業界分析・市場調査用"),
    ("idea", "アイデア創出用"),
    ("engineer", "エンジニア用"),
    ("management", "マネジメント用"),
    ("sales", "営業・セールス用"),
    ("summary", "要約・まとめ用"),
    ("email", "メール返信用"),
    ("negotiation", "価格交渉用"),
    ("meeting", "会議準備用"),
    ("consultant", "コンサルティング用"),
    ("medical", "医療・健康相談用"),
    ("investment", "投資・資産運用用"),
    ("dating", "恋愛・デート用"),
    ("job_interview", "面接・転職対策用"),
    ("education", "教育・学習支援用"),
    ("legal", "法律・契約書用"),
    ("sns_content", "SNS・コンテンツ作成用"),
    ("startup", "起業・スタートアップ用"),
    ("programmer", "プログラマー実践用"),
    ("python_engineer", "Pythonエンジニア専門用"),
    ("ai_engineer", "AIエンジニア専門用"),
    ("chatgpt_api", "ChatGPT API活用専門用"),
    ("lawyer", "法律家・弁護士実践用"),
    ("it_lawyer", "IT法務・テック法律家専門用"),
    ("ceo", "経営者サポート・エグゼクティブ用"),
    ("stock_trader", "日本株トレーダー・投資家用"),
    ("finance", "金融業界・銀行実践用"),
    ("qol", "QOL向上・ライフスタイル改善用"),
];

/// A reusable system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptTemplate {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub recommended_attachments: Vec<String>,
}

/// The contents of one category file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCategory {
    pub category: String,
    #[serde(default)]
    pub prompts: Vec<PromptTemplate>,
}

/// An entry in the category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryInfo {
    pub key: String,
    pub name: String,
    pub file: String,
}

/// Looks up prompt templates under a directory of category files.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    root: PathBuf,
}

impl PromptCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists every known category in catalog order.
    pub fn list_categories(&self) -> Vec<CategoryInfo> {
        CATEGORIES
            .iter()
            .map(|(key, name)| CategoryInfo {
                key: key.to_string(),
                name: name.to_string(),
                file: format!("{key}.json"),
            })
            .collect()
    }

    pub fn is_known(key: &str) -> bool {
        CATEGORIES.iter().any(|(k, _)| *k == key)
    }

    /// Loads the templates of `key`.
    pub fn load(&self, key: &str) -> Result<PromptCategory, CatalogError> {
        if !Self::is_known(key) {
            return Err(CatalogError::UnknownCategory(key.to_string()));
        }
        let path = self.root.join(format!("{key}.json"));
        if !path.exists() {
            return Err(CatalogError::NotFound(key.to_string()));
        }
        debug!(path = %path.display(), "Loading prompt category.");
        let content = std::fs::read_to_string(&path)?;
        let category: PromptCategory = serde_json::from_str(&content)?;
        info!(
            category = key,
            prompts = category.prompts.len(),
            "Loaded prompt category."
        );
        Ok(category)
    }

    /// Finds one template by id within a category.
    pub fn find(&self, key: &str, id: u32) -> Result<PromptTemplate, CatalogError> {
        self.load(key)?
            .prompts
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CatalogError::TemplateNotFound {
                category: key.to_string(),
                id,
            })
    }

    /// Draws up to `count` distinct templates at random.
    pub fn sample(&self, key: &str, count: usize) -> Result<Vec<PromptTemplate>, CatalogError> {
        let category = self.load(key)?;
        let mut rng = rand::thread_rng();
        Ok(category
            .prompts
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_category(dir: &Path, key: &str, count: u32) {
        let prompts: Vec<PromptTemplate> = (1..=count)
            .map(|id| PromptTemplate {
                id,
                title: format!("Template {id}"),
                system_prompt: format!("You are assistant #{id}."),
                recommended_attachments: vec!["notes.txt".to_string()],
            })
            .collect();
        let category = PromptCategory {
            category: key.to_string(),
            prompts,
        };
        std::fs::write(
            dir.join(format!("{key}.json")),
            serde_json::to_string(&category).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_list_categories_in_order() {
        let catalog = PromptCatalog::new("unused");
        let categories = catalog.list_categories();
        assert_eq!(categories.len(), 28);
        assert_eq!(categories[0].key, "industry");
        assert_eq!(categories[0].file, "industry.json");
        assert_eq!(categories[27].key, "qol");
    }

    #[test]
    fn test_load_find_and_sample() {
        let dir = tempdir().unwrap();
        write_category(dir.path(), "sales", 12);
        let catalog = PromptCatalog::new(dir.path());

        let category = catalog.load("sales").unwrap();
        assert_eq!(category.prompts.len(), 12);

        let template = catalog.find("sales", 7).unwrap();
        assert_eq!(template.title, "Template 7");

        let sample = catalog.sample("sales", 5).unwrap();
        assert_eq!(sample.len(), 5);
        let mut ids: Vec<u32> = sample.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 5);

        // Asking for more than exist returns them all.
        assert_eq!(catalog.sample("sales", 50).unwrap().len(), 12);
    }

    #[test]
    fn test_unknown_and_missing_categories() {
        let dir = tempdir().unwrap();
        let catalog = PromptCatalog::new(dir.path());
        assert!(matches!(
            catalog.load("../etc/passwd"),
            Err(CatalogError::UnknownCategory(_))
        ));
        assert!(matches!(
            catalog.load("email"),
            Err(CatalogError::NotFound(_))
        ));
    }
}
