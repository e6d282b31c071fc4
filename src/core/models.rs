use serde::{Deserialize, Serialize};

use crate::errors::PortfolioError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioDocument {
    pub about: About,
    pub skills: Vec<Skill>,
    pub experiences: Vec<Experience>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct About {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub email: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socials: Option<Vec<SocialLink>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub id: String,
    pub platform: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub level: u8,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub id: String,
    pub title: String,
    pub company: String,
    pub period: String,
    pub description: String,
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

impl Default for PortfolioDocument {
    fn default() -> Self {
        Self {
            about: About {
                name: String::new(),
                title: String::new(),
                bio: String::new(),
                email: String::new(),
                location: String::new(),
                avatar: None,
                socials: Some(Vec::new()),
            },
            skills: Vec::new(),
            experiences: Vec::new(),
            projects: Vec::new(),
        }
    }
}

impl PortfolioDocument {
    /// Checks the constraints enforced on save. Ids are opaque and not
    /// checked for uniqueness.
    pub fn validate(&self) -> Result<(), PortfolioError> {
        if let Some(skill) = self.skills.iter().find(|s| s.level > 100) {
            return Err(PortfolioError::Validation(format!(
                "skill '{}' has level {}, expected 0..=100",
                skill.id, skill.level
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsDocument {
    #[serde(default)]
    pub unique_visitors: u64,
    #[serde(default)]
    pub visitor_ids: Vec<String>,
}

impl AnalyticsDocument {
    /// Removes duplicate ids (keeping first occurrence) and recomputes the
    /// visitor count.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.visitor_ids.retain(|id| seen.insert(id.clone()));
        self.unique_visitors = self.visitor_ids.len() as u64;
        self
    }

    /// Appends `visitor_id` if unseen. Returns whether the document changed.
    pub fn register(&mut self, visitor_id: &str) -> bool {
        if self.visitor_ids.iter().any(|id| id == visitor_id) {
            return false;
        }
        self.visitor_ids.push(visitor_id.to_string());
        self.unique_visitors = self.visitor_ids.len() as u64;
        true
    }
}
