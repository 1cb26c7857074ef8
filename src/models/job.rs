use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub responsibilities: Vec<String>,
    pub benefits: Vec<String>,
    pub requirements: Vec<String>,
    pub location: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: Option<String>,
    pub responsibilities: Vec<String>,
    pub benefits: Vec<String>,
    pub requirements: Vec<String>,
    pub location: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub responsibilities: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub requirements: Option<Vec<String>>,
    pub location: Option<String>,
    pub active: Option<bool>,
}

impl JobChanges {
    pub fn apply(&self, job: &mut Job, at: DateTime<Utc>) {
        if let Some(v) = &self.title {
            job.title = v.clone();
        }
        if let Some(v) = &self.description {
            job.description = Some(v.clone());
        }
        if let Some(v) = &self.responsibilities {
            job.responsibilities = v.clone();
        }
        if let Some(v) = &self.benefits {
            job.benefits = v.clone();
        }
        if let Some(v) = &self.requirements {
            job.requirements = v.clone();
        }
        if let Some(v) = &self.location {
            job.location = Some(v.clone());
        }
        if let Some(v) = self.active {
            job.active = v;
        }
        job.updated_at = at;
    }
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub active: Option<bool>,
    pub search: Option<String>,
}
