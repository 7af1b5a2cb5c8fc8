use thiserror::Error;

pub const FIREBASE_API_KEY_ENV: &str = "FIREBASE_API_KEY";
pub const FIREBASE_PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
pub const FIREBASE_STORAGE_BUCKET_ENV: &str = "FIREBASE_STORAGE_BUCKET";
pub const FIREBASE_STORAGE_API_BASE_ENV: &str = "FIREBASE_STORAGE_API_BASE";
pub const DEFAULT_FIREBASE_STORAGE_API_BASE: &str = "https://firebasestorage.googleapis.com/v0";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Resolved Firebase Storage settings.
pub struct StorageConfig {
    pub api_key: String,
    pub project_id: String,
    pub bucket: String,
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates supported `StorageConfigError` values.
pub enum StorageConfigError {
    #[error("Firebase Storage is not configured; missing {}", .variables.join(", "))]
    Missing { variables: Vec<&'static str> },
}

impl StorageConfigError {
    pub fn missing_variables(&self) -> &[&'static str] {
        match self {
            Self::Missing { variables } => variables,
        }
    }

    /// Operator-facing explanation of what to set and what to do next.
    pub fn banner(&self) -> String {
        let variables = self.missing_variables();
        let mut lines = vec![
            "Firebase Storage is not configured, so `analyze` is disabled.".to_string(),
            format!("Missing environment variables: {}", variables.join(", ")),
            String::new(),
            "Add them to your .env file, for example:".to_string(),
        ];
        lines.extend(
            variables
                .iter()
                .map(|variable| format!("  {variable}=<value from the Firebase console>")),
        );
        lines.push(String::new());
        lines.push("Then restart brief so the new values are loaded.".to_string());
        lines.join("\n")
    }
}

fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl StorageConfig {
    pub fn from_values(
        api_key: Option<&str>,
        project_id: Option<&str>,
        bucket: Option<&str>,
        api_base: Option<&str>,
    ) -> Result<Self, StorageConfigError> {
        let api_key = present(api_key);
        let project_id = present(project_id);
        let bucket = present(bucket);

        let mut variables = Vec::new();
        if api_key.is_none() {
            variables.push(FIREBASE_API_KEY_ENV);
        }
        if project_id.is_none() {
            variables.push(FIREBASE_PROJECT_ID_ENV);
        }
        if bucket.is_none() {
            variables.push(FIREBASE_STORAGE_BUCKET_ENV);
        }

        match (api_key, project_id, bucket) {
            (Some(api_key), Some(project_id), Some(bucket)) => Ok(Self {
                api_key,
                project_id,
                bucket,
                api_base: present(api_base)
                    .unwrap_or_else(|| DEFAULT_FIREBASE_STORAGE_API_BASE.to_string()),
            }),
            _ => Err(StorageConfigError::Missing { variables }),
        }
    }
}
